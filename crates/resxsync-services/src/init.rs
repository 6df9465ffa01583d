use std::path::Path;

use resxsync_core::Result;
use resxsync_resx::{ensure_extension, write_atomic, ResourceDocument};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitStatus {
    Created,
    Replaced,
    /// Dry run: nothing written.
    Planned,
    /// Target exists and overwriting was not requested.
    Skipped,
}

impl InitStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            InitStatus::Created => "created",
            InitStatus::Replaced => "replaced",
            InitStatus::Planned => "planned",
            InitStatus::Skipped => "skipped",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InitOutcome {
    pub keys: usize,
    pub status: InitStatus,
}

/// Create a target resource file holding every source key with an empty value.
pub fn init_target(source: &Path, target: &Path, overwrite: bool, dry_run: bool) -> Result<InitOutcome> {
    ensure_extension(source, "resx")?;
    ensure_extension(target, "resx")?;
    let src = ResourceDocument::load(source)?;
    let entries = src.entries();
    let exists = target.exists();

    let status = if exists && !overwrite {
        InitStatus::Skipped
    } else if dry_run {
        InitStatus::Planned
    } else if exists {
        InitStatus::Replaced
    } else {
        InitStatus::Created
    };

    if matches!(status, InitStatus::Created | InitStatus::Replaced) {
        let mut doc = ResourceDocument::skeleton(target)?;
        for e in &entries {
            doc.get_or_insert(&e.key);
        }
        write_atomic(target, &doc.render()?)?;
    }
    tracing::info!(
        event = "init_target",
        target = %target.display(),
        keys = entries.len(),
        status = status.as_str(),
    );
    Ok(InitOutcome {
        keys: entries.len(),
        status,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const EN: &str = r#"<root>
  <data name="Open" xml:space="preserve"><value>Open</value></data>
  <data name="Close" xml:space="preserve"><value>Close</value></data>
</root>"#;

    #[test]
    fn creates_empty_entries_for_every_source_key() {
        let dir = tempfile::tempdir().unwrap();
        let en = dir.path().join("Strings.resx");
        let es = dir.path().join("Strings.es.resx");
        fs::write(&en, EN).unwrap();

        let out = init_target(&en, &es, false, false).unwrap();
        assert_eq!(out, InitOutcome { keys: 2, status: InitStatus::Created });
        let doc = ResourceDocument::load(&es).unwrap();
        let keys: Vec<_> = doc.entries().into_iter().map(|e| (e.key, e.value)).collect();
        assert_eq!(keys, [("Open".to_string(), String::new()), ("Close".to_string(), String::new())]);
    }

    #[test]
    fn existing_target_needs_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let en = dir.path().join("Strings.resx");
        let es = dir.path().join("Strings.es.resx");
        fs::write(&en, EN).unwrap();
        fs::write(&es, "keep me").unwrap();

        assert_eq!(init_target(&en, &es, false, false).unwrap().status, InitStatus::Skipped);
        assert_eq!(init_target(&en, &es, true, true).unwrap().status, InitStatus::Planned);
        assert_eq!(fs::read_to_string(&es).unwrap(), "keep me");
        assert_eq!(init_target(&en, &es, true, false).unwrap().status, InitStatus::Replaced);
        assert!(fs::read_to_string(&es).unwrap().contains("<data name=\"Close\""));
    }
}
