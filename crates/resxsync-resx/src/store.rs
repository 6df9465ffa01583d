use std::path::{Path, PathBuf};

use resxsync_core::Result;

use crate::document::{ResourceDocument, ResourceEntry};
use crate::util::write_atomic;

/// Which of the two loaded documents an operation addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Doc {
    Source,
    Target,
}

/// The English source and the target language file of one run.
///
/// Only the target is ever written. Pending writes are flushed by
/// [`ResourceStore::save`] or, failing that, when the store is dropped.
#[derive(Debug)]
pub struct ResourceStore {
    source: ResourceDocument,
    target: ResourceDocument,
    dirty: bool,
    dry_run: bool,
    backup: bool,
    backed_up: bool,
}

impl ResourceStore {
    pub fn open(source: &Path, target: &Path) -> Result<Self> {
        let source = ResourceDocument::load(source)?;
        let target = ResourceDocument::load(target)?;
        Ok(Self::from_documents(source, target))
    }

    pub fn from_documents(source: ResourceDocument, target: ResourceDocument) -> Self {
        Self {
            source,
            target,
            dirty: false,
            dry_run: false,
            backup: false,
            backed_up: false,
        }
    }

    /// Never touch the target file on disk.
    pub fn dry_run(mut self, yes: bool) -> Self {
        self.dry_run = yes;
        self
    }

    /// Copy the target to `<name>.resx.bak` before the first save.
    pub fn with_backup(mut self, yes: bool) -> Self {
        self.backup = yes;
        self
    }

    pub fn document(&self, doc: Doc) -> &ResourceDocument {
        match doc {
            Doc::Source => &self.source,
            Doc::Target => &self.target,
        }
    }

    pub fn target_path(&self) -> &Path {
        self.target.path()
    }

    /// Entries of `doc` whose value matches `text` (case-insensitive, trimmed).
    pub fn lookup_by_value(&self, doc: Doc, text: &str) -> Vec<ResourceEntry> {
        self.document(doc).find_by_value(text)
    }

    pub fn all_entries(&self, doc: Doc) -> Vec<ResourceEntry> {
        self.document(doc).entries()
    }

    /// Value stored under `key`. On the target a missing key gets an empty
    /// placeholder entry, which marks the store dirty. On the source a
    /// missing key reads as empty and nothing is created.
    pub fn get_by_key(&mut self, doc: Doc, key: &str) -> String {
        match doc {
            Doc::Source => self.source.value_of(key).unwrap_or_default(),
            Doc::Target => {
                let (value, created) = self.target.get_or_insert(key);
                if created {
                    self.dirty = true;
                }
                value
            }
        }
    }

    /// Write `value` under `key` in the target. Non-empty values are kept
    /// unless `overwrite`. Returns whether anything changed.
    pub fn write(&mut self, key: &str, value: &str, overwrite: bool) -> bool {
        let changed = self.target.set(key, value, overwrite);
        if changed {
            self.dirty = true;
        }
        changed
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Persist pending writes of the target. A no-op when nothing changed
    /// or in dry-run mode.
    pub fn save(&mut self) -> Result<()> {
        if !self.dirty {
            return Ok(());
        }
        let path = self.target.path().to_path_buf();
        if self.dry_run {
            tracing::info!(event = "resx_save_skipped", path = %path.display(), reason = "dry_run");
            self.dirty = false;
            return Ok(());
        }
        if self.backup && !self.backed_up && path.exists() {
            let bak = backup_path(&path);
            std::fs::copy(&path, &bak)?;
            self.backed_up = true;
            tracing::info!(event = "resx_backup", path = %bak.display());
        }
        let bytes = self.target.render()?;
        write_atomic(&path, &bytes)?;
        self.dirty = false;
        tracing::info!(event = "resx_saved", path = %path.display(), bytes = bytes.len());
        Ok(())
    }
}

impl Drop for ResourceStore {
    fn drop(&mut self) {
        if self.dirty {
            if let Err(err) = self.save() {
                tracing::error!(event = "resx_save_failed", path = %self.target.path().display(), error = %err);
            }
        }
    }
}

fn backup_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".bak");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{ENGLISH, TARGET};
    use std::fs;

    fn store_in(dir: &Path) -> ResourceStore {
        let en = dir.join("Strings.resx");
        let es = dir.join("Strings.es.resx");
        fs::write(&en, ENGLISH).unwrap();
        fs::write(&es, TARGET).unwrap();
        ResourceStore::open(&en, &es).unwrap()
    }

    #[test]
    fn source_get_by_key_never_creates_entries() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store_in(dir.path());
        assert_eq!(store.get_by_key(Doc::Source, "single"), "Only a single value should be found.");
        assert_eq!(store.get_by_key(Doc::Source, "Nope"), "");
        assert!(!store.is_dirty());
    }

    #[test]
    fn target_get_by_key_creates_placeholder() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store_in(dir.path());
        assert_eq!(store.get_by_key(Doc::Target, "Fresh"), "");
        assert!(store.is_dirty());
        assert_eq!(store.all_entries(Doc::Target).len(), 2);
    }

    #[test]
    fn pairs_written_then_saved_are_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let pairs = [("One", "Uno"), ("Two", "Dos"), ("Three", "Tres & más")];
        {
            let mut store = store_in(dir.path());
            for (k, v) in pairs {
                assert!(store.write(k, v, false));
            }
            store.save().unwrap();
            assert!(!store.is_dirty());
        }
        let store = store_in_existing(dir.path());
        for (k, v) in pairs {
            assert_eq!(store.document(Doc::Target).value_of(k).as_deref(), Some(v));
        }
    }

    fn store_in_existing(dir: &Path) -> ResourceStore {
        ResourceStore::open(&dir.join("Strings.resx"), &dir.join("Strings.es.resx")).unwrap()
    }

    #[test]
    fn drop_flushes_pending_writes() {
        let dir = tempfile::tempdir().unwrap();
        {
            let mut store = store_in(dir.path());
            store.write("Single", "Solo un valor.", false);
        }
        let text = fs::read_to_string(dir.path().join("Strings.es.resx")).unwrap();
        assert!(text.contains("<value>Solo un valor.</value>"));
        assert!(text.contains("<value>Hola {0}</value>"));
    }

    #[test]
    fn dry_run_leaves_disk_untouched() {
        let dir = tempfile::tempdir().unwrap();
        {
            let mut store = store_in(dir.path()).dry_run(true);
            store.write("Single", "Solo", true);
            store.save().unwrap();
        }
        let text = fs::read_to_string(dir.path().join("Strings.es.resx")).unwrap();
        assert_eq!(text, TARGET);
    }

    #[test]
    fn backup_is_taken_once_before_first_save() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store_in(dir.path()).with_backup(true);
        store.write("Single", "Solo", false);
        store.save().unwrap();
        store.write("MultiA", "Varias", false);
        store.save().unwrap();
        let bak = fs::read_to_string(dir.path().join("Strings.es.resx.bak")).unwrap();
        assert_eq!(bak, TARGET);
    }

    #[test]
    fn missing_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("Strings.resx"), ENGLISH).unwrap();
        let err = ResourceStore::open(&dir.path().join("Strings.resx"), &dir.path().join("absent.resx"))
            .unwrap_err();
        assert!(err.to_string().contains("file not found"));
    }
}
