use resxsync_core::{ResxError, Result};
use std::fs;
use std::path::Path;

/// Write `bytes` next to `path` first and rename over it, so a crash never
/// leaves a half-written resource file behind.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => std::path::PathBuf::from("."),
    };
    fs::create_dir_all(&dir)?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "resource".to_string());
    let tmp = dir.join(format!(".{name}.tmp"));
    fs::write(&tmp, bytes)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

/// Reject paths that do not carry the expected extension (case-insensitive).
pub fn ensure_extension(path: &Path, expected: &'static str) -> std::result::Result<(), ResxError> {
    let ok = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(expected));
    if ok {
        Ok(())
    } else {
        Err(ResxError::InvalidExtension {
            path: path.to_path_buf(),
            expected,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_check_is_case_insensitive() {
        assert!(ensure_extension(Path::new("Strings.RESX"), "resx").is_ok());
        assert!(ensure_extension(Path::new("Strings.xml"), "resx").is_err());
        assert!(ensure_extension(Path::new("Strings"), "resx").is_err());
    }

    #[test]
    fn atomic_write_replaces_content() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let path = tmp.path().join("nested").join("out.resx");
        write_atomic(&path, b"one").unwrap();
        write_atomic(&path, b"two").unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"two");
        let leftovers: Vec<_> = fs::read_dir(path.parent().unwrap())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }
}
