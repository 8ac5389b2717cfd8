//! Filesystem helpers shared by the key, signature and record writers.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::config::Config;
use crate::error::Result;

/// Create `dir` (and parents) if it does not exist yet.
pub fn ensure_directory(dir: impl AsRef<Path>) -> Result<()> {
    let dir = dir.as_ref();
    if !dir.exists() {
        fs::create_dir_all(dir)?;
        log::debug!("created directory {}", dir.display());
    }
    Ok(())
}

/// Write `contents` to `path` all-or-nothing.
///
/// Bytes go to a temporary file in the destination directory which is then
/// renamed over `path`, so a failure never leaves a truncated file behind.
/// The temporary file is created with owner-only permissions on Unix.
pub fn write_atomic(path: impl AsRef<Path>, contents: &[u8]) -> Result<()> {
    let dest = path.as_ref();
    let parent = match dest.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    ensure_directory(parent)?;

    let mut tmp = NamedTempFile::new_in(parent)?;
    tmp.write_all(contents)?;
    tmp.as_file().sync_all()?;
    tmp.persist(dest).map_err(|e| e.error)?;
    log::trace!("wrote {} bytes to {}", contents.len(), dest.display());
    Ok(())
}

/// Read a UTF-8 text file.
pub fn read_text(path: impl AsRef<Path>) -> Result<String> {
    Ok(fs::read_to_string(path)?)
}

/// Write a UTF-8 text file atomically.
pub fn write_text(path: impl AsRef<Path>, text: &str) -> Result<()> {
    write_atomic(path, text.as_bytes())
}

/// Create the keys, signatures and temp directories named by `config`.
pub fn create_default_directories(config: &Config) -> Result<Vec<PathBuf>> {
    let dirs = vec![
        config.keys_dir.clone(),
        config.signatures_dir.clone(),
        config.temp_dir.clone(),
    ];
    for dir in &dirs {
        ensure_directory(dir)?;
    }
    Ok(dirs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_ensure_directory_nested() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        ensure_directory(&nested).unwrap();
        assert!(nested.is_dir());
        // Idempotent
        ensure_directory(&nested).unwrap();
    }

    #[test]
    fn test_write_atomic_replaces_existing() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.bin");
        write_atomic(&path, b"first version, longer").unwrap();
        write_atomic(&path, b"second").unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"second");

        // No temp files left behind.
        let entries: Vec<_> = fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn test_failed_write_leaves_no_trace() {
        let dir = tempdir().unwrap();
        let existing = dir.path().join("keep.txt");
        fs::write(&existing, b"original").unwrap();
        // A non-empty directory cannot be replaced by a file.
        let blocker = dir.path().join("blocked");
        fs::create_dir(&blocker).unwrap();
        fs::write(blocker.join("inner"), b"x").unwrap();

        assert!(write_atomic(&blocker, b"new contents").is_err());

        assert!(blocker.is_dir());
        assert_eq!(fs::read(blocker.join("inner")).unwrap(), b"x");
        assert_eq!(fs::read(&existing).unwrap(), b"original");
        let leftovers: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().starts_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn test_write_atomic_creates_parent() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("signatures").join("doc.sig");
        write_atomic(&path, &[1, 2, 3]).unwrap();
        assert_eq!(fs::read(&path).unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn test_text_roundtrip_utf8() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("note.txt");
        write_text(&path, "Ứng dụng chữ ký số").unwrap();
        assert_eq!(read_text(&path).unwrap(), "Ứng dụng chữ ký số");
    }

    #[test]
    fn test_create_default_directories() {
        let dir = tempdir().unwrap();
        let config = Config {
            keys_dir: dir.path().join("keys"),
            signatures_dir: dir.path().join("signatures"),
            temp_dir: dir.path().join("temp"),
            ..Config::default()
        };
        let created = create_default_directories(&config).unwrap();
        assert_eq!(created.len(), 3);
        assert!(created.iter().all(|d| d.is_dir()));
    }
}
