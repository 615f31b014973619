//! Where persisted documents live.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Byte-level storage for persisted documents.
pub trait DocumentStore: Send + Sync {
    fn read(&self, path: &Path) -> io::Result<Vec<u8>>;

    /// Replaces the contents at `path`. Either the whole document is written
    /// or the previous contents are left in place.
    fn write(&self, path: &Path, bytes: &[u8]) -> io::Result<()>;
}

/// Stores documents as files.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsDocumentStore;

impl DocumentStore for FsDocumentStore {
    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        fs::read(path)
    }

    fn write(&self, path: &Path, bytes: &[u8]) -> io::Result<()> {
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }
        let staging = staging_path(path);
        let result = write_synced(&staging, bytes).and_then(|()| fs::rename(&staging, path));
        if result.is_err() {
            let _ = fs::remove_file(&staging);
        }
        result
    }
}

/// Writes and flushes to disk so a rename never exposes a partial file.
fn write_synced(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(bytes)?;
    file.sync_all()
}

/// `notes.folio` → `.notes.folio.tmp`, next to the target.
fn staging_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".{name}.tmp"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("doc.folio");
        FsDocumentStore.write(&path, b"{}").unwrap();
        assert_eq!(FsDocumentStore.read(&path).unwrap(), b"{}");
        assert!(!staging_path(&path).exists());
    }

    #[test]
    fn failed_rename_leaves_no_staging_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.folio");
        fs::create_dir(&path).unwrap();
        fs::write(path.join("occupied"), b"x").unwrap();

        assert!(FsDocumentStore.write(&path, b"{}").is_err());
        assert!(!staging_path(&path).exists());
    }

    #[test]
    fn overwrite_replaces_previous_contents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.folio");
        FsDocumentStore.write(&path, b"first").unwrap();
        FsDocumentStore.write(&path, b"second").unwrap();
        assert_eq!(FsDocumentStore.read(&path).unwrap(), b"second");
    }

    #[test]
    fn read_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = FsDocumentStore.read(&dir.path().join("absent")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }
}
