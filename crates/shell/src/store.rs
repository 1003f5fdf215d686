use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// File name of the persisted navigation value inside the state directory.
pub const NAV_STATE_FILE: &str = "active_page";

/// Persists the active page index as a small string value, the stand-in
/// for the original's single local-storage key. Reads are forgiving (a
/// missing or unreadable file is simply "no stored value"); writes are
/// atomic via a tmp file rename.
/// 將啟用頁面索引以短字串持久化；讀取寬鬆，寫入採 tmp 改名的原子方式。
#[derive(Debug, Clone)]
pub struct NavStateStore {
    path: PathBuf,
}

impl NavStateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self::new(dir.as_ref().join(NAV_STATE_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The stored raw string, if any. Validation is the caller's job: the
    /// resolution chain decides what counts as a usable index.
    pub fn read(&self) -> Option<String> {
        fs::read_to_string(&self.path)
            .ok()
            .map(|raw| raw.trim().to_string())
            .filter(|raw| !raw.is_empty())
    }

    pub fn write(&self, value: &str) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|source| StoreError::CreateDir {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let tmp_path = self.path.with_extension("tmp");
        fs::write(&tmp_path, value.as_bytes()).map_err(|source| StoreError::Write {
            path: tmp_path.clone(),
            source,
        })?;
        fs::rename(&tmp_path, &self.path).map_err(|source| StoreError::Write {
            path: self.path.clone(),
            source,
        })
    }

    pub fn clear(&self) -> Result<(), StoreError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StoreError::Remove {
                path: self.path.clone(),
                source,
            }),
        }
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to prepare directory {path}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to write navigation state {path}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to remove navigation state {path}")]
    Remove {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn read_returns_none_when_missing() {
        let dir = tempdir().unwrap();
        let store = NavStateStore::in_dir(dir.path());
        assert_eq!(store.read(), None);
    }

    #[test]
    fn write_read_round_trip() {
        let dir = tempdir().unwrap();
        let store = NavStateStore::in_dir(dir.path());
        store.write("2").unwrap();
        assert_eq!(store.read().as_deref(), Some("2"));
        store.write("0").unwrap();
        assert_eq!(store.read().as_deref(), Some("0"));
    }

    #[test]
    fn surrounding_whitespace_is_trimmed() {
        let dir = tempdir().unwrap();
        let store = NavStateStore::in_dir(dir.path());
        fs::write(store.path(), "  1\n").unwrap();
        assert_eq!(store.read().as_deref(), Some("1"));
    }

    #[test]
    fn clear_is_idempotent() {
        let dir = tempdir().unwrap();
        let store = NavStateStore::in_dir(dir.path());
        store.write("1").unwrap();
        store.clear().unwrap();
        store.clear().unwrap();
        assert_eq!(store.read(), None);
    }
}
