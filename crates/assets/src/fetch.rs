use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use thiserror::Error;
use tracing::debug;

/// Read access to assets addressed by relative path, e.g.
/// `pages/firmware/redmine.panel` or `datasheet/router_list.csv`.
/// 以相對路徑存取靜態資源的介面。
pub trait Fetcher {
    fn fetch_bytes(&self, path: &str) -> Result<Vec<u8>, FetchError>;

    fn fetch_text(&self, path: &str) -> Result<String, FetchError> {
        let bytes = self.fetch_bytes(path)?;
        String::from_utf8(bytes).map_err(|_| FetchError::NotText {
            path: path.to_string(),
        })
    }
}

/// Fetcher rooted at an assets directory on disk.
#[derive(Debug, Clone)]
pub struct DiskFetcher {
    root: PathBuf,
}

impl DiskFetcher {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> Result<PathBuf, FetchError> {
        let relative = Path::new(path);
        let escapes = relative.components().any(|component| {
            matches!(
                component,
                Component::ParentDir | Component::RootDir | Component::Prefix(_)
            )
        });
        if escapes {
            return Err(FetchError::InvalidPath {
                path: path.to_string(),
            });
        }
        Ok(self.root.join(relative))
    }
}

impl Fetcher for DiskFetcher {
    fn fetch_bytes(&self, path: &str) -> Result<Vec<u8>, FetchError> {
        let full = self.resolve(path)?;
        debug!(path, "fetching asset from disk");
        match fs::read(&full) {
            Ok(bytes) => Ok(bytes),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Err(FetchError::NotFound {
                path: path.to_string(),
            }),
            Err(err) => Err(FetchError::Io {
                path: path.to_string(),
                source: err,
            }),
        }
    }
}

/// In-memory fetcher used by tests and the built-in fallback bundle.
/// 測試與內建備援資源使用的記憶體內抓取器。
#[derive(Debug, Default, Clone)]
pub struct MemoryFetcher {
    entries: BTreeMap<String, Vec<u8>>,
}

impl MemoryFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_text(mut self, path: impl Into<String>, contents: impl Into<String>) -> Self {
        self.insert_text(path, contents);
        self
    }

    pub fn insert_text(&mut self, path: impl Into<String>, contents: impl Into<String>) {
        self.entries
            .insert(path.into(), contents.into().into_bytes());
    }

    pub fn insert_bytes(&mut self, path: impl Into<String>, contents: Vec<u8>) {
        self.entries.insert(path.into(), contents);
    }

    pub fn remove(&mut self, path: &str) {
        self.entries.remove(path);
    }
}

impl Fetcher for MemoryFetcher {
    fn fetch_bytes(&self, path: &str) -> Result<Vec<u8>, FetchError> {
        self.entries
            .get(path)
            .cloned()
            .ok_or_else(|| FetchError::NotFound {
                path: path.to_string(),
            })
    }
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("asset '{path}' not found")]
    NotFound { path: String },
    #[error("asset path '{path}' escapes the assets root")]
    InvalidPath { path: String },
    #[error("asset '{path}' is not valid UTF-8 text")]
    NotText { path: String },
    #[error("failed to read asset '{path}'")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },
}
