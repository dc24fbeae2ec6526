use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use thiserror::Error;

/// Key the single saved drawing lives under
pub const SAVED_DRAWING_KEY: &str = "savedDrawing";

/// Errors that can occur while saving or loading a drawing
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("Failed to write {path}: {source}")]
    WriteError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read {path}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid storage key: {0:?}")]
    InvalidKey(String),
}

/// Result type for persistence operations
pub type PersistenceResult<T> = Result<T, PersistenceError>;

/// Stores encoded drawings by key.
pub trait DrawingStore: Send {
    fn save(&self, key: &str, png: &[u8]) -> PersistenceResult<()>;

    /// `Ok(None)` when nothing was stored under `key`
    fn load(&self, key: &str) -> PersistenceResult<Option<Vec<u8>>>;
}

/// One PNG file per key inside a directory
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PersistenceResult<PathBuf> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(PersistenceError::InvalidKey(key.to_owned()));
        }
        Ok(self.dir.join(format!("{}.png", key)))
    }
}

impl DrawingStore for FileStore {
    fn save(&self, key: &str, png: &[u8]) -> PersistenceResult<()> {
        let path = self.path_for(key)?;

        // Create storage directory if it doesn't exist
        fs::create_dir_all(&self.dir).map_err(|source| PersistenceError::WriteError {
            path: self.dir.clone(),
            source,
        })?;
        fs::write(&path, png).map_err(|source| PersistenceError::WriteError { path: path.clone(), source })?;

        log::info!("Saved drawing to {}", path.display());
        Ok(())
    }

    fn load(&self, key: &str) -> PersistenceResult<Option<Vec<u8>>> {
        let path = self.path_for(key)?;
        match fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(PersistenceError::ReadError { path, source }),
        }
    }
}

/// In-process store, used when no storage directory is configured
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DrawingStore for MemoryStore {
    fn save(&self, key: &str, png: &[u8]) -> PersistenceResult<()> {
        self.entries.lock().insert(key.to_owned(), png.to_vec());
        Ok(())
    }

    fn load(&self, key: &str) -> PersistenceResult<Option<Vec<u8>>> {
        Ok(self.entries.lock().get(key).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_dir(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("inkshape-{}-{}", name, uuid::Uuid::new_v4()))
    }

    #[test]
    fn test_file_store_roundtrip() {
        let dir = temp_dir("store");
        let store = FileStore::new(&dir);

        assert!(store.load(SAVED_DRAWING_KEY).unwrap().is_none());
        store.save(SAVED_DRAWING_KEY, b"png bytes").unwrap();
        assert_eq!(store.load(SAVED_DRAWING_KEY).unwrap().as_deref(), Some(&b"png bytes"[..]));
        assert!(dir.join("savedDrawing.png").exists());

        fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn test_file_store_rejects_path_keys() {
        let store = FileStore::new(temp_dir("keys"));
        assert!(matches!(store.save("../escape", b""), Err(PersistenceError::InvalidKey(_))));
        assert!(matches!(store.load(""), Err(PersistenceError::InvalidKey(_))));
    }

    #[test]
    fn test_memory_store() {
        let store = MemoryStore::new();
        assert!(store.load("a").unwrap().is_none());
        store.save("a", &[1, 2, 3]).unwrap();
        assert_eq!(store.load("a").unwrap(), Some(vec![1, 2, 3]));
    }
}
