//! Local-disk storage for uploaded files
//!
//! Objects live directly inside the configured upload directory under
//! generated, collision-free names. Keys are single path components.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::core::config::StorageConfig;
use crate::shared::constants::STORED_FILE_PREFIX;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Invalid storage key '{0}'")]
    InvalidKey(String),

    #[error("Object '{0}' not found")]
    NotFound(String),

    #[error("I/O error on '{key}': {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },
}

impl StorageError {
    fn io(key: &str, source: std::io::Error) -> Self {
        if source.kind() == ErrorKind::NotFound {
            StorageError::NotFound(key.to_string())
        } else {
            StorageError::Io {
                key: key.to_string(),
                source,
            }
        }
    }
}

/// Storage rooted at the upload directory
pub struct LocalStorage {
    root: PathBuf,
}

impl LocalStorage {
    /// Create the storage, making sure the upload directory exists
    pub async fn new(config: &StorageConfig) -> Result<Self, StorageError> {
        let root = config.upload_dir.clone();
        tokio::fs::create_dir_all(&root)
            .await
            .map_err(|e| StorageError::io(&root.display().to_string(), e))?;

        info!("Local storage initialized at: {}", root.display());

        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Generate a fresh key such as `file_<uuid>.pdf`
    pub fn generate_key(&self, extension: &str) -> String {
        let id = Uuid::new_v4().simple();
        if extension.is_empty() {
            format!("{}{}", STORED_FILE_PREFIX, id)
        } else {
            format!("{}{}.{}", STORED_FILE_PREFIX, id, extension)
        }
    }

    /// Resolve a key to its path on disk
    pub fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        validate_key(key)?;
        Ok(self.root.join(key))
    }

    /// Write a new object. Fails if the key is already taken.
    pub async fn upload(&self, key: &str, data: &[u8]) -> Result<(), StorageError> {
        let path = self.path_for(key)?;

        let mut file = tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
            .map_err(|e| StorageError::io(key, e))?;

        if let Err(e) = tokio::io::AsyncWriteExt::write_all(&mut file, data).await {
            drop(file);
            // Partial writes must not leave a truncated object behind
            if let Err(cleanup) = tokio::fs::remove_file(&path).await {
                warn!("Failed to remove partial object '{}': {}", key, cleanup);
            }
            return Err(StorageError::io(key, e));
        }

        tokio::io::AsyncWriteExt::flush(&mut file)
            .await
            .map_err(|e| StorageError::io(key, e))?;

        debug!("Stored object '{}' ({} bytes)", key, data.len());
        Ok(())
    }

    /// Read an object's bytes
    pub async fn read(&self, key: &str) -> Result<Vec<u8>, StorageError> {
        let path = self.path_for(key)?;
        tokio::fs::read(&path)
            .await
            .map_err(|e| StorageError::io(key, e))
    }

    /// Delete an object. Returns `false` when there was nothing to delete.
    pub async fn delete(&self, key: &str) -> Result<bool, StorageError> {
        let path = self.path_for(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                debug!("Deleted object '{}'", key);
                Ok(true)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(StorageError::io(key, e)),
        }
    }

    /// Check if an object exists
    pub async fn exists(&self, key: &str) -> Result<bool, StorageError> {
        let path = self.path_for(key)?;
        tokio::fs::try_exists(&path)
            .await
            .map_err(|e| StorageError::io(key, e))
    }
}

/// Keys must be plain file names inside the upload directory
fn validate_key(key: &str) -> Result<(), StorageError> {
    let valid = !key.is_empty()
        && key != "."
        && key != ".."
        && !key.contains('/')
        && !key.contains('\\')
        && !key.contains('\0');

    if valid {
        Ok(())
    } else {
        Err(StorageError::InvalidKey(key.to_string()))
    }
}
