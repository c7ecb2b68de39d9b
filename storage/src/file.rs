//! Directory-backed key-value storage.
//!
//! Each key is one file in the root directory. Writes go to a sibling
//! temporary file that is renamed over the target, so a crash mid-write
//! leaves the previous value readable.

use async_trait::async_trait;
use errors::StorageError;
use std::path::{Path, PathBuf};
use tn_core::traits::StorageBackend;

#[derive(Debug, Clone)]
pub struct FileStorage {
    root: PathBuf
}

impl FileStorage {
    /// Creates the root directory if needed.
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let root = root.into();
        tokio::fs::create_dir_all(&root)
            .await
            .map_err(|e| StorageError::Io {
                key: root.display().to_string(),
                reason: e.to_string()
            })?;
        tracing::debug!(root = %root.display(), "Opened file storage");
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
            && !key.starts_with('.');
        if !valid {
            return Err(StorageError::Io {
                key: key.to_string(),
                reason: "key must be a plain file name".to_string()
            });
        }
        Ok(self.root.join(key))
    }
}

fn io_error(key: &str, e: &std::io::Error) -> StorageError {
    StorageError::Io {
        key: key.to_string(),
        reason: e.to_string()
    }
}

#[async_trait]
impl StorageBackend for FileStorage {
    type Error = StorageError;

    async fn store(&self, key: &str, value: &[u8]) -> Result<(), Self::Error> {
        let path = self.path_for(key)?;
        let tmp = self.root.join(format!(".{key}.tmp"));
        tokio::fs::write(&tmp, value)
            .await
            .map_err(|e| io_error(key, &e))?;
        tokio::fs::rename(&tmp, &path)
            .await
            .map_err(|e| io_error(key, &e))?;
        Ok(())
    }

    async fn retrieve(&self, key: &str) -> Result<Option<Vec<u8>>, Self::Error> {
        let path = self.path_for(key)?;
        match tokio::fs::read(&path).await {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(io_error(key, &e))
        }
    }

    async fn delete(&self, key: &str) -> Result<(), Self::Error> {
        let path = self.path_for(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(io_error(key, &e))
        }
    }

    async fn exists(&self, key: &str) -> Result<bool, Self::Error> {
        let path = self.path_for(key)?;
        tokio::fs::try_exists(&path)
            .await
            .map_err(|e| io_error(key, &e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_file_storage_round_trip() {
        let dir = TempDir::new().unwrap();
        let storage = FileStorage::open(dir.path().join("cache")).await.unwrap();

        assert_eq!(storage.retrieve("yt-notes-data").await.unwrap(), None);
        storage.store("yt-notes-data", b"{}").await.unwrap();
        assert_eq!(
            storage.retrieve("yt-notes-data").await.unwrap(),
            Some(b"{}".to_vec())
        );
        assert!(storage.exists("yt-notes-data").await.unwrap());
        assert!(!dir.path().join("cache").join(".yt-notes-data.tmp").exists());
    }

    #[tokio::test]
    async fn test_file_storage_overwrite_and_delete() {
        let dir = TempDir::new().unwrap();
        let storage = FileStorage::open(dir.path()).await.unwrap();

        storage.store("k", b"one").await.unwrap();
        storage.store("k", b"two").await.unwrap();
        assert_eq!(storage.retrieve("k").await.unwrap(), Some(b"two".to_vec()));

        storage.delete("k").await.unwrap();
        storage.delete("k").await.unwrap();
        assert!(!storage.exists("k").await.unwrap());
    }

    #[tokio::test]
    async fn test_file_storage_persists_across_instances() {
        let dir = TempDir::new().unwrap();
        FileStorage::open(dir.path())
            .await
            .unwrap()
            .store("k", b"kept")
            .await
            .unwrap();

        let reopened = FileStorage::open(dir.path()).await.unwrap();
        assert_eq!(reopened.retrieve("k").await.unwrap(), Some(b"kept".to_vec()));
    }

    #[tokio::test]
    async fn test_file_storage_rejects_path_keys() {
        let dir = TempDir::new().unwrap();
        let storage = FileStorage::open(dir.path()).await.unwrap();

        for key in ["../escape", "a/b", "", ".hidden"] {
            assert!(matches!(
                storage.store(key, b"x").await,
                Err(StorageError::Io { .. })
            ));
        }
    }
}
