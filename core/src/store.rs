use anyhow::{Context, Result};
use chrono::Utc;
use std::path::{Path, PathBuf};
use tokio::fs;
use uuid::Uuid;

/// On-disk placement and cleanup of conversion artifacts
///
/// Filenames are opaque (timestamp plus a random suffix) and never
/// derived from user-supplied text, so no sanitization of titles is
/// needed and paths cannot collide across concurrent runs.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    pub async fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)
            .await
            .with_context(|| format!("failed to create downloads directory {}", root.display()))?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Generate a fresh artifact path for one orchestration run
    pub fn allocate(&self, request_id: &Uuid) -> PathBuf {
        let stamp = Utc::now().format("%Y%m%d%H%M%S");
        let suffix = &request_id.simple().to_string()[..8];
        self.root.join(format!("{}_{}.mp3", stamp, suffix))
    }

    pub async fn exists(&self, path: &Path) -> bool {
        fs::metadata(path).await.is_ok()
    }

    /// Size in bytes, or `None` when the file does not exist
    pub async fn size_of(&self, path: &Path) -> Option<u64> {
        fs::metadata(path).await.ok().map(|m| m.len())
    }

    /// Remove an artifact. Removing a missing path is not an error.
    pub async fn remove(&self, path: &Path) -> std::io::Result<()> {
        match fs::remove_file(path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }

    /// Remove an artifact together with any in-progress files the
    /// external tools write beside it (`<name>.part`, `<name>.ytdl`).
    /// Idempotent like [`remove`](Self::remove).
    pub async fn clean(&self, path: &Path) -> std::io::Result<()> {
        self.remove(path).await?;
        for suffix in ["part", "ytdl"] {
            let mut partial = path.as_os_str().to_os_string();
            partial.push(".");
            partial.push(suffix);
            self.remove(Path::new(&partial)).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_allocate_is_unique_per_request() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path()).await.unwrap();

        let a = store.allocate(&Uuid::new_v4());
        let b = store.allocate(&Uuid::new_v4());
        assert_ne!(a, b);
        assert_eq!(a.extension().unwrap(), "mp3");
        assert!(a.starts_with(dir.path()));
    }

    #[tokio::test]
    async fn test_size_of_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path()).await.unwrap();

        let path = store.allocate(&Uuid::new_v4());
        assert_eq!(store.size_of(&path).await, None);
        assert!(!store.exists(&path).await);
    }

    #[tokio::test]
    async fn test_remove_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path()).await.unwrap();

        let path = store.allocate(&Uuid::new_v4());
        fs::write(&path, b"audio").await.unwrap();
        assert_eq!(store.size_of(&path).await, Some(5));

        store.remove(&path).await.unwrap();
        assert!(!store.exists(&path).await);
        // second removal is a no-op
        store.remove(&path).await.unwrap();
    }

    #[tokio::test]
    async fn test_clean_removes_partial_siblings() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path()).await.unwrap();

        let path = store.allocate(&Uuid::new_v4());
        let part = std::path::PathBuf::from(format!("{}.part", path.display()));
        let ytdl = std::path::PathBuf::from(format!("{}.ytdl", path.display()));
        fs::write(&path, b"audio").await.unwrap();
        fs::write(&part, b"partial").await.unwrap();
        fs::write(&ytdl, b"state").await.unwrap();

        store.clean(&path).await.unwrap();
        assert!(!store.exists(&path).await);
        assert!(!store.exists(&part).await);
        assert!(!store.exists(&ytdl).await);
        // cleaning again is a no-op
        store.clean(&path).await.unwrap();
    }

    #[tokio::test]
    async fn test_new_creates_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a/b/downloads");
        let store = ArtifactStore::new(&nested).await.unwrap();
        assert!(store.exists(store.root()).await);
    }
}
