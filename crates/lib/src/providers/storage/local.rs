use crate::{errors::StorageError, providers::storage::BlobStore};
use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};
use tracing::debug;

/// A blob store backed by a directory tree on the local filesystem.
///
/// Blob names are paths relative to the root, joined with `/`. Listings are
/// sorted so enumeration order is stable across platforms.
#[derive(Clone, Debug)]
pub struct LocalBlobStore {
    root: PathBuf,
}

impl LocalBlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, name: &str) -> Result<PathBuf, StorageError> {
        let relative = Path::new(name);
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)));
        if name.is_empty() || escapes {
            return Err(StorageError::Config(format!("invalid blob name '{name}'")));
        }
        Ok(self.root.join(relative))
    }

    async fn collect_names(&self) -> Result<Vec<String>, StorageError> {
        let mut names = Vec::new();
        let mut pending = vec![self.root.clone()];
        while let Some(dir) = pending.pop() {
            let mut entries = match tokio::fs::read_dir(&dir).await {
                Ok(entries) => entries,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => return Err(e.into()),
            };
            while let Some(entry) = entries.next_entry().await? {
                let path = entry.path();
                if entry.file_type().await?.is_dir() {
                    pending.push(path);
                } else if let Ok(relative) = path.strip_prefix(&self.root) {
                    let name = relative
                        .components()
                        .map(|c| c.as_os_str().to_string_lossy())
                        .collect::<Vec<_>>()
                        .join("/");
                    names.push(name);
                }
            }
        }
        names.sort();
        Ok(names)
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    fn name(&self) -> &str {
        "Local"
    }

    async fn list_blob_names(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
        let names = self.collect_names().await?;
        debug!(root = %self.root.display(), prefix, count = names.len(), "Listed local blobs");
        Ok(names.into_iter().filter(|n| n.starts_with(prefix)).collect())
    }

    async fn get_blob(&self, name: &str) -> Result<Vec<u8>, StorageError> {
        let path = self.resolve(name)?;
        match tokio::fs::read(&path).await {
            Ok(data) => Ok(data),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(name.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn put_blob(&self, name: &str, data: Vec<u8>) -> Result<(), StorageError> {
        let path = self.resolve(name)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, data).await?;
        Ok(())
    }
}
