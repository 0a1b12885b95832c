//! Local filesystem provider using [`object_store::local::LocalFileSystem`].
//!
//! Each subdirectory of the root directory is a bucket.

use std::path::{Path, PathBuf};

use object_store::local::LocalFileSystem;

use super::{StoreProvider, validate_bucket_name};
use crate::TRACING_TARGET_CLIENT;
use crate::client::ObjectStoreClient;
use crate::types::{BucketInfo, Error, Result};

/// Filesystem-backed provider rooted at a directory.
#[derive(Debug, Clone)]
pub struct LocalProvider {
    root: PathBuf,
}

impl LocalProvider {
    pub const ID: &str = "local";

    /// Create a provider serving the subdirectories of `root` as buckets.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        if !root.is_dir() {
            return Err(Error::invalid_request(format!(
                "local root '{}' is not a directory",
                root.display()
            )));
        }
        Ok(Self { root })
    }

    /// Returns the root directory.
    #[inline]
    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[async_trait::async_trait]
impl StoreProvider for LocalProvider {
    fn id(&self) -> &'static str {
        Self::ID
    }

    async fn list_buckets(&self) -> Result<Vec<BucketInfo>> {
        let mut entries = tokio::fs::read_dir(&self.root)
            .await
            .map_err(|e| Error::io(&self.root, e))?;

        let mut buckets = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| Error::io(&self.root, e))?
        {
            let is_dir = entry
                .file_type()
                .await
                .map_err(|e| Error::io(entry.path(), e))?
                .is_dir();
            if !is_dir {
                continue;
            }
            match entry.file_name().into_string() {
                Ok(name) if validate_bucket_name(&name).is_ok() => {
                    buckets.push(BucketInfo::new(name));
                }
                _ => {
                    tracing::debug!(
                        target: TRACING_TARGET_CLIENT,
                        path = %entry.path().display(),
                        "Skipping directory with an unusable bucket name"
                    );
                }
            }
        }

        buckets.sort();
        Ok(buckets)
    }

    fn client(&self, bucket: &str) -> Result<ObjectStoreClient> {
        validate_bucket_name(bucket)?;
        let path = self.root.join(bucket);
        if !path.is_dir() {
            return Err(Error::bucket_not_found(bucket));
        }

        let store = LocalFileSystem::new_with_prefix(&path)
            .map_err(|e| Error::from_store(e, bucket, ""))?;
        Ok(ObjectStoreClient::new(bucket, store))
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use super::*;
    use crate::types::ErrorKind;

    #[tokio::test]
    async fn subdirectories_are_buckets() {
        let root = tempfile::tempdir().unwrap();
        std::fs::create_dir(root.path().join("beta")).unwrap();
        std::fs::create_dir(root.path().join("alpha")).unwrap();
        std::fs::write(root.path().join("stray.txt"), b"x").unwrap();

        let provider = LocalProvider::new(root.path()).unwrap();
        let buckets = provider.list_buckets().await.unwrap();
        let names: Vec<_> = buckets.into_iter().map(|b| b.name).collect();
        assert_eq!(names, vec!["alpha", "beta"]);
    }

    #[tokio::test]
    async fn client_reads_files_in_bucket() {
        let root = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(root.path().join("data/nested")).unwrap();
        std::fs::write(root.path().join("data/nested/a.txt"), b"hello").unwrap();

        let provider = LocalProvider::new(root.path()).unwrap();
        let client = provider.client("data").unwrap();
        let metadata = client.head("nested/a.txt").await.unwrap();
        assert_eq!(metadata.size_bytes, 5);

        client
            .put("nested/b.txt", Bytes::from_static(b"bye"), None)
            .await
            .unwrap();
        assert!(root.path().join("data/nested/b.txt").exists());
    }

    #[test]
    fn missing_or_invalid_bucket() {
        let root = tempfile::tempdir().unwrap();
        let provider = LocalProvider::new(root.path()).unwrap();
        assert_eq!(provider.client("nope").unwrap_err().kind(), ErrorKind::NotFound);
        assert_eq!(
            provider.client("../etc").unwrap_err().kind(),
            ErrorKind::InvalidRequest
        );
    }
}
