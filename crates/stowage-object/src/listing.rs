//! Bucket and object listing.
//!
//! Prefixes are raw string prefixes as in S3 (`35117/a` matches
//! `35117/a.txt` and `35117/abc/d.bin`), while [`object_store`] lists by path
//! segment. Listings therefore run under the prefix's parent directory and are
//! filtered by string prefix afterwards.

use std::sync::Arc;

use futures::StreamExt;
use serde::Serialize;

use crate::providers::StoreProvider;
use crate::types::{BucketInfo, Error, ObjectSummary, Result};
use crate::{EngineConfig, TRACING_TARGET_LISTING};

/// Result of [`ListingService::list_objects`].
#[derive(Debug, Clone, Serialize)]
pub struct ObjectListing {
    /// Bucket that was listed.
    pub bucket: String,
    /// Prefix filter, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,
    /// Number of entries in `objects`.
    pub key_count: usize,
    /// Whether `max_keys` cut the listing short.
    pub is_truncated: bool,
    /// Matching objects sorted by key.
    pub objects: Vec<ObjectSummary>,
}

/// Lists buckets and objects through a [`StoreProvider`].
#[derive(Clone)]
pub struct ListingService {
    provider: Arc<dyn StoreProvider>,
    config: Arc<EngineConfig>,
}

impl ListingService {
    /// Create a listing service sharing `provider` and `config`.
    pub fn new(provider: Arc<dyn StoreProvider>, config: Arc<EngineConfig>) -> Self {
        Self { provider, config }
    }

    /// Lists buckets sorted by name, after `start_after` if given, capped at
    /// the configured maximum.
    pub async fn list_buckets(&self, start_after: Option<&str>) -> Result<Vec<BucketInfo>> {
        let after = self.config.request_timeout();
        let mut buckets = tokio::time::timeout(after, self.provider.list_buckets())
            .await
            .map_err(|_| Error::timeout("bucket listing", "*", "", after))??;

        buckets.sort();
        if let Some(start_after) = start_after.filter(|s| !s.is_empty()) {
            buckets.retain(|b| b.name.as_str() > start_after);
        }
        buckets.truncate(self.config.max_buckets);

        tracing::debug!(
            target: TRACING_TARGET_LISTING,
            provider = self.provider.id(),
            count = buckets.len(),
            "Listed buckets"
        );
        Ok(buckets)
    }

    /// Lists every object under `prefix`, following pagination.
    ///
    /// Results are sorted by key; `max_keys` truncates after sorting.
    pub async fn list_objects(
        &self,
        bucket: &str,
        prefix: Option<&str>,
        max_keys: Option<usize>,
    ) -> Result<ObjectListing> {
        let prefix = prefix.filter(|p| !p.is_empty());
        let mut objects = self.collect(bucket, prefix.unwrap_or_default()).await?;

        let is_truncated = max_keys.is_some_and(|max| objects.len() > max);
        if let Some(max) = max_keys {
            objects.truncate(max);
        }

        tracing::debug!(
            target: TRACING_TARGET_LISTING,
            bucket = %bucket,
            prefix = ?prefix,
            count = objects.len(),
            is_truncated,
            "Listed objects"
        );

        Ok(ObjectListing {
            bucket: bucket.to_owned(),
            prefix: prefix.map(str::to_owned),
            key_count: objects.len(),
            is_truncated,
            objects,
        })
    }

    /// Lists the keys under `prefix`, excluding directory markers.
    pub async fn list_keys(&self, bucket: &str, prefix: &str) -> Result<Vec<String>> {
        let keys = self
            .collect(bucket, prefix)
            .await?
            .into_iter()
            .map(|summary| summary.key)
            .filter(|key| !key.ends_with('/'))
            .collect();
        Ok(keys)
    }

    async fn collect(&self, bucket: &str, prefix: &str) -> Result<Vec<ObjectSummary>> {
        let client = self.provider.client(bucket)?;
        let after = self.config.request_timeout();

        let parent = match prefix.rfind('/') {
            Some(index) => &prefix[..index],
            None => "",
        };

        let mut stream = client.list_stream(parent);
        let mut objects = Vec::new();
        loop {
            let next = tokio::time::timeout(after, stream.next())
                .await
                .map_err(|_| Error::timeout("object listing", bucket, prefix, after))?;
            let Some(meta) = next else { break };
            let meta = meta?;
            if meta.location.as_ref().starts_with(prefix) {
                objects.push(ObjectSummary::from(&meta));
            }
        }

        objects.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(objects)
    }
}

impl std::fmt::Debug for ListingService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListingService")
            .field("provider", &self.provider.id())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use super::*;
    use crate::providers::MemoryProvider;
    use crate::types::ErrorKind;

    async fn service(config: EngineConfig) -> ListingService {
        let provider = MemoryProvider::new();
        let client = provider.bucket("b").unwrap();
        for key in ["35117/a.txt", "35117/b.bin", "35117/sub/c.csv", "351/x.txt", "zz.txt"] {
            client.put(key, Bytes::from(key), None).await.unwrap();
        }
        for name in ["c", "a", "e", "d"] {
            provider.bucket(name).unwrap();
        }
        ListingService::new(Arc::new(provider), Arc::new(config))
    }

    #[tokio::test]
    async fn prefixes_are_raw_strings() {
        let listing = service(EngineConfig::default()).await;

        let keys = listing.list_keys("b", "35117/").await.unwrap();
        assert_eq!(keys, vec!["35117/a.txt", "35117/b.bin", "35117/sub/c.csv"]);

        let keys = listing.list_keys("b", "351").await.unwrap();
        assert_eq!(keys.len(), 4);

        let keys = listing.list_keys("b", "35117/a").await.unwrap();
        assert_eq!(keys, vec!["35117/a.txt"]);
    }

    #[tokio::test]
    async fn list_objects_sorted_and_truncated() {
        let listing = service(EngineConfig::default()).await;

        let all = listing.list_objects("b", None, None).await.unwrap();
        assert_eq!(all.key_count, 5);
        assert!(!all.is_truncated);
        assert_eq!(all.objects.first().unwrap().key, "351/x.txt");
        assert_eq!(all.objects.last().unwrap().key, "zz.txt");

        let some = listing.list_objects("b", Some("35117/"), Some(2)).await.unwrap();
        assert_eq!(some.key_count, 2);
        assert!(some.is_truncated);
        assert_eq!(some.objects[0].size_bytes, "35117/a.txt".len() as u64);
    }

    #[tokio::test]
    async fn list_buckets_applies_start_after_and_cap() {
        let listing = service(EngineConfig::default().with_max_buckets(2)).await;

        let names: Vec<_> = listing
            .list_buckets(None)
            .await
            .unwrap()
            .into_iter()
            .map(|b| b.name)
            .collect();
        assert_eq!(names, vec!["a", "b"]);

        let names: Vec<_> = listing
            .list_buckets(Some("b"))
            .await
            .unwrap()
            .into_iter()
            .map(|b| b.name)
            .collect();
        assert_eq!(names, vec!["c", "d"]);
    }

    #[tokio::test]
    async fn unknown_bucket_fails() {
        let listing = service(EngineConfig::default()).await;
        let err = listing.list_objects("missing", None, None).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }
}
