//! In-memory provider using [`object_store::memory::InMemory`].

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use object_store::memory::InMemory;

use super::{StoreProvider, validate_bucket_name};
use crate::client::ObjectStoreClient;
use crate::types::{BucketInfo, Error, Result};

/// Provider holding every bucket in process memory.
///
/// Buckets exist once created with [`bucket`](Self::bucket); nothing is
/// persisted.
#[derive(Debug, Default)]
pub struct MemoryProvider {
    buckets: RwLock<HashMap<String, ObjectStoreClient>>,
}

impl MemoryProvider {
    pub const ID: &str = "memory";

    /// Create a provider without buckets.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the client for `name`, creating an empty bucket if needed.
    pub fn bucket(&self, name: &str) -> Result<ObjectStoreClient> {
        validate_bucket_name(name)?;
        let mut buckets = self.buckets.write().unwrap_or_else(PoisonError::into_inner);
        let client = buckets
            .entry(name.to_owned())
            .or_insert_with(|| ObjectStoreClient::new(name, InMemory::new()));
        Ok(client.clone())
    }
}

#[async_trait::async_trait]
impl StoreProvider for MemoryProvider {
    fn id(&self) -> &'static str {
        Self::ID
    }

    async fn list_buckets(&self) -> Result<Vec<BucketInfo>> {
        let buckets = self.buckets.read().unwrap_or_else(PoisonError::into_inner);
        let mut names: Vec<_> = buckets.keys().map(BucketInfo::new).collect();
        names.sort();
        Ok(names)
    }

    fn client(&self, bucket: &str) -> Result<ObjectStoreClient> {
        let buckets = self.buckets.read().unwrap_or_else(PoisonError::into_inner);
        buckets
            .get(bucket)
            .cloned()
            .ok_or_else(|| Error::bucket_not_found(bucket))
    }
}
