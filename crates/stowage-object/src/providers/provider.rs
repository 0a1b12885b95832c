//! Provider trait for resolving buckets to store clients.

use crate::client::ObjectStoreClient;
use crate::types::{BucketInfo, Result};

/// Source of buckets and per-bucket clients.
///
/// Implementations decide which buckets exist and which are reachable; the
/// engine never talks to a store except through a client handed out here.
#[async_trait::async_trait]
pub trait StoreProvider: Send + Sync + 'static {
    /// Unique identifier (e.g. "s3", "local").
    fn id(&self) -> &'static str;

    /// Returns the buckets this provider exposes, sorted by name.
    async fn list_buckets(&self) -> Result<Vec<BucketInfo>>;

    /// Returns a client bound to `bucket`.
    ///
    /// Fails with `AccessDenied` for buckets outside the provider's allowlist
    /// and with `NotFound` for buckets it does not serve.
    fn client(&self, bucket: &str) -> Result<ObjectStoreClient>;
}
