//! Store providers: S3, local filesystem, and in-memory.

mod local;
mod memory;
mod provider;
mod s3;

pub use local::LocalProvider;
pub use memory::MemoryProvider;
pub use provider::StoreProvider;
pub use s3::{S3Config, S3Provider};

use crate::types::{Error, Result};

/// Rejects bucket names that cannot address a single bucket.
pub(crate) fn validate_bucket_name(bucket: &str) -> Result<()> {
    let invalid = bucket.trim().is_empty()
        || bucket == "."
        || bucket == ".."
        || bucket.contains(['/', '\\']);
    if invalid {
        return Err(Error::invalid_request(format!(
            "invalid bucket name '{bucket}'"
        )));
    }
    Ok(())
}
