//! Tool argument types.
//!
//! Field names follow the snake_case tool schema; the S3 API spellings are
//! accepted as aliases.

use std::path::PathBuf;

#[cfg(feature = "schema")]
use schemars::JsonSchema;
use serde::Deserialize;

/// Arguments of `ListBuckets`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
pub struct ListBucketsArgs {
    /// Only return buckets sorted after this name.
    #[serde(default, alias = "StartAfter")]
    pub start_after: Option<String>,
}

/// Arguments of `ListObjectsV2`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
pub struct ListObjectsArgs {
    /// Bucket to list.
    #[serde(alias = "Bucket", alias = "bucket")]
    pub bucket_name: String,
    /// Only return keys starting with this string.
    #[serde(default, alias = "Prefix")]
    pub prefix: Option<String>,
    /// Maximum number of keys to return.
    #[serde(default, alias = "MaxKeys")]
    pub max_keys: Option<usize>,
}

/// Arguments of `GetObject`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
pub struct GetObjectArgs {
    /// Bucket holding the object.
    #[serde(alias = "Bucket", alias = "bucket")]
    pub bucket_name: String,
    /// Object key.
    #[serde(alias = "Key")]
    pub key: String,
    /// Write the object to this path instead of returning it inline.
    #[serde(default)]
    pub output_path: Option<PathBuf>,
    /// Fail with `too_large` if the object exceeds this many bytes.
    #[serde(default)]
    pub max_bytes: Option<u64>,
    /// Extract text from PDF documents.
    #[serde(default)]
    pub extract_text: bool,
}

/// Arguments of `GetObjects`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
pub struct GetObjectsArgs {
    /// Bucket holding the objects.
    #[serde(alias = "Bucket", alias = "bucket")]
    pub bucket_name: String,
    /// Explicit keys; takes precedence over `prefix`.
    #[serde(default)]
    pub keys: Option<Vec<String>>,
    /// Retrieve every key starting with this string; `""` retrieves the
    /// whole bucket.
    #[serde(default, alias = "Prefix")]
    pub prefix: Option<String>,
    /// Directory the objects are written to.
    pub output_dir: PathBuf,
    /// Per-object byte ceiling.
    #[serde(default)]
    pub max_bytes: Option<u64>,
}
