//! Object and bucket metadata as reported by the store.

use jiff::Timestamp;
use object_store::ObjectMeta;
use serde::Serialize;

/// Content type reported when the store declares none.
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Attributes of a stored object.
///
/// A read-only snapshot fetched fresh on every call; never cached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ObjectMetadata {
    /// Declared media type, or [`DEFAULT_CONTENT_TYPE`].
    pub content_type: String,
    /// Size of the object body in bytes.
    pub size_bytes: u64,
    /// Last modification time, if the store reports one.
    pub last_modified: Option<Timestamp>,
    /// Entity tag, if the store reports one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub e_tag: Option<String>,
}

impl ObjectMetadata {
    /// Builds metadata from store attributes and an optional content type.
    pub fn from_meta(meta: &ObjectMeta, content_type: Option<String>) -> Self {
        Self {
            content_type: content_type
                .filter(|ct| !ct.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_owned()),
            size_bytes: meta.size,
            last_modified: timestamp(meta),
            e_tag: meta.e_tag.clone(),
        }
    }
}

/// Listing entry for a single object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ObjectSummary {
    /// Full object key.
    pub key: String,
    /// Size in bytes.
    pub size_bytes: u64,
    /// Last modification time, if reported.
    pub last_modified: Option<Timestamp>,
    /// Entity tag, if reported.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub e_tag: Option<String>,
}

impl From<&ObjectMeta> for ObjectSummary {
    fn from(meta: &ObjectMeta) -> Self {
        Self {
            key: meta.location.to_string(),
            size_bytes: meta.size,
            last_modified: timestamp(meta),
            e_tag: meta.e_tag.clone(),
        }
    }
}

/// A bucket visible to the configured provider.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct BucketInfo {
    /// Bucket name.
    pub name: String,
}

impl BucketInfo {
    /// Creates a bucket entry.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

fn timestamp(meta: &ObjectMeta) -> Option<Timestamp> {
    let modified = meta.last_modified;
    Timestamp::new(modified.timestamp(), modified.timestamp_subsec_nanos() as i32).ok()
}

#[cfg(test)]
mod tests {
    use object_store::path::Path;

    use super::*;

    fn meta(size: u64) -> ObjectMeta {
        ObjectMeta {
            location: Path::from("dir/file.csv"),
            last_modified: Default::default(),
            size,
            e_tag: Some("\"abc\"".to_owned()),
            version: None,
        }
    }

    #[test]
    fn missing_content_type_defaults_to_octet_stream() {
        let metadata = ObjectMetadata::from_meta(&meta(12), None);
        assert_eq!(metadata.content_type, DEFAULT_CONTENT_TYPE);
        assert_eq!(metadata.size_bytes, 12);

        let metadata = ObjectMetadata::from_meta(&meta(12), Some(" ".to_owned()));
        assert_eq!(metadata.content_type, DEFAULT_CONTENT_TYPE);
    }

    #[test]
    fn summary_carries_key_and_size() {
        let summary = ObjectSummary::from(&meta(7));
        assert_eq!(summary.key, "dir/file.csv");
        assert_eq!(summary.size_bytes, 7);
        assert_eq!(summary.last_modified, Some(Timestamp::UNIX_EPOCH));
    }
}
