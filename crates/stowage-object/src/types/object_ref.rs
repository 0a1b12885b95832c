//! Immutable reference to a remote object.

use std::fmt;

use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};

use super::{Error, Result};

/// Identifies an object by bucket and key.
///
/// Fields are private so that a constructed reference can never be changed;
/// derive a new one instead.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectRef {
    bucket: String,
    key: String,
}

impl ObjectRef {
    /// Creates a new reference, rejecting empty bucket names and keys.
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Result<Self> {
        let bucket = bucket.into();
        let key = key.into();

        if bucket.trim().is_empty() {
            return Err(Error::invalid_request("bucket name must not be empty"));
        }
        if key.is_empty() {
            return Err(Error::invalid_request(format!(
                "object key in bucket '{bucket}' must not be empty"
            )));
        }

        Ok(Self { bucket, key })
    }

    /// Returns the bucket name.
    #[inline]
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Returns the object key.
    #[inline]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Returns the last `/`-separated segment of the key.
    ///
    /// Empty for keys ending in `/` (directory markers).
    pub fn file_name(&self) -> &str {
        base_name(&self.key)
    }

    /// Returns the `s3://bucket/key` URI of this object.
    pub fn uri(&self) -> String {
        format!("s3://{}/{}", self.bucket, self.key)
    }
}

/// Returns the last `/`-separated segment of `key`.
pub(crate) fn base_name(key: &str) -> &str {
    key.rsplit('/').next().unwrap_or(key)
}

impl fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.bucket, self.key)
    }
}

impl Serialize for ObjectRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("ObjectRef", 3)?;
        state.serialize_field("bucket", &self.bucket)?;
        state.serialize_field("key", &self.key)?;
        state.serialize_field("uri", &self.uri())?;
        state.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_parts() {
        assert!(ObjectRef::new("", "a.txt").is_err());
        assert!(ObjectRef::new("bucket", "").is_err());
    }

    #[test]
    fn file_name_is_last_segment() {
        let object = ObjectRef::new("b", "reports/2024/q1.pdf").unwrap();
        assert_eq!(object.file_name(), "q1.pdf");

        let object = ObjectRef::new("b", "top.txt").unwrap();
        assert_eq!(object.file_name(), "top.txt");

        let object = ObjectRef::new("b", "folder/").unwrap();
        assert_eq!(object.file_name(), "");
    }

    #[test]
    fn uri_and_display() {
        let object = ObjectRef::new("b", "x/y.json").unwrap();
        assert_eq!(object.uri(), "s3://b/x/y.json");
        assert_eq!(object.to_string(), "b/x/y.json");
    }

    #[test]
    fn serializes_with_uri() {
        let object = ObjectRef::new("b", "k").unwrap();
        let value = serde_json::to_value(&object).unwrap();
        assert_eq!(value["bucket"], "b");
        assert_eq!(value["key"], "k");
        assert_eq!(value["uri"], "s3://b/k");
    }
}
