//! Error types for object retrieval.

use std::path::PathBuf;
use std::time::Duration;

use serde::Serialize;

use super::ObjectRef;

/// Result type for all engine operations in this crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Stable, serialisable classification of an [`Error`].
///
/// Batch outcomes and tool responses carry this instead of the full error so
/// that callers can decide whether to retry, skip, or abort.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[derive(strum::Display, strum::IntoStaticStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ErrorKind {
    NotFound,
    AccessDenied,
    TooLarge,
    UnsupportedFormat,
    ExtractionUnavailable,
    Timeout,
    StoreError,
    Io,
    InvalidRequest,
    Cancelled,
}

/// Unified error type for object retrieval.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The bucket or key does not exist.
    #[error("object '{key}' not found in bucket '{bucket}'")]
    NotFound { bucket: String, key: String },

    /// The bucket does not exist or is not served by the provider.
    #[error("bucket '{bucket}' not found")]
    BucketNotFound { bucket: String },

    /// The credentials lack permission, or the bucket is not allowlisted.
    #[error("access denied to '{bucket}/{key}': {message}")]
    AccessDenied {
        bucket: String,
        key: String,
        message: String,
    },

    /// The size guard rejected the object.
    #[error("object '{key}' in bucket '{bucket}' has {size} bytes, exceeding the {limit} byte limit")]
    TooLarge {
        bucket: String,
        key: String,
        size: u64,
        limit: u64,
    },

    /// Text extraction was attempted on a non-PDF or corrupt payload.
    #[error("cannot extract text from '{key}' in bucket '{bucket}': {message}")]
    UnsupportedFormat {
        bucket: String,
        key: String,
        message: String,
    },

    /// PDF extraction is not compiled into this build.
    #[error(
        "cannot extract text from '{key}' in bucket '{bucket}': PDF extraction is not \
         available in this build (enable the `pdf` feature)"
    )]
    ExtractionUnavailable { bucket: String, key: String },

    /// A remote call exceeded its time bound.
    #[error("{operation} for '{key}' in bucket '{bucket}' timed out after {after:?}")]
    Timeout {
        operation: &'static str,
        bucket: String,
        key: String,
        after: Duration,
    },

    /// Any other remote-store failure, with the store's original message.
    #[error("object store error for '{key}' in bucket '{bucket}': {message}")]
    Store {
        bucket: String,
        key: String,
        message: String,
        #[source]
        source: Option<object_store::Error>,
    },

    /// The store's bucket catalog could not be read.
    #[error("failed to list buckets: {message}")]
    Catalog { message: String },

    /// Writing the local destination failed.
    #[error("failed to write '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The request arguments are malformed.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// A batch item was never started because the batch was cancelled.
    #[error("retrieval of '{key}' was cancelled before it started")]
    Cancelled { key: String },
}

impl Error {
    /// Maps an [`object_store::Error`] raised for `bucket`/`key`.
    pub fn from_store(err: object_store::Error, bucket: &str, key: &str) -> Self {
        match err {
            object_store::Error::NotFound { .. } => Self::NotFound {
                bucket: bucket.to_owned(),
                key: key.to_owned(),
            },
            object_store::Error::PermissionDenied { .. }
            | object_store::Error::Unauthenticated { .. } => Self::AccessDenied {
                bucket: bucket.to_owned(),
                key: key.to_owned(),
                message: err.to_string(),
            },
            other => Self::Store {
                bucket: bucket.to_owned(),
                key: key.to_owned(),
                message: other.to_string(),
                source: Some(other),
            },
        }
    }

    /// Creates an error for a bucket the provider does not serve.
    pub fn bucket_not_found(bucket: &str) -> Self {
        Self::BucketNotFound {
            bucket: bucket.to_owned(),
        }
    }

    /// Creates an access error for a bucket outside the allowlist.
    pub fn bucket_not_allowed(bucket: &str) -> Self {
        Self::AccessDenied {
            bucket: bucket.to_owned(),
            key: String::new(),
            message: "bucket is not in the configured allowlist".to_owned(),
        }
    }

    /// Creates a store error without an underlying source.
    pub fn store(bucket: &str, key: &str, message: impl Into<String>) -> Self {
        Self::Store {
            bucket: bucket.to_owned(),
            key: key.to_owned(),
            message: message.into(),
            source: None,
        }
    }

    /// Creates a size guard rejection for `object`.
    pub fn too_large(object: &ObjectRef, size: u64, limit: u64) -> Self {
        Self::TooLarge {
            bucket: object.bucket().to_owned(),
            key: object.key().to_owned(),
            size,
            limit,
        }
    }

    /// Creates an extraction error for a payload that is not a readable PDF.
    pub fn unsupported_format(object: &ObjectRef, message: impl Into<String>) -> Self {
        Self::UnsupportedFormat {
            bucket: object.bucket().to_owned(),
            key: object.key().to_owned(),
            message: message.into(),
        }
    }

    /// Creates the error for extraction requested without the `pdf` feature.
    pub fn extraction_unavailable(object: &ObjectRef) -> Self {
        Self::ExtractionUnavailable {
            bucket: object.bucket().to_owned(),
            key: object.key().to_owned(),
        }
    }

    /// Creates a timeout error.
    pub fn timeout(operation: &'static str, bucket: &str, key: &str, after: Duration) -> Self {
        Self::Timeout {
            operation,
            bucket: bucket.to_owned(),
            key: key.to_owned(),
            after,
        }
    }

    /// Creates a destination write error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Creates an invalid request error.
    pub fn invalid_request(msg: impl Into<String>) -> Self {
        Self::InvalidRequest(msg.into())
    }

    /// Returns the serialisable kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. } | Self::BucketNotFound { .. } => ErrorKind::NotFound,
            Self::AccessDenied { .. } => ErrorKind::AccessDenied,
            Self::TooLarge { .. } => ErrorKind::TooLarge,
            Self::UnsupportedFormat { .. } => ErrorKind::UnsupportedFormat,
            Self::ExtractionUnavailable { .. } => ErrorKind::ExtractionUnavailable,
            Self::Timeout { .. } => ErrorKind::Timeout,
            Self::Store { .. } | Self::Catalog { .. } => ErrorKind::StoreError,
            Self::Io { .. } => ErrorKind::Io,
            Self::InvalidRequest(_) => ErrorKind::InvalidRequest,
            Self::Cancelled { .. } => ErrorKind::Cancelled,
        }
    }

    /// Whether the caller may reasonably retry this operation.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Timeout { .. } | Self::Store { .. } | Self::Catalog { .. } | Self::Cancelled { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_maps_from_store() {
        let err = object_store::Error::NotFound {
            path: "a/b.txt".into(),
            source: "missing".into(),
        };
        let err = Error::from_store(err, "bucket", "a/b.txt");
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(!err.is_retryable());
        assert!(err.to_string().contains("a/b.txt"));
    }

    #[test]
    fn permission_denied_maps_to_access_denied() {
        let err = object_store::Error::PermissionDenied {
            path: "secret".into(),
            source: "forbidden".into(),
        };
        let err = Error::from_store(err, "bucket", "secret");
        assert_eq!(err.kind(), ErrorKind::AccessDenied);
    }

    #[test]
    fn other_store_errors_keep_message() {
        let err = object_store::Error::Generic {
            store: "S3",
            source: "connection reset".into(),
        };
        let err = Error::from_store(err, "bucket", "key");
        assert_eq!(err.kind(), ErrorKind::StoreError);
        assert!(err.is_retryable());
        assert!(err.to_string().contains("connection reset"));
    }

    #[test]
    fn extraction_errors_name_bucket_and_key() {
        let object = ObjectRef::new("reports", "2024/q1.pdf").unwrap();

        let err = Error::extraction_unavailable(&object);
        assert_eq!(err.kind(), ErrorKind::ExtractionUnavailable);
        let message = err.to_string();
        assert!(message.contains("reports") && message.contains("2024/q1.pdf"));

        let err = Error::unsupported_format(&object, "corrupt xref table");
        assert_eq!(err.kind(), ErrorKind::UnsupportedFormat);
        let message = err.to_string();
        assert!(message.contains("reports") && message.contains("corrupt xref table"));
    }

    #[test]
    fn kind_display_is_snake_case() {
        assert_eq!(ErrorKind::TooLarge.to_string(), "too_large");
        assert_eq!(ErrorKind::ExtractionUnavailable.to_string(), "extraction_unavailable");
    }
}
