//! Batch retrieval request.

use std::path::{Path, PathBuf};

/// Which keys a batch retrieves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeySelection {
    /// Explicit keys, retrieved verbatim in the given order.
    Keys(Vec<String>),
    /// Every key starting with the prefix, in key order. An empty prefix
    /// selects the whole bucket.
    Prefix(String),
}

/// Retrieval of many objects from one bucket into one directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchRequest {
    bucket: String,
    selection: KeySelection,
    output_dir: PathBuf,
    max_bytes: Option<u64>,
}

impl BatchRequest {
    /// Retrieves the given keys.
    pub fn keys<I, S>(bucket: impl Into<String>, keys: I, output_dir: impl Into<PathBuf>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let keys = keys.into_iter().map(Into::into).collect();
        Self::new(bucket, KeySelection::Keys(keys), output_dir)
    }

    /// Retrieves every key under `prefix`.
    pub fn prefix(
        bucket: impl Into<String>,
        prefix: impl Into<String>,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        Self::new(bucket, KeySelection::Prefix(prefix.into()), output_dir)
    }

    pub fn new(
        bucket: impl Into<String>,
        selection: KeySelection,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            bucket: bucket.into(),
            selection,
            output_dir: output_dir.into(),
            max_bytes: None,
        }
    }

    /// Set the per-object byte ceiling.
    #[must_use]
    pub fn with_max_bytes(mut self, max_bytes: Option<u64>) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    #[inline]
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    #[inline]
    pub fn selection(&self) -> &KeySelection {
        &self.selection
    }

    #[inline]
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    #[inline]
    pub fn max_bytes(&self) -> Option<u64> {
        self.max_bytes
    }
}
