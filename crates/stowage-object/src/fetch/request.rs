//! Single-object retrieval request.

use std::path::{Path, PathBuf};

use crate::types::ObjectRef;

/// What to retrieve and how to deliver it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetrievalRequest {
    object: ObjectRef,
    max_bytes: Option<u64>,
    destination: Option<PathBuf>,
    extract_text: bool,
}

impl RetrievalRequest {
    /// Inline retrieval of `object` without a size ceiling.
    pub fn new(object: ObjectRef) -> Self {
        Self {
            object,
            max_bytes: None,
            destination: None,
            extract_text: false,
        }
    }

    /// Set the byte ceiling; `None` removes it.
    #[must_use]
    pub fn with_max_bytes(mut self, max_bytes: Option<u64>) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    /// Write the body to `path` instead of returning it inline.
    ///
    /// A directory path (existing, or ending in `/`) receives the key's base
    /// name.
    #[must_use]
    pub fn with_destination(mut self, path: impl Into<PathBuf>) -> Self {
        self.destination = Some(path.into());
        self
    }

    /// Request text extraction for PDF payloads.
    #[must_use]
    pub fn with_extract_text(mut self, extract_text: bool) -> Self {
        self.extract_text = extract_text;
        self
    }

    #[inline]
    pub fn object(&self) -> &ObjectRef {
        &self.object
    }

    #[inline]
    pub fn max_bytes(&self) -> Option<u64> {
        self.max_bytes
    }

    #[inline]
    pub fn destination(&self) -> Option<&Path> {
        self.destination.as_deref()
    }

    #[inline]
    pub fn extract_text(&self) -> bool {
        self.extract_text
    }
}
