//! Batch retrieval outcome.

use serde::Serialize;

use crate::fetch::RetrievalResult;
use crate::types::{Error, ErrorKind};

/// Recorded failure of one batch item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemFailure {
    pub kind: ErrorKind,
    pub message: String,
}

impl From<&Error> for ItemFailure {
    fn from(err: &Error) -> Self {
        Self {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

/// Success or failure of one batch item.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum ItemStatus {
    Succeeded(RetrievalResult),
    Failed(ItemFailure),
}

impl ItemStatus {
    #[inline]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded(_))
    }

    /// Returns the failure kind, if the item failed.
    pub fn error_kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Failed(failure) => Some(failure.kind),
            Self::Succeeded(_) => None,
        }
    }
}

/// Outcome for one key of a batch.
#[derive(Debug, Clone, Serialize)]
pub struct ItemOutcome {
    pub key: String,
    #[serde(flatten)]
    pub status: ItemStatus,
}

/// Ordered per-key report of a batch.
///
/// Holds exactly one entry per resolved key, in resolution order.
#[derive(Debug, Clone, Serialize)]
pub struct BatchOutcome {
    pub bucket: String,
    pub succeeded: usize,
    pub failed: usize,
    pub items: Vec<ItemOutcome>,
}

impl BatchOutcome {
    pub(crate) fn new(bucket: impl Into<String>, items: Vec<ItemOutcome>) -> Self {
        let succeeded = items.iter().filter(|i| i.status.is_success()).count();
        Self {
            bucket: bucket.into(),
            succeeded,
            failed: items.len() - succeeded,
            items,
        }
    }

    /// Number of entries, equal to the number of resolved keys.
    #[inline]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Returns the entry for `key`.
    pub fn get(&self, key: &str) -> Option<&ItemOutcome> {
        self.items.iter().find(|item| item.key == key)
    }
}
