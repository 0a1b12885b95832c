//! Result type for [`ObjectStoreClient::get`](super::ObjectStoreClient::get).

use std::fmt;

use bytes::Bytes;
use futures::stream::BoxStream;

use crate::types::{ObjectMetadata, Result};

/// Body of an object, as a stream of chunks.
pub type BodyStream = BoxStream<'static, Result<Bytes>>;

/// Result of a successful [`ObjectStoreClient::get`](super::ObjectStoreClient::get) call.
pub struct GetOutput {
    /// Metadata reported alongside the body.
    pub metadata: ObjectMetadata,
    /// Body chunks; nothing is transferred until polled.
    pub body: BodyStream,
}

impl fmt::Debug for GetOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GetOutput")
            .field("metadata", &self.metadata)
            .finish_non_exhaustive()
    }
}
