//! Convenience re-exports.

pub use crate::batch::{
    BatchOrchestrator, BatchOutcome, BatchRequest, ItemFailure, ItemOutcome, ItemStatus,
    KeySelection,
};
pub use crate::classify::{ContentClass, classify};
pub use crate::client::ObjectStoreClient;
pub use crate::fetch::{Classification, ObjectFetcher, Payload, RetrievalRequest, RetrievalResult};
pub use crate::guard::{Admission, SizeGuard};
pub use crate::listing::{ListingService, ObjectListing};
pub use crate::providers::{
    LocalProvider, MemoryProvider, S3Config, S3Provider, StoreProvider,
};
pub use crate::tools::{ToolDescriptor, ToolError, ToolName, Toolbox};
pub use crate::types::{
    BucketInfo, Error, ErrorKind, ObjectMetadata, ObjectRef, ObjectSummary, Result,
};
pub use crate::{EngineConfig, ObjectEngine};
