//! Shared types for the retrieval engine.

mod error;
mod object_metadata;
mod object_ref;

pub use error::{Error, ErrorKind, Result};
pub use object_metadata::{BucketInfo, ObjectMetadata, ObjectSummary};
pub(crate) use object_ref::base_name;
pub use object_ref::ObjectRef;
