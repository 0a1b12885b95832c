#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

/// Tracing target for object-store client calls.
pub const TRACING_TARGET_CLIENT: &str = "stowage_object::client";

/// Tracing target for single-object retrieval.
pub const TRACING_TARGET_FETCH: &str = "stowage_object::fetch";

/// Tracing target for batch retrieval.
pub const TRACING_TARGET_BATCH: &str = "stowage_object::batch";

/// Tracing target for bucket and object listing.
pub const TRACING_TARGET_LISTING: &str = "stowage_object::listing";

/// Tracing target for PDF text extraction.
pub const TRACING_TARGET_PDF: &str = "stowage_object::pdf";

pub mod batch;
pub mod classify;
pub mod client;
mod config;
mod engine;
pub mod fetch;
pub mod guard;
pub mod listing;
pub mod pdf;
/// Store providers (S3, local filesystem, in-memory).
pub mod providers;
/// Tool-invocation surface: argument types and dispatch.
pub mod tools;
/// Shared types (errors, object references, metadata).
pub mod types;

#[doc(hidden)]
pub mod prelude;

pub use config::EngineConfig;
pub use engine::ObjectEngine;
pub use types::{Error, ErrorKind, Result};
