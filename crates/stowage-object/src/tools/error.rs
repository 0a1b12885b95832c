//! Tool dispatch errors.

use serde_json::{Value, json};

use super::ToolName;
use crate::types::{Error, ErrorKind};

/// Failure of a tool invocation.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    /// No tool with this name exists.
    #[error("unknown tool '{0}'")]
    UnknownTool(String),

    /// The arguments do not match the tool's schema.
    #[error("invalid arguments for {tool}: {source}")]
    InvalidArguments {
        tool: ToolName,
        #[source]
        source: serde_json::Error,
    },

    /// The engine rejected or failed the operation.
    #[error(transparent)]
    Engine(#[from] Error),

    /// The result could not be encoded as JSON.
    #[error("failed to encode {tool} result: {source}")]
    Encode {
        tool: ToolName,
        #[source]
        source: serde_json::Error,
    },
}

impl ToolError {
    /// Returns the serialisable kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::UnknownTool(_) | Self::InvalidArguments { .. } => ErrorKind::InvalidRequest,
            Self::Engine(err) => err.kind(),
            Self::Encode { .. } => ErrorKind::Io,
        }
    }

    /// Renders the error as the JSON object returned to the host.
    pub fn to_json(&self) -> Value {
        json!({
            "error": {
                "kind": self.kind(),
                "message": self.to_string(),
            }
        })
    }
}
