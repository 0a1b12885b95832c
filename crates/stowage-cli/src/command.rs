//! Subcommands and their dispatch through the tool surface.

use std::path::PathBuf;

use anyhow::{Context, bail};
use clap::Subcommand;
use serde_json::{Value, json};
use stowage_object::tools::{ToolName, Toolbox};
use tokio_util::sync::CancellationToken;

use crate::TRACING_TARGET_COMMAND;

/// Operation to run; every variant maps onto one tool.
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// List the buckets available to this configuration.
    ListBuckets {
        /// Only list buckets sorted after this name.
        #[arg(long)]
        start_after: Option<String>,
    },

    /// List objects in a bucket.
    ListObjects {
        /// Bucket to list.
        bucket: String,
        /// Only list keys starting with this string.
        #[arg(long)]
        prefix: Option<String>,
        /// Maximum number of keys to return.
        #[arg(long)]
        max_keys: Option<usize>,
    },

    /// Retrieve one object.
    GetObject {
        /// Bucket holding the object.
        bucket: String,
        /// Object key.
        key: String,
        /// Write the object here instead of printing it.
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
        /// Refuse objects larger than this many bytes.
        #[arg(long)]
        max_bytes: Option<u64>,
        /// Extract text from PDF documents.
        #[arg(long)]
        extract_text: bool,
    },

    /// Retrieve many objects into a directory.
    GetObjects {
        /// Bucket holding the objects.
        bucket: String,
        /// Key to retrieve; repeat for several keys.
        #[arg(long = "key")]
        keys: Vec<String>,
        /// Retrieve every key starting with this string.
        #[arg(long)]
        prefix: Option<String>,
        /// Directory the objects are written to.
        #[arg(long)]
        output_dir: PathBuf,
        /// Refuse objects larger than this many bytes.
        #[arg(long)]
        max_bytes: Option<u64>,
    },

    /// Invoke a tool by name with JSON arguments.
    Call {
        /// Tool name (e.g. `GetObject`).
        tool: String,
        /// Arguments as a JSON object.
        #[arg(long)]
        args: Option<String>,
    },

    /// Describe the available tools.
    Tools,
}

impl Command {
    /// Returns the tool name and JSON arguments of this command.
    fn invocation(&self) -> anyhow::Result<(String, Value)> {
        let invocation = match self {
            Self::ListBuckets { start_after } => (
                ToolName::ListBuckets.to_string(),
                json!({ "start_after": start_after }),
            ),
            Self::ListObjects {
                bucket,
                prefix,
                max_keys,
            } => (
                ToolName::ListObjectsV2.to_string(),
                json!({ "bucket_name": bucket, "prefix": prefix, "max_keys": max_keys }),
            ),
            Self::GetObject {
                bucket,
                key,
                output,
                max_bytes,
                extract_text,
            } => (
                ToolName::GetObject.to_string(),
                json!({
                    "bucket_name": bucket,
                    "key": key,
                    "output_path": output,
                    "max_bytes": max_bytes,
                    "extract_text": extract_text,
                }),
            ),
            Self::GetObjects {
                bucket,
                keys,
                prefix,
                output_dir,
                max_bytes,
            } => (
                ToolName::GetObjects.to_string(),
                json!({
                    "bucket_name": bucket,
                    "keys": (!keys.is_empty()).then_some(keys),
                    "prefix": prefix,
                    "output_dir": output_dir,
                    "max_bytes": max_bytes,
                }),
            ),
            Self::Call { tool, args } => {
                let args = match args {
                    Some(raw) => serde_json::from_str(raw)
                        .with_context(|| format!("arguments for {tool} are not valid JSON"))?,
                    None => Value::Null,
                };
                (tool.clone(), args)
            }
            Self::Tools => bail!("`tools` does not invoke a tool"),
        };
        Ok(invocation)
    }

    /// Runs the command and prints its JSON result to stdout.
    pub async fn execute(&self, toolbox: &Toolbox, cancel: CancellationToken) -> anyhow::Result<()> {
        if let Self::Tools = self {
            return print_json(&json!({ "tools": Toolbox::descriptors() }));
        }

        let (tool, args) = self.invocation()?;
        tracing::debug!(
            target: TRACING_TARGET_COMMAND,
            tool = %tool,
            "Invoking tool"
        );

        match toolbox.call_with_cancel(&tool, args, cancel).await {
            Ok(result) => print_json(&result),
            Err(err) => {
                print_json(&err.to_json())?;
                Err(err).with_context(|| format!("{tool} failed"))
            }
        }
    }
}

fn print_json(value: &Value) -> anyhow::Result<()> {
    let rendered = serde_json::to_string_pretty(value).context("failed to render result")?;
    println!("{rendered}");
    Ok(())
}
