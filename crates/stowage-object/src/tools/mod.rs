//! Tool-invocation surface.
//!
//! The host hands over a tool name and already-parsed JSON arguments;
//! [`Toolbox::call`] validates them, runs the engine operation, and returns
//! a JSON result or a [`ToolError`].

use std::str::FromStr;

use derive_more::Deref;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value, json};
use strum::IntoEnumIterator;
use tokio_util::sync::CancellationToken;

use crate::ObjectEngine;
use crate::batch::{BatchRequest, KeySelection};
use crate::fetch::RetrievalRequest;
use crate::types::ObjectRef;

mod args;
mod error;

pub use args::{GetObjectArgs, GetObjectsArgs, ListBucketsArgs, ListObjectsArgs};
pub use error::ToolError;

/// Tools exposed to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[derive(strum::Display, strum::EnumString, strum::EnumIter, strum::IntoStaticStr)]
pub enum ToolName {
    ListBuckets,
    ListObjectsV2,
    GetObject,
    GetObjects,
}

impl ToolName {
    /// Human-readable description shown to the host.
    pub fn description(self) -> &'static str {
        match self {
            Self::ListBuckets => {
                "List the buckets available to the server, optionally starting after a given name."
            }
            Self::ListObjectsV2 => {
                "List objects in a bucket, optionally filtered by key prefix and capped by max_keys."
            }
            Self::GetObject => {
                "Retrieve one object. Text is returned inline, binary content as base64, or the \
                 object is written to output_path. Set extract_text to read text from PDFs."
            }
            Self::GetObjects => {
                "Retrieve many objects by explicit keys or by prefix into output_dir. Every key \
                 gets its own success or failure entry."
            }
        }
    }

    #[cfg(feature = "schema")]
    fn input_schema(self) -> Value {
        let schema = match self {
            Self::ListBuckets => schemars::schema_for!(ListBucketsArgs),
            Self::ListObjectsV2 => schemars::schema_for!(ListObjectsArgs),
            Self::GetObject => schemars::schema_for!(GetObjectArgs),
            Self::GetObjects => schemars::schema_for!(GetObjectsArgs),
        };
        serde_json::to_value(schema).unwrap_or_default()
    }
}

/// Name, description and (with the `schema` feature) input schema of a tool.
#[derive(Debug, Clone, Serialize)]
pub struct ToolDescriptor {
    pub name: ToolName,
    pub description: &'static str,
    #[cfg(feature = "schema")]
    pub input_schema: Value,
}

/// Dispatches tool invocations to an [`ObjectEngine`].
///
/// Dereferences to the engine for direct access to its services.
#[derive(Debug, Clone, Deref)]
pub struct Toolbox {
    engine: ObjectEngine,
}

impl Toolbox {
    pub fn new(engine: ObjectEngine) -> Self {
        Self { engine }
    }

    /// Describes every tool.
    pub fn descriptors() -> Vec<ToolDescriptor> {
        ToolName::iter()
            .map(|name| ToolDescriptor {
                name,
                description: name.description(),
                #[cfg(feature = "schema")]
                input_schema: name.input_schema(),
            })
            .collect()
    }

    /// Invokes tool `name` with JSON `args`.
    pub async fn call(&self, name: &str, args: Value) -> Result<Value, ToolError> {
        self.call_with_cancel(name, args, CancellationToken::new())
            .await
    }

    /// Like [`call`](Self::call); `cancel` stops a running `GetObjects` batch.
    pub async fn call_with_cancel(
        &self,
        name: &str,
        args: Value,
        cancel: CancellationToken,
    ) -> Result<Value, ToolError> {
        let tool =
            ToolName::from_str(name).map_err(|_| ToolError::UnknownTool(name.to_owned()))?;

        match tool {
            ToolName::ListBuckets => {
                let args: ListBucketsArgs = parse(tool, args)?;
                let buckets = self
                    .engine
                    .listing()
                    .list_buckets(args.start_after.as_deref())
                    .await?;
                Ok(json!({ "buckets": buckets }))
            }
            ToolName::ListObjectsV2 => {
                let args: ListObjectsArgs = parse(tool, args)?;
                let listing = self
                    .engine
                    .listing()
                    .list_objects(&args.bucket_name, args.prefix.as_deref(), args.max_keys)
                    .await?;
                encode(tool, &listing)
            }
            ToolName::GetObject => {
                let args: GetObjectArgs = parse(tool, args)?;
                let object = ObjectRef::new(args.bucket_name, args.key)?;
                let mut request = RetrievalRequest::new(object)
                    .with_max_bytes(args.max_bytes)
                    .with_extract_text(args.extract_text);
                if let Some(path) = args.output_path {
                    request = request.with_destination(path);
                }
                let result = self.engine.fetcher().fetch(request).await?;
                encode(tool, &result)
            }
            ToolName::GetObjects => {
                let args: GetObjectsArgs = parse(tool, args)?;
                let selection = match (args.keys, args.prefix) {
                    (Some(keys), _) if !keys.is_empty() => KeySelection::Keys(keys),
                    (_, Some(prefix)) => KeySelection::Prefix(prefix),
                    (keys, None) => KeySelection::Keys(keys.unwrap_or_default()),
                };
                let request = BatchRequest::new(args.bucket_name, selection, args.output_dir)
                    .with_max_bytes(args.max_bytes);
                let outcome = self
                    .engine
                    .batch()
                    .fetch_batch_with_cancel(request, cancel)
                    .await?;
                encode(tool, &outcome)
            }
        }
    }
}

fn parse<T: DeserializeOwned>(tool: ToolName, args: Value) -> Result<T, ToolError> {
    let args = match args {
        Value::Null => Value::Object(Map::new()),
        other => other,
    };
    serde_json::from_value(args).map_err(|source| ToolError::InvalidArguments { tool, source })
}

fn encode<T: Serialize>(tool: ToolName, value: &T) -> Result<Value, ToolError> {
    serde_json::to_value(value).map_err(|source| ToolError::Encode { tool, source })
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use super::*;
    use crate::EngineConfig;
    use crate::providers::MemoryProvider;
    use crate::types::ErrorKind;

    async fn toolbox() -> Toolbox {
        let provider = MemoryProvider::new();
        let client = provider.bucket("b").unwrap();
        client
            .put("docs/a.txt", Bytes::from("alpha"), Some("text/plain"))
            .await
            .unwrap();
        client
            .put("docs/b.png", Bytes::from_static(&[0x89, b'P', b'N', b'G']), None)
            .await
            .unwrap();
        provider.bucket("c").unwrap();
        Toolbox::new(ObjectEngine::new(provider, EngineConfig::default()))
    }

    #[test]
    fn tool_names_round_trip() {
        assert_eq!(ToolName::from_str("ListObjectsV2").unwrap(), ToolName::ListObjectsV2);
        assert_eq!(ToolName::GetObjects.to_string(), "GetObjects");
        let names: Vec<_> = Toolbox::descriptors().into_iter().map(|d| d.name).collect();
        assert_eq!(names.len(), 4);
    }

    #[tokio::test]
    async fn unknown_tool_and_bad_arguments() {
        let toolbox = toolbox().await;

        let err = toolbox.call("DeleteObject", Value::Null).await.unwrap_err();
        assert!(matches!(err, ToolError::UnknownTool(_)));
        assert_eq!(err.kind(), ErrorKind::InvalidRequest);

        let err = toolbox.call("GetObject", json!({ "key": "a" })).await.unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments { .. }));
        assert_eq!(err.to_json()["error"]["kind"], "invalid_request");
    }

    #[tokio::test]
    async fn list_buckets_with_null_arguments() {
        let toolbox = toolbox().await;
        assert_eq!(toolbox.config().max_buckets, 5);
        let value = toolbox.call("ListBuckets", Value::Null).await.unwrap();
        assert_eq!(value["buckets"], json!([{ "name": "b" }, { "name": "c" }]));

        let value = toolbox
            .call("ListBuckets", json!({ "StartAfter": "b" }))
            .await
            .unwrap();
        assert_eq!(value["buckets"], json!([{ "name": "c" }]));
    }

    #[tokio::test]
    async fn list_objects_v2() {
        let toolbox = toolbox().await;
        let value = toolbox
            .call("ListObjectsV2", json!({ "bucket_name": "b", "prefix": "docs/a" }))
            .await
            .unwrap();
        assert_eq!(value["key_count"], 1);
        assert_eq!(value["objects"][0]["key"], "docs/a.txt");
        assert_eq!(value["objects"][0]["size_bytes"], 5);
    }

    #[tokio::test]
    async fn get_object_inline_text_and_binary() {
        let toolbox = toolbox().await;

        let value = toolbox
            .call("GetObject", json!({ "bucket_name": "b", "key": "docs/a.txt" }))
            .await
            .unwrap();
        assert_eq!(value["classification"], "text");
        assert_eq!(value["text"], "alpha");
        assert_eq!(value["content_type"], "text/plain");
        assert_eq!(value["size_bytes"], 5);
        assert!(value["last_modified"].is_string());

        let value = toolbox
            .call("GetObject", json!({ "Bucket": "b", "Key": "docs/b.png" }))
            .await
            .unwrap();
        assert_eq!(value["classification"], "binary");
        assert_eq!(value["data_base64"], "iVBORw==");
        assert_eq!(value["uri"], "s3://b/docs/b.png");
    }

    #[tokio::test]
    async fn get_object_too_large_is_an_error() {
        let toolbox = toolbox().await;
        let err = toolbox
            .call(
                "GetObject",
                json!({ "bucket_name": "b", "key": "docs/a.txt", "max_bytes": 2 }),
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TooLarge);
    }

    #[tokio::test]
    async fn get_objects_reports_every_key() {
        let toolbox = toolbox().await;
        let dir = tempfile::tempdir().unwrap();

        let value = toolbox
            .call(
                "GetObjects",
                json!({
                    "bucket_name": "b",
                    "keys": ["docs/a.txt", "docs/missing.txt"],
                    "output_dir": dir.path(),
                }),
            )
            .await
            .unwrap();

        let items = value["items"].as_array().unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0]["status"], "succeeded");
        assert_eq!(items[0]["detail"]["saved_to"], json!(dir.path().join("a.txt")));
        assert_eq!(items[1]["status"], "failed");
        assert_eq!(items[1]["detail"]["kind"], "not_found");
        assert_eq!(value["succeeded"], 1);

        let err = toolbox
            .call(
                "GetObjects",
                json!({ "bucket_name": "b", "output_dir": dir.path() }),
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidRequest);

        let whole = tempfile::tempdir().unwrap();
        let value = toolbox
            .call(
                "GetObjects",
                json!({ "bucket_name": "b", "prefix": "", "output_dir": whole.path() }),
            )
            .await
            .unwrap();
        assert_eq!(value["succeeded"], 2);
    }
}
