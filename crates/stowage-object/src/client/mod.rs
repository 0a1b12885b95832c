//! Bucket-scoped object-store client backed by [`object_store::ObjectStore`].
//!
//! [`ObjectStoreClient`] is a thin, cloneable wrapper around
//! `Arc<dyn ObjectStore>` bound to one bucket. Every remote call is
//! instrumented with [`tracing`] and maps store errors into the crate
//! [`Error`] with bucket and key context.

use std::sync::Arc;

use bytes::Bytes;
use futures::TryStreamExt;
use futures::stream::BoxStream;
use object_store::path::Path;
use object_store::{Attribute, GetOptions, GetResult, ObjectMeta, ObjectStore, PutOptions};

use crate::types::{Error, ObjectMetadata, Result};

mod get_output;

pub use get_output::{BodyStream, GetOutput};

/// Cloneable handle to one bucket of any [`ObjectStore`] backend.
///
/// Keys are used verbatim: they are parsed, not percent-encoded, into an
/// [`object_store::path::Path`], so a key returned by a listing addresses the
/// same object when passed back in.
#[derive(Clone, Debug)]
pub struct ObjectStoreClient {
    bucket: String,
    store: Arc<dyn ObjectStore>,
}

impl ObjectStoreClient {
    /// Wrap a concrete [`ObjectStore`] implementation serving `bucket`.
    pub fn new(bucket: impl Into<String>, store: impl ObjectStore) -> Self {
        Self::from_arc(bucket, Arc::new(store))
    }

    /// Wrap an already shared [`ObjectStore`].
    pub fn from_arc(bucket: impl Into<String>, store: Arc<dyn ObjectStore>) -> Self {
        Self {
            bucket: bucket.into(),
            store,
        }
    }

    /// Returns the bucket this client is bound to.
    #[inline]
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Fetch object metadata (size, content type, last modified) without the body.
    #[tracing::instrument(name = "object.head", skip(self), fields(bucket = %self.bucket))]
    pub async fn head(&self, key: &str) -> Result<ObjectMetadata> {
        let options = GetOptions {
            head: true,
            ..Default::default()
        };
        let result = self
            .store
            .get_opts(&self.path(key)?, options)
            .await
            .map_err(|e| Error::from_store(e, &self.bucket, key))?;

        Ok(ObjectMetadata::from_meta(&result.meta, content_type(&result)))
    }

    /// Start downloading `key`, returning its metadata and a body stream.
    ///
    /// Nothing beyond the response headers is transferred until the stream
    /// is polled.
    #[tracing::instrument(name = "object.get", skip(self), fields(bucket = %self.bucket))]
    pub async fn get(&self, key: &str) -> Result<GetOutput> {
        let result = self
            .store
            .get(&self.path(key)?)
            .await
            .map_err(|e| Error::from_store(e, &self.bucket, key))?;

        let metadata = ObjectMetadata::from_meta(&result.meta, content_type(&result));
        let bucket = self.bucket.clone();
        let owned_key = key.to_owned();
        let body: BodyStream = Box::pin(
            result
                .into_stream()
                .map_err(move |e| Error::from_store(e, &bucket, &owned_key)),
        );

        Ok(GetOutput { metadata, body })
    }

    /// Lazily stream object metadata under the path-segment `prefix`.
    ///
    /// The underlying store pages through results (up to 1000 keys per call
    /// for S3) as the stream is polled.
    #[tracing::instrument(name = "object.list_stream", skip(self), fields(bucket = %self.bucket))]
    pub fn list_stream(&self, prefix: &str) -> BoxStream<'_, Result<ObjectMeta>> {
        let path = if prefix.is_empty() {
            None
        } else {
            match self.path(prefix) {
                Ok(path) => Some(path),
                Err(err) => return Box::pin(futures::stream::once(async move { Err(err) })),
            }
        };
        let bucket = self.bucket.clone();
        let prefix = prefix.to_owned();
        Box::pin(
            self.store
                .list(path.as_ref())
                .map_err(move |e| Error::from_store(e, &bucket, &prefix)),
        )
    }

    /// Parses `key` into a store path without re-encoding it.
    fn path(&self, key: &str) -> Result<Path> {
        Path::parse(key).map_err(|e| {
            Error::invalid_request(format!(
                "key '{key}' in bucket '{}' is not a valid object path: {e}",
                self.bucket
            ))
        })
    }

    /// Upload `data` to `key`, optionally setting the content-type.
    ///
    /// The tool surface never writes to the store; this exists to seed
    /// in-memory buckets.
    #[tracing::instrument(name = "object.put", skip(self, data), fields(bucket = %self.bucket, size = data.len()))]
    pub async fn put(&self, key: &str, data: Bytes, content_type: Option<&str>) -> Result<()> {
        let mut opts = PutOptions::default();
        if let Some(ct) = content_type {
            opts.attributes
                .insert(Attribute::ContentType, ct.to_string().into());
        }
        self.store
            .put_opts(&self.path(key)?, data.into(), opts)
            .await
            .map_err(|e| Error::from_store(e, &self.bucket, key))?;
        Ok(())
    }
}

fn content_type(result: &GetResult) -> Option<String> {
    result
        .attributes
        .get(&Attribute::ContentType)
        .map(|v| v.to_string())
}

#[cfg(test)]
mod tests {
    use futures::StreamExt;
    use object_store::memory::InMemory;

    use super::*;
    use crate::types::ErrorKind;

    fn test_client() -> ObjectStoreClient {
        ObjectStoreClient::new("test-bucket", InMemory::new())
    }

    #[tokio::test]
    async fn head_reports_size_and_type() {
        let client = test_client();
        client
            .put("head.json", Bytes::from("{}"), Some("application/json"))
            .await
            .unwrap();

        let metadata = client.head("head.json").await.unwrap();
        assert_eq!(metadata.size_bytes, 2);
        assert_eq!(metadata.content_type, "application/json");
        assert!(metadata.last_modified.is_some());
    }

    #[tokio::test]
    async fn head_not_found() {
        let client = test_client();
        let err = client.head("missing").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(err.to_string().contains("test-bucket"));
    }

    #[tokio::test]
    async fn get_streams_body() {
        let client = test_client();
        let data = Bytes::from("hello world");
        client.put("get.txt", data.clone(), None).await.unwrap();

        let output = client.get("get.txt").await.unwrap();
        assert_eq!(output.metadata.size_bytes, data.len() as u64);

        let chunks: Vec<Bytes> = output.body.try_collect().await.unwrap();
        assert_eq!(chunks.concat(), data.to_vec());
    }

    #[tokio::test]
    async fn list_stream_under_prefix() {
        let client = test_client();
        for i in 0..3 {
            client
                .put(&format!("dir/f{i}.bin"), Bytes::from(format!("{i}")), None)
                .await
                .unwrap();
        }
        client.put("other/x.bin", Bytes::from("x"), None).await.unwrap();

        let items: Vec<_> = client
            .list_stream("dir")
            .collect::<Vec<_>>()
            .await
            .into_iter()
            .collect::<Result<Vec<_>>>()
            .unwrap();
        assert_eq!(items.len(), 3);
    }

    #[tokio::test]
    async fn reserved_characters_round_trip_through_listing() {
        let client = test_client();
        let key = "docs/q1 [draft] #2.txt";
        client.put(key, Bytes::from("draft"), None).await.unwrap();

        let items: Vec<ObjectMeta> = client.list_stream("docs").try_collect().await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].location.as_ref(), key);

        let listed = items[0].location.to_string();
        assert_eq!(client.head(&listed).await.unwrap().size_bytes, 5);
    }

    #[tokio::test]
    async fn malformed_key_is_rejected() {
        let client = test_client();
        let err = client.head("a//b").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidRequest);
    }
}
