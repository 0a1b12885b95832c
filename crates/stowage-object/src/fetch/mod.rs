//! Single-object retrieval.
//!
//! [`ObjectFetcher::fetch`] reads metadata, applies the size guard, classifies
//! the content and then materialises it: inline text, inline bytes, extracted
//! PDF text, or an atomically written local file.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use futures::StreamExt;

use crate::client::{GetOutput, ObjectStoreClient};
use crate::classify::{self, ContentClass};
use crate::guard::{SizeGuard, collect_body};
use crate::providers::StoreProvider;
use crate::types::{Error, ObjectMetadata, ObjectRef, Result};
use crate::{EngineConfig, TRACING_TARGET_FETCH, pdf};

mod request;
mod result;
mod sink;

pub use request::RetrievalRequest;
pub use result::{Classification, Payload, RetrievalResult};
use sink::{Destination, resolve_destination};

/// Retrieves single objects through a [`StoreProvider`].
#[derive(Clone)]
pub struct ObjectFetcher {
    provider: Arc<dyn StoreProvider>,
    config: Arc<EngineConfig>,
}

impl ObjectFetcher {
    /// Create a fetcher sharing `provider` and `config`.
    pub fn new(provider: Arc<dyn StoreProvider>, config: Arc<EngineConfig>) -> Self {
        Self { provider, config }
    }

    /// Retrieves one object.
    ///
    /// Fails with `TooLarge` before any body transfer when the declared size
    /// exceeds the request ceiling, and with `ExtractionUnavailable` before
    /// any download when PDF extraction is requested but not compiled in.
    pub async fn fetch(&self, request: RetrievalRequest) -> Result<RetrievalResult> {
        let object = request.object().clone();
        let client = self.provider.client(object.bucket())?;

        let metadata = self.head(&client, &object).await?;
        let guard = SizeGuard::new(request.max_bytes());
        guard.admit_object(&object, Some(metadata.size_bytes))?;

        let class = classify::classify(Some(&metadata.content_type), Some(object.key()));
        tracing::debug!(
            target: TRACING_TARGET_FETCH,
            object = %object,
            size = metadata.size_bytes,
            content_type = %metadata.content_type,
            class = ?class,
            "Admitted object"
        );

        let wants_extraction = request.extract_text()
            && !class.is_text()
            && classify::is_pdf(Some(&metadata.content_type), object.key());

        let result = if wants_extraction {
            if !pdf::is_available() {
                return Err(Error::extraction_unavailable(&object));
            }
            self.fetch_extracted(&client, &object, metadata, guard, &request)
                .await?
        } else if let Some(destination) = request.destination() {
            let path = resolve_destination(destination, object.key()).await?;
            let classification = match class.effective() {
                ContentClass::Text => Classification::Text,
                _ => Classification::Binary,
            };
            self.fetch_to_file(&client, &object, metadata, guard, path, classification)
                .await?
        } else {
            self.fetch_inline(&client, &object, metadata, guard, class)
                .await?
        };

        tracing::info!(
            target: TRACING_TARGET_FETCH,
            object = %object,
            classification = %result.classification(),
            "Retrieved object"
        );
        Ok(result)
    }

    async fn head(&self, client: &ObjectStoreClient, object: &ObjectRef) -> Result<ObjectMetadata> {
        let after = self.config.request_timeout();
        with_timeout("metadata request", object, after, client.head(object.key())).await
    }

    /// Starts the download and re-applies the guard to the size it reports.
    async fn open(
        &self,
        client: &ObjectStoreClient,
        object: &ObjectRef,
        guard: SizeGuard,
    ) -> Result<GetOutput> {
        let output = client.get(object.key()).await?;
        guard.admit_object(object, Some(output.metadata.size_bytes))?;
        Ok(output)
    }

    async fn download(
        &self,
        client: &ObjectStoreClient,
        object: &ObjectRef,
        guard: SizeGuard,
    ) -> Result<Bytes> {
        let after = self.config.download_timeout();
        let download = async {
            let output = self.open(client, object, guard).await?;
            let hint = output.metadata.size_bytes;
            collect_body(output.body, guard, object, hint).await
        };
        with_timeout("download", object, after, download).await
    }

    async fn fetch_inline(
        &self,
        client: &ObjectStoreClient,
        object: &ObjectRef,
        metadata: ObjectMetadata,
        guard: SizeGuard,
        class: ContentClass,
    ) -> Result<RetrievalResult> {
        let data = self.download(client, object, guard).await?;

        if class.is_text() {
            match String::from_utf8(data.to_vec()) {
                Ok(text) => {
                    let payload = Payload::Text { text };
                    return Ok(RetrievalResult::new(
                        object.clone(),
                        metadata,
                        Classification::Text,
                        payload,
                    ));
                }
                Err(_) => {
                    tracing::debug!(
                        target: TRACING_TARGET_FETCH,
                        object = %object,
                        "Body is not valid UTF-8, returning it as binary"
                    );
                }
            }
        }

        let payload = Payload::Binary { data };
        Ok(RetrievalResult::new(
            object.clone(),
            metadata,
            Classification::Binary,
            payload,
        ))
    }

    async fn fetch_to_file(
        &self,
        client: &ObjectStoreClient,
        object: &ObjectRef,
        metadata: ObjectMetadata,
        guard: SizeGuard,
        path: std::path::PathBuf,
        classification: Classification,
    ) -> Result<RetrievalResult> {
        let after = self.config.download_timeout();
        let write = async {
            let mut output = self.open(client, object, guard).await?;
            let mut destination = Destination::create(path).await?;
            let mut total: u64 = 0;

            while let Some(chunk) = output.body.next().await {
                let chunk = chunk?;
                total += chunk.len() as u64;
                guard.check_object(object, total)?;
                destination.write(&chunk).await?;
            }

            destination.commit().await
        };
        let (saved_to, bytes_written) = with_timeout("download", object, after, write).await?;

        tracing::debug!(
            target: TRACING_TARGET_FETCH,
            object = %object,
            path = %saved_to.display(),
            bytes = bytes_written,
            "Wrote object to destination"
        );

        let payload = Payload::Saved {
            saved_to,
            bytes_written,
        };
        Ok(RetrievalResult::new(
            object.clone(),
            metadata,
            classification,
            payload,
        ))
    }

    async fn fetch_extracted(
        &self,
        client: &ObjectStoreClient,
        object: &ObjectRef,
        metadata: ObjectMetadata,
        guard: SizeGuard,
        request: &RetrievalRequest,
    ) -> Result<RetrievalResult> {
        let data = self.download(client, object, guard).await?;

        let owned = object.clone();
        let text = tokio::task::spawn_blocking(move || pdf::extract_text(&owned, &data))
            .await
            .map_err(|e| extraction_task_failed(object, e))??;

        let payload = match request.destination() {
            Some(destination) => {
                let path = resolve_destination(destination, object.key()).await?;
                let mut destination = Destination::create(path).await?;
                destination.write(text.as_bytes()).await?;
                let (saved_to, bytes_written) = destination.commit().await?;
                Payload::Saved {
                    saved_to,
                    bytes_written,
                }
            }
            None => Payload::Text { text },
        };

        Ok(RetrievalResult::new(
            object.clone(),
            metadata,
            Classification::ExtractedText,
            payload,
        ))
    }
}

impl std::fmt::Debug for ObjectFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectFetcher")
            .field("provider", &self.provider.id())
            .field("config", &self.config)
            .finish()
    }
}

/// Maps a panicked or aborted extraction task to a store error.
fn extraction_task_failed(object: &ObjectRef, err: tokio::task::JoinError) -> Error {
    Error::store(
        object.bucket(),
        object.key(),
        format!("text extraction task failed: {err}"),
    )
}

/// Bounds `future` by `after`, mapping expiry to [`Error::Timeout`].
async fn with_timeout<T>(
    operation: &'static str,
    object: &ObjectRef,
    after: Duration,
    future: impl Future<Output = Result<T>>,
) -> Result<T> {
    match tokio::time::timeout(after, future).await {
        Ok(result) => result,
        Err(_) => {
            tracing::warn!(
                target: TRACING_TARGET_FETCH,
                object = %object,
                operation,
                after_secs = after.as_secs(),
                "Remote call timed out"
            );
            Err(Error::timeout(operation, object.bucket(), object.key(), after))
        }
    }
}
