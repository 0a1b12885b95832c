//! Batch retrieval with per-item failure isolation.
//!
//! Keys are resolved up front, each one gets a pre-allocated result slot,
//! and a fixed pool of workers drains a shared task queue. A failing item is
//! recorded in its slot and never stops the batch.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::fetch::{ObjectFetcher, RetrievalRequest};
use crate::listing::ListingService;
use crate::types::{Error, ObjectRef, Result, base_name};
use crate::{EngineConfig, TRACING_TARGET_BATCH};

mod outcome;
mod request;

pub use outcome::{BatchOutcome, ItemFailure, ItemOutcome, ItemStatus};
pub use request::{BatchRequest, KeySelection};

/// One queued retrieval.
struct Task {
    index: usize,
    key: String,
    destination: PathBuf,
}

type Slots = Arc<Mutex<Vec<Option<ItemStatus>>>>;
type Queue = Arc<tokio::sync::Mutex<mpsc::UnboundedReceiver<Task>>>;

/// Runs [`BatchRequest`]s on a bounded worker pool.
#[derive(Debug, Clone)]
pub struct BatchOrchestrator {
    fetcher: ObjectFetcher,
    listing: ListingService,
    config: Arc<EngineConfig>,
}

impl BatchOrchestrator {
    pub fn new(fetcher: ObjectFetcher, listing: ListingService, config: Arc<EngineConfig>) -> Self {
        Self {
            fetcher,
            listing,
            config,
        }
    }

    /// Retrieves every key of `request` into its output directory.
    pub async fn fetch_batch(&self, request: BatchRequest) -> Result<BatchOutcome> {
        self.fetch_batch_with_cancel(request, CancellationToken::new())
            .await
    }

    /// Like [`fetch_batch`](Self::fetch_batch), stopping early on `cancel`.
    ///
    /// Workers stop taking new items once `cancel` fires; items already in
    /// flight run to completion. Items never started are recorded as
    /// cancelled, so the outcome still holds one entry per key.
    pub async fn fetch_batch_with_cancel(
        &self,
        request: BatchRequest,
        cancel: CancellationToken,
    ) -> Result<BatchOutcome> {
        let keys = self.resolve_keys(&request).await?;
        let bucket = request.bucket().to_owned();

        tokio::fs::create_dir_all(request.output_dir())
            .await
            .map_err(|e| Error::io(request.output_dir(), e))?;

        let destinations = plan_destinations(request.output_dir(), &keys);
        let workers = self.config.batch_concurrency.clamp(1, keys.len().max(1));

        tracing::info!(
            target: TRACING_TARGET_BATCH,
            bucket = %bucket,
            keys = keys.len(),
            workers,
            output_dir = %request.output_dir().display(),
            "Starting batch retrieval"
        );

        let slots: Slots = Arc::new(Mutex::new(vec![None; keys.len()]));
        let (sender, receiver) = mpsc::unbounded_channel();
        for (index, (key, destination)) in keys.iter().zip(destinations).enumerate() {
            let task = Task {
                index,
                key: key.clone(),
                destination,
            };
            // The receiver is alive until the workers are spawned.
            let _ = sender.send(task);
        }
        drop(sender);

        let queue: Queue = Arc::new(tokio::sync::Mutex::new(receiver));
        let mut pool = JoinSet::new();
        for worker in 0..workers {
            let context = WorkerContext {
                worker,
                bucket: bucket.clone(),
                max_bytes: request.max_bytes(),
                fetcher: self.fetcher.clone(),
                queue: queue.clone(),
                slots: slots.clone(),
                cancel: cancel.clone(),
            };
            pool.spawn(context.run());
        }

        while let Some(joined) = pool.join_next().await {
            if let Err(err) = joined {
                tracing::error!(
                    target: TRACING_TARGET_BATCH,
                    error = %err,
                    "Batch worker terminated abnormally"
                );
            }
        }

        let slots = std::mem::take(&mut *slots.lock().unwrap_or_else(PoisonError::into_inner));
        let items: Vec<ItemOutcome> = keys
            .into_iter()
            .zip(slots)
            .map(|(key, slot)| {
                let status = slot.unwrap_or_else(|| {
                    let err = if cancel.is_cancelled() {
                        Error::Cancelled { key: key.clone() }
                    } else {
                        Error::store(&bucket, &key, "retrieval task ended without a result")
                    };
                    ItemStatus::Failed(ItemFailure::from(&err))
                });
                ItemOutcome { key, status }
            })
            .collect();

        let outcome = BatchOutcome::new(bucket, items);
        tracing::info!(
            target: TRACING_TARGET_BATCH,
            bucket = %outcome.bucket,
            succeeded = outcome.succeeded,
            failed = outcome.failed,
            cancelled = cancel.is_cancelled(),
            "Batch retrieval finished"
        );
        Ok(outcome)
    }

    /// Returns the keys of `request` in resolution order.
    async fn resolve_keys(&self, request: &BatchRequest) -> Result<Vec<String>> {
        match request.selection() {
            KeySelection::Keys(keys) if !keys.is_empty() => Ok(keys.clone()),
            KeySelection::Prefix(prefix) => {
                let keys = self.listing.list_keys(request.bucket(), prefix).await?;
                tracing::debug!(
                    target: TRACING_TARGET_BATCH,
                    bucket = %request.bucket(),
                    prefix = %prefix,
                    keys = keys.len(),
                    "Expanded prefix"
                );
                Ok(keys)
            }
            KeySelection::Keys(_) => Err(Error::invalid_request(
                "either a non-empty key list or a prefix is required",
            )),
        }
    }
}

struct WorkerContext {
    worker: usize,
    bucket: String,
    max_bytes: Option<u64>,
    fetcher: ObjectFetcher,
    queue: Queue,
    slots: Slots,
    cancel: CancellationToken,
}

impl WorkerContext {
    async fn run(self) {
        loop {
            let task = tokio::select! {
                biased;
                () = self.cancel.cancelled() => {
                    tracing::debug!(
                        target: TRACING_TARGET_BATCH,
                        worker = self.worker,
                        "Cancellation requested, worker stopping"
                    );
                    break;
                }
                task = async { self.queue.lock().await.recv().await } => task,
            };
            let Some(task) = task else { break };

            let status = match self.fetch(&task).await {
                Ok(result) => ItemStatus::Succeeded(result),
                Err(err) => {
                    tracing::warn!(
                        target: TRACING_TARGET_BATCH,
                        worker = self.worker,
                        key = %task.key,
                        kind = %err.kind(),
                        error = %err,
                        "Batch item failed"
                    );
                    ItemStatus::Failed(ItemFailure::from(&err))
                }
            };

            let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
            if let Some(slot) = slots.get_mut(task.index) {
                *slot = Some(status);
            }
        }
    }

    async fn fetch(&self, task: &Task) -> Result<crate::fetch::RetrievalResult> {
        let object = ObjectRef::new(self.bucket.as_str(), task.key.as_str())?;
        let request = RetrievalRequest::new(object)
            .with_max_bytes(self.max_bytes)
            .with_destination(&task.destination);
        self.fetcher.fetch(request).await
    }
}

/// Assigns each key a distinct file under `output_dir`.
///
/// Keys are written under their base name. A key whose base name was already
/// taken uses its path relative to the common directory of all keys instead,
/// and if that is taken too, a numbered variant of its base name. Keys without
/// a usable base name map to `output_dir` itself, which the fetcher rejects
/// for that item.
fn plan_destinations(output_dir: &Path, keys: &[String]) -> Vec<PathBuf> {
    let common = common_directory(keys);
    let mut taken: HashSet<PathBuf> = HashSet::new();

    keys.iter()
        .map(|key| {
            let name = base_name(key);
            if name.is_empty() || name == "." || name == ".." {
                return output_dir.to_path_buf();
            }

            let relative: PathBuf = key
                .split('/')
                .skip(common)
                .filter(|segment| !matches!(*segment, "" | "." | ".."))
                .collect();
            let chosen = [PathBuf::from(name), relative]
                .into_iter()
                .filter(|candidate| !candidate.as_os_str().is_empty())
                .find(|candidate| !taken.contains(candidate))
                .unwrap_or_else(|| numbered(name, &taken));

            taken.insert(chosen.clone());
            output_dir.join(chosen)
        })
        .collect()
}

/// First `stem-N.ext` variant of `name` not in `taken`.
fn numbered(name: &str, taken: &HashSet<PathBuf>) -> PathBuf {
    let (stem, extension) = match name.rfind('.') {
        Some(index) if index > 0 => name.split_at(index),
        _ => (name, ""),
    };
    let mut n = 1usize;
    loop {
        let candidate = PathBuf::from(format!("{stem}-{n}{extension}"));
        if !taken.contains(&candidate) {
            return candidate;
        }
        n += 1;
    }
}

/// Number of leading directory segments shared by all keys.
fn common_directory(keys: &[String]) -> usize {
    let mut iter = keys.iter().map(|key| {
        let mut segments: Vec<&str> = key.split('/').collect();
        segments.pop();
        segments
    });
    let Some(mut common) = iter.next() else {
        return 0;
    };
    for segments in iter {
        let shared = common
            .iter()
            .zip(&segments)
            .take_while(|(a, b)| a == b)
            .count();
        common.truncate(shared);
    }
    common.len()
}
