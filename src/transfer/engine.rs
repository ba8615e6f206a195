//! Transfer engine: per-object SSE-C download and the run loop over a listing.
//!
//! # Overview
//!
//! [`transfer_object`] moves one object through a strictly linear sequence:
//! derive the local path, create its parent directories, issue the SSE-C get
//! call, stream the body into the destination file. There are no retries.
//!
//! [`TransferEngine::run`] feeds listed keys through [`transfer_object`]
//! under a [`FailurePolicy`]. With the default concurrency of 1 objects are
//! transferred one at a time in listing order.
//!
//! # Example
//!
//! ```no_run
//! use std::path::PathBuf;
//! use std::sync::Arc;
//!
//! use s3_ssec_get::sse::SseCustomerKey;
//! use s3_ssec_get::store::{MemoryStore, ObjectStore};
//! use s3_ssec_get::transfer::{FailurePolicy, TransferEngine, TransferPlan};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let key = Arc::new(SseCustomerKey::from_base64("dGVzdGtleQ==")?);
//! let store: Arc<dyn ObjectStore> =
//!     Arc::new(MemoryStore::new(key.fingerprint()).with_object("reports/a.csv", "a,b"));
//! let plan = TransferPlan::new("data", "reports/", PathBuf::from("/tmp/out"), key);
//! let engine = TransferEngine::new(1, FailurePolicy::FailFast, 64 * 1024)?;
//! let report = engine.run(store, &plan, vec!["reports/a.csv".to_string()]).await?;
//! println!("completed: {}", report.completed.len());
//! # Ok(())
//! # }
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::Serialize;
use tokio::fs::File;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument, warn};

use super::copy::{CopyError, copy_in_chunks};
use super::error::{PathError, TransferError};
use super::path::{is_directory_marker, local_path};
use crate::sse::SseCustomerKey;
use crate::store::ObjectStore;

/// Minimum allowed concurrency value.
const MIN_CONCURRENCY: usize = 1;

/// Maximum allowed concurrency value.
pub const MAX_CONCURRENCY: usize = 64;

/// Default concurrency: strictly sequential.
pub const DEFAULT_CONCURRENCY: usize = 1;

/// What the engine does after a transfer fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Stop starting new transfers after the first failure.
    #[default]
    FailFast,
    /// Attempt every object and report failures at the end.
    Continue,
}

/// Error type for engine setup and scheduling.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Invalid concurrency value provided.
    #[error(
        "invalid concurrency value {value}: must be between {MIN_CONCURRENCY} and {MAX_CONCURRENCY}"
    )]
    InvalidConcurrency {
        /// The invalid value that was provided.
        value: usize,
    },

    /// Chunk size of zero.
    #[error("invalid chunk size 0: must be at least 1 byte")]
    InvalidChunkSize,

    /// Semaphore was closed unexpectedly.
    #[error("semaphore closed unexpectedly")]
    SemaphoreClosed,
}

/// Everything needed to transfer one object. Built per key, never mutated.
#[derive(Debug, Clone)]
pub struct TransferRequest {
    /// Source bucket.
    pub bucket: String,
    /// Listing prefix stripped from the key.
    pub prefix: String,
    /// Object key.
    pub key: String,
    /// Shared SSE-C key with its precomputed fingerprint.
    pub sse: Arc<SseCustomerKey>,
    /// Local directory mirroring the prefix.
    pub output_root: PathBuf,
}

/// Per-run parameters shared by every transfer.
#[derive(Debug, Clone)]
pub struct TransferPlan {
    bucket: String,
    prefix: String,
    output_root: PathBuf,
    sse: Arc<SseCustomerKey>,
}

impl TransferPlan {
    /// Creates a plan for one bucket/prefix/output directory.
    pub fn new(
        bucket: impl Into<String>,
        prefix: impl Into<String>,
        output_root: impl Into<PathBuf>,
        sse: Arc<SseCustomerKey>,
    ) -> Self {
        Self {
            bucket: bucket.into(),
            prefix: prefix.into(),
            output_root: output_root.into(),
            sse,
        }
    }

    /// Builds the request for `key`.
    #[must_use]
    pub fn request(&self, key: &str) -> TransferRequest {
        TransferRequest {
            bucket: self.bucket.clone(),
            prefix: self.prefix.clone(),
            key: key.to_string(),
            sse: Arc::clone(&self.sse),
            output_root: self.output_root.clone(),
        }
    }

    /// Derives the local destination of `key` without touching the file system.
    ///
    /// # Errors
    ///
    /// Returns a [`PathError`] if the key cannot be mapped below the output root.
    pub fn destination(&self, key: &str) -> Result<PathBuf, PathError> {
        local_path(&self.output_root, key, &self.prefix)
    }

    /// Returns the bucket name.
    #[must_use]
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Returns the listing prefix.
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Returns the output root directory.
    #[must_use]
    pub fn output_root(&self) -> &std::path::Path {
        &self.output_root
    }
}

/// A finished transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompletedTransfer {
    /// Object key.
    pub key: String,
    /// File written.
    pub path: PathBuf,
    /// Bytes written.
    pub bytes: u64,
}

/// A failed transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedTransfer {
    /// Object key.
    pub key: String,
    /// Rendered error.
    pub error: String,
    /// Whether the local file system caused the failure.
    pub local: bool,
}

impl FailedTransfer {
    fn new(key: String, error: &TransferError) -> Self {
        Self {
            key,
            error: error.to_string(),
            local: error.is_local(),
        }
    }
}

/// Outcome of [`TransferEngine::run`], assembled in listing order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunReport {
    /// Keys returned by the listing.
    pub listed: usize,
    /// Successful transfers.
    pub completed: Vec<CompletedTransfer>,
    /// Failed transfers.
    pub failed: Vec<FailedTransfer>,
    /// Directory marker keys that have no file to write.
    pub skipped: Vec<String>,
    /// Keys never started because a fail-fast abort happened first.
    pub not_attempted: usize,
    /// True if a failure stopped the run under [`FailurePolicy::FailFast`].
    pub aborted: bool,
}

impl RunReport {
    /// Returns the total number of bytes written.
    #[must_use]
    pub fn total_bytes(&self) -> u64 {
        self.completed.iter().map(|c| c.bytes).sum()
    }

    /// Returns true if no transfer failed.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Downloads one object to its derived local path.
///
/// # Errors
///
/// Returns a [`TransferError`] for the first step that fails. A partially
/// written file is removed before returning.
#[instrument(skip(store, request), fields(key = %request.key))]
pub async fn transfer_object(
    store: &dyn ObjectStore,
    request: &TransferRequest,
    chunk_size: usize,
) -> Result<CompletedTransfer, TransferError> {
    let path = local_path(&request.output_root, &request.key, &request.prefix)?;

    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| TransferError::create_dir(parent, e))?;
    }

    let mut body = store
        .get_object(&request.bucket, &request.key, &request.sse)
        .await?;

    let mut file = File::create(&path)
        .await
        .map_err(|e| TransferError::io(&path, e))?;
    let copied = copy_in_chunks(&mut body, &mut file, chunk_size).await;
    drop(file);

    match copied {
        Ok(bytes) => {
            debug!(path = %path.display(), bytes, "object written");
            Ok(CompletedTransfer {
                key: request.key.clone(),
                path,
                bytes,
            })
        }
        Err(e) => {
            debug!(path = %path.display(), "cleaning up partial file after error");
            if let Err(cleanup) = tokio::fs::remove_file(&path).await {
                warn!(
                    path = %path.display(),
                    error = %cleanup,
                    "failed to remove partial file"
                );
            }
            Err(match e {
                CopyError::Read(source) => TransferError::body(&request.key, source),
                CopyError::Write(source) => TransferError::io(&path, source),
            })
        }
    }
}

/// Runs transfers for a listing under a failure policy.
///
/// # Concurrency Model
///
/// - Each transfer runs in its own Tokio task
/// - A semaphore permit is acquired before starting each transfer
/// - Under fail-fast, the abort flag is checked after each permit is
///   acquired, so with concurrency 1 no transfer starts after a failure
/// - All tasks share one `Arc<SseCustomerKey>`; the fingerprint is never
///   recomputed
#[derive(Debug)]
pub struct TransferEngine {
    semaphore: Arc<Semaphore>,
    concurrency: usize,
    policy: FailurePolicy,
    chunk_size: usize,
}

impl TransferEngine {
    /// Creates an engine.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidConcurrency`] outside 1..=64 and
    /// [`EngineError::InvalidChunkSize`] for a zero chunk size.
    #[instrument(level = "debug")]
    pub fn new(
        concurrency: usize,
        policy: FailurePolicy,
        chunk_size: usize,
    ) -> Result<Self, EngineError> {
        if !(MIN_CONCURRENCY..=MAX_CONCURRENCY).contains(&concurrency) {
            return Err(EngineError::InvalidConcurrency { value: concurrency });
        }
        if chunk_size == 0 {
            return Err(EngineError::InvalidChunkSize);
        }

        Ok(Self {
            semaphore: Arc::new(Semaphore::new(concurrency)),
            concurrency,
            policy,
            chunk_size,
        })
    }

    /// Returns the configured concurrency limit.
    #[must_use]
    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Returns the configured failure policy.
    #[must_use]
    pub fn policy(&self) -> FailurePolicy {
        self.policy
    }

    /// Transfers every key in `keys`.
    ///
    /// Individual transfer failures do NOT make this method error; they are
    /// recorded in the returned [`RunReport`].
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::SemaphoreClosed`] if the semaphore is closed.
    #[instrument(skip(self, store, plan, keys), fields(bucket = %plan.bucket, prefix = %plan.prefix, keys = keys.len()))]
    pub async fn run(
        &self,
        store: Arc<dyn ObjectStore>,
        plan: &TransferPlan,
        keys: Vec<String>,
    ) -> Result<RunReport, EngineError> {
        let mut report = RunReport {
            listed: keys.len(),
            ..RunReport::default()
        };
        let abort = Arc::new(AtomicBool::new(false));
        let mut handles: Vec<(String, JoinHandle<Result<CompletedTransfer, TransferError>>)> =
            Vec::new();

        let mut pending = keys.into_iter();
        while let Some(key) = pending.next() {
            if is_directory_marker(&key) {
                debug!(key = %key, "skipping directory marker");
                report.skipped.push(key);
                continue;
            }

            let permit = self
                .semaphore
                .clone()
                .acquire_owned()
                .await
                .map_err(|_| EngineError::SemaphoreClosed)?;

            if abort.load(Ordering::SeqCst) {
                drop(permit);
                report.not_attempted =
                    1 + pending.by_ref().filter(|k| !is_directory_marker(k)).count();
                break;
            }

            let store = Arc::clone(&store);
            let request = plan.request(&key);
            let abort = Arc::clone(&abort);
            let policy = self.policy;
            let chunk_size = self.chunk_size;

            handles.push((
                key,
                tokio::spawn(async move {
                    // Released only after the abort flag is set.
                    let _permit = permit;

                    info!(key = %request.key, "getting object");
                    let result = transfer_object(store.as_ref(), &request, chunk_size).await;
                    if let Err(e) = &result {
                        error!(key = %request.key, error = %e, "transferring object failed");
                        if policy == FailurePolicy::FailFast {
                            abort.store(true, Ordering::SeqCst);
                        }
                    }
                    result
                }),
            ));
        }

        debug!(task_count = handles.len(), "waiting for transfers to complete");

        for (key, handle) in handles {
            match handle.await {
                Ok(Ok(done)) => report.completed.push(done),
                Ok(Err(e)) => report.failed.push(FailedTransfer::new(key, &e)),
                Err(e) => {
                    warn!(key = %key, error = %e, "transfer task panicked");
                    report.failed.push(FailedTransfer {
                        key,
                        error: format!("transfer task panicked: {e}"),
                        local: false,
                    });
                }
            }
        }

        report.aborted = abort.load(Ordering::SeqCst);

        info!(
            completed = report.completed.len(),
            failed = report.failed.len(),
            skipped = report.skipped.len(),
            not_attempted = report.not_attempted,
            bytes = report.total_bytes(),
            "transfers finished"
        );

        Ok(report)
    }
}
