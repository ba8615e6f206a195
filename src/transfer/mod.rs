//! Per-object SSE-C transfers onto the local file system.
//!
//! This module maps object keys to local paths, streams object bodies into
//! files in fixed-size chunks and drives a listing through those steps
//! under a configurable failure policy.
//!
//! # Features
//!
//! - Prefix stripping with segment-aware path construction
//! - Parent directories created before the object is requested
//! - Chunked streaming copy (memory use bounded by the chunk size)
//! - Partial files removed when a transfer fails mid-stream
//! - Fail-fast or continue-past-failure policies
//! - Optional bounded concurrency

mod copy;
mod engine;
mod error;
pub mod path;

pub use copy::{CopyError, DEFAULT_CHUNK_SIZE, copy_in_chunks};
pub use engine::{
    CompletedTransfer, DEFAULT_CONCURRENCY, EngineError, FailedTransfer, FailurePolicy,
    MAX_CONCURRENCY, RunReport, TransferEngine, TransferPlan, TransferRequest, transfer_object,
};
pub use error::{PathError, TransferError};
pub use path::{local_path, relative_key};
