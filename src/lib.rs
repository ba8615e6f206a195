//! s3-ssec-get core library
//!
//! Recursively downloads the objects under an S3 key prefix that are
//! encrypted with SSE-C (server-side encryption with customer-provided
//! keys), mirroring the key hierarchy below the prefix onto a local
//! directory.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`sse`] - SSE-C key decoding and the MD5 key fingerprint
//! - [`store`] - Object storage seam ([`ObjectStore`]) with S3 and in-memory backends
//! - [`lister`] - Prefix listing with explicit pagination behavior
//! - [`transfer`] - Path derivation, chunked copy and the transfer engine
//! - [`config`] - Validated run configuration
//! - [`exit`] - Mapping of run outcomes to process exit codes

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod exit;
pub mod lister;
pub mod sse;
pub mod store;
pub mod transfer;

// Re-export commonly used types
pub use config::RunConfig;
pub use exit::ProcessExit;
pub use lister::{Lister, ListingMode};
pub use sse::{KeyError, SseCustomerKey};
pub use store::{MemoryStore, ObjectStore, S3Options, S3Store, StoreError};
pub use transfer::{
    DEFAULT_CHUNK_SIZE, DEFAULT_CONCURRENCY, FailurePolicy, RunReport, TransferEngine,
    TransferError, TransferPlan,
};
