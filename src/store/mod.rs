//! Object storage backends.
//!
//! The transfer pipeline only needs two capabilities from a backend: one
//! page of a prefix listing and one SSE-C object read. [`ObjectStore`]
//! captures exactly that, so the lister and the transfer engine can run
//! against [`S3Store`] in production and [`MemoryStore`] in tests.

mod memory;
mod s3;

use std::pin::Pin;

use async_trait::async_trait;
use thiserror::Error;
use tokio::io::AsyncRead;

use crate::sse::SseCustomerKey;

pub use memory::MemoryStore;
pub use s3::{ConfigError, DEFAULT_REGION, S3Options, S3Store, load_sdk_config};

/// Boxed error from a backend SDK.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Byte stream of one object body, consumed once.
pub type ObjectBody = Pin<Box<dyn AsyncRead + Send>>;

/// One page of a prefix listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListPage {
    /// Object keys in backend order.
    pub keys: Vec<String>,
    /// Token for the next page; `None` when the listing is complete.
    pub next_continuation_token: Option<String>,
}

impl ListPage {
    /// Returns true if the backend reported more results after this page.
    #[must_use]
    pub fn is_truncated(&self) -> bool {
        self.next_continuation_token.is_some()
    }
}

/// Errors returned by storage backends.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Listing the prefix failed.
    #[error("listing objects in bucket {bucket} under prefix {prefix:?}: {source}")]
    List {
        /// Bucket being listed.
        bucket: String,
        /// Prefix being listed.
        prefix: String,
        /// Backend error.
        #[source]
        source: BoxError,
    },

    /// Fetching an object failed (missing object, wrong key, denied, network).
    #[error("getting object {key} from bucket {bucket}: {source}")]
    Get {
        /// Bucket holding the object.
        bucket: String,
        /// Object key.
        key: String,
        /// Backend error.
        #[source]
        source: BoxError,
    },
}

impl StoreError {
    /// Creates a listing error.
    pub fn list(bucket: impl Into<String>, prefix: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::List {
            bucket: bucket.into(),
            prefix: prefix.into(),
            source: source.into(),
        }
    }

    /// Creates an object retrieval error.
    pub fn get(bucket: impl Into<String>, key: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::Get {
            bucket: bucket.into(),
            key: key.into(),
            source: source.into(),
        }
    }
}

/// Minimal backend capability used by the lister and transfer engine.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Lists one page of keys under `prefix`, starting at `continuation_token`.
    async fn list_page(
        &self,
        bucket: &str,
        prefix: &str,
        continuation_token: Option<String>,
    ) -> Result<ListPage, StoreError>;

    /// Reads an object encrypted with SSE-C, sending all three SSE-C headers.
    async fn get_object(
        &self,
        bucket: &str,
        key: &str,
        sse: &SseCustomerKey,
    ) -> Result<ObjectBody, StoreError>;
}
