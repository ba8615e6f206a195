//! In-memory [`ObjectStore`] for tests and dry runs against fixtures.

use std::collections::{BTreeMap, HashSet};
use std::io::{self, Cursor};
use std::pin::Pin;
use std::sync::Mutex;
use std::task::{Context, Poll};

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncReadExt, ReadBuf};

use super::{ListPage, ObjectBody, ObjectStore, StoreError};
use crate::sse::SseCustomerKey;

/// Bucket-less object map with S3-like listing and SSE-C checks.
///
/// Objects are listed in lexicographic key order, `page_size` keys per
/// page. Reads succeed only when the request carries the fingerprint the
/// store was created with, mirroring how S3 rejects a mismatched key.
#[derive(Debug)]
pub struct MemoryStore {
    objects: BTreeMap<String, Vec<u8>>,
    fingerprint: String,
    page_size: usize,
    failing_keys: HashSet<String>,
    broken_bodies: HashSet<String>,
    fail_listing: bool,
    requested: Mutex<Vec<String>>,
}

impl MemoryStore {
    /// Creates an empty store that accepts reads with `fingerprint`.
    #[must_use]
    pub fn new(fingerprint: impl Into<String>) -> Self {
        Self {
            objects: BTreeMap::new(),
            fingerprint: fingerprint.into(),
            page_size: 1000,
            failing_keys: HashSet::new(),
            broken_bodies: HashSet::new(),
            fail_listing: false,
            requested: Mutex::new(Vec::new()),
        }
    }

    /// Adds an object.
    #[must_use]
    pub fn with_object(mut self, key: impl Into<String>, body: impl Into<Vec<u8>>) -> Self {
        self.objects.insert(key.into(), body.into());
        self
    }

    /// Sets the listing page size (minimum 1).
    #[must_use]
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Makes every read of `key` fail.
    #[must_use]
    pub fn with_failing_key(mut self, key: impl Into<String>) -> Self {
        self.failing_keys.insert(key.into());
        self
    }

    /// Serves the body of `key` and then fails the stream instead of ending it.
    #[must_use]
    pub fn with_broken_body(mut self, key: impl Into<String>) -> Self {
        self.broken_bodies.insert(key.into());
        self
    }

    /// Makes every listing call fail.
    #[must_use]
    pub fn with_failing_listing(mut self) -> Self {
        self.fail_listing = true;
        self
    }

    /// Returns the keys passed to `get_object`, in call order.
    #[must_use]
    pub fn requested_keys(&self) -> Vec<String> {
        self.requested
            .lock()
            .map(|keys| keys.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn list_page(
        &self,
        bucket: &str,
        prefix: &str,
        continuation_token: Option<String>,
    ) -> Result<ListPage, StoreError> {
        if self.fail_listing {
            return Err(StoreError::list(bucket, prefix, "access denied"));
        }

        let offset = match continuation_token {
            Some(token) => token
                .parse::<usize>()
                .map_err(|_| StoreError::list(bucket, prefix, "invalid continuation token"))?,
            None => 0,
        };

        let matching: Vec<&String> = self
            .objects
            .keys()
            .filter(|key| key.starts_with(prefix))
            .collect();

        let keys: Vec<String> = matching
            .iter()
            .skip(offset)
            .take(self.page_size)
            .map(|key| (*key).clone())
            .collect();

        let next = offset + keys.len();
        let next_continuation_token = (next < matching.len()).then(|| next.to_string());

        Ok(ListPage {
            keys,
            next_continuation_token,
        })
    }

    async fn get_object(
        &self,
        bucket: &str,
        key: &str,
        sse: &SseCustomerKey,
    ) -> Result<ObjectBody, StoreError> {
        if let Ok(mut requested) = self.requested.lock() {
            requested.push(key.to_string());
        }

        if self.failing_keys.contains(key) {
            return Err(StoreError::get(bucket, key, "injected failure"));
        }
        if sse.fingerprint() != self.fingerprint {
            return Err(StoreError::get(
                bucket,
                key,
                "the calculated MD5 hash of the key did not match the hash that was provided",
            ));
        }

        let body = self
            .objects
            .get(key)
            .cloned()
            .ok_or_else(|| StoreError::get(bucket, key, "the specified key does not exist"))?;

        if self.broken_bodies.contains(key) {
            return Ok(Box::pin(Cursor::new(body).chain(ResetStream)));
        }
        Ok(Box::pin(Cursor::new(body)))
    }
}

/// Stream that fails every read, like a connection reset mid-body.
struct ResetStream;

impl AsyncRead for ResetStream {
    fn poll_read(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        _buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        Poll::Ready(Err(io::Error::new(
            io::ErrorKind::ConnectionReset,
            "connection reset while reading body",
        )))
    }
}
