//! Prefix listing over an [`ObjectStore`].
//!
//! S3 returns at most 1000 keys per `ListObjectsV2` call. By default the
//! lister follows continuation tokens until the listing is complete;
//! [`ListingMode::FirstPage`] stops after one call and warns when results
//! were cut off.

use tracing::{debug, info, instrument, warn};

use crate::store::{ObjectStore, StoreError};

/// How many listing pages to fetch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ListingMode {
    /// Follow continuation tokens until the backend reports no more keys.
    #[default]
    AllPages,
    /// Issue a single listing call and ignore any further pages.
    FirstPage,
}

/// Lists object keys under a prefix.
pub struct Lister<'a, S: ObjectStore + ?Sized> {
    store: &'a S,
    mode: ListingMode,
}

impl<'a, S: ObjectStore + ?Sized> Lister<'a, S> {
    /// Creates a lister over `store`.
    pub fn new(store: &'a S, mode: ListingMode) -> Self {
        Self { store, mode }
    }

    /// Returns every key under `prefix`, in backend order.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::List`] on the first failed listing call; keys
    /// from earlier pages are discarded.
    #[instrument(skip(self), fields(mode = ?self.mode))]
    pub async fn list(&self, bucket: &str, prefix: &str) -> Result<Vec<String>, StoreError> {
        let mut keys = Vec::new();
        let mut continuation_token = None;
        let mut pages = 0usize;

        loop {
            let page = self
                .store
                .list_page(bucket, prefix, continuation_token)
                .await?;
            pages += 1;
            keys.extend(page.keys);

            match page.next_continuation_token {
                Some(token) if self.mode == ListingMode::AllPages => {
                    debug!(pages, keys = keys.len(), "following continuation token");
                    continuation_token = Some(token);
                }
                Some(_) => {
                    warn!(
                        keys = keys.len(),
                        "listing truncated after first page; remaining objects are ignored"
                    );
                    break;
                }
                None => break,
            }
        }

        info!(bucket, prefix, pages, keys = keys.len(), "listed objects");
        Ok(keys)
    }
}
