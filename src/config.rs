//! Validated run configuration.
//!
//! The CLI layer fills a [`RunConfig`]; [`RunConfig::validate`] applies the
//! same range checks the CLI advertises so configurations assembled in code
//! are held to the same rules.

use std::path::PathBuf;

use anyhow::{Result, bail};
use tracing::warn;

use crate::lister::ListingMode;
use crate::store::S3Options;
use crate::transfer::path::is_segment_aligned;
use crate::transfer::{DEFAULT_CHUNK_SIZE, DEFAULT_CONCURRENCY, FailurePolicy, MAX_CONCURRENCY};

/// Largest accepted read chunk (16 MiB).
pub const MAX_CHUNK_SIZE: usize = 16 * 1024 * 1024;

/// Everything one invocation needs.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Source bucket.
    pub bucket: String,
    /// Key prefix to mirror; may be empty.
    pub prefix: String,
    /// Base64 SSE-C key text.
    pub sse_key: String,
    /// Local directory receiving the mirrored tree.
    pub output_dir: PathBuf,
    /// S3 connection settings.
    pub s3: S3Options,
    /// Maximum concurrent transfers.
    pub concurrency: usize,
    /// Behavior after a failed transfer.
    pub failure_policy: FailurePolicy,
    /// Read buffer size per transfer.
    pub chunk_size: usize,
    /// Listing pagination behavior.
    pub listing_mode: ListingMode,
    /// List and print destinations without downloading.
    pub dry_run: bool,
    /// Print the run report as JSON on stdout.
    pub json_summary: bool,
}

impl RunConfig {
    /// Creates a configuration with default tuning values.
    pub fn new(
        bucket: impl Into<String>,
        prefix: impl Into<String>,
        sse_key: impl Into<String>,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            bucket: bucket.into(),
            prefix: prefix.into(),
            sse_key: sse_key.into(),
            output_dir: output_dir.into(),
            s3: S3Options::default(),
            concurrency: DEFAULT_CONCURRENCY,
            failure_policy: FailurePolicy::default(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            listing_mode: ListingMode::default(),
            dry_run: false,
            json_summary: false,
        }
    }

    /// Validates values against runtime constraints.
    ///
    /// A prefix that does not end in `/` is allowed but logged, since the
    /// relative paths it produces start mid-segment.
    ///
    /// # Errors
    ///
    /// Returns an error naming the first invalid field.
    pub fn validate(&self) -> Result<()> {
        if self.bucket.trim().is_empty() {
            bail!("Invalid value for `bucket`: must not be empty");
        }
        if self.bucket.contains('/') {
            bail!("Invalid value for `bucket`: {:?} must not contain '/'", self.bucket);
        }
        if self.output_dir.as_os_str().is_empty() {
            bail!("Invalid value for `output_dir`: must not be empty");
        }
        if !(1..=MAX_CONCURRENCY).contains(&self.concurrency) {
            bail!(
                "Invalid value for `concurrency`: {}. Expected range: 1..={MAX_CONCURRENCY}",
                self.concurrency
            );
        }
        if !(1..=MAX_CHUNK_SIZE).contains(&self.chunk_size) {
            bail!(
                "Invalid value for `chunk_size`: {}. Expected range: 1..={MAX_CHUNK_SIZE}",
                self.chunk_size
            );
        }

        if !is_segment_aligned(&self.prefix) {
            warn!(
                prefix = %self.prefix,
                "prefix does not end with '/'; local paths start at the first '/' after it"
            );
        }

        Ok(())
    }
}
