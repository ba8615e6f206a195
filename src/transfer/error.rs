//! Error types for per-object transfers.

use std::path::PathBuf;

use thiserror::Error;

use crate::store::StoreError;

/// Errors deriving a local path from an object key.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    /// The key does not start with the listing prefix.
    #[error("key {key:?} does not start with prefix {prefix:?}")]
    PrefixMismatch {
        /// Object key.
        key: String,
        /// Prefix that was expected.
        prefix: String,
    },

    /// Nothing is left of the key once the prefix is removed.
    #[error("key {key:?} has no path below the prefix")]
    EmptyRelativePath {
        /// Object key.
        key: String,
    },

    /// The key contains a `.` or `..` segment that would escape or alias the output root.
    #[error("key {key:?} contains unsafe path segment {segment:?}")]
    UnsafeSegment {
        /// Object key.
        key: String,
        /// The offending segment.
        segment: String,
    },
}

/// Errors that fail a single object transfer.
#[derive(Debug, Error)]
pub enum TransferError {
    /// The key could not be mapped to a local path.
    #[error(transparent)]
    Path(#[from] PathError),

    /// Creating the destination's parent directories failed.
    #[error("creating directory {path}: {source}")]
    CreateDir {
        /// Directory that could not be created.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The backend refused or failed the get call.
    #[error(transparent)]
    Retrieval(#[from] StoreError),

    /// Reading the object body failed mid-stream.
    #[error("reading object {key}: {source}")]
    Body {
        /// Object key.
        key: String,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// Opening, writing or flushing the destination file failed.
    #[error("IO error writing to {path}: {source}")]
    Io {
        /// Destination file.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },
}

impl TransferError {
    /// Creates a directory creation error.
    pub fn create_dir(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::CreateDir {
            path: path.into(),
            source,
        }
    }

    /// Creates a body read error.
    pub fn body(key: impl Into<String>, source: std::io::Error) -> Self {
        Self::Body {
            key: key.into(),
            source,
        }
    }

    /// Creates a destination file error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Returns true for failures of the local file system.
    #[must_use]
    pub fn is_local(&self) -> bool {
        matches!(self, Self::CreateDir { .. } | Self::Io { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transfer_error_io_display() {
        let io_error = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let error = TransferError::io(PathBuf::from("/tmp/out/a.csv"), io_error);
        let msg = error.to_string();
        assert!(msg.contains("/tmp/out/a.csv"), "Expected path in: {msg}");
        assert!(error.is_local());
    }

    #[test]
    fn test_transfer_error_create_dir_display() {
        let io_error = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let error = TransferError::create_dir("/tmp/out/2023", io_error);
        let msg = error.to_string();
        assert!(msg.starts_with("creating directory"), "got: {msg}");
        assert!(error.is_local());
    }

    #[test]
    fn test_transfer_error_retrieval_is_transparent() {
        let error: TransferError = StoreError::get("data", "reports/a.csv", "access denied").into();
        let msg = error.to_string();
        assert!(msg.contains("reports/a.csv"), "Expected key in: {msg}");
        assert!(msg.contains("access denied"), "Expected cause in: {msg}");
        assert!(!error.is_local());
    }

    #[test]
    fn test_path_error_display_names_key() {
        let error = PathError::UnsafeSegment {
            key: "p/../etc".to_string(),
            segment: "..".to_string(),
        };
        assert!(error.to_string().contains("p/../etc"));
    }
}
