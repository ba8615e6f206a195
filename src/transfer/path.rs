//! Mapping of object keys onto the local output tree.
//!
//! The relative key is the object key with the prefix removed as a plain
//! substring. Turning it into a path is segment-aware: it is split on `/`,
//! empty segments are dropped and `.`/`..` are rejected, so a prefix that
//! does not end on a `/` boundary can never make the relative key look like
//! an absolute path or climb out of the output root.

use std::path::{Path, PathBuf};

use super::error::PathError;

/// Returns `key` with the literal `prefix` removed from its start.
///
/// # Errors
///
/// Returns [`PathError::PrefixMismatch`] if `key` does not start with `prefix`.
pub fn relative_key<'k>(key: &'k str, prefix: &str) -> Result<&'k str, PathError> {
    key.strip_prefix(prefix)
        .ok_or_else(|| PathError::PrefixMismatch {
            key: key.to_string(),
            prefix: prefix.to_string(),
        })
}

/// Returns true for console-style "folder" placeholder keys.
#[must_use]
pub fn is_directory_marker(key: &str) -> bool {
    key.ends_with('/')
}

/// Returns true when `prefix` ends on a key-segment boundary.
///
/// An empty prefix (the whole bucket) counts as aligned.
#[must_use]
pub fn is_segment_aligned(prefix: &str) -> bool {
    prefix.is_empty() || prefix.ends_with('/')
}

/// Derives the destination path of `key` below `output_root`.
///
/// # Errors
///
/// Returns a [`PathError`] if the key does not carry the prefix, has
/// nothing below it, or contains a `.` or `..` segment.
pub fn local_path(output_root: &Path, key: &str, prefix: &str) -> Result<PathBuf, PathError> {
    let relative = relative_key(key, prefix)?;

    let mut path = output_root.to_path_buf();
    let mut segments = 0usize;
    for segment in relative.split('/').filter(|s| !s.is_empty()) {
        if segment == "." || segment == ".." {
            return Err(PathError::UnsafeSegment {
                key: key.to_string(),
                segment: segment.to_string(),
            });
        }
        path.push(segment);
        segments += 1;
    }

    if segments == 0 {
        return Err(PathError::EmptyRelativePath {
            key: key.to_string(),
        });
    }

    Ok(path)
}
