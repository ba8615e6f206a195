//! SSE-C key material and the decryption header values derived from it.
//!
//! S3 server-side encryption with customer-provided keys requires three
//! request headers on every read:
//!
//! - the algorithm, always [`SSE_CUSTOMER_ALGORITHM`]
//! - the key itself, as the caller's base64 text (S3 decodes it)
//! - the key MD5, as base64 of the MD5 digest of the *decoded* key bytes
//!
//! [`SseCustomerKey`] decodes the key once and caches the fingerprint, so a
//! run over thousands of objects hashes the key exactly once.
//!
//! # Example
//!
//! ```
//! use s3_ssec_get::sse::SseCustomerKey;
//!
//! let key = SseCustomerKey::from_base64("dGVzdGtleQ==").unwrap();
//! assert_eq!(key.fingerprint(), "Ihs2jX9fWXhn9SWXHyj/dQ==");
//! ```

use std::fmt;

use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, PAD, STANDARD as BASE64};
use base64::Engine as _;
use thiserror::Error;
use tracing::warn;

/// Algorithm identifier sent with every SSE-C request.
pub const SSE_CUSTOMER_ALGORITHM: &str = "AES256";

/// Decoded key length required by AES-256.
pub const AES256_KEY_LEN: usize = 32;

// Padded standard alphabet that ignores non-zero bits in the last symbol,
// so `dGVzdGtleR==` decodes to the same bytes as `dGVzdGtleQ==`.
const KEY_DECODER: GeneralPurpose =
    GeneralPurpose::new(&alphabet::STANDARD, PAD.with_decode_allow_trailing_bits(true));

/// Errors raised while decoding caller-supplied key material.
#[derive(Debug, Error)]
pub enum KeyError {
    /// The key argument was empty or whitespace.
    #[error("SSE-C key is empty")]
    Empty,

    /// The key argument is not valid standard base64.
    #[error("SSE-C key is not valid base64: {source}")]
    InvalidBase64 {
        /// The underlying decode error.
        #[source]
        source: base64::DecodeError,
    },
}

/// A customer-provided encryption key and its precomputed fingerprint.
///
/// The base64 text is kept verbatim because S3 expects exactly what the
/// caller supplied; only the fingerprint is computed over decoded bytes.
#[derive(Clone, PartialEq, Eq)]
pub struct SseCustomerKey {
    base64_key: String,
    raw_len: usize,
    fingerprint: String,
}

impl SseCustomerKey {
    /// Decodes `base64_key` and computes its MD5 fingerprint.
    ///
    /// Keys that do not decode to 32 bytes are accepted with a warning;
    /// the backend is the authority on key length.
    ///
    /// # Errors
    ///
    /// Returns [`KeyError::Empty`] for an empty argument and
    /// [`KeyError::InvalidBase64`] when the text is not standard base64.
    pub fn from_base64(base64_key: &str) -> Result<Self, KeyError> {
        let base64_key = base64_key.trim();
        if base64_key.is_empty() {
            return Err(KeyError::Empty);
        }

        let raw = KEY_DECODER
            .decode(base64_key)
            .map_err(|source| KeyError::InvalidBase64 { source })?;

        if raw.len() != AES256_KEY_LEN {
            warn!(
                decoded_len = raw.len(),
                expected = AES256_KEY_LEN,
                "SSE-C key does not decode to a 256-bit key; S3 will likely reject it"
            );
        }

        Ok(Self {
            base64_key: base64_key.to_string(),
            raw_len: raw.len(),
            fingerprint: fingerprint_raw(&raw),
        })
    }

    /// Returns the algorithm header value.
    #[must_use]
    pub fn algorithm(&self) -> &'static str {
        SSE_CUSTOMER_ALGORITHM
    }

    /// Returns the key exactly as the caller supplied it (base64 text).
    #[must_use]
    pub fn base64_key(&self) -> &str {
        &self.base64_key
    }

    /// Returns the base64 MD5 digest of the decoded key bytes.
    #[must_use]
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    /// Returns the decoded key length in bytes.
    #[must_use]
    pub fn decoded_len(&self) -> usize {
        self.raw_len
    }
}

// Key text must never reach logs.
impl fmt::Debug for SseCustomerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SseCustomerKey")
            .field("base64_key", &"<redacted>")
            .field("decoded_len", &self.raw_len)
            .field("fingerprint", &self.fingerprint)
            .finish()
    }
}

/// Computes the SSE-C key fingerprint for base64 key text.
///
/// Pure function: decode, MD5, re-encode.
///
/// # Errors
///
/// Returns [`KeyError::InvalidBase64`] if the text does not decode.
pub fn key_fingerprint(base64_key: &str) -> Result<String, KeyError> {
    let raw = KEY_DECODER
        .decode(base64_key.trim())
        .map_err(|source| KeyError::InvalidBase64 { source })?;
    Ok(fingerprint_raw(&raw))
}

fn fingerprint_raw(raw: &[u8]) -> String {
    BASE64.encode(md5::compute(raw).0)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    // 32 bytes of b'k', base64 encoded.
    const AES_KEY_B64: &str = "a2tra2tra2tra2tra2tra2tra2tra2tra2tra2tra2s=";

    #[test]
    fn test_fingerprint_matches_known_vector() {
        // md5("testkey") computed independently
        assert_eq!(
            key_fingerprint("dGVzdGtleQ==").unwrap(),
            "Ihs2jX9fWXhn9SWXHyj/dQ=="
        );
    }

    #[test]
    fn test_fingerprint_of_aes256_key() {
        let key = SseCustomerKey::from_base64(AES_KEY_B64).unwrap();
        assert_eq!(key.decoded_len(), 32);
        assert_eq!(key.fingerprint(), "mT2HRsMGJ5IX5C+0rreZ8Q==");
    }

    #[test]
    fn test_fingerprint_is_over_decoded_bytes_not_text() {
        // MD5 of the literal text "dGVzdGtleQ==" would be a protocol violation.
        let fingerprint = key_fingerprint("dGVzdGtleQ==").unwrap();
        assert_ne!(fingerprint, "vaeYYVKp46/vRbSfQyZcQw==");
    }

    #[test]
    fn test_fingerprint_is_deterministic() {
        let first = key_fingerprint(AES_KEY_B64).unwrap();
        for _ in 0..5 {
            assert_eq!(key_fingerprint(AES_KEY_B64).unwrap(), first);
        }
        let key = SseCustomerKey::from_base64(AES_KEY_B64).unwrap();
        assert_eq!(key.fingerprint(), first);
    }

    #[test]
    fn test_base64_key_is_kept_verbatim() {
        let key = SseCustomerKey::from_base64(AES_KEY_B64).unwrap();
        assert_eq!(key.base64_key(), AES_KEY_B64);
        assert_eq!(key.algorithm(), "AES256");
    }

    #[test]
    fn test_surrounding_whitespace_is_trimmed() {
        let key = SseCustomerKey::from_base64("  dGVzdGtleQ==\n").unwrap();
        assert_eq!(key.base64_key(), "dGVzdGtleQ==");
    }

    #[test]
    fn test_short_key_is_accepted() {
        let key = SseCustomerKey::from_base64("dGVzdGtleQ==").unwrap();
        assert_eq!(key.decoded_len(), 7);
    }

    #[test]
    fn test_non_canonical_trailing_bits_accepted() {
        let key = SseCustomerKey::from_base64("dGVzdGtleR==").unwrap();
        assert_eq!(key.decoded_len(), 7);
        assert_eq!(key.fingerprint(), "Ihs2jX9fWXhn9SWXHyj/dQ==");
        // The text S3 receives is still the caller's.
        assert_eq!(key.base64_key(), "dGVzdGtleR==");
    }

    #[test]
    fn test_missing_padding_rejected() {
        assert!(matches!(
            SseCustomerKey::from_base64("dGVzdGtleQ"),
            Err(KeyError::InvalidBase64 { .. })
        ));
    }

    #[test]
    fn test_invalid_base64_rejected() {
        let result = SseCustomerKey::from_base64("not base64!!");
        assert!(matches!(result, Err(KeyError::InvalidBase64 { .. })));
    }

    #[test]
    fn test_empty_key_rejected() {
        assert!(matches!(
            SseCustomerKey::from_base64("   "),
            Err(KeyError::Empty)
        ));
    }

    #[test]
    fn test_debug_output_redacts_key() {
        let key = SseCustomerKey::from_base64(AES_KEY_B64).unwrap();
        let debug = format!("{key:?}");
        assert!(!debug.contains(AES_KEY_B64), "key leaked: {debug}");
        assert!(debug.contains("redacted"));
    }
}
