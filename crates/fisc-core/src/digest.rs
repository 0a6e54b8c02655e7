//! # Request Fingerprints
//!
//! A [`Fingerprint`] is the SHA-256 of a value's [`CanonicalBytes`], rendered
//! as lowercase hex. The calculation cache keys entries by the fingerprint of
//! the whole request (`type`, `year`, `data`), so two requests that carry the
//! same logical content hit the same entry regardless of key order or of
//! insignificant trailing zeros in decimal values.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

use crate::canonical::CanonicalBytes;
use crate::error::CanonicalizationError;

/// Deterministic, order-independent encoding of a serializable value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// The lowercase hex digest.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sha256:{}", self.0)
    }
}

/// Compute a SHA-256 hex string from canonical bytes.
///
/// Accepts only `&CanonicalBytes`, so every hashed byte sequence went through
/// canonicalization first.
pub fn sha256_hex(data: &CanonicalBytes) -> String {
    Sha256::digest(data.as_bytes())
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}

/// Canonicalize `value` and hash it.
///
/// # Errors
///
/// Propagates [`CanonicalizationError`] when the value contains floats or
/// cannot be serialized.
pub fn fingerprint(value: &impl Serialize) -> Result<Fingerprint, CanonicalizationError> {
    let cb = CanonicalBytes::new(value)?;
    Ok(Fingerprint(sha256_hex(&cb)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_known_vector() {
        // sha256("{}")
        let cb = CanonicalBytes::new(&serde_json::json!({})).unwrap();
        assert_eq!(
            sha256_hex(&cb),
            "44136fa355b3678a1146ad16f7e8649e94fb4fc21fe77e8310c060f61caaff8a"
        );
    }

    #[test]
    fn fingerprint_is_64_hex_chars() {
        let fp = fingerprint(&serde_json::json!({"type": "vat"})).unwrap();
        assert_eq!(fp.as_str().len(), 64);
        assert!(fp.as_str().chars().all(|c| c.is_ascii_hexdigit()));
        assert!(fp.to_string().starts_with("sha256:"));
    }

    #[test]
    fn key_order_does_not_matter() {
        let a: serde_json::Value =
            serde_json::from_str(r#"{"type":"wealth","year":2024,"data":{"net_worth":"5"}}"#)
                .unwrap();
        let b: serde_json::Value =
            serde_json::from_str(r#"{"data":{"net_worth":"5"},"year":2024,"type":"wealth"}"#)
                .unwrap();
        assert_eq!(fingerprint(&a).unwrap(), fingerprint(&b).unwrap());
    }

    #[test]
    fn different_content_differs() {
        let a = fingerprint(&serde_json::json!({"year": 2024})).unwrap();
        let b = fingerprint(&serde_json::json!({"year": 2025})).unwrap();
        assert_ne!(a, b);
    }
}
