//! Content fingerprint: the dedup key for content identity.

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Number of body characters that take part in the fingerprint.
pub const FINGERPRINT_BODY_CHARS: usize = 500;

/// Digest bytes kept (hex encoded to twice as many characters).
const FINGERPRINT_BYTES: usize = 16;

/// Deterministic hash of `title` and the first 500 characters of `body`.
///
/// Characters are Unicode scalar values, so multi-byte text is cut on a
/// character boundary rather than a byte offset.
///
/// Values are not comparable with MD5-based fingerprints stored by older
/// publishers of the same content.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentFingerprint(String);

impl ContentFingerprint {
    pub fn compute(title: &str, body: &str) -> Self {
        let head: String = body.chars().take(FINGERPRINT_BODY_CHARS).collect();
        let mut hasher = Sha256::new();
        hasher.update(title.as_bytes());
        hasher.update(b":");
        hasher.update(head.as_bytes());
        let digest = hasher.finalize();
        Self(hex::encode(&digest[..FINGERPRINT_BYTES]))
    }

    /// Wrap an already computed fingerprint (e.g. read back from storage).
    pub fn from_hex(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fingerprint_is_32_hex_chars() {
        let fp = ContentFingerprint::compute("T", "B");
        assert_eq!(fp.as_str().len(), 32);
        assert!(fp.as_str().chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn fingerprint_ignores_body_past_500_chars() {
        let head = "x".repeat(FINGERPRINT_BODY_CHARS);
        let a = ContentFingerprint::compute("T", &format!("{head}tail one"));
        let b = ContentFingerprint::compute("T", &format!("{head}a different tail"));
        assert_eq!(a, b);
    }

    #[test]
    fn fingerprint_counts_characters_not_bytes() {
        let head = "中".repeat(FINGERPRINT_BODY_CHARS);
        let a = ContentFingerprint::compute("T", &format!("{head}甲"));
        let b = ContentFingerprint::compute("T", &format!("{head}乙"));
        assert_eq!(a, b);

        let shorter = "中".repeat(FINGERPRINT_BODY_CHARS - 1);
        let c = ContentFingerprint::compute("T", &format!("{shorter}甲"));
        let d = ContentFingerprint::compute("T", &format!("{shorter}乙"));
        assert_ne!(c, d);
    }

    #[test]
    fn title_changes_fingerprint() {
        assert_ne!(
            ContentFingerprint::compute("A", "body"),
            ContentFingerprint::compute("B", "body")
        );
    }
}
