//! Signing key fingerprinting for operational visibility.
//!
//! Operators compare the logged fingerprint against the rotation runbook to
//! see which key is active without exposing the key material.

use sha2::{Digest, Sha256};

use super::signing_key::SigningKey;

/// Length of the fingerprint in bytes before hex encoding.
const FINGERPRINT_BYTES: usize = 8;

/// First eight bytes of the key's SHA-256 digest as lowercase hex.
///
/// # Examples
///
/// ```rust
/// use shiptrack::outbound::security::{SigningKey, key_fingerprint};
///
/// let fp = key_fingerprint(&SigningKey::generate());
/// assert_eq!(fp.len(), 16);
/// assert!(fp.chars().all(|c| c.is_ascii_hexdigit()));
/// ```
#[must_use]
pub fn key_fingerprint(key: &SigningKey) -> String {
    let digest = Sha256::digest(key.as_bytes());
    hex::encode(&digest[..FINGERPRINT_BYTES])
}
