//! HMAC-SHA256 signed account links.
//!
//! A link token is `payload.signature`, both base64url without padding. The
//! payload is the JSON form of the link claims plus the purpose label and
//! issue time; the signature covers the purpose label and the encoded payload,
//! so a verification link can never be replayed as a reset link.

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Utc};
use hmac::digest::{Key, KeyInit};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::domain::ports::{SignedLinkError, SignedLinks};
use crate::domain::{LinkClaims, LinkPurpose};

use super::signing_key::SigningKey;

type HmacSha256 = Hmac<Sha256>;

const SUBKEY_LABEL: &str = "shiptrack account link";

#[derive(Debug, Serialize, Deserialize)]
struct LinkPayload {
    #[serde(flatten)]
    claims: LinkClaims,
    purpose: String,
    iat: i64,
}

/// [`SignedLinks`] adapter keyed by a subkey of the service signing key.
#[derive(Clone)]
pub struct HmacSignedLinks {
    keyed: HmacSha256,
}

impl HmacSignedLinks {
    /// Links keyed by a subkey derived from `key`.
    pub fn new(key: &SigningKey) -> Self {
        // The 32-byte subkey is zero-padded to the block size, as HMAC would.
        let subkey = key.derive(SUBKEY_LABEL);
        let mut block = Key::<HmacSha256>::default();
        block[..subkey.len()].copy_from_slice(&subkey);
        let keyed = <HmacSha256 as KeyInit>::new(&block);
        block.iter_mut().for_each(|byte| *byte = 0);
        Self { keyed }
    }

    fn mac(&self, purpose: LinkPurpose, payload: &str) -> HmacSha256 {
        let mut mac = self.keyed.clone();
        mac.update(purpose.label().as_bytes());
        mac.update(b".");
        mac.update(payload.as_bytes());
        mac
    }
}

impl SignedLinks for HmacSignedLinks {
    fn sign(
        &self,
        purpose: LinkPurpose,
        claims: &LinkClaims,
        issued_at: DateTime<Utc>,
    ) -> Result<String, SignedLinkError> {
        let payload = LinkPayload {
            claims: claims.clone(),
            purpose: purpose.label().to_owned(),
            iat: issued_at.timestamp(),
        };
        let json =
            serde_json::to_vec(&payload).map_err(|error| SignedLinkError::encode(error.to_string()))?;
        let encoded = URL_SAFE_NO_PAD.encode(json);
        let signature = URL_SAFE_NO_PAD.encode(self.mac(purpose, &encoded).finalize().into_bytes());
        Ok(format!("{encoded}.{signature}"))
    }

    fn verify(
        &self,
        purpose: LinkPurpose,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<LinkClaims, SignedLinkError> {
        let (encoded, signature) = token
            .split_once('.')
            .ok_or_else(|| SignedLinkError::invalid("missing signature"))?;
        let signature = URL_SAFE_NO_PAD
            .decode(signature)
            .map_err(|_| SignedLinkError::invalid("signature is not base64url"))?;
        self.mac(purpose, encoded)
            .verify_slice(&signature)
            .map_err(|_| SignedLinkError::invalid("signature mismatch"))?;

        let json = URL_SAFE_NO_PAD
            .decode(encoded)
            .map_err(|_| SignedLinkError::invalid("payload is not base64url"))?;
        let payload: LinkPayload = serde_json::from_slice(&json)
            .map_err(|error| SignedLinkError::invalid(error.to_string()))?;
        if payload.purpose != purpose.label() {
            return Err(SignedLinkError::invalid("link minted for another purpose"));
        }

        let issued_at = DateTime::from_timestamp(payload.iat, 0)
            .ok_or_else(|| SignedLinkError::invalid("issue time out of range"))?;
        if now - issued_at > purpose.max_age() {
            return Err(SignedLinkError::Expired);
        }
        Ok(payload.claims)
    }
}
