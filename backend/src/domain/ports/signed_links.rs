//! Port for signed, time-limited account links.

use chrono::{DateTime, Utc};

use crate::domain::{LinkClaims, LinkPurpose};

use super::define_port_error;

define_port_error! {
    /// Errors raised by link signers.
    pub enum SignedLinkError {
        /// The signature is valid but the link is older than its purpose allows.
        Expired => "link expired",
        /// The link is malformed, tampered with or minted for another purpose.
        Invalid { message: String } => "invalid link: {message}",
        /// Encoding a new link failed.
        Encode { message: String } => "failed to sign link: {message}",
    }
}

/// Mints and checks opaque link tokens bound to a [`LinkPurpose`].
#[cfg_attr(test, mockall::automock)]
pub trait SignedLinks: Send + Sync {
    /// Mint a link token for `claims`.
    fn sign(
        &self,
        purpose: LinkPurpose,
        claims: &LinkClaims,
        issued_at: DateTime<Utc>,
    ) -> Result<String, SignedLinkError>;

    /// Check signature, purpose and age, returning the claims.
    fn verify(
        &self,
        purpose: LinkPurpose,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<LinkClaims, SignedLinkError>;
}
