//! Port for issuing and decoding bearer access tokens.

use chrono::{DateTime, Utc};

use crate::domain::AccessClaims;

use super::define_port_error;

define_port_error! {
    /// Errors raised by access token codecs.
    pub enum AccessTokenError {
        /// The token was well formed but its lifetime has passed.
        Expired => "access token expired",
        /// The token is malformed, tampered with or signed with another key.
        Invalid { message: String } => "invalid access token: {message}",
        /// Encoding a new token failed.
        Issue { message: String } => "failed to issue access token: {message}",
    }
}

/// Signs and verifies access tokens. Revocation is checked separately.
#[cfg_attr(test, mockall::automock)]
pub trait AccessTokens: Send + Sync {
    /// Encode and sign `claims`.
    fn issue(&self, claims: &AccessClaims) -> Result<String, AccessTokenError>;

    /// Decode `token`, treating it as expired if `now` is past its expiry.
    fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<AccessClaims, AccessTokenError>;
}
