//! Driving port used by inbound adapters to resolve bearer tokens.

use async_trait::async_trait;

use crate::domain::{AccessClaims, Error};

/// Resolves bearer tokens to claims.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TokenAuthenticator: Send + Sync {
    /// Decode `token` and reject it if expired, invalid or revoked.
    async fn authenticate(&self, token: &str) -> Result<AccessClaims, Error>;
}
