//! Port for the access-token denylist.

use std::time::Duration;

use async_trait::async_trait;

use crate::domain::TokenId;

use super::define_port_error;

define_port_error! {
    /// Errors raised by revocation stores.
    pub enum TokenRevocationError {
        /// Store connection could not be established.
        Connection { message: String } =>
            "token revocation store connection failed: {message}",
        /// Command failed on the store.
        Backend { message: String } =>
            "token revocation store command failed: {message}",
    }
}

/// Shared denylist consulted on every authenticated request.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TokenRevocationStore: Send + Sync {
    /// Deny `token_id` for `ttl`, after which the token has expired anyway.
    async fn revoke(&self, token_id: &TokenId, ttl: Duration) -> Result<(), TokenRevocationError>;

    /// Whether `token_id` was revoked and the entry has not lapsed.
    async fn is_revoked(&self, token_id: &TokenId) -> Result<bool, TokenRevocationError>;
}
