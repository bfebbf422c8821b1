//! Port for the side-channel store of delivery verification codes.

use std::time::Duration;

use async_trait::async_trait;

use crate::domain::{ShipmentId, VerificationCode};

use super::define_port_error;

define_port_error! {
    /// Errors raised by verification code stores.
    pub enum VerificationCodeStoreError {
        /// Store connection could not be established.
        Connection { message: String } =>
            "verification code store connection failed: {message}",
        /// Command failed on the store.
        Backend { message: String } =>
            "verification code store command failed: {message}",
    }
}

/// Keyed by shipment id; written at creation, read on delivery.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VerificationCodeStore: Send + Sync {
    /// Keep `code` for `shipment_id` until `ttl` elapses.
    async fn store(
        &self,
        shipment_id: &ShipmentId,
        code: &VerificationCode,
        ttl: Duration,
    ) -> Result<(), VerificationCodeStoreError>;

    /// Current code, or `None` once it has expired or was never stored.
    async fn get_code(
        &self,
        shipment_id: &ShipmentId,
    ) -> Result<Option<VerificationCode>, VerificationCodeStoreError>;

    /// Discard the code; removing an absent entry is not an error.
    async fn remove(&self, shipment_id: &ShipmentId) -> Result<(), VerificationCodeStoreError>;
}
