//! Driving port for shipment reads.

use async_trait::async_trait;

use crate::domain::{Error, Principal, Shipment, ShipmentId};

/// Shipment reads scoped to the caller.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ShipmentQuery: Send + Sync {
    /// Fetch a shipment visible to `viewer`.
    async fn get(&self, viewer: Principal, shipment_id: ShipmentId) -> Result<Shipment, Error>;
}
