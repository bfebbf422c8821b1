//! Port for shipment persistence and atomic partner assignment.

use async_trait::async_trait;

use crate::domain::{NewShipment, Shipment, ShipmentChange, ShipmentId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by shipment repository adapters.
    pub enum ShipmentRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "shipment repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "shipment repository query failed: {message}",
        /// No partner serves the destination with spare capacity.
        NoPartnerAvailable { destination: u32 } =>
            "no delivery partner available for zip code {destination}",
        /// The shipment disappeared before the change could be applied.
        NotFound { shipment_id: String } =>
            "shipment {shipment_id} not found",
        /// Stored status no longer matches the expected status.
        StatusConflict { shipment_id: String } =>
            "shipment {shipment_id} was modified concurrently",
    }
}

/// Port for storing shipments together with their timelines.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ShipmentRepository: Send + Sync {
    /// Choose a partner for `shipment` by first-fit and persist both the
    /// shipment and its opening event.
    ///
    /// Candidate selection, the capacity check and the insert must commit as
    /// one atomic unit; nothing is stored when no partner fits.
    async fn create_assigned(
        &self,
        shipment: NewShipment,
    ) -> Result<Shipment, ShipmentRepositoryError>;

    /// Load a shipment and its timeline in append order.
    async fn find_by_id(
        &self,
        shipment_id: &ShipmentId,
    ) -> Result<Option<Shipment>, ShipmentRepositoryError>;

    /// Apply `change` if the stored status still equals
    /// `change.expected_status`, appending its event in the same unit.
    async fn apply_change(
        &self,
        shipment_id: &ShipmentId,
        change: ShipmentChange,
    ) -> Result<Shipment, ShipmentRepositoryError>;

    /// Remove a shipment and its events. Returns `false` when absent.
    async fn delete(&self, shipment_id: &ShipmentId) -> Result<bool, ShipmentRepositoryError>;
}
