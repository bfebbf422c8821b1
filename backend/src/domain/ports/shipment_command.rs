//! Driving port for shipment mutations.
//!
//! Inbound adapters authenticate the caller, validate the payload into domain
//! drafts and hand both to this port; authorization against the shipment's
//! seller and partner happens behind it.

use async_trait::async_trait;

use crate::domain::{Error, Principal, Shipment, ShipmentDraft, ShipmentId, ShipmentUpdate};

/// Seller request to place a new shipment.
#[derive(Debug, Clone)]
pub struct CreateShipmentRequest {
    /// Authenticated seller.
    pub seller: Principal,
    /// Validated payload.
    pub draft: ShipmentDraft,
}

/// Partner request to advance a shipment.
#[derive(Debug, Clone)]
pub struct UpdateShipmentRequest {
    /// Authenticated partner.
    pub partner: Principal,
    /// Target shipment.
    pub shipment_id: ShipmentId,
    /// Validated changes.
    pub update: ShipmentUpdate,
}

/// Seller request to cancel or remove a shipment.
#[derive(Debug, Clone, Copy)]
pub struct SellerShipmentRequest {
    /// Authenticated seller.
    pub seller: Principal,
    /// Target shipment.
    pub shipment_id: ShipmentId,
}

/// Shipment lifecycle use-cases.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ShipmentCommand: Send + Sync {
    /// Assign a partner and place the shipment.
    async fn create(&self, request: CreateShipmentRequest) -> Result<Shipment, Error>;

    /// Record partner progress.
    async fn update(&self, request: UpdateShipmentRequest) -> Result<Shipment, Error>;

    /// Cancel a shipment that has not been delivered.
    async fn cancel(&self, request: SellerShipmentRequest) -> Result<Shipment, Error>;

    /// Remove a shipment and its timeline.
    async fn delete(&self, request: SellerShipmentRequest) -> Result<(), Error>;
}
