//! Shipment tracking backend.
//!
//! Sellers place shipments that are assigned to the first delivery partner
//! serving the destination with spare capacity; partners advance them
//! through the delivery lifecycle while an append-only timeline records
//! every step.

pub mod doc;
pub mod domain;
pub mod inbound;
pub mod middleware;
pub mod outbound;
pub mod settings;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

/// Public OpenAPI surface used by Swagger UI and tooling.
pub use doc::ApiDoc;
pub use domain::TraceId;
pub use middleware::Trace;
