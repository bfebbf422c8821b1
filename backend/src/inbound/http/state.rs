//! Shared HTTP adapter state.
//!
//! Handlers accept this state via `actix_web::web::Data` so they only depend
//! on driving ports and remain testable without I/O.

use std::sync::Arc;

use crate::domain::ports::{AccountCommand, ShipmentCommand, ShipmentQuery, TokenAuthenticator};

/// Dependency bundle for HTTP handlers.
///
/// # Examples
/// ```no_run
/// # use std::sync::Arc;
/// # use shiptrack::domain::ports::{AccountCommand, ShipmentCommand, ShipmentQuery, TokenAuthenticator};
/// use shiptrack::inbound::http::state::HttpState;
///
/// # fn build(
/// #     accounts: Arc<dyn AccountCommand>,
/// #     authenticator: Arc<dyn TokenAuthenticator>,
/// #     shipments: Arc<dyn ShipmentCommand>,
/// #     shipments_query: Arc<dyn ShipmentQuery>,
/// # ) {
/// let state = HttpState {
///     accounts,
///     authenticator,
///     shipments,
///     shipments_query,
/// };
/// let _accounts = state.accounts.clone();
/// # }
/// ```
#[derive(Clone)]
pub struct HttpState {
    /// Account use-cases.
    pub accounts: Arc<dyn AccountCommand>,
    /// Bearer token resolution for extractors.
    pub authenticator: Arc<dyn TokenAuthenticator>,
    /// Shipment mutations.
    pub shipments: Arc<dyn ShipmentCommand>,
    /// Shipment reads.
    pub shipments_query: Arc<dyn ShipmentQuery>,
}
