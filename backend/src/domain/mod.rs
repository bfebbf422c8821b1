//! Domain primitives, aggregates and services.
//!
//! Purpose: define the shipment lifecycle, partner matching and account
//! directory independently of HTTP, Redis or PostgreSQL. Adapters reach the
//! domain only through the traits in [`ports`].
//!
//! Public surface:
//! - Error / ErrorCode: transport-agnostic failure payload.
//! - Shipment, ShipmentStatus, Timeline: the lifecycle aggregate.
//! - find_partner_for: first-fit delivery partner selection.
//! - Account and friends: seller and delivery-partner records.
//! - ShipmentCommandService, ShipmentQueryService, AccountService: driving
//!   port implementations.

pub mod account;
pub mod account_service;
pub mod auth;
pub mod error;
pub mod partner_matching;
pub mod ports;
pub mod shipment;
pub mod shipment_service;
pub mod trace_id;

pub use self::account::{
    Account, AccountId, AccountProfile, AccountRecord, AccountRole, AccountValidationError,
    EmailAddress, NAME_MAX, NewPassword, PASSWORD_MIN, ParseAccountRoleError, PartnerProfileUpdate,
    PasswordHash, SignupDraft, ZIP_CODE_MAX, ZipCode,
};
pub use self::account_service::{AccountCollaborators, AccountService, AccountServiceConfig};
pub use self::auth::{
    AccessClaims, IssuedToken, LinkClaims, LinkPurpose, LoginCredentials, LoginValidationError,
    Principal, TokenId,
};
pub use self::error::{Error, ErrorCode};
pub use self::partner_matching::{NoPartnerAvailable, PartnerCandidate, find_partner_for};
pub use self::shipment::{
    CODE_DIGITS, CONTENT_MAX, DEFAULT_DELIVERY_WINDOW_DAYS, EventDraft, EventId, MAX_WEIGHT,
    NewShipment, ParseShipmentStatusError, Shipment, ShipmentChange, ShipmentDraft, ShipmentEvent,
    ShipmentId, ShipmentRecord, ShipmentStatus, ShipmentUpdate, ShipmentValidationError, Timeline,
    TransitionError, VerificationCode, Weight, next_event_timestamp,
};
pub use self::shipment_service::{
    ShipmentCollaborators, ShipmentCommandService, ShipmentQueryService, VERIFICATION_CODE_TTL,
};
pub use self::trace_id::{TRACE_ID_HEADER, TraceId};

/// Convenient API result alias.
///
/// # Examples
/// ```
/// use actix_web::HttpResponse;
/// use shiptrack::domain::{ApiResult, Error};
///
/// fn handler() -> ApiResult<HttpResponse> {
///     Err(Error::forbidden("sellers only"))
/// }
/// ```
pub type ApiResult<T> = Result<T, Error>;
