//! Shipment aggregate: records, lifecycle and timeline.
//!
//! A shipment references its seller and partner by [`AccountId`] only;
//! callers resolve accounts through the account repository when needed.
//!
//! [`AccountId`]: crate::domain::AccountId

mod record;
mod status;
mod timeline;
mod verification;

pub use record::{
    CONTENT_MAX, DEFAULT_DELIVERY_WINDOW_DAYS, MAX_WEIGHT, NewShipment, Shipment, ShipmentChange,
    ShipmentDraft, ShipmentId, ShipmentRecord, ShipmentUpdate, ShipmentValidationError, Weight,
};
pub use status::{ParseShipmentStatusError, ShipmentStatus, TransitionError};
pub use timeline::{EventDraft, EventId, ShipmentEvent, Timeline, next_event_timestamp};
pub use verification::{CODE_DIGITS, VerificationCode};
