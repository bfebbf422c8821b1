//! Shipment records, drafts and the changes applied to them.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::status::{ShipmentStatus, TransitionError};
use super::timeline::{EventDraft, Timeline};
use crate::domain::account::{AccountId, AccountRole, ZipCode};
use crate::domain::auth::Principal;

/// Heaviest accepted shipment, in weight units.
pub const MAX_WEIGHT: f64 = 25.0;
/// Longest accepted content description, in characters.
pub const CONTENT_MAX: usize = 256;
/// Delivery estimate assigned at placement, counted from creation.
pub const DEFAULT_DELIVERY_WINDOW_DAYS: i64 = 3;

/// Validation errors raised by shipment constructors.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ShipmentValidationError {
    /// Content description is blank.
    #[error("content must not be empty")]
    EmptyContent,
    /// Content description is too long.
    #[error("content must be at most {max} characters")]
    ContentTooLong {
        /// Upper limit.
        max: usize,
    },
    /// Weight is not a positive finite number.
    #[error("weight must be a positive number")]
    InvalidWeight {
        /// Rejected value.
        value: f64,
    },
    /// Weight is above the limit.
    #[error("weight must not exceed {max}")]
    TooHeavy {
        /// Upper limit.
        max: f64,
    },
    /// Event description is blank.
    #[error("description must not be empty")]
    EmptyDescription,
    /// Update carries no fields.
    #[error("no data to update")]
    EmptyUpdate,
}

/// Stable shipment identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShipmentId(Uuid);

impl ShipmentId {
    /// New random identifier.
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap an existing UUID.
    pub const fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Underlying UUID.
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for ShipmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Parcel weight, `0 < w <= 25`.
///
/// # Examples
/// ```
/// use shiptrack::domain::Weight;
///
/// assert!(Weight::new(25.0).is_ok());
/// assert!(Weight::new(25.5).is_err());
/// assert!(Weight::new(0.0).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct Weight(f64);

impl Weight {
    /// Validate a raw weight.
    pub fn new(value: f64) -> Result<Self, ShipmentValidationError> {
        if !value.is_finite() || value <= 0.0 {
            return Err(ShipmentValidationError::InvalidWeight { value });
        }
        if value > MAX_WEIGHT {
            return Err(ShipmentValidationError::TooHeavy { max: MAX_WEIGHT });
        }
        Ok(Self(value))
    }

    /// Weight as a number.
    pub const fn value(self) -> f64 {
        self.0
    }
}

/// Validated seller input for a new shipment.
#[derive(Debug, Clone, PartialEq)]
pub struct ShipmentDraft {
    content: String,
    weight: Weight,
    destination: ZipCode,
}

impl ShipmentDraft {
    /// Trim and validate the seller's input.
    pub fn new(
        content: &str,
        weight: f64,
        destination: ZipCode,
    ) -> Result<Self, ShipmentValidationError> {
        let content = content.trim();
        if content.is_empty() {
            return Err(ShipmentValidationError::EmptyContent);
        }
        if content.chars().count() > CONTENT_MAX {
            return Err(ShipmentValidationError::ContentTooLong { max: CONTENT_MAX });
        }
        Ok(Self {
            content: content.to_owned(),
            weight: Weight::new(weight)?,
            destination,
        })
    }

    /// Delivery zip code.
    pub fn destination(&self) -> ZipCode {
        self.destination
    }
}

/// Shipment ready to be assigned and persisted.
///
/// The identifier is fixed before persistence so the verification code can
/// be stored under it ahead of the commit.
#[derive(Debug, Clone, PartialEq)]
pub struct NewShipment {
    /// Identifier fixed before persistence.
    pub id: ShipmentId,
    /// What is being shipped.
    pub content: String,
    /// Parcel weight.
    pub weight: Weight,
    /// Delivery zip code.
    pub destination: ZipCode,
    /// Owning seller.
    pub seller_id: AccountId,
    /// Seller pickup zip code, used for the opening event.
    pub origin: ZipCode,
    /// Initial delivery estimate.
    pub estimated_delivery: DateTime<Utc>,
    /// Placement time.
    pub created_at: DateTime<Utc>,
}

impl NewShipment {
    /// Place a draft on behalf of a seller whose pickup zip is `origin`.
    pub fn place(
        draft: ShipmentDraft,
        seller_id: AccountId,
        origin: ZipCode,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: ShipmentId::random(),
            content: draft.content,
            weight: draft.weight,
            destination: draft.destination,
            seller_id,
            origin,
            estimated_delivery: now + Duration::days(DEFAULT_DELIVERY_WINDOW_DAYS),
            created_at: now,
        }
    }

    /// First timeline entry, recorded at the seller's location.
    pub fn opening_event(&self, partner_name: &str) -> EventDraft {
        EventDraft {
            location: Some(self.origin),
            status: Some(ShipmentStatus::Placed),
            description: Some(format!("assigned to {partner_name}")),
        }
    }

    /// Materialise the persisted shipment once a partner is assigned.
    pub fn into_shipment(self, partner_id: AccountId, partner_name: &str) -> Shipment {
        let mut timeline = Timeline::default();
        timeline.append(self.id, self.opening_event(partner_name), self.created_at);
        Shipment {
            id: self.id,
            content: self.content,
            weight: self.weight,
            destination: self.destination,
            status: ShipmentStatus::Placed,
            estimated_delivery: self.estimated_delivery,
            seller_id: self.seller_id,
            partner_id,
            created_at: self.created_at,
            timeline,
        }
    }
}

/// Field bundle used by adapters to rebuild a stored shipment.
#[derive(Debug, Clone)]
pub struct ShipmentRecord {
    /// Stored identifier.
    pub id: ShipmentId,
    /// What is being shipped.
    pub content: String,
    /// Parcel weight.
    pub weight: Weight,
    /// Delivery zip code.
    pub destination: ZipCode,
    /// Current status.
    pub status: ShipmentStatus,
    /// Current delivery estimate.
    pub estimated_delivery: DateTime<Utc>,
    /// Owning seller.
    pub seller_id: AccountId,
    /// Assigned partner.
    pub partner_id: AccountId,
    /// Placement time.
    pub created_at: DateTime<Utc>,
    /// Events oldest first.
    pub timeline: Timeline,
}

/// Persisted shipment with its timeline.
#[derive(Debug, Clone, PartialEq)]
pub struct Shipment {
    id: ShipmentId,
    content: String,
    weight: Weight,
    destination: ZipCode,
    status: ShipmentStatus,
    estimated_delivery: DateTime<Utc>,
    seller_id: AccountId,
    partner_id: AccountId,
    created_at: DateTime<Utc>,
    timeline: Timeline,
}

impl From<ShipmentRecord> for Shipment {
    fn from(record: ShipmentRecord) -> Self {
        Self {
            id: record.id,
            content: record.content,
            weight: record.weight,
            destination: record.destination,
            status: record.status,
            estimated_delivery: record.estimated_delivery,
            seller_id: record.seller_id,
            partner_id: record.partner_id,
            created_at: record.created_at,
            timeline: record.timeline,
        }
    }
}

impl Shipment {
    /// Shipment identifier.
    pub fn id(&self) -> ShipmentId {
        self.id
    }

    /// What is being shipped.
    pub fn content(&self) -> &str {
        self.content.as_str()
    }

    /// Parcel weight.
    pub fn weight(&self) -> Weight {
        self.weight
    }

    /// Delivery zip code.
    pub fn destination(&self) -> ZipCode {
        self.destination
    }

    /// Current lifecycle status.
    pub fn status(&self) -> ShipmentStatus {
        self.status
    }

    /// Current delivery estimate.
    pub fn estimated_delivery(&self) -> DateTime<Utc> {
        self.estimated_delivery
    }

    /// Owning seller.
    pub fn seller_id(&self) -> AccountId {
        self.seller_id
    }

    /// Assigned partner.
    pub fn partner_id(&self) -> AccountId {
        self.partner_id
    }

    /// Placement time.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Recorded events.
    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    /// Whether `seller` placed this shipment.
    pub fn is_owned_by(&self, seller: AccountId) -> bool {
        self.seller_id == seller
    }

    /// Whether `partner` is carrying this shipment.
    pub fn is_assigned_to(&self, partner: AccountId) -> bool {
        self.partner_id == partner
    }

    /// Only the owning seller or the assigned partner may read a shipment.
    pub fn is_visible_to(&self, principal: Principal) -> bool {
        match principal.role {
            AccountRole::Seller => self.is_owned_by(principal.id),
            AccountRole::Partner => self.is_assigned_to(principal.id),
        }
    }

    /// Apply a change whose preconditions the caller has already checked.
    ///
    /// Returns `false` without touching the shipment when its status no
    /// longer matches the change's expectation.
    pub fn apply(&mut self, change: ShipmentChange) -> bool {
        if self.status != change.expected_status {
            return false;
        }
        self.status = change.status;
        if let Some(eta) = change.estimated_delivery {
            self.estimated_delivery = eta;
        }
        if let Some(event) = change.event {
            self.timeline.append(self.id, event, change.at);
        }
        true
    }
}

/// Partner-submitted partial update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShipmentUpdate {
    location: Option<ZipCode>,
    status: Option<ShipmentStatus>,
    estimated_delivery: Option<DateTime<Utc>>,
    description: Option<String>,
    verification_code: Option<String>,
}

impl ShipmentUpdate {
    /// Validate an update; a verification code on its own carries no data.
    ///
    /// # Examples
    /// ```
    /// use shiptrack::domain::{ShipmentStatus, ShipmentUpdate};
    ///
    /// assert!(ShipmentUpdate::new(None, None, None, None, Some("123456".into())).is_err());
    /// let update =
    ///     ShipmentUpdate::new(None, Some(ShipmentStatus::InTransit), None, None, None).unwrap();
    /// assert!(update.event_draft().is_some());
    /// ```
    pub fn new(
        location: Option<ZipCode>,
        status: Option<ShipmentStatus>,
        estimated_delivery: Option<DateTime<Utc>>,
        description: Option<String>,
        verification_code: Option<String>,
    ) -> Result<Self, ShipmentValidationError> {
        let description = match description {
            Some(text) if text.trim().is_empty() => {
                return Err(ShipmentValidationError::EmptyDescription);
            }
            other => other.map(|text| text.trim().to_owned()),
        };
        if location.is_none()
            && status.is_none()
            && estimated_delivery.is_none()
            && description.is_none()
        {
            return Err(ShipmentValidationError::EmptyUpdate);
        }
        Ok(Self {
            location,
            status,
            estimated_delivery,
            description,
            verification_code,
        })
    }

    /// Requested status, if any.
    pub fn status(&self) -> Option<ShipmentStatus> {
        self.status
    }

    /// Revised estimate, if any.
    pub fn estimated_delivery(&self) -> Option<DateTime<Utc>> {
        self.estimated_delivery
    }

    /// Code supplied with a delivery.
    pub fn verification_code(&self) -> Option<&str> {
        self.verification_code.as_deref()
    }

    /// Event recorded for this update, unless only the estimate changed.
    pub fn event_draft(&self) -> Option<EventDraft> {
        let draft = EventDraft {
            location: self.location,
            status: self.status,
            description: self.description.clone(),
        };
        (!draft.is_empty()).then_some(draft)
    }
}

/// State change applied atomically by the repository.
///
/// The repository must reject the change when the stored status differs from
/// `expected_status`, which closes the read-check-write race between two
/// concurrent updates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShipmentChange {
    /// Status the change was computed against.
    pub expected_status: ShipmentStatus,
    /// Status after the change.
    pub status: ShipmentStatus,
    /// Replacement estimate; `None` keeps the stored one.
    pub estimated_delivery: Option<DateTime<Utc>>,
    /// Event to append, if any.
    pub event: Option<EventDraft>,
    /// Clock reading for the change.
    pub at: DateTime<Utc>,
}

impl ShipmentChange {
    /// Build the change for a partner update against the current shipment.
    pub fn for_update(
        shipment: &Shipment,
        update: &ShipmentUpdate,
        at: DateTime<Utc>,
    ) -> Result<Self, TransitionError> {
        let current = shipment.status();
        current.check_mutable()?;
        if let Some(next) = update.status() {
            current.check_update_target(next)?;
        }
        Ok(Self {
            expected_status: current,
            status: update.status().unwrap_or(current),
            estimated_delivery: update.estimated_delivery(),
            event: update.event_draft(),
            at,
        })
    }

    /// Build the change for a seller cancellation.
    pub fn for_cancel(shipment: &Shipment, at: DateTime<Utc>) -> Result<Self, TransitionError> {
        let current = shipment.status();
        current.check_mutable()?;
        Ok(Self {
            expected_status: current,
            status: ShipmentStatus::Cancelled,
            estimated_delivery: None,
            event: Some(EventDraft {
                location: None,
                status: Some(ShipmentStatus::Cancelled),
                description: Some("cancelled by seller".to_owned()),
            }),
            at,
        })
    }
}
