//! Append-only event ledger kept per shipment.
//!
//! Events are stored in append order and never mutated. Each appended event
//! is stamped strictly after its predecessor, even if the wall clock stalls
//! or steps backwards. Presenting newest-first is left to adapters.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::record::ShipmentId;
use super::status::ShipmentStatus;
use crate::domain::account::ZipCode;

/// Stable event identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(Uuid);

impl EventId {
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

/// Fields an appended event carries. At least one is normally set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventDraft {
    /// Where the parcel was seen.
    pub location: Option<ZipCode>,
    /// Status reached, if it changed.
    pub status: Option<ShipmentStatus>,
    /// Free-form note.
    pub description: Option<String>,
}

impl EventDraft {
    /// True when no field is set.
    pub fn is_empty(&self) -> bool {
        self.location.is_none() && self.status.is_none() && self.description.is_none()
    }
}

/// Immutable timeline entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShipmentEvent {
    id: EventId,
    shipment_id: ShipmentId,
    location: Option<ZipCode>,
    status: Option<ShipmentStatus>,
    description: Option<String>,
    created_at: DateTime<Utc>,
}

impl ShipmentEvent {
    /// Materialise a draft as an event stamped at `created_at`.
    pub fn from_draft(
        id: EventId,
        shipment_id: ShipmentId,
        draft: EventDraft,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            shipment_id,
            location: draft.location,
            status: draft.status,
            description: draft.description,
            created_at,
        }
    }

    /// Event identifier.
    pub fn id(&self) -> EventId {
        self.id
    }

    /// Owning shipment.
    pub fn shipment_id(&self) -> ShipmentId {
        self.shipment_id
    }

    /// Reported location.
    pub fn location(&self) -> Option<ZipCode> {
        self.location
    }

    /// Status reached.
    pub fn status(&self) -> Option<ShipmentStatus> {
        self.status
    }

    /// Free-form note.
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// When the event was recorded.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// Timestamp for the next event given the previous one.
///
/// # Examples
/// ```
/// use chrono::{Duration, Utc};
/// use shiptrack::domain::next_event_timestamp;
///
/// let now = Utc::now();
/// assert_eq!(next_event_timestamp(None, now), now);
/// assert_eq!(next_event_timestamp(Some(now), now), now + Duration::microseconds(1));
/// ```
pub fn next_event_timestamp(previous: Option<DateTime<Utc>>, now: DateTime<Utc>) -> DateTime<Utc> {
    match previous {
        Some(previous) if now <= previous => previous + Duration::microseconds(1),
        _ => now,
    }
}

/// Ordered events for one shipment, oldest first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Timeline {
    events: Vec<ShipmentEvent>,
}

impl Timeline {
    /// Rebuild a timeline from stored events already in append order.
    pub fn from_events(events: Vec<ShipmentEvent>) -> Self {
        Self { events }
    }

    /// Append a new event, returning it.
    pub fn append(
        &mut self,
        shipment_id: ShipmentId,
        draft: EventDraft,
        now: DateTime<Utc>,
    ) -> &ShipmentEvent {
        let created_at = next_event_timestamp(self.last_timestamp(), now);
        let index = self.events.len();
        self.events.push(ShipmentEvent::from_draft(
            EventId::random(),
            shipment_id,
            draft,
            created_at,
        ));
        &self.events[index]
    }

    /// Events in append order.
    pub fn events(&self) -> &[ShipmentEvent] {
        &self.events
    }

    /// Events most recent first, as presented to clients.
    pub fn newest_first(&self) -> impl Iterator<Item = &ShipmentEvent> {
        self.events.iter().rev()
    }

    /// Timestamp of the newest event.
    pub fn last_timestamp(&self) -> Option<DateTime<Utc>> {
        self.events.last().map(ShipmentEvent::created_at)
    }

    /// Number of events.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// True before the opening event exists.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
