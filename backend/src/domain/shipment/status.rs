//! Shipment status lifecycle.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Where a shipment currently is in its lifecycle.
///
/// `Placed` is the only initial state. `Delivered` and `Cancelled` are
/// terminal: no status-changing operation is accepted once either is
/// reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShipmentStatus {
    /// Assigned, waiting for pickup.
    Placed,
    /// Picked up.
    InTransit,
    /// On the final leg.
    OutForDelivery,
    /// Handed over against the delivery code.
    Delivered,
    /// Withdrawn by the seller.
    Cancelled,
}

impl ShipmentStatus {
    /// Wire and storage name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Placed => "placed",
            Self::InTransit => "in_transit",
            Self::OutForDelivery => "out_for_delivery",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
        }
    }

    /// `Delivered` or `Cancelled`.
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Delivered | Self::Cancelled)
    }

    /// Position on the forward delivery path; `None` for `Cancelled`.
    const fn progress(self) -> Option<u8> {
        match self {
            Self::Placed => Some(0),
            Self::InTransit => Some(1),
            Self::OutForDelivery => Some(2),
            Self::Delivered => Some(3),
            Self::Cancelled => None,
        }
    }

    /// Check that a partner update may move the shipment to `next`.
    ///
    /// Re-asserting the current status is allowed so partners can post
    /// location updates; skipping forward is allowed; moving backwards,
    /// re-entering `placed` or cancelling through an update is not.
    ///
    /// # Examples
    /// ```
    /// use shiptrack::domain::{ShipmentStatus, TransitionError};
    ///
    /// assert!(ShipmentStatus::Placed.check_update_target(ShipmentStatus::Delivered).is_ok());
    /// assert_eq!(
    ///     ShipmentStatus::Delivered.check_update_target(ShipmentStatus::InTransit),
    ///     Err(TransitionError::FromTerminal { from: ShipmentStatus::Delivered }),
    /// );
    /// ```
    pub fn check_update_target(self, next: Self) -> Result<(), TransitionError> {
        self.check_mutable()?;
        if next == Self::Cancelled {
            return Err(TransitionError::CancelViaUpdate);
        }
        if next == Self::Placed && self != Self::Placed {
            return Err(TransitionError::ReenterPlaced);
        }
        match (self.progress(), next.progress()) {
            (Some(from), Some(to)) if to < from => Err(TransitionError::Backwards {
                from: self,
                to: next,
            }),
            _ => Ok(()),
        }
    }

    /// Fail when the shipment has reached a terminal state.
    pub fn check_mutable(self) -> Result<(), TransitionError> {
        if self.is_terminal() {
            return Err(TransitionError::FromTerminal { from: self });
        }
        Ok(())
    }
}

impl fmt::Display for ShipmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing a status from text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown shipment status: {0}")]
pub struct ParseShipmentStatusError(pub String);

impl FromStr for ShipmentStatus {
    type Err = ParseShipmentStatusError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "placed" => Ok(Self::Placed),
            "in_transit" => Ok(Self::InTransit),
            "out_for_delivery" => Ok(Self::OutForDelivery),
            "delivered" => Ok(Self::Delivered),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(ParseShipmentStatusError(other.to_owned())),
        }
    }
}

/// Rejected status transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TransitionError {
    /// The shipment is already delivered or cancelled.
    #[error("shipment is already {from}")]
    FromTerminal {
        /// Current status.
        from: ShipmentStatus,
    },
    /// The target is behind the current status.
    #[error("status cannot move from {from} back to {to}")]
    Backwards {
        /// Current status.
        from: ShipmentStatus,
        /// Requested status.
        to: ShipmentStatus,
    },
    /// `Placed` is only ever the initial status.
    #[error("status cannot return to placed")]
    ReenterPlaced,
    /// Cancellation has its own operation.
    #[error("use the cancel operation to cancel a shipment")]
    CancelViaUpdate,
}

impl TransitionError {
    /// Terminal-state rejections are conflicts with current state; the rest
    /// are invalid requests.
    pub const fn is_conflict(self) -> bool {
        matches!(self, Self::FromTerminal { .. })
    }
}
