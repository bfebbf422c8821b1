//! Port for fire-and-forget email notifications.

use serde_json::Value;

use crate::domain::EmailAddress;

/// Message templates the mail transport knows how to render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotificationTemplate {
    /// Signup verification link.
    VerifyEmail,
    /// Password reset link.
    PasswordReset,
    /// Receipt to the seller, with the delivery code.
    ShipmentPlaced,
    /// New work for the partner.
    ShipmentAssigned,
    /// Progress update to the seller.
    ShipmentStatusChanged,
    /// Cancellation notice to the partner.
    ShipmentCancelled,
}

impl NotificationTemplate {
    /// Template name understood by the mail relay.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::VerifyEmail => "verify_email",
            Self::PasswordReset => "password_reset",
            Self::ShipmentPlaced => "shipment_placed",
            Self::ShipmentAssigned => "shipment_assigned",
            Self::ShipmentStatusChanged => "shipment_status_changed",
            Self::ShipmentCancelled => "shipment_cancelled",
        }
    }
}

/// One outgoing message.
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    /// Destination addresses.
    pub recipients: Vec<EmailAddress>,
    /// Subject line.
    pub subject: String,
    /// Template to render.
    pub template: NotificationTemplate,
    /// Template variables.
    pub context: Value,
}

/// Hands notifications to a background sender.
///
/// `dispatch` must not block and must not fail the caller; adapters log and
/// drop what they cannot deliver.
#[cfg_attr(test, mockall::automock)]
pub trait Notifier: Send + Sync {
    /// Queue `notification` for delivery.
    fn dispatch(&self, notification: Notification);
}
