//! Fire-and-forget notification delivery.
//!
//! [`QueuedNotifier`] is the [`Notifier`](crate::domain::ports::Notifier)
//! handed to services; it only enqueues. A [`NotificationWorker`] drains the
//! queue on a background task and hands each message to a [`MailTransport`].

mod queue;
mod transport;

pub use queue::{NotificationWorker, QueuedNotifier};
pub use transport::{HttpMailRelay, LogMailTransport, MailTransport, MailTransportError};
