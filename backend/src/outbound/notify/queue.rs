//! Bounded in-process notification queue.

use std::sync::Arc;

use tokio::sync::mpsc::{self, Receiver, Sender, error::TrySendError};
use tracing::{debug, warn};

use crate::domain::ports::{Notification, Notifier};

use super::transport::MailTransport;

/// [`Notifier`] that enqueues without waiting. A full or closed queue drops
/// the message with a warning; callers never observe delivery failures.
#[derive(Debug, Clone)]
pub struct QueuedNotifier {
    sender: Sender<Notification>,
}

/// Consumer half of the queue; run it on a background task.
#[derive(Debug)]
pub struct NotificationWorker {
    receiver: Receiver<Notification>,
}

impl QueuedNotifier {
    /// Create a queue holding at most `capacity` pending messages.
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// use std::sync::Arc;
    /// use shiptrack::outbound::notify::{LogMailTransport, QueuedNotifier};
    ///
    /// # async fn demo() {
    /// let (notifier, worker) = QueuedNotifier::new(256);
    /// tokio::spawn(worker.run(Arc::new(LogMailTransport)));
    /// # let _ = notifier;
    /// # }
    /// ```
    pub fn new(capacity: usize) -> (Self, NotificationWorker) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        (Self { sender }, NotificationWorker { receiver })
    }
}

impl Notifier for QueuedNotifier {
    fn dispatch(&self, notification: Notification) {
        match self.sender.try_send(notification) {
            Ok(()) => {}
            Err(TrySendError::Full(dropped)) => warn!(
                template = dropped.template.as_str(),
                "notification queue full; dropping message"
            ),
            Err(TrySendError::Closed(dropped)) => warn!(
                template = dropped.template.as_str(),
                "notification worker stopped; dropping message"
            ),
        }
    }
}

impl NotificationWorker {
    /// Deliver queued messages until every [`QueuedNotifier`] is dropped.
    pub async fn run(mut self, transport: Arc<dyn MailTransport>) {
        while let Some(notification) = self.receiver.recv().await {
            match transport.send(&notification).await {
                Ok(()) => debug!(
                    template = notification.template.as_str(),
                    "notification delivered"
                ),
                Err(error) => warn!(
                    %error,
                    template = notification.template.as_str(),
                    "notification delivery failed"
                ),
            }
        }
        debug!("notification queue closed");
    }
}
