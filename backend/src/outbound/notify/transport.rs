//! Mail transports used by the notification worker.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Serialize;
use serde_json::Value;
use tracing::info;

use crate::domain::EmailAddress;
use crate::domain::ports::Notification;

/// Errors raised while handing a message to the mail system.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MailTransportError {
    /// The relay could not be reached.
    #[error("mail relay unreachable: {message}")]
    Transport {
        /// Underlying error message.
        message: String,
    },
    /// The relay answered with a non-success status.
    #[error("mail relay rejected message with status {status}")]
    Rejected {
        /// HTTP status returned by the relay.
        status: u16,
    },
}

/// Delivers one rendered-elsewhere notification.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MailTransport: Send + Sync {
    /// Deliver `notification` once.
    async fn send(&self, notification: &Notification) -> Result<(), MailTransportError>;
}

/// Transport that records messages in the log instead of sending them.
#[derive(Debug, Clone, Default)]
pub struct LogMailTransport;

#[async_trait]
impl MailTransport for LogMailTransport {
    async fn send(&self, notification: &Notification) -> Result<(), MailTransportError> {
        info!(
            recipients = notification.recipients.len(),
            subject = %notification.subject,
            template = notification.template.as_str(),
            "notification logged (no mail relay configured)"
        );
        Ok(())
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RelayMessage<'a> {
    from: &'a str,
    to: Vec<&'a str>,
    subject: &'a str,
    template: &'static str,
    context: &'a Value,
}

impl<'a> RelayMessage<'a> {
    fn new(sender: &'a str, notification: &'a Notification) -> Self {
        Self {
            from: sender,
            to: notification
                .recipients
                .iter()
                .map(EmailAddress::as_str)
                .collect(),
            subject: &notification.subject,
            template: notification.template.as_str(),
            context: &notification.context,
        }
    }
}

/// Transport that POSTs each message as JSON to an HTTP mail relay, which
/// owns template rendering and SMTP.
pub struct HttpMailRelay {
    client: Client,
    endpoint: Url,
    sender: String,
}

impl HttpMailRelay {
    /// Build a relay client with an explicit request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(
        endpoint: Url,
        sender: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint,
            sender: sender.into(),
        })
    }
}

#[async_trait]
impl MailTransport for HttpMailRelay {
    async fn send(&self, notification: &Notification) -> Result<(), MailTransportError> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .json(&RelayMessage::new(&self.sender, notification))
            .send()
            .await
            .map_err(|error| MailTransportError::Transport {
                message: error.to_string(),
            })?;
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(MailTransportError::Rejected {
                status: status.as_u16(),
            })
        }
    }
}
