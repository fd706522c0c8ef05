//! Driven port for transactional email.

use async_trait::async_trait;

use super::define_port_error;

/// A rendered email ready for delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    /// Recipient address.
    pub to: String,
    /// Subject line.
    pub subject: String,
    /// HTML body.
    pub html_body: String,
}

define_port_error! {
    /// Errors surfaced by mail transports.
    pub enum NotifierError {
        /// The transport did not accept the message.
        Delivery { message: String } =>
            "email delivery failed: {message}",
    }
}

/// Port for sending transactional email.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Hand `message` to the mail transport.
    async fn send(&self, message: &EmailMessage) -> Result<(), NotifierError>;
}

/// Fixture notifier that drops every message.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureNotifier;

#[async_trait]
impl Notifier for FixtureNotifier {
    async fn send(&self, _message: &EmailMessage) -> Result<(), NotifierError> {
        Ok(())
    }
}
