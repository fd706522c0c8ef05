//! Mail transport adapters.

use async_trait::async_trait;
use tracing::info;

use crate::domain::ports::{EmailMessage, Notifier, NotifierError};

/// Notifier that writes each message to the log instead of delivering it.
///
/// Used by operator tooling and local runs where no SMTP relay is wired.
/// Bodies are not logged; they may contain personal data.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

#[async_trait]
impl Notifier for TracingNotifier {
    async fn send(&self, message: &EmailMessage) -> Result<(), NotifierError> {
        info!(
            to = %message.to,
            subject = %message.subject,
            body_bytes = message.html_body.len(),
            "email handed to log transport"
        );
        Ok(())
    }
}
