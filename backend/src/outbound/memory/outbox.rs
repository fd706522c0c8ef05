//! Notifier that keeps sent mail in memory for inspection.

use std::sync::Mutex;

use async_trait::async_trait;

use crate::domain::ports::{EmailMessage, Notifier, NotifierError};

/// Notifier that records every message and never fails.
#[derive(Debug, Default)]
pub struct InMemoryOutbox {
    sent: Mutex<Vec<EmailMessage>>,
}

impl InMemoryOutbox {
    /// Create an empty outbox.
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages accepted so far, oldest first.
    pub fn sent(&self) -> Vec<EmailMessage> {
        self.sent
            .lock()
            .map(|sent| sent.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl Notifier for InMemoryOutbox {
    async fn send(&self, message: &EmailMessage) -> Result<(), NotifierError> {
        self.sent
            .lock()
            .map_err(|_| NotifierError::delivery("outbox lock poisoned"))?
            .push(message.clone());
        Ok(())
    }
}
