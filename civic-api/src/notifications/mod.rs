//! Outbound Notifications
//!
//! Committed complaint events are composed into e-mail messages and handed
//! to a [`Notifier`] by the background [`NotificationDispatcher`]. Delivery
//! never blocks or fails the request that produced the event.

mod compose;
mod dispatcher;
mod webhook;

pub use compose::{compose, status_message, OutboundMessage};
pub use dispatcher::NotificationDispatcher;
pub use webhook::WebhookNotifier;

use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use thiserror::Error;

use crate::config::NotifierConfig;

/// Delivery failure reported by a [`Notifier`].
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("relay rejected message with status {0}")]
    Rejected(u16),
}

/// A delivery adapter for composed messages.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Short adapter name used in logs.
    fn name(&self) -> &'static str;

    async fn deliver(&self, message: &OutboundMessage) -> Result<(), NotifyError>;
}

/// Writes messages to the log instead of sending them.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    fn name(&self) -> &'static str {
        "log"
    }

    async fn deliver(&self, message: &OutboundMessage) -> Result<(), NotifyError> {
        tracing::info!(
            kind = %message.kind,
            reference_number = %message.reference_number,
            to = %message.to,
            subject = %message.subject,
            "Notification (log delivery)"
        );
        Ok(())
    }
}

/// Keeps every delivered message in memory. Used by tests and local runs.
#[derive(Debug, Default, Clone)]
pub struct MemoryNotifier {
    sent: Arc<Mutex<Vec<OutboundMessage>>>,
}

impl MemoryNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the delivered messages in delivery order.
    pub fn sent(&self) -> Vec<OutboundMessage> {
        match self.sent.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

#[async_trait]
impl Notifier for MemoryNotifier {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn deliver(&self, message: &OutboundMessage) -> Result<(), NotifyError> {
        let mut guard = match self.sent.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        guard.push(message.clone());
        Ok(())
    }
}

/// Pick the adapter for a configuration: webhook relay when a URL is set, log otherwise.
pub fn notifier_from_config(config: &NotifierConfig) -> Result<Arc<dyn Notifier>, NotifyError> {
    match config.webhook_url.as_deref() {
        Some(url) => Ok(Arc::new(WebhookNotifier::new(url, config.timeout)?)),
        None => Ok(Arc::new(LogNotifier)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message() -> OutboundMessage {
        OutboundMessage {
            kind: "submitted".to_string(),
            reference_number: "CMP20240101000000".to_string(),
            from: "noreply@complaints.local".to_string(),
            to: "admin@complaints.local".to_string(),
            subject: "New Complaint Submitted: CMP20240101000000".to_string(),
            body: String::new(),
        }
    }

    #[tokio::test]
    async fn test_memory_notifier_records() {
        let notifier = MemoryNotifier::new();
        notifier.deliver(&message()).await.unwrap();
        notifier.deliver(&message()).await.unwrap();
        assert_eq!(notifier.sent().len(), 2);
    }

    #[tokio::test]
    async fn test_log_notifier_never_fails() {
        assert!(LogNotifier.deliver(&message()).await.is_ok());
    }

    #[test]
    fn test_notifier_from_config() {
        let config = NotifierConfig::default();
        assert_eq!(notifier_from_config(&config).unwrap().name(), "log");

        let config = NotifierConfig {
            webhook_url: Some("http://127.0.0.1:9/mail".to_string()),
            ..NotifierConfig::default()
        };
        assert_eq!(notifier_from_config(&config).unwrap().name(), "webhook");
    }
}
