//! Bounded hand-off between request handlers and notification delivery.

use std::sync::Arc;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;

use civic_core::ComplaintEvent;

use super::{compose, Notifier};
use crate::config::NotifierConfig;
use crate::telemetry::METRICS;

fn record(kind: &str, status: &str) {
    if let Ok(metrics) = METRICS.as_ref() {
        metrics.record_notification(kind, status);
    }
}

/// Queues events for a background delivery task.
///
/// Dispatch never waits: when the queue is full the event is dropped with a
/// warning. Delivery failures are logged and counted, never returned.
#[derive(Clone)]
pub struct NotificationDispatcher {
    tx: mpsc::Sender<ComplaintEvent>,
}

impl NotificationDispatcher {
    /// Start the delivery task on the current runtime.
    pub fn spawn(notifier: Arc<dyn Notifier>, config: NotifierConfig) -> (Self, JoinHandle<()>) {
        let (tx, mut rx) = mpsc::channel::<ComplaintEvent>(config.queue_capacity.max(1));

        let handle = tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                let message = compose(&event, &config);
                match notifier.deliver(&message).await {
                    Ok(()) => {
                        tracing::debug!(
                            kind = %message.kind,
                            reference_number = %message.reference_number,
                            notifier = notifier.name(),
                            "Notification delivered"
                        );
                        record(&message.kind, "success");
                    }
                    Err(e) => {
                        tracing::warn!(
                            kind = %message.kind,
                            reference_number = %message.reference_number,
                            notifier = notifier.name(),
                            error = %e,
                            "Notification delivery failed"
                        );
                        record(&message.kind, "failure");
                    }
                }
            }
            tracing::debug!("Notification dispatcher stopped");
        });

        (Self { tx }, handle)
    }

    /// Enqueue an event without waiting.
    pub fn dispatch(&self, event: ComplaintEvent) {
        let kind = event.kind();
        match self.tx.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(event)) => {
                tracing::warn!(
                    kind,
                    reference_number = %event.complaint().reference_number,
                    "Notification queue full, dropping event"
                );
                record(kind, "dropped");
            }
            Err(TrySendError::Closed(_)) => {
                tracing::warn!(kind, "Notification dispatcher closed, dropping event");
                record(kind, "dropped");
            }
        }
    }

    pub fn dispatch_all(&self, events: impl IntoIterator<Item = ComplaintEvent>) {
        for event in events {
            self.dispatch(event);
        }
    }
}
