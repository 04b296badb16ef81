//! HTTP relay delivery: each message is POSTed as JSON to a mail relay.

use async_trait::async_trait;
use std::time::Duration;

use super::{Notifier, NotifyError, OutboundMessage};

pub struct WebhookNotifier {
    client: reqwest::Client,
    url: String,
}

impl WebhookNotifier {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, NotifyError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| NotifyError::Transport(e.to_string()))?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    fn name(&self) -> &'static str {
        "webhook"
    }

    async fn deliver(&self, message: &OutboundMessage) -> Result<(), NotifyError> {
        let response = self
            .client
            .post(&self.url)
            .header("X-Civic-Event", message.kind.as_str())
            .json(message)
            .send()
            .await
            .map_err(|e| NotifyError::Transport(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(NotifyError::Rejected(status.as_u16()))
        }
    }
}
