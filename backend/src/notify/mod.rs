//! Notification channel for run reports.
//!
//! Delivery is best effort: a failed send is reported through
//! [`NotifyOutcome`] and never turns into an error. There is no retry.

use serde::Serialize;
use std::future::Future;
use std::time::Duration;

/// Request timeout for webhook calls.
const WEBHOOK_TIMEOUT: Duration = Duration::from_secs(10);

/// Result of one send attempt.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NotifyOutcome {
    /// Whether the channel accepted the message
    pub delivered: bool,
    /// HTTP status, when a response was received
    pub status_code: Option<u16>,
    /// Response body, transport error, or reason for not sending
    pub detail: String,
}

impl NotifyOutcome {
    pub fn skipped(reason: impl Into<String>) -> Self {
        Self {
            delivered: false,
            status_code: None,
            detail: reason.into(),
        }
    }
}

/// A channel that can deliver a text report.
pub trait Notifier {
    fn send(&self, text: &str) -> impl Future<Output = NotifyOutcome> + Send;
}

/// Slack-compatible incoming webhook (`POST {"text": ...}`).
#[derive(Clone)]
pub struct WebhookNotifier {
    url: String,
    client: reqwest::Client,
}

impl WebhookNotifier {
    pub fn new(url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(WEBHOOK_TIMEOUT)
            .build()
            .unwrap_or_default();

        Self {
            url: url.into(),
            client,
        }
    }
}

impl Notifier for WebhookNotifier {
    async fn send(&self, text: &str) -> NotifyOutcome {
        let payload = serde_json::json!({ "text": text });

        let response = match self.client.post(&self.url).json(&payload).send().await {
            Ok(response) => response,
            Err(e) => {
                return NotifyOutcome {
                    delivered: false,
                    status_code: e.status().map(|s| s.as_u16()),
                    detail: e.to_string(),
                }
            }
        };

        let status = response.status();
        let detail = response.text().await.unwrap_or_default();

        NotifyOutcome {
            delivered: status.is_success(),
            status_code: Some(status.as_u16()),
            detail,
        }
    }
}

/// Stand-in used when no channel is configured or notifications are off.
#[derive(Debug, Clone, Default)]
pub struct DisabledNotifier;

impl Notifier for DisabledNotifier {
    async fn send(&self, _text: &str) -> NotifyOutcome {
        NotifyOutcome::skipped("notifications disabled")
    }
}

/// The channel selected by configuration.
#[derive(Clone)]
pub enum ChannelNotifier {
    Webhook(WebhookNotifier),
    Disabled(DisabledNotifier),
}

impl ChannelNotifier {
    /// Pick the webhook when a URL is configured and notifications are enabled.
    pub fn from_config(webhook_url: Option<&str>, enabled: bool) -> Self {
        match webhook_url.filter(|u| enabled && !u.trim().is_empty()) {
            Some(url) => ChannelNotifier::Webhook(WebhookNotifier::new(url)),
            None => ChannelNotifier::Disabled(DisabledNotifier),
        }
    }

    pub fn is_enabled(&self) -> bool {
        matches!(self, ChannelNotifier::Webhook(_))
    }
}

impl Notifier for ChannelNotifier {
    async fn send(&self, text: &str) -> NotifyOutcome {
        match self {
            ChannelNotifier::Webhook(n) => n.send(text).await,
            ChannelNotifier::Disabled(n) => n.send(text).await,
        }
    }
}
