use reqwest::{Client, StatusCode};
use serde::Serialize;
use std::fmt;
use tracing::{error, info};

/// Configuration for the operations-channel webhook
#[derive(Clone, Default)]
pub struct NotifierConfig {
    pub webhook_url: Option<String>,
}

impl NotifierConfig {
    pub fn new(webhook_url: Option<String>) -> Self {
        Self {
            webhook_url: webhook_url.filter(|url| !url.trim().is_empty()),
        }
    }
}

// The webhook URL embeds its own secret
impl fmt::Debug for NotifierConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotifierConfig")
            .field("webhook_configured", &self.webhook_url.is_some())
            .finish()
    }
}

#[derive(Debug, Serialize)]
struct WebhookMessage<'a> {
    text: &'a str,
}

/// What happened to a notification; never an error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyOutcome {
    Sent,
    Skipped,
    Failed,
}

/// Best-effort poster of run outcomes
#[derive(Debug, Clone)]
pub struct Notifier {
    http: Client,
    config: NotifierConfig,
}

impl Notifier {
    pub fn new(http: Client, config: NotifierConfig) -> Self {
        Self { http, config }
    }

    /// Post `{"text": message}` to the webhook
    ///
    /// Failures are logged and swallowed so they never mask the outcome of
    /// the run being reported.
    pub async fn notify(&self, message: &str) -> NotifyOutcome {
        let Some(url) = self.config.webhook_url.as_deref() else {
            error!("SLACK_WEBHOOK_URL is not set; notification not sent");
            return NotifyOutcome::Skipped;
        };

        let result = self
            .http
            .post(url)
            .json(&WebhookMessage { text: message })
            .send()
            .await;

        match result {
            Ok(response) if response.status() == StatusCode::OK => {
                info!("Notification sent");
                NotifyOutcome::Sent
            }
            Ok(response) => {
                let status = response.status();
                let body = response.text().await.unwrap_or_default();
                error!("Webhook returned status {}: {}", status, body);
                NotifyOutcome::Failed
            }
            Err(e) => {
                error!("Failed to send notification: {}", e);
                NotifyOutcome::Failed
            }
        }
    }
}
