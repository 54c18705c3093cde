use serde::Serialize;
use std::time::Duration;
use tracing::debug;
use tracing::warn;

#[derive(Serialize)]
struct WebhookMessage<'a> {
    text: &'a str,
}

/// Posts operational alerts to a Slack-compatible incoming webhook.
///
/// Delivery is best effort; failures are logged and never surfaced.
#[derive(Debug, Clone)]
pub struct WebhookAlerter {
    client: reqwest::Client,
    url: Option<String>,
}

impl WebhookAlerter {
    pub fn new(url: Option<String>) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(5))
            .build()?;
        let url = url.filter(|url| !url.trim().is_empty());
        Ok(Self { client, url })
    }

    pub fn is_enabled(&self) -> bool {
        self.url.is_some()
    }

    pub async fn send(&self, text: &str) {
        let Some(url) = self.url.as_deref() else {
            debug!("No alert webhook configured; dropping alert: {text}");
            return;
        };
        let result = self
            .client
            .post(url)
            .json(&WebhookMessage { text })
            .send()
            .await
            .and_then(reqwest::Response::error_for_status);
        if let Err(err) = result {
            warn!("Failed to deliver alert: {err}");
        }
    }
}
