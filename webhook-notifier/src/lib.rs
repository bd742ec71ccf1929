//! Outbound relay of a post permalink to a notification target.

use async_trait::async_trait;
use postrelay_core::{CoreError, DeliveryError, NotifyTarget};
use reqwest::{Client, StatusCode};
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, info, warn};

#[async_trait]
pub trait Notifier: Send + Sync {
    fn name(&self) -> &'static str;

    /// `Ok(())` only once the target has confirmed receipt.
    async fn deliver(&self, target: &NotifyTarget, permalink: &str) -> Result<(), CoreError>;
}

#[derive(Debug, Serialize)]
struct WebhookPayload<'a> {
    content: &'a str,
}

/// Discord-style webhook: `POST {"content": "<permalink>"}`.
#[derive(Debug, Clone)]
pub struct DiscordWebhook {
    client: Client,
}

impl DiscordWebhook {
    pub fn new(timeout: Duration) -> Result<Self, CoreError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

/// Map a webhook response status onto the delivery outcome.
pub fn classify_status(status: StatusCode, retry_after: Option<u64>) -> Result<(), DeliveryError> {
    if status.is_success() {
        Ok(())
    } else if status == StatusCode::TOO_MANY_REQUESTS {
        Err(DeliveryError::RateLimited {
            retry_after: retry_after.unwrap_or(1),
        })
    } else {
        Err(DeliveryError::Rejected {
            status: status.as_u16(),
        })
    }
}

#[async_trait]
impl Notifier for DiscordWebhook {
    fn name(&self) -> &'static str {
        "discord"
    }

    async fn deliver(&self, target: &NotifyTarget, permalink: &str) -> Result<(), CoreError> {
        debug!(webhook = ?target, "Posting to webhook");
        let response = self
            .client
            .post(target.as_str())
            .json(&WebhookPayload { content: permalink })
            .send()
            .await
            .map_err(|e| DeliveryError::Transport {
                reason: e.to_string(),
            })?;

        let status = response.status();
        let retry_after = response
            .headers()
            .get("retry-after")
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.trim().parse::<f64>().ok())
            .map(|seconds| seconds.ceil() as u64);

        match classify_status(status, retry_after) {
            Ok(()) => {
                info!(status = status.as_u16(), permalink, "Relayed post");
                Ok(())
            }
            Err(e) => {
                warn!(status = status.as_u16(), permalink, "Webhook did not accept the post");
                Err(e.into())
            }
        }
    }
}
