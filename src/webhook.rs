//! Webhook delivery transport.

use async_trait::async_trait;
use serde::Serialize;

use crate::error::DeliveryError;

/// Outbound webhook body.
///
/// `allowed_mentions.parse` opts the message into role/user/everyone pings;
/// without it Discord renders mention markup as plain text.
#[derive(Debug, Clone, Serialize)]
pub struct WebhookPayload {
    pub content: String,
    pub allowed_mentions: AllowedMentions,
}

#[derive(Debug, Clone, Serialize)]
pub struct AllowedMentions {
    pub parse: Vec<&'static str>,
}

impl WebhookPayload {
    pub fn new(content: String) -> Self {
        Self {
            content,
            allowed_mentions: AllowedMentions {
                parse: vec!["roles", "users", "everyone"],
            },
        }
    }
}

/// Record of one delivery attempt, for logging.
#[derive(Debug, Clone)]
pub struct DeliveryReceipt {
    pub status: u16,
    pub body: String,
}

/// Delivery transport collaborator: one POST, no internal retries.
#[async_trait]
pub trait DeliveryTransport: Send + Sync {
    async fn post(&self, url: &str, payload: &WebhookPayload)
        -> Result<DeliveryReceipt, DeliveryError>;
}

/// reqwest-backed Discord webhook transport.
#[derive(Debug, Clone, Default)]
pub struct DiscordWebhook {
    client: reqwest::Client,
}

impl DiscordWebhook {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DeliveryTransport for DiscordWebhook {
    async fn post(
        &self,
        url: &str,
        payload: &WebhookPayload,
    ) -> Result<DeliveryReceipt, DeliveryError> {
        let response = self
            .client
            .post(url)
            .json(payload)
            .send()
            .await
            .map_err(|e| DeliveryError::RequestFailed(e.to_string()))?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        if !status.is_success() {
            return Err(DeliveryError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        Ok(DeliveryReceipt {
            status: status.as_u16(),
            body,
        })
    }
}
