//! Resend email provider.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use quill_core::ports::{DeliveryReceipt, EmailMessage, MailError, Mailer};

pub const RESEND_API_URL: &str = "https://api.resend.com/emails";

/// Resend mailer configuration.
#[derive(Debug, Clone)]
pub struct ResendConfig {
    /// Without a key every send fails with `NotConfigured`.
    pub api_key: Option<String>,
    pub api_url: String,
    /// `Name <address>` shown as the sender.
    pub from: String,
    pub timeout: Duration,
}

impl Default for ResendConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_url: RESEND_API_URL.to_string(),
            from: "Quill <onboarding@resend.dev>".to_string(),
            timeout: Duration::from_secs(10),
        }
    }
}

#[derive(Debug, Serialize)]
struct SendRequest<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    html: &'a str,
}

#[derive(Debug, Deserialize)]
struct SendResponse {
    id: Option<String>,
}

/// Sends one message per request through the Resend HTTP API.
pub struct ResendMailer {
    client: Client,
    config: ResendConfig,
}

impl ResendMailer {
    pub fn new(config: ResendConfig) -> Result<Self, MailError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| MailError::NotConfigured(e.to_string()))?;

        if config.api_key.is_none() {
            tracing::warn!("RESEND_API_KEY not set; outgoing email will fail");
        }

        Ok(Self { client, config })
    }

    fn request<'a>(&'a self, message: &'a EmailMessage) -> SendRequest<'a> {
        SendRequest {
            from: &self.config.from,
            to: [&message.to],
            subject: &message.subject,
            html: &message.html,
        }
    }
}

#[async_trait]
impl Mailer for ResendMailer {
    async fn send(&self, message: &EmailMessage) -> Result<DeliveryReceipt, MailError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or_else(|| MailError::NotConfigured("RESEND_API_KEY is not set".to_string()))?;

        let response = self
            .client
            .post(&self.config.api_url)
            .bearer_auth(api_key)
            .json(&self.request(message))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    MailError::Timeout(self.config.timeout)
                } else {
                    MailError::Transport(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MailError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        // An unreadable body after a 2xx still means the provider accepted it.
        let receipt = response
            .json::<SendResponse>()
            .await
            .map(|r| DeliveryReceipt { id: r.id })
            .unwrap_or_default();

        tracing::debug!(id = ?receipt.id, "Email accepted by provider");
        Ok(receipt)
    }
}
