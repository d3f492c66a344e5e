//! Outbound email port.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A rendered message for a single recipient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub html: String,
}

/// Provider acknowledgement of an accepted message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryReceipt {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

/// Mailer trait - one call, one provider request, one recipient.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, message: &EmailMessage) -> Result<DeliveryReceipt, MailError>;
}

/// Delivery failures reported by a mailer.
#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("Mailer is not configured: {0}")]
    NotConfigured(String),

    #[error("Provider rejected message ({status}): {body}")]
    Rejected { status: u16, body: String },

    #[error("Provider unreachable: {0}")]
    Transport(String),

    #[error("Send timed out after {0:?}")]
    Timeout(std::time::Duration),
}
