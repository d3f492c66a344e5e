use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;

pub const DEFAULT_SOURCE: &str = "blog";

/// A newsletter subscriber row. Rows are kept after unsubscribing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subscriber {
    pub id: Uuid,
    pub email: String,
    pub name: Option<String>,
    pub source: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl Subscriber {
    pub fn new(email: String, name: Option<String>, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            email,
            name: name
                .map(|n| n.trim().to_string())
                .filter(|n| !n.is_empty()),
            source: DEFAULT_SOURCE.to_string(),
            is_active: true,
            created_at: now,
        }
    }

    pub fn state(&self) -> SubscriptionState {
        if self.is_active {
            SubscriptionState::Active
        } else {
            SubscriptionState::Unsubscribed
        }
    }
}

/// Lifecycle of an email address on the list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionState {
    /// No row for this email.
    Absent,
    Active,
    /// Row retained with the active flag cleared.
    Unsubscribed,
}

impl SubscriptionState {
    pub fn of(subscriber: Option<&Subscriber>) -> Self {
        subscriber.map_or(Self::Absent, Subscriber::state)
    }

    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Absent => "absent",
            Self::Active => "active",
            Self::Unsubscribed => "unsubscribed",
        }
    }
}

/// Trim and lowercase an email, checking it has a `local@domain.tld` shape.
pub fn normalize_email(raw: &str) -> Result<String, DomainError> {
    let email = raw.trim().to_lowercase();
    if email.is_empty() {
        return Err(DomainError::validation("Email address is required"));
    }

    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain
                    .split_once('.')
                    .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty())
                && !domain.ends_with('.')
                && !email.chars().any(char::is_whitespace)
        }
        None => false,
    };

    if valid {
        Ok(email)
    } else {
        Err(DomainError::validation(format!(
            "Invalid email address: {email}"
        )))
    }
}

/// Mask an email for logs: `a***@example.com`.
pub fn mask_email(email: &str) -> String {
    match email.split_once('@') {
        Some((local, domain)) => match local.chars().next() {
            Some(first) if local.chars().count() > 1 => format!("{first}***@{domain}"),
            _ => format!("***@{domain}"),
        },
        None => "***".to_string(),
    }
}
