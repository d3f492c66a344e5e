//! Newsletter subscriber lifecycle.
//!
//! ```text
//! absent ──subscribe──▶ active ──unsubscribe──▶ unsubscribed
//!                          ▲                        │
//!                          └──────reactivate────────┘
//! ```
//!
//! Subscribing never resurrects an unsubscribed row on its own.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;

use crate::domain::subscriber::{mask_email, normalize_email};
use crate::domain::{Subscriber, SubscriptionState};
use crate::email::EmailTemplates;
use crate::error::{DomainError, RepoError};
use crate::ports::{MailError, Mailer, SubscriberRepository};

use super::notify::DEFAULT_SEND_TIMEOUT;

#[derive(Clone)]
pub struct SubscriptionService {
    subscribers: Arc<dyn SubscriberRepository>,
    mailer: Arc<dyn Mailer>,
    templates: EmailTemplates,
    send_timeout: Duration,
}

impl SubscriptionService {
    pub fn new(
        subscribers: Arc<dyn SubscriberRepository>,
        mailer: Arc<dyn Mailer>,
        templates: EmailTemplates,
    ) -> Self {
        Self {
            subscribers,
            mailer,
            templates,
            send_timeout: DEFAULT_SEND_TIMEOUT,
        }
    }

    /// Upper bound on the welcome email before the subscribe call returns.
    pub fn with_send_timeout(mut self, timeout: Duration) -> Self {
        self.send_timeout = timeout;
        self
    }

    pub async fn state(&self, email: &str) -> Result<SubscriptionState, DomainError> {
        let email = normalize_email(email)?;
        let row = self.subscribers.find_by_email(&email).await?;
        Ok(SubscriptionState::of(row.as_ref()))
    }

    pub async fn is_active(&self, email: &str) -> Result<bool, DomainError> {
        Ok(self.state(email).await?.is_active())
    }

    /// Enrol a new email. Any existing row, active or not, is a duplicate.
    pub async fn subscribe(
        &self,
        email: &str,
        name: Option<String>,
    ) -> Result<Subscriber, DomainError> {
        let email = normalize_email(email)?;

        match self.subscribers.find_by_email(&email).await? {
            Some(existing) if existing.is_active => {
                return Err(DomainError::Duplicate(
                    "This email is already subscribed!".to_string(),
                ));
            }
            Some(_) => {
                return Err(DomainError::Duplicate(
                    "This email was unsubscribed earlier; reactivate it instead.".to_string(),
                ));
            }
            None => {}
        }

        let subscriber = self
            .subscribers
            .insert(Subscriber::new(email, name, Utc::now()))
            .await
            .map_err(|e| match e {
                RepoError::Constraint(_) => {
                    DomainError::Duplicate("This email is already subscribed!".to_string())
                }
                other => other.into(),
            })?;

        tracing::info!(email = %mask_email(&subscriber.email), "Subscriber added");
        self.send_welcome(&subscriber).await;
        Ok(subscriber)
    }

    /// Best effort: a failed welcome email never fails the subscription.
    async fn send_welcome(&self, subscriber: &Subscriber) {
        let message = match self
            .templates
            .welcome(&subscriber.email, subscriber.name.as_deref())
        {
            Ok(message) => message,
            Err(e) => {
                tracing::warn!(error = %e, "Welcome email not rendered");
                return;
            }
        };

        let delivery = tokio::time::timeout(self.send_timeout, self.mailer.send(&message));
        let sent = match delivery.await {
            Ok(sent) => sent.map(|_| ()),
            Err(_) => Err(MailError::Timeout(self.send_timeout)),
        };
        if let Err(e) = sent {
            tracing::warn!(
                email = %mask_email(&subscriber.email),
                error = %e,
                "Welcome email not delivered"
            );
        }
    }

    /// Deactivate an email. Unknown or already inactive emails are a no-op.
    pub async fn unsubscribe(&self, email: &str) -> Result<SubscriptionState, DomainError> {
        let email = normalize_email(email)?;

        let Some(mut subscriber) = self.subscribers.find_by_email(&email).await? else {
            tracing::debug!(email = %mask_email(&email), "Unsubscribe for unknown email");
            return Ok(SubscriptionState::Absent);
        };
        if !subscriber.is_active {
            return Ok(SubscriptionState::Unsubscribed);
        }

        subscriber.is_active = false;
        let subscriber = self.subscribers.update(subscriber).await?;
        tracing::info!(email = %mask_email(&email), "Subscriber unsubscribed");
        Ok(subscriber.state())
    }

    /// Explicitly bring an unsubscribed row back.
    pub async fn reactivate(&self, email: &str) -> Result<Subscriber, DomainError> {
        let email = normalize_email(email)?;

        let mut subscriber = self
            .subscribers
            .find_by_email(&email)
            .await?
            .ok_or_else(|| DomainError::not_found("Subscriber", mask_email(&email)))?;
        if subscriber.is_active {
            return Err(DomainError::Duplicate(
                "This email is already subscribed!".to_string(),
            ));
        }

        subscriber.is_active = true;
        let subscriber = self.subscribers.update(subscriber).await?;
        tracing::info!(email = %mask_email(&email), "Subscriber reactivated");
        Ok(subscriber)
    }

    /// Snapshot of everyone currently subscribed.
    pub async fn active_subscribers(&self) -> Result<Vec<Subscriber>, DomainError> {
        Ok(self.subscribers.list_active().await?)
    }

    pub async fn active_count(&self) -> Result<u64, DomainError> {
        Ok(self.subscribers.count_active().await?)
    }
}
