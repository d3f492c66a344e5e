//! New-post notification fan-out.
//!
//! One personalised email per recipient, all sends in flight at once. A
//! failing or slow recipient never stops the others; every outcome lands in
//! the [`DispatchReport`]. Nothing is retried or persisted.

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use serde::{Deserialize, Serialize};

use crate::domain::Post;
use crate::domain::subscriber::mask_email;
use crate::email::{EmailTemplates, PostSummary, Recipient};
use crate::error::DomainError;
use crate::ports::{MailError, Mailer, SubscriberRepository};

pub const DEFAULT_SEND_TIMEOUT: Duration = Duration::from_secs(10);

/// A post and the recipients to tell about it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationJob {
    pub post: PostSummary,
    pub recipients: Vec<Recipient>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryOutcome {
    pub email: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Aggregate result of one fan-out.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchReport {
    pub successful: usize,
    pub failed: usize,
    pub total: usize,
    pub details: Vec<DeliveryOutcome>,
}

impl DispatchReport {
    fn from_outcomes(details: Vec<DeliveryOutcome>) -> Self {
        let successful = details.iter().filter(|d| d.success).count();
        Self {
            successful,
            failed: details.len() - successful,
            total: details.len(),
            details,
        }
    }
}

#[derive(Clone)]
pub struct NotificationDispatcher {
    mailer: Arc<dyn Mailer>,
    subscribers: Arc<dyn SubscriberRepository>,
    templates: EmailTemplates,
    send_timeout: Duration,
}

impl NotificationDispatcher {
    pub fn new(
        mailer: Arc<dyn Mailer>,
        subscribers: Arc<dyn SubscriberRepository>,
        templates: EmailTemplates,
    ) -> Self {
        Self {
            mailer,
            subscribers,
            templates,
            send_timeout: DEFAULT_SEND_TIMEOUT,
        }
    }

    pub fn with_send_timeout(mut self, timeout: Duration) -> Self {
        self.send_timeout = timeout;
        self
    }

    async fn deliver(&self, post: &PostSummary, recipient: &Recipient) -> DeliveryOutcome {
        let result = match self.templates.blog_notification(post, recipient) {
            Ok(message) => {
                match tokio::time::timeout(self.send_timeout, self.mailer.send(&message)).await {
                    Ok(sent) => sent.map(|_| ()),
                    Err(_) => Err(MailError::Timeout(self.send_timeout)),
                }
                .map_err(|e| e.to_string())
            }
            Err(e) => Err(e.to_string()),
        };

        match result {
            Ok(()) => DeliveryOutcome {
                email: recipient.email.clone(),
                success: true,
                error: None,
            },
            Err(error) => {
                tracing::warn!(
                    email = %mask_email(&recipient.email),
                    error = %error,
                    "Notification not delivered"
                );
                DeliveryOutcome {
                    email: recipient.email.clone(),
                    success: false,
                    error: Some(error),
                }
            }
        }
    }

    /// Send the job to every recipient concurrently and collect the results.
    pub async fn dispatch(&self, job: NotificationJob) -> DispatchReport {
        let sends = job
            .recipients
            .iter()
            .map(|recipient| self.deliver(&job.post, recipient));
        let report = DispatchReport::from_outcomes(join_all(sends).await);

        tracing::info!(
            slug = %job.post.slug,
            successful = report.successful,
            failed = report.failed,
            total = report.total,
            "Notification dispatch finished"
        );
        report
    }

    /// Notify every active subscriber about a published post.
    pub async fn notify_subscribers(&self, post: &Post) -> Result<DispatchReport, DomainError> {
        if !post.is_published {
            return Err(DomainError::validation(
                "Only published posts can be sent to subscribers",
            ));
        }

        let subscribers = self.subscribers.list_active().await.map_err(|e| {
            tracing::error!(error = %e, "Failed to load subscribers for notification");
            DomainError::Backend(format!("Failed to load subscribers: {e}"))
        })?;

        let job = NotificationJob {
            post: PostSummary::from(post),
            recipients: subscribers.iter().map(Recipient::from).collect(),
        };
        Ok(self.dispatch(job).await)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use chrono::Utc;
    use uuid::Uuid;

    use super::*;
    use crate::domain::{PostInput, Subscriber};
    use crate::email::SiteInfo;
    use crate::error::RepoError;
    use crate::ports::{BaseRepository, DeliveryReceipt, EmailMessage};

    /// Records every attempt and fails for the configured addresses.
    #[derive(Default)]
    struct FakeMailer {
        failing: Vec<String>,
        stall: Option<String>,
        attempts: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Mailer for FakeMailer {
        async fn send(&self, message: &EmailMessage) -> Result<DeliveryReceipt, MailError> {
            self.attempts.lock().unwrap().push(message.to.clone());
            if self.stall.as_deref() == Some(message.to.as_str()) {
                tokio::time::sleep(Duration::from_secs(60)).await;
            }
            if self.failing.contains(&message.to) {
                return Err(MailError::Rejected {
                    status: 422,
                    body: "invalid recipient".into(),
                });
            }
            Ok(DeliveryReceipt {
                id: Some(format!("msg-{}", message.to)),
            })
        }
    }

    struct FixedSubscribers(Result<Vec<Subscriber>, ()>);

    #[async_trait]
    impl BaseRepository<Subscriber, Uuid> for FixedSubscribers {
        async fn find_by_id(&self, _id: Uuid) -> Result<Option<Subscriber>, RepoError> {
            Ok(None)
        }
        async fn insert(&self, entity: Subscriber) -> Result<Subscriber, RepoError> {
            Ok(entity)
        }
        async fn update(&self, entity: Subscriber) -> Result<Subscriber, RepoError> {
            Ok(entity)
        }
        async fn delete(&self, _id: Uuid) -> Result<(), RepoError> {
            Ok(())
        }
    }

    #[async_trait]
    impl SubscriberRepository for FixedSubscribers {
        async fn find_by_email(&self, _email: &str) -> Result<Option<Subscriber>, RepoError> {
            Ok(None)
        }
        async fn list_active(&self) -> Result<Vec<Subscriber>, RepoError> {
            self.0
                .clone()
                .map_err(|_| RepoError::Connection("connection refused".into()))
        }
        async fn count_active(&self) -> Result<u64, RepoError> {
            Ok(0)
        }
    }

    fn dispatcher(mailer: Arc<FakeMailer>, subscribers: FixedSubscribers) -> NotificationDispatcher {
        let templates = EmailTemplates::new(SiteInfo {
            url: "https://blog.example.com".into(),
            ..SiteInfo::default()
        });
        NotificationDispatcher::new(mailer, Arc::new(subscribers), templates)
    }

    fn job(emails: &[&str]) -> NotificationJob {
        NotificationJob {
            post: PostSummary {
                title: "Async fan-out".into(),
                slug: "async-fan-out".into(),
                excerpt: None,
                topic: "Rust".into(),
                tags: vec![],
                reading_time_minutes: 3,
                published_at: Some(Utc::now()),
            },
            recipients: emails
                .iter()
                .map(|email| Recipient {
                    email: email.to_string(),
                    name: None,
                })
                .collect(),
        }
    }

    fn post(published: bool) -> Post {
        Post::new(
            PostInput {
                title: "Async fan-out".into(),
                content: "x".repeat(120),
                topic: "Rust".into(),
                is_published: published,
                ..PostInput::default()
            },
            Utc::now(),
        )
    }

    #[tokio::test]
    async fn one_failure_does_not_stop_the_others() {
        let mailer = Arc::new(FakeMailer {
            failing: vec!["b@x.com".into()],
            ..FakeMailer::default()
        });
        let dispatcher = dispatcher(mailer.clone(), FixedSubscribers(Ok(vec![])));

        let report = dispatcher.dispatch(job(&["a@x.com", "b@x.com", "c@x.com"])).await;

        assert_eq!(report.successful, 2);
        assert_eq!(report.failed, 1);
        assert_eq!(report.total, 3);

        let attempts = mailer.attempts.lock().unwrap().clone();
        assert!(attempts.contains(&"a@x.com".to_string()));
        assert!(attempts.contains(&"c@x.com".to_string()));

        let failed: Vec<_> = report.details.iter().filter(|d| !d.success).collect();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].email, "b@x.com");
        assert!(failed[0].error.as_deref().unwrap().contains("invalid recipient"));
    }

    #[tokio::test(start_paused = true)]
    async fn slow_send_times_out() {
        let mailer = Arc::new(FakeMailer {
            stall: Some("slow@x.com".into()),
            ..FakeMailer::default()
        });
        let dispatcher = dispatcher(mailer, FixedSubscribers(Ok(vec![])))
            .with_send_timeout(Duration::from_millis(50));

        let report = dispatcher.dispatch(job(&["slow@x.com", "fast@x.com"])).await;

        assert_eq!(report.successful, 1);
        assert_eq!(report.failed, 1);
        let slow = report.details.iter().find(|d| d.email == "slow@x.com").unwrap();
        assert!(slow.error.as_deref().unwrap().contains("timed out"));
    }

    #[tokio::test]
    async fn empty_job_reports_zero() {
        let dispatcher = dispatcher(Arc::default(), FixedSubscribers(Ok(vec![])));
        let report = dispatcher.dispatch(job(&[])).await;
        assert_eq!(report, DispatchReport::default());
    }

    #[tokio::test]
    async fn notify_uses_active_subscribers() {
        let mailer = Arc::new(FakeMailer::default());
        let subscribers = vec![
            Subscriber::new("a@x.com".into(), None, Utc::now()),
            Subscriber::new("b@x.com".into(), Some("Bea".into()), Utc::now()),
        ];
        let dispatcher = dispatcher(mailer.clone(), FixedSubscribers(Ok(subscribers)));

        let report = dispatcher.notify_subscribers(&post(true)).await.unwrap();

        assert_eq!(report.total, 2);
        assert_eq!(report.successful, 2);
        assert_eq!(mailer.attempts.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn drafts_are_not_sent() {
        let mailer = Arc::new(FakeMailer::default());
        let dispatcher = dispatcher(mailer.clone(), FixedSubscribers(Ok(vec![])));

        let err = dispatcher.notify_subscribers(&post(false)).await.unwrap_err();

        assert!(matches!(err, DomainError::Validation(_)));
        assert!(mailer.attempts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn subscriber_snapshot_failure_is_a_backend_error() {
        let dispatcher = dispatcher(Arc::default(), FixedSubscribers(Err(())));
        let err = dispatcher.notify_subscribers(&post(true)).await.unwrap_err();
        assert!(matches!(err, DomainError::Backend(_)));
    }
}
