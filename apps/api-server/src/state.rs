//! Application state - shared across all handlers.

use std::sync::Arc;

use quill_core::email::EmailTemplates;
use quill_core::ports::{
    CommentRepository, MailError, Mailer, ObjectStore, PasswordService, PostRepository,
    RateLimitError, RateLimiter, StorageError, SubscriberRepository, TokenService,
};
use quill_core::services::{
    CommentService, ContentService, NotificationDispatcher, SubscriptionService,
};
use quill_infra::{
    Argon2PasswordService, HttpObjectStore, InMemoryObjectStore, InMemoryRateLimiter,
    InMemoryStore, JwtTokenService, ResendMailer,
};

#[cfg(feature = "postgres")]
use quill_infra::database::{
    DatabaseConfig, PostgresCommentRepository, PostgresPostRepository,
    PostgresSubscriberRepository, connect,
};

use crate::config::{AdminSettings, AppConfig};

/// Reasons the server cannot start.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("Email provider: {0}")]
    Mail(#[from] MailError),

    #[error("Image storage: {0}")]
    Storage(#[from] StorageError),

    #[error("Rate limiter: {0}")]
    RateLimit(#[from] RateLimitError),
}

/// The stores and outbound services the application runs against.
#[derive(Clone)]
pub struct Adapters {
    pub posts: Arc<dyn PostRepository>,
    pub comments: Arc<dyn CommentRepository>,
    pub subscribers: Arc<dyn SubscriberRepository>,
    pub images: Arc<dyn ObjectStore>,
    pub mailer: Arc<dyn Mailer>,
}

impl Adapters {
    /// One in-memory store behind every repository.
    pub fn in_memory(images: Arc<dyn ObjectStore>, mailer: Arc<dyn Mailer>) -> Self {
        let store = Arc::new(InMemoryStore::new());
        Self {
            posts: store.clone(),
            comments: store.clone(),
            subscribers: store,
            images,
            mailer,
        }
    }

    /// Pick adapters from configuration.
    ///
    /// PostgreSQL is used when compiled in and `DATABASE_URL` is set, and the
    /// hosted bucket when its credentials are present. Anything else falls
    /// back to memory.
    pub async fn from_config(config: &AppConfig) -> Result<Self, StartupError> {
        let mailer: Arc<dyn Mailer> = Arc::new(ResendMailer::new(config.mail.clone())?);

        let images: Arc<dyn ObjectStore> = match &config.storage {
            Some(bucket) => {
                tracing::info!(bucket = %bucket.bucket, "Using hosted image storage");
                Arc::new(HttpObjectStore::new(bucket.clone())?)
            }
            None => {
                tracing::warn!("Image storage not configured. Uploads are kept in memory.");
                Arc::new(InMemoryObjectStore::new(format!(
                    "{}/uploads",
                    config.site.url.trim_end_matches('/')
                )))
            }
        };

        #[cfg(feature = "postgres")]
        {
            if let Some(settings) = &config.database {
                let db_config = DatabaseConfig {
                    url: settings.url.clone(),
                    max_connections: settings.max_connections,
                    min_connections: settings.min_connections,
                };
                match connect(&db_config).await {
                    Ok(conn) => {
                        return Ok(Self {
                            posts: Arc::new(PostgresPostRepository::new(conn.clone())),
                            comments: Arc::new(PostgresCommentRepository::new(conn.clone())),
                            subscribers: Arc::new(PostgresSubscriberRepository::new(conn)),
                            images,
                            mailer,
                        });
                    }
                    Err(e) => {
                        tracing::error!(
                            "Failed to connect to database: {}. Using in-memory fallback.",
                            e
                        );
                    }
                }
            }
        }

        if config.database.is_none() {
            tracing::warn!("DATABASE_URL not set. Running without database (in-memory mode).");
        }
        #[cfg(not(feature = "postgres"))]
        {
            if config.database.is_some() {
                tracing::warn!("Built without the postgres feature. DATABASE_URL is ignored.");
            }
        }

        Ok(Self::in_memory(images, mailer))
    }
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub content: ContentService,
    pub comments: CommentService,
    pub subscriptions: SubscriptionService,
    pub dispatcher: Arc<NotificationDispatcher>,
    pub templates: EmailTemplates,
    pub mailer: Arc<dyn Mailer>,
    pub tokens: Arc<dyn TokenService>,
    pub passwords: Arc<dyn PasswordService>,
    pub admin: AdminSettings,
    pub rate_limiter: Arc<dyn RateLimiter>,
}

impl AppState {
    /// Build the application state with appropriate implementations.
    pub async fn new(config: &AppConfig) -> Result<Self, StartupError> {
        let adapters = Adapters::from_config(config).await?;
        Self::with_adapters(config, adapters)
    }

    /// Wire services over the given adapters.
    pub fn with_adapters(config: &AppConfig, adapters: Adapters) -> Result<Self, StartupError> {
        let templates = EmailTemplates::new(config.site.clone());

        let content = ContentService::new(
            adapters.posts.clone(),
            adapters.subscribers.clone(),
            adapters.images,
        )
        .with_search_limit(config.search_limit);

        let comments = CommentService::new(adapters.comments, adapters.posts)
            .with_max_depth(config.comment_max_depth);

        let subscriptions = SubscriptionService::new(
            adapters.subscribers.clone(),
            adapters.mailer.clone(),
            templates.clone(),
        )
        .with_send_timeout(config.notify_timeout);

        let dispatcher = NotificationDispatcher::new(
            adapters.mailer.clone(),
            adapters.subscribers,
            templates.clone(),
        )
        .with_send_timeout(config.notify_timeout);

        let rate_limiter = InMemoryRateLimiter::new(&config.rate_limit)?;

        if config.admin.password_hash.is_none() {
            tracing::warn!("ADMIN_PASSWORD_HASH not set. Admin login is disabled.");
        }

        tracing::info!("Application state initialized");

        Ok(Self {
            content,
            comments,
            subscriptions,
            dispatcher: Arc::new(dispatcher),
            templates,
            mailer: adapters.mailer,
            tokens: Arc::new(JwtTokenService::new(config.jwt.clone())),
            passwords: Arc::new(Argon2PasswordService::new()),
            admin: config.admin.clone(),
            rate_limiter: Arc::new(rate_limiter),
        })
    }
}
