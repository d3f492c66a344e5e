//! Application configuration loaded from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use quill_core::domain::comment::DEFAULT_MAX_DEPTH;
use quill_core::email::SiteInfo;
use quill_core::services::{DEFAULT_SEARCH_LIMIT, DEFAULT_SEND_TIMEOUT};
use quill_infra::{
    BucketConfig, DEFAULT_UPLOAD_TIMEOUT, JwtConfig, RateLimitConfig, ResendConfig,
};

/// Connection settings for the blog database.
#[derive(Debug, Clone)]
pub struct DatabaseSettings {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
}

/// The single admin account.
#[derive(Debug, Clone, Default)]
pub struct AdminSettings {
    pub email: String,
    /// Argon2 PHC string. Without it nobody can log in.
    pub password_hash: Option<String>,
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database: Option<DatabaseSettings>,
    pub site: SiteInfo,
    pub mail: ResendConfig,
    pub storage: Option<BucketConfig>,
    pub notify_timeout: Duration,
    pub search_limit: u64,
    pub comment_max_depth: usize,
    pub admin: AdminSettings,
    pub jwt: JwtConfig,
    pub rate_limit: RateLimitConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            database: None,
            site: SiteInfo::default(),
            mail: ResendConfig::default(),
            storage: None,
            notify_timeout: DEFAULT_SEND_TIMEOUT,
            search_limit: DEFAULT_SEARCH_LIMIT,
            comment_max_depth: DEFAULT_MAX_DEPTH,
            admin: AdminSettings::default(),
            jwt: JwtConfig::default(),
            rate_limit: RateLimitConfig::default(),
        }
    }
}

fn var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Parse a variable, falling back when it is unset or malformed.
fn parsed<T: FromStr>(key: &str, default: T) -> T {
    match var(key) {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!(key, value = %raw, "Ignoring malformed configuration value");
            default
        }),
        None => default,
    }
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let database = var("DATABASE_URL").map(|url| DatabaseSettings {
            url,
            max_connections: parsed("DB_MAX_CONNECTIONS", 20),
            min_connections: parsed("DB_MIN_CONNECTIONS", 2),
        });

        let site = SiteInfo {
            name: var("SITE_NAME").unwrap_or(defaults.site.name),
            url: var("SITE_URL").unwrap_or(defaults.site.url),
            author: var("SITE_AUTHOR").unwrap_or(defaults.site.author),
        };

        let mail = ResendConfig {
            api_key: var("RESEND_API_KEY"),
            api_url: var("RESEND_API_URL").unwrap_or(defaults.mail.api_url),
            from: var("EMAIL_FROM").unwrap_or(defaults.mail.from),
            timeout: defaults.mail.timeout,
        };

        let storage = match (var("STORAGE_URL"), var("STORAGE_KEY")) {
            (Some(base_url), Some(api_key)) => Some(BucketConfig {
                base_url,
                bucket: var("STORAGE_BUCKET").unwrap_or_else(|| "images".to_string()),
                api_key,
                timeout: Duration::from_secs(parsed(
                    "STORAGE_TIMEOUT_SECS",
                    DEFAULT_UPLOAD_TIMEOUT.as_secs(),
                )),
            }),
            _ => None,
        };

        let jwt = JwtConfig {
            secret: var("JWT_SECRET").unwrap_or_else(|| {
                tracing::warn!(
                    "JWT_SECRET not set. Using a random per-process secret; admin sessions end on restart."
                );
                defaults.jwt.secret
            }),
            expiration_hours: parsed("JWT_EXPIRATION_HOURS", defaults.jwt.expiration_hours),
            issuer: var("JWT_ISSUER").unwrap_or(defaults.jwt.issuer),
        };

        let rate_limit = RateLimitConfig {
            max_requests: parsed("RATE_LIMIT_MAX_REQUESTS", defaults.rate_limit.max_requests),
            window: Duration::from_secs(parsed(
                "RATE_LIMIT_WINDOW_SECS",
                defaults.rate_limit.window.as_secs(),
            )),
        };

        Self {
            host: var("HOST").unwrap_or(defaults.host),
            port: parsed("PORT", defaults.port),
            database,
            site,
            mail,
            storage,
            notify_timeout: Duration::from_secs(parsed(
                "NOTIFY_TIMEOUT_SECS",
                defaults.notify_timeout.as_secs(),
            )),
            search_limit: parsed("SEARCH_LIMIT", defaults.search_limit),
            comment_max_depth: parsed("COMMENT_MAX_DEPTH", defaults.comment_max_depth),
            admin: AdminSettings {
                email: var("ADMIN_EMAIL").unwrap_or_default(),
                password_hash: var("ADMIN_PASSWORD_HASH"),
            },
            jwt,
            rate_limit,
        }
    }
}
