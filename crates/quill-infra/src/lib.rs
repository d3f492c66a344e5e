//! # Quill Infrastructure
//!
//! Concrete implementations of the ports defined in `quill-core`.
//! This crate contains database, object storage and email integrations.
//!
//! ## Feature Flags
//!
//! - `full` (default) - All features enabled
//! - `minimal` - No external services, in-memory only
//! - `postgres` - PostgreSQL database support via SeaORM
//! - `auth` - JWT + Argon2 authentication
//! - `rate-limit` - Rate limiting via governor
//! - `http` - Resend mailer and hosted image bucket via reqwest

pub mod database;
pub mod memory;

#[cfg(feature = "auth")]
pub mod auth;

#[cfg(feature = "http")]
pub mod http;

#[cfg(feature = "rate-limit")]
pub mod rate_limit;

// Re-exports - In-Memory
pub use memory::{InMemoryObjectStore, InMemoryStore};

#[cfg(feature = "postgres")]
pub use database::{
    DatabaseConfig, PostgresCommentRepository, PostgresPostRepository,
    PostgresSubscriberRepository,
};

#[cfg(feature = "auth")]
pub use auth::{Argon2PasswordService, JwtConfig, JwtTokenService};

#[cfg(feature = "http")]
pub use http::{
    BucketConfig, DEFAULT_UPLOAD_TIMEOUT, HttpObjectStore, ResendConfig, ResendMailer,
};

#[cfg(feature = "rate-limit")]
pub use rate_limit::{InMemoryRateLimiter, RateLimitConfig};
