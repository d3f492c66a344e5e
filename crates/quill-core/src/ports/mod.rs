//! Ports - trait definitions for external dependencies.
//! These are the "interfaces" that infrastructure must implement.

mod auth;
mod mail;
mod rate_limit;
mod repository;
mod storage;

pub use auth::{ADMIN_ROLE, AuthError, PasswordService, TokenClaims, TokenService};
pub use mail::{DeliveryReceipt, EmailMessage, MailError, Mailer};
pub use rate_limit::{RateLimitDecision, RateLimitError, RateLimiter};
pub use repository::{
    BaseRepository, CommentRepository, PostOrder, PostQuery, PostRepository, PostTotals,
    SubscriberRepository,
};
pub use storage::{ObjectStore, StorageError};
