//! Application services - the operations the HTTP layer calls.
//!
//! Services own every store mutation. They take their collaborators as
//! `Arc<dyn Port>` so adapters can be swapped per environment.

mod comments;
mod content;
mod notify;
mod subscriptions;

pub use comments::CommentService;
pub use content::{ContentService, DEFAULT_FEATURED_LIMIT, DEFAULT_SEARCH_LIMIT, DashboardStats};
pub use notify::{
    DEFAULT_SEND_TIMEOUT, DeliveryOutcome, DispatchReport, NotificationDispatcher, NotificationJob,
};
pub use subscriptions::SubscriptionService;

use crate::error::{DomainError, RepoError};

/// Attach entity context to a repository `NotFound`.
pub(crate) fn repo_error(err: RepoError, entity: &'static str, key: impl ToString) -> DomainError {
    match err {
        RepoError::NotFound => DomainError::not_found(entity, key),
        other => other.into(),
    }
}
