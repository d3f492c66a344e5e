use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{Comment, CommentStatus, Post, Subscriber};
use crate::error::RepoError;

/// Generic repository trait defining standard CRUD operations.
#[async_trait]
pub trait BaseRepository<T, ID>: Send + Sync {
    /// Find an entity by its unique ID.
    async fn find_by_id(&self, id: ID) -> Result<Option<T>, RepoError>;

    /// Insert a new entity. Unique-key clashes surface as `Constraint`.
    async fn insert(&self, entity: T) -> Result<T, RepoError>;

    /// Replace an existing entity. Absent IDs surface as `NotFound`.
    async fn update(&self, entity: T) -> Result<T, RepoError>;

    /// Delete an entity by its ID. Absent IDs surface as `NotFound`.
    async fn delete(&self, id: ID) -> Result<(), RepoError>;
}

/// Sort order for post listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PostOrder {
    #[default]
    PublishedDesc,
    CreatedDesc,
    ViewsDesc,
}

/// Filters for post listings. The default lists published posts only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostQuery {
    pub published_only: bool,
    pub featured_only: bool,
    pub topic: Option<String>,
    pub published_since: Option<DateTime<Utc>>,
    pub order: PostOrder,
    pub offset: u64,
    pub limit: u64,
}

impl Default for PostQuery {
    fn default() -> Self {
        Self {
            published_only: true,
            featured_only: false,
            topic: None,
            published_since: None,
            order: PostOrder::PublishedDesc,
            offset: 0,
            limit: 10,
        }
    }
}

/// Aggregate figures across every post.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PostTotals {
    pub total: u64,
    pub published: u64,
    pub total_views: u64,
}

/// Post repository.
///
/// Counter increments must be atomic in the store: concurrent calls are
/// each reflected and the new value is returned.
#[async_trait]
pub trait PostRepository: BaseRepository<Post, Uuid> {
    /// Find a post by slug regardless of publish state.
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Post>, RepoError>;

    /// A page of posts matching `query` together with the total match count.
    async fn list(&self, query: &PostQuery) -> Result<(Vec<Post>, u64), RepoError>;

    /// Full-text search over published posts, newest first.
    async fn search(&self, text: &str, limit: u64) -> Result<Vec<Post>, RepoError>;

    async fn increment_views(&self, id: Uuid) -> Result<u64, RepoError>;

    async fn increment_likes(&self, id: Uuid) -> Result<u64, RepoError>;

    async fn increment_comments(&self, id: Uuid) -> Result<u64, RepoError>;

    async fn totals(&self) -> Result<PostTotals, RepoError>;
}

/// Comment repository. Deleting a post removes its comments in the store.
#[async_trait]
pub trait CommentRepository: BaseRepository<Comment, Uuid> {
    /// Comments on a post with the given status, oldest first.
    async fn list_for_post(
        &self,
        post_id: Uuid,
        status: CommentStatus,
    ) -> Result<Vec<Comment>, RepoError>;
}

/// Newsletter subscriber repository. Emails are unique.
#[async_trait]
pub trait SubscriberRepository: BaseRepository<Subscriber, Uuid> {
    async fn find_by_email(&self, email: &str) -> Result<Option<Subscriber>, RepoError>;

    async fn list_active(&self) -> Result<Vec<Subscriber>, RepoError>;

    async fn count_active(&self) -> Result<u64, RepoError>;
}
