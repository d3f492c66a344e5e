//! Content access layer: posts, counters and images.

use std::sync::Arc;

use chrono::{Duration, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::domain::{
    ImageUpload, LikeUpdate, Page, PageRequest, Post, PostInput, PostStats, UploadedImage,
};
use crate::error::DomainError;
use crate::ports::{
    ObjectStore, PostOrder, PostQuery, PostRepository, StorageError, SubscriberRepository,
};

use super::repo_error;

pub const DEFAULT_SEARCH_LIMIT: u64 = 10;
pub const DEFAULT_FEATURED_LIMIT: u64 = 3;

/// Admin dashboard figures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DashboardStats {
    pub total_posts: u64,
    pub published_posts: u64,
    pub draft_posts: u64,
    pub total_views: u64,
    pub active_subscribers: u64,
}

#[derive(Clone)]
pub struct ContentService {
    posts: Arc<dyn PostRepository>,
    subscribers: Arc<dyn SubscriberRepository>,
    images: Arc<dyn ObjectStore>,
    search_limit: u64,
}

impl ContentService {
    pub fn new(
        posts: Arc<dyn PostRepository>,
        subscribers: Arc<dyn SubscriberRepository>,
        images: Arc<dyn ObjectStore>,
    ) -> Self {
        Self {
            posts,
            subscribers,
            images,
            search_limit: DEFAULT_SEARCH_LIMIT,
        }
    }

    pub fn with_search_limit(mut self, limit: u64) -> Self {
        self.search_limit = limit.max(1);
        self
    }

    async fn page(&self, request: PageRequest, published_only: bool) -> Result<Page<Post>, DomainError> {
        let query = PostQuery {
            published_only,
            order: if published_only {
                PostOrder::PublishedDesc
            } else {
                PostOrder::CreatedDesc
            },
            offset: request.offset(),
            limit: request.page_size,
            ..PostQuery::default()
        };
        let (items, total) = self.posts.list(&query).await?;
        Ok(Page::new(items, total, request))
    }

    /// Published posts, newest first.
    pub async fn list_published(&self, page: u64, page_size: u64) -> Result<Page<Post>, DomainError> {
        self.page(PageRequest::new(page, page_size)?, true).await
    }

    /// Every post including drafts, most recently created first.
    pub async fn list_all(&self, page: u64, page_size: u64) -> Result<Page<Post>, DomainError> {
        self.page(PageRequest::new(page, page_size)?, false).await
    }

    /// A published post by slug. Drafts are reported as missing.
    pub async fn get_by_slug(&self, slug: &str) -> Result<Post, DomainError> {
        self.posts
            .find_by_slug(slug)
            .await?
            .filter(|post| post.is_published)
            .ok_or_else(|| DomainError::not_found("Post", slug))
    }

    /// Any post by id, drafts included.
    pub async fn get_by_id(&self, id: Uuid) -> Result<Post, DomainError> {
        self.posts
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::not_found("Post", id))
    }

    async fn get_published(&self, id: Uuid) -> Result<Post, DomainError> {
        let post = self.get_by_id(id).await?;
        if post.is_published {
            Ok(post)
        } else {
            Err(DomainError::not_found("Post", id))
        }
    }

    /// Full-text search over published posts. A blank query matches nothing.
    pub async fn search(&self, query: &str) -> Result<Vec<Post>, DomainError> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }
        Ok(self.posts.search(query, self.search_limit).await?)
    }

    pub async fn featured(&self, limit: u64) -> Result<Vec<Post>, DomainError> {
        let query = PostQuery {
            featured_only: true,
            limit: limit.max(1),
            ..PostQuery::default()
        };
        Ok(self.posts.list(&query).await?.0)
    }

    pub async fn by_topic(&self, topic: &str, limit: u64) -> Result<Vec<Post>, DomainError> {
        let query = PostQuery {
            topic: Some(topic.trim().to_string()),
            limit: limit.max(1),
            ..PostQuery::default()
        };
        Ok(self.posts.list(&query).await?.0)
    }

    /// Most viewed posts published within the last `within_days` days.
    pub async fn popular(&self, limit: u64, within_days: i64) -> Result<Vec<Post>, DomainError> {
        let query = PostQuery {
            published_since: Some(Utc::now() - Duration::days(within_days.max(0))),
            order: PostOrder::ViewsDesc,
            limit: limit.max(1),
            ..PostQuery::default()
        };
        Ok(self.posts.list(&query).await?.0)
    }

    async fn ensure_slug_free(&self, slug: &str, owner: Option<Uuid>) -> Result<(), DomainError> {
        match self.posts.find_by_slug(slug).await? {
            Some(existing) if Some(existing.id) != owner => Err(DomainError::Duplicate(format!(
                "A post with slug '{slug}' already exists"
            ))),
            _ => Ok(()),
        }
    }

    pub async fn create(&self, input: PostInput) -> Result<Post, DomainError> {
        input.validate()?;
        let post = Post::new(input, Utc::now());
        self.ensure_slug_free(&post.slug, None).await?;

        let post = self.posts.insert(post).await?;
        tracing::info!(post_id = %post.id, slug = %post.slug, published = post.is_published, "Post created");
        Ok(post)
    }

    pub async fn update(&self, id: Uuid, input: PostInput) -> Result<Post, DomainError> {
        input.validate()?;
        let mut post = self.get_by_id(id).await?;
        post.apply(input, Utc::now());
        self.ensure_slug_free(&post.slug, Some(id)).await?;

        let post = self
            .posts
            .update(post)
            .await
            .map_err(|e| repo_error(e, "Post", id))?;
        tracing::info!(post_id = %post.id, slug = %post.slug, published = post.is_published, "Post updated");
        Ok(post)
    }

    /// Delete a post; its comments go with it.
    pub async fn delete(&self, id: Uuid) -> Result<(), DomainError> {
        self.posts
            .delete(id)
            .await
            .map_err(|e| repo_error(e, "Post", id))?;
        tracing::info!(post_id = %id, "Post deleted");
        Ok(())
    }

    /// Atomically bump the view counter, returning the new count.
    pub async fn increment_views(&self, id: Uuid) -> Result<u64, DomainError> {
        self.posts
            .increment_views(id)
            .await
            .map_err(|e| repo_error(e, "Post", id))
    }

    /// Like a published post.
    ///
    /// The returned update is `Confirmed` with the stored count, or
    /// `Reverted` to the previous count when the store refused.
    pub async fn like(&self, id: Uuid) -> Result<LikeUpdate, DomainError> {
        let post = self.get_published(id).await?;
        let pending = LikeUpdate::begin(post.like_count);

        let outcome = self.posts.increment_likes(id).await;
        if let Err(e) = &outcome {
            tracing::warn!(post_id = %id, error = %e, "Like was not recorded, reverting");
        }
        Ok(pending.settle(&outcome))
    }

    pub async fn stats(&self, id: Uuid) -> Result<PostStats, DomainError> {
        Ok(PostStats::from(&self.get_by_id(id).await?))
    }

    pub async fn dashboard(&self) -> Result<DashboardStats, DomainError> {
        let totals = self.posts.totals().await?;
        let active_subscribers = self.subscribers.count_active().await?;

        Ok(DashboardStats {
            total_posts: totals.total,
            published_posts: totals.published,
            draft_posts: totals.total.saturating_sub(totals.published),
            total_views: totals.total_views,
            active_subscribers,
        })
    }

    /// Validate and store an image, returning where it can be fetched.
    pub async fn upload_image(&self, upload: ImageUpload) -> Result<UploadedImage, DomainError> {
        upload.validate()?;
        let path = upload.storage_name(Utc::now());

        let public_url = self
            .images
            .put(&path, &upload.content_type, upload.bytes)
            .await
            .map_err(|e| {
                tracing::error!(path = %path, error = %e, "Image upload failed");
                match e {
                    StorageError::AlreadyExists(_) => {
                        DomainError::Storage("Image name collision, please retry".to_string())
                    }
                    _ => DomainError::Storage(
                        "Failed to upload image. Please try again.".to_string(),
                    ),
                }
            })?;

        tracing::info!(path = %path, "Image uploaded");
        Ok(UploadedImage { path, public_url })
    }
}
