//! In-memory content store - used when no database is configured.
//!
//! Posts, comments and subscribers share one lock so that cascades and
//! counter bumps see a consistent view. Data is lost on process restart.

use std::cmp::Reverse;
use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use quill_core::domain::{Comment, CommentStatus, Post, Subscriber};
use quill_core::error::RepoError;
use quill_core::ports::{
    BaseRepository, CommentRepository, PostOrder, PostQuery, PostRepository, PostTotals,
    SubscriberRepository,
};

#[derive(Default)]
struct Tables {
    posts: HashMap<Uuid, Post>,
    comments: HashMap<Uuid, Comment>,
    subscribers: HashMap<Uuid, Subscriber>,
}

/// In-memory implementation of every content repository.
#[derive(Default)]
pub struct InMemoryStore {
    tables: RwLock<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    async fn bump(&self, id: Uuid, counter: fn(&mut Post) -> &mut u64) -> Result<u64, RepoError> {
        let mut tables = self.tables.write().await;
        let post = tables.posts.get_mut(&id).ok_or(RepoError::NotFound)?;
        let value = counter(post);
        *value += 1;
        Ok(*value)
    }
}

fn selected(post: &Post, query: &PostQuery) -> bool {
    (!query.published_only || post.is_published)
        && (!query.featured_only || post.is_featured)
        && query.topic.as_ref().is_none_or(|topic| &post.topic == topic)
        && query
            .published_since
            .is_none_or(|since| post.published_at.is_some_and(|at| at >= since))
}

fn sort(posts: &mut [Post], order: PostOrder) {
    match order {
        PostOrder::PublishedDesc => {
            posts.sort_by_key(|p| (Reverse(p.published_at), Reverse(p.created_at)))
        }
        PostOrder::CreatedDesc => posts.sort_by_key(|p| Reverse(p.created_at)),
        PostOrder::ViewsDesc => posts.sort_by_key(|p| (Reverse(p.view_count), Reverse(p.published_at))),
    }
}

/// Every term must appear somewhere in the post's searchable text.
fn search_hit(post: &Post, terms: &[String]) -> bool {
    let haystack = format!(
        "{} {} {} {} {}",
        post.title,
        post.excerpt.as_deref().unwrap_or_default(),
        post.content,
        post.topic,
        post.tags.join(" ")
    )
    .to_lowercase();
    terms.iter().all(|term| haystack.contains(term.as_str()))
}

#[async_trait]
impl BaseRepository<Post, Uuid> for InMemoryStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Post>, RepoError> {
        Ok(self.tables.read().await.posts.get(&id).cloned())
    }

    async fn insert(&self, post: Post) -> Result<Post, RepoError> {
        let mut tables = self.tables.write().await;
        if tables.posts.contains_key(&post.id) || tables.posts.values().any(|p| p.slug == post.slug) {
            return Err(RepoError::Constraint(format!("slug '{}' already exists", post.slug)));
        }
        tables.posts.insert(post.id, post.clone());
        Ok(post)
    }

    async fn update(&self, mut post: Post) -> Result<Post, RepoError> {
        let mut tables = self.tables.write().await;
        if !tables.posts.contains_key(&post.id) {
            return Err(RepoError::NotFound);
        }
        if tables
            .posts
            .values()
            .any(|p| p.slug == post.slug && p.id != post.id)
        {
            return Err(RepoError::Constraint(format!("slug '{}' already exists", post.slug)));
        }
        let stored = tables.posts.get_mut(&post.id).ok_or(RepoError::NotFound)?;
        // Counters only move through the increment paths.
        post.view_count = stored.view_count;
        post.like_count = stored.like_count;
        post.comment_count = stored.comment_count;
        *stored = post.clone();
        Ok(post)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        let mut tables = self.tables.write().await;
        tables.posts.remove(&id).ok_or(RepoError::NotFound)?;
        tables.comments.retain(|_, c| c.post_id != id);
        Ok(())
    }
}

#[async_trait]
impl PostRepository for InMemoryStore {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Post>, RepoError> {
        let tables = self.tables.read().await;
        Ok(tables.posts.values().find(|p| p.slug == slug).cloned())
    }

    async fn list(&self, query: &PostQuery) -> Result<(Vec<Post>, u64), RepoError> {
        let tables = self.tables.read().await;
        let mut posts: Vec<Post> = tables
            .posts
            .values()
            .filter(|p| selected(p, query))
            .cloned()
            .collect();
        let total = posts.len() as u64;

        sort(&mut posts, query.order);
        let page = posts
            .into_iter()
            .skip(query.offset as usize)
            .take(query.limit as usize)
            .collect();
        Ok((page, total))
    }

    async fn search(&self, text: &str, limit: u64) -> Result<Vec<Post>, RepoError> {
        let terms: Vec<String> = text.split_whitespace().map(str::to_lowercase).collect();
        if terms.is_empty() {
            return Ok(Vec::new());
        }

        let tables = self.tables.read().await;
        let mut hits: Vec<Post> = tables
            .posts
            .values()
            .filter(|p| p.is_published && search_hit(p, &terms))
            .cloned()
            .collect();
        sort(&mut hits, PostOrder::PublishedDesc);
        hits.truncate(limit as usize);
        Ok(hits)
    }

    async fn increment_views(&self, id: Uuid) -> Result<u64, RepoError> {
        self.bump(id, |p| &mut p.view_count).await
    }

    async fn increment_likes(&self, id: Uuid) -> Result<u64, RepoError> {
        self.bump(id, |p| &mut p.like_count).await
    }

    async fn increment_comments(&self, id: Uuid) -> Result<u64, RepoError> {
        self.bump(id, |p| &mut p.comment_count).await
    }

    async fn totals(&self) -> Result<PostTotals, RepoError> {
        let tables = self.tables.read().await;
        Ok(PostTotals {
            total: tables.posts.len() as u64,
            published: tables.posts.values().filter(|p| p.is_published).count() as u64,
            total_views: tables.posts.values().map(|p| p.view_count).sum(),
        })
    }
}

#[async_trait]
impl BaseRepository<Comment, Uuid> for InMemoryStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Comment>, RepoError> {
        Ok(self.tables.read().await.comments.get(&id).cloned())
    }

    async fn insert(&self, comment: Comment) -> Result<Comment, RepoError> {
        let mut tables = self.tables.write().await;
        if !tables.posts.contains_key(&comment.post_id) {
            return Err(RepoError::Constraint(format!(
                "post {} does not exist",
                comment.post_id
            )));
        }
        if tables.comments.contains_key(&comment.id) {
            return Err(RepoError::Constraint(format!("comment {} already exists", comment.id)));
        }
        tables.comments.insert(comment.id, comment.clone());
        Ok(comment)
    }

    async fn update(&self, comment: Comment) -> Result<Comment, RepoError> {
        let mut tables = self.tables.write().await;
        match tables.comments.get_mut(&comment.id) {
            Some(existing) => {
                *existing = comment.clone();
                Ok(comment)
            }
            None => Err(RepoError::NotFound),
        }
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        let mut tables = self.tables.write().await;
        tables.comments.remove(&id).map(|_| ()).ok_or(RepoError::NotFound)
    }
}

#[async_trait]
impl CommentRepository for InMemoryStore {
    async fn list_for_post(
        &self,
        post_id: Uuid,
        status: CommentStatus,
    ) -> Result<Vec<Comment>, RepoError> {
        let tables = self.tables.read().await;
        let mut comments: Vec<Comment> = tables
            .comments
            .values()
            .filter(|c| c.post_id == post_id && c.status == status)
            .cloned()
            .collect();
        comments.sort_by_key(|c| c.created_at);
        Ok(comments)
    }
}

#[async_trait]
impl BaseRepository<Subscriber, Uuid> for InMemoryStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Subscriber>, RepoError> {
        Ok(self.tables.read().await.subscribers.get(&id).cloned())
    }

    async fn insert(&self, subscriber: Subscriber) -> Result<Subscriber, RepoError> {
        let mut tables = self.tables.write().await;
        if tables
            .subscribers
            .values()
            .any(|s| s.email == subscriber.email || s.id == subscriber.id)
        {
            return Err(RepoError::Constraint("email already subscribed".to_string()));
        }
        tables.subscribers.insert(subscriber.id, subscriber.clone());
        Ok(subscriber)
    }

    async fn update(&self, subscriber: Subscriber) -> Result<Subscriber, RepoError> {
        let mut tables = self.tables.write().await;
        match tables.subscribers.get_mut(&subscriber.id) {
            Some(existing) => {
                *existing = subscriber.clone();
                Ok(subscriber)
            }
            None => Err(RepoError::NotFound),
        }
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        let mut tables = self.tables.write().await;
        tables.subscribers.remove(&id).map(|_| ()).ok_or(RepoError::NotFound)
    }
}

#[async_trait]
impl SubscriberRepository for InMemoryStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<Subscriber>, RepoError> {
        let tables = self.tables.read().await;
        Ok(tables.subscribers.values().find(|s| s.email == email).cloned())
    }

    async fn list_active(&self) -> Result<Vec<Subscriber>, RepoError> {
        let tables = self.tables.read().await;
        let mut active: Vec<Subscriber> = tables
            .subscribers
            .values()
            .filter(|s| s.is_active)
            .cloned()
            .collect();
        active.sort_by_key(|s| s.created_at);
        Ok(active)
    }

    async fn count_active(&self) -> Result<u64, RepoError> {
        let tables = self.tables.read().await;
        Ok(tables.subscribers.values().filter(|s| s.is_active).count() as u64)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{Duration, Utc};
    use quill_core::domain::PostInput;

    use super::*;

    fn post(title: &str, published: bool) -> Post {
        Post::new(
            PostInput {
                title: title.to_string(),
                content: format!("{title} ").repeat(30),
                topic: "Rust".to_string(),
                is_published: published,
                ..PostInput::default()
            },
            Utc::now(),
        )
    }

    #[tokio::test]
    async fn test_duplicate_slug_is_a_constraint() {
        let store = InMemoryStore::new();
        store.insert(post("Same title", true)).await.unwrap();

        let result = store.insert(post("Same title", false)).await;
        assert!(matches!(result, Err(RepoError::Constraint(_))));
    }

    #[tokio::test]
    async fn test_list_filters_and_counts() {
        let store = InMemoryStore::new();
        for i in 0..25 {
            store.insert(post(&format!("Published {i}"), true)).await.unwrap();
        }
        store.insert(post("Just a draft", false)).await.unwrap();

        let query = PostQuery {
            offset: 20,
            limit: 10,
            ..PostQuery::default()
        };
        let (page, total) = store.list(&query).await.unwrap();
        assert_eq!(total, 25);
        assert_eq!(page.len(), 5);
        assert!(page.iter().all(|p| p.is_published));

        let all = PostQuery {
            published_only: false,
            limit: 100,
            ..PostQuery::default()
        };
        assert_eq!(store.list(&all).await.unwrap().1, 26);
    }

    #[tokio::test]
    async fn test_published_since_window() {
        let store = InMemoryStore::new();
        let mut old = post("Ancient history", true);
        old.published_at = Some(Utc::now() - Duration::days(90));
        store.insert(old).await.unwrap();
        store.insert(post("Fresh news", true)).await.unwrap();

        let query = PostQuery {
            published_since: Some(Utc::now() - Duration::days(30)),
            ..PostQuery::default()
        };
        let (recent, _) = store.list(&query).await.unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].title, "Fresh news");
    }

    #[tokio::test]
    async fn test_search_matches_all_terms() {
        let store = InMemoryStore::new();
        store.insert(post("Borrow checker tips", true)).await.unwrap();
        store.insert(post("Borrow money wisely", true)).await.unwrap();
        store.insert(post("Borrow checker draft", false)).await.unwrap();

        let hits = store.search("borrow CHECKER", 10).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].title, "Borrow checker tips");
    }

    #[tokio::test]
    async fn test_concurrent_increments_are_all_reflected() {
        let store = Arc::new(InMemoryStore::new());
        let created = store.insert(post("Counting views", true)).await.unwrap();

        let tasks: Vec<_> = (0..50)
            .map(|_| {
                let store = store.clone();
                tokio::spawn(async move { store.increment_views(created.id).await })
            })
            .collect();
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        let stored = BaseRepository::<Post, Uuid>::find_by_id(store.as_ref(), created.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.view_count, 50);
    }

    #[tokio::test]
    async fn test_increment_unknown_post() {
        let store = InMemoryStore::new();
        let result = store.increment_likes(Uuid::new_v4()).await;
        assert!(matches!(result, Err(RepoError::NotFound)));
    }

    #[tokio::test]
    async fn test_delete_post_cascades_comments() {
        let store = InMemoryStore::new();
        let created = store.insert(post("Soon to be gone", true)).await.unwrap();
        let comment = Comment {
            id: Uuid::new_v4(),
            post_id: created.id,
            parent_id: None,
            author_name: "Ada".into(),
            author_email: "ada@x.com".into(),
            content: "Nice".into(),
            status: CommentStatus::Approved,
            created_at: Utc::now(),
        };
        store.insert(comment.clone()).await.unwrap();

        BaseRepository::<Post, Uuid>::delete(&store, created.id)
            .await
            .unwrap();

        let left = BaseRepository::<Comment, Uuid>::find_by_id(&store, comment.id)
            .await
            .unwrap();
        assert!(left.is_none());
    }

    #[tokio::test]
    async fn test_subscriber_email_is_unique() {
        let store = InMemoryStore::new();
        store
            .insert(Subscriber::new("a@x.com".into(), None, Utc::now()))
            .await
            .unwrap();

        let result = store
            .insert(Subscriber::new("a@x.com".into(), None, Utc::now()))
            .await;
        assert!(matches!(result, Err(RepoError::Constraint(_))));
        assert_eq!(store.count_active().await.unwrap(), 1);
    }
}
