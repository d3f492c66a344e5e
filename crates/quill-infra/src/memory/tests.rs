//! Application services running against the in-memory adapters.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use uuid::Uuid;

use quill_core::DomainError;
use quill_core::domain::{
    ImageUpload, LikeState, NewComment, Post, PostInput, SubscriptionState,
};
use quill_core::error::RepoError;
use quill_core::email::EmailTemplates;
use quill_core::ports::{
    BaseRepository, DeliveryReceipt, EmailMessage, MailError, Mailer, PostQuery, PostRepository,
    PostTotals,
};
use quill_core::services::{CommentService, ContentService, SubscriptionService};

use super::{InMemoryObjectStore, InMemoryStore};

#[derive(Default)]
struct RecordingMailer {
    fail: bool,
    stall: bool,
    sent: Mutex<Vec<EmailMessage>>,
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, message: &EmailMessage) -> Result<DeliveryReceipt, MailError> {
        self.sent.lock().unwrap().push(message.clone());
        if self.stall {
            tokio::time::sleep(std::time::Duration::from_secs(60)).await;
        }
        if self.fail {
            return Err(MailError::Transport("connection reset".into()));
        }
        Ok(DeliveryReceipt::default())
    }
}

struct Fixture {
    content: ContentService,
    comments: CommentService,
    subscriptions: SubscriptionService,
    mailer: Arc<RecordingMailer>,
}

fn fixture_with(mailer: RecordingMailer) -> Fixture {
    let store = Arc::new(InMemoryStore::new());
    let mailer = Arc::new(mailer);

    Fixture {
        content: ContentService::new(
            store.clone(),
            store.clone(),
            Arc::new(InMemoryObjectStore::default()),
        ),
        comments: CommentService::new(store.clone(), store.clone()),
        subscriptions: SubscriptionService::new(
            store,
            mailer.clone(),
            EmailTemplates::default(),
        ),
        mailer,
    }
}

fn fixture() -> Fixture {
    fixture_with(RecordingMailer::default())
}

fn input(title: &str, published: bool) -> PostInput {
    PostInput {
        title: title.to_string(),
        content: "Ownership is the heart of the language. ".repeat(5),
        topic: "Rust".to_string(),
        tags: vec!["ownership".to_string()],
        is_published: published,
        ..PostInput::default()
    }
}

fn new_comment(post_id: Uuid, parent_id: Option<Uuid>) -> NewComment {
    NewComment {
        post_id: Some(post_id),
        author_name: "Ada".to_string(),
        author_email: "ada@example.com".to_string(),
        content: "Great read!".to_string(),
        parent_id,
    }
}

#[tokio::test]
async fn test_short_title_is_rejected() {
    let f = fixture();
    let err = f.content.create(input("Hey", true)).await.unwrap_err();
    assert!(matches!(err, DomainError::Validation(_)));
}

#[tokio::test]
async fn test_create_derives_slug_and_reading_time() {
    let f = fixture();
    let post = f.content.create(input("Hello, World!", true)).await.unwrap();

    assert_eq!(post.slug, "hello-world");
    assert_eq!(post.reading_time_minutes, 1);
    assert!(post.published_at.is_some());

    let fetched = f.content.get_by_slug("hello-world").await.unwrap();
    assert_eq!(fetched.id, post.id);
}

#[tokio::test]
async fn test_same_slug_is_a_duplicate() {
    let f = fixture();
    f.content.create(input("Hello, World!", true)).await.unwrap();

    let err = f.content.create(input("hello world", false)).await.unwrap_err();
    assert!(matches!(err, DomainError::Duplicate(_)));
}

#[tokio::test]
async fn test_drafts_are_hidden_from_readers() {
    let f = fixture();
    let draft = f.content.create(input("Secret draft", false)).await.unwrap();

    let err = f.content.get_by_slug(&draft.slug).await.unwrap_err();
    assert!(matches!(err, DomainError::NotFound { .. }));
    assert_eq!(f.content.list_published(1, 10).await.unwrap().total_count, 0);
    assert_eq!(f.content.list_all(1, 10).await.unwrap().total_count, 1);
}

#[tokio::test]
async fn test_pagination_over_published_posts() {
    let f = fixture();
    for i in 0..25 {
        f.content
            .create(input(&format!("Post number {i}"), true))
            .await
            .unwrap();
    }

    let first = f.content.list_published(1, 10).await.unwrap();
    assert_eq!(first.items.len(), 10);
    assert_eq!(first.total_pages, 3);

    let last = f.content.list_published(3, 10).await.unwrap();
    assert_eq!(last.items.len(), 5);
    assert_eq!(last.current_page, 3);
}

#[tokio::test]
async fn test_update_unpublish_clears_published_at() {
    let f = fixture();
    let post = f.content.create(input("Going away", true)).await.unwrap();

    let updated = f
        .content
        .update(post.id, input("Going away", false))
        .await
        .unwrap();
    assert!(!updated.is_published);
    assert!(updated.published_at.is_none());
}

/// Hands out a post, then lets a reader view it before the caller writes back.
struct ViewedWhileEditing(Arc<InMemoryStore>);

#[async_trait]
impl BaseRepository<Post, Uuid> for ViewedWhileEditing {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Post>, RepoError> {
        let post = BaseRepository::<Post, Uuid>::find_by_id(self.0.as_ref(), id).await?;
        self.0.increment_views(id).await?;
        Ok(post)
    }

    async fn insert(&self, post: Post) -> Result<Post, RepoError> {
        BaseRepository::<Post, Uuid>::insert(self.0.as_ref(), post).await
    }

    async fn update(&self, post: Post) -> Result<Post, RepoError> {
        BaseRepository::<Post, Uuid>::update(self.0.as_ref(), post).await
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        BaseRepository::<Post, Uuid>::delete(self.0.as_ref(), id).await
    }
}

#[async_trait]
impl PostRepository for ViewedWhileEditing {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Post>, RepoError> {
        self.0.find_by_slug(slug).await
    }

    async fn list(&self, query: &PostQuery) -> Result<(Vec<Post>, u64), RepoError> {
        self.0.list(query).await
    }

    async fn search(&self, text: &str, limit: u64) -> Result<Vec<Post>, RepoError> {
        self.0.search(text, limit).await
    }

    async fn increment_views(&self, id: Uuid) -> Result<u64, RepoError> {
        self.0.increment_views(id).await
    }

    async fn increment_likes(&self, id: Uuid) -> Result<u64, RepoError> {
        self.0.increment_likes(id).await
    }

    async fn increment_comments(&self, id: Uuid) -> Result<u64, RepoError> {
        self.0.increment_comments(id).await
    }

    async fn totals(&self) -> Result<PostTotals, RepoError> {
        self.0.totals().await
    }
}

#[tokio::test]
async fn test_update_keeps_concurrent_view() {
    let store = Arc::new(InMemoryStore::new());
    let content = ContentService::new(
        Arc::new(ViewedWhileEditing(store.clone())),
        store.clone(),
        Arc::new(InMemoryObjectStore::default()),
    );

    let post = content.create(input("Counting views", true)).await.unwrap();
    let updated = content
        .update(post.id, input("Counting views, edited", true))
        .await
        .unwrap();

    assert_eq!(updated.view_count, 1);
    let stored = BaseRepository::<Post, Uuid>::find_by_id(store.as_ref(), post.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.view_count, 1);
    assert_eq!(stored.title, "Counting views, edited");
}

#[tokio::test]
async fn test_huge_page_is_a_validation_error() {
    let f = fixture();
    let err = f.content.list_published(u64::MAX, 100).await.unwrap_err();
    assert!(matches!(err, DomainError::Validation(_)));
}

#[tokio::test]
async fn test_padded_short_title_is_rejected() {
    let f = fixture();
    let err = f.content.create(input("   abc   ", true)).await.unwrap_err();
    assert!(matches!(err, DomainError::Validation(_)));
}

#[tokio::test]
async fn test_update_unknown_post() {
    let f = fixture();
    let err = f
        .content
        .update(Uuid::new_v4(), input("Nobody home", true))
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::NotFound { entity: "Post", .. }));
}

#[tokio::test]
async fn test_like_confirms_with_stored_count() {
    let f = fixture();
    let post = f.content.create(input("Likeable", true)).await.unwrap();

    f.content.like(post.id).await.unwrap();
    let update = f.content.like(post.id).await.unwrap();

    assert_eq!(update.state, LikeState::Confirmed);
    assert_eq!(update.previous, 1);
    assert_eq!(update.displayed, 2);
    assert_eq!(f.content.stats(post.id).await.unwrap().like_count, 2);
}

#[tokio::test]
async fn test_like_on_draft_is_not_found() {
    let f = fixture();
    let draft = f.content.create(input("Not yet", false)).await.unwrap();
    let err = f.content.like(draft.id).await.unwrap_err();
    assert!(matches!(err, DomainError::NotFound { .. }));
}

#[tokio::test]
async fn test_search_and_topic_listing() {
    let f = fixture();
    f.content.create(input("Lifetimes explained", true)).await.unwrap();
    let mut other = input("Gardening basics", true);
    other.topic = "Life".to_string();
    other.content = "Water the plants every morning before it gets hot. ".repeat(3);
    f.content.create(other).await.unwrap();

    let hits = f.content.search("lifetimes").await.unwrap();
    assert_eq!(hits.len(), 1);
    assert!(f.content.search("   ").await.unwrap().is_empty());

    let life = f.content.by_topic("Life", 10).await.unwrap();
    assert_eq!(life.len(), 1);
    assert_eq!(life[0].title, "Gardening basics");
}

#[tokio::test]
async fn test_dashboard_counts() {
    let f = fixture();
    let post = f.content.create(input("Counted", true)).await.unwrap();
    f.content.create(input("Draft counted", false)).await.unwrap();
    f.content.increment_views(post.id).await.unwrap();
    f.subscriptions.subscribe("a@x.com", None).await.unwrap();

    let stats = f.content.dashboard().await.unwrap();
    assert_eq!(stats.total_posts, 2);
    assert_eq!(stats.published_posts, 1);
    assert_eq!(stats.draft_posts, 1);
    assert_eq!(stats.total_views, 1);
    assert_eq!(stats.active_subscribers, 1);
}

#[tokio::test]
async fn test_upload_image() {
    let f = fixture();
    let uploaded = f
        .content
        .upload_image(ImageUpload {
            file_name: "cover.PNG".to_string(),
            content_type: "image/png".to_string(),
            bytes: vec![0x89, 0x50, 0x4e, 0x47],
        })
        .await
        .unwrap();

    assert!(uploaded.public_url.ends_with(&uploaded.path));

    let err = f
        .content
        .upload_image(ImageUpload {
            file_name: "notes.gif".to_string(),
            content_type: "image/gif".to_string(),
            bytes: vec![1],
        })
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Validation(_)));
}

#[tokio::test]
async fn test_comment_flow() {
    let f = fixture();
    let post = f.content.create(input("Discuss me", true)).await.unwrap();

    let root = f.comments.add(new_comment(post.id, None)).await.unwrap();
    let reply = f
        .comments
        .add(new_comment(post.id, Some(root.id)))
        .await
        .unwrap();
    f.comments
        .add(new_comment(post.id, Some(reply.id)))
        .await
        .unwrap();

    assert_eq!(f.comments.list(post.id).await.unwrap().len(), 3);
    assert_eq!(f.content.stats(post.id).await.unwrap().comment_count, 3);

    // Default depth cap flattens the grandchild onto the root.
    let thread = f.comments.thread(post.id, None).await.unwrap();
    assert_eq!(thread.len(), 1);
    assert_eq!(thread[0].replies.len(), 2);

    let deep = f.comments.thread(post.id, Some(5)).await.unwrap();
    assert_eq!(deep[0].replies.len(), 1);
    assert_eq!(deep[0].replies[0].replies.len(), 1);
}

#[tokio::test]
async fn test_comment_validation() {
    let f = fixture();
    let post = f.content.create(input("Discuss me", true)).await.unwrap();

    let err = f
        .comments
        .add(NewComment {
            post_id: Some(post.id),
            author_name: "  ".to_string(),
            author_email: String::new(),
            content: "Hi".to_string(),
            parent_id: None,
        })
        .await
        .unwrap_err();
    match err {
        DomainError::Validation(errors) => assert_eq!(errors.len(), 2),
        other => panic!("expected validation error, got {other:?}"),
    }

    let err = f
        .comments
        .add(new_comment(Uuid::new_v4(), None))
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::NotFound { .. }));
}

#[tokio::test]
async fn test_reply_parent_must_share_post() {
    let f = fixture();
    let first = f.content.create(input("First post", true)).await.unwrap();
    let second = f.content.create(input("Second post", true)).await.unwrap();
    let parent = f.comments.add(new_comment(first.id, None)).await.unwrap();

    let err = f
        .comments
        .add(new_comment(second.id, Some(parent.id)))
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Validation(_)));
}

#[tokio::test]
async fn test_deleting_post_removes_comments() {
    let f = fixture();
    let post = f.content.create(input("Short lived", true)).await.unwrap();
    f.comments.add(new_comment(post.id, None)).await.unwrap();

    f.content.delete(post.id).await.unwrap();

    assert!(f.comments.list(post.id).await.unwrap().is_empty());
    let err = f.content.delete(post.id).await.unwrap_err();
    assert!(matches!(err, DomainError::NotFound { .. }));
}

#[tokio::test]
async fn test_subscribe_twice_is_duplicate() {
    let f = fixture();
    let subscriber = f
        .subscriptions
        .subscribe("  Reader@Example.com ", Some("Reader".into()))
        .await
        .unwrap();
    assert_eq!(subscriber.email, "reader@example.com");

    let err = f
        .subscriptions
        .subscribe("reader@example.com", None)
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Duplicate(_)));

    let welcomes = f.mailer.sent.lock().unwrap().clone();
    assert_eq!(welcomes.len(), 1);
    assert_eq!(welcomes[0].to, "reader@example.com");
}

#[tokio::test]
async fn test_unsubscribe_unknown_email_succeeds() {
    let f = fixture();
    let state = f.subscriptions.unsubscribe("ghost@x.com").await.unwrap();
    assert_eq!(state, SubscriptionState::Absent);
}

#[tokio::test]
async fn test_unsubscribe_then_reactivate() {
    let f = fixture();
    f.subscriptions.subscribe("a@x.com", None).await.unwrap();

    let state = f.subscriptions.unsubscribe("a@x.com").await.unwrap();
    assert_eq!(state, SubscriptionState::Unsubscribed);
    assert!(!f.subscriptions.is_active("a@x.com").await.unwrap());
    assert!(f.subscriptions.active_subscribers().await.unwrap().is_empty());

    // Already inactive: still a success.
    let state = f.subscriptions.unsubscribe("a@x.com").await.unwrap();
    assert_eq!(state, SubscriptionState::Unsubscribed);

    // No implicit resurrection.
    let err = f.subscriptions.subscribe("a@x.com", None).await.unwrap_err();
    assert!(matches!(err, DomainError::Duplicate(_)));

    f.subscriptions.reactivate("a@x.com").await.unwrap();
    assert_eq!(
        f.subscriptions.state("a@x.com").await.unwrap(),
        SubscriptionState::Active
    );
    assert_eq!(f.subscriptions.active_count().await.unwrap(), 1);
}

#[tokio::test]
async fn test_reactivate_unknown_email() {
    let f = fixture();
    let err = f.subscriptions.reactivate("ghost@x.com").await.unwrap_err();
    assert!(matches!(err, DomainError::NotFound { .. }));
}

#[tokio::test]
async fn test_welcome_failure_does_not_fail_subscribe() {
    let f = fixture_with(RecordingMailer {
        fail: true,
        ..RecordingMailer::default()
    });

    let subscriber = f.subscriptions.subscribe("a@x.com", None).await.unwrap();
    assert!(subscriber.is_active);
    assert_eq!(f.mailer.sent.lock().unwrap().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_stalled_welcome_does_not_hold_subscribe() {
    let store = Arc::new(InMemoryStore::new());
    let mailer = Arc::new(RecordingMailer {
        stall: true,
        ..RecordingMailer::default()
    });
    let subscriptions = SubscriptionService::new(store, mailer.clone(), EmailTemplates::default())
        .with_send_timeout(std::time::Duration::from_millis(50));

    let started = tokio::time::Instant::now();
    let subscriber = subscriptions.subscribe("a@x.com", None).await.unwrap();

    assert!(subscriber.is_active);
    assert_eq!(mailer.sent.lock().unwrap().len(), 1);
    assert!(started.elapsed() < std::time::Duration::from_secs(1));
    assert!(subscriptions.is_active("a@x.com").await.unwrap());
}

#[tokio::test]
async fn test_invalid_email_is_rejected() {
    let f = fixture();
    let err = f.subscriptions.subscribe("not-an-email", None).await.unwrap_err();
    assert!(matches!(err, DomainError::Validation(_)));
}
