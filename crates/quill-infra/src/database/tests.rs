use std::collections::BTreeMap;

use chrono::Utc;
use sea_orm::{DatabaseBackend, DbErr, MockDatabase, MockExecResult, Value};
use uuid::Uuid;

use quill_core::domain::{Comment, CommentStatus, Post, Subscriber};
use quill_core::error::RepoError;
use quill_core::ports::{
    BaseRepository, CommentRepository, PostRepository, SubscriberRepository,
};

use super::entity::{comment, post, subscriber};
use super::postgres_base::db_error;
use super::postgres_repo::{
    PostgresCommentRepository, PostgresPostRepository, PostgresSubscriberRepository,
};

fn post_model(id: Uuid, likes: i64) -> post::Model {
    let now = Utc::now();
    post::Model {
        id,
        title: "Test Post".to_owned(),
        slug: "test-post".to_owned(),
        content: "Content".to_owned(),
        excerpt: None,
        blog_topic: "Rust".to_owned(),
        tags: vec!["async".to_owned()],
        featured_image: None,
        author_name: "Quill".to_owned(),
        is_published: true,
        is_featured: false,
        view_count: 12,
        likes_count: likes,
        comments_count: 0,
        reading_time: 4,
        created_at: now.into(),
        updated_at: now.into(),
        published_at: Some(now.into()),
    }
}

#[tokio::test]
async fn test_find_post_by_id() {
    let post_id = Uuid::new_v4();

    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results(vec![vec![post_model(post_id, 3)]])
        .into_connection();

    let repo = PostgresPostRepository::new(db);

    let result: Option<Post> = repo.find_by_id(post_id).await.unwrap();

    let post = result.unwrap();
    assert_eq!(post.id, post_id);
    assert_eq!(post.topic, "Rust");
    assert_eq!(post.like_count, 3);
    assert_eq!(post.view_count, 12);
    assert_eq!(post.reading_time_minutes, 4);
}

#[tokio::test]
async fn test_increment_likes_returns_stored_count() {
    let post_id = Uuid::new_v4();

    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results(vec![vec![post_model(post_id, 8)]])
        .into_connection();

    let repo = PostgresPostRepository::new(db);

    assert_eq!(repo.increment_likes(post_id).await.unwrap(), 8);
}

#[tokio::test]
async fn test_increment_unknown_post() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results(vec![Vec::<post::Model>::new()])
        .into_connection();

    let repo = PostgresPostRepository::new(db);

    let result = repo.increment_views(Uuid::new_v4()).await;
    assert!(matches!(result, Err(RepoError::NotFound)));
}

/// Whether a logged UPDATE assigns `column`; Debug output escapes the quotes.
fn assigns(log: &str, column: &str) -> bool {
    log.contains(&format!("\\\"{column}\\\" ="))
}

#[tokio::test]
async fn test_update_post_leaves_counters_alone() {
    let post_id = Uuid::new_v4();

    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results(vec![vec![post_model(post_id, 5)]])
        .into_connection();

    let repo = PostgresPostRepository::new(db);

    // A stale copy read before concurrent increments.
    let mut edited: Post = post_model(post_id, 0).into();
    edited.view_count = 0;
    edited.title = "Edited title".to_owned();

    let saved = BaseRepository::<Post, Uuid>::update(&repo, edited).await.unwrap();
    assert_eq!(saved.like_count, 5);
    assert_eq!(saved.view_count, 12);

    let log = format!("{:?}", repo.db.into_transaction_log());
    assert!(assigns(&log, "title"));
    assert!(!assigns(&log, "view_count"));
    assert!(!assigns(&log, "likes_count"));
    assert!(!assigns(&log, "comments_count"));
}

#[tokio::test]
async fn test_delete_missing_post() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_exec_results(vec![MockExecResult {
            last_insert_id: 0,
            rows_affected: 0,
        }])
        .into_connection();

    let repo = PostgresPostRepository::new(db);

    let result = BaseRepository::<Post, Uuid>::delete(&repo, Uuid::new_v4()).await;
    assert!(matches!(result, Err(RepoError::NotFound)));
}

#[tokio::test]
async fn test_list_comments_maps_columns() {
    let post_id = Uuid::new_v4();
    let parent_id = Uuid::new_v4();

    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results(vec![vec![comment::Model {
            id: Uuid::new_v4(),
            blog_id: post_id,
            parent_id: Some(parent_id),
            author_name: "Ada".to_owned(),
            author_email: "ada@example.com".to_owned(),
            content: "Nice post".to_owned(),
            status: "approved".to_owned(),
            created_at: Utc::now().into(),
        }]])
        .into_connection();

    let repo = PostgresCommentRepository::new(db);

    let comments: Vec<Comment> = repo
        .list_for_post(post_id, CommentStatus::Approved)
        .await
        .unwrap();

    assert_eq!(comments.len(), 1);
    assert_eq!(comments[0].post_id, post_id);
    assert_eq!(comments[0].parent_id, Some(parent_id));
    assert_eq!(comments[0].status, CommentStatus::Approved);
}

#[tokio::test]
async fn test_find_subscriber_by_email() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results(vec![vec![subscriber::Model {
            id: Uuid::new_v4(),
            email: "reader@example.com".to_owned(),
            name: None,
            source: "blog".to_owned(),
            is_active: false,
            subscribed_at: Utc::now().into(),
        }]])
        .into_connection();

    let repo = PostgresSubscriberRepository::new(db);

    let found: Subscriber = repo
        .find_by_email("reader@example.com")
        .await
        .unwrap()
        .unwrap();
    assert!(!found.is_active);
    assert_eq!(found.source, "blog");
}

#[tokio::test]
async fn test_count_active_subscribers() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results(vec![vec![BTreeMap::from([(
            "num_items",
            Value::BigInt(Some(3)),
        )])]])
        .into_connection();

    let repo = PostgresSubscriberRepository::new(db);

    assert_eq!(repo.count_active().await.unwrap(), 3);
}

#[test]
fn test_db_error_classification() {
    assert!(matches!(
        db_error(DbErr::RecordNotUpdated),
        RepoError::NotFound
    ));
    assert!(matches!(
        db_error(DbErr::Custom(
            "new row violates row-level security policy".to_owned()
        )),
        RepoError::PermissionDenied(_)
    ));
    assert!(matches!(
        db_error(DbErr::Custom("syntax error".to_owned())),
        RepoError::Query(_)
    ));
}
