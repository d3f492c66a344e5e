//! PostgreSQL repository implementations.

use async_trait::async_trait;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Select,
};
use uuid::Uuid;

use quill_core::domain::subscriber::mask_email;
use quill_core::domain::{Comment, CommentStatus, Post, Subscriber};
use quill_core::error::RepoError;
use quill_core::ports::{
    CommentRepository, PostOrder, PostQuery, PostRepository, PostTotals, SubscriberRepository,
};

use super::entity::comment::{self, Entity as CommentEntity};
use super::entity::post::{self, Entity as PostEntity};
use super::entity::subscriber::{self, Entity as SubscriberEntity};
use super::entity::count;
use super::postgres_base::{PostgresBaseRepository, db_error};

/// PostgreSQL post repository.
pub type PostgresPostRepository = PostgresBaseRepository<PostEntity>;

/// PostgreSQL comment repository.
pub type PostgresCommentRepository = PostgresBaseRepository<CommentEntity>;

/// PostgreSQL newsletter subscriber repository.
pub type PostgresSubscriberRepository = PostgresBaseRepository<SubscriberEntity>;

fn filtered(query: &PostQuery) -> Select<PostEntity> {
    let mut select = PostEntity::find();
    if query.published_only {
        select = select.filter(post::Column::IsPublished.eq(true));
    }
    if query.featured_only {
        select = select.filter(post::Column::IsFeatured.eq(true));
    }
    if let Some(topic) = &query.topic {
        select = select.filter(post::Column::BlogTopic.eq(topic.as_str()));
    }
    if let Some(since) = query.published_since {
        select = select.filter(post::Column::PublishedAt.gte(since));
    }
    select
}

fn ordered(select: Select<PostEntity>, order: PostOrder) -> Select<PostEntity> {
    match order {
        PostOrder::PublishedDesc => select
            .order_by_desc(post::Column::PublishedAt)
            .order_by_desc(post::Column::CreatedAt),
        PostOrder::CreatedDesc => select.order_by_desc(post::Column::CreatedAt),
        PostOrder::ViewsDesc => select
            .order_by_desc(post::Column::ViewCount)
            .order_by_desc(post::Column::PublishedAt),
    }
}

impl PostgresPostRepository {
    /// `counter = counter + 1` in a single statement, returning the new row.
    async fn bump(&self, id: Uuid, column: post::Column) -> Result<post::Model, RepoError> {
        let rows = PostEntity::update_many()
            .col_expr(column, Expr::col(column).add(1))
            .filter(post::Column::Id.eq(id))
            .exec_with_returning(&self.db)
            .await
            .map_err(db_error)?;

        rows.into_iter().next().ok_or(RepoError::NotFound)
    }
}

#[async_trait]
impl PostRepository for PostgresPostRepository {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Post>, RepoError> {
        let result = PostEntity::find()
            .filter(post::Column::Slug.eq(slug))
            .one(&self.db)
            .await
            .map_err(db_error)?;

        Ok(result.map(Into::into))
    }

    async fn list(&self, query: &PostQuery) -> Result<(Vec<Post>, u64), RepoError> {
        let total = filtered(query).count(&self.db).await.map_err(db_error)?;

        let rows = ordered(filtered(query), query.order)
            .offset(query.offset)
            .limit(query.limit)
            .all(&self.db)
            .await
            .map_err(db_error)?;

        Ok((rows.into_iter().map(Into::into).collect(), total))
    }

    async fn search(&self, text: &str, limit: u64) -> Result<Vec<Post>, RepoError> {
        tracing::debug!(query = %text, "Searching posts");

        // `search_vector` is a generated tsvector over title, excerpt and content.
        let rows = PostEntity::find()
            .filter(post::Column::IsPublished.eq(true))
            .filter(Expr::cust_with_values(
                "search_vector @@ plainto_tsquery('english', $1)",
                [text],
            ))
            .order_by_desc(post::Column::PublishedAt)
            .limit(limit)
            .all(&self.db)
            .await
            .map_err(db_error)?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn increment_views(&self, id: Uuid) -> Result<u64, RepoError> {
        let row = self.bump(id, post::Column::ViewCount).await?;
        Ok(count(row.view_count))
    }

    async fn increment_likes(&self, id: Uuid) -> Result<u64, RepoError> {
        let row = self.bump(id, post::Column::LikesCount).await?;
        Ok(count(row.likes_count))
    }

    async fn increment_comments(&self, id: Uuid) -> Result<u64, RepoError> {
        let row = self.bump(id, post::Column::CommentsCount).await?;
        Ok(count(row.comments_count))
    }

    async fn totals(&self) -> Result<PostTotals, RepoError> {
        let total = PostEntity::find().count(&self.db).await.map_err(db_error)?;
        let published = PostEntity::find()
            .filter(post::Column::IsPublished.eq(true))
            .count(&self.db)
            .await
            .map_err(db_error)?;
        let total_views: Option<i64> = PostEntity::find()
            .select_only()
            .column_as(
                Expr::cust("COALESCE(SUM(view_count), 0)::bigint"),
                "total_views",
            )
            .into_tuple()
            .one(&self.db)
            .await
            .map_err(db_error)?;

        Ok(PostTotals {
            total,
            published,
            total_views: total_views.map(count).unwrap_or_default(),
        })
    }
}

#[async_trait]
impl CommentRepository for PostgresCommentRepository {
    async fn list_for_post(
        &self,
        post_id: Uuid,
        status: CommentStatus,
    ) -> Result<Vec<Comment>, RepoError> {
        let rows = CommentEntity::find()
            .filter(comment::Column::BlogId.eq(post_id))
            .filter(comment::Column::Status.eq(status.as_str()))
            .order_by_asc(comment::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(db_error)?;

        Ok(rows.into_iter().map(Into::into).collect())
    }
}

#[async_trait]
impl SubscriberRepository for PostgresSubscriberRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<Subscriber>, RepoError> {
        tracing::debug!(subscriber_email = %mask_email(email), "Finding subscriber by email");

        let result = SubscriberEntity::find()
            .filter(subscriber::Column::Email.eq(email))
            .one(&self.db)
            .await
            .map_err(db_error)?;

        Ok(result.map(Into::into))
    }

    async fn list_active(&self) -> Result<Vec<Subscriber>, RepoError> {
        let rows = SubscriberEntity::find()
            .filter(subscriber::Column::IsActive.eq(true))
            .order_by_asc(subscriber::Column::SubscribedAt)
            .all(&self.db)
            .await
            .map_err(db_error)?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn count_active(&self) -> Result<u64, RepoError> {
        SubscriberEntity::find()
            .filter(subscriber::Column::IsActive.eq(true))
            .count(&self.db)
            .await
            .map_err(db_error)
    }
}
