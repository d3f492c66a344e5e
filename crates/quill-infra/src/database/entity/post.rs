//! Post entity for SeaORM, backed by the `blogs` table.

use sea_orm::{NotSet, Set};
use sea_orm::entity::prelude::*;

use super::{count, stored_count};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "blogs")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub title: String,
    #[sea_orm(unique)]
    pub slug: String,
    #[sea_orm(column_type = "Text")]
    pub content: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub excerpt: Option<String>,
    pub blog_topic: String,
    pub tags: Vec<String>,
    pub featured_image: Option<String>,
    pub author_name: String,
    pub is_published: bool,
    pub is_featured: bool,
    pub view_count: i64,
    pub likes_count: i64,
    pub comments_count: i64,
    pub reading_time: i32,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
    pub published_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::comment::Entity")]
    Comment,
}

impl Related<super::comment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Comment.def()
    }
}

#[async_trait::async_trait]
impl ActiveModelBehavior for ActiveModel {
    /// Counters are written only by `col = col + 1` statements; an edit
    /// leaves them out of the UPDATE.
    async fn before_save<C>(mut self, _db: &C, insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        if !insert {
            self.view_count = NotSet;
            self.likes_count = NotSet;
            self.comments_count = NotSet;
        }
        Ok(self)
    }
}

/// Conversion from SeaORM Model to Domain Post.
impl From<Model> for quill_core::domain::Post {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            title: model.title,
            slug: model.slug,
            content: model.content,
            excerpt: model.excerpt,
            topic: model.blog_topic,
            tags: model.tags,
            featured_image: model.featured_image,
            author_name: model.author_name,
            is_published: model.is_published,
            is_featured: model.is_featured,
            view_count: count(model.view_count),
            like_count: count(model.likes_count),
            comment_count: count(model.comments_count),
            reading_time_minutes: u32::try_from(model.reading_time).unwrap_or(1),
            created_at: model.created_at.into(),
            updated_at: model.updated_at.into(),
            published_at: model.published_at.map(Into::into),
        }
    }
}

/// Conversion from Domain Post to SeaORM ActiveModel.
impl From<quill_core::domain::Post> for ActiveModel {
    fn from(post: quill_core::domain::Post) -> Self {
        Self {
            id: Set(post.id),
            title: Set(post.title),
            slug: Set(post.slug),
            content: Set(post.content),
            excerpt: Set(post.excerpt),
            blog_topic: Set(post.topic),
            tags: Set(post.tags),
            featured_image: Set(post.featured_image),
            author_name: Set(post.author_name),
            is_published: Set(post.is_published),
            is_featured: Set(post.is_featured),
            view_count: Set(stored_count(post.view_count)),
            likes_count: Set(stored_count(post.like_count)),
            comments_count: Set(stored_count(post.comment_count)),
            reading_time: Set(i32::try_from(post.reading_time_minutes).unwrap_or(i32::MAX)),
            created_at: Set(post.created_at.into()),
            updated_at: Set(post.updated_at.into()),
            published_at: Set(post.published_at.map(Into::into)),
        }
    }
}
