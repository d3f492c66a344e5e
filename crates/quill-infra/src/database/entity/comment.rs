//! Comment entity for SeaORM, backed by the `blog_comments` table.

use sea_orm::Set;
use sea_orm::entity::prelude::*;

use quill_core::domain::CommentStatus;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "blog_comments")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub blog_id: Uuid,
    pub parent_id: Option<Uuid>,
    pub author_name: String,
    pub author_email: String,
    #[sea_orm(column_type = "Text")]
    pub content: String,
    pub status: String,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::post::Entity",
        from = "Column::BlogId",
        to = "super::post::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    Post,
}

impl Related<super::post::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Post.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for quill_core::domain::Comment {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            post_id: model.blog_id,
            parent_id: model.parent_id,
            author_name: model.author_name,
            author_email: model.author_email,
            content: model.content,
            // Rows written before moderation existed carry no usable status.
            status: model.status.parse().unwrap_or(CommentStatus::Pending),
            created_at: model.created_at.into(),
        }
    }
}

impl From<quill_core::domain::Comment> for ActiveModel {
    fn from(comment: quill_core::domain::Comment) -> Self {
        Self {
            id: Set(comment.id),
            blog_id: Set(comment.post_id),
            parent_id: Set(comment.parent_id),
            author_name: Set(comment.author_name),
            author_email: Set(comment.author_email),
            content: Set(comment.content),
            status: Set(comment.status.as_str().to_string()),
            created_at: Set(comment.created_at.into()),
        }
    }
}
