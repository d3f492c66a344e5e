//! Newsletter subscriber entity for SeaORM.

use sea_orm::Set;
use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "newsletter_subscribers")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub email: String,
    pub name: Option<String>,
    pub source: String,
    pub is_active: bool,
    pub subscribed_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for quill_core::domain::Subscriber {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            email: model.email,
            name: model.name,
            source: model.source,
            is_active: model.is_active,
            created_at: model.subscribed_at.into(),
        }
    }
}

impl From<quill_core::domain::Subscriber> for ActiveModel {
    fn from(subscriber: quill_core::domain::Subscriber) -> Self {
        Self {
            id: Set(subscriber.id),
            email: Set(subscriber.email),
            name: Set(subscriber.name),
            source: Set(subscriber.source),
            is_active: Set(subscriber.is_active),
            subscribed_at: Set(subscriber.created_at.into()),
        }
    }
}
