use async_trait::async_trait;
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveModelBehavior, ActiveValue::Set};

use crate::library::{Category, LibraryItem};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "library_item")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub spotify_id: String,
    #[sea_orm(primary_key, auto_increment = false)]
    pub category: Category,
    pub name: String,
    pub created_at: i64,
    pub updated_at: i64,
    pub synced_at: i64,
}

impl From<Model> for LibraryItem {
    fn from(model: Model) -> Self {
        LibraryItem::new(model.category, model.spotify_id, model.name)
    }
}

impl ActiveModel {
    /// A new row for an item that was just confirmed on both sides.
    pub fn from_item(item: &LibraryItem) -> Self {
        Self {
            spotify_id: Set(item.id().to_string()),
            category: Set(item.category()),
            name: Set(item.display_name().to_string()),
            ..<Self as ActiveModelBehavior>::new()
        }
    }
}

#[async_trait]
impl ActiveModelBehavior for ActiveModel {
    fn new() -> Self {
        let now = chrono::Utc::now().timestamp();
        Self {
            created_at: Set(now),
            updated_at: Set(now),
            synced_at: Set(now),
            ..ActiveModelTrait::default()
        }
    }

    async fn before_save<C>(mut self, _db: &C, insert: bool) -> Result<Self, sea_orm::DbErr>
    where
        C: ConnectionTrait,
    {
        if !insert {
            self.updated_at = Set(chrono::Utc::now().timestamp());
        }
        Ok(self)
    }
}
