use async_trait::async_trait;
use chrono::Utc;
use common::BookFormat;
use common::storage::StoragePath;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    Select, Set, sea_query::Expr,
};

use super::error::StoreError;
use crate::entity::book;

/// Metadata for a book whose blob has already been written.
#[derive(Debug, Clone)]
pub struct NewBook {
    pub user_id: i32,
    pub title: String,
    pub filename: String,
    pub file_path: StoragePath,
    pub file_size: i64,
    pub format: BookFormat,
}

/// Owner-scoped CRUD over book rows.
#[async_trait]
pub trait BookStore: Send + Sync {
    async fn create(&self, book: NewBook) -> Result<book::Model, StoreError>;

    /// Fails with `NotFound` unless the row exists and belongs to `owner_id`.
    async fn find_by_id(&self, id: i32, owner_id: i32) -> Result<book::Model, StoreError>;

    /// Newest first.
    async fn find_all_by_owner(&self, owner_id: i32) -> Result<Vec<book::Model>, StoreError>;

    /// Soft-delete. Zero rows affected is `NotFound`.
    async fn delete(&self, id: i32, owner_id: i32) -> Result<(), StoreError>;

    /// Touches only the progress columns. Zero rows affected is `NotFound`.
    async fn update_progress(
        &self,
        id: i32,
        owner_id: i32,
        current_page: i32,
        progress_percentage: f64,
    ) -> Result<(), StoreError>;
}

pub struct SeaOrmBookStore {
    db: DatabaseConnection,
}

impl SeaOrmBookStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

fn live_books() -> Select<book::Entity> {
    book::Entity::find().filter(book::Column::DeletedAt.is_null())
}

#[async_trait]
impl BookStore for SeaOrmBookStore {
    async fn create(&self, new_book: NewBook) -> Result<book::Model, StoreError> {
        let now = Utc::now();
        let model = book::ActiveModel {
            user_id: Set(new_book.user_id),
            title: Set(new_book.title),
            filename: Set(new_book.filename),
            file_path: Set(new_book.file_path.into_string()),
            file_size: Set(new_book.file_size),
            format: Set(new_book.format.as_str().to_string()),
            current_page: Set(0),
            progress_percentage: Set(0.0),
            created_at: Set(now),
            updated_at: Set(now),
            deleted_at: Set(None),
            ..Default::default()
        };

        Ok(model.insert(&self.db).await?)
    }

    async fn find_by_id(&self, id: i32, owner_id: i32) -> Result<book::Model, StoreError> {
        live_books()
            .filter(book::Column::Id.eq(id))
            .filter(book::Column::UserId.eq(owner_id))
            .one(&self.db)
            .await?
            .ok_or(StoreError::NotFound)
    }

    async fn find_all_by_owner(&self, owner_id: i32) -> Result<Vec<book::Model>, StoreError> {
        Ok(live_books()
            .filter(book::Column::UserId.eq(owner_id))
            .order_by_desc(book::Column::CreatedAt)
            .order_by_desc(book::Column::Id)
            .all(&self.db)
            .await?)
    }

    async fn delete(&self, id: i32, owner_id: i32) -> Result<(), StoreError> {
        let now = Utc::now();
        let result = book::Entity::update_many()
            .col_expr(book::Column::DeletedAt, Expr::value(Some(now)))
            .col_expr(book::Column::UpdatedAt, Expr::value(now))
            .filter(book::Column::Id.eq(id))
            .filter(book::Column::UserId.eq(owner_id))
            .filter(book::Column::DeletedAt.is_null())
            .exec(&self.db)
            .await?;

        if result.rows_affected == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn update_progress(
        &self,
        id: i32,
        owner_id: i32,
        current_page: i32,
        progress_percentage: f64,
    ) -> Result<(), StoreError> {
        let result = book::Entity::update_many()
            .col_expr(book::Column::CurrentPage, Expr::value(current_page))
            .col_expr(
                book::Column::ProgressPercentage,
                Expr::value(progress_percentage),
            )
            .col_expr(book::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(book::Column::Id.eq(id))
            .filter(book::Column::UserId.eq(owner_id))
            .filter(book::Column::DeletedAt.is_null())
            .exec(&self.db)
            .await?;

        if result.rows_affected == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}
