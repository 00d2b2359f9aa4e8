use sea_orm::*;
use sea_orm::sea_query::{Index, PostgresQueryBuilder};
use tracing::info;

use crate::entity::book;

/// Create secondary indexes the schema sync does not manage.
pub async fn ensure_indexes(db: &DatabaseConnection) -> Result<(), DbErr> {
    // Owner-scoped listing and lookups:
    // SELECT ... FROM books WHERE user_id = ? AND deleted_at IS NULL
    let stmt = Index::create()
        .if_not_exists()
        .name("idx_book_user_deleted")
        .table(book::Entity)
        .col(book::Column::UserId)
        .col(book::Column::DeletedAt)
        .to_string(PostgresQueryBuilder);

    match db.execute_unprepared(&stmt).await {
        Ok(_) => {
            info!("Ensured index idx_book_user_deleted exists");
        }
        Err(e) => {
            tracing::warn!("Failed to create index idx_book_user_deleted: {}", e);
        }
    }

    Ok(())
}
