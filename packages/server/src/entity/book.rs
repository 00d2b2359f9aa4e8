use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "books")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// Owning user. Every lookup filters on it.
    pub user_id: i32,

    pub title: String,
    /// Name the file was uploaded with.
    pub filename: String,
    /// Blob location; fixed at creation.
    pub file_path: String,
    pub file_size: i64,
    /// One of: pdf, epub, org, unknown
    pub format: String,

    #[sea_orm(default_value = 0)]
    pub current_page: i32,
    #[sea_orm(default_value = 0.0)]
    pub progress_percentage: f64,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
    /// Set on soft deletion.
    pub deleted_at: Option<DateTimeUtc>,
}

impl ActiveModelBehavior for ActiveModel {}
