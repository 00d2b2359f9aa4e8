use chrono::{DateTime, Utc};
use common::BookFormat;
use serde::{Deserialize, Serialize};

use crate::entity::book;
use crate::error::AppError;

/// Response DTO for a single book.
#[derive(Serialize, utoipa::ToSchema)]
pub struct BookResponse {
    #[schema(example = 12)]
    pub id: i32,
    /// Owning user.
    #[schema(example = 7)]
    pub user_id: i32,
    /// Upload name without its extension.
    #[schema(example = "notes")]
    pub title: String,
    /// Original upload filename.
    #[schema(example = "notes.epub")]
    pub filename: String,
    /// Server-side storage location.
    #[schema(example = "uploads/books/7/0b9c5a0e-3f7e-4a52-9a7c-2f5d0f1b6c11_1760000000.epub")]
    pub file_path: String,
    /// Size in bytes.
    #[schema(example = 1000)]
    pub file_size: i64,
    pub format: BookFormat,
    #[schema(example = 0)]
    pub current_page: i32,
    #[schema(example = 0.0)]
    pub progress_percentage: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<book::Model> for BookResponse {
    fn from(model: book::Model) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            title: model.title,
            filename: model.filename,
            file_path: model.file_path,
            file_size: model.file_size,
            format: model.format.parse().unwrap_or(BookFormat::Unknown),
            current_page: model.current_page,
            progress_percentage: model.progress_percentage,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// Response DTO for listing a user's books.
#[derive(Serialize, utoipa::ToSchema)]
pub struct BookListResponse {
    pub books: Vec<BookResponse>,
    pub total: usize,
}

impl From<Vec<book::Model>> for BookListResponse {
    fn from(models: Vec<book::Model>) -> Self {
        let books: Vec<BookResponse> = models.into_iter().map(BookResponse::from).collect();
        Self {
            total: books.len(),
            books,
        }
    }
}

/// Request body for recording reading progress.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct UpdateProgressRequest {
    /// Page the reader is on (0 = not started).
    #[schema(example = 5)]
    pub current_page: i32,
    /// Share of the book read, 0-100.
    #[schema(example = 42.5)]
    pub progress_percentage: f64,
}

pub fn validate_progress_request(payload: &UpdateProgressRequest) -> Result<(), AppError> {
    if payload.current_page < 0 {
        return Err(AppError::Validation(
            "current_page must not be negative".into(),
        ));
    }
    if !(0.0..=100.0).contains(&payload.progress_percentage) {
        return Err(AppError::Validation(
            "progress_percentage must be between 0 and 100".into(),
        ));
    }
    Ok(())
}

/// Plain acknowledgement.
#[derive(Serialize, utoipa::ToSchema)]
pub struct MessageResponse {
    #[schema(example = "Book deleted")]
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
