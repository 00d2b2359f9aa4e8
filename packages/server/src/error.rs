use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use common::UploadRejection;
use common::storage::StorageError;
use sea_orm::DbErr;
use serde::Serialize;

use crate::store::StoreError;

/// Structured error response returned by all endpoints on failure.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ErrorBody {
    /// Machine-readable error code. One of: `VALIDATION_ERROR`,
    /// `INVALID_CREDENTIALS`, `NOT_FOUND`, `FILE_MISSING`, `EMAIL_TAKEN`,
    /// `INTERNAL_ERROR`.
    #[schema(example = "VALIDATION_ERROR")]
    pub code: &'static str,
    /// Human-readable error description.
    #[schema(example = "File type not allowed. Allowed types: .pdf,.epub,.org")]
    pub message: String,
}

/// Application-level error type.
#[derive(Debug)]
pub enum AppError {
    Validation(String),
    InvalidCredentials,
    NotFound(String),
    /// The book row exists but its blob is gone from storage.
    BlobMissing,
    EmailTaken,
    Internal(String),
}

impl AppError {
    pub fn book_not_found() -> Self {
        AppError::NotFound("Book not found".into())
    }

    /// Machine-readable code, as sent in [`ErrorBody::code`].
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::InvalidCredentials => "INVALID_CREDENTIALS",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::BlobMissing => "FILE_MISSING",
            AppError::EmailTaken => "EMAIL_TAKEN",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    fn status_and_body(self) -> (StatusCode, ErrorBody) {
        let code = self.code();
        let (status, message) = match self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                "Invalid email or password".into(),
            ),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::BlobMissing => (
                StatusCode::NOT_FOUND,
                "Book file not found in storage".into(),
            ),
            AppError::EmailTaken => (StatusCode::CONFLICT, "Email is already in use".into()),
            AppError::Internal(detail) => {
                tracing::error!("Internal error: {}", detail);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An unexpected error occurred".into(),
                )
            }
        };
        (status, ErrorBody { code, message })
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = self.status_and_body();
        (status, Json(body)).into_response()
    }
}

impl From<DbErr> for AppError {
    fn from(err: DbErr) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => AppError::NotFound("Record not found".into()),
            // The only unique key a caller can collide with is `users.email`.
            StoreError::Conflict(_) => AppError::EmailTaken,
            StoreError::Db(e) => AppError::from(e),
        }
    }
}

impl From<UploadRejection> for AppError {
    fn from(rejection: UploadRejection) -> Self {
        AppError::Validation(rejection.to_string())
    }
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::SizeLimitExceeded { actual, limit } => {
                AppError::from(UploadRejection::TooLarge {
                    size: actual,
                    limit,
                })
            }
            StorageError::NotFound(_) => AppError::BlobMissing,
            other => AppError::Internal(other.to_string()),
        }
    }
}
