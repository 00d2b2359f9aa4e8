use axum::{
    extract::{FromRequestParts, Path, rejection::PathRejection},
    http::request::Parts,
};
use serde::de::DeserializeOwned;

use crate::error::AppError;

/// `Path<T>` whose rejections become `VALIDATION_ERROR` bodies instead of plain text.
pub struct AppPath<T>(pub T);

impl<S, T> FromRequestParts<S> for AppPath<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(value) = Path::<T>::from_request_parts(parts, state)
            .await
            .map_err(rejection_message)
            .map_err(AppError::Validation)?;
        Ok(AppPath(value))
    }
}

fn rejection_message(rejection: PathRejection) -> String {
    match rejection {
        PathRejection::FailedToDeserializePathParams(e) => {
            format!("Invalid path parameter: {}", e.body_text())
        }
        other => other.body_text(),
    }
}
