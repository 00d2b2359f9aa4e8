use axum::{extract::FromRequestParts, http::request::Parts};

use crate::error::AppError;

/// Header carrying the caller's user ID.
pub const USER_ID_HEADER: &str = "X-User-ID";

/// Identity of the caller, taken from the `X-User-ID` header.
///
/// The header is trusted as-is. No credential backs it; any client can claim
/// any ID. Every book operation is scoped by this value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallerId(pub i32);

impl CallerId {
    fn parse(raw: &str) -> Option<Self> {
        raw.trim()
            .parse::<i32>()
            .ok()
            .filter(|id| *id > 0)
            .map(CallerId)
    }
}

impl<S> FromRequestParts<S> for CallerId
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(CallerId::parse)
            .ok_or_else(|| AppError::Validation("Missing or invalid X-User-ID header".into()))
    }
}
