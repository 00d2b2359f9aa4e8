use std::path::PathBuf;

use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::{Json, body::Body};
use common::book::{MAX_UPLOAD_SIZE, validate_upload};
use common::UploadRejection;
use tokio::io::AsyncWriteExt;
use tokio_util::io::ReaderStream;
use tracing::instrument;
use utoipa_axum::{router::OpenApiRouter, routes};
use uuid::Uuid;

use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::CallerId;
use crate::extractors::json::AppJson;
use crate::extractors::path::AppPath;
use crate::models::book::{
    BookListResponse, BookResponse, MessageResponse, UpdateProgressRequest,
    validate_progress_request,
};
use crate::service::{BookDownload, Upload};
use crate::state::AppState;

pub fn router() -> OpenApiRouter<AppState> {
    let upload = OpenApiRouter::new()
        .routes(routes!(upload_book))
        .layer(upload_body_limit());

    OpenApiRouter::new()
        .routes(routes!(list_books))
        .routes(routes!(get_book, delete_book))
        .routes(routes!(download_book))
        .routes(routes!(update_progress))
        .merge(upload)
}

/// Upload ceiling plus room for multipart framing.
pub fn upload_body_limit() -> DefaultBodyLimit {
    DefaultBodyLimit::max(MAX_UPLOAD_SIZE as usize + 1024 * 1024)
}

#[utoipa::path(
    post,
    path = "/upload",
    tag = "Books",
    operation_id = "uploadBook",
    summary = "Upload a book file",
    description = "Stores a PDF, EPUB or Org file for the caller. The `file` multipart field is required. \
        Title and format are derived from the uploaded filename. Files over 50 MB are rejected.",
    params(("X-User-ID" = i32, Header, description = "Caller's user ID")),
    request_body(content_type = "multipart/form-data", description = "Book file in the `file` field"),
    responses(
        (status = 201, description = "Book created", body = BookResponse),
        (status = 400, description = "Bad caller ID, missing file, or rejected file (VALIDATION_ERROR)", body = ErrorBody),
        (status = 500, description = "Storage or database failure (INTERNAL_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, caller, multipart), fields(user_id = caller.0))]
pub async fn upload_book(
    caller: CallerId,
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let mut spooled: Option<SpooledFile> = None;

    let received = async {
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::Validation(format!("Multipart error: {e}")))?
        {
            // Only the first `file` field is used.
            if field.name() != Some("file") || spooled.is_some() {
                continue;
            }
            let filename = field
                .file_name()
                .map(str::to_string)
                .ok_or_else(|| AppError::Validation("File field must have a filename".into()))?;
            spooled = Some(spool_field(field, filename).await?);
        }
        Ok::<(), AppError>(())
    }
    .await;

    let result = match (received, &spooled) {
        (Err(e), _) => Err(e),
        (Ok(()), None) => Err(AppError::Validation("Missing 'file' field".into())),
        (Ok(()), Some(file)) => match tokio::fs::File::open(&file.path).await {
            Ok(reader) => {
                state
                    .books
                    .upload(
                        caller.0,
                        Upload {
                            filename: file.filename.clone(),
                            declared_size: file.size,
                            reader: Box::new(reader),
                        },
                    )
                    .await
            }
            Err(e) => Err(AppError::Internal(format!(
                "Failed to reopen spooled upload: {e}"
            ))),
        },
    };

    if let Some(file) = spooled {
        // Best effort.
        let _ = tokio::fs::remove_file(&file.path).await;
    }

    let book = result?;
    Ok((StatusCode::CREATED, Json(BookResponse::from(book))))
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Books",
    operation_id = "listBooks",
    summary = "List the caller's books",
    description = "Returns every book owned by the caller, newest first.",
    params(("X-User-ID" = i32, Header, description = "Caller's user ID")),
    responses(
        (status = 200, description = "Book list", body = BookListResponse),
        (status = 400, description = "Missing or invalid caller ID (VALIDATION_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, caller), fields(user_id = caller.0))]
pub async fn list_books(
    caller: CallerId,
    State(state): State<AppState>,
) -> Result<Json<BookListResponse>, AppError> {
    let books = state.books.list(caller.0).await?;
    Ok(Json(books.into()))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Books",
    operation_id = "getBook",
    summary = "Get a book",
    params(
        ("id" = i32, Path, description = "Book ID"),
        ("X-User-ID" = i32, Header, description = "Caller's user ID"),
    ),
    responses(
        (status = 200, description = "Book details", body = BookResponse),
        (status = 404, description = "Book not found or not owned by the caller (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, caller), fields(user_id = caller.0))]
pub async fn get_book(
    caller: CallerId,
    State(state): State<AppState>,
    AppPath(id): AppPath<i32>,
) -> Result<Json<BookResponse>, AppError> {
    let book = state.books.get(id, caller.0).await?;
    Ok(Json(book.into()))
}

#[utoipa::path(
    get,
    path = "/{id}/download",
    tag = "Books",
    operation_id = "downloadBook",
    summary = "Download a book file",
    description = "Streams the stored file. Returns 404 FILE_MISSING when the book exists but its file is gone from storage.",
    params(
        ("id" = i32, Path, description = "Book ID"),
        ("X-User-ID" = i32, Header, description = "Caller's user ID"),
    ),
    responses(
        (status = 200, description = "File content"),
        (status = 404, description = "Book not found (NOT_FOUND) or file missing (FILE_MISSING)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, caller), fields(user_id = caller.0))]
pub async fn download_book(
    caller: CallerId,
    State(state): State<AppState>,
    AppPath(id): AppPath<i32>,
) -> Result<Response, AppError> {
    let BookDownload { book, reader } = state.books.open_download(id, caller.0).await?;

    let content_type = mime_guess::from_path(&book.filename).first_or_octet_stream();
    let body = Body::from_stream(ReaderStream::new(reader));

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type.as_ref())
        .header(header::CONTENT_LENGTH, book.file_size.to_string())
        .header(
            header::CONTENT_DISPOSITION,
            content_disposition_value(&book.filename),
        )
        .header(header::CACHE_CONTROL, "private, no-cache")
        .body(body)
        .map_err(|e| AppError::Internal(format!("Failed to build response: {e}")))
}

#[utoipa::path(
    put,
    path = "/{id}/progress",
    tag = "Books",
    operation_id = "updateProgress",
    summary = "Record reading progress",
    description = "Sets `current_page` and `progress_percentage`. No other field changes.",
    params(
        ("id" = i32, Path, description = "Book ID"),
        ("X-User-ID" = i32, Header, description = "Caller's user ID"),
    ),
    request_body = UpdateProgressRequest,
    responses(
        (status = 200, description = "Progress saved", body = MessageResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 404, description = "Book not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, caller, payload), fields(user_id = caller.0))]
pub async fn update_progress(
    caller: CallerId,
    State(state): State<AppState>,
    AppPath(id): AppPath<i32>,
    AppJson(payload): AppJson<UpdateProgressRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    validate_progress_request(&payload)?;

    state
        .books
        .update_progress(
            id,
            caller.0,
            payload.current_page,
            payload.progress_percentage,
        )
        .await?;

    Ok(Json(MessageResponse::new("Progress updated")))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Books",
    operation_id = "deleteBook",
    summary = "Delete a book",
    description = "Removes the book record, then its file. A file that cannot be removed is logged, not reported.",
    params(
        ("id" = i32, Path, description = "Book ID"),
        ("X-User-ID" = i32, Header, description = "Caller's user ID"),
    ),
    responses(
        (status = 200, description = "Book deleted", body = MessageResponse),
        (status = 404, description = "Book not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, caller), fields(user_id = caller.0))]
pub async fn delete_book(
    caller: CallerId,
    State(state): State<AppState>,
    AppPath(id): AppPath<i32>,
) -> Result<Json<MessageResponse>, AppError> {
    state.books.delete(id, caller.0).await?;
    Ok(Json(MessageResponse::new("Book deleted")))
}

/// A multipart file written to a local temp file.
struct SpooledFile {
    path: PathBuf,
    filename: String,
    size: u64,
}

/// Write a multipart field to a temp file, enforcing the upload ceiling while reading.
async fn spool_field(
    mut field: axum::extract::multipart::Field<'_>,
    filename: String,
) -> Result<SpooledFile, AppError> {
    // Refuse unsupported types before reading any content.
    validate_upload(&filename, 0)?;

    let temp_path = std::env::temp_dir().join(format!("reader-upload-{}", Uuid::new_v4()));

    let result = async {
        let mut temp_file = tokio::fs::File::create(&temp_path)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to create temp file: {e}")))?;

        let mut total_size: u64 = 0;

        while let Some(chunk) = field
            .chunk()
            .await
            .map_err(|e| AppError::Validation(format!("Upload read error: {e}")))?
        {
            total_size += chunk.len() as u64;
            if total_size > MAX_UPLOAD_SIZE {
                return Err(AppError::from(UploadRejection::TooLarge {
                    size: total_size,
                    limit: MAX_UPLOAD_SIZE,
                }));
            }
            temp_file
                .write_all(&chunk)
                .await
                .map_err(|e| AppError::Internal(format!("Temp file write failed: {e}")))?;
        }

        temp_file
            .flush()
            .await
            .map_err(|e| AppError::Internal(format!("Temp file flush failed: {e}")))?;

        Ok(total_size)
    }
    .await;

    match result {
        Ok(size) => Ok(SpooledFile {
            path: temp_path,
            filename,
            size,
        }),
        Err(e) => {
            // Best effort.
            let _ = tokio::fs::remove_file(&temp_path).await;
            Err(e)
        }
    }
}

/// Build a safe `Content-Disposition` header value.
fn content_disposition_value(filename: &str) -> String {
    let ascii_safe: String = filename
        .chars()
        .filter(|c| (c.is_ascii_graphic() || *c == ' ') && !matches!(c, '"' | ';' | '\\'))
        .collect();
    let ascii_name = if ascii_safe.trim().is_empty() {
        "download".to_string()
    } else {
        ascii_safe
    };

    // RFC 5987 percent-encoding for filename*.
    let encoded: String = filename
        .bytes()
        .map(|b| match b {
            b'A'..=b'Z'
            | b'a'..=b'z'
            | b'0'..=b'9'
            | b'!'
            | b'#'
            | b'$'
            | b'&'
            | b'+'
            | b'-'
            | b'.'
            | b'^'
            | b'_'
            | b'`'
            | b'|'
            | b'~' => String::from(b as char),
            _ => format!("%{b:02X}"),
        })
        .collect();

    format!("attachment; filename=\"{ascii_name}\"; filename*=UTF-8''{encoded}")
}
