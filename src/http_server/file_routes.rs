//! File HTTP Routes
//!
//! Upload, listing, preview, download and delete of the caller's own files.
//! A file id that is malformed, missing or someone else's gets the same 404.

use std::sync::Arc;

use axum::{
    extract::{multipart::MultipartError, DefaultBodyLimit, Multipart, Path, Query, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use serde::Serialize;
use uuid::Uuid;

use super::state::AppState;
use crate::auth::errors::AuthError;
use crate::file_storage::errors::StorageError;
use crate::file_storage::file::{FileMetadata, FileObject, FileQuery, NewFile};

/// Multipart field carrying uploaded files
const UPLOAD_FIELD: &str = "files";

/// Room for multipart boundaries and headers per file
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Whole-request cap: a full batch of files at the per-file limit
fn upload_body_limit(state: &AppState) -> usize {
    let per_file = usize::try_from(state.files.max_upload_bytes())
        .unwrap_or(usize::MAX)
        .saturating_add(MULTIPART_OVERHEAD);
    per_file.saturating_mul(state.files.max_files_per_upload())
}

/// File routes with shared state
pub fn file_routes(state: Arc<AppState>) -> Router {
    let body_limit = upload_body_limit(&state);

    Router::new()
        .route("/api/files", get(list_files_handler))
        .route(
            "/api/files/upload",
            post(upload_files_handler).layer(DefaultBodyLimit::max(body_limit)),
        )
        .route("/api/files/:file_id/preview", get(preview_file_handler))
        .route("/api/files/:file_id/download", get(download_file_handler))
        .route("/api/files/:file_id", delete(delete_file_handler))
        .with_state(state)
}

// ==================
// Request/Response Types
// ==================

#[derive(Debug, Serialize)]
pub struct FilesResponse {
    pub files: Vec<FileMetadata>,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

type ApiError = (StatusCode, Json<MessageResponse>);

fn message(status: StatusCode, text: impl Into<String>) -> ApiError {
    (status, Json(MessageResponse { message: text.into() }))
}

fn storage_error(err: StorageError) -> ApiError {
    if err.status_code() >= 500 {
        tracing::error!(error = %err, "file request failed");
    }
    let status = StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    message(status, err.public_message())
}

fn auth_error(err: AuthError) -> ApiError {
    if err.is_client_error() {
        message(StatusCode::UNAUTHORIZED, "Unauthorized")
    } else {
        tracing::error!(error = %err, "session lookup failed");
        message(StatusCode::INTERNAL_SERVER_ERROR, err.public_message())
    }
}

fn multipart_error(err: MultipartError) -> ApiError {
    message(err.status(), err.body_text())
}

fn parse_file_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| storage_error(StorageError::NotFound))
}

/// Quote a name for `Content-Disposition`, dropping what can't be carried
fn attachment_disposition(name: &str) -> HeaderValue {
    let safe: String = name
        .chars()
        .filter(|c| c.is_ascii() && !c.is_ascii_control() && *c != '"' && *c != '\\')
        .collect();
    let safe = if safe.trim().is_empty() { "download".to_string() } else { safe };

    HeaderValue::from_str(&format!("attachment; filename=\"{}\"", safe))
        .unwrap_or_else(|_| HeaderValue::from_static("attachment"))
}

fn file_body(file: FileObject, disposition: Option<HeaderValue>) -> Response {
    let content_type = HeaderValue::from_str(&file.metadata.mime_type)
        .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream"));

    let mut headers = HeaderMap::new();
    headers.insert(header::CONTENT_TYPE, content_type);
    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(file.data.len() as u64));
    if let Some(disposition) = disposition {
        headers.insert(header::CONTENT_DISPOSITION, disposition);
    }

    (StatusCode::OK, headers, file.data).into_response()
}

// ==================
// Handlers
// ==================

async fn list_files_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<FileQuery>,
) -> Result<Json<FilesResponse>, ApiError> {
    let owner_id = state.require_user(&headers).map_err(auth_error)?;
    let files = state.files.search(owner_id, &query).map_err(storage_error)?;
    Ok(Json(FilesResponse { files }))
}

async fn upload_files_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<FilesResponse>), ApiError> {
    let owner_id = state.require_user(&headers).map_err(auth_error)?;

    let max_file_bytes = state.files.max_upload_bytes();
    let max_files = state.files.max_files_per_upload();

    let mut pending = Vec::new();
    while let Some(mut field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        if pending.len() == max_files {
            return Err(message(
                StatusCode::BAD_REQUEST,
                format!("At most {} files per upload", max_files),
            ));
        }

        let original_name = field.file_name().unwrap_or("unnamed").to_string();
        let mime_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();

        // Stop reading a field as soon as it passes the per-file limit
        let mut data = Vec::new();
        while let Some(chunk) = field.chunk().await.map_err(multipart_error)? {
            let size = (data.len() + chunk.len()) as u64;
            if size > max_file_bytes {
                return Err(storage_error(StorageError::FileTooLarge(size, max_file_bytes)));
            }
            data.extend_from_slice(&chunk);
        }

        pending.push(NewFile::new(original_name, mime_type, data));
    }

    if pending.is_empty() {
        return Err(message(StatusCode::BAD_REQUEST, "No files provided"));
    }

    let files = state
        .files
        .create_all(owner_id, pending)
        .map_err(storage_error)?
        .into_iter()
        .map(|file| file.metadata)
        .collect();

    Ok((StatusCode::CREATED, Json(FilesResponse { files })))
}

async fn preview_file_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(file_id): Path<String>,
) -> Result<Response, ApiError> {
    let owner_id = state.require_user(&headers).map_err(auth_error)?;
    let file_id = parse_file_id(&file_id)?;

    let file = state.files.fetch(file_id, owner_id).map_err(storage_error)?;
    Ok(file_body(file, None))
}

async fn download_file_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(file_id): Path<String>,
) -> Result<Response, ApiError> {
    let owner_id = state.require_user(&headers).map_err(auth_error)?;
    let file_id = parse_file_id(&file_id)?;

    let file = state.files.fetch(file_id, owner_id).map_err(storage_error)?;
    let disposition = attachment_disposition(&file.metadata.original_name);
    Ok(file_body(file, Some(disposition)))
}

async fn delete_file_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(file_id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let owner_id = state.require_user(&headers).map_err(auth_error)?;
    let file_id = parse_file_id(&file_id)?;

    if !state.files.delete(file_id, owner_id).map_err(storage_error)? {
        return Err(storage_error(StorageError::NotFound));
    }

    Ok(Json(MessageResponse {
        message: "File deleted successfully".to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attachment_disposition() {
        assert_eq!(
            attachment_disposition("report.pdf").to_str().unwrap(),
            "attachment; filename=\"report.pdf\""
        );
        assert_eq!(
            attachment_disposition("we\"ird\r\n.txt").to_str().unwrap(),
            "attachment; filename=\"weird.txt\""
        );
        assert_eq!(
            attachment_disposition("日本").to_str().unwrap(),
            "attachment; filename=\"download\""
        );
    }

    #[test]
    fn test_malformed_id_is_not_found() {
        let (status, Json(body)) = parse_file_id("not-a-uuid").unwrap_err();
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body.message, "File not found");
    }
}
