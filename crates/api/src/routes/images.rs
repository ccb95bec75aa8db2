//! Image routes driving the storage adapter.
//!
//! Uploads arrive as multipart forms, get staged in a temporary file and
//! are handed to [`StorageAdapter::save`]. The remaining routes map one to
//! one onto the adapter's `exists`, `read` and `delete` operations.

use axum::{
    Json, Router,
    body::Bytes,
    extract::{Multipart, Path, Query, State},
    http::{StatusCode, header},
    response::IntoResponse,
    routing::{delete, get, post},
};
use ghost_qiniu_core::storage::{StorageAdapter, UploadRequest};
use ghost_qiniu_shared::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::debug;

use crate::{AppState, error::ApiError};

/// Creates image routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/images/upload", post(upload_image))
        .route("/images/exists", get(image_exists))
        .route("/images/read", get(read_image))
        .route("/images/{*path}", delete(delete_image))
}

/// Response for a stored upload.
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    /// Public URL of the stored file.
    pub url: String,
}

/// Query for `GET /images/exists`.
#[derive(Debug, Deserialize)]
pub struct ExistsQuery {
    /// File name to look up.
    pub filename: String,
    /// Directory to look in.
    pub dir: Option<String>,
}

/// Response for `GET /images/exists`.
#[derive(Debug, Serialize)]
pub struct ExistsResponse {
    /// Whether the name is taken.
    pub exists: bool,
}

/// Query for `GET /images/read`.
#[derive(Debug, Deserialize)]
pub struct ReadQuery {
    /// URL or path of the stored file.
    pub locator: String,
}

/// File part pulled out of an upload form.
struct UploadedFile {
    name: String,
    content_type: Option<String>,
    bytes: Bytes,
}

/// Upload an image.
///
/// POST /images/upload
async fn upload_image(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let mut file: Option<UploadedFile> = None;
    let mut target_dir: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Invalid multipart body: {e}")))?
    {
        match field.name() {
            Some("file") => {
                let name = field
                    .file_name()
                    .filter(|name| !name.is_empty())
                    .map(ToString::to_string)
                    .ok_or_else(|| AppError::Validation("File part has no file name".into()))?;
                let content_type = field.content_type().map(ToString::to_string);
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::Validation(format!("Invalid file part: {e}")))?;
                file = Some(UploadedFile {
                    name,
                    content_type,
                    bytes,
                });
            }
            Some("ref") => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::Validation(format!("Invalid ref part: {e}")))?;
                target_dir = Some(text).filter(|dir| !dir.is_empty());
            }
            _ => {}
        }
    }

    let file = file.ok_or_else(|| AppError::Validation("Missing file part".into()))?;

    // The temp file must outlive `save`; it is removed on drop.
    let staged = stage_upload(&file.bytes).await?;
    debug!(
        name = %file.name,
        size = file.bytes.len(),
        path = %staged.path().display(),
        "staged upload"
    );

    let mut request = UploadRequest::new(file.name, staged.path());
    if let Some(content_type) = file.content_type {
        request = request.with_content_type(content_type);
    }

    let url = state.storage.save(&request, target_dir.as_deref()).await?;

    Ok((StatusCode::CREATED, Json(UploadResponse { url })))
}

/// Check whether a file name is taken.
///
/// GET /images/exists
async fn image_exists(
    State(state): State<AppState>,
    Query(query): Query<ExistsQuery>,
) -> Result<Json<ExistsResponse>, ApiError> {
    let exists = state
        .storage
        .exists(&query.filename, query.dir.as_deref())
        .await?;
    Ok(Json(ExistsResponse { exists }))
}

/// Read back a stored file.
///
/// GET /images/read
async fn read_image(
    State(state): State<AppState>,
    Query(query): Query<ReadQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let bytes = state.storage.read(&query.locator).await?;
    Ok(([(header::CONTENT_TYPE, "application/octet-stream")], bytes))
}

/// Delete a stored file.
///
/// DELETE /images/{*path}
async fn delete_image(
    State(state): State<AppState>,
    Path(path): Path<String>,
) -> Result<StatusCode, ApiError> {
    let (target_dir, filename) = split_object_path(&path);
    state.storage.delete(filename, target_dir).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Write upload bytes to a temporary file for the adapter to read.
async fn stage_upload(bytes: &[u8]) -> AppResult<NamedTempFile> {
    let staged = NamedTempFile::new()
        .map_err(|e| AppError::Internal(format!("Failed to stage upload: {e}")))?;
    tokio::fs::write(staged.path(), bytes)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to stage upload: {e}")))?;
    Ok(staged)
}

/// Split a stored object path into its directory, if any, and file name.
fn split_object_path(path: &str) -> (Option<&str>, &str) {
    match path.trim_matches('/').rsplit_once('/') {
        Some((dir, filename)) => (Some(dir).filter(|dir| !dir.is_empty()), filename),
        None => (None, path.trim_matches('/')),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::Request};
    use chrono::{FixedOffset, TimeZone};
    use ghost_qiniu_core::storage::{FixedClock, QiniuConfig, QiniuStorage};
    use http_body_util::BodyExt;
    use serde_json::Value;
    use std::sync::Arc;
    use tower::ServiceExt;

    const BOUNDARY: &str = "ghost-qiniu-boundary";

    fn test_state(upload_url: &str, domain: &str) -> AppState {
        let config = QiniuConfig::new("test-access-key", "test-secret-key", "ghost-media", domain)
            .with_upload_url(upload_url);
        let now = FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(2023, 6, 15, 10, 0, 0)
            .unwrap();
        let storage = QiniuStorage::from_config(config)
            .unwrap()
            .with_clock(FixedClock(now));
        AppState {
            storage: Arc::new(storage),
        }
    }

    fn app(state: AppState) -> Router {
        Router::new().merge(routes()).with_state(state)
    }

    fn multipart_body(parts: &[(&str, Option<&str>, &str)]) -> String {
        let mut body = String::new();
        for (name, file_name, content) in parts {
            body.push_str(&format!("--{BOUNDARY}\r\n"));
            match file_name {
                Some(file_name) => body.push_str(&format!(
                    "Content-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\nContent-Type: image/png\r\n\r\n"
                )),
                None => body.push_str(&format!(
                    "Content-Disposition: form-data; name=\"{name}\"\r\n\r\n"
                )),
            }
            body.push_str(content);
            body.push_str("\r\n");
        }
        body.push_str(&format!("--{BOUNDARY}--\r\n"));
        body
    }

    fn upload_request(body: String) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/images/upload")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    async fn json_body(response: axum::response::Response) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_split_object_path() {
        assert_eq!(
            split_object_path("2023/06/photo.png"),
            (Some("2023/06"), "photo.png")
        );
        assert_eq!(split_object_path("photo.png"), (None, "photo.png"));
        assert_eq!(split_object_path("/avatars/me.jpg"), (Some("avatars"), "me.jpg"));
        assert_eq!(split_object_path("a//b.png"), (Some("a/"), "b.png"));
    }

    #[tokio::test]
    async fn test_stage_upload_writes_bytes() {
        let staged = stage_upload(b"png-bytes").await.unwrap();
        let written = tokio::fs::read(staged.path()).await.unwrap();
        assert_eq!(written, b"png-bytes");
    }

    #[tokio::test]
    async fn test_upload_returns_public_url() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/")
            .match_body(mockito::Matcher::Regex("2023/06/photo.png".into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"key":"2023/06/photo.png","hash":"Fh8x"}"#)
            .create_async()
            .await;

        let state = test_state(&server.url(), "https://cdn.example.com");
        let body = multipart_body(&[("file", Some("photo.png"), "png-bytes")]);
        let response = app(state).oneshot(upload_request(body)).await.unwrap();

        assert_eq!(response.status(), StatusCode::CREATED);
        let json = json_body(response).await;
        assert_eq!(json["url"], "https://cdn.example.com/2023/06/photo.png");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_upload_ref_sets_directory() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/")
            .match_body(mockito::Matcher::Regex("avatars/photo.png".into()))
            .with_status(200)
            .with_body(r#"{"key":"avatars/photo.png"}"#)
            .create_async()
            .await;

        let state = test_state(&server.url(), "https://cdn.example.com");
        let body = multipart_body(&[
            ("ref", None, "avatars"),
            ("file", Some("photo.png"), "png-bytes"),
        ]);
        let response = app(state).oneshot(upload_request(body)).await.unwrap();

        assert_eq!(response.status(), StatusCode::CREATED);
        let json = json_body(response).await;
        assert_eq!(json["url"], "https://cdn.example.com/avatars/photo.png");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_upload_vendor_error_is_bad_gateway() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/")
            .with_status(401)
            .with_body(r#"{"error":"bad token"}"#)
            .create_async()
            .await;

        let state = test_state(&server.url(), "https://cdn.example.com");
        let body = multipart_body(&[("file", Some("photo.png"), "png-bytes")]);
        let response = app(state).oneshot(upload_request(body)).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let json = json_body(response).await;
        assert_eq!(json["error"], "EXTERNAL_SERVICE_ERROR");
        assert!(json["message"].as_str().unwrap().contains("bad token"));
    }

    #[tokio::test]
    async fn test_upload_without_file_part_is_rejected() {
        let state = test_state("http://127.0.0.1:1", "https://cdn.example.com");
        let body = multipart_body(&[("ref", None, "avatars")]);
        let response = app(state).oneshot(upload_request(body)).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = json_body(response).await;
        assert_eq!(json["error"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_exists_is_always_false() {
        let state = test_state("http://127.0.0.1:1", "https://cdn.example.com");
        let response = app(state)
            .oneshot(
                Request::builder()
                    .uri("/images/exists?filename=photo.png&dir=2023/06")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = json_body(response).await;
        assert_eq!(json["exists"], false);
    }

    #[tokio::test]
    async fn test_read_returns_bytes() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/2023/06/photo.png")
            .with_status(200)
            .with_body("png-bytes")
            .create_async()
            .await;

        let state = test_state("http://127.0.0.1:1", &server.url());
        let response = app(state)
            .oneshot(
                Request::builder()
                    .uri("/images/read?locator=/2023/06/photo.png")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&bytes[..], b"png-bytes");
    }

    #[tokio::test]
    async fn test_read_malformed_locator_is_bad_request() {
        let state = test_state("http://127.0.0.1:1", "https://cdn.example.com");
        let response = app(state)
            .oneshot(
                Request::builder()
                    .uri("/images/read?locator=")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = json_body(response).await;
        assert_eq!(json["message"], "Validation error: Could not read file: ");
    }

    #[tokio::test]
    async fn test_delete_is_not_implemented() {
        let state = test_state("http://127.0.0.1:1", "https://cdn.example.com");
        let response = app(state)
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri("/images/2023/06/photo.png")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_IMPLEMENTED);
        let json = json_body(response).await;
        assert_eq!(json["error"], "NOT_IMPLEMENTED");
    }
}
