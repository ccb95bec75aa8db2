//! Remote object store client.

use std::future::Future;
use std::path::Path;

use bytes::Bytes;
use mime::Mime;
use reqwest::StatusCode;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use tracing::debug;
use url::Url;

use super::error::StorageError;

/// Body returned by a successful form upload.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PutResponse {
    /// Key the object was stored under.
    pub key: String,
    /// Content hash computed by the object store.
    #[serde(default)]
    pub hash: Option<String>,
}

/// Network operations the storage adapter needs from the object store.
///
/// Implemented by [`QiniuClient`]; tests substitute their own client.
pub trait RemoteClient: Send + Sync {
    /// Upload the file at `path` under `key`, authorized by `token`.
    fn put_file(
        &self,
        token: &str,
        key: &str,
        path: &Path,
        content_type: Option<&str>,
    ) -> impl Future<Output = Result<PutResponse, StorageError>> + Send;

    /// Fetch the full body at `url`.
    fn get(&self, url: &Url) -> impl Future<Output = Result<Bytes, StorageError>> + Send;
}

/// Qiniu form-upload client backed by `reqwest`.
#[derive(Debug, Clone)]
pub struct QiniuClient {
    http: reqwest::Client,
    upload_url: Url,
}

impl QiniuClient {
    /// Create a client that uploads to `upload_url`.
    ///
    /// # Errors
    ///
    /// Returns an error if `upload_url` is not an absolute URL.
    pub fn new(upload_url: &str) -> Result<Self, StorageError> {
        let upload_url = Url::parse(upload_url).map_err(|e| {
            StorageError::configuration(format!("invalid upload url '{upload_url}': {e}"))
        })?;

        Ok(Self {
            http: reqwest::Client::new(),
            upload_url,
        })
    }

    /// The form upload endpoint.
    #[must_use]
    pub fn upload_url(&self) -> &Url {
        &self.upload_url
    }
}

impl RemoteClient for QiniuClient {
    async fn put_file(
        &self,
        token: &str,
        key: &str,
        path: &Path,
        content_type: Option<&str>,
    ) -> Result<PutResponse, StorageError> {
        let data = tokio::fs::read(path)
            .await
            .map_err(|e| StorageError::local_file(path, e))?;

        debug!(key, size = data.len(), "uploading object");

        let file_name = key.rsplit('/').next().unwrap_or(key).to_string();
        let part = Part::bytes(data).file_name(file_name);
        let part = match upload_mime(content_type) {
            Some(mime) => part.mime_str(mime.as_ref())?,
            None => part,
        };

        let form = Form::new()
            .text("token", token.to_string())
            .text("key", key.to_string())
            .part("file", part);

        let response = self
            .http
            .post(self.upload_url.clone())
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::OK {
            let body = error_body(response).await;
            return Err(StorageError::rejected(
                status.as_u16(),
                rejection_message(status, &body),
            ));
        }

        Ok(response.json::<PutResponse>().await?)
    }

    async fn get(&self, url: &Url) -> Result<Bytes, StorageError> {
        debug!(%url, "fetching object");

        let response = self.http.get(url.clone()).send().await?;
        let status = response.status();

        if status == StatusCode::NOT_FOUND {
            return Err(StorageError::not_found(url.path()));
        }
        if !status.is_success() {
            let body = error_body(response).await;
            return Err(StorageError::rejected(
                status.as_u16(),
                rejection_message(status, &body),
            ));
        }

        Ok(response.bytes().await?)
    }
}

/// MIME type for the file part. Unparsable types are dropped and the
/// object store detects the type itself.
fn upload_mime(content_type: Option<&str>) -> Option<Mime> {
    let content_type = content_type?;
    match content_type.parse::<Mime>() {
        Ok(mime) => Some(mime),
        Err(e) => {
            debug!(content_type, error = %e, "ignoring invalid content type");
            None
        }
    }
}

/// Body of a non-success response, empty if it cannot be read.
async fn error_body(response: reqwest::Response) -> String {
    let status = response.status();
    match response.text().await {
        Ok(body) => body,
        Err(e) => {
            debug!(%status, error = %e, "failed to read error body");
            String::new()
        }
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

/// Message for a non-success response: the `error` field of the JSON body,
/// else the raw body, else the status reason.
fn rejection_message(status: StatusCode, body: &str) -> String {
    if let Ok(parsed) = serde_json::from_str::<ErrorBody>(body) {
        return parsed.error;
    }

    let body = body.trim();
    if !body.is_empty() {
        return body.to_string();
    }

    status
        .canonical_reason()
        .map_or_else(|| status.to_string(), str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_rejection_message_prefers_error_field() {
        let msg = rejection_message(
            StatusCode::INTERNAL_SERVER_ERROR,
            r#"{"error":"no such bucket"}"#,
        );
        assert_eq!(msg, "no such bucket");
    }

    #[test]
    fn test_rejection_message_falls_back_to_body() {
        let msg = rejection_message(StatusCode::BAD_GATEWAY, "  upstream down \n");
        assert_eq!(msg, "upstream down");
    }

    #[test]
    fn test_rejection_message_falls_back_to_reason() {
        let msg = rejection_message(StatusCode::SERVICE_UNAVAILABLE, "");
        assert_eq!(msg, "Service Unavailable");
    }

    #[rstest]
    #[case(Some("image/png"), Some("image/png"))]
    #[case(Some("image/svg+xml"), Some("image/svg+xml"))]
    #[case(Some("not a mime"), None)]
    #[case(Some(""), None)]
    #[case(None, None)]
    fn test_upload_mime(#[case] content_type: Option<&str>, #[case] expected: Option<&str>) {
        let mime = upload_mime(content_type);
        assert_eq!(mime.as_ref().map(Mime::essence_str), expected);
    }

    #[tokio::test]
    async fn test_put_file_with_invalid_content_type_still_uploads() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/")
            .match_body(mockito::Matcher::Regex("png-bytes".into()))
            .with_status(200)
            .with_body(r#"{"key":"2023/06/photo.png"}"#)
            .create_async()
            .await;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        std::io::Write::write_all(&mut file, b"png-bytes").unwrap();

        let client = QiniuClient::new(&server.url()).unwrap();
        let response = client
            .put_file("token", "2023/06/photo.png", file.path(), Some("not a mime"))
            .await
            .unwrap();

        assert_eq!(response.key, "2023/06/photo.png");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_get_rejection_with_empty_body_uses_reason() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/private.png")
            .with_status(403)
            .create_async()
            .await;

        let client = QiniuClient::new("https://upload.qiniup.com").unwrap();
        let url = Url::parse(&format!("{}/private.png", server.url())).unwrap();
        let err = client.get(&url).await.unwrap_err();

        assert!(matches!(err, StorageError::Rejected { status: 403, .. }));
        assert_eq!(err.to_string(), "Forbidden");
    }

    #[test]
    fn test_new_rejects_relative_upload_url() {
        let err = QiniuClient::new("upload.qiniup.com").unwrap_err();
        assert!(matches!(err, StorageError::Configuration(_)));
    }

    #[test]
    fn test_new_accepts_absolute_upload_url() {
        let client = QiniuClient::new("https://up-z1.qiniup.com").unwrap();
        assert_eq!(client.upload_url().host_str(), Some("up-z1.qiniup.com"));
    }
}
