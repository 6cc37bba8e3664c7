//! Client for the upload relay (`POST /api/upload`)
//!
//! The editor only ever stores the returned URL; everything about the media
//! host stays on the server side.

use reqwest::Client;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::{Result, SyncError};
use crate::remote::RemoteConfig;

#[derive(Debug, Deserialize)]
struct UploadResponse {
    url: Option<String>,
    error: Option<String>,
    details: Option<String>,
}

pub struct UploadClient {
    base_url: String,
    client: Client,
}

impl UploadClient {
    pub fn new(config: &RemoteConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    /// Upload an image file from disk
    pub async fn upload_file(&self, path: &Path) -> Result<String> {
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("upload")
            .to_string();
        self.upload(bytes, &file_name).await
    }

    /// Upload image bytes as the multipart `file` field. Returns the public URL.
    pub async fn upload(&self, bytes: Vec<u8>, file_name: &str) -> Result<String> {
        let size = bytes.len();
        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str(mime_for(file_name))?;
        let form = reqwest::multipart::Form::new().part("file", part);

        let response = self
            .client
            .post(format!("{}/api/upload", self.base_url))
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        let body: Option<UploadResponse> = serde_json::from_str(&text).ok();

        match body {
            Some(UploadResponse { url: Some(url), .. }) if status.is_success() => {
                debug!(file_name, size, url = %url, "Image uploaded");
                Ok(url)
            }
            Some(UploadResponse { error: Some(error), details, .. }) => {
                let message = match details {
                    Some(d) => format!("{} ({})", error, d),
                    None => error,
                };
                warn!(file_name, status = status.as_u16(), error = %message, "Upload rejected");
                Err(SyncError::Upload(message))
            }
            _ => Err(SyncError::Server {
                status: status.as_u16(),
                message: text,
            }),
        }
    }
}

fn mime_for(file_name: &str) -> &'static str {
    let ext = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header_regex, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> UploadClient {
        UploadClient::new(&RemoteConfig {
            base_url: server.uri(),
            timeout_secs: 5,
        })
        .unwrap()
    }

    #[test]
    fn test_mime_for() {
        assert_eq!(mime_for("a.JPG"), "image/jpeg");
        assert_eq!(mime_for("b.webp"), "image/webp");
        assert_eq!(mime_for("noext"), "application/octet-stream");
    }

    #[tokio::test]
    async fn test_upload_returns_url() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/upload"))
            .and(header_regex("content-type", "^multipart/form-data"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"url": "https://cdn.example/x.jpg"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let url = client(&server).upload(vec![0xFF, 0xD8, 0xFF], "x.jpg").await.unwrap();
        assert_eq!(url, "https://cdn.example/x.jpg");
    }

    #[tokio::test]
    async fn test_upload_error_is_surfaced() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/upload"))
            .respond_with(
                ResponseTemplate::new(502)
                    .set_body_json(json!({"error": "Upload failed", "details": "Invalid signature"})),
            )
            .mount(&server)
            .await;

        let err = client(&server).upload(vec![1, 2, 3], "x.png").await.unwrap_err();
        match err {
            SyncError::Upload(message) => {
                assert!(message.contains("Upload failed"));
                assert!(message.contains("Invalid signature"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_non_json_failure_is_server_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/upload"))
            .respond_with(ResponseTemplate::new(500).set_body_string("oops"))
            .mount(&server)
            .await;

        let err = client(&server).upload(vec![1], "x.gif").await.unwrap_err();
        assert!(matches!(err, SyncError::Server { status: 500, .. }));
    }
}
