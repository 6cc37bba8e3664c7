//! Signed uploads to the hosted image service
//!
//! Speaks the Cloudinary upload API: a multipart POST to
//! `{api_base}/{cloud_name}/image/upload` carrying the file, the API key, a
//! timestamp, the target folder and a SHA-256 signature over the signed
//! parameters.

use bytes::Bytes;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::time::Duration;
use tracing::{debug, error};

use crate::config::MediaCredentials;

/// Image formats the relay accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Jpeg,
    Png,
    Gif,
    Webp,
}

impl ImageKind {
    /// Detect the format from magic bytes
    pub fn sniff(bytes: &[u8]) -> Option<Self> {
        match bytes {
            [0xFF, 0xD8, 0xFF, ..] => Some(Self::Jpeg),
            [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, ..] => Some(Self::Png),
            [b'G', b'I', b'F', b'8', ..] => Some(Self::Gif),
            [b'R', b'I', b'F', b'F', _, _, _, _, b'W', b'E', b'B', b'P', ..] => Some(Self::Webp),
            _ => None,
        }
    }

    pub fn mime(&self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::Gif => "image/gif",
            Self::Webp => "image/webp",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Jpeg => "jpg",
            Self::Png => "png",
            Self::Gif => "gif",
            Self::Webp => "webp",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum MediaHostError {
    #[error("Request to media host failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Media host rejected upload ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("Media host response had no URL")]
    MissingUrl,
}

#[derive(Debug, Clone)]
pub struct MediaHostConfig {
    pub credentials: MediaCredentials,
    pub api_base: String,
    pub folder: String,
    pub timeout: Duration,
}

pub struct MediaHost {
    config: MediaHostConfig,
    client: Client,
}

impl MediaHost {
    pub fn new(config: MediaHostConfig) -> Result<Self, MediaHostError> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { config, client })
    }

    pub fn folder(&self) -> &str {
        &self.config.folder
    }

    fn upload_url(&self) -> String {
        format!(
            "{}/{}/image/upload",
            self.config.api_base.trim_end_matches('/'),
            self.config.credentials.cloud_name
        )
    }

    /// Upload an image and return its public HTTPS URL
    pub async fn upload(&self, bytes: Bytes, kind: ImageKind) -> Result<String, MediaHostError> {
        let timestamp = chrono::Utc::now().timestamp().to_string();
        let signature = sign(
            &[("folder", self.config.folder.as_str()), ("timestamp", timestamp.as_str())],
            &self.config.credentials.api_secret,
        );
        let size = bytes.len();

        let file = Part::bytes(bytes.to_vec())
            .file_name(format!("upload.{}", kind.extension()))
            .mime_str(kind.mime())?;
        let form = Form::new()
            .part("file", file)
            .text("api_key", self.config.credentials.api_key.clone())
            .text("timestamp", timestamp)
            .text("folder", self.config.folder.clone())
            .text("signature", signature)
            .text("signature_algorithm", "sha256");

        let response = self.client.post(self.upload_url()).multipart(form).send().await?;
        let status = response.status();
        let body: Value = response.json().await.unwrap_or(Value::Null);

        if !status.is_success() {
            let message = body
                .pointer("/error/message")
                .and_then(Value::as_str)
                .unwrap_or_else(|| status.canonical_reason().unwrap_or("unknown error"))
                .to_string();
            error!(status = status.as_u16(), %message, "Media host rejected upload");
            return Err(MediaHostError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        let url = body
            .get("secure_url")
            .or_else(|| body.get("url"))
            .and_then(Value::as_str)
            .ok_or(MediaHostError::MissingUrl)?;

        debug!(size, kind = kind.mime(), url, "Uploaded image to media host");
        Ok(url.to_string())
    }
}

/// Upload signature: parameters sorted by name, joined as `k=v&k=v`, the
/// secret appended, SHA-256 hex.
pub fn sign(params: &[(&str, &str)], secret: &str) -> String {
    let mut sorted = params.to_vec();
    sorted.sort_by(|a, b| a.0.cmp(b.0));
    let joined = sorted
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&");
    hex::encode(Sha256::digest(format!("{}{}", joined, secret).as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const PNG_HEADER: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

    fn host(server: &MockServer) -> MediaHost {
        MediaHost::new(MediaHostConfig {
            credentials: MediaCredentials {
                cloud_name: "demo".into(),
                api_key: "key-123".into(),
                api_secret: "secret".into(),
            },
            api_base: server.uri(),
            folder: "profile_uploads".into(),
            timeout: Duration::from_secs(5),
        })
        .unwrap()
    }

    #[test]
    fn test_sign_known_vector() {
        let sig = sign(&[("timestamp", "1315060510"), ("folder", "profile_uploads")], "abcd");
        assert_eq!(sig, "def6222345e0f22854037c076d3e290fddfd1b120182454b672bfd9b1877cbcc");
    }

    #[test]
    fn test_sniff() {
        assert_eq!(ImageKind::sniff(&[0xFF, 0xD8, 0xFF, 0xE0]), Some(ImageKind::Jpeg));
        assert_eq!(ImageKind::sniff(&PNG_HEADER), Some(ImageKind::Png));
        assert_eq!(ImageKind::sniff(b"GIF89a..."), Some(ImageKind::Gif));
        assert_eq!(ImageKind::sniff(b"RIFF\x10\0\0\0WEBPVP8 "), Some(ImageKind::Webp));
        assert_eq!(ImageKind::sniff(b"RIFF\x10\0\0\0WAVE"), None);
        assert_eq!(ImageKind::sniff(b"%PDF-1.7"), None);
        assert_eq!(ImageKind::sniff(&[]), None);
    }

    #[tokio::test]
    async fn test_upload_returns_secure_url() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/demo/image/upload"))
            .and(body_string_contains("signature_algorithm"))
            .and(body_string_contains("profile_uploads"))
            .and(body_string_contains("key-123"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "secure_url": "https://res.example/demo/image/upload/v1/profile_uploads/a.png",
                "url": "http://res.example/a.png"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let url = host(&server)
            .upload(Bytes::from_static(&PNG_HEADER), ImageKind::Png)
            .await
            .unwrap();
        assert!(url.starts_with("https://"));
    }

    #[tokio::test]
    async fn test_rejection_carries_host_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/demo/image/upload"))
            .respond_with(
                ResponseTemplate::new(401).set_body_json(json!({"error": {"message": "Invalid Signature"}})),
            )
            .mount(&server)
            .await;

        let err = host(&server)
            .upload(Bytes::from_static(&PNG_HEADER), ImageKind::Png)
            .await
            .unwrap_err();
        match err {
            MediaHostError::Rejected { status, message } => {
                assert_eq!(status, 401);
                assert_eq!(message, "Invalid Signature");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_missing_url() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"public_id": "x"})))
            .mount(&server)
            .await;

        let err = host(&server)
            .upload(Bytes::from_static(&PNG_HEADER), ImageKind::Png)
            .await
            .unwrap_err();
        assert!(matches!(err, MediaHostError::MissingUrl));
    }
}
