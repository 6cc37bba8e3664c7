//! Upload relay: `POST /api/upload`
//!
//! Accepts an image as a multipart `file` field, as base64 (or a data URI)
//! in a JSON body, or as a raw image body. The image is checked and then
//! forwarded to the media host with a signed request. The reply is
//! `{"url": ...}` on success.

use base64::Engine;
use bytes::Bytes;
use http_body_util::Full;
use hyper::{Response, StatusCode};
use serde::Deserialize;
use serde_json::json;
use std::convert::Infallible;
use tracing::{debug, error, info};

use super::{json_response, server_error_response};
use crate::server::AppState;
use crate::services::ImageKind;
use crate::types::ServerError;

#[derive(Debug, Deserialize)]
struct JsonUpload {
    #[serde(alias = "file")]
    image: Option<String>,
}

/// Handle POST /api/upload
pub async fn handle_upload(
    state: &AppState,
    content_type: Option<&str>,
    body: Bytes,
) -> Response<Full<Bytes>> {
    let Some(media) = &state.media else {
        return server_error_response(&ServerError::Unavailable(
            "Image uploads are not configured".to_string(),
        ));
    };

    let (bytes, kind) = match extract_image(content_type, body, state.args.max_upload_bytes).await {
        Ok(image) => image,
        Err(e) => {
            debug!("Rejected upload: {}", e);
            return server_error_response(&e);
        }
    };

    let size = bytes.len();
    match media.upload(bytes, kind).await {
        Ok(url) => {
            info!(size, kind = kind.mime(), "Image uploaded");
            json_response(StatusCode::OK, &json!({ "url": url }))
        }
        Err(e) => {
            error!("Upload to media host failed: {}", e);
            server_error_response(&ServerError::from(e))
        }
    }
}

/// Pull the image out of a request body and check it.
///
/// The decoded image must be non-empty, at most `max_bytes` long and one of
/// the accepted formats.
pub async fn extract_image(
    content_type: Option<&str>,
    body: Bytes,
    max_bytes: usize,
) -> Result<(Bytes, ImageKind), ServerError> {
    let mime = content_type
        .and_then(|ct| ct.split(';').next())
        .map(|m| m.trim().to_ascii_lowercase())
        .unwrap_or_default();

    let bytes = match mime.as_str() {
        "multipart/form-data" => {
            // Content type is present on this branch
            from_multipart(content_type.unwrap_or_default(), body).await?
        }
        "application/json" => from_json(&body, max_bytes)?,
        "" | "application/octet-stream" => body,
        m if m.starts_with("image/") => body,
        other => {
            return Err(ServerError::UnsupportedMediaType(format!(
                "Cannot read an image from '{}'",
                other
            )))
        }
    };

    if bytes.is_empty() {
        return Err(ServerError::BadRequest("No image data".to_string()));
    }
    if bytes.len() > max_bytes {
        return Err(ServerError::PayloadTooLarge { limit: max_bytes });
    }

    let kind = ImageKind::sniff(&bytes).ok_or_else(|| {
        ServerError::UnsupportedMediaType(
            "Only JPEG, PNG, GIF and WebP images are accepted".to_string(),
        )
    })?;

    Ok((bytes, kind))
}

async fn from_multipart(content_type: &str, body: Bytes) -> Result<Bytes, ServerError> {
    let boundary = multer::parse_boundary(content_type)
        .map_err(|e| ServerError::BadRequest(format!("Invalid multipart request: {}", e)))?;

    let stream = futures_util::stream::once(async move { Ok::<Bytes, Infallible>(body) });
    let mut multipart = multer::Multipart::new(stream, boundary);

    let mut fallback = None;
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let is_file_field = field.name() == Some("file");
        let has_file_name = field.file_name().is_some();

        if is_file_field {
            return field.bytes().await.map_err(multipart_error);
        }
        if has_file_name && fallback.is_none() {
            fallback = Some(field.bytes().await.map_err(multipart_error)?);
        }
    }

    fallback.ok_or_else(|| ServerError::BadRequest("Multipart body has no file field".to_string()))
}

fn multipart_error(e: multer::Error) -> ServerError {
    ServerError::BadRequest(format!("Invalid multipart request: {}", e))
}

fn from_json(body: &[u8], max_bytes: usize) -> Result<Bytes, ServerError> {
    let upload: JsonUpload = serde_json::from_slice(body)?;
    let encoded = upload
        .image
        .ok_or_else(|| ServerError::BadRequest("Missing 'image' field".to_string()))?;

    // Accept `data:image/png;base64,....` as well as bare base64
    let payload = match encoded.strip_prefix("data:") {
        Some(rest) => rest
            .split_once(',')
            .map(|(_, data)| data)
            .ok_or_else(|| ServerError::BadRequest("Malformed data URI".to_string()))?,
        None => encoded.as_str(),
    };
    let payload: String = payload.chars().filter(|c| !c.is_ascii_whitespace()).collect();

    if payload.len() / 4 * 3 > max_bytes + 2 {
        return Err(ServerError::PayloadTooLarge { limit: max_bytes });
    }

    base64::engine::general_purpose::STANDARD
        .decode(payload.as_bytes())
        .map(Bytes::from)
        .map_err(|e| ServerError::BadRequest(format!("Invalid base64 image: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Args, MediaCredentials};
    use crate::routes::test_support::body_json;
    use crate::services::{MediaHost, MediaHostConfig};
    use clap::Parser;
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const PNG: [u8; 12] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 13];
    const LIMIT: usize = 1024;

    fn multipart_body(field: &str, file_name: Option<&str>, data: &[u8]) -> (String, Bytes) {
        let boundary = "XBOUNDARYX";
        let disposition = match file_name {
            Some(name) => format!("form-data; name=\"{}\"; filename=\"{}\"", field, name),
            None => format!("form-data; name=\"{}\"", field),
        };
        let mut body = Vec::new();
        body.extend_from_slice(format!("--{}\r\n", boundary).as_bytes());
        body.extend_from_slice(format!("Content-Disposition: {}\r\n", disposition).as_bytes());
        body.extend_from_slice(b"Content-Type: image/png\r\n\r\n");
        body.extend_from_slice(data);
        body.extend_from_slice(format!("\r\n--{}--\r\n", boundary).as_bytes());
        (format!("multipart/form-data; boundary={}", boundary), Bytes::from(body))
    }

    fn base64_png() -> String {
        base64::engine::general_purpose::STANDARD.encode(PNG)
    }

    #[tokio::test]
    async fn test_multipart_file_field() {
        let (ct, body) = multipart_body("file", Some("a.png"), &PNG);
        let (bytes, kind) = extract_image(Some(&ct), body, LIMIT).await.unwrap();
        assert_eq!(&bytes[..], &PNG[..]);
        assert_eq!(kind, ImageKind::Png);
    }

    #[tokio::test]
    async fn test_multipart_other_field_with_file_name() {
        let (ct, body) = multipart_body("avatar", Some("a.png"), &PNG);
        let (bytes, _) = extract_image(Some(&ct), body, LIMIT).await.unwrap();
        assert_eq!(&bytes[..], &PNG[..]);
    }

    #[tokio::test]
    async fn test_multipart_without_file_is_bad_request() {
        let (ct, body) = multipart_body("note", None, b"hello");
        let err = extract_image(Some(&ct), body, LIMIT).await.unwrap_err();
        assert!(matches!(err, ServerError::BadRequest(_)));
    }

    #[tokio::test]
    async fn test_json_bare_base64_and_data_uri() {
        let bare = serde_json::to_vec(&json!({ "image": base64_png() })).unwrap();
        let (bytes, _) = extract_image(Some("application/json"), Bytes::from(bare), LIMIT)
            .await
            .unwrap();
        assert_eq!(&bytes[..], &PNG[..]);

        let uri = format!("data:image/png;base64,{}", base64_png());
        let aliased = serde_json::to_vec(&json!({ "file": uri })).unwrap();
        let (bytes, kind) =
            extract_image(Some("application/json; charset=utf-8"), Bytes::from(aliased), LIMIT)
                .await
                .unwrap();
        assert_eq!(&bytes[..], &PNG[..]);
        assert_eq!(kind, ImageKind::Png);
    }

    #[tokio::test]
    async fn test_json_invalid_base64() {
        let body = serde_json::to_vec(&json!({ "image": "***" })).unwrap();
        let err = extract_image(Some("application/json"), Bytes::from(body), LIMIT)
            .await
            .unwrap_err();
        assert!(matches!(err, ServerError::BadRequest(_)));
    }

    #[tokio::test]
    async fn test_raw_body() {
        let (_, kind) = extract_image(Some("image/png"), Bytes::from_static(&PNG), LIMIT)
            .await
            .unwrap();
        assert_eq!(kind, ImageKind::Png);
    }

    #[tokio::test]
    async fn test_oversized_image() {
        let mut big = PNG.to_vec();
        big.resize(LIMIT + 1, 0);
        let err = extract_image(Some("image/png"), Bytes::from(big), LIMIT)
            .await
            .unwrap_err();
        assert!(matches!(err, ServerError::PayloadTooLarge { limit: LIMIT }));
    }

    #[tokio::test]
    async fn test_non_image_rejected() {
        let err = extract_image(
            Some("application/octet-stream"),
            Bytes::from_static(b"%PDF-1.7 ..."),
            LIMIT,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ServerError::UnsupportedMediaType(_)));

        let err = extract_image(Some("text/plain"), Bytes::from_static(&PNG), LIMIT)
            .await
            .unwrap_err();
        assert!(matches!(err, ServerError::UnsupportedMediaType(_)));
    }

    #[tokio::test]
    async fn test_unconfigured_relay_is_unavailable() {
        let state = AppState::new(Args::parse_from(["portfolio-server"]));
        let response = handle_upload(&state, Some("image/png"), Bytes::from_static(&PNG)).await;
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(
            body_json(response).await["error"],
            "Service unavailable: Image uploads are not configured"
        );
    }

    #[tokio::test]
    async fn test_upload_relays_to_media_host() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/demo/image/upload"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "secure_url": "https://res.example/profile_uploads/x.png"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let mut state = AppState::new(Args::parse_from(["portfolio-server"]));
        state.media = Some(
            MediaHost::new(MediaHostConfig {
                credentials: MediaCredentials {
                    cloud_name: "demo".into(),
                    api_key: "k".into(),
                    api_secret: "s".into(),
                },
                api_base: server.uri(),
                folder: "profile_uploads".into(),
                timeout: Duration::from_secs(5),
            })
            .unwrap(),
        );

        let (ct, body) = multipart_body("file", Some("a.png"), &PNG);
        let response = handle_upload(&state, Some(&ct), body).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(response).await,
            json!({ "url": "https://res.example/profile_uploads/x.png" })
        );
    }
}
