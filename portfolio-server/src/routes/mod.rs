//! HTTP routes for the portfolio server

pub mod data;
pub mod health;
pub mod upload;

pub use data::{handle_get_data, handle_post_data};
pub use health::health_check;
pub use upload::{extract_image, handle_upload};

use bytes::Bytes;
use http_body_util::Full;
use hyper::header::{HeaderValue, ACCESS_CONTROL_ALLOW_ORIGIN, CACHE_CONTROL, CONTENT_TYPE};
use hyper::{Response, StatusCode};
use serde::Serialize;
use serde_json::json;
use tracing::error;

use crate::services::MediaHostError;
use crate::types::ServerError;

/// Build a response with the headers every API reply carries
fn build(status: StatusCode, content_type: &'static str, body: Bytes) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(body));
    *response.status_mut() = status;
    let headers = response.headers_mut();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
    headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-store"));
    response
}

/// Serialize `body` as the JSON reply
pub fn json_response<T: Serialize>(status: StatusCode, body: &T) -> Response<Full<Bytes>> {
    match serde_json::to_vec(body) {
        Ok(bytes) => build(status, "application/json", Bytes::from(bytes)),
        Err(e) => {
            error!("Failed to encode response: {}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to encode response")
        }
    }
}

/// JSON `null`, the reply when no document exists or persistence is disabled
pub fn null_response() -> Response<Full<Bytes>> {
    build(StatusCode::OK, "application/json", Bytes::from_static(b"null"))
}

/// `{"error": message}`
pub fn error_response(status: StatusCode, message: &str) -> Response<Full<Bytes>> {
    json_response(status, &json!({ "error": message }))
}

/// Map a server error to its JSON reply
pub fn server_error_response(err: &ServerError) -> Response<Full<Bytes>> {
    match err {
        ServerError::MediaHost(MediaHostError::Rejected { status, message }) => json_response(
            StatusCode::BAD_GATEWAY,
            &json!({ "error": "Upload failed", "details": message, "status": status }),
        ),
        ServerError::MediaHost(e) => json_response(
            StatusCode::BAD_GATEWAY,
            &json!({ "error": "Upload failed", "details": e.to_string() }),
        ),
        ServerError::NotFound(path) => json_response(
            StatusCode::NOT_FOUND,
            &json!({
                "error": "Not Found",
                "path": path,
                "hint": "Available routes: GET/POST /api/data, POST /api/upload, GET /health"
            }),
        ),
        other => error_response(other.status_code(), &other.to_string()),
    }
}

/// CORS preflight response
pub fn preflight_response() -> Response<Full<Bytes>> {
    let mut response = build(StatusCode::OK, "text/plain", Bytes::new());
    let headers = response.headers_mut();
    headers.insert("Access-Control-Allow-Headers", HeaderValue::from_static("*"));
    headers.insert(
        "Access-Control-Allow-Methods",
        HeaderValue::from_static("GET, POST, OPTIONS"),
    );
    response
}
