//! Persistence API: `GET /api/data` and `POST /api/data`
//!
//! The collection holds a single portfolio document. Reads return it (or
//! `null`), writes overwrite it wholesale. There is no versioning and no
//! conflict check: the last writer wins.

use bytes::Bytes;
use http_body_util::Full;
use hyper::{Response, StatusCode};
use portfolio_core::PortfolioDocument;
use tracing::{debug, error, warn};

use super::{json_response, null_response, server_error_response};
use crate::server::AppState;
use crate::types::ServerError;

/// Handle GET /api/data
pub async fn handle_get_data(state: &AppState) -> Response<Full<Bytes>> {
    let Some(repo) = &state.portfolio else {
        debug!("Persistence disabled, answering null");
        return null_response();
    };

    match repo.find_first().await {
        Ok(Some(doc)) => json_response(StatusCode::OK, &doc),
        Ok(None) => null_response(),
        Err(e) => {
            error!("Failed to read portfolio: {}", e);
            server_error_response(&e)
        }
    }
}

/// Handle POST /api/data
pub async fn handle_post_data(state: &AppState, body: Bytes) -> Response<Full<Bytes>> {
    let doc = match serde_json::from_slice::<PortfolioDocument>(&body) {
        Ok(doc) => doc,
        Err(e) => return server_error_response(&ServerError::from(e)),
    };

    let Some(repo) = &state.portfolio else {
        warn!("Persistence disabled, dropping portfolio save");
        return null_response();
    };

    match repo.upsert(&doc).await {
        Ok(saved) => json_response(StatusCode::OK, &saved),
        Err(e) => {
            error!("Failed to save portfolio: {}", e);
            server_error_response(&e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Args;
    use crate::routes::test_support::body_json;
    use clap::Parser;
    use serde_json::Value;

    fn disabled_state() -> AppState {
        AppState::new(Args::parse_from(["portfolio-server"]))
    }

    #[tokio::test]
    async fn test_get_without_persistence_is_null() {
        let response = handle_get_data(&disabled_state()).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, Value::Null);
    }

    #[tokio::test]
    async fn test_post_without_persistence_is_null() {
        let body = serde_json::to_vec(&PortfolioDocument::seed()).unwrap();
        let response = handle_post_data(&disabled_state(), Bytes::from(body)).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, Value::Null);
    }

    #[tokio::test]
    async fn test_post_invalid_json_is_bad_request() {
        let response = handle_post_data(&disabled_state(), Bytes::from_static(b"{not json")).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert!(body["error"].as_str().unwrap().contains("Invalid JSON"));
    }

    #[tokio::test]
    async fn test_post_without_profile_is_bad_request() {
        let response =
            handle_post_data(&disabled_state(), Bytes::from_static(b"{\"skills\":[]}")).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
