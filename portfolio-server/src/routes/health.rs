//! Health check endpoint
//!
//! `/health` and `/healthz` always answer 200 while the process is up. The
//! body reports which backends are available so a dashboard can show a
//! degraded state.

use bytes::Bytes;
use http_body_util::Full;
use hyper::{Response, StatusCode};
use serde::Serialize;

use super::json_response;
use crate::server::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub healthy: bool,
    /// `online` when persistence is available, `degraded` otherwise
    pub status: &'static str,
    pub version: &'static str,
    /// Seconds since the server started
    pub uptime: u64,
    pub persistence_enabled: bool,
    pub uploads_enabled: bool,
    pub timestamp: String,
}

fn build_health_response(state: &AppState) -> HealthResponse {
    let persistence_enabled = state.portfolio.is_some();

    HealthResponse {
        healthy: true,
        status: if persistence_enabled { "online" } else { "degraded" },
        version: env!("CARGO_PKG_VERSION"),
        uptime: state.started_at.elapsed().as_secs(),
        persistence_enabled,
        uploads_enabled: state.media.is_some(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    }
}

/// Liveness probe
pub fn health_check(state: &AppState) -> Response<Full<Bytes>> {
    json_response(StatusCode::OK, &build_health_response(state))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Args;
    use crate::routes::test_support::body_json;
    use clap::Parser;

    #[tokio::test]
    async fn test_health_reports_disabled_backends() {
        let state = AppState::new(Args::parse_from(["portfolio-server"]));
        let response = health_check(&state);
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["healthy"], true);
        assert_eq!(body["status"], "degraded");
        assert_eq!(body["persistenceEnabled"], false);
        assert_eq!(body["uploadsEnabled"], false);
    }
}
