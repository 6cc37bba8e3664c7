//! HTTP server implementation

use bytes::Bytes;
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::Incoming;
use hyper::header::CONTENT_TYPE;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::TcpListener;
use tracing::{error, info, warn};

use crate::config::Args;
use crate::db::{MongoClient, PortfolioRepository};
use crate::routes;
use crate::services::{MediaHost, MediaHostConfig};
use crate::types::ServerError;

/// Shared application state
pub struct AppState {
    pub args: Args,
    /// Portfolio persistence; `None` when MongoDB is not configured or unreachable
    pub portfolio: Option<PortfolioRepository>,
    /// Signed upload relay; `None` without media host credentials
    pub media: Option<MediaHost>,
    pub started_at: Instant,
}

impl AppState {
    /// State with persistence and uploads disabled
    pub fn new(args: Args) -> Self {
        Self {
            args,
            portfolio: None,
            media: None,
            started_at: Instant::now(),
        }
    }

    /// State wired to the available backends
    pub fn with_services(args: Args, mongo: Option<MongoClient>) -> Self {
        let portfolio = mongo
            .as_ref()
            .map(|client| PortfolioRepository::new(client, &args.mongodb_collection));

        let media = args.media_credentials().and_then(|credentials| {
            let config = MediaHostConfig {
                credentials,
                api_base: args.media_api_base.clone(),
                folder: args.upload_folder.clone(),
                timeout: Duration::from_millis(args.request_timeout_ms),
            };
            match MediaHost::new(config) {
                Ok(host) => Some(host),
                Err(e) => {
                    warn!("Media host client failed to initialize, uploads disabled: {}", e);
                    None
                }
            }
        });

        Self {
            args,
            portfolio,
            media,
            started_at: Instant::now(),
        }
    }
}

/// Start the HTTP server
pub async fn run(state: Arc<AppState>) -> Result<(), ServerError> {
    let listener = TcpListener::bind(state.args.listen).await?;

    info!("Portfolio server listening on {}", state.args.listen);

    if state.portfolio.is_none() {
        warn!("Persistence disabled - /api/data answers null");
    }
    match &state.media {
        Some(media) => info!("Upload relay enabled (folder '{}')", media.folder()),
        None => warn!("Upload relay disabled - /api/upload answers 503"),
    }

    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                let state = Arc::clone(&state);
                tokio::spawn(async move {
                    let io = TokioIo::new(stream);

                    let service = service_fn(move |req| {
                        let state = Arc::clone(&state);
                        async move { handle_request(state, addr, req).await }
                    });

                    if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                        error!("Error serving connection from {}: {:?}", addr, err);
                    }
                });
            }
            Err(e) => {
                error!("Error accepting connection: {:?}", e);
            }
        }
    }
}

/// Route incoming HTTP requests
async fn handle_request(
    state: Arc<AppState>,
    addr: SocketAddr,
    req: Request<Incoming>,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    info!("[{}] {} {}", addr, method, path);

    let response = match (&method, path.as_str()) {
        (&Method::OPTIONS, _) => routes::preflight_response(),

        (&Method::GET, "/health" | "/healthz") => routes::health_check(&state),

        (&Method::GET, "/api/data") => routes::handle_get_data(&state).await,

        (&Method::POST, "/api/data") => match read_body(req, state.args.max_body_bytes).await {
            Ok(body) => routes::handle_post_data(&state, body).await,
            Err(e) => routes::server_error_response(&e),
        },

        (&Method::POST, "/api/upload") => {
            let content_type = req
                .headers()
                .get(CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);
            match read_body(req, state.args.max_body_bytes).await {
                Ok(body) => routes::handle_upload(&state, content_type.as_deref(), body).await,
                Err(e) => routes::server_error_response(&e),
            }
        }

        (_, "/api/data" | "/api/upload") => {
            routes::error_response(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed")
        }

        _ => routes::server_error_response(&ServerError::NotFound(path)),
    };

    Ok(response)
}

/// Collect a request body, refusing anything over `limit` bytes
async fn read_body(req: Request<Incoming>, limit: usize) -> Result<Bytes, ServerError> {
    collect_limited(req.into_body(), limit).await
}

async fn collect_limited<B>(body: B, limit: usize) -> Result<Bytes, ServerError>
where
    B: hyper::body::Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    match Limited::new(body, limit).collect().await {
        Ok(collected) => Ok(collected.to_bytes()),
        Err(e) if e.downcast_ref::<LengthLimitError>().is_some() => {
            warn!(limit, "Request body over limit");
            Err(ServerError::PayloadTooLarge { limit })
        }
        Err(e) => Err(ServerError::BadRequest(format!("Failed to read request body: {}", e))),
    }
}
