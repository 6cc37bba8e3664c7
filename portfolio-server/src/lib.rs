//! Portfolio server - persistence API and image upload relay
//!
//! Serves the single portfolio document the editor syncs against and relays
//! image uploads to the hosted media service.
//!
//! ## Routes
//!
//! - `GET /api/data` - the stored portfolio document, or `null`
//! - `POST /api/data` - overwrite the stored document and return it
//! - `POST /api/upload` - upload an image, returns `{"url": ...}`
//! - `GET /health` - liveness and backend availability

pub mod config;
pub mod db;
pub mod routes;
pub mod server;
pub mod services;
pub mod types;

pub use config::Args;
pub use server::{run, AppState};
pub use types::ServerError;
