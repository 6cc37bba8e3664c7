//! Portfolio Sync - local-first persistence for the portfolio document
//!
//! [`PortfolioStore`] keeps one live document, mirrors every edit to a
//! [`LocalCache`] immediately and to a [`RemoteStore`] after a quiet period.
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use portfolio_core::{new_entity_id, Project};
//! use portfolio_sync::{FileCache, HttpRemoteStore, PortfolioStore, RemoteConfig, SyncConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let remote = Arc::new(HttpRemoteStore::new(RemoteConfig::default())?);
//! let cache = Arc::new(FileCache::new("/tmp/portfolio", "portfolio-data"));
//! let store = PortfolioStore::open(remote, cache, SyncConfig::default())?;
//! store.load().await?;
//!
//! store.add(Project {
//!     id: new_entity_id(),
//!     title: "Darkroom".into(),
//!     description: "Film scanning pipeline".into(),
//!     ..Default::default()
//! })?;
//! store.flush().await?;
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod error;
pub mod image_prep;
pub mod remote;
pub mod store;
pub mod upload;

pub use cache::{FileCache, LocalCache, MemoryCache, DEFAULT_CACHE_KEY};
pub use error::{Result, SyncError};
pub use image_prep::{prepare_image, PrepareOptions};
pub use remote::{HttpRemoteStore, MockRemoteStore, RemoteConfig, RemoteStore};
pub use store::{LoadReport, PortfolioStore, SyncConfig, DEFAULT_DEBOUNCE};
pub use upload::UploadClient;
