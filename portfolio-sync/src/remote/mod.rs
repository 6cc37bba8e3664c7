//! Remote persistence seam
//!
//! The store only needs two calls: read the current document and overwrite
//! it in full. [`HttpRemoteStore`] talks to the persistence API;
//! [`MockRemoteStore`] scripts both calls for tests.

mod http;
pub mod mock;

pub use http::{HttpRemoteStore, RemoteConfig};
pub use mock::MockRemoteStore;

use async_trait::async_trait;
use portfolio_core::PortfolioDocument;

use crate::error::Result;

#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Current document, or `None` when the store holds nothing.
    async fn fetch(&self) -> Result<Option<PortfolioDocument>>;

    /// Overwrite the stored document. Returns what the store reports as saved.
    async fn save(&self, doc: &PortfolioDocument) -> Result<Option<PortfolioDocument>>;
}
