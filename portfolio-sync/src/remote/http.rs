//! HTTP client for the persistence API (`/api/data`)

use async_trait::async_trait;
use portfolio_core::PortfolioDocument;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use super::RemoteStore;
use crate::error::{Result, SyncError};

#[derive(Debug, Clone)]
pub struct RemoteConfig {
    /// Base URL of the persistence API, e.g. `http://localhost:5000`
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_string(),
            timeout_secs: 30,
        }
    }
}

/// Remote store backed by `GET/POST /api/data`
///
/// # Example
///
/// ```rust,no_run
/// use portfolio_sync::{HttpRemoteStore, RemoteConfig, RemoteStore};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let remote = HttpRemoteStore::new(RemoteConfig {
///     base_url: "http://localhost:5000".into(),
///     ..Default::default()
/// })?;
///
/// if let Some(doc) = remote.fetch().await? {
///     println!("{}", doc.profile.name);
/// }
/// # Ok(())
/// # }
/// ```
pub struct HttpRemoteStore {
    config: RemoteConfig,
    client: Client,
}

impl HttpRemoteStore {
    pub fn new(config: RemoteConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { config, client })
    }

    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    fn data_url(&self) -> String {
        format!("{}/api/data", self.config.base_url.trim_end_matches('/'))
    }

    async fn handle_response(&self, response: reqwest::Response) -> Result<Value> {
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            return Err(SyncError::Server { status, message });
        }
        let text = response.text().await?;
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&text).map_err(|e| SyncError::Decode(e.to_string()))
    }
}

/// Interpret a persistence API body. `null`, and objects without a profile,
/// mean the store has no document yet. A profile-bearing body that does not
/// decode is [`SyncError::Decode`], never "empty".
pub(crate) fn document_from_value(value: Value) -> Result<Option<PortfolioDocument>> {
    match value.get("profile") {
        Some(profile) if !profile.is_null() => serde_json::from_value(value)
            .map(Some)
            .map_err(|e| SyncError::Decode(e.to_string())),
        _ => Ok(None),
    }
}

#[async_trait]
impl RemoteStore for HttpRemoteStore {
    async fn fetch(&self) -> Result<Option<PortfolioDocument>> {
        let response = self.client.get(self.data_url()).send().await?;
        let value = self.handle_response(response).await?;
        let doc = document_from_value(value)?;
        debug!(found = doc.is_some(), "Fetched remote document");
        Ok(doc)
    }

    async fn save(&self, doc: &PortfolioDocument) -> Result<Option<PortfolioDocument>> {
        let response = self.client.post(self.data_url()).json(doc).send().await?;
        let value = self.handle_response(response).await?;
        document_from_value(value)
    }
}
