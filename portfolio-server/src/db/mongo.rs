//! MongoDB client and the portfolio repository

use bson::{doc, DateTime, Document};
use mongodb::{Client, Collection, Database};
use portfolio_core::PortfolioDocument;
use tracing::{debug, info};

use crate::db::schemas::{from_stored, live_filter, upsert_update};
use crate::types::ServerError;

/// MongoDB client wrapper
#[derive(Clone)]
pub struct MongoClient {
    client: Client,
    db_name: String,
}

impl MongoClient {
    /// Connect and verify the server answers a ping
    pub async fn new(uri: &str, db_name: &str) -> Result<Self, ServerError> {
        info!("Connecting to MongoDB");

        // Fail fast instead of hanging on an unreachable server
        let timeout_uri = if uri.contains('?') {
            format!("{}&serverSelectionTimeoutMS=3000&connectTimeoutMS=3000", uri)
        } else {
            format!("{}?serverSelectionTimeoutMS=3000&connectTimeoutMS=3000", uri)
        };

        let client = Client::with_uri_str(&timeout_uri)
            .await
            .map_err(|e| ServerError::Database(format!("Failed to connect to MongoDB: {}", e)))?;

        client
            .database(db_name)
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|e| ServerError::Database(format!("MongoDB ping failed: {}", e)))?;

        info!("Connected to MongoDB database '{}'", db_name);

        Ok(Self {
            client,
            db_name: db_name.to_string(),
        })
    }

    pub fn database(&self) -> Database {
        self.client.database(&self.db_name)
    }

    pub fn db_name(&self) -> &str {
        &self.db_name
    }
}

/// Reads and writes the single portfolio document
#[derive(Clone)]
pub struct PortfolioRepository {
    collection: Collection<Document>,
}

impl PortfolioRepository {
    pub fn new(client: &MongoClient, collection_name: &str) -> Self {
        Self {
            collection: client.database().collection::<Document>(collection_name),
        }
    }

    /// The stored portfolio, if any. The collection is read by "find first",
    /// never by key.
    pub async fn find_first(&self) -> Result<Option<PortfolioDocument>, ServerError> {
        let raw = self
            .collection
            .find_one(live_filter())
            .await
            .map_err(|e| ServerError::Database(format!("Find failed: {}", e)))?;

        match raw {
            Some(raw) => from_stored(raw),
            None => Ok(None),
        }
    }

    /// Create the singleton or overwrite its known keys. Returns the stored result.
    pub async fn upsert(&self, doc: &PortfolioDocument) -> Result<PortfolioDocument, ServerError> {
        let update = upsert_update(doc, DateTime::now())?;
        let result = self
            .collection
            .update_one(live_filter(), update)
            .upsert(true)
            .await
            .map_err(|e| ServerError::Database(format!("Update failed: {}", e)))?;

        debug!(
            matched = result.matched_count,
            created = result.upserted_id.is_some(),
            last_updated = ?doc.last_updated,
            "Saved portfolio document"
        );

        Ok(self.find_first().await?.unwrap_or_else(|| doc.clone()))
    }
}

#[cfg(test)]
mod tests {
    // Integration tests would require a running MongoDB instance.
    // Update/decode logic is covered in db::schemas::portfolio.
}
