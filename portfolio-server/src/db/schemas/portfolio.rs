//! Portfolio document as stored in MongoDB
//!
//! The collection holds one document: the portfolio's top-level keys plus a
//! `metadata` sub-document the server maintains.
//!
//! ```text
//! {
//!   _id, profile, skills, projects, experiences, achievements,
//!   services, portfolioCategories, lastUpdated,
//!   metadata: { is_deleted, created_at, updated_at }
//! }
//! ```

use bson::{doc, Bson, DateTime, Document};
use portfolio_core::PortfolioDocument;

use crate::types::ServerError;

/// Top-level keys a save replaces. Anything else a client sends is dropped.
pub const PORTFOLIO_KEYS: [&str; 8] = [
    "profile",
    "skills",
    "projects",
    "experiences",
    "achievements",
    "services",
    "portfolioCategories",
    "lastUpdated",
];

/// Matches the live singleton, including documents written before metadata existed
pub fn live_filter() -> Document {
    doc! { "metadata.is_deleted": { "$ne": true } }
}

/// Update that overwrites every known key of the singleton, creating it on first save
pub fn upsert_update(doc: &PortfolioDocument, now: DateTime) -> Result<Document, ServerError> {
    let encoded = bson::to_document(doc)?;

    let mut set = Document::new();
    for key in PORTFOLIO_KEYS {
        set.insert(key, encoded.get(key).cloned().unwrap_or(Bson::Null));
    }
    set.insert("metadata.updated_at", now);

    Ok(doc! {
        "$set": set,
        "$setOnInsert": {
            "metadata.created_at": now,
            "metadata.is_deleted": false,
        },
    })
}

/// Decode a stored document. Documents without a profile count as absent.
pub fn from_stored(raw: Document) -> Result<Option<PortfolioDocument>, ServerError> {
    match raw.get("profile") {
        Some(Bson::Document(_)) => Ok(Some(bson::from_document(raw)?)),
        _ => Ok(None),
    }
}
