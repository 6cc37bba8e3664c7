//! Stored document layouts

pub mod portfolio;

pub use portfolio::{from_stored, live_filter, upsert_update, PORTFOLIO_KEYS};
