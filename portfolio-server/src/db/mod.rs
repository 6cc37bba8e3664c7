//! MongoDB persistence for the portfolio document

pub mod mongo;
pub mod schemas;

pub use mongo::{MongoClient, PortfolioRepository};
