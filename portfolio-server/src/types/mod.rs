//! Shared server types

pub mod error;

pub use error::ServerError;
