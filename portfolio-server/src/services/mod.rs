//! Outbound services

pub mod media_host;

pub use media_host::{ImageKind, MediaHost, MediaHostConfig, MediaHostError};
