//! Local offline cache
//!
//! One string-keyed entry holding the serialized document. Written
//! synchronously on every committed mutation and read at startup. A missing
//! or unparseable entry reads as `None`.

use portfolio_core::PortfolioDocument;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use tracing::warn;

use crate::error::Result;

/// Default entry key
pub const DEFAULT_CACHE_KEY: &str = "portfolio-data";

pub trait LocalCache: Send + Sync {
    /// Cached document, if present and well-formed
    fn read(&self) -> Option<PortfolioDocument>;

    /// Replace the cached document
    fn write(&self, doc: &PortfolioDocument) -> Result<()>;
}

fn parse_entry(raw: &str, origin: &str) -> Option<PortfolioDocument> {
    match PortfolioDocument::from_json(raw) {
        Ok(doc) => Some(doc),
        Err(e) => {
            warn!(origin, error = %e, "Ignoring malformed cache entry");
            None
        }
    }
}

// ============================================================================
// File cache
// ============================================================================

/// Cache stored as `<dir>/<key>.json`
#[derive(Debug, Clone)]
pub struct FileCache {
    path: PathBuf,
}

impl FileCache {
    pub fn new(dir: impl AsRef<Path>, key: &str) -> Self {
        Self {
            path: dir.as_ref().join(format!("{}.json", key)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl LocalCache for FileCache {
    fn read(&self) -> Option<PortfolioDocument> {
        match std::fs::read_to_string(&self.path) {
            Ok(raw) => parse_entry(&raw, &self.path.display().to_string()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Failed to read cache");
                None
            }
        }
    }

    fn write(&self, doc: &PortfolioDocument) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = doc.to_json()?;
        // Write-then-rename so a crash never leaves a half-written entry
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

// ============================================================================
// Memory cache
// ============================================================================

/// Cache held in process memory
#[derive(Debug, Default)]
pub struct MemoryCache {
    entry: Mutex<Option<String>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with a pre-serialized entry, which need not be valid JSON
    pub fn with_raw(raw: impl Into<String>) -> Self {
        Self {
            entry: Mutex::new(Some(raw.into())),
        }
    }

    pub fn with_document(doc: &PortfolioDocument) -> Result<Self> {
        Ok(Self::with_raw(doc.to_json()?))
    }

    /// The stored string, exactly as written
    pub fn raw(&self) -> Option<String> {
        self.entry.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

impl LocalCache for MemoryCache {
    fn read(&self) -> Option<PortfolioDocument> {
        self.raw().and_then(|raw| parse_entry(&raw, "memory"))
    }

    fn write(&self, doc: &PortfolioDocument) -> Result<()> {
        let json = doc.to_json()?;
        *self.entry.lock().unwrap_or_else(PoisonError::into_inner) = Some(json);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_file_cache_missing_is_none() {
        let dir = TempDir::new().unwrap();
        let cache = FileCache::new(dir.path(), DEFAULT_CACHE_KEY);
        assert!(cache.read().is_none());
    }

    #[test]
    fn test_file_cache_write_then_read() {
        let dir = TempDir::new().unwrap();
        let cache = FileCache::new(dir.path().join("nested"), "entry");

        let mut doc = PortfolioDocument::seed();
        doc.touch_at(1234);
        cache.write(&doc).unwrap();

        assert!(cache.path().ends_with("nested/entry.json"));
        assert_eq!(cache.read(), Some(doc));
        assert!(!dir.path().join("nested/entry.json.tmp").exists());
    }

    #[test]
    fn test_file_cache_malformed_is_none() {
        let dir = TempDir::new().unwrap();
        let cache = FileCache::new(dir.path(), "entry");
        std::fs::write(cache.path(), "{ not json").unwrap();
        assert!(cache.read().is_none());
    }

    #[test]
    fn test_memory_cache() {
        let cache = MemoryCache::new();
        assert!(cache.read().is_none());

        let doc = PortfolioDocument::seed();
        cache.write(&doc).unwrap();
        assert_eq!(cache.read(), Some(doc));
    }

    #[test]
    fn test_memory_cache_malformed_is_none() {
        assert!(MemoryCache::with_raw("[1,2").read().is_none());
        assert!(MemoryCache::with_raw("{\"skills\":[]}").read().is_none());
    }
}
