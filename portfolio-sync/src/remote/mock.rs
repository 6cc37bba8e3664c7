//! Scriptable in-memory remote store for tests

use async_trait::async_trait;
use portfolio_core::PortfolioDocument;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use super::RemoteStore;
use crate::error::{Result, SyncError};

/// Mock remote store.
///
/// Behaves like a single-document store: a successful save replaces the
/// held document. Every saved document is also recorded in order.
pub struct MockRemoteStore {
    document: Mutex<Option<PortfolioDocument>>,
    saves: Mutex<Vec<PortfolioDocument>>,
    reachable: AtomicBool,
    fail_saves: AtomicBool,
    undecodable: AtomicBool,
    fetch_count: AtomicU32,
}

impl MockRemoteStore {
    /// A reachable store holding nothing
    pub fn empty() -> Self {
        Self {
            document: Mutex::new(None),
            saves: Mutex::new(Vec::new()),
            reachable: AtomicBool::new(true),
            fail_saves: AtomicBool::new(false),
            undecodable: AtomicBool::new(false),
            fetch_count: AtomicU32::new(0),
        }
    }

    /// A reachable store holding `doc`
    pub fn with_document(doc: PortfolioDocument) -> Self {
        let store = Self::empty();
        *lock(&store.document) = Some(doc);
        store
    }

    /// A store whose every call fails
    pub fn unreachable() -> Self {
        let store = Self::empty();
        store.reachable.store(false, Ordering::SeqCst);
        store
    }

    /// Fetches succeed but saves fail
    pub fn with_failing_saves(self) -> Self {
        self.fail_saves.store(true, Ordering::SeqCst);
        self
    }

    /// Fetches answer with a document that cannot be decoded
    pub fn undecodable() -> Self {
        let store = Self::empty();
        store.undecodable.store(true, Ordering::SeqCst);
        store
    }

    pub fn set_reachable(&self, reachable: bool) {
        self.reachable.store(reachable, Ordering::SeqCst);
    }

    /// Document the store currently holds
    pub fn document(&self) -> Option<PortfolioDocument> {
        lock(&self.document).clone()
    }

    /// Every save call that reached the store, oldest first
    pub fn saves(&self) -> Vec<PortfolioDocument> {
        lock(&self.saves).clone()
    }

    pub fn save_count(&self) -> usize {
        lock(&self.saves).len()
    }

    pub fn fetch_count(&self) -> u32 {
        self.fetch_count.load(Ordering::SeqCst)
    }
}

impl Default for MockRemoteStore {
    fn default() -> Self {
        Self::empty()
    }
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

fn unavailable() -> SyncError {
    SyncError::Server {
        status: 503,
        message: "Mock remote unreachable".to_string(),
    }
}

#[async_trait]
impl RemoteStore for MockRemoteStore {
    async fn fetch(&self) -> Result<Option<PortfolioDocument>> {
        self.fetch_count.fetch_add(1, Ordering::SeqCst);
        if !self.reachable.load(Ordering::SeqCst) {
            return Err(unavailable());
        }
        if self.undecodable.load(Ordering::SeqCst) {
            return Err(SyncError::Decode("mock document has an unknown skill level".to_string()));
        }
        Ok(self.document())
    }

    async fn save(&self, doc: &PortfolioDocument) -> Result<Option<PortfolioDocument>> {
        lock(&self.saves).push(doc.clone());
        if !self.reachable.load(Ordering::SeqCst) || self.fail_saves.load(Ordering::SeqCst) {
            return Err(unavailable());
        }
        *lock(&self.document) = Some(doc.clone());
        Ok(Some(doc.clone()))
    }
}
