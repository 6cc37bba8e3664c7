//! Portfolio store - the sync engine
//!
//! Owns the one live [`PortfolioDocument`] and keeps the local cache and the
//! remote store behind it:
//!
//! ```text
//!   mutation ──► commit ──► stamp lastUpdated
//!                  │
//!                  ├──► cache.write()            (synchronous)
//!                  ├──► reset debounce timer ──► remote.save()   (after quiet period)
//!                  └──► watch subscribers
//! ```
//!
//! Startup runs [`PortfolioStore::load`] once: read the cache, fetch the
//! remote copy, let [`portfolio_core::reconcile`] pick the winner.
//!
//! Remote failures never reach callers of the mutation methods. The
//! in-memory document and the cache stay authoritative; a failed save is
//! logged and superseded by the next one.

use portfolio_core::{
    reconcile, Direction, Entity, EntityPatch, PortfolioDocument, ProfilePatch, Reconciliation,
    ReconcilePolicy, RemoteState, Source,
};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::{watch, Notify};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::cache::LocalCache;
use crate::error::{Result, SyncError};
use crate::remote::RemoteStore;

/// Quiet period before a burst of mutations is written to the remote store
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(1000);

#[derive(Debug, Clone)]
pub struct SyncConfig {
    pub debounce: Duration,
    pub policy: ReconcilePolicy,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            debounce: DEFAULT_DEBOUNCE,
            policy: ReconcilePolicy::default(),
        }
    }
}

/// What startup reconciliation decided
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadReport {
    pub source: Source,
    /// A background save of the selected document was started
    pub pushed: bool,
}

/// Shared handle to the live portfolio document. Clones share state.
#[derive(Clone)]
pub struct PortfolioStore {
    inner: Arc<Inner>,
}

struct Inner {
    remote: Arc<dyn RemoteStore>,
    cache: Arc<dyn LocalCache>,
    config: SyncConfig,
    runtime: Handle,
    state: Mutex<State>,
    updates: watch::Sender<Arc<PortfolioDocument>>,
    in_flight: AtomicUsize,
    idle: Notify,
    loaded: AtomicBool,
}

struct State {
    document: Arc<PortfolioDocument>,
    pending: Option<JoinHandle<()>>,
    closed: bool,
}

impl PortfolioStore {
    /// Open the store with whatever the cache holds, or the seed.
    ///
    /// Does no network I/O; call [`load`](Self::load) to reconcile with the
    /// remote store. Must be called from within a Tokio runtime.
    pub fn open(
        remote: Arc<dyn RemoteStore>,
        cache: Arc<dyn LocalCache>,
        config: SyncConfig,
    ) -> Result<Self> {
        let runtime = Handle::try_current().map_err(|_| SyncError::NoRuntime)?;
        let document = Arc::new(cache.read().unwrap_or_else(PortfolioDocument::seed));
        let (updates, _) = watch::channel(Arc::clone(&document));

        Ok(Self {
            inner: Arc::new(Inner {
                remote,
                cache,
                config,
                runtime,
                state: Mutex::new(State {
                    document,
                    pending: None,
                    closed: false,
                }),
                updates,
                in_flight: AtomicUsize::new(0),
                idle: Notify::new(),
                loaded: AtomicBool::new(false),
            }),
        })
    }

    /// Startup reconciliation. Runs once per store.
    pub async fn load(&self) -> Result<LoadReport> {
        if self.inner.loaded.swap(true, Ordering::SeqCst) {
            return Err(SyncError::AlreadyLoaded);
        }

        let local = self.inner.cache.read();
        let mut unreadable = false;
        let remote = match self.inner.remote.fetch().await {
            Ok(Some(doc)) => RemoteState::Present(doc),
            Ok(None) => RemoteState::Empty,
            Err(e @ SyncError::Decode(_)) => {
                // Never save over a remote copy this build cannot read.
                error!(
                    error = %e,
                    "Remote document could not be decoded, remote saves disabled for this session"
                );
                unreadable = true;
                RemoteState::Unreachable
            }
            Err(e) => {
                warn!(error = %e, "Remote fetch failed, continuing with local data");
                RemoteState::Unreachable
            }
        };
        if unreadable {
            self.inner.lock_state().closed = true;
        }

        let Reconciliation { document, source, push } =
            reconcile(local, remote, &self.inner.config.policy);
        info!(
            %source,
            push,
            last_updated = ?document.last_updated,
            "Reconciled portfolio document"
        );

        let document = Arc::new(document);
        // An unpushed seed stays memory-only until the first edit
        if source != Source::Seed || push {
            self.inner.write_cache(&document);
        }
        self.inner.replace(Arc::clone(&document));

        if push {
            self.inner.spawn_save(document);
        }

        Ok(LoadReport { source, pushed: push })
    }

    // ========================================================================
    // Reads
    // ========================================================================

    /// The live document
    pub fn snapshot(&self) -> Arc<PortfolioDocument> {
        self.inner.snapshot()
    }

    /// Receiver that sees every committed document
    pub fn subscribe(&self) -> watch::Receiver<Arc<PortfolioDocument>> {
        self.inner.updates.subscribe()
    }

    /// False after [`shutdown`](Self::shutdown), or when startup found a
    /// remote document it could not decode
    pub fn saves_enabled(&self) -> bool {
        !self.inner.lock_state().closed
    }

    /// True while a remote save is in flight
    pub fn is_syncing(&self) -> bool {
        self.inner.in_flight.load(Ordering::SeqCst) > 0
    }

    /// Wait until no remote save is in flight. A save still waiting for its
    /// quiet period does not count; use [`flush`](Self::flush) for that.
    pub async fn wait_idle(&self) {
        loop {
            let notified = self.inner.idle.notified();
            if !self.is_syncing() {
                return;
            }
            notified.await;
        }
    }

    /// True while a debounced save is waiting for its quiet period
    pub fn has_pending_save(&self) -> bool {
        self.inner
            .lock_state()
            .pending
            .as_ref()
            .is_some_and(|h| !h.is_finished())
    }

    // ========================================================================
    // Content mutations
    // ========================================================================

    /// Shallow-merge into the profile
    pub fn update_profile(&self, patch: ProfilePatch) -> bool {
        self.inner.commit(|doc| doc.update_profile(patch))
    }

    /// Append a record to its collection
    pub fn add<E: Entity>(&self, record: E) -> Result<()> {
        let mut outcome = Ok(());
        self.inner.commit(|doc| match doc.add(record) {
            Ok(()) => true,
            Err(e) => {
                outcome = Err(e);
                false
            }
        });
        outcome.map_err(SyncError::from)
    }

    /// Merge a patch into the record with `id`; false if there is none
    pub fn update<P: EntityPatch>(&self, id: &str, patch: P) -> bool {
        self.inner.commit(|doc| doc.update(id, patch))
    }

    /// Remove the record with `id`; false if there is none
    pub fn delete<E: Entity>(&self, id: &str) -> bool {
        self.inner.commit(|doc| doc.remove::<E>(id))
    }

    /// Swap the record with its neighbour; false at the boundaries
    pub fn move_entry<E: Entity>(&self, id: &str, direction: Direction) -> bool {
        self.inner.commit(|doc| doc.move_entry::<E>(id, direction))
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Skip the rest of the quiet period and save now.
    ///
    /// Returns `Ok(false)` when no save was waiting.
    pub async fn flush(&self) -> Result<bool> {
        let waiting = {
            let mut state = self.inner.lock_state();
            match state.pending.take() {
                Some(handle) if !handle.is_finished() => {
                    handle.abort();
                    true
                }
                _ => false,
            }
        };
        if !waiting {
            return Ok(false);
        }
        let doc = self.inner.snapshot();
        self.inner.save(&doc).await?;
        Ok(true)
    }

    /// Cancel the pending save. Later mutations still update memory and
    /// cache but are not sent to the remote store.
    pub fn shutdown(&self) {
        let mut state = self.inner.lock_state();
        state.closed = true;
        if let Some(handle) = state.pending.take() {
            handle.abort();
            debug!("Cancelled pending remote save");
        }
    }
}

impl Inner {
    fn lock_state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn snapshot(&self) -> Arc<PortfolioDocument> {
        Arc::clone(&self.lock_state().document)
    }

    fn replace(&self, document: Arc<PortfolioDocument>) {
        self.lock_state().document = Arc::clone(&document);
        self.updates.send_replace(document);
    }

    fn write_cache(&self, doc: &PortfolioDocument) {
        if let Err(e) = self.cache.write(doc) {
            warn!(error = %e, "Failed to write local cache");
        }
    }

    /// Apply `mutate` to a copy of the live document. If it reports a change,
    /// stamp it, make it live, cache it and restart the debounce timer.
    fn commit(self: &Arc<Self>, mutate: impl FnOnce(&mut PortfolioDocument) -> bool) -> bool {
        let mut state = self.lock_state();
        let mut next = (*state.document).clone();
        if !mutate(&mut next) {
            return false;
        }
        next.touch();

        let next = Arc::new(next);
        state.document = Arc::clone(&next);
        self.write_cache(&next);
        if !state.closed {
            self.schedule_save(&mut state);
        }
        drop(state);

        self.updates.send_replace(next);
        true
    }

    fn schedule_save(self: &Arc<Self>, state: &mut State) {
        if let Some(previous) = state.pending.take() {
            previous.abort();
        }
        let inner = Arc::clone(self);
        let delay = self.config.debounce;
        state.pending = Some(self.runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            // Saved from its own task: aborting this timer must not cancel
            // a request that is already on the wire.
            let doc = inner.snapshot();
            inner.spawn_save(doc);
        }));
    }

    fn spawn_save(self: &Arc<Self>, doc: Arc<PortfolioDocument>) {
        // Counted before the task starts so `is_syncing` never misses it
        self.begin_save();
        let inner = Arc::clone(self);
        self.runtime.spawn(async move {
            let _ = inner.push(&doc).await;
            inner.end_save();
        });
    }

    async fn save(&self, doc: &PortfolioDocument) -> Result<()> {
        self.begin_save();
        let result = self.push(doc).await;
        self.end_save();
        result
    }

    fn begin_save(&self) {
        self.in_flight.fetch_add(1, Ordering::SeqCst);
    }

    fn end_save(&self) {
        if self.in_flight.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.idle.notify_waiters();
        }
    }

    async fn push(&self, doc: &PortfolioDocument) -> Result<()> {
        // TODO: send the last fetched stamp and let the server refuse to
        // overwrite a newer copy once more than one editor exists.
        match self.remote.save(doc).await {
            Ok(_) => {
                debug!(last_updated = ?doc.last_updated, "Saved portfolio to remote store");
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Remote save failed, local copy remains authoritative");
                Err(e)
            }
        }
    }
}
