//! Startup reconciliation between the local cache and the remote store
//!
//! Decision table, first match wins:
//!
//! ```text
//!  remote        local          result                 push to remote
//!  ------------  -------------  ---------------------  --------------
//!  unreachable   present        local                  no
//!  unreachable   absent         seed (memory only)     no
//!  empty         present        local                  yes
//!  empty         absent         seed                   yes
//!  document      both stamped   newer stamp, tie→remote  policy
//!  document      otherwise      remote                 no
//! ```
//!
//! The selection is pure; the caller performs the fetch, the cache read and
//! any resulting push.

use crate::document::PortfolioDocument;

/// Outcome of the single remote fetch done at startup
#[derive(Debug, Clone, PartialEq)]
pub enum RemoteState {
    /// Network or server failure
    Unreachable,
    /// Store answered but holds no document
    Empty,
    /// Store returned a document
    Present(PortfolioDocument),
}

/// Where the live document came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Remote,
    LocalCache,
    Seed,
}

impl std::fmt::Display for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Source::Remote => write!(f, "remote"),
            Source::LocalCache => write!(f, "local cache"),
            Source::Seed => write!(f, "seed"),
        }
    }
}

/// Knobs for the decision table
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcilePolicy {
    /// Push the local copy back when it beats a stamped remote copy.
    /// Off by default: the newer local copy then waits for the next
    /// mutation's debounced save.
    pub push_newer_local: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Reconciliation {
    pub document: PortfolioDocument,
    pub source: Source,
    /// Whether the caller should write `document` to the remote store
    pub push: bool,
}

impl Reconciliation {
    fn keep(document: PortfolioDocument, source: Source) -> Self {
        Self { document, source, push: false }
    }

    fn push(document: PortfolioDocument, source: Source) -> Self {
        Self { document, source, push: true }
    }
}

/// Pick the live document from what the cache and the remote store hold
pub fn reconcile(
    local: Option<PortfolioDocument>,
    remote: RemoteState,
    policy: &ReconcilePolicy,
) -> Reconciliation {
    match (remote, local) {
        (RemoteState::Unreachable, Some(local)) => Reconciliation::keep(local, Source::LocalCache),
        (RemoteState::Unreachable, None) => {
            Reconciliation::keep(PortfolioDocument::seed(), Source::Seed)
        }
        (RemoteState::Empty, Some(local)) => Reconciliation::push(local, Source::LocalCache),
        (RemoteState::Empty, None) => Reconciliation::push(PortfolioDocument::seed(), Source::Seed),
        (RemoteState::Present(remote), Some(local)) => {
            match (local.last_updated, remote.last_updated) {
                (Some(l), Some(r)) if l > r => Reconciliation {
                    document: local,
                    source: Source::LocalCache,
                    push: policy.push_newer_local,
                },
                _ => Reconciliation::keep(remote, Source::Remote),
            }
        }
        (RemoteState::Present(remote), None) => Reconciliation::keep(remote, Source::Remote),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stamped(name: &str, stamp: Option<i64>) -> PortfolioDocument {
        let mut doc = PortfolioDocument::default();
        doc.profile.name = name.into();
        doc.last_updated = stamp;
        doc
    }

    fn run(local: Option<PortfolioDocument>, remote: RemoteState) -> Reconciliation {
        reconcile(local, remote, &ReconcilePolicy::default())
    }

    #[test]
    fn test_unreachable_prefers_cache() {
        let r = run(Some(stamped("local", Some(1))), RemoteState::Unreachable);
        assert_eq!(r.source, Source::LocalCache);
        assert_eq!(r.document.profile.name, "local");
        assert!(!r.push);
    }

    #[test]
    fn test_unreachable_without_cache_keeps_seed_unpushed() {
        let r = run(None, RemoteState::Unreachable);
        assert_eq!(r.source, Source::Seed);
        assert_eq!(r.document, PortfolioDocument::seed());
        assert!(!r.push);
    }

    #[test]
    fn test_empty_remote_adopts_and_pushes_cache() {
        let r = run(Some(stamped("local", None)), RemoteState::Empty);
        assert_eq!(r.source, Source::LocalCache);
        assert!(r.push);
    }

    #[test]
    fn test_empty_remote_without_cache_pushes_seed() {
        let r = run(None, RemoteState::Empty);
        assert_eq!(r.source, Source::Seed);
        assert_eq!(r.document, PortfolioDocument::seed());
        assert!(r.push);
    }

    #[test]
    fn test_strictly_newer_local_wins() {
        let r = run(
            Some(stamped("local", Some(200))),
            RemoteState::Present(stamped("remote", Some(100))),
        );
        assert_eq!(r.source, Source::LocalCache);
        assert_eq!(r.document.profile.name, "local");
        assert!(!r.push);
    }

    #[test]
    fn test_tie_goes_to_remote() {
        let r = run(
            Some(stamped("local", Some(100))),
            RemoteState::Present(stamped("remote", Some(100))),
        );
        assert_eq!(r.source, Source::Remote);
        assert_eq!(r.document.profile.name, "remote");
    }

    #[test]
    fn test_older_local_loses() {
        let r = run(
            Some(stamped("local", Some(50))),
            RemoteState::Present(stamped("remote", Some(100))),
        );
        assert_eq!(r.document.profile.name, "remote");
    }

    #[test]
    fn test_missing_stamp_on_either_side_goes_to_remote() {
        let r = run(
            Some(stamped("local", None)),
            RemoteState::Present(stamped("remote", Some(1))),
        );
        assert_eq!(r.source, Source::Remote);

        let r = run(
            Some(stamped("local", Some(999))),
            RemoteState::Present(stamped("remote", None)),
        );
        assert_eq!(r.source, Source::Remote);
    }

    #[test]
    fn test_remote_wins_without_cache() {
        let r = run(None, RemoteState::Present(stamped("remote", Some(1))));
        assert_eq!(r.source, Source::Remote);
        assert!(!r.push);
    }

    #[test]
    fn test_policy_pushes_newer_local() {
        let policy = ReconcilePolicy { push_newer_local: true };
        let r = reconcile(
            Some(stamped("local", Some(200))),
            RemoteState::Present(stamped("remote", Some(100))),
            &policy,
        );
        assert_eq!(r.source, Source::LocalCache);
        assert!(r.push);
    }
}
