//! User directory cache.
//!
//! One cache entry holds the full user collection together with its fetch
//! state and a staleness flag. State lives in a `tokio::sync::watch` channel:
//! every transition publishes a new [`DirectorySnapshot`] to subscribers, and
//! transitions are applied synchronously so no lock is held across the
//! transport await.
//!
//! Invalidation and refetching are separate steps. [`DirectoryCache::invalidate`]
//! only flags the entry; the next consumer read through
//! [`DirectoryCache::ensure_fresh`] performs the fetch. Concurrent fetches are
//! coalesced: while one is pending, further calls return
//! [`FetchOutcome::Coalesced`] without touching the transport. A response only
//! clears the stale flag when no invalidation happened after its request was
//! issued.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::watch;
use tracing::{debug, warn};

use crate::domain::RequestStatus;
use crate::domain::User;
use crate::domain::ports::UsersApi;

/// Fetch state of the cache entry.
///
/// Data exists only in [`FetchState::Success`] and a message only in
/// [`FetchState::Error`], so the two can never be observed together.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FetchState {
    /// Never fetched.
    #[default]
    Idle,
    /// A fetch is in flight.
    Pending,
    /// Users returned by the last fetch, in server order.
    Success(Vec<User>),
    /// Rendered message of the last fetch failure.
    Error(String),
}

/// Observable view of the cache entry.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DirectorySnapshot {
    state: FetchState,
    is_stale: bool,
    invalidations: u64,
}

impl DirectorySnapshot {
    /// Full fetch state.
    #[must_use]
    pub fn state(&self) -> &FetchState {
        &self.state
    }

    /// Coarse lifecycle status.
    #[must_use]
    pub fn status(&self) -> RequestStatus {
        match self.state {
            FetchState::Idle => RequestStatus::Idle,
            FetchState::Pending => RequestStatus::Pending,
            FetchState::Success(_) => RequestStatus::Success,
            FetchState::Error(_) => RequestStatus::Error,
        }
    }

    /// Users from the last successful fetch; `None` unless the status is
    /// success.
    #[must_use]
    pub fn data(&self) -> Option<&[User]> {
        match &self.state {
            FetchState::Success(users) => Some(users.as_slice()),
            FetchState::Idle | FetchState::Pending | FetchState::Error(_) => None,
        }
    }

    /// Failure message; `None` unless the status is error.
    #[must_use]
    pub fn error_message(&self) -> Option<&str> {
        match &self.state {
            FetchState::Error(message) => Some(message.as_str()),
            FetchState::Idle | FetchState::Pending | FetchState::Success(_) => None,
        }
    }

    /// Whether a mutation has outdated the cached collection.
    #[must_use]
    pub fn is_stale(&self) -> bool {
        self.is_stale
    }

    /// Whether the next read has to refetch.
    #[must_use]
    pub fn needs_fetch(&self) -> bool {
        self.is_stale || matches!(self.state, FetchState::Idle)
    }
}

/// What a call to [`DirectoryCache::fetch`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The response was applied to the cache.
    Applied,
    /// Another fetch was already pending; no request was issued.
    Coalesced,
    /// The cache was torn down; any response was dropped.
    Discarded,
}

/// Cache for the full user collection.
pub struct DirectoryCache<A: ?Sized> {
    api: Arc<A>,
    state: watch::Sender<DirectorySnapshot>,
    torn_down: AtomicBool,
}

impl<A: ?Sized> std::fmt::Debug for DirectoryCache<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DirectoryCache")
            .field("state", &*self.state.borrow())
            .field("torn_down", &self.torn_down.load(Ordering::Acquire))
            .finish_non_exhaustive()
    }
}

impl<A> DirectoryCache<A>
where
    A: UsersApi + ?Sized,
{
    /// Create an idle cache backed by `api`.
    #[must_use]
    pub fn new(api: Arc<A>) -> Self {
        let (state, _initial_receiver) = watch::channel(DirectorySnapshot::default());
        Self {
            api,
            state,
            torn_down: AtomicBool::new(false),
        }
    }

    /// Current snapshot.
    #[must_use]
    pub fn snapshot(&self) -> DirectorySnapshot {
        self.state.borrow().clone()
    }

    /// Subscribe to every state transition.
    ///
    /// The receiver starts with the current snapshot marked as seen.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<DirectorySnapshot> {
        self.state.subscribe()
    }

    /// Fetch the full collection, replacing the cached data wholesale.
    ///
    /// A call made while another fetch is pending is coalesced into it. On
    /// failure the entry moves to the error state carrying the rendered
    /// transport message; the stale flag is left as it was.
    pub async fn fetch(&self) -> FetchOutcome {
        if self.is_torn_down() {
            return FetchOutcome::Discarded;
        }

        let mut started_at = None;
        self.state.send_if_modified(|snapshot| {
            if matches!(snapshot.state, FetchState::Pending) {
                return false;
            }
            snapshot.state = FetchState::Pending;
            started_at = Some(snapshot.invalidations);
            true
        });
        let Some(issued_at) = started_at else {
            debug!("directory fetch coalesced with in-flight request");
            return FetchOutcome::Coalesced;
        };

        let result = self.api.list_users().await;
        if self.is_torn_down() {
            debug!("directory cache torn down; discarding fetch response");
            return FetchOutcome::Discarded;
        }

        match result {
            Ok(users) => {
                debug!(count = users.len(), "directory fetch succeeded");
                self.state.send_modify(|snapshot| {
                    snapshot.state = FetchState::Success(users);
                    if snapshot.invalidations == issued_at {
                        snapshot.is_stale = false;
                    } else {
                        debug!("directory invalidated while fetching; staying stale");
                    }
                });
            }
            Err(error) => {
                warn!(error = %error, kind = error.kind(), "directory fetch failed");
                self.state.send_modify(|snapshot| {
                    snapshot.state = FetchState::Error(error.to_string());
                });
            }
        }
        FetchOutcome::Applied
    }

    /// Mark the cached collection as outdated without fetching.
    ///
    /// A fetch already in flight still applies its data but leaves the entry
    /// stale, so the next read refetches.
    pub fn invalidate(&self) {
        let flipped = self.state.send_if_modified(|snapshot| {
            let was_stale = snapshot.is_stale;
            snapshot.is_stale = true;
            snapshot.invalidations = snapshot.invalidations.wrapping_add(1);
            !was_stale
        });
        if flipped {
            debug!("directory cache invalidated");
        }
    }

    /// Consumer read: fetch when the entry is idle or stale, then return the
    /// resulting snapshot.
    pub async fn ensure_fresh(&self) -> DirectorySnapshot {
        let needs_fetch = self.state.borrow().needs_fetch();
        if needs_fetch {
            self.fetch().await;
        }
        self.snapshot()
    }

    /// Detach the cache from its consumer. Responses that arrive afterwards
    /// are dropped instead of being applied.
    pub fn teardown(&self) {
        self.torn_down.store(true, Ordering::Release);
    }

    fn is_torn_down(&self) -> bool {
        self.torn_down.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests;
