//! Tests for the directory cache state machine.

use std::sync::Mutex;
use std::sync::atomic::AtomicUsize;

use async_trait::async_trait;
use rstest::{fixture, rstest};

use super::*;
use crate::domain::ports::{FixtureUsersApi, TransportError};
use crate::domain::{AccountType, NewUser, UserId};

/// Users endpoint that yields once before answering so a second caller can
/// observe the pending state.
struct YieldingUsersApi {
    list_calls: AtomicUsize,
    response: Mutex<Result<Vec<User>, TransportError>>,
}

impl YieldingUsersApi {
    fn answering(response: Result<Vec<User>, TransportError>) -> Self {
        Self {
            list_calls: AtomicUsize::new(0),
            response: Mutex::new(response),
        }
    }

    fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    fn set_response(&self, response: Result<Vec<User>, TransportError>) {
        *self.response.lock().expect("response lock") = response;
    }
}

#[async_trait]
impl UsersApi for YieldingUsersApi {
    async fn list_users(&self) -> Result<Vec<User>, TransportError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;
        self.response.lock().expect("response lock").clone()
    }

    async fn get_user(&self, _id: UserId) -> Result<User, TransportError> {
        Err(TransportError::invalid_request("not exercised"))
    }

    async fn create_user(&self, _user: &NewUser) -> Result<User, TransportError> {
        Err(TransportError::invalid_request("not exercised"))
    }

    async fn update_user(&self, _user: &User) -> Result<User, TransportError> {
        Err(TransportError::invalid_request("not exercised"))
    }

    async fn delete_user(&self, _id: UserId) -> Result<(), TransportError> {
        Err(TransportError::invalid_request("not exercised"))
    }
}

fn sample_users(count: i64) -> Vec<User> {
    (1..=count)
        .map(|n| {
            User::new(
                UserId::new(n * 10),
                format!("User {n}"),
                format!("user{n}@example.com"),
                AccountType::User,
            )
        })
        .collect()
}

#[fixture]
fn yielding() -> Arc<YieldingUsersApi> {
    Arc::new(YieldingUsersApi::answering(Ok(sample_users(3))))
}

#[rstest]
fn new_cache_is_idle_and_fresh() {
    let cache = DirectoryCache::new(Arc::new(FixtureUsersApi::default()));
    let snapshot = cache.snapshot();

    assert_eq!(snapshot.status(), RequestStatus::Idle);
    assert!(snapshot.data().is_none());
    assert!(snapshot.error_message().is_none());
    assert!(!snapshot.is_stale());
}

#[rstest]
#[case::one(1)]
#[case::several(5)]
#[tokio::test]
async fn fetch_preserves_server_order(#[case] count: i64) {
    let users = sample_users(count);
    let cache = DirectoryCache::new(Arc::new(FixtureUsersApi::with_users(users.clone())));

    assert_eq!(cache.fetch().await, FetchOutcome::Applied);

    let snapshot = cache.snapshot();
    assert_eq!(snapshot.status(), RequestStatus::Success);
    assert_eq!(snapshot.data(), Some(users.as_slice()));
    assert!(snapshot.error_message().is_none());
}

#[rstest]
#[tokio::test]
async fn empty_directory_is_a_successful_empty_list() {
    let cache = DirectoryCache::new(Arc::new(FixtureUsersApi::default()));

    cache.fetch().await;

    let snapshot = cache.snapshot();
    assert_eq!(snapshot.status(), RequestStatus::Success);
    assert_eq!(snapshot.data(), Some(&[][..]));
}

#[rstest]
#[tokio::test]
async fn transport_failure_moves_to_error_without_data(yielding: Arc<YieldingUsersApi>) {
    yielding.set_response(Err(TransportError::status(500_u16, "boom")));
    let cache = DirectoryCache::new(yielding);

    cache.fetch().await;

    let snapshot = cache.snapshot();
    assert_eq!(snapshot.status(), RequestStatus::Error);
    assert!(snapshot.data().is_none());
    assert_eq!(
        snapshot.error_message(),
        Some("Request failed with status code 500")
    );
}

#[rstest]
#[tokio::test]
async fn error_replaces_previously_displayed_data(yielding: Arc<YieldingUsersApi>) {
    let cache = DirectoryCache::new(Arc::clone(&yielding));
    cache.fetch().await;
    assert!(cache.snapshot().data().is_some());

    yielding.set_response(Err(TransportError::unreachable("connection reset")));
    cache.fetch().await;

    let snapshot = cache.snapshot();
    assert!(snapshot.data().is_none());
    assert_eq!(
        snapshot.error_message(),
        Some("Network error: connection reset")
    );
}

#[rstest]
#[tokio::test]
async fn concurrent_fetches_issue_one_request(yielding: Arc<YieldingUsersApi>) {
    let cache = DirectoryCache::new(Arc::clone(&yielding));

    let (first, second) = tokio::join!(cache.fetch(), cache.fetch());

    assert_eq!(first, FetchOutcome::Applied);
    assert_eq!(second, FetchOutcome::Coalesced);
    assert_eq!(yielding.list_calls(), 1);
    assert_eq!(cache.snapshot().status(), RequestStatus::Success);
}

#[rstest]
#[tokio::test]
async fn fetch_after_completion_issues_a_new_request(yielding: Arc<YieldingUsersApi>) {
    let cache = DirectoryCache::new(Arc::clone(&yielding));

    cache.fetch().await;
    cache.fetch().await;

    assert_eq!(yielding.list_calls(), 2);
}

#[rstest]
#[tokio::test]
async fn invalidate_flags_without_fetching(yielding: Arc<YieldingUsersApi>) {
    let cache = DirectoryCache::new(Arc::clone(&yielding));
    cache.fetch().await;

    cache.invalidate();

    assert!(cache.snapshot().is_stale());
    assert_eq!(cache.snapshot().status(), RequestStatus::Success);
    assert_eq!(yielding.list_calls(), 1);
}

#[rstest]
#[tokio::test]
async fn ensure_fresh_refetches_only_when_needed(yielding: Arc<YieldingUsersApi>) {
    let cache = DirectoryCache::new(Arc::clone(&yielding));

    cache.ensure_fresh().await;
    cache.ensure_fresh().await;
    assert_eq!(yielding.list_calls(), 1, "fresh entry must not refetch");

    cache.invalidate();
    let snapshot = cache.ensure_fresh().await;

    assert_eq!(yielding.list_calls(), 2);
    assert!(!snapshot.is_stale());
    assert_eq!(snapshot.status(), RequestStatus::Success);
}

#[rstest]
#[tokio::test]
async fn invalidation_during_a_fetch_survives_its_response(yielding: Arc<YieldingUsersApi>) {
    let cache = DirectoryCache::new(Arc::clone(&yielding));

    let (outcome, ()) = tokio::join!(cache.fetch(), async { cache.invalidate() });

    assert_eq!(outcome, FetchOutcome::Applied);
    let snapshot = cache.snapshot();
    assert_eq!(snapshot.status(), RequestStatus::Success);
    assert!(snapshot.is_stale(), "response predates the invalidation");

    let refreshed = cache.ensure_fresh().await;
    assert_eq!(yielding.list_calls(), 2);
    assert!(!refreshed.is_stale());
}

#[rstest]
#[tokio::test]
async fn stale_entry_refetched_without_new_invalidation_becomes_fresh(
    yielding: Arc<YieldingUsersApi>,
) {
    let cache = DirectoryCache::new(Arc::clone(&yielding));
    cache.fetch().await;
    cache.invalidate();
    cache.invalidate();

    let snapshot = cache.ensure_fresh().await;

    assert!(!snapshot.is_stale());
    assert_eq!(yielding.list_calls(), 2);
}

#[rstest]
#[tokio::test]
async fn failed_refetch_keeps_the_stale_flag(yielding: Arc<YieldingUsersApi>) {
    let cache = DirectoryCache::new(Arc::clone(&yielding));
    cache.fetch().await;
    cache.invalidate();

    yielding.set_response(Err(TransportError::status(503_u16, "")));
    let snapshot = cache.ensure_fresh().await;

    assert_eq!(snapshot.status(), RequestStatus::Error);
    assert!(snapshot.is_stale());
}

#[rstest]
#[tokio::test]
async fn subscribers_observe_pending_then_success(yielding: Arc<YieldingUsersApi>) {
    let cache = DirectoryCache::new(yielding);
    let mut receiver = cache.subscribe();

    let observe = async {
        receiver.changed().await.expect("cache alive");
        let pending = receiver.borrow_and_update().status();
        receiver.changed().await.expect("cache alive");
        let settled = receiver.borrow_and_update().status();
        (pending, settled)
    };
    let (outcome, (pending, settled)) = tokio::join!(cache.fetch(), observe);

    assert_eq!(outcome, FetchOutcome::Applied);
    assert_eq!(pending, RequestStatus::Pending);
    assert_eq!(settled, RequestStatus::Success);
}

#[rstest]
#[tokio::test]
async fn responses_after_teardown_are_discarded(yielding: Arc<YieldingUsersApi>) {
    let cache = DirectoryCache::new(Arc::clone(&yielding));

    let (outcome, ()) = tokio::join!(cache.fetch(), async { cache.teardown() });

    assert_eq!(outcome, FetchOutcome::Discarded);
    assert_eq!(yielding.list_calls(), 1);
    assert_eq!(cache.snapshot().status(), RequestStatus::Pending);
    assert_eq!(cache.fetch().await, FetchOutcome::Discarded);
    assert_eq!(yielding.list_calls(), 1);
}
