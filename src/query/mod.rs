//! Query cache.
//!
//! A process-wide keyed store of last-known query results with stale-while-revalidate
//! semantics. The cache lives on a single thread; fetches run as local tasks
//! (`tokio::task::spawn_local`), so every method that may start a fetch must be called from
//! inside a [`tokio::task::LocalSet`].
//!
//! Every fetch takes a generation from a counter shared by the whole client. Each entry records
//! `issued`, the generation of its newest fetch, and `applied`, the generation of the newest
//! result written into it. A completing fetch whose generation is not newer than `applied` has
//! been superseded and is discarded, so a slow stale response can never overwrite a newer one.
//! New entries start with `applied` at the current counter, so a fetch started before a key was
//! removed cannot write into the entry that replaces it.
//!
//! Views observe entries through [`QuerySubscription`]s (a `tokio::sync::watch` receiver per
//! subscriber). Invalidation refetches only entries that have at least one live subscription;
//! other entries are marked stale and refetch on their next [`QueryClient::query`].

mod mutation;

pub use mutation::*;

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::rc::Rc;

use chrono::{DateTime, Utc};
use futures::future::{FutureExt, LocalBoxFuture};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::watch;

use crate::errors::ClientError;

/// Result of one fetch.
pub type QueryResult = Result<Value, ClientError>;

/// No-argument operation producing a query's data.
pub type Fetcher = Rc<dyn Fn() -> LocalBoxFuture<'static, QueryResult>>;

/// Wrap an async closure as a [`Fetcher`].
pub fn fetcher<F, Fut>(f: F) -> Fetcher
where
    F: Fn() -> Fut + 'static,
    Fut: Future<Output = QueryResult> + 'static,
{
    Rc::new(move || f().boxed_local())
}

/// Stable identity of a query: an ordered tuple of string segments.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey(Vec<String>);

impl QueryKey {
    pub fn new<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(segments.into_iter().map(Into::into).collect())
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// True when `prefix`'s segments are the leading segments of this key.
    pub fn starts_with(&self, prefix: &QueryKey) -> bool {
        self.0.starts_with(&prefix.0)
    }

    /// This key extended by one segment.
    pub fn child(&self, segment: impl Into<String>) -> Self {
        let mut segments = self.0.clone();
        segments.push(segment.into());
        Self(segments)
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({})", self.0.join(", "))
    }
}

/// Where an entry is in its lifecycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum QueryStatus {
    /// Subscribed to, but never queried.
    #[default]
    Idle,
    /// First fetch in flight, no data yet.
    Loading,
    Loaded,
    /// The newest result was a failure. Older data, if any, is still in `data`.
    LoadFailed,
}

/// Snapshot of one cache entry as a view sees it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryState {
    pub status: QueryStatus,
    /// Last successfully fetched data; kept across failures and invalidations.
    pub data: Option<Value>,
    /// Error of the newest result, if it failed.
    pub error: Option<ClientError>,
    /// A fetch is in flight (initial load or background revalidation).
    pub is_fetching: bool,
    /// The data predates an invalidation.
    pub is_stale: bool,
    pub updated_at: Option<DateTime<Utc>>,
}

impl QueryState {
    pub fn is_loading(&self) -> bool {
        self.status == QueryStatus::Loading
    }

    pub fn is_error(&self) -> bool {
        self.status == QueryStatus::LoadFailed
    }

    /// Neither idle nor waiting for a result.
    pub fn is_settled(&self) -> bool {
        !self.is_fetching && matches!(self.status, QueryStatus::Loaded | QueryStatus::LoadFailed)
    }

    /// Decode the cached data.
    pub fn data_as<T: DeserializeOwned>(&self) -> Option<Result<T, ClientError>> {
        self.data
            .as_ref()
            .map(|data| serde_json::from_value(data.clone()).map_err(ClientError::from))
    }
}

/// Live view of one cache entry. Dropping it unsubscribes.
pub struct QuerySubscription {
    key: QueryKey,
    receiver: watch::Receiver<QueryState>,
}

impl QuerySubscription {
    pub fn key(&self) -> &QueryKey {
        &self.key
    }

    /// Current snapshot.
    pub fn state(&self) -> QueryState {
        self.receiver.borrow().clone()
    }

    /// Wait for the next change of the entry. Returns `false` once the cache is gone.
    pub async fn changed(&mut self) -> bool {
        self.receiver.changed().await.is_ok()
    }

    /// Wait until the entry has a result and no fetch is in flight.
    pub async fn settled(&mut self) -> QueryState {
        if let Ok(state) = self.receiver.wait_for(QueryState::is_settled).await {
            return state.clone();
        }
        self.receiver.borrow().clone()
    }
}

struct Entry {
    state: watch::Sender<QueryState>,
    fetcher: Option<Fetcher>,
    issued: u64,
    applied: u64,
    stale: bool,
}

impl Entry {
    fn new(fetcher: Option<Fetcher>, generation: u64) -> Self {
        let (state, _) = watch::channel(QueryState::default());
        Self {
            state,
            fetcher,
            issued: generation,
            applied: generation,
            stale: false,
        }
    }

    fn never_fetched(&self) -> bool {
        self.state.borrow().status == QueryStatus::Idle
    }

    fn in_flight(&self) -> bool {
        self.issued > self.applied
    }

    fn has_subscribers(&self) -> bool {
        self.state.receiver_count() > 0
    }
}

/// Handle to the process-wide query cache. Clones share the same store.
#[derive(Clone, Default)]
pub struct QueryClient {
    entries: Rc<RefCell<HashMap<QueryKey, Entry>>>,
    generation: Rc<Cell<u64>>,
}

impl QueryClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state for `key`, fetching with `fetcher` when the entry is missing, stale or
    /// was never fetched. Callers arriving while a fetch is in flight share it.
    pub fn query(&self, key: &QueryKey, fetcher: Fetcher) -> QueryState {
        let start = {
            let mut entries = self.entries.borrow_mut();
            let entry = entries
                .entry(key.clone())
                .or_insert_with(|| Entry::new(None, self.generation.get()));
            entry.fetcher = Some(fetcher);
            entry.stale || entry.never_fetched()
        };

        if start {
            self.start_fetch(key);
        }
        self.get(key).unwrap_or_default()
    }

    /// Query and wait for the settled result.
    pub async fn fetch(&self, key: &QueryKey, fetcher: Fetcher) -> QueryResult {
        let mut subscription = self.subscribe(key);
        self.query(key, fetcher);
        let state = subscription.settled().await;

        match (state.status, state.data, state.error) {
            (QueryStatus::Loaded, Some(data), _) => Ok(data),
            (_, _, Some(error)) => Err(error),
            _ => Err(ClientError::Decode(format!("query {} settled without data", key))),
        }
    }

    /// Snapshot of an entry without fetching.
    pub fn get(&self, key: &QueryKey) -> Option<QueryState> {
        self.entries
            .borrow()
            .get(key)
            .map(|entry| entry.state.borrow().clone())
    }

    /// Register interest in `key`. An entry that does not exist yet is created idle.
    pub fn subscribe(&self, key: &QueryKey) -> QuerySubscription {
        let mut entries = self.entries.borrow_mut();
        let entry = entries
            .entry(key.clone())
            .or_insert_with(|| Entry::new(None, self.generation.get()));
        QuerySubscription {
            key: key.clone(),
            receiver: entry.state.subscribe(),
        }
    }

    /// Mark every entry under `prefix` stale and refetch the ones that have subscribers.
    /// Displayed data is left in place until the refetch resolves.
    pub fn invalidate(&self, prefix: &QueryKey) {
        let refetch: Vec<QueryKey> = {
            let mut entries = self.entries.borrow_mut();
            entries
                .iter_mut()
                .filter(|(key, _)| key.starts_with(prefix))
                .filter_map(|(key, entry)| {
                    entry.stale = true;
                    entry.state.send_modify(|state| state.is_stale = true);
                    (entry.has_subscribers() && entry.fetcher.is_some()).then(|| key.clone())
                })
                .collect()
        };

        tracing::debug!(
            "Invalidated {}: {} entr{} refetching",
            prefix,
            refetch.len(),
            if refetch.len() == 1 { "y" } else { "ies" }
        );
        for key in refetch {
            self.start_fetch(&key);
        }
    }

    /// Drop an entry entirely. Subscribers see the cache as gone. Fetches still in flight for
    /// the key are ignored when they resolve, even if the key has been queried again.
    pub fn remove(&self, key: &QueryKey) {
        self.entries.borrow_mut().remove(key);
    }

    fn start_fetch(&self, key: &QueryKey) {
        let issued = {
            let mut entries = self.entries.borrow_mut();
            entries.get_mut(key).and_then(|entry| {
                let fetcher = entry.fetcher.clone()?;
                let generation = self.generation.get() + 1;
                self.generation.set(generation);
                entry.issued = generation;
                entry.stale = false;
                entry.state.send_modify(|state| {
                    state.is_fetching = true;
                    state.is_stale = false;
                    if state.data.is_none() {
                        state.status = QueryStatus::Loading;
                    }
                });
                Some((fetcher, entry.issued))
            })
        };
        let Some((fetcher, generation)) = issued else {
            return;
        };

        tracing::debug!("Fetching {} (generation {})", key, generation);
        let future = fetcher();
        let cache = self.clone();
        let key = key.clone();
        tokio::task::spawn_local(async move {
            let result = future.await;
            cache.settle(&key, generation, result);
        });
    }

    fn settle(&self, key: &QueryKey, generation: u64, result: QueryResult) {
        let mut entries = self.entries.borrow_mut();
        let Some(entry) = entries.get_mut(key) else {
            return;
        };

        if generation <= entry.applied {
            tracing::debug!(
                "Discarding superseded result for {} (generation {} <= {})",
                key,
                generation,
                entry.applied
            );
            return;
        }
        entry.applied = generation;
        let still_fetching = entry.in_flight();

        match result {
            Ok(data) => {
                entry.state.send_modify(|state| {
                    state.status = QueryStatus::Loaded;
                    state.data = Some(data);
                    state.error = None;
                    state.is_fetching = still_fetching;
                    state.updated_at = Some(Utc::now());
                });
            }
            Err(error) => {
                tracing::warn!("Query {} failed: {}", key, error);
                if !still_fetching {
                    entry.stale = true;
                }
                entry.state.send_modify(|state| {
                    state.status = QueryStatus::LoadFailed;
                    state.error = Some(error);
                    state.is_fetching = still_fetching;
                });
            }
        }

        if !entry.has_subscribers() {
            tracing::debug!("No subscribers left for {}, result kept in cache only", key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::collections::VecDeque;

    use serde_json::json;
    use tokio::sync::oneshot;
    use tokio::task::LocalSet;

    fn counting_fetcher(calls: Rc<Cell<usize>>, value: Value) -> Fetcher {
        fetcher(move || {
            calls.set(calls.get() + 1);
            let value = value.clone();
            async move {
                tokio::task::yield_now().await;
                Ok(value)
            }
        })
    }

    /// Each call waits for the next queued oneshot.
    fn gated_fetcher(gates: Rc<RefCell<VecDeque<oneshot::Receiver<QueryResult>>>>) -> Fetcher {
        fetcher(move || {
            let gate = gates.borrow_mut().pop_front();
            async move {
                match gate {
                    Some(gate) => gate
                        .await
                        .unwrap_or_else(|_| Err(ClientError::Decode("gate dropped".into()))),
                    None => Err(ClientError::Decode("no gate queued".into())),
                }
            }
        })
    }

    async fn yield_a_few() {
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
    }

    #[test]
    fn test_key_prefix_matching() {
        let projects = QueryKey::new(["projects"]);
        let featured = projects.child("featured");
        assert!(featured.starts_with(&projects));
        assert!(projects.starts_with(&projects));
        assert!(!projects.starts_with(&featured));
        assert!(!QueryKey::new(["project-links"]).starts_with(&projects));
        assert_eq!(featured.to_string(), "(projects, featured)");
    }

    #[tokio::test]
    async fn test_first_query_passes_through_loading() {
        LocalSet::new()
            .run_until(async {
                let cache = QueryClient::new();
                let key = QueryKey::new(["activity"]);
                let calls = Rc::new(Cell::new(0));

                let mut subscription = cache.subscribe(&key);
                let first = cache.query(&key, counting_fetcher(calls.clone(), json!([1])));
                assert!(first.is_loading());
                assert!(first.data.is_none());

                let settled = subscription.settled().await;
                assert_eq!(settled.status, QueryStatus::Loaded);
                assert_eq!(settled.data, Some(json!([1])));
                assert_eq!(calls.get(), 1);
            })
            .await;
    }

    #[tokio::test]
    async fn test_concurrent_queries_share_one_fetch() {
        LocalSet::new()
            .run_until(async {
                let cache = QueryClient::new();
                let key = QueryKey::new(["services"]);
                let calls = Rc::new(Cell::new(0));

                let mut a = cache.subscribe(&key);
                let b = cache.subscribe(&key);
                cache.query(&key, counting_fetcher(calls.clone(), json!(["x"])));
                cache.query(&key, counting_fetcher(calls.clone(), json!(["x"])));
                a.settled().await;

                assert_eq!(calls.get(), 1);
                assert_eq!(b.state().data, Some(json!(["x"])));

                // Fresh data is served from cache without another fetch.
                let cached = cache.query(&key, counting_fetcher(calls.clone(), json!(["y"])));
                assert_eq!(cached.data, Some(json!(["x"])));
                assert_eq!(calls.get(), 1);
            })
            .await;
    }

    #[tokio::test]
    async fn test_later_issued_fetch_wins_when_it_resolves_first() {
        LocalSet::new()
            .run_until(async {
                let cache = QueryClient::new();
                let key = QueryKey::new(["activity"]);
                let (first_tx, first_rx) = oneshot::channel();
                let (second_tx, second_rx) = oneshot::channel();
                let gates = Rc::new(RefCell::new(VecDeque::from([first_rx, second_rx])));

                let mut subscription = cache.subscribe(&key);
                cache.query(&key, gated_fetcher(gates));
                // Second fetch issued while the first is still in flight.
                cache.invalidate(&key);

                second_tx.send(Ok(json!(["new"]))).unwrap();
                let state = subscription.settled().await;
                assert_eq!(state.data, Some(json!(["new"])));

                first_tx.send(Ok(json!(["old"]))).unwrap();
                yield_a_few().await;

                let state = subscription.state();
                assert_eq!(state.data, Some(json!(["new"])));
                assert!(!state.is_fetching);
            })
            .await;
    }

    #[tokio::test]
    async fn test_earlier_result_is_replaced_by_later_one() {
        LocalSet::new()
            .run_until(async {
                let cache = QueryClient::new();
                let key = QueryKey::new(["activity"]);
                let (first_tx, first_rx) = oneshot::channel();
                let (second_tx, second_rx) = oneshot::channel();
                let gates = Rc::new(RefCell::new(VecDeque::from([first_rx, second_rx])));

                let mut subscription = cache.subscribe(&key);
                cache.query(&key, gated_fetcher(gates));
                cache.invalidate(&key);

                first_tx.send(Ok(json!(["old"]))).unwrap();
                yield_a_few().await;
                let state = subscription.state();
                assert_eq!(state.data, Some(json!(["old"])));
                assert!(state.is_fetching);

                second_tx.send(Ok(json!(["new"]))).unwrap();
                let state = subscription.settled().await;
                assert_eq!(state.data, Some(json!(["new"])));
            })
            .await;
    }

    #[tokio::test]
    async fn test_failure_keeps_previous_data() {
        LocalSet::new()
            .run_until(async {
                let cache = QueryClient::new();
                let key = QueryKey::new(["team-members"]);
                let (first_tx, first_rx) = oneshot::channel();
                let (second_tx, second_rx) = oneshot::channel();
                let gates = Rc::new(RefCell::new(VecDeque::from([first_rx, second_rx])));

                let mut subscription = cache.subscribe(&key);
                cache.query(&key, gated_fetcher(gates));
                first_tx.send(Ok(json!(["ada"]))).unwrap();
                subscription.settled().await;

                cache.invalidate(&key);
                // Invalidation does not clear what is displayed.
                assert_eq!(subscription.state().data, Some(json!(["ada"])));

                let error = ClientError::Network {
                    status: Some(500),
                    message: "boom".to_string(),
                };
                second_tx.send(Err(error.clone())).unwrap();
                let state = subscription.settled().await;
                assert!(state.is_error());
                assert_eq!(state.error, Some(error));
                assert_eq!(state.data, Some(json!(["ada"])));
            })
            .await;
    }

    #[tokio::test]
    async fn test_removed_entry_ignores_fetch_started_before_removal() {
        LocalSet::new()
            .run_until(async {
                let cache = QueryClient::new();
                let key = QueryKey::new(["services"]);
                let (old_tx, old_rx) = oneshot::channel();
                let (new_tx, new_rx) = oneshot::channel();
                let gates = Rc::new(RefCell::new(VecDeque::from([old_rx, new_rx])));

                cache.query(&key, gated_fetcher(gates.clone()));
                cache.remove(&key);

                let mut subscription = cache.subscribe(&key);
                cache.query(&key, gated_fetcher(gates));

                old_tx.send(Ok(json!(["stale"]))).unwrap();
                yield_a_few().await;
                let state = subscription.state();
                assert_eq!(state.data, None);
                assert!(state.is_loading());

                new_tx.send(Ok(json!(["fresh"]))).unwrap();
                let state = subscription.settled().await;
                assert_eq!(state.data, Some(json!(["fresh"])));
            })
            .await;
    }

    #[tokio::test]
    async fn test_invalidate_without_subscribers_defers_refetch() {
        LocalSet::new()
            .run_until(async {
                let cache = QueryClient::new();
                let key = QueryKey::new(["events"]);
                let calls = Rc::new(Cell::new(0));

                cache
                    .fetch(&key, counting_fetcher(calls.clone(), json!([])))
                    .await
                    .unwrap();
                assert_eq!(calls.get(), 1);

                cache.invalidate(&key);
                yield_a_few().await;
                assert_eq!(calls.get(), 1);
                assert!(cache.get(&key).unwrap().is_stale);

                let data = cache
                    .fetch(&key, counting_fetcher(calls.clone(), json!(["gala"])))
                    .await
                    .unwrap();
                assert_eq!(calls.get(), 2);
                assert_eq!(data, json!(["gala"]));
            })
            .await;
    }

    #[tokio::test]
    async fn test_invalidate_matches_prefix() {
        LocalSet::new()
            .run_until(async {
                let cache = QueryClient::new();
                let projects = QueryKey::new(["projects"]);
                let featured = projects.child("featured");
                let other = QueryKey::new(["services"]);
                let calls = Rc::new(Cell::new(0));

                let mut featured_sub = cache.subscribe(&featured);
                let mut other_sub = cache.subscribe(&other);
                cache.query(&featured, counting_fetcher(calls.clone(), json!([])));
                cache.query(&other, counting_fetcher(calls.clone(), json!([])));
                featured_sub.settled().await;
                other_sub.settled().await;
                assert_eq!(calls.get(), 2);

                cache.invalidate(&projects);
                featured_sub.settled().await;
                assert_eq!(calls.get(), 3);
                assert!(!other_sub.state().is_stale);
            })
            .await;
    }
}
