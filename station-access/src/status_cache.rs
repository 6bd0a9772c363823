//! Read-through cache of station status snapshots.
//!
//! Snapshots are fetched lazily as views ask for them and kept for the
//! life of the process. There is no TTL: a snapshot only changes when a
//! view explicitly refreshes it. Concurrent requests for the same station
//! share one outstanding fetch, which runs as its own task and stores its
//! result even if every caller has gone away.
//!
//! Lookups never fail. Network errors, non-2xx responses and bodies of an
//! unknown shape all resolve to the fallback "Unknown" snapshot, which is
//! stored like any other result.

use std::sync::Arc;

use chrono::Utc;
use moka::future::Cache as MokaCache;
use tracing::{debug, warn};

use crate::api::StationApi;
use crate::coalesce::Coalescer;
use crate::domain::StatusSnapshot;
use crate::normalize::normalize_status;

/// Configuration for the status cache.
#[derive(Debug, Clone, Default)]
pub struct StatusCacheConfig {
    /// Maximum number of stored snapshots. `None` keeps every station.
    pub max_capacity: Option<u64>,
}

/// Status cache keyed by station id.
pub struct StatusCache<A> {
    api: Arc<A>,
    snapshots: MokaCache<String, Arc<StatusSnapshot>>,
    inflight: Coalescer<String, Arc<StatusSnapshot>>,
}

impl<A: StationApi> StatusCache<A> {
    /// Create a new cache over the given API.
    pub fn new(api: Arc<A>, config: &StatusCacheConfig) -> Self {
        let mut builder = MokaCache::builder();
        if let Some(capacity) = config.max_capacity {
            builder = builder.max_capacity(capacity);
        }

        Self {
            api,
            snapshots: builder.build(),
            inflight: Coalescer::new(),
        }
    }

    /// Return the stored snapshot, fetching it first if there is none.
    pub async fn lookup_or_fetch(&self, station_id: &str) -> Arc<StatusSnapshot> {
        if let Some(cached) = self.snapshots.get(station_id).await {
            return cached;
        }
        self.fetch(station_id, Reuse::Stored).await
    }

    /// Fetch a fresh snapshot, replacing whatever is stored.
    ///
    /// Joins a fetch already in flight for the same station.
    pub async fn refresh(&self, station_id: &str) -> Arc<StatusSnapshot> {
        self.fetch(station_id, Reuse::Never).await
    }

    /// The stored snapshot, without fetching.
    pub async fn peek(&self, station_id: &str) -> Option<Arc<StatusSnapshot>> {
        self.snapshots.get(station_id).await
    }

    /// Whether a fetch for this station is outstanding.
    pub fn is_loading(&self, station_id: &str) -> bool {
        self.inflight.is_pending(&station_id.to_string())
    }

    /// Start background lookups for stations that have no snapshot yet.
    ///
    /// The fetches run to completion even if nobody waits for them.
    pub fn prefetch(self: &Arc<Self>, station_ids: impl IntoIterator<Item = String>) {
        for station_id in station_ids {
            if station_id.is_empty()
                || self.snapshots.contains_key(&station_id)
                || self.is_loading(&station_id)
            {
                continue;
            }
            let cache = Arc::clone(self);
            tokio::spawn(async move {
                cache.lookup_or_fetch(&station_id).await;
            });
        }
    }

    /// Number of stored snapshots (approximate, for monitoring).
    pub fn entry_count(&self) -> u64 {
        self.snapshots.entry_count()
    }

    async fn fetch(&self, station_id: &str, reuse: Reuse) -> Arc<StatusSnapshot> {
        // Nothing to ask the API for; not worth remembering either.
        if station_id.is_empty() {
            return Arc::new(StatusSnapshot::fallback());
        }

        let key = station_id.to_string();
        let api = Arc::clone(&self.api);
        let snapshots = self.snapshots.clone();

        let settled = self
            .inflight
            .run(key.clone(), move || async move {
                // A fetch may have stored this station between the caller's
                // miss and now.
                if reuse == Reuse::Stored
                    && let Some(stored) = snapshots.get(&key).await
                {
                    return stored;
                }
                let snapshot = Arc::new(fetch_snapshot(api.as_ref(), &key).await);
                snapshots.insert(key, Arc::clone(&snapshot)).await;
                snapshot
            })
            .await;

        settled.unwrap_or_else(|| Arc::new(StatusSnapshot::fallback()))
    }
}

/// Whether a coalesced fetch may return a snapshot stored meanwhile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Reuse {
    Stored,
    Never,
}

/// Fetch and normalize one station's status, degrading every failure to
/// the fallback snapshot.
pub async fn fetch_snapshot<A: StationApi>(api: &A, station_id: &str) -> StatusSnapshot {
    match api.status(station_id).await {
        Ok(body) => normalize_status(&body, Utc::now()),
        Err(e) if e.is_config() => {
            warn!(station_id, error = %e, "status unavailable");
            StatusSnapshot::fallback()
        }
        Err(e) => {
            debug!(station_id, error = %e, "status fetch failed, using fallback");
            StatusSnapshot::fallback()
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use serde_json::{Value, json};
    use tokio::sync::Semaphore;

    use crate::api::{ApiError, Coord};

    /// Fake API serving canned status bodies, counting calls per station.
    pub(crate) struct FakeApi {
        pub stations: Value,
        pub statuses: Mutex<HashMap<String, Result<Value, u16>>>,
        pub calls: Mutex<HashMap<String, usize>>,
        pub total_calls: AtomicUsize,
        pub gate: Option<Semaphore>,
    }

    impl FakeApi {
        pub fn new() -> Self {
            Self {
                stations: json!([]),
                statuses: Mutex::new(HashMap::new()),
                calls: Mutex::new(HashMap::new()),
                total_calls: AtomicUsize::new(0),
                gate: None,
            }
        }

        /// Hold every status call until `release` is called.
        pub fn gated(mut self) -> Self {
            self.gate = Some(Semaphore::new(0));
            self
        }

        pub fn with_stations(mut self, stations: Value) -> Self {
            self.stations = stations;
            self
        }

        pub fn with_status(self, id: &str, body: Value) -> Self {
            self.set_status(id, Ok(body));
            self
        }

        pub fn set_status(&self, id: &str, result: Result<Value, u16>) {
            self.statuses.lock().unwrap().insert(id.to_string(), result);
        }

        pub fn release(&self) {
            if let Some(gate) = &self.gate {
                gate.add_permits(1);
            }
        }

        pub fn calls_for(&self, id: &str) -> usize {
            self.calls.lock().unwrap().get(id).copied().unwrap_or(0)
        }
    }

    impl StationApi for FakeApi {
        async fn stations(&self) -> Result<Value, ApiError> {
            Ok(self.stations.clone())
        }

        async fn status(&self, station_id: &str) -> Result<Value, ApiError> {
            self.total_calls.fetch_add(1, Ordering::SeqCst);
            *self
                .calls
                .lock()
                .unwrap()
                .entry(station_id.to_string())
                .or_default() += 1;

            if let Some(gate) = &self.gate {
                let _permit = gate.acquire().await;
            }

            let result = self.statuses.lock().unwrap().get(station_id).cloned();
            match result {
                Some(Ok(body)) => Ok(body),
                Some(Err(status)) => Err(ApiError::Api {
                    what: "status",
                    status,
                    body: "upstream failure".into(),
                }),
                None => Err(ApiError::Api {
                    what: "status",
                    status: 404,
                    body: String::new(),
                }),
            }
        }

        async fn coords(&self) -> Result<HashMap<String, Coord>, ApiError> {
            Ok(HashMap::new())
        }
    }

    fn cache_over(api: FakeApi) -> (Arc<FakeApi>, StatusCache<FakeApi>) {
        let api = Arc::new(api);
        let cache = StatusCache::new(Arc::clone(&api), &StatusCacheConfig::default());
        (api, cache)
    }

    async fn yield_a_few() {
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn concurrent_lookups_fetch_once() {
        let (api, cache) = cache_over(
            FakeApi::new()
                .gated()
                .with_status("602", json!({"elevator_status": "Operational"})),
        );

        let (a, b, ()) = tokio::join!(
            cache.lookup_or_fetch("602"),
            cache.lookup_or_fetch("602"),
            async {
                yield_a_few().await;
                assert!(cache.is_loading("602"));
                api.release();
            }
        );

        assert_eq!(api.calls_for("602"), 1);
        assert_eq!(a.elevator_status, "Operational");
        assert!(Arc::ptr_eq(&a, &b));
        assert!(!cache.is_loading("602"));
    }

    #[tokio::test]
    async fn concurrent_refreshes_fetch_once() {
        let (api, cache) = cache_over(
            FakeApi::new()
                .gated()
                .with_status("602", json!({"escalator_status": "Operational"})),
        );

        let (a, b, ()) = tokio::join!(cache.refresh("602"), cache.lookup_or_fetch("602"), async {
            yield_a_few().await;
            api.release();
        });

        assert_eq!(api.calls_for("602"), 1);
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[tokio::test]
    async fn abandoned_refresh_still_stores_snapshot() {
        let (api, cache) = cache_over(
            FakeApi::new()
                .gated()
                .with_status("602", json!({"elevator_status": "Operational"})),
        );

        let gave_up = tokio::time::timeout(Duration::from_millis(10), cache.refresh("602")).await;
        assert!(gave_up.is_err());
        assert!(cache.is_loading("602"));

        api.release();
        for _ in 0..100 {
            if !cache.is_loading("602") {
                break;
            }
            tokio::time::sleep(Duration::from_millis(1)).await;
        }

        assert!(!cache.is_loading("602"));
        let stored = cache.peek("602").await.unwrap();
        assert_eq!(stored.elevator_status, "Operational");

        // The next lookup is served from the cache, not refetched.
        cache.lookup_or_fetch("602").await;
        assert_eq!(api.calls_for("602"), 1);
    }

    #[tokio::test]
    async fn late_lookup_reuses_snapshot_stored_meanwhile() {
        let (api, cache) = cache_over(
            FakeApi::new().with_status("602", json!({"elevator_status": "Operational"})),
        );
        let first = cache.lookup_or_fetch("602").await;

        // A lookup that missed the cache just before the first one stored.
        let late = cache.fetch("602", Reuse::Stored).await;
        assert!(Arc::ptr_eq(&first, &late));
        assert_eq!(api.calls_for("602"), 1);

        // Refreshes never take that shortcut.
        cache.fetch("602", Reuse::Never).await;
        assert_eq!(api.calls_for("602"), 2);
    }

    #[tokio::test]
    async fn second_lookup_served_from_cache() {
        let (api, cache) = cache_over(
            FakeApi::new().with_status("602", json!({"elevators": [{"status": "NORMAL"}]})),
        );

        let first = cache.lookup_or_fetch("602").await;
        let second = cache.lookup_or_fetch("602").await;

        assert_eq!(api.calls_for("602"), 1);
        assert_eq!(first.elevator_status, "Operational");
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[tokio::test]
    async fn refresh_replaces_snapshot() {
        let (api, cache) = cache_over(
            FakeApi::new().with_status("602", json!({"elevator_status": "Operational"})),
        );

        cache.lookup_or_fetch("602").await;
        api.set_status("602", Ok(json!({"elevator_status": "Out of Service"})));

        let refreshed = cache.refresh("602").await;
        assert_eq!(refreshed.elevator_status, "Out of Service");
        // Replaced wholesale: the old escalator default is not carried over.
        assert_eq!(refreshed.escalator_status, "Unknown");
        assert_eq!(
            cache.peek("602").await.unwrap().elevator_status,
            "Out of Service"
        );
        assert_eq!(api.calls_for("602"), 2);
    }

    #[tokio::test]
    async fn failed_fetch_stores_fallback() {
        let api = FakeApi::new();
        api.set_status("602", Err(500));
        let (api, cache) = cache_over(api);

        let snap = cache.lookup_or_fetch("602").await;
        assert_eq!(snap.elevator_status, "Unknown");
        assert_eq!(snap.escalator_status, "Unknown");
        assert!(snap.alerts.is_empty());

        // The fallback is a stored value, not a reason to refetch.
        cache.lookup_or_fetch("602").await;
        assert_eq!(api.calls_for("602"), 1);
    }

    #[tokio::test]
    async fn malformed_body_stores_fallback() {
        let (_api, cache) = cache_over(FakeApi::new().with_status("602", json!("<html>")));
        let snap = cache.lookup_or_fetch("602").await;
        assert!(snap.is_unknown());
    }

    #[tokio::test]
    async fn empty_id_never_fetched_or_stored() {
        let (api, cache) = cache_over(FakeApi::new());
        let snap = cache.lookup_or_fetch("").await;
        assert!(snap.is_unknown());
        assert_eq!(api.total_calls.load(Ordering::SeqCst), 0);
        assert!(cache.peek("").await.is_none());
    }

    #[tokio::test]
    async fn only_requested_ids_are_stored() {
        let (_api, cache) = cache_over(
            FakeApi::new()
                .with_status("602", json!({"elevator_status": "Operational"}))
                .with_status("611", json!({"elevator_status": "Operational"})),
        );

        cache.lookup_or_fetch("602").await;
        assert!(cache.peek("602").await.is_some());
        assert!(cache.peek("611").await.is_none());
    }

    #[tokio::test]
    async fn prefetch_fills_cache_in_background() {
        let (api, cache) = cache_over(
            FakeApi::new()
                .with_status("602", json!({"elevator_status": "Operational"}))
                .with_status("611", json!({"escalator_status": "Out of Service"})),
        );
        let cache = Arc::new(cache);

        cache.prefetch(vec!["602".to_string(), "611".to_string(), String::new()]);

        // Joining the background fetches must not start new ones.
        let a = cache.lookup_or_fetch("602").await;
        let b = cache.lookup_or_fetch("611").await;
        assert_eq!(a.elevator_status, "Operational");
        assert_eq!(b.escalator_status, "Out of Service");

        for _ in 0..50 {
            if api.total_calls.load(Ordering::SeqCst) >= 2 {
                break;
            }
            tokio::task::yield_now().await;
        }
        assert_eq!(api.calls_for("602"), 1);
        assert_eq!(api.calls_for("611"), 1);
        assert_eq!(api.calls_for(""), 0);
    }
}
