//! Keyed in-flight request coalescing.
//!
//! Concurrent callers asking for the same key share one pending result
//! instead of each starting their own. The entry is removed as soon as
//! the work settles, so the next call after that starts afresh.

use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::panic;
use std::sync::{Arc, Mutex, PoisonError};

use futures::future::{BoxFuture, FutureExt, Shared};

type Pending<V> = Shared<BoxFuture<'static, Option<V>>>;

/// Map from key to the pending result for that key.
///
/// The work for a key runs as its own task. Callers only wait on it, so
/// it completes and clears its entry even if every caller gives up.
pub struct Coalescer<K, V> {
    inflight: Arc<Mutex<HashMap<K, Pending<V>>>>,
}

impl<K, V> Coalescer<K, V>
where
    K: Eq + Hash + Clone + Send + 'static,
    V: Clone + Send + Sync + 'static,
{
    /// Create an empty coalescer.
    pub fn new() -> Self {
        Self {
            inflight: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Await the pending result for `key`, spawning `make`'s future if
    /// nothing is in flight.
    ///
    /// `make` runs under the internal lock and must only build the future.
    /// Returns `None` only when the runtime dropped the task before it
    /// finished, i.e. during shutdown. A panic in the work is re-raised in
    /// every caller.
    pub async fn run<F, Fut>(&self, key: K, make: F) -> Option<V>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = V> + Send + 'static,
    {
        let pending = {
            let mut inflight = self.inflight.lock().unwrap_or_else(PoisonError::into_inner);

            match inflight.get(&key) {
                Some(pending) => pending.clone(),
                None => {
                    let work = make();
                    let registry = Arc::clone(&self.inflight);
                    let settle_key = key.clone();

                    // The entry is inserted before this lock is released, so
                    // the task's removal always finds it.
                    let task = tokio::spawn(async move {
                        let value = work.await;
                        registry
                            .lock()
                            .unwrap_or_else(PoisonError::into_inner)
                            .remove(&settle_key);
                        value
                    });

                    let pending = async move {
                        match task.await {
                            Ok(value) => Some(value),
                            Err(e) if e.is_panic() => panic::resume_unwind(e.into_panic()),
                            Err(_) => None,
                        }
                    }
                    .boxed()
                    .shared();

                    inflight.insert(key, pending.clone());
                    pending
                }
            }
        };

        pending.await
    }

    /// Whether a request for `key` is currently outstanding.
    pub fn is_pending(&self, key: &K) -> bool {
        self.inflight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(key)
    }
}

impl<K, V> Default for Coalescer<K, V>
where
    K: Eq + Hash + Clone + Send + 'static,
    V: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::sync::Semaphore;

    async fn release_after_yields(gate: &Semaphore) {
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        gate.add_permits(1);
    }

    #[tokio::test]
    async fn concurrent_calls_share_one_run() {
        let coalescer: Coalescer<String, usize> = Coalescer::new();
        let runs = Arc::new(AtomicUsize::new(0));
        let gate = Arc::new(Semaphore::new(0));

        let call = || {
            let runs = Arc::clone(&runs);
            let gate = Arc::clone(&gate);
            coalescer.run("a".to_string(), move || async move {
                let n = runs.fetch_add(1, Ordering::SeqCst) + 1;
                let _permit = gate.acquire().await;
                n
            })
        };

        let (first, second, ()) = tokio::join!(call(), call(), async {
            for _ in 0..5 {
                tokio::task::yield_now().await;
            }
            assert!(coalescer.is_pending(&"a".to_string()));
            release_after_yields(&gate).await;
        });

        assert_eq!(first, Some(1));
        assert_eq!(second, Some(1));
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn entry_cleared_on_settle() {
        let coalescer: Coalescer<&'static str, u32> = Coalescer::new();

        assert_eq!(coalescer.run("k", || async { 1 }).await, Some(1));
        assert!(!coalescer.is_pending(&"k"));

        // A later call runs again rather than reusing the old result.
        assert_eq!(coalescer.run("k", || async { 2 }).await, Some(2));
    }

    #[tokio::test]
    async fn abandoned_run_still_settles() {
        let coalescer: Coalescer<&'static str, u32> = Coalescer::new();
        let gate = Arc::new(Semaphore::new(0));
        let done = Arc::new(AtomicUsize::new(0));

        let waiting = {
            let gate = Arc::clone(&gate);
            let done = Arc::clone(&done);
            coalescer.run("k", move || async move {
                let _permit = gate.acquire().await;
                done.fetch_add(1, Ordering::SeqCst);
                7
            })
        };
        let gave_up = tokio::time::timeout(Duration::from_millis(10), waiting).await;
        assert!(gave_up.is_err());
        assert!(coalescer.is_pending(&"k"));

        gate.add_permits(1);
        for _ in 0..100 {
            if !coalescer.is_pending(&"k") {
                break;
            }
            tokio::time::sleep(Duration::from_millis(1)).await;
        }

        assert_eq!(done.load(Ordering::SeqCst), 1);
        assert!(!coalescer.is_pending(&"k"));
    }

    #[tokio::test]
    async fn different_keys_run_independently() {
        let coalescer: Coalescer<u32, u32> = Coalescer::new();
        let runs = AtomicUsize::new(0);

        let (a, b) = tokio::join!(
            coalescer.run(1, || {
                runs.fetch_add(1, Ordering::SeqCst);
                async { 10 }
            }),
            coalescer.run(2, || {
                runs.fetch_add(1, Ordering::SeqCst);
                async { 20 }
            }),
        );

        assert_eq!((a, b), (Some(10), Some(20)));
        assert_eq!(runs.load(Ordering::SeqCst), 2);
    }
}
