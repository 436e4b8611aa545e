use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use coinsight_core::{CacheConfig, CoinsightError, DataSnapshot};
use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use serde::Serialize;
use tokio::time::Instant;

type Fetch = Shared<BoxFuture<'static, Result<Arc<DataSnapshot>, CoinsightError>>>;

struct Terminal {
    snapshot: Arc<DataSnapshot>,
    inserted: Instant,
}

#[derive(Default)]
struct Slot {
    terminal: Option<Terminal>,
    // (generation, shared fetch); the generation tells a completing task
    // whether its slot was cleared or superseded meanwhile
    in_flight: Option<(u64, Fetch)>,
}

type Slots = Arc<Mutex<HashMap<String, Slot>>>;

/// Point-in-time cache counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Keys holding a completed snapshot.
    pub entries: usize,
    /// Keys with a fetch in flight.
    pub in_flight: usize,
}

/// Outcome of [`ResolutionCache::get_or_fetch`].
pub enum Lookup {
    /// A terminal entry younger than the TTL.
    Fresh(Arc<DataSnapshot>),
    /// The result of a fetch this caller started or joined.
    Fetched(Result<Arc<DataSnapshot>, CoinsightError>),
}

/// Single-flight TTL cache keyed by normalized query.
///
/// A miss spawns the fetch as its own Tokio task; callers only hold a shared
/// handle to it, so dropping every caller does not cancel the fetch and its
/// result still lands in the cache.
pub struct ResolutionCache {
    cfg: CacheConfig,
    slots: Slots,
    generation: AtomicU64,
}

fn lock(slots: &Mutex<HashMap<String, Slot>>) -> MutexGuard<'_, HashMap<String, Slot>> {
    slots.lock().unwrap_or_else(PoisonError::into_inner)
}

fn complete(
    slots: &Mutex<HashMap<String, Slot>>,
    key: &str,
    generation: u64,
    result: &Result<Arc<DataSnapshot>, CoinsightError>,
) {
    let mut guard = lock(slots);
    let Some(slot) = guard.get_mut(key) else {
        return;
    };
    if !matches!(slot.in_flight, Some((g, _)) if g == generation) {
        return;
    }
    slot.in_flight = None;
    match result {
        Ok(snapshot) => {
            slot.terminal = Some(Terminal {
                snapshot: Arc::clone(snapshot),
                inserted: Instant::now(),
            });
        }
        // keep any previous snapshot for stale serving
        Err(_) if slot.terminal.is_some() => {}
        Err(_) => {
            guard.remove(key);
        }
    }
}

impl ResolutionCache {
    pub fn new(cfg: CacheConfig) -> Self {
        Self {
            cfg,
            slots: Arc::new(Mutex::new(HashMap::new())),
            generation: AtomicU64::new(0),
        }
    }

    /// Serve a fresh entry, join the in-flight fetch, or start one with `fetch`.
    ///
    /// `force_refresh` skips the freshness check but still joins an in-flight
    /// fetch rather than starting a second one.
    pub async fn get_or_fetch<F>(&self, key: &str, force_refresh: bool, fetch: F) -> Lookup
    where
        F: FnOnce() -> BoxFuture<'static, Result<Arc<DataSnapshot>, CoinsightError>>,
    {
        let shared = {
            let mut guard = lock(&self.slots);
            let slot = guard.entry(key.to_string()).or_default();
            if !force_refresh
                && let Some(t) = &slot.terminal
                && t.inserted.elapsed() < self.cfg.ttl
            {
                return Lookup::Fresh(Arc::clone(&t.snapshot));
            }
            if let Some((_, f)) = &slot.in_flight {
                f.clone()
            } else {
                let generation = self.generation.fetch_add(1, Ordering::Relaxed);
                let slots = Arc::clone(&self.slots);
                let owned_key = key.to_string();
                let fut = fetch();
                let task = tokio::spawn(async move {
                    let result = fut.await;
                    complete(&slots, &owned_key, generation, &result);
                    result
                });
                let shared = async move {
                    task.await.unwrap_or_else(|e| {
                        Err(CoinsightError::Data(format!("resolution task failed: {e}")))
                    })
                }
                .boxed()
                .shared();
                slot.in_flight = Some((generation, shared.clone()));
                shared
            }
        };
        Lookup::Fetched(shared.await)
    }

    /// The last completed snapshot for `key`, regardless of age.
    pub fn last_known(&self, key: &str) -> Option<Arc<DataSnapshot>> {
        lock(&self.slots)
            .get(key)
            .and_then(|s| s.terminal.as_ref())
            .map(|t| Arc::clone(&t.snapshot))
    }

    /// Drop the snapshot stored for `key`.
    ///
    /// A fetch already in flight stays joinable and its result is stored when
    /// it lands. Returns whether a snapshot was removed.
    pub fn clear(&self, key: &str) -> bool {
        let mut guard = lock(&self.slots);
        let Some(slot) = guard.get_mut(key) else {
            return false;
        };
        let had = slot.terminal.take().is_some();
        if slot.in_flight.is_none() {
            guard.remove(key);
        }
        had
    }

    /// Drop every stored snapshot; in-flight fetches are kept.
    pub fn clear_all(&self) {
        lock(&self.slots).retain(|_, slot| {
            slot.terminal = None;
            slot.in_flight.is_some()
        });
    }

    /// Drop snapshots older than `max_age`; keys with a fetch in flight stay.
    ///
    /// Returns the number of snapshots removed.
    pub fn sweep(&self, max_age: Duration) -> usize {
        let mut guard = lock(&self.slots);
        let mut removed = 0;
        guard.retain(|_, slot| {
            if slot
                .terminal
                .as_ref()
                .is_some_and(|t| t.inserted.elapsed() >= max_age)
            {
                slot.terminal = None;
                removed += 1;
            }
            slot.terminal.is_some() || slot.in_flight.is_some()
        });
        removed
    }

    pub fn stats(&self) -> CacheStats {
        let guard = lock(&self.slots);
        CacheStats {
            entries: guard.values().filter(|s| s.terminal.is_some()).count(),
            in_flight: guard.values().filter(|s| s.in_flight.is_some()).count(),
        }
    }
}
