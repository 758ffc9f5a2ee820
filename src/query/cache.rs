//! Keyed read-through cache with in-flight request sharing

use futures::future::{BoxFuture, FutureExt, Shared};
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Instant;

type SharedFetch<V, E> = Shared<BoxFuture<'static, Result<V, E>>>;

struct Entry<V, E> {
    data: Option<V>,
    /// Set by `invalidate`; stale data is still readable but the next fetch recomputes
    stale: bool,
    /// Bumped on every `set_data`/`invalidate` so late fetches can tell they lost the race
    generation: u64,
    updated_at: Option<Instant>,
    in_flight: Option<(u64, SharedFetch<V, E>)>,
}

impl<V, E> Default for Entry<V, E> {
    fn default() -> Self {
        Self {
            data: None,
            stale: false,
            generation: 0,
            updated_at: None,
            in_flight: None,
        }
    }
}

/// Explicit keyed store owned by the query layer.
///
/// `fetch_with` serves fresh data from the cache, joins an in-flight request
/// for the same key if there is one, and otherwise starts a new one. A
/// result that arrives after the key was invalidated or overwritten is
/// returned to its callers but not stored. Errors are never cached.
pub struct QueryCache<K, V, E> {
    entries: Mutex<HashMap<K, Entry<V, E>>>,
}

impl<K, V, E> QueryCache<K, V, E>
where
    K: Eq + Hash + Clone,
    V: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<K, Entry<V, E>>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Current data for `key`, fresh or stale
    pub fn get(&self, key: &K) -> Option<V> {
        self.lock().get(key).and_then(|entry| entry.data.clone())
    }

    /// True when `key` holds data that has not been invalidated
    pub fn is_fresh(&self, key: &K) -> bool {
        self.lock()
            .get(key)
            .is_some_and(|entry| entry.data.is_some() && !entry.stale)
    }

    #[allow(dead_code)] // Used by tests
    pub fn is_fetching(&self, key: &K) -> bool {
        self.lock()
            .get(key)
            .is_some_and(|entry| entry.in_flight.is_some())
    }

    #[allow(dead_code)] // Diagnostic accessor
    pub fn updated_at(&self, key: &K) -> Option<Instant> {
        self.lock().get(key).and_then(|entry| entry.updated_at)
    }

    /// Overwrite the data for `key`; the entry becomes fresh
    pub fn set_data(&self, key: K, value: V) {
        let mut entries = self.lock();
        let entry = entries.entry(key).or_default();
        entry.data = Some(value);
        entry.stale = false;
        entry.generation += 1;
        entry.updated_at = Some(Instant::now());
        entry.in_flight = None;
    }

    /// Mark `key` stale so the next fetch goes to the source.
    /// Returns false if nothing was cached under `key`.
    pub fn invalidate(&self, key: &K) -> bool {
        let mut entries = self.lock();
        match entries.get_mut(key) {
            Some(entry) => {
                entry.stale = true;
                entry.generation += 1;
                entry.in_flight = None;
                true
            }
            None => false,
        }
    }

    pub async fn fetch_with<F>(&self, key: K, fetch: F) -> Result<V, E>
    where
        F: FnOnce() -> BoxFuture<'static, Result<V, E>>,
    {
        let (generation, request) = {
            let mut entries = self.lock();
            let entry = entries.entry(key.clone()).or_default();

            if !entry.stale {
                if let Some(data) = &entry.data {
                    return Ok(data.clone());
                }
            }

            if let Some((generation, request)) = &entry.in_flight {
                (*generation, request.clone())
            } else {
                let request = fetch().shared();
                entry.in_flight = Some((entry.generation, request.clone()));
                (entry.generation, request)
            }
        };

        let result = request.await;

        let mut entries = self.lock();
        if let Some(entry) = entries.get_mut(&key) {
            if entry.generation == generation {
                entry.in_flight = None;
                if let Ok(value) = &result {
                    entry.data = Some(value.clone());
                    entry.stale = false;
                    entry.updated_at = Some(Instant::now());
                }
            }
        }

        result
    }
}

impl<K, V, E> Default for QueryCache<K, V, E>
where
    K: Eq + Hash + Clone,
    V: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}
