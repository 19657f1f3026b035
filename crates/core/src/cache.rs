use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

/// Keyed value cache with per-entry time-to-live.
///
/// Injected into the provider-calling components so cache lifetime stays
/// explicit. Expiry is evaluated when an entry is read.
pub trait Cache<V>: Send + Sync {
    fn get(&self, key: &str) -> Option<V>;

    fn put(&self, key: &str, value: V, ttl: Duration);
}

/// In-memory `Cache` backed by a `HashMap` of (value, expiry) pairs.
///
/// Safe to share across concurrent evaluations behind an `Arc`.
pub struct TtlCache<V> {
    entries: Mutex<HashMap<String, (V, Instant)>>,
}

impl<V: Clone> TtlCache<V> {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, (V, Instant)>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Number of stored entries, expired ones included until read or purged.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Drop every expired entry. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|_, (_, expires)| *expires > now);
        before - entries.len()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }
}

impl<V: Clone> Default for TtlCache<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Clone + Send> Cache<V> for TtlCache<V> {
    fn get(&self, key: &str) -> Option<V> {
        let mut entries = self.lock();
        match entries.get(key) {
            Some((value, expires)) if *expires > Instant::now() => Some(value.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    fn put(&self, key: &str, value: V, ttl: Duration) {
        // A zero TTL means "do not cache".
        if ttl.is_zero() {
            return;
        }
        let expires = Instant::now() + ttl;
        self.lock().insert(key.to_string(), (value, expires));
    }
}
