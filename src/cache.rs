//! Server-side bookkeeping of issued nonces.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::time::Instant;
use tracing::debug;

/// Default approximate number of tracked nonces
pub const DEFAULT_CLIENT_CACHE_SIZE: usize = 1000;
/// Default slack above the target size before a purge is triggered
pub const DEFAULT_CLIENT_CACHE_TOLERANCE: usize = 100;

/// State kept for one outstanding nonce
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientSession {
    /// Largest `nc` accepted so far; 0 until the nonce is first used
    pub counter: u64,
    /// Time of issuing or of the last accepted response. Only orders evictions.
    pub last_seen: Instant,
}

/// Why [`NonceCache::advance()`](struct.NonceCache.html#method.advance) refused a counter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvanceError {
    /// The nonce was never issued, or it was purged since
    UnknownNonce,
    /// `nc` is not larger than the last accepted one
    Replayed,
}

/// Concurrent nonce -> session table with lazy size-bounded eviction.
///
/// When more than `target_size + tolerance` nonces are tracked, the next call to
/// [`evict_if_needed()`](#method.evict_if_needed) drops the `2 * tolerance` least recently
/// seen ones, and never fewer than it takes to get back to `target_size`.
#[derive(Debug)]
pub struct NonceCache {
    clients: RwLock<HashMap<String, ClientSession>>,
    target_size: usize,
    tolerance: usize,
}

impl NonceCache {
    pub fn new(target_size: usize, tolerance: usize) -> Self {
        NonceCache {
            clients: RwLock::new(HashMap::new()),
            target_size,
            tolerance,
        }
    }

    /// Start tracking a freshly issued nonce
    pub fn register(&self, nonce: impl Into<String>) {
        let session = ClientSession {
            counter: 0,
            last_seen: Instant::now(),
        };
        self.clients.write().insert(nonce.into(), session);
    }

    /// Number of tracked nonces
    pub fn len(&self) -> usize {
        self.clients.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.read().is_empty()
    }

    /// Copy of the session for a nonce.
    ///
    /// The value may be stale as soon as it is returned; never base an acceptance on it.
    pub fn session(&self, nonce: &str) -> Option<ClientSession> {
        self.clients.read().get(nonce).copied()
    }

    /// Look up a nonce and move its counter to `nc`, all under one write lock.
    ///
    /// With `ignore_nonce_count` the counter may go backwards or repeat.
    pub fn advance(&self, nonce: &str, nc: u64, ignore_nonce_count: bool) -> Result<(), AdvanceError> {
        let mut clients = self.clients.write();
        let session = clients.get_mut(nonce).ok_or(AdvanceError::UnknownNonce)?;

        if session.counter != 0 && session.counter >= nc && !ignore_nonce_count {
            return Err(AdvanceError::Replayed);
        }

        session.counter = nc;
        session.last_seen = Instant::now();
        Ok(())
    }

    /// Remove the `count` least recently seen nonces.
    ///
    /// Ties in `last_seen` are broken arbitrarily.
    pub fn purge(&self, count: usize) {
        let mut clients = self.clients.write();
        if count >= clients.len() {
            clients.clear();
            return;
        }

        let mut entries: Vec<(Instant, String)> = clients
            .iter()
            .map(|(nonce, session)| (session.last_seen, nonce.clone()))
            .collect();
        entries.sort_unstable_by_key(|(last_seen, _)| *last_seen);

        for (_, nonce) in entries.into_iter().take(count) {
            clients.remove(&nonce);
        }
    }

    /// Purge `2 * tolerance` entries, at least down to `target_size`, if the cache has
    /// outgrown `target_size + tolerance`.
    ///
    /// The size check and the purge are separate lock acquisitions, so two racing callers
    /// may both purge; the bound is approximate.
    pub fn evict_if_needed(&self) {
        let len = self.len();
        if len > self.target_size.saturating_add(self.tolerance) {
            let count = self.tolerance.saturating_mul(2).max(len - self.target_size);
            self.purge(count);
            debug!(purged = count.min(len), remaining = self.len(), "purged nonce cache");
        }
    }
}

impl Default for NonceCache {
    fn default() -> Self {
        NonceCache::new(DEFAULT_CLIENT_CACHE_SIZE, DEFAULT_CLIENT_CACHE_TOLERANCE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    fn pause() {
        thread::sleep(Duration::from_millis(2));
    }

    #[test]
    fn test_register_and_advance() {
        let cache = NonceCache::default();
        cache.register("abc");
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.session("abc").unwrap().counter, 0);

        assert_eq!(cache.advance("abc", 1, false), Ok(()));
        assert_eq!(cache.advance("abc", 2, false), Ok(()));
        assert_eq!(cache.advance("abc", 2, false), Err(AdvanceError::Replayed));
        assert_eq!(cache.advance("abc", 1, false), Err(AdvanceError::Replayed));
        assert_eq!(cache.advance("abc", 7, false), Ok(()));
        assert_eq!(cache.session("abc").unwrap().counter, 7);

        assert_eq!(cache.advance("nope", 1, false), Err(AdvanceError::UnknownNonce));
    }

    #[test]
    fn test_ignore_nonce_count() {
        let cache = NonceCache::default();
        cache.register("abc");
        assert_eq!(cache.advance("abc", 3, true), Ok(()));
        assert_eq!(cache.advance("abc", 3, true), Ok(()));
        assert_eq!(cache.advance("abc", 1, true), Ok(()));
        assert_eq!(cache.session("abc").unwrap().counter, 1);
    }

    #[test]
    fn test_advance_refreshes_last_seen() {
        let cache = NonceCache::default();
        cache.register("abc");
        let issued = cache.session("abc").unwrap().last_seen;
        pause();
        cache.advance("abc", 1, false).unwrap();
        assert!(cache.session("abc").unwrap().last_seen > issued);
    }

    #[test]
    fn test_purge_oldest() {
        let cache = NonceCache::default();
        for i in 0..5 {
            cache.register(format!("n{}", i));
            pause();
        }
        // using n0 makes it the most recent one
        cache.advance("n0", 1, false).unwrap();

        cache.purge(2);
        assert_eq!(cache.len(), 3);
        assert!(cache.session("n0").is_some());
        assert!(cache.session("n1").is_none());
        assert!(cache.session("n2").is_none());
        assert!(cache.session("n3").is_some());
        assert!(cache.session("n4").is_some());

        cache.purge(10);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_evict_if_needed() {
        let cache = NonceCache::new(10, 2);
        for i in 0..12 {
            cache.register(format!("n{}", i));
            pause();
        }
        // exactly at the threshold: nothing happens
        cache.evict_if_needed();
        assert_eq!(cache.len(), 12);

        cache.register("n12");
        cache.evict_if_needed();
        assert_eq!(cache.len(), 9);
        for i in 0..4 {
            assert!(cache.session(&format!("n{}", i)).is_none());
        }
        for i in 4..13 {
            assert!(cache.session(&format!("n{}", i)).is_some());
        }
    }

    #[test]
    fn test_evict_without_tolerance() {
        let cache = NonceCache::new(10, 0);
        for i in 0..100 {
            cache.evict_if_needed();
            cache.register(format!("n{}", i));
            assert!(cache.len() <= 11);
        }
        assert!(cache.session("n99").is_some());
    }

    #[test]
    fn test_evict_huge_bounds() {
        let cache = NonceCache::new(usize::MAX, 1);
        cache.register("a");
        cache.evict_if_needed();
        assert_eq!(cache.len(), 1);

        let cache = NonceCache::new(1, usize::MAX);
        cache.register("a");
        cache.register("b");
        cache.evict_if_needed();
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_concurrent_same_counter() {
        let cache = Arc::new(NonceCache::default());
        cache.register("shared");

        let accepted: usize = (0..8)
            .map(|_| {
                let cache = Arc::clone(&cache);
                thread::spawn(move || cache.advance("shared", 1, false).is_ok())
            })
            .collect::<Vec<_>>()
            .into_iter()
            .map(|h| h.join().unwrap() as usize)
            .sum();

        assert_eq!(accepted, 1);
        assert_eq!(cache.session("shared").unwrap().counter, 1);
    }
}
