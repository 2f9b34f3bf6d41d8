// src/watch/cache.rs

use std::collections::HashMap;
use std::time::Duration;

use tokio::time::Instant;
use tracing::trace;

/// How long an event identity suppresses identical events.
pub const DEBOUNCE_TTL: Duration = Duration::from_secs(3);

/// How often expired identities are evicted.
pub const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Short-lived memory of the events already reacted to.
///
/// Editors and the OS often report one save as a burst of identical write
/// events; only the first one of a burst should restart anything.
///
/// Uses `tokio::time::Instant`, so it follows paused test time.
#[derive(Debug)]
pub struct DebounceCache {
    ttl: Duration,
    sweep_interval: Duration,
    expiries: HashMap<String, Instant>,
    last_sweep: Option<Instant>,
}

impl Default for DebounceCache {
    fn default() -> Self {
        Self::new(DEBOUNCE_TTL, SWEEP_INTERVAL)
    }
}

impl DebounceCache {
    pub fn new(ttl: Duration, sweep_interval: Duration) -> Self {
        Self {
            ttl,
            sweep_interval,
            expiries: HashMap::new(),
            last_sweep: None,
        }
    }

    /// Returns `true` if `key` was not seen within the TTL, and remembers it.
    ///
    /// A suppressed duplicate does not extend the window: a steady stream of
    /// events still gets one reaction per TTL.
    pub fn check_and_insert(&mut self, key: &str, now: Instant) -> bool {
        self.maybe_sweep(now);

        if let Some(expiry) = self.expiries.get(key) {
            if *expiry > now {
                trace!(key, "debounced");
                return false;
            }
        }

        self.expiries.insert(key.to_string(), now + self.ttl);
        true
    }

    /// Evict every expired identity.
    pub fn sweep(&mut self, now: Instant) {
        self.expiries.retain(|_, expiry| *expiry > now);
        self.last_sweep = Some(now);
    }

    pub fn len(&self) -> usize {
        self.expiries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.expiries.is_empty()
    }

    fn maybe_sweep(&mut self, now: Instant) {
        match self.last_sweep {
            None => self.last_sweep = Some(now),
            Some(last) if now.duration_since(last) >= self.sweep_interval => self.sweep(now),
            Some(_) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicates_within_ttl_are_suppressed() {
        let start = Instant::now();
        let mut cache = DebounceCache::default();

        assert!(cache.check_and_insert("WRITE: a", start));
        assert!(!cache.check_and_insert("WRITE: a", start + Duration::from_millis(100)));
        assert!(cache.check_and_insert("WRITE: b", start + Duration::from_millis(100)));
        assert!(cache.check_and_insert("WRITE: a", start + DEBOUNCE_TTL));
    }

    #[test]
    fn sweep_evicts_expired_entries() {
        let start = Instant::now();
        let mut cache = DebounceCache::default();
        cache.check_and_insert("x", start);
        cache.check_and_insert("y", start + Duration::from_secs(50));

        // The next insert after the sweep interval triggers a sweep.
        cache.check_and_insert("z", start + SWEEP_INTERVAL);

        assert_eq!(cache.len(), 1);
    }
}
