//! Session-scoped caching of extracted harmonic nodes.

use crate::node::HarmonicNode;
use log::debug;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock};

/// Identifies one extraction result. Two field sweeps with the same key
/// produce the same nodes, so their extraction can be shared.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct CacheKey {
    base_freq_bits: u64,
    n_points: usize,
    harmonics: u16,
}

impl CacheKey {
    pub fn new(base_freq_hz: f64, n_points: usize, harmonics: u16) -> Self {
        Self {
            base_freq_bits: base_freq_hz.to_bits(),
            n_points,
            harmonics,
        }
    }
}

/// Caches node lists per [`CacheKey`], owned by whoever owns the session.
///
/// Concurrent callers asking for the same key block on a shared cell, so the
/// extraction for a key runs at most once until it is invalidated.
#[derive(Default)]
pub struct NodeCache {
    entries: Mutex<HashMap<CacheKey, Arc<OnceLock<Vec<HarmonicNode>>>>>,
}

impl NodeCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached nodes for `key`, running `compute` first if no
    /// entry exists yet.
    pub fn get_or_compute(
        &self,
        key: CacheKey,
        compute: impl FnOnce() -> Vec<HarmonicNode>,
    ) -> Vec<HarmonicNode> {
        let cell = self
            .entries
            .lock()
            .unwrap()
            .entry(key)
            .or_default()
            .clone();
        cell.get_or_init(|| {
            debug!("node cache miss for {:?}", key);
            compute()
        })
        .clone()
    }

    /// Drops the entry for `key`. The next lookup recomputes.
    pub fn invalidate(&self, key: &CacheKey) {
        self.entries.lock().unwrap().remove(key);
    }

    pub fn clear(&self) {
        self.entries.lock().unwrap().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn node(alpha: f64) -> HarmonicNode {
        HarmonicNode {
            alpha,
            beta: 1.5,
            gamma: 1.8,
            dissonance: 2.0,
            prominence: 0.1,
            curvature: 0.1,
        }
    }

    #[test]
    fn computes_each_key_at_most_once() {
        let cache = NodeCache::new();
        let key = CacheKey::new(220.0, 150, 8);
        let runs = AtomicUsize::new(0);
        let compute = || {
            runs.fetch_add(1, Ordering::SeqCst);
            vec![node(1.25)]
        };
        let first = cache.get_or_compute(key, compute);
        let second = cache.get_or_compute(key, compute);
        assert_eq!(first, second);
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn distinct_keys_do_not_share_entries() {
        let cache = NodeCache::new();
        let at_220 = cache.get_or_compute(CacheKey::new(220.0, 150, 8), || vec![node(1.2)]);
        let at_440 = cache.get_or_compute(CacheKey::new(440.0, 150, 8), || vec![node(1.3)]);
        assert_ne!(at_220, at_440);
    }

    #[test]
    fn invalidation_forces_a_recompute() {
        let cache = NodeCache::new();
        let key = CacheKey::new(220.0, 150, 8);
        cache.get_or_compute(key, || vec![node(1.2)]);
        cache.invalidate(&key);
        let recomputed = cache.get_or_compute(key, || vec![node(1.4)]);
        assert_eq!(recomputed, vec![node(1.4)]);
    }

    #[test]
    fn clear_empties_every_entry() {
        let cache = NodeCache::new();
        cache.get_or_compute(CacheKey::new(220.0, 150, 8), || vec![node(1.2)]);
        cache.get_or_compute(CacheKey::new(440.0, 150, 8), || vec![node(1.3)]);
        cache.clear();
        let recomputed = cache.get_or_compute(CacheKey::new(220.0, 150, 8), Vec::new);
        assert!(recomputed.is_empty());
    }
}
