//! Counter collection passed to components as an explicit metrics capability.
//!
//! Components receive an `Arc<StatsCounter>` at construction instead of
//! writing to a process-wide registry, so tests can assert on counters in
//! isolation.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

/// A thread-safe named-counter collection.
///
/// The counter set is fixed at construction; incrementing an unknown name is
/// a silent no-op rather than a panic, so callers can share one collection
/// across components with different counter sets.
pub struct StatsCounter {
    counters: BTreeMap<&'static str, AtomicU64>,
}

impl StatsCounter {
    pub fn new(names: &[&'static str]) -> Self {
        let mut counters = BTreeMap::new();
        for &name in names {
            counters.insert(name, AtomicU64::new(0));
        }
        Self { counters }
    }

    pub fn increment(&self, name: &str) {
        if let Some(counter) = self.counters.get(name) {
            counter.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn add(&self, name: &str, value: u64) {
        if let Some(counter) = self.counters.get(name) {
            counter.fetch_add(value, Ordering::Relaxed);
        }
    }

    pub fn get(&self, name: &str) -> u64 {
        self.counters
            .get(name)
            .map(|c| c.load(Ordering::Relaxed))
            .unwrap_or(0)
    }

    /// Point-in-time copy of every counter, in name order.
    pub fn snapshot(&self) -> BTreeMap<&'static str, u64> {
        self.counters
            .iter()
            .map(|(&k, v)| (k, v.load(Ordering::Relaxed)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn increment_and_get() {
        let stats = StatsCounter::new(&["votes", "blocks"]);
        stats.increment("votes");
        stats.increment("votes");
        stats.add("blocks", 3);
        assert_eq!(stats.get("votes"), 2);
        assert_eq!(stats.get("blocks"), 3);
    }

    #[test]
    fn unknown_name_is_noop() {
        let stats = StatsCounter::new(&["votes"]);
        stats.increment("nonexistent");
        assert_eq!(stats.get("nonexistent"), 0);
    }

    #[test]
    fn snapshot_is_ordered() {
        let stats = StatsCounter::new(&["b", "a"]);
        stats.increment("a");
        let snap = stats.snapshot();
        let keys: Vec<_> = snap.keys().copied().collect();
        assert_eq!(keys, vec!["a", "b"]);
    }
}
