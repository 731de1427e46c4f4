//! Rolling in-memory time series of probe results
//!
//! Keeps one append-only series per target, pruned from the front on every
//! write so that only the retention window (24 hours by default) survives.

use crate::models::{ProbeResult, TimestampedResult};
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::{PoisonError, RwLock};
use std::time::Duration;

/// Default retention window (24 hours)
pub const DEFAULT_RETENTION: Duration = Duration::from_secs(24 * 60 * 60);

/// Per-target rolling series store.
///
/// Every mutation is a short synchronous critical section; readers clone
/// under the same lock, so a partially written series is never observed.
#[derive(Debug)]
pub struct RollingStore {
    retention_ms: i64,
    inner: RwLock<SeriesMap>,
}

#[derive(Debug, Default)]
struct SeriesMap {
    /// Target name -> position in `series`
    index: HashMap<String, usize>,
    /// Series in order of each target's first record
    series: Vec<Series>,
}

#[derive(Debug)]
struct Series {
    name: String,
    entries: VecDeque<TimestampedResult>,
}

impl SeriesMap {
    fn series_mut(&mut self, name: &str) -> &mut Series {
        let idx = match self.index.get(name) {
            Some(&idx) => idx,
            None => {
                self.series.push(Series {
                    name: name.to_string(),
                    entries: VecDeque::new(),
                });
                let idx = self.series.len() - 1;
                self.index.insert(name.to_string(), idx);
                idx
            }
        };
        &mut self.series[idx]
    }
}

impl Series {
    fn append(&mut self, result: ProbeResult, now: i64, retention_ms: i64) {
        // Overlapping passes or a clock step back must not reorder the series
        let now = self.entries.back().map_or(now, |last| last.timestamp.max(now));
        self.entries.push_back(TimestampedResult {
            timestamp: now,
            result,
        });

        let cutoff = now - retention_ms;
        while let Some(front) = self.entries.front() {
            if front.timestamp < cutoff {
                self.entries.pop_front();
            } else {
                break;
            }
        }
    }
}

impl Default for RollingStore {
    fn default() -> Self {
        Self::new()
    }
}

impl RollingStore {
    /// Create a store with the default 24 hour retention
    pub fn new() -> Self {
        Self::with_retention(DEFAULT_RETENTION)
    }

    pub fn with_retention(retention: Duration) -> Self {
        Self {
            retention_ms: retention.as_millis() as i64,
            inner: RwLock::new(SeriesMap::default()),
        }
    }

    pub fn retention(&self) -> Duration {
        Duration::from_millis(self.retention_ms as u64)
    }

    /// Append a result stamped with `now` (epoch ms) and prune that series only.
    ///
    /// A `now` older than the series' last entry is raised to that entry's
    /// timestamp.
    pub fn record(&self, name: &str, result: ProbeResult, now: i64) {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        inner
            .series_mut(name)
            .append(result, now, self.retention_ms);
    }

    /// Record a whole tick under one lock acquisition
    pub fn record_batch(&self, results: &[ProbeResult], now: i64) {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        for result in results {
            inner
                .series_mut(&result.name)
                .append(result.clone(), now, self.retention_ms);
        }
    }

    /// Most recent entry per target, in order of first record
    pub fn latest(&self) -> Vec<TimestampedResult> {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        inner
            .series
            .iter()
            .filter_map(|s| s.entries.back().cloned())
            .collect()
    }

    /// Snapshot copy of every retained series
    pub fn history(&self) -> BTreeMap<String, Vec<TimestampedResult>> {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        inner
            .series
            .iter()
            .map(|s| (s.name.clone(), s.entries.iter().cloned().collect()))
            .collect()
    }

    /// Snapshot of a single target's series
    pub fn series(&self, name: &str) -> Option<Vec<TimestampedResult>> {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        inner
            .index
            .get(name)
            .map(|&idx| inner.series[idx].entries.iter().cloned().collect())
    }

    /// Number of targets with a series
    pub fn len(&self) -> usize {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .series
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Target;

    const HOUR_MS: i64 = 60 * 60 * 1000;

    fn ok(name: &str, duration_ms: u64) -> ProbeResult {
        ProbeResult::success(&Target::new(name, format!("http://{name}")), duration_ms, 200)
    }

    #[test]
    fn test_record_creates_series() {
        let store = RollingStore::new();
        assert!(store.is_empty());

        store.record("a", ok("a", 10), 1_000);

        assert_eq!(store.len(), 1);
        let latest = store.latest();
        assert_eq!(latest.len(), 1);
        assert_eq!(latest[0].timestamp, 1_000);
        assert_eq!(latest[0].result.duration_ms, 10);
    }

    #[test]
    fn test_window_eviction() {
        let store = RollingStore::new();
        let t0 = 1_700_000_000_000;

        store.record("a", ok("a", 1), t0);
        store.record("a", ok("a", 2), t0 + 25 * HOUR_MS);

        let history = store.history();
        let series = &history["a"];
        assert_eq!(series.len(), 1);
        assert_eq!(series[0].timestamp, t0 + 25 * HOUR_MS);
        assert!(series.iter().all(|e| e.timestamp != t0));
    }

    #[test]
    fn test_entry_at_window_edge_is_retained() {
        let store = RollingStore::new();
        let t0 = 0;

        store.record("a", ok("a", 1), t0);
        store.record("a", ok("a", 2), t0 + 24 * HOUR_MS);

        assert_eq!(store.series("a").unwrap().len(), 2);
    }

    #[test]
    fn test_pruning_is_scoped_to_written_series() {
        let store = RollingStore::new();

        store.record("a", ok("a", 1), 0);
        store.record("b", ok("b", 1), 0);
        store.record("a", ok("a", 2), 30 * HOUR_MS);

        assert_eq!(store.series("a").unwrap().len(), 1);
        // b was not written, so its stale entry is untouched
        assert_eq!(store.series("b").unwrap().len(), 1);
    }

    #[test]
    fn test_latest_preserves_first_record_order() {
        let store = RollingStore::new();

        store.record("zeta", ok("zeta", 1), 1);
        store.record("alpha", ok("alpha", 1), 2);
        store.record("zeta", ok("zeta", 5), 3);

        let names: Vec<_> = store
            .latest()
            .into_iter()
            .map(|e| (e.result.name, e.timestamp))
            .collect();
        assert_eq!(
            names,
            vec![("zeta".to_string(), 3), ("alpha".to_string(), 2)]
        );
    }

    #[test]
    fn test_history_is_a_snapshot() {
        let store = RollingStore::new();
        store.record("a", ok("a", 1), 1);

        let mut snapshot = store.history();
        snapshot.get_mut("a").unwrap().clear();
        snapshot.insert("ghost".to_string(), Vec::new());

        let fresh = store.history();
        assert_eq!(fresh["a"].len(), 1);
        assert!(!fresh.contains_key("ghost"));
    }

    #[test]
    fn test_series_timestamps_non_decreasing() {
        let store = RollingStore::new();
        for ts in [10, 20, 20, 35, 50] {
            store.record("a", ok("a", 1), ts);
        }

        let series = store.series("a").unwrap();
        assert!(series.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
    }

    #[test]
    fn test_late_writer_does_not_reorder_series() {
        let store = RollingStore::new();
        store.record("a", ok("a", 1), 101);
        store.record("a", ok("a", 2), 100);

        let series = store.series("a").unwrap();
        let timestamps: Vec<i64> = series.iter().map(|e| e.timestamp).collect();
        assert_eq!(timestamps, vec![101, 101]);
        assert_eq!(store.latest()[0].result.duration_ms, 2);
    }

    #[test]
    fn test_stale_batch_is_clamped_per_series() {
        let store = RollingStore::new();
        store.record_batch(&[ok("a", 1), ok("b", 1)], 200);
        store.record("c", ok("c", 1), 50);
        store.record_batch(&[ok("a", 2), ok("c", 2)], 150);

        let history = store.history();
        for series in history.values() {
            assert!(series.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
        }
        assert_eq!(history["a"][1].timestamp, 200);
        // c had nothing newer, so the batch time stands
        assert_eq!(history["c"][1].timestamp, 150);
    }

    #[test]
    fn test_record_batch_shares_timestamp() {
        let store = RollingStore::new();
        store.record_batch(&[ok("a", 1), ok("b", 2)], 42);

        let latest = store.latest();
        assert_eq!(latest.len(), 2);
        assert!(latest.iter().all(|e| e.timestamp == 42));
    }

    #[test]
    fn test_custom_retention() {
        let store = RollingStore::with_retention(Duration::from_secs(60));
        store.record("a", ok("a", 1), 0);
        store.record("a", ok("a", 1), 61_000);

        assert_eq!(store.series("a").unwrap().len(), 1);
        assert_eq!(store.retention(), Duration::from_secs(60));
    }

    #[test]
    fn test_concurrent_record_and_read() {
        use std::sync::Arc;
        use std::thread;

        let store = Arc::new(RollingStore::new());
        let writer = {
            let store = store.clone();
            thread::spawn(move || {
                for i in 0..500 {
                    store.record_batch(&[ok("a", i), ok("b", i)], i as i64);
                }
            })
        };

        for _ in 0..200 {
            let history = store.history();
            // A batch is visible whole or not at all
            let a = history.get("a").map(Vec::len).unwrap_or(0);
            let b = history.get("b").map(Vec::len).unwrap_or(0);
            assert_eq!(a, b);
        }

        writer.join().unwrap();
        assert_eq!(store.series("a").unwrap().len(), 500);
    }
}
