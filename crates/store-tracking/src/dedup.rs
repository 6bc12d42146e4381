//! Event Deduplication Store
//!
//! Tracks which non-repeatable events each visitor fingerprint has already
//! sent. Entries expire 30 minutes after last activity; the map is bounded
//! at a fixed capacity with least-recently-active eviction. Process-local
//! and intentionally unsynchronized across instances.

use std::collections::{HashMap, HashSet};
use std::sync::RwLock;
use std::time::{Duration, Instant};

use crate::fingerprint::Fingerprint;

/// Inactivity window after which a visitor record expires.
pub const DEDUP_TTL: Duration = Duration::from_secs(30 * 60);

/// Upper bound on tracked fingerprints.
pub const DEDUP_CAPACITY: usize = 1000;

/// Whether an event should be relayed or skipped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DedupDecision {
    /// First sighting within the window; relay it
    New,
    /// Already sent by this fingerprint; skip
    Duplicate,
}

/// Storage trait for visitor event records
pub trait DedupStore: Send + Sync {
    /// Record activity for a fingerprint and decide whether `event` is a
    /// duplicate. `non_repeatable` events are checked against the
    /// fingerprint's sent-set; repeatable events only refresh activity.
    fn check_and_record(
        &self,
        fingerprint: &Fingerprint,
        event: &str,
        non_repeatable: bool,
    ) -> DedupDecision;

    /// Number of live visitor records
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

struct VisitorRecord {
    last_seen: Instant,
    sent_events: HashSet<String>,
}

/// In-memory dedup store
pub struct MemoryDedupStore {
    records: RwLock<HashMap<String, VisitorRecord>>,
    ttl: Duration,
    capacity: usize,
}

impl Default for MemoryDedupStore {
    fn default() -> Self {
        Self::new(DEDUP_TTL, DEDUP_CAPACITY)
    }
}

impl MemoryDedupStore {
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
            ttl,
            capacity,
        }
    }

    fn check_and_record_at(
        &self,
        fingerprint: &Fingerprint,
        event: &str,
        non_repeatable: bool,
        now: Instant,
    ) -> DedupDecision {
        let mut records = self.records.write().unwrap();

        // Sweep expired records first so an elapsed window reads as new.
        records.retain(|_, record| now.duration_since(record.last_seen) < self.ttl);

        let record = records
            .entry(fingerprint.as_str().to_string())
            .or_insert_with(|| VisitorRecord {
                last_seen: now,
                sent_events: HashSet::new(),
            });
        record.last_seen = now;

        let decision = if non_repeatable && !record.sent_events.insert(event.to_string()) {
            DedupDecision::Duplicate
        } else {
            DedupDecision::New
        };

        // Bounded: drop the least-recently-active records beyond capacity.
        while records.len() > self.capacity {
            let Some(oldest) = records
                .iter()
                .min_by_key(|(_, record)| record.last_seen)
                .map(|(key, _)| key.clone())
            else {
                break;
            };
            records.remove(&oldest);
        }

        decision
    }
}

impl DedupStore for MemoryDedupStore {
    fn check_and_record(
        &self,
        fingerprint: &Fingerprint,
        event: &str,
        non_repeatable: bool,
    ) -> DedupDecision {
        self.check_and_record_at(fingerprint, event, non_repeatable, Instant::now())
    }

    fn len(&self) -> usize {
        self.records.read().unwrap().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fp(ip: &str) -> Fingerprint {
        Fingerprint::derive(ip, "Mozilla/5.0")
    }

    #[test]
    fn test_duplicate_within_window() {
        let store = MemoryDedupStore::default();
        let visitor = fp("1.2.3.4");

        assert_eq!(
            store.check_and_record(&visitor, "PageView", true),
            DedupDecision::New
        );
        assert_eq!(
            store.check_and_record(&visitor, "PageView", true),
            DedupDecision::Duplicate
        );
    }

    #[test]
    fn test_distinct_events_both_new() {
        let store = MemoryDedupStore::default();
        let visitor = fp("1.2.3.4");

        assert_eq!(
            store.check_and_record(&visitor, "PageView", true),
            DedupDecision::New
        );
        assert_eq!(
            store.check_and_record(&visitor, "ScrollDepth25", true),
            DedupDecision::New
        );
    }

    #[test]
    fn test_distinct_fingerprints_independent() {
        let store = MemoryDedupStore::default();

        assert_eq!(
            store.check_and_record(&fp("1.2.3.4"), "PageView", true),
            DedupDecision::New
        );
        assert_eq!(
            store.check_and_record(&fp("5.6.7.8"), "PageView", true),
            DedupDecision::New
        );
    }

    #[test]
    fn test_repeatable_events_never_skip() {
        let store = MemoryDedupStore::default();
        let visitor = fp("1.2.3.4");

        assert_eq!(
            store.check_and_record(&visitor, "Purchase", false),
            DedupDecision::New
        );
        assert_eq!(
            store.check_and_record(&visitor, "Purchase", false),
            DedupDecision::New
        );
    }

    #[test]
    fn test_expired_window_reads_as_new() {
        let store = MemoryDedupStore::new(Duration::from_secs(30 * 60), DEDUP_CAPACITY);
        let visitor = fp("1.2.3.4");
        let start = Instant::now();

        assert_eq!(
            store.check_and_record_at(&visitor, "PageView", true, start),
            DedupDecision::New
        );
        assert_eq!(
            store.check_and_record_at(&visitor, "PageView", true, start),
            DedupDecision::Duplicate
        );

        let after_window = start + Duration::from_secs(31 * 60);
        assert_eq!(
            store.check_and_record_at(&visitor, "PageView", true, after_window),
            DedupDecision::New
        );
    }

    #[test]
    fn test_activity_extends_window() {
        let store = MemoryDedupStore::default();
        let visitor = fp("1.2.3.4");
        let start = Instant::now();

        store.check_and_record_at(&visitor, "PageView", true, start);
        // Activity at +20 min refreshes last-seen.
        store.check_and_record_at(
            &visitor,
            "ScrollDepth25",
            true,
            start + Duration::from_secs(20 * 60),
        );

        // +40 min from start is only 20 min after last activity.
        assert_eq!(
            store.check_and_record_at(
                &visitor,
                "PageView",
                true,
                start + Duration::from_secs(40 * 60)
            ),
            DedupDecision::Duplicate
        );
    }

    #[test]
    fn test_capacity_evicts_least_recently_active() {
        let store = MemoryDedupStore::new(DEDUP_TTL, 2);
        let start = Instant::now();

        store.check_and_record_at(&fp("1.1.1.1"), "PageView", true, start);
        store.check_and_record_at(&fp("2.2.2.2"), "PageView", true, start + Duration::from_secs(1));
        store.check_and_record_at(&fp("3.3.3.3"), "PageView", true, start + Duration::from_secs(2));

        assert_eq!(store.len(), 2);
        // The oldest fingerprint was evicted, so its event reads as new.
        assert_eq!(
            store.check_and_record_at(
                &fp("1.1.1.1"),
                "PageView",
                true,
                start + Duration::from_secs(3)
            ),
            DedupDecision::New
        );
    }
}
