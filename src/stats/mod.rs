//! Statistics collection
//!
//! Latency samples and outcome counters grouped by operation kind.
//!
//! - [`AggregateBucket`]: one operation kind on one host (or on all hosts)
//! - [`BucketSet`]: every operation kind for one host
//! - [`aggregator`]: per-host results merged into the all-hosts view
//! - [`distribution`]: exact order statistics, CDFs, fairness index
//! - [`histogram`]: approximate HdrHistogram percentiles
//! - [`grouping`]: tuple-log breakdowns by name and by time
//!
//! # Example
//!
//! ```
//! use nslogstat::event::parse_line;
//! use nslogstat::stats::BucketSet;
//!
//! let line = "Success-Update\tname1\t12\tx\t3\t4\ty\t0\t1000";
//! let event = parse_line(line).unwrap().unwrap();
//!
//! let mut buckets = BucketSet::new();
//! buckets.record(&event);
//!
//! assert_eq!(buckets.successes(), 1);
//! assert_eq!(buckets.failures(), 0);
//! ```

pub mod aggregator;
pub mod distribution;
pub mod grouping;
pub mod histogram;

use crate::event::{Event, OpKind};
use std::collections::BTreeMap;

/// Samples and counters for one operation kind
///
/// Latencies of successful requests go to `latencies`; measured latencies
/// of failed requests are kept apart in `failed_latencies` and never mix
/// with the success distribution.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AggregateBucket {
    latencies: Vec<f64>,
    failed_latencies: Vec<f64>,
    ping_latencies: Vec<f64>,
    closest_ns_latencies: Vec<f64>,
    successes: u64,
    failures: u64,
    retransmissions: u64,
    cache_hits: u64,
    primary_contacts: u64,
}

impl AggregateBucket {
    pub fn new() -> Self {
        Self::default()
    }

    /// Account for one event of this bucket's kind
    pub fn record(&mut self, event: &Event) {
        if event.is_success() {
            self.successes += 1;
            if let Some(latency) = event.latency_ms {
                self.latencies.push(latency);
            }
            if let Some(ping) = event.ping_ms {
                self.ping_latencies.push(ping);
            }
            if event.is_retransmission() {
                self.retransmissions += 1;
            }
            if event.is_cache_hit() {
                self.cache_hits += 1;
            }
            if event.contacted_primary() {
                self.primary_contacts += 1;
            }
        } else {
            self.failures += 1;
            if let Some(latency) = event.latency_ms {
                self.failed_latencies.push(latency);
            }
        }
    }

    /// Merge another bucket into this one
    pub fn merge(&mut self, other: &AggregateBucket) {
        self.latencies.extend_from_slice(&other.latencies);
        self.failed_latencies.extend_from_slice(&other.failed_latencies);
        self.ping_latencies.extend_from_slice(&other.ping_latencies);
        self.closest_ns_latencies.extend_from_slice(&other.closest_ns_latencies);
        self.successes += other.successes;
        self.failures += other.failures;
        self.retransmissions += other.retransmissions;
        self.cache_hits += other.cache_hits;
        self.primary_contacts += other.primary_contacts;
    }

    /// Latencies of successful requests
    pub fn latencies(&self) -> &[f64] {
        &self.latencies
    }

    /// Measured latencies of failed requests
    pub fn failed_latencies(&self) -> &[f64] {
        &self.failed_latencies
    }

    /// Ping latencies reported alongside successful lookups
    pub fn ping_latencies(&self) -> &[f64] {
        &self.ping_latencies
    }

    /// Closest-name-server latency of the observing host, once per lookup
    pub fn closest_ns_latencies(&self) -> &[f64] {
        &self.closest_ns_latencies
    }

    pub fn successes(&self) -> u64 {
        self.successes
    }

    pub fn failures(&self) -> u64 {
        self.failures
    }

    pub fn requests(&self) -> u64 {
        self.successes + self.failures
    }

    pub fn retransmissions(&self) -> u64 {
        self.retransmissions
    }

    pub fn cache_hits(&self) -> u64 {
        self.cache_hits
    }

    pub fn primary_contacts(&self) -> u64 {
        self.primary_contacts
    }
}

/// One bucket per operation kind
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BucketSet {
    buckets: BTreeMap<OpKind, AggregateBucket>,
}

impl BucketSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Route an event to the bucket of its operation kind
    pub fn record(&mut self, event: &Event) {
        self.buckets.entry(event.kind.op()).or_default().record(event);
    }

    /// Attach the host's closest-name-server latency to one successful lookup
    pub fn record_closest_ns(&mut self, latency_ms: f64) {
        self.buckets
            .entry(OpKind::Lookup)
            .or_default()
            .closest_ns_latencies
            .push(latency_ms);
    }

    /// Merge every bucket of `other` into the matching bucket here
    pub fn merge(&mut self, other: &BucketSet) {
        for (op, bucket) in &other.buckets {
            self.buckets.entry(*op).or_default().merge(bucket);
        }
    }

    /// Bucket for `op`, if anything was recorded for it
    pub fn get(&self, op: OpKind) -> Option<&AggregateBucket> {
        self.buckets.get(&op)
    }

    /// Success latencies of `op`, empty if none
    pub fn latencies(&self, op: OpKind) -> &[f64] {
        self.get(op).map(AggregateBucket::latencies).unwrap_or(&[])
    }

    /// Success latencies across every operation kind, in kind order
    pub fn all_latencies(&self) -> Vec<f64> {
        self.buckets
            .values()
            .flat_map(|b| b.latencies.iter().copied())
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (OpKind, &AggregateBucket)> {
        self.buckets.iter().map(|(op, bucket)| (*op, bucket))
    }

    fn sum(&self, f: impl Fn(&AggregateBucket) -> u64) -> u64 {
        self.buckets.values().map(f).sum()
    }

    pub fn successes(&self) -> u64 {
        self.sum(AggregateBucket::successes)
    }

    pub fn failures(&self) -> u64 {
        self.sum(AggregateBucket::failures)
    }

    pub fn requests(&self) -> u64 {
        self.sum(AggregateBucket::requests)
    }

    pub fn retransmissions(&self) -> u64 {
        self.sum(AggregateBucket::retransmissions)
    }

    pub fn cache_hits(&self) -> u64 {
        self.sum(AggregateBucket::cache_hits)
    }

    pub fn primary_contacts(&self) -> u64 {
        self.sum(AggregateBucket::primary_contacts)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::event::EventKind;

    pub(crate) fn event(kind: EventKind, latency: Option<f64>) -> Event {
        Event {
            kind,
            name: "n".to_string(),
            latency_ms: latency,
            start_time_raw: None,
            local_node: None,
            remote_node: None,
            transmissions: 1,
            restarts: 0,
            cache_marker: false,
            ping_ms: None,
        }
    }

    #[test]
    fn test_success_and_failure() {
        let mut bucket = AggregateBucket::new();
        bucket.record(&event(EventKind::LookupSuccess, Some(12.0)));
        bucket.record(&event(EventKind::LookupFailure, None));
        bucket.record(&event(EventKind::LookupFailure, Some(900.0)));

        assert_eq!(bucket.successes(), 1);
        assert_eq!(bucket.failures(), 2);
        assert_eq!(bucket.requests(), 3);
        assert_eq!(bucket.latencies(), &[12.0]);
        assert_eq!(bucket.failed_latencies(), &[900.0]);
    }

    #[test]
    fn test_secondary_counters() {
        let mut bucket = AggregateBucket::new();

        let mut cached = event(EventKind::LookupSuccess, Some(0.5));
        cached.transmissions = 0;
        bucket.record(&cached);

        let mut retried = event(EventKind::LookupSuccess, Some(80.0));
        retried.transmissions = 3;
        retried.restarts = 1;
        retried.ping_ms = Some(20.0);
        bucket.record(&retried);

        assert_eq!(bucket.cache_hits(), 1);
        assert_eq!(bucket.retransmissions(), 1);
        assert_eq!(bucket.primary_contacts(), 1);
        assert_eq!(bucket.ping_latencies(), &[20.0]);
    }

    #[test]
    fn test_bucket_set_routes_by_kind() {
        let mut set = BucketSet::new();
        set.record(&event(EventKind::LookupSuccess, Some(1.0)));
        set.record(&event(EventKind::UpdateSuccess, Some(2.0)));
        set.record(&event(EventKind::UpdateFailure, None));
        set.record(&event(EventKind::GroupChangeSuccess, Some(3.0)));

        assert_eq!(set.latencies(OpKind::Lookup), &[1.0]);
        assert_eq!(set.latencies(OpKind::Update), &[2.0]);
        assert_eq!(set.latencies(OpKind::Remove), &[] as &[f64]);
        assert_eq!(set.get(OpKind::Update).unwrap().failures(), 1);
        assert_eq!(set.all_latencies(), vec![1.0, 2.0, 3.0]);
        assert_eq!(set.successes(), 3);
        assert_eq!(set.failures(), 1);
    }

    #[test]
    fn test_closest_ns_goes_to_lookups() {
        let mut set = BucketSet::new();
        set.record(&event(EventKind::LookupSuccess, Some(1.0)));
        set.record_closest_ns(10.0);
        set.record_closest_ns(10.0);

        let read = set.get(OpKind::Lookup).unwrap();
        assert_eq!(read.closest_ns_latencies(), &[10.0, 10.0]);
        assert_eq!(read.successes(), 1);

        let mut other = BucketSet::new();
        other.record_closest_ns(100.0);
        set.merge(&other);
        assert_eq!(set.get(OpKind::Lookup).unwrap().closest_ns_latencies(), &[10.0, 10.0, 100.0]);
    }

    #[test]
    fn test_merge() {
        let mut a = BucketSet::new();
        a.record(&event(EventKind::AddSuccess, Some(4.0)));
        let mut b = BucketSet::new();
        b.record(&event(EventKind::AddSuccess, Some(6.0)));
        b.record(&event(EventKind::RemoveFailure, None));

        a.merge(&b);
        assert_eq!(a.latencies(OpKind::Add), &[4.0, 6.0]);
        assert_eq!(a.get(OpKind::Remove).unwrap().failures(), 1);
        assert_eq!(a.requests(), 3);
    }
}
