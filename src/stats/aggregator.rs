//! Statistics aggregation
//!
//! Host workers each produce an independent [`HostStats`]. The
//! [`StatisticsAggregator`] is the single writer that folds them into the
//! all-hosts view: it merges every host's buckets into the virtual
//! all-hosts [`BucketSet`], appends the host's tuples to the global tuple
//! log and sums the audit counters. Per-host buckets are kept for the
//! hostwise tables.
//!
//! # Example
//!
//! ```
//! use nslogstat::event::parse_line;
//! use nslogstat::stats::aggregator::{HostStats, StatisticsAggregator};
//!
//! let line = "Success-Update\tname1\t12\tx\t3\t4\ty\t0\t1000";
//! let event = parse_line(line).unwrap().unwrap();
//!
//! let mut host = HostStats::new("a");
//! host.buckets.record(&event);
//!
//! let mut aggregator = StatisticsAggregator::new();
//! aggregator.add_host(host);
//!
//! assert_eq!(aggregator.all().successes(), 1);
//! assert_eq!(aggregator.host_count(), 1);
//! ```

use crate::event::{EventKind, OpKind};
use crate::stats::BucketSet;
use crate::worker::timeline::TimedEvent;
use serde::Serialize;
use std::collections::BTreeMap;

/// Counters for data that was read but did not reach a latency bucket
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AuditCounters {
    /// Shards fully read
    pub shards_read: u64,
    /// Shards skipped because they could not be opened or decoded
    pub shard_errors: u64,
    /// Lines with a recognized marker whose fields did not decode
    pub parse_errors: u64,
    /// Non-empty lines without a recognized marker
    pub unrecognized_lines: u64,
    /// Events dropped by the ramp-up / ramp-down window
    pub excluded_events: u64,
    /// Events on hosts that never logged a timestamped success
    pub unanchored_events: u64,
}

impl AuditCounters {
    pub fn merge(&mut self, other: &AuditCounters) {
        self.shards_read += other.shards_read;
        self.shard_errors += other.shard_errors;
        self.parse_errors += other.parse_errors;
        self.unrecognized_lines += other.unrecognized_lines;
        self.excluded_events += other.excluded_events;
        self.unanchored_events += other.unanchored_events;
    }
}

/// One flattened request record of the tuple log
#[derive(Debug, Clone, PartialEq)]
pub struct TupleRecord {
    pub name: String,
    pub local_node: Option<i64>,
    pub remote_node: Option<i64>,
    pub transmissions: u32,
    pub latency_ms: Option<f64>,
    pub kind: EventKind,
    /// Normalized start time (ms since the host baseline)
    pub start_ms: f64,
    /// Normalized completion time
    pub end_ms: f64,
    pub restarts: u32,
    pub host: String,
}

impl TupleRecord {
    pub fn from_timed(host: &str, timed: &TimedEvent) -> Self {
        let event = &timed.event;
        Self {
            name: event.name.clone(),
            local_node: event.local_node,
            remote_node: event.remote_node,
            transmissions: event.transmissions,
            latency_ms: event.latency_ms,
            kind: event.kind,
            start_ms: timed.start_ms,
            end_ms: timed.end_ms(),
            restarts: event.restarts,
            host: host.to_string(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.kind.is_success()
    }
}

/// Everything one host contributed to the run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HostStats {
    pub host: String,
    /// Node id from the host's node config, if known
    pub node_id: Option<i64>,
    /// Ping latency to the closest name server, if the node config lists one
    pub closest_ns_ms: Option<f64>,
    pub buckets: BucketSet,
    /// The host's windowed events in chronological order
    pub tuples: Vec<TupleRecord>,
    /// Windowed connection-setup times in log order
    pub connect_times: Vec<f64>,
    pub audit: AuditCounters,
}

impl HostStats {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            ..Self::default()
        }
    }
}

/// Per-host results and the merged all-hosts view
#[derive(Debug, Default)]
pub struct StatisticsAggregator {
    /// Per-host results keyed by host id (tuples moved out)
    hosts: BTreeMap<String, HostStats>,
    /// Virtual all-hosts buckets
    all: BucketSet,
    /// Global tuple log in merge order
    tuples: Vec<TupleRecord>,
    connect_times: Vec<f64>,
    audit: AuditCounters,
}

impl StatisticsAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one host's results into the aggregate
    ///
    /// A host id seen twice is merged into its earlier entry.
    pub fn add_host(&mut self, mut stats: HostStats) {
        self.all.merge(&stats.buckets);
        self.audit.merge(&stats.audit);
        self.tuples.append(&mut stats.tuples);
        self.connect_times.append(&mut stats.connect_times);

        match self.hosts.get_mut(&stats.host) {
            Some(existing) => {
                existing.buckets.merge(&stats.buckets);
                existing.audit.merge(&stats.audit);
                existing.node_id = existing.node_id.or(stats.node_id);
                existing.closest_ns_ms = existing.closest_ns_ms.or(stats.closest_ns_ms);
            }
            None => {
                self.hosts.insert(stats.host.clone(), stats);
            }
        }
    }

    /// All-hosts buckets
    pub fn all(&self) -> &BucketSet {
        &self.all
    }

    /// Hosts in host-id order
    pub fn hosts(&self) -> impl Iterator<Item = &HostStats> {
        self.hosts.values()
    }

    pub fn host(&self, host: &str) -> Option<&HostStats> {
        self.hosts.get(host)
    }

    pub fn host_count(&self) -> usize {
        self.hosts.len()
    }

    pub fn tuples(&self) -> &[TupleRecord] {
        &self.tuples
    }

    pub fn audit(&self) -> &AuditCounters {
        &self.audit
    }

    /// Successful requests per host, in host-id order
    pub fn host_successes(&self) -> Vec<f64> {
        self.hosts
            .values()
            .map(|h| h.buckets.successes() as f64)
            .collect()
    }

    /// Closest-name-server latencies, one per successful lookup on a host
    /// that reports one
    pub fn closest_ns_latencies(&self) -> &[f64] {
        self.all
            .get(OpKind::Lookup)
            .map(|b| b.closest_ns_latencies())
            .unwrap_or(&[])
    }

    /// Connection-setup times across all hosts, in merge order
    pub fn connect_times(&self) -> &[f64] {
        &self.connect_times
    }

    /// Success latencies of one host for `op`, or across all kinds if `None`
    pub fn host_latencies(&self, host: &HostStats, op: Option<OpKind>) -> Vec<f64> {
        match op {
            Some(op) => host.buckets.latencies(op).to_vec(),
            None => host.buckets.all_latencies(),
        }
    }

    /// Successful-request latencies across all hosts for `op`, or all kinds
    pub fn latencies(&self, op: Option<OpKind>) -> Vec<f64> {
        match op {
            Some(op) => self.all.latencies(op).to_vec(),
            None => self.all.all_latencies(),
        }
    }
}
