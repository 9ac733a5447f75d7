//! Secondary breakdowns of the tuple log
//!
//! Both groupings are computed from the tuple log alone, so they can be
//! regenerated without touching the raw shards.

use crate::event::OpKind;
use crate::stats::aggregator::TupleRecord;
use crate::stats::distribution::{percentile_of_sorted, sorted};
use crate::stats::histogram::LatencyHistogram;
use std::collections::BTreeMap;

/// Request counts and latency of one name
#[derive(Debug, Clone, PartialEq)]
pub struct NameGroup {
    pub name: String,
    pub requests: u64,
    pub successes: u64,
    pub failures: u64,
    /// Lookup requests, successful or not
    pub reads: u64,
    /// Update, add and remove requests, successful or not
    pub writes: u64,
    /// Over successful requests; `None` if the name never succeeded
    pub median_ms: Option<f64>,
    pub mean_ms: Option<f64>,
}

/// Group the tuple log by name, sorted by name
pub fn group_by_name(tuples: &[TupleRecord]) -> Vec<NameGroup> {
    let mut groups: BTreeMap<&str, (NameGroup, Vec<f64>)> = BTreeMap::new();

    for tuple in tuples {
        let (group, latencies) = groups.entry(tuple.name.as_str()).or_insert_with(|| {
            (
                NameGroup {
                    name: tuple.name.clone(),
                    requests: 0,
                    successes: 0,
                    failures: 0,
                    reads: 0,
                    writes: 0,
                    median_ms: None,
                    mean_ms: None,
                },
                Vec::new(),
            )
        });

        group.requests += 1;
        match tuple.kind.op() {
            OpKind::Lookup => group.reads += 1,
            OpKind::Update | OpKind::Add | OpKind::Remove => group.writes += 1,
            OpKind::GroupChange => {}
        }

        if tuple.is_success() {
            group.successes += 1;
            if let Some(latency) = tuple.latency_ms {
                latencies.push(latency);
            }
        } else {
            group.failures += 1;
        }
    }

    groups
        .into_values()
        .map(|(mut group, latencies)| {
            if !latencies.is_empty() {
                let sorted = sorted(&latencies);
                group.median_ms = Some(percentile_of_sorted(&sorted, 50.0));
                group.mean_ms = Some(sorted.iter().sum::<f64>() / sorted.len() as f64);
            }
            group
        })
        .collect()
}

/// One window of the latency-over-time series
#[derive(Debug, Clone)]
pub struct TimeBucket {
    /// Window start in ms of normalized time
    pub start_ms: f64,
    pub requests: u64,
    pub failures: u64,
    /// Successful-request latencies in this window
    pub latency: LatencyHistogram,
}

/// Bucket the tuple log by normalized start time
///
/// Windows are `bucket_ms` wide starting at 0; only windows that saw at
/// least one request are returned, in time order. Events with a negative
/// normalized start (clock stepped back) fall into the first window.
pub fn group_by_time(tuples: &[TupleRecord], bucket_ms: f64) -> Vec<TimeBucket> {
    let mut buckets: BTreeMap<u64, TimeBucket> = BTreeMap::new();

    for tuple in tuples {
        let index = (tuple.start_ms.max(0.0) / bucket_ms).floor() as u64;
        let bucket = buckets.entry(index).or_insert_with(|| TimeBucket {
            start_ms: index as f64 * bucket_ms,
            requests: 0,
            failures: 0,
            latency: LatencyHistogram::new(),
        });

        bucket.requests += 1;
        if tuple.is_success() {
            if let Some(latency) = tuple.latency_ms {
                bucket.latency.record_ms(latency);
            }
        } else {
            bucket.failures += 1;
        }
    }

    buckets.into_values().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventKind;

    fn tuple(name: &str, kind: EventKind, latency: Option<f64>, start_ms: f64) -> TupleRecord {
        TupleRecord {
            name: name.to_string(),
            local_node: None,
            remote_node: None,
            transmissions: 1,
            latency_ms: latency,
            kind,
            start_ms,
            end_ms: start_ms + latency.unwrap_or(0.0),
            restarts: 0,
            host: "h".to_string(),
        }
    }

    #[test]
    fn test_group_by_name() {
        let tuples = vec![
            tuple("b", EventKind::LookupSuccess, Some(10.0), 0.0),
            tuple("a", EventKind::UpdateSuccess, Some(4.0), 1.0),
            tuple("b", EventKind::LookupFailure, None, 2.0),
            tuple("b", EventKind::LookupSuccess, Some(20.0), 3.0),
            tuple("c", EventKind::RemoveFailure, Some(50.0), 4.0),
        ];

        let groups = group_by_name(&tuples);
        let names: Vec<&str> = groups.iter().map(|g| g.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);

        let b = &groups[1];
        assert_eq!(b.requests, 3);
        assert_eq!(b.successes, 2);
        assert_eq!(b.failures, 1);
        assert_eq!(b.reads, 3);
        assert_eq!(b.writes, 0);
        assert_eq!(b.median_ms, Some(15.0));
        assert_eq!(b.mean_ms, Some(15.0));

        let c = &groups[2];
        assert_eq!(c.writes, 1);
        assert_eq!(c.median_ms, None);
    }

    #[test]
    fn test_group_by_time() {
        let tuples = vec![
            tuple("a", EventKind::LookupSuccess, Some(10.0), 0.0),
            tuple("a", EventKind::LookupSuccess, Some(30.0), 999.0),
            tuple("a", EventKind::LookupFailure, None, 1000.0),
            tuple("a", EventKind::LookupSuccess, Some(5.0), 3500.0),
            tuple("a", EventKind::LookupSuccess, Some(7.0), -20.0),
        ];

        let buckets = group_by_time(&tuples, 1000.0);
        let starts: Vec<f64> = buckets.iter().map(|b| b.start_ms).collect();
        assert_eq!(starts, vec![0.0, 1000.0, 3000.0]);

        assert_eq!(buckets[0].requests, 3);
        assert_eq!(buckets[0].failures, 0);
        assert_eq!(buckets[0].latency.len(), 3);
        assert_eq!(buckets[1].requests, 1);
        assert_eq!(buckets[1].failures, 1);
        assert!(buckets[1].latency.is_empty());
        assert_eq!(buckets[2].latency.mean_ms(), Some(5.0));
    }

    #[test]
    fn test_empty_log() {
        assert!(group_by_name(&[]).is_empty());
        assert!(group_by_time(&[], 10.0).is_empty());
    }
}
