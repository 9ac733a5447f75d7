//! Run-level summary
//!
//! [`RunSummary`] gathers the counts, derived rates and per-kind latency
//! statistics of a finished run. It backs `summary.txt`, the console
//! results block and `report.json`, so all three always agree.

use crate::config::ReportConfig;
use crate::event::OpKind;
use crate::output::fmt_f64;
use crate::stats::aggregator::{AuditCounters, StatisticsAggregator};
use crate::stats::distribution::{fairness_index, Summary};
use serde::Serialize;

/// Latency groups in report order; `None` is every kind together
pub const REPORT_KINDS: [Option<OpKind>; 6] = [
    None,
    Some(OpKind::Lookup),
    Some(OpKind::Update),
    Some(OpKind::Add),
    Some(OpKind::Remove),
    Some(OpKind::GroupChange),
];

/// File and key prefix of a latency group (`all`, `read`, `write`, ...)
pub fn kind_prefix(op: Option<OpKind>) -> &'static str {
    op.map_or("all", OpKind::report_prefix)
}

/// Outcome counts of one operation kind
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KindCounts {
    pub kind: &'static str,
    pub successes: u64,
    pub failures: u64,
}

/// Success-latency statistics of one latency group
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KindLatency {
    pub kind: &'static str,
    #[serde(flatten)]
    pub summary: Summary,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub hosts: usize,
    pub requests: u64,
    pub successes: u64,
    pub failures: u64,
    /// One entry per operation kind, in report order
    pub kinds: Vec<KindCounts>,
    pub retransmissions: u64,
    pub cache_hits: u64,
    pub primary_contacts: u64,
    /// Retransmissions per successful lookup
    pub retransmission_rate: f64,
    /// Cache hits per successful lookup
    pub cache_hit_rate: f64,
    /// Primary-contact fallbacks per successful request
    pub primary_contact_rate: f64,
    /// Jain fairness index over per-host success counts
    pub fairness_index: f64,
    pub audit: AuditCounters,
    /// Latency groups that saw at least one success
    pub latency: Vec<KindLatency>,
}

impl RunSummary {
    pub fn build(aggregator: &StatisticsAggregator, config: &ReportConfig) -> Self {
        let all = aggregator.all();
        let lookups = all.get(OpKind::Lookup).map_or(0, |b| b.successes());

        let kinds = OpKind::ALL
            .iter()
            .map(|&op| KindCounts {
                kind: op.summary_label(),
                successes: all.get(op).map_or(0, |b| b.successes()),
                failures: all.get(op).map_or(0, |b| b.failures()),
            })
            .collect();

        let latency = REPORT_KINDS
            .iter()
            .filter_map(|&op| {
                Summary::compute(&aggregator.latencies(op), &config.percentiles).map(|summary| {
                    KindLatency {
                        kind: kind_prefix(op),
                        summary,
                    }
                })
            })
            .collect();

        Self {
            hosts: aggregator.host_count(),
            requests: all.requests(),
            successes: all.successes(),
            failures: all.failures(),
            kinds,
            retransmissions: all.retransmissions(),
            cache_hits: all.cache_hits(),
            primary_contacts: all.primary_contacts(),
            retransmission_rate: rate(all.retransmissions(), lookups),
            cache_hit_rate: rate(all.cache_hits(), lookups),
            primary_contact_rate: rate(all.primary_contacts(), all.successes()),
            fairness_index: fairness_index(&aggregator.host_successes()),
            audit: *aggregator.audit(),
            latency,
        }
    }

    /// `summary.txt` rows in their fixed order
    pub fn rows(&self) -> Vec<(String, String)> {
        let mut rows: Vec<(String, String)> = vec![
            ("Hosts".into(), self.hosts.to_string()),
            ("All".into(), self.requests.to_string()),
            ("Success".into(), self.successes.to_string()),
            ("Failed".into(), self.failures.to_string()),
        ];

        for counts in &self.kinds {
            rows.push((counts.kind.to_string(), counts.successes.to_string()));
        }
        // Group changes are only ever logged on success
        for counts in self.kinds.iter().filter(|c| c.kind != OpKind::GroupChange.summary_label()) {
            rows.push((format!("{}-Failed", counts.kind), counts.failures.to_string()));
        }

        let audit = &self.audit;
        rows.extend([
            ("Retransmissions".into(), self.retransmissions.to_string()),
            ("CacheHit".into(), self.cache_hits.to_string()),
            ("Contact-Primary".into(), self.primary_contacts.to_string()),
            ("Retransmission-Rate".into(), fmt_f64(self.retransmission_rate)),
            ("CacheHit-Rate".into(), fmt_f64(self.cache_hit_rate)),
            ("Contact-Primary-Rate".into(), fmt_f64(self.primary_contact_rate)),
            ("Fairness-Index".into(), fmt_f64(self.fairness_index)),
            ("Shards-Read".into(), audit.shards_read.to_string()),
            ("Parse-Errors".into(), audit.parse_errors.to_string()),
            ("Unrecognized-Lines".into(), audit.unrecognized_lines.to_string()),
            ("Shard-Errors".into(), audit.shard_errors.to_string()),
            ("Excluded-Events".into(), audit.excluded_events.to_string()),
            ("Unanchored-Events".into(), audit.unanchored_events.to_string()),
        ]);
        rows
    }
}

fn rate(count: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        count as f64 / total as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventKind;
    use crate::stats::aggregator::HostStats;
    use crate::stats::tests::event;

    fn aggregator() -> StatisticsAggregator {
        let mut a = HostStats::new("a");
        a.buckets.record(&event(EventKind::LookupSuccess, Some(12.0)));
        a.buckets.record(&event(EventKind::LookupFailure, None));

        let mut cached = event(EventKind::LookupSuccess, Some(1.0));
        cached.transmissions = 0;
        let mut retried = event(EventKind::LookupSuccess, Some(40.0));
        retried.transmissions = 2;
        retried.restarts = 1;

        let mut b = HostStats::new("b");
        b.buckets.record(&cached);
        b.buckets.record(&retried);
        b.buckets.record(&event(EventKind::UpdateSuccess, Some(7.0)));
        b.audit.parse_errors = 2;

        let mut aggregator = StatisticsAggregator::new();
        aggregator.add_host(a);
        aggregator.add_host(b);
        aggregator
    }

    fn row<'a>(rows: &'a [(String, String)], label: &str) -> &'a str {
        rows.iter()
            .find(|(l, _)| l == label)
            .map(|(_, v)| v.as_str())
            .unwrap_or_else(|| panic!("missing row {label}"))
    }

    #[test]
    fn test_counts_and_rates() {
        let summary = RunSummary::build(&aggregator(), &ReportConfig::default());

        assert_eq!(summary.hosts, 2);
        assert_eq!(summary.requests, 5);
        assert_eq!(summary.successes, 4);
        assert_eq!(summary.failures, 1);
        assert_eq!(summary.retransmissions, 1);
        assert_eq!(summary.cache_hits, 1);
        assert_eq!(summary.primary_contacts, 1);
        assert!((summary.retransmission_rate - 1.0 / 3.0).abs() < 1e-12);
        assert!((summary.cache_hit_rate - 1.0 / 3.0).abs() < 1e-12);
        assert_eq!(summary.primary_contact_rate, 0.25);
        // Success counts [1, 3]: 16 / (2 * 10)
        assert_eq!(summary.fairness_index, 0.8);
    }

    #[test]
    fn test_rows() {
        let rows = RunSummary::build(&aggregator(), &ReportConfig::default()).rows();

        assert_eq!(rows[0], ("Hosts".to_string(), "2".to_string()));
        assert_eq!(row(&rows, "Read"), "3");
        assert_eq!(row(&rows, "Read-Failed"), "1");
        assert_eq!(row(&rows, "Write"), "1");
        assert_eq!(row(&rows, "GroupChange"), "0");
        assert_eq!(row(&rows, "Parse-Errors"), "2");
        assert_eq!(row(&rows, "Contact-Primary-Rate"), "0.250");
        assert!(rows.iter().all(|(l, _)| l != "GroupChange-Failed"));
    }

    #[test]
    fn test_latency_groups() {
        let summary = RunSummary::build(&aggregator(), &ReportConfig::default());

        let kinds: Vec<&str> = summary.latency.iter().map(|l| l.kind).collect();
        assert_eq!(kinds, vec!["all", "read", "write"]);
        assert_eq!(summary.latency[1].summary.max, 40.0);
        assert_eq!(summary.latency[0].summary.count, 4);
    }

    #[test]
    fn test_empty_run() {
        let summary = RunSummary::build(&StatisticsAggregator::new(), &ReportConfig::default());
        assert_eq!(summary.fairness_index, -1.0);
        assert_eq!(summary.retransmission_rate, 0.0);
        assert!(summary.latency.is_empty());
    }
}
