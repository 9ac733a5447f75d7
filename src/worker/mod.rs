//! Host worker
//!
//! A [`HostWorker`] scans one host end to end: it reads the host's shards
//! in chronological order, decodes every line, normalizes timestamps
//! through a [`HostTimeline`], applies the ramp-up / ramp-down window and
//! returns the host's [`HostStats`].
//!
//! Workers share nothing and never fail. Structural, decode and parse
//! problems are logged and tallied in the returned audit counters; the
//! coordinator runs one worker per host on a thread pool.
//!
//! # Example
//!
//! ```no_run
//! use nslogstat::config::AnalysisConfig;
//! use nslogstat::shard::locate_hosts;
//! use nslogstat::worker::HostWorker;
//! use std::path::Path;
//!
//! let config = AnalysisConfig::default();
//! for logs in locate_hosts(Path::new("/data/run1"), &config.layout)? {
//!     let stats = HostWorker::new(&logs, &config).run();
//!     println!("{}: {} successes", stats.host, stats.buckets.successes());
//! }
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod timeline;

use crate::config::AnalysisConfig;
use crate::event::{parse_connect_time, parse_line, Event, EventKind, ParseError};
use crate::shard::{open_shard, HostLogs, NodeConfig, ShardError};
use crate::stats::aggregator::{AuditCounters, HostStats, TupleRecord};
use std::path::Path;
use tracing::{debug, info, warn};

pub use timeline::{HostTimeline, TimedEvent};

/// One decoded shard line
enum Record {
    Request(Event),
    ConnectTime(f64),
}

fn decode(line: &str) -> Result<Option<Record>, ParseError> {
    if let Some(event) = parse_line(line)? {
        return Ok(Some(Record::Request(event)));
    }
    Ok(parse_connect_time(line)?.map(Record::ConnectTime))
}

/// Events and line counters of one fully read shard
#[derive(Debug, Default)]
struct ShardScan {
    events: Vec<Event>,
    connect_times: Vec<f64>,
    parse_errors: u64,
    unrecognized_lines: u64,
}

/// Scans the shards of a single host
pub struct HostWorker<'a> {
    logs: &'a HostLogs,
    config: &'a AnalysisConfig,
}

impl<'a> HostWorker<'a> {
    pub fn new(logs: &'a HostLogs, config: &'a AnalysisConfig) -> Self {
        Self { logs, config }
    }

    /// Scan every shard and return the host's windowed statistics
    pub fn run(&self) -> HostStats {
        let host = self.logs.host.as_str();
        let mut stats = HostStats::new(host);
        self.apply_node_config(&mut stats);

        let mut timeline = HostTimeline::new();
        let mut connect_times = Vec::new();
        for shard in &self.logs.shards {
            match self.scan_shard(shard) {
                Ok(scan) => {
                    stats.audit.shards_read += 1;
                    stats.audit.parse_errors += scan.parse_errors;
                    stats.audit.unrecognized_lines += scan.unrecognized_lines;
                    if scan.parse_errors > 0 {
                        warn!(
                            "Host {}: {} malformed line(s) skipped in {}",
                            host,
                            scan.parse_errors,
                            shard.display()
                        );
                    }
                    for event in scan.events {
                        timeline.push(event);
                    }
                    connect_times.extend(scan.connect_times);
                }
                Err(e) => {
                    stats.audit.shard_errors += 1;
                    warn!("Host {}: skipping shard: {}", host, e);
                }
            }
        }

        if timeline.baseline().is_none() && !timeline.is_empty() {
            warn!(
                "Host {}: no timestamped success, {} event(s) left unanchored",
                host,
                timeline.len()
            );
        }

        let events = timeline.finish();
        let window = self.config.window.range(events.len());
        stats.audit.unanchored_events = events.iter().filter(|e| !e.anchored).count() as u64;
        stats.audit.excluded_events = (events.len() - window.len()) as u64;

        for timed in &events[window] {
            stats.buckets.record(&timed.event);
            if timed.event.kind == EventKind::LookupSuccess {
                if let Some(closest) = stats.closest_ns_ms {
                    stats.buckets.record_closest_ns(closest);
                }
            }

            let mut tuple = TupleRecord::from_timed(host, timed);
            tuple.local_node = tuple.local_node.or(stats.node_id);
            stats.tuples.push(tuple);
        }

        let window = self.config.window.range(connect_times.len());
        stats.connect_times = connect_times.drain(window).collect();

        log_host_summary(&stats);
        stats
    }

    /// Read one shard completely
    ///
    /// Events are only handed back once the whole shard decoded, so a shard
    /// that turns out to be corrupt contributes nothing.
    fn scan_shard(&self, path: &Path) -> Result<ShardScan, ShardError> {
        let mut reader = open_shard(path)?;
        let mut scan = ShardScan::default();

        while let Some(line) = reader.next_line()? {
            match decode(&line) {
                Ok(Some(Record::Request(event))) => scan.events.push(event),
                Ok(Some(Record::ConnectTime(ms))) => scan.connect_times.push(ms),
                Ok(None) => {
                    if !line.trim().is_empty() {
                        scan.unrecognized_lines += 1;
                    }
                }
                Err(e) => {
                    scan.parse_errors += 1;
                    debug!(
                        "Host {}: {}:{}: {}",
                        self.logs.host,
                        path.display(),
                        reader.line_number(),
                        e
                    );
                }
            }
        }

        debug!(
            "Host {}: {} event(s) from {}",
            self.logs.host,
            scan.events.len(),
            path.display()
        );
        Ok(scan)
    }

    fn apply_node_config(&self, stats: &mut HostStats) {
        let Some(path) = &self.logs.node_config else {
            return;
        };
        match NodeConfig::load(path) {
            Ok(node_config) => {
                stats.node_id = node_config.node_id(&self.logs.host);
                stats.closest_ns_ms = node_config.closest_ns_ms();
            }
            Err(e) => warn!("Host {}: ignoring node config: {}", self.logs.host, e),
        }
    }
}

fn log_host_summary(stats: &HostStats) {
    let AuditCounters {
        shards_read,
        shard_errors,
        parse_errors,
        excluded_events,
        ..
    } = stats.audit;

    info!(
        "Host {}: {} shard(s), {} success(es), {} failure(s), {} parse error(s), {} shard error(s), {} excluded",
        stats.host,
        shards_read,
        stats.buckets.successes(),
        stats.buckets.failures(),
        parse_errors,
        shard_errors,
        excluded_events
    );
}
