//! Tab-delimited report files
//!
//! Every file is derived from the aggregator alone, never from the raw
//! shards, and every row order is fixed (report kind order, host id, name,
//! time), so writing the same aggregate twice yields identical bytes.
//!
//! | file                            | rows                                              |
//! |---------------------------------|---------------------------------------------------|
//! | `summary.txt`                   | `<label> <value>`                                 |
//! | `<kind>latencies_cdf.txt`       | `<rank> <latency>`; `all` includes group changes  |
//! | `<kind>latencies_hostwise.txt`  | `<host> <node id> <count> <min> <max> <mean> <median> <p...>` |
//! | `all_tuples.txt`                | one flattened request per row                     |
//! | `latency_stats.txt`             | `<group><stat> <value>`                           |
//! | `all_by_name.txt`               | per-name counts and latency                       |
//! | `latency_by_time.txt`           | per-window counts and latency                     |
//! | `ping_latency.txt`              | `<rank> <ping>` over successful lookups           |
//! | `closest_ns_latency.txt`        | `<rank> <latency>`, one sample per lookup         |
//! | `time_to_connect.txt`           | connect-time stats and `fraction-timeouts`, if any |

use crate::config::ReportConfig;
use crate::event::OpKind;
use crate::output::summary::{kind_prefix, RunSummary, REPORT_KINDS};
use crate::output::{fmt_f64, fmt_opt, json};
use crate::stats::aggregator::StatisticsAggregator;
use crate::stats::distribution::{cdf, Summary};
use crate::stats::grouping::{group_by_name, group_by_time};
use crate::Result;
use anyhow::Context;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Connect times above this count as timeouts
const CONNECT_TIMEOUT_MS: f64 = 5000.0;

/// Operation kinds that can fail
const FAILABLE_KINDS: [OpKind; 4] = [OpKind::Lookup, OpKind::Update, OpKind::Add, OpKind::Remove];

/// Renders the report files of one aggregated run
pub struct ReportWriter<'a> {
    aggregator: &'a StatisticsAggregator,
    config: &'a ReportConfig,
    summary: RunSummary,
}

impl<'a> ReportWriter<'a> {
    pub fn new(aggregator: &'a StatisticsAggregator, config: &'a ReportConfig) -> Self {
        Self {
            aggregator,
            config,
            summary: RunSummary::build(aggregator, config),
        }
    }

    pub fn summary(&self) -> &RunSummary {
        &self.summary
    }

    /// Write every report into `dir` and return the paths written
    pub fn write_all(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        let mut written = vec![self.write_file(dir, "summary.txt", |out| self.write_summary(out))?];

        for op in REPORT_KINDS {
            let prefix = kind_prefix(op);
            written.push(self.write_file(dir, &format!("{}latencies_cdf.txt", prefix), |out| {
                self.write_cdf(out, &self.aggregator.latencies(op))
            })?);
            written.push(self.write_file(dir, &format!("{}latencies_hostwise.txt", prefix), |out| {
                self.write_hostwise(out, op)
            })?);
        }

        written.push(self.write_file(dir, "all_tuples.txt", |out| self.write_tuples(out))?);
        written.push(self.write_file(dir, "latency_stats.txt", |out| self.write_latency_stats(out))?);
        written.push(self.write_file(dir, "all_by_name.txt", |out| self.write_by_name(out))?);
        written.push(self.write_file(dir, "latency_by_time.txt", |out| self.write_by_time(out))?);
        written.push(self.write_file(dir, "ping_latency.txt", |out| {
            self.write_cdf(out, self.ping_latencies())
        })?);
        written.push(self.write_file(dir, "closest_ns_latency.txt", |out| {
            self.write_cdf(out, self.aggregator.closest_ns_latencies())
        })?);

        if !self.aggregator.connect_times().is_empty() {
            written.push(self.write_file(dir, "time_to_connect.txt", |out| {
                self.write_connect_times(out)
            })?);
        }

        if self.config.json {
            let path = dir.join("report.json");
            json::write_json_report(&path, &self.summary)?;
            written.push(path);
        }

        info!("Wrote {} report file(s) to {}", written.len(), dir.display());
        Ok(written)
    }

    fn write_file<F>(&self, dir: &Path, name: &str, render: F) -> Result<PathBuf>
    where
        F: FnOnce(&mut BufWriter<File>) -> io::Result<()>,
    {
        let path = dir.join(name);
        let file = File::create(&path)
            .with_context(|| format!("Failed to create report file: {}", path.display()))?;

        let mut out = BufWriter::new(file);
        render(&mut out)
            .and_then(|_| out.flush())
            .with_context(|| format!("Failed to write report file: {}", path.display()))?;

        debug!("Wrote {}", path.display());
        Ok(path)
    }

    fn write_summary(&self, out: &mut impl Write) -> io::Result<()> {
        for (label, value) in self.summary.rows() {
            writeln!(out, "{}\t{}", label, value)?;
        }
        Ok(())
    }

    fn ping_latencies(&self) -> &[f64] {
        self.aggregator
            .all()
            .get(OpKind::Lookup)
            .map(|b| b.ping_latencies())
            .unwrap_or(&[])
    }

    fn write_cdf(&self, out: &mut impl Write, samples: &[f64]) -> io::Result<()> {
        for point in cdf(samples, self.config.cdf_max_points) {
            writeln!(out, "{:.6}\t{}", point.rank, fmt_f64(point.value))?;
        }
        Ok(())
    }

    fn write_hostwise(&self, out: &mut impl Write, op: Option<OpKind>) -> io::Result<()> {
        let percentiles = &self.config.percentiles;

        for host in self.aggregator.hosts() {
            let node = host.node_id.map_or_else(|| "-".to_string(), |id| id.to_string());
            write!(out, "{}\t{}", host.host, node)?;

            let latencies = self.aggregator.host_latencies(host, op);
            match Summary::compute(&latencies, percentiles) {
                Some(s) => {
                    write!(
                        out,
                        "\t{}\t{}\t{}\t{}\t{}",
                        s.count,
                        fmt_f64(s.min),
                        fmt_f64(s.max),
                        fmt_f64(s.mean),
                        fmt_f64(s.median)
                    )?;
                    for (_, value) in &s.percentiles {
                        write!(out, "\t{}", fmt_f64(*value))?;
                    }
                }
                None => {
                    write!(out, "\t0")?;
                    for _ in 0..4 + percentiles.len() {
                        write!(out, "\t-")?;
                    }
                }
            }
            writeln!(out)?;
        }
        Ok(())
    }

    fn write_tuples(&self, out: &mut impl Write) -> io::Result<()> {
        let id = |v: Option<i64>| v.unwrap_or(-1);

        for t in self.aggregator.tuples() {
            writeln!(
                out,
                "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
                t.name,
                id(t.local_node),
                id(t.remote_node),
                t.transmissions,
                t.latency_ms.map_or_else(|| "-1".to_string(), fmt_f64),
                t.kind.short_code(),
                fmt_f64(t.start_ms),
                fmt_f64(t.end_ms),
                t.restarts,
                t.host
            )?;
        }
        Ok(())
    }

    fn write_latency_stats(&self, out: &mut impl Write) -> io::Result<()> {
        let all = self.aggregator.all();

        for op in REPORT_KINDS {
            self.write_stat_block(out, kind_prefix(op), &self.aggregator.latencies(op))?;
        }

        let ping = self.ping_latencies();
        self.write_stat_block(out, "ping", ping)?;
        self.write_stat_block(out, "closest_ns", self.aggregator.closest_ns_latencies())?;

        for op in FAILABLE_KINDS {
            let failed = all.get(op).map(|b| b.failed_latencies()).unwrap_or(&[]);
            self.write_stat_block(out, &format!("failed_{}", op.report_prefix()), failed)?;
        }

        let read = Summary::compute(all.latencies(OpKind::Lookup), &[]);
        let ping = Summary::compute(ping, &[]);
        if let (Some(read), Some(ping)) = (read, ping) {
            writeln!(out, "mean_read_by_ping\t{}", fmt_f64(by_ping(read.mean, ping.mean)))?;
            writeln!(out, "median_read_by_ping\t{}", fmt_f64(by_ping(read.median, ping.median)))?;
        }
        Ok(())
    }

    fn write_stat_block(&self, out: &mut impl Write, key: &str, samples: &[f64]) -> io::Result<()> {
        let Some(s) = Summary::compute(samples, &self.config.percentiles) else {
            return writeln!(out, "{}count\t0", key);
        };

        writeln!(out, "{}count\t{}", key, s.count)?;
        writeln!(out, "{}min\t{}", key, fmt_f64(s.min))?;
        writeln!(out, "{}max\t{}", key, fmt_f64(s.max))?;
        writeln!(out, "{}mean\t{}", key, fmt_f64(s.mean))?;
        writeln!(out, "{}median\t{}", key, fmt_f64(s.median))?;
        for (p, value) in &s.percentiles {
            writeln!(out, "{}p{}\t{}", key, p, fmt_f64(*value))?;
        }
        Ok(())
    }

    fn write_connect_times(&self, out: &mut impl Write) -> io::Result<()> {
        let times = self.aggregator.connect_times();
        self.write_stat_block(out, "time_to_connect", times)?;
        writeln!(out, "fraction-timeouts\t{}", fmt_f64(timeout_fraction(times)))
    }

    fn write_by_name(&self, out: &mut impl Write) -> io::Result<()> {
        for g in group_by_name(self.aggregator.tuples()) {
            writeln!(
                out,
                "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
                g.name,
                g.requests,
                g.successes,
                g.failures,
                g.reads,
                g.writes,
                fmt_opt(g.median_ms),
                fmt_opt(g.mean_ms)
            )?;
        }
        Ok(())
    }

    fn write_by_time(&self, out: &mut impl Write) -> io::Result<()> {
        for b in group_by_time(self.aggregator.tuples(), self.config.time_bucket_ms) {
            writeln!(
                out,
                "{}\t{}\t{}\t{}\t{}\t{}",
                fmt_f64(b.start_ms),
                b.requests,
                b.failures,
                fmt_opt(b.latency.mean_ms()),
                fmt_opt(b.latency.percentile_ms(50.0)),
                fmt_opt(b.latency.percentile_ms(95.0))
            )?;
        }
        Ok(())
    }
}

/// Share of connect times above [`CONNECT_TIMEOUT_MS`]
fn timeout_fraction(times: &[f64]) -> f64 {
    if times.is_empty() {
        return 0.0;
    }
    let timeouts = times.iter().filter(|&&t| t > CONNECT_TIMEOUT_MS).count();
    timeouts as f64 / times.len() as f64
}

/// Latency relative to ping; 1 when the ping statistic is zero
fn by_ping(latency: f64, ping: f64) -> f64 {
    if ping == 0.0 {
        1.0
    } else {
        latency / ping
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AnalysisConfig;
    use crate::coordinator::Coordinator;
    use crate::event::parser::tests::{lookup_line, update_line};
    use std::fs;
    use tempfile::TempDir;

    fn write_host(root: &Path, host: &str, lines: &[String]) {
        let dir = root.join(format!("log_lns_{}", host));
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("gns_stat.xml.0"), lines.join("\n") + "\n").unwrap();
    }

    fn analyze(root: &Path) -> StatisticsAggregator {
        Coordinator::new(AnalysisConfig::default()).run(root).unwrap()
    }

    fn read(dir: &Path, name: &str) -> String {
        fs::read_to_string(dir.join(name)).unwrap()
    }

    #[test]
    fn test_single_lookup_reports() {
        let logs = TempDir::new().unwrap();
        write_host(
            logs.path(),
            "a",
            &[
                lookup_line("name1", 12.0, 1, 1000),
                "<message>Failed-LookupNoResponseReceived\t1\tk\tname1\t2\t-1\tstatus\t[1]</message>"
                    .to_string(),
            ],
        );
        let aggregator = analyze(logs.path());

        let out = TempDir::new().unwrap();
        let config = ReportConfig::default();
        ReportWriter::new(&aggregator, &config).write_all(out.path()).unwrap();

        let summary = read(out.path(), "summary.txt");
        for row in ["Hosts\t1", "All\t2", "Success\t1", "Failed\t1", "Read\t1", "Read-Failed\t1"] {
            assert!(summary.lines().any(|l| l == row), "missing {row:?} in\n{summary}");
        }

        assert_eq!(read(out.path(), "readlatencies_cdf.txt"), "1.000000\t12.000\n");
        assert_eq!(read(out.path(), "writelatencies_cdf.txt"), "");
        assert_eq!(
            read(out.path(), "readlatencies_hostwise.txt"),
            "a\t-\t1\t12.000\t12.000\t12.000\t12.000\t12.000\t12.000\t12.000\t12.000\n"
        );
        assert_eq!(read(out.path(), "writelatencies_hostwise.txt"), "a\t-\t0\t-\t-\t-\t-\t-\t-\t-\t-\n");

        let tuples = read(out.path(), "all_tuples.txt");
        let rows: Vec<&str> = tuples.lines().collect();
        assert_eq!(rows[0], "name1\t4\t9\t1\t12.000\tr\t0.000\t12.000\t0\ta");
        assert_eq!(rows[1], "name1\t-1\t-1\t0\t-1\trf\t0.000\t0.000\t0\ta");

        let stats = read(out.path(), "latency_stats.txt");
        assert!(stats.lines().any(|l| l == "readmedian\t12.000"));
        assert!(stats.lines().any(|l| l == "readp95\t12.000"));
        assert!(stats.lines().any(|l| l == "writecount\t0"));
        assert!(stats.lines().any(|l| l == "pingmean\t3.500"));
        assert!(stats.lines().any(|l| l == "failed_readcount\t0"));

        assert_eq!(read(out.path(), "all_by_name.txt"), "name1\t2\t1\t1\t2\t0\t12.000\t12.000\n");
        assert_eq!(read(out.path(), "ping_latency.txt"), "1.000000\t3.500\n");
        assert_eq!(read(out.path(), "closest_ns_latency.txt"), "");
        assert!(!out.path().join("time_to_connect.txt").exists());
        assert!(!out.path().join("report.json").exists());
    }

    #[test]
    fn test_reports_are_idempotent() {
        let logs = TempDir::new().unwrap();
        for (host, base) in [("a", 0.0), ("b", 0.5)] {
            let lines: Vec<String> = (0..15_000u32)
                .map(|i| lookup_line("n", base + f64::from(i % 97), 1 + i % 3, u64::from(i) * 10))
                .chain((0..50u64).map(|i| update_line("Success-Add", "m", 3.0, i)))
                .collect();
            write_host(logs.path(), host, &lines);
        }
        let aggregator = analyze(logs.path());
        let mut config = ReportConfig::default();
        config.json = true;
        let writer = ReportWriter::new(&aggregator, &config);

        let first = TempDir::new().unwrap();
        let second = TempDir::new().unwrap();
        let files = writer.write_all(first.path()).unwrap();
        writer.write_all(second.path()).unwrap();

        assert_eq!(files.len(), 20);
        for path in &files {
            let name = path.file_name().unwrap();
            assert_eq!(
                fs::read(path).unwrap(),
                fs::read(second.path().join(name)).unwrap(),
                "{:?} differs",
                name
            );
        }

        let cdf = read(first.path(), "alllatencies_cdf.txt");
        assert_eq!(cdf.lines().count(), config.cdf_max_points);
        assert!(cdf.lines().last().unwrap().starts_with("1.000000\t"));
    }

    #[test]
    fn test_time_series() {
        let logs = TempDir::new().unwrap();
        write_host(
            logs.path(),
            "a",
            &[
                lookup_line("x", 10.0, 1, 0),
                lookup_line("x", 20.0, 1, 5_000),
                lookup_line("x", 40.0, 1, 25_000),
            ],
        );
        let aggregator = analyze(logs.path());

        let out = TempDir::new().unwrap();
        let config = ReportConfig::default();
        ReportWriter::new(&aggregator, &config).write_all(out.path()).unwrap();

        let series = read(out.path(), "latency_by_time.txt");
        let rows: Vec<&str> = series.lines().collect();
        assert_eq!(rows.len(), 2);
        assert!(rows[0].starts_with("0.000\t2\t0\t15.000\t"));
        assert!(rows[1].starts_with("20000.000\t1\t0\t40.000\t"));
    }

    #[test]
    fn test_closest_ns_weighted_by_reads() {
        let logs = TempDir::new().unwrap();
        for (host, closest, reads) in [("a", 10, 9u64), ("b", 100, 1)] {
            let lines: Vec<String> = (0..reads)
                .map(|i| lookup_line("n", 5.0, 1, 1000 + i))
                .chain(std::iter::once(
                    "<message>Failed-LookupNoResponseReceived\t1\tk\tn\t2\t-1\tstatus\t[1]</message>".to_string(),
                ))
                .collect();
            write_host(logs.path(), host, &lines);
            fs::write(
                logs.path().join(format!("log_lns_{}/pl_config", host)),
                format!("0 yes ns0 1 {closest}\n{closest} no {host}\n"),
            )
            .unwrap();
        }
        let aggregator = analyze(logs.path());

        let out = TempDir::new().unwrap();
        let config = ReportConfig::default();
        ReportWriter::new(&aggregator, &config).write_all(out.path()).unwrap();

        let stats = read(out.path(), "latency_stats.txt");
        assert!(stats.lines().any(|l| l == "closest_nscount\t10"), "{stats}");
        assert!(stats.lines().any(|l| l == "closest_nsmean\t19.000"), "{stats}");

        let closest = read(out.path(), "closest_ns_latency.txt");
        assert_eq!(closest.lines().count(), 10);
        assert_eq!(closest.lines().last(), Some("1.000000\t100.000"));
        assert_eq!(read(out.path(), "ping_latency.txt").lines().count(), 10);

        let tuples = read(out.path(), "all_tuples.txt");
        let failed: Vec<&str> = tuples.lines().filter(|l| l.contains("\trf\t")).collect();
        assert_eq!(failed.len(), 2);
        assert!(failed[0].starts_with("n\t10\t-1\t"), "{}", failed[0]);
        assert!(failed[1].starts_with("n\t100\t-1\t"), "{}", failed[1]);
    }

    #[test]
    fn test_time_to_connect() {
        let logs = TempDir::new().unwrap();
        write_host(
            logs.path(),
            "a",
            &[
                "10:00:00 Success-ConnectTime 100 ns3".to_string(),
                lookup_line("x", 10.0, 1, 0),
                "10:00:01 Failed-ConnectTime 6000 ns4".to_string(),
                "10:00:02 Success-ConnectTime 200 ns3".to_string(),
                "10:00:03 Success-ConnectTime 300 ns3".to_string(),
            ],
        );
        let aggregator = analyze(logs.path());
        assert_eq!(aggregator.audit().unrecognized_lines, 0);

        let out = TempDir::new().unwrap();
        let config = ReportConfig::default();
        let files = ReportWriter::new(&aggregator, &config).write_all(out.path()).unwrap();
        assert_eq!(files.len(), 20);

        let connect = read(out.path(), "time_to_connect.txt");
        for row in [
            "time_to_connectcount\t4",
            "time_to_connectmin\t100.000",
            "time_to_connectmax\t6000.000",
            "time_to_connectmedian\t250.000",
            "fraction-timeouts\t0.250",
        ] {
            assert!(connect.lines().any(|l| l == row), "missing {row:?} in\n{connect}");
        }
        assert_eq!(connect.lines().last(), Some("fraction-timeouts\t0.250"));
    }

    #[test]
    fn test_timeout_fraction() {
        assert_eq!(timeout_fraction(&[]), 0.0);
        assert_eq!(timeout_fraction(&[5000.0, 5000.1]), 0.5);
    }

    #[test]
    fn test_unwritable_output_is_an_error() {
        let aggregator = StatisticsAggregator::new();
        let config = ReportConfig::default();
        let temp = TempDir::new().unwrap();
        let missing = temp.path().join("does/not/exist");
        assert!(ReportWriter::new(&aggregator, &config).write_all(&missing).is_err());
    }

    #[test]
    fn test_by_ping() {
        assert_eq!(by_ping(10.0, 0.0), 1.0);
        assert_eq!(by_ping(10.0, 4.0), 2.5);
    }
}
