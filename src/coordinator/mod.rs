//! Coordinator module
//!
//! Discovers the hosts of a run, scans them in parallel and reduces their
//! results into one [`StatisticsAggregator`].
//!
//! Hosts are independent up to aggregation, so each one is scanned by its
//! own [`HostWorker`] on a rayon pool. The per-host results are collected
//! and then merged on the calling thread in host-id order, which keeps the
//! aggregate (and every report derived from it) identical across runs.

use crate::config::AnalysisConfig;
use crate::shard::{locate_hosts, HostLogs};
use crate::stats::aggregator::{HostStats, StatisticsAggregator};
use crate::worker::HostWorker;
use crate::Result;
use anyhow::Context;
use rayon::prelude::*;
use std::path::Path;
use tracing::info;

/// Runs the analysis of one log tree
pub struct Coordinator {
    config: AnalysisConfig,
}

impl Coordinator {
    pub fn new(config: AnalysisConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Scan every host under `root` and aggregate the results
    ///
    /// Fails if `root` cannot be read or holds no host directories. Hosts
    /// with missing or broken shards still count as hosts.
    pub fn run(&self, root: &Path) -> Result<StatisticsAggregator> {
        let hosts = self.discover(root)?;
        let results = self.scan_hosts(&hosts)?;

        let mut aggregator = StatisticsAggregator::new();
        for stats in results {
            aggregator.add_host(stats);
        }

        info!(
            "Aggregated {} host(s): {} request(s), {} tuple(s)",
            aggregator.host_count(),
            aggregator.all().requests(),
            aggregator.tuples().len()
        );
        Ok(aggregator)
    }

    fn discover(&self, root: &Path) -> Result<Vec<HostLogs>> {
        let layout = &self.config.layout;
        let mut hosts = locate_hosts(root, layout)?;

        hosts.retain(|logs| {
            let excluded = layout.exclude_hosts.contains(&logs.host);
            if excluded {
                info!("Excluding host {}", logs.host);
            }
            !excluded
        });

        if hosts.is_empty() {
            anyhow::bail!(
                "No host directories matching '{}_*' found in {}",
                layout.host_prefix,
                root.display()
            );
        }

        info!("Found {} host(s) in {}", hosts.len(), root.display());
        Ok(hosts)
    }

    /// Scan hosts on a dedicated pool; results come back in input order
    fn scan_hosts(&self, hosts: &[HostLogs]) -> Result<Vec<HostStats>> {
        let jobs = self.config.runtime.effective_jobs().min(hosts.len()).max(1);
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(jobs)
            .thread_name(|i| format!("nslogstat-host-{}", i))
            .build()
            .context("Failed to build host worker pool")?;

        info!("Scanning with {} worker thread(s)", jobs);
        Ok(pool.install(|| {
            hosts
                .par_iter()
                .map(|logs| HostWorker::new(logs, &self.config).run())
                .collect()
        }))
    }
}
