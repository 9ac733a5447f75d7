//! Configuration module
//!
//! Handles CLI argument parsing, TOML configuration files, and validation.
//! Precedence is CLI flags over the TOML file over built-in defaults.

pub mod cli;
pub mod cli_convert;
pub mod toml;
pub mod validator;

use crate::stats::distribution::{DEFAULT_CDF_POINTS, DEFAULT_PERCENTILES};
use serde::{Deserialize, Serialize};

/// Complete analysis configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    #[serde(default)]
    pub layout: LayoutConfig,
    #[serde(default)]
    pub window: WindowConfig,
    #[serde(default)]
    pub report: ReportConfig,
    #[serde(default)]
    pub runtime: RuntimeConfig,
}

/// On-disk layout of a run's log tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Host directories are named `<host_prefix>_<host id>`
    pub host_prefix: String,
    /// Shards are named `<log_name>.<index>[.gz]`
    pub log_name: String,
    /// Shards live in a `log/` subdirectory of each host directory
    pub local: bool,
    /// Optional per-host node config file
    pub node_config: String,
    /// Host ids to leave out of the analysis
    pub exclude_hosts: Vec<String>,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            host_prefix: "log_lns".to_string(),
            log_name: "gns_stat.xml".to_string(),
            local: false,
            node_config: "pl_config".to_string(),
            exclude_hosts: Vec::new(),
        }
    }
}

/// Per-host ramp-up / ramp-down exclusion
///
/// Each host keeps the events from `initial_fraction` up to
/// `final_fraction` of its own chronological sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub initial_fraction: f64,
    pub final_fraction: f64,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            initial_fraction: 0.0,
            final_fraction: 1.0,
        }
    }
}

impl WindowConfig {
    /// Index range kept out of a sequence of `len` events
    pub fn range(&self, len: usize) -> std::ops::Range<usize> {
        let start = ((self.initial_fraction * len as f64).floor() as usize).min(len);
        let end = ((self.final_fraction * len as f64).floor() as usize).clamp(start, len);
        start..end
    }
}

/// Report rendering options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Maximum points written to a CDF file
    pub cdf_max_points: usize,
    /// Percentiles reported next to min/max/mean/median
    pub percentiles: Vec<f64>,
    /// Width of a latency-over-time bucket in milliseconds
    pub time_bucket_ms: f64,
    /// Also write `report.json`
    pub json: bool,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            cdf_max_points: DEFAULT_CDF_POINTS,
            percentiles: DEFAULT_PERCENTILES.to_vec(),
            time_bucket_ms: 10_000.0,
            json: false,
        }
    }
}

/// Runtime options
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Worker threads for host scanning (0 = one per CPU)
    pub jobs: usize,
}

impl RuntimeConfig {
    pub fn effective_jobs(&self) -> usize {
        if self.jobs == 0 {
            num_cpus::get().max(1)
        } else {
            self.jobs
        }
    }
}
