//! CLI to Config conversion utilities

use crate::config::cli::Cli;
use crate::config::AnalysisConfig;
use anyhow::{Context, Result};

/// Parse an interval string (e.g., "500ms", "10s", "2m", "1h") to milliseconds
///
/// A bare number is taken as milliseconds.
pub fn parse_interval_ms(s: &str) -> Result<f64> {
    let s = s.trim().to_lowercase();

    let (num_str, multiplier) = if let Some(n) = s.strip_suffix("ms") {
        (n, 1.0)
    } else if let Some(n) = s.strip_suffix("min") {
        (n, 60_000.0)
    } else if let Some(n) = s.strip_suffix('s') {
        (n, 1000.0)
    } else if let Some(n) = s.strip_suffix('m') {
        (n, 60_000.0)
    } else if let Some(n) = s.strip_suffix('h') {
        (n, 3_600_000.0)
    } else {
        (s.as_str(), 1.0)
    };

    let num: f64 = num_str
        .trim()
        .parse()
        .with_context(|| format!("Invalid interval format: {}", s))?;

    Ok(num * multiplier)
}

/// Apply CLI overrides on top of a configuration (CLI takes precedence)
pub fn apply_cli(cli: &Cli, mut config: AnalysisConfig) -> Result<AnalysisConfig> {
    if cli.local {
        config.layout.local = true;
    }
    if let Some(ref prefix) = cli.prefix {
        config.layout.host_prefix = prefix.clone();
    }
    if let Some(ref log_name) = cli.log_name {
        config.layout.log_name = log_name.clone();
    }
    for host in &cli.exclude_hosts {
        if !config.layout.exclude_hosts.contains(host) {
            config.layout.exclude_hosts.push(host.clone());
        }
    }

    if let Some(fraction) = cli.initial_fraction {
        config.window.initial_fraction = fraction;
    }
    if let Some(fraction) = cli.final_fraction {
        config.window.final_fraction = fraction;
    }

    if let Some(ref bucket) = cli.bucket {
        config.report.time_bucket_ms = parse_interval_ms(bucket).context("Invalid bucket width")?;
    }
    if let Some(points) = cli.cdf_points {
        config.report.cdf_max_points = points;
    }
    if cli.json {
        config.report.json = true;
    }

    if let Some(jobs) = cli.jobs {
        config.runtime.jobs = jobs;
    }

    Ok(config)
}
