//! Configuration validation

use super::*;
use anyhow::Result;

/// Validate complete configuration
pub fn validate_config(config: &AnalysisConfig) -> Result<()> {
    validate_layout(&config.layout)?;
    validate_window(&config.window)?;
    validate_report(&config.report)?;

    Ok(())
}

/// Validate log tree layout
pub fn validate_layout(layout: &LayoutConfig) -> Result<()> {
    if layout.host_prefix.is_empty() {
        anyhow::bail!("host_prefix must not be empty");
    }
    if layout.log_name.is_empty() {
        anyhow::bail!("log_name must not be empty");
    }
    if layout.log_name.contains('/') {
        anyhow::bail!("log_name must be a file name, got {:?}", layout.log_name);
    }

    Ok(())
}

/// Validate exclusion window
pub fn validate_window(window: &WindowConfig) -> Result<()> {
    for (name, value) in [
        ("initial_fraction", window.initial_fraction),
        ("final_fraction", window.final_fraction),
    ] {
        if !(0.0..=1.0).contains(&value) {
            anyhow::bail!("{} must be between 0.0 and 1.0, got {}", name, value);
        }
    }

    if window.initial_fraction > window.final_fraction {
        anyhow::bail!(
            "initial_fraction ({}) must not exceed final_fraction ({})",
            window.initial_fraction,
            window.final_fraction
        );
    }

    Ok(())
}

/// Validate report options
pub fn validate_report(report: &ReportConfig) -> Result<()> {
    if report.cdf_max_points == 0 {
        anyhow::bail!("cdf_max_points must be at least 1");
    }

    if !(report.time_bucket_ms.is_finite() && report.time_bucket_ms > 0.0) {
        anyhow::bail!("time_bucket_ms must be positive, got {}", report.time_bucket_ms);
    }

    for &p in &report.percentiles {
        if !(0.0..=100.0).contains(&p) {
            anyhow::bail!("percentile {} is outside 0-100", p);
        }
    }
    if report.percentiles.windows(2).any(|w| w[0] >= w[1]) {
        anyhow::bail!("percentiles must be strictly increasing: {:?}", report.percentiles);
    }

    Ok(())
}
