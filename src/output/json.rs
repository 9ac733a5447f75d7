//! JSON output formatting
//!
//! `report.json` carries the run summary in machine-readable form: counts,
//! derived rates, audit counters and per-kind latency statistics.

use crate::output::summary::RunSummary;
use crate::Result;
use anyhow::Context;
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Top-level `report.json` document
#[derive(Debug, Serialize)]
pub struct JsonReport<'a> {
    pub tool: &'static str,
    pub version: &'static str,
    pub summary: &'a RunSummary,
}

impl<'a> JsonReport<'a> {
    pub fn new(summary: &'a RunSummary) -> Self {
        Self {
            tool: env!("CARGO_PKG_NAME"),
            version: env!("CARGO_PKG_VERSION"),
            summary,
        }
    }
}

/// Write `report.json`
pub fn write_json_report(output_path: &Path, summary: &RunSummary) -> Result<()> {
    let file = File::create(output_path)
        .with_context(|| format!("Failed to create JSON report: {}", output_path.display()))?;

    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, &JsonReport::new(summary))
        .with_context(|| format!("Failed to serialize JSON report: {}", output_path.display()))?;
    writeln!(writer)?;
    writer
        .flush()
        .with_context(|| format!("Failed to write JSON report: {}", output_path.display()))?;

    Ok(())
}
