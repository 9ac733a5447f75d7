//! Report output
//!
//! - [`report`]: the tab-delimited report files
//! - [`json`]: optional `report.json`
//! - [`text`]: the console results block
//! - [`summary`]: the run summary the three formats share

pub mod json;
pub mod report;
pub mod summary;
pub mod text;

pub use report::ReportWriter;
pub use summary::RunSummary;

/// Fixed three-decimal rendering used by every report file
pub fn fmt_f64(value: f64) -> String {
    format!("{:.3}", value)
}

/// Three decimals, or `-` when there is no value
pub fn fmt_opt(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), fmt_f64)
}
