//! nslogstat - Post-hoc analysis of name-server experiment logs
//!
//! An experiment run leaves one log directory per host, each holding a
//! sequence of numbered, optionally gzip-compressed stat-log shards. nslogstat
//! turns those shards into success/failure counts, latency distributions,
//! per-host and per-name breakdowns and a latency-over-time series.
//!
//! # Architecture
//!
//! - **Shard discovery and decompression**: [`shard`]
//! - **Event decoding**: [`event`], one decoder per record marker
//! - **Per-host scanning and timestamp normalization**: [`worker`]
//! - **Parallel scan and single-writer merge**: [`coordinator`]
//! - **Aggregates, order statistics, CDFs, fairness**: [`stats`]
//! - **Report files, console and JSON output**: [`output`]

pub mod config;
pub mod coordinator;
pub mod event;
pub mod output;
pub mod shard;
pub mod stats;
pub mod worker;

// Re-export commonly used types
pub use config::AnalysisConfig;
pub use coordinator::Coordinator;

/// Result type used throughout nslogstat
pub type Result<T> = anyhow::Result<T>;
