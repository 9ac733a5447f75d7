//! CLI argument parsing using clap

use clap::Parser;
use std::path::PathBuf;

/// Analyze name-server experiment logs into latency and outcome reports
#[derive(Parser, Debug)]
#[command(name = "analyze")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Root directory holding one `<prefix>_<host>` directory per host
    #[arg(value_name = "LOG_ROOT")]
    pub log_root: PathBuf,

    /// Directory the reports are written to (created if missing)
    #[arg(value_name = "OUTPUT_DIR")]
    pub output_dir: PathBuf,

    /// Shards live in each host directory's `log/` subdirectory
    #[arg(long)]
    pub local: bool,

    /// TOML configuration file (CLI flags take precedence)
    #[arg(short = 'c', long, env = "NSLOGSTAT_CONFIG")]
    pub config: Option<PathBuf>,

    // === Layout Options ===
    /// Host directory prefix (directories are named `<prefix>_<host>`)
    #[arg(long)]
    pub prefix: Option<String>,

    /// Base name of the log shards (`<name>.<index>[.gz]`)
    #[arg(long)]
    pub log_name: Option<String>,

    /// Leave this host out of the analysis (repeatable)
    #[arg(long = "exclude-host", value_name = "HOST")]
    pub exclude_hosts: Vec<String>,

    // === Window Options ===
    /// Fraction of each host's events to skip at the start (0.0-1.0)
    #[arg(long)]
    pub initial_fraction: Option<f64>,

    /// Fraction of each host's events after which to stop (0.0-1.0)
    #[arg(long)]
    pub final_fraction: Option<f64>,

    // === Report Options ===
    /// Width of a latency-over-time bucket (e.g., 500ms, 10s, 1m)
    #[arg(long)]
    pub bucket: Option<String>,

    /// Maximum number of points in a CDF file
    #[arg(long)]
    pub cdf_points: Option<usize>,

    /// Also write report.json
    #[arg(long)]
    pub json: bool,

    // === Runtime Options ===
    /// Worker threads for scanning hosts (0 = one per CPU)
    #[arg(short = 'j', long)]
    pub jobs: Option<usize>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    /// Parse command-line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Log filter for the requested verbosity
    pub fn log_level(&self) -> &'static str {
        match self.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    }
}
