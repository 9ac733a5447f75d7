//! nslogstat CLI entry point

use anyhow::{Context, Result};
use nslogstat::config::cli::Cli;
use nslogstat::config::toml::load_config;
use nslogstat::output::{text, ReportWriter};
use nslogstat::Coordinator;
use std::fs;
use std::time::Instant;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let start = Instant::now();
    let cli = Cli::parse_args();
    init_logging(&cli);

    let config = load_config(&cli).context("Failed to load configuration")?;
    debug!("Effective configuration: {:?}", config);

    fs::create_dir_all(&cli.output_dir).with_context(|| {
        format!("Failed to create output directory: {}", cli.output_dir.display())
    })?;

    let coordinator = Coordinator::new(config);
    let aggregator = coordinator
        .run(&cli.log_root)
        .with_context(|| format!("Failed to analyze {}", cli.log_root.display()))?;

    let writer = ReportWriter::new(&aggregator, &coordinator.config().report);
    writer.write_all(&cli.output_dir)?;

    info!("Reports written to {}", cli.output_dir.display());
    text::print_results(writer.summary(), start.elapsed());
    Ok(())
}

/// Log to stderr; `RUST_LOG` overrides the `-v` level
fn init_logging(cli: &Cli) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.log_level()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(cli.verbose >= 2)
        .with_thread_ids(cli.verbose >= 2)
        .init();

    debug!("analyze started with verbosity level: {}", cli.verbose);
}
