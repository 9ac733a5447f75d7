//! TOML configuration file parsing

use super::cli::Cli;
use super::{cli_convert, validator, AnalysisConfig};
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// Parse TOML configuration file
pub fn parse_toml_file(path: &Path) -> Result<AnalysisConfig> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    parse_toml_string(&contents)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Parse TOML configuration from string
pub fn parse_toml_string(contents: &str) -> Result<AnalysisConfig> {
    let config: AnalysisConfig =
        ::toml::from_str(contents).context("Failed to parse TOML configuration")?;

    Ok(config)
}

/// Build the effective configuration for a CLI invocation
///
/// Loads the config file if one was given, applies CLI overrides and
/// validates the result.
pub fn load_config(cli: &Cli) -> Result<AnalysisConfig> {
    let base = match cli.config {
        Some(ref path) => parse_toml_file(path)?,
        None => AnalysisConfig::default(),
    };

    let config = cli_convert::apply_cli(cli, base)?;
    validator::validate_config(&config).context("Configuration validation failed")?;
    Ok(config)
}
