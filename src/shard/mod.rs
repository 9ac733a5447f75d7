//! Log shard discovery
//!
//! A run's log root holds one directory per host named `<prefix>_<host>`.
//! Each host directory (or its `log/` subdirectory for locally-run
//! experiments) holds numbered shards `<log_name>.<index>`, each of which
//! may exist plain or only as `<log_name>.<index>.gz`.
//!
//! Shards are rotated so that a higher index is older; the locator returns
//! them in descending index order, which is chronological order.

pub mod node_config;
pub mod reader;

use crate::config::LayoutConfig;
use crate::Result;
use anyhow::Context;
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

pub use node_config::NodeConfig;
pub use reader::{open_shard, ShardReader};

/// Subdirectory holding shards for locally-run experiments
const LOCAL_LOG_DIR: &str = "log";

/// Error accessing a shard or node config file
#[derive(Debug, Error)]
pub enum ShardError {
    #[error("cannot open {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("read failed in {} after line {line}: {source}", path.display())]
    Read {
        path: PathBuf,
        line: usize,
        #[source]
        source: io::Error,
    },
}

/// One host's log directory and its ordered shard list
#[derive(Debug, Clone, PartialEq)]
pub struct HostLogs {
    /// Host id taken from the directory name
    pub host: String,
    /// The `<prefix>_<host>` directory
    pub dir: PathBuf,
    /// Shards, oldest first
    pub shards: Vec<PathBuf>,
    /// Node config file, if the directory carries one
    pub node_config: Option<PathBuf>,
}

/// Find every host directory under `root` and its shards
///
/// Fails only if `root` itself cannot be listed. A host directory that
/// cannot be listed is reported and yields an empty shard list. Hosts are
/// returned sorted by host id.
pub fn locate_hosts(root: &Path, layout: &LayoutConfig) -> Result<Vec<HostLogs>> {
    let entries = fs::read_dir(root)
        .with_context(|| format!("Failed to read log root: {}", root.display()))?;

    let dir_prefix = format!("{}_", layout.host_prefix);
    let mut hosts = Vec::new();

    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Skipping unreadable entry in {}: {}", root.display(), e);
                continue;
            }
        };

        let path = entry.path();
        if !path.is_dir() {
            continue;
        }

        let file_name = entry.file_name();
        let Some(host) = file_name
            .to_str()
            .and_then(|name| name.strip_prefix(&dir_prefix))
            .filter(|host| !host.is_empty())
        else {
            continue;
        };

        let shard_dir = if layout.local {
            path.join(LOCAL_LOG_DIR)
        } else {
            path.clone()
        };

        let shards = match list_shards(&shard_dir, &layout.log_name) {
            Ok(shards) => shards,
            Err(e) => {
                warn!("Host {}: cannot list {}: {}", host, shard_dir.display(), e);
                Vec::new()
            }
        };
        if shards.is_empty() {
            warn!("Host {}: no log shards found in {}", host, shard_dir.display());
        }

        debug!("Host {}: {} shard(s)", host, shards.len());

        hosts.push(HostLogs {
            host: host.to_string(),
            node_config: find_variant(&path, &layout.node_config),
            dir: path,
            shards,
        });
    }

    hosts.sort_by(|a, b| a.host.cmp(&b.host));
    Ok(hosts)
}

/// List the shards of one log stream in chronological (descending index) order
///
/// When an index exists both plain and compressed the plain file wins.
pub fn list_shards(dir: &Path, log_name: &str) -> io::Result<Vec<PathBuf>> {
    let mut by_index: BTreeMap<u32, PathBuf> = BTreeMap::new();

    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let file_name = entry.file_name();
        let Some(name) = file_name.to_str() else {
            continue;
        };
        let Some((index, compressed)) = shard_index(name, log_name) else {
            continue;
        };

        let path = entry.path();
        if !path.is_file() {
            continue;
        }

        let replace = match by_index.get(&index) {
            None => true,
            Some(existing) => reader::is_compressed(existing) && !compressed,
        };
        if replace {
            by_index.insert(index, path);
        }
    }

    Ok(by_index.into_values().rev().collect())
}

/// Parse `<log_name>.<index>[.gz]` into its index and compression flag
fn shard_index(file_name: &str, log_name: &str) -> Option<(u32, bool)> {
    let rest = file_name.strip_prefix(log_name)?.strip_prefix('.')?;
    let (digits, compressed) = match rest.strip_suffix(".gz") {
        Some(digits) => (digits, true),
        None => (rest, false),
    };
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok().map(|index| (index, compressed))
}

/// Locate `name` or `name.gz` inside `dir`, preferring the plain file
fn find_variant(dir: &Path, name: &str) -> Option<PathBuf> {
    let plain = dir.join(name);
    if plain.is_file() {
        return Some(plain);
    }
    let compressed = dir.join(format!("{}.gz", name));
    compressed.is_file().then_some(compressed)
}
