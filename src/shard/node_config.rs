//! Per-host node config (`pl_config`)
//!
//! Whitespace-separated rows of the form
//! `<node id> <yes|no> <hostname> <...> [<ping latency ms>]`.
//! `no` rows are local name servers and map a hostname to its node id;
//! `yes` rows are name servers and carry the measured ping latency from this
//! host to that server in column 4 (`-1` when unknown).

use super::{open_shard, ShardError};
use std::collections::HashMap;
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeConfig {
    local_ids: HashMap<String, i64>,
    closest_ns_ms: Option<f64>,
}

impl NodeConfig {
    /// Load a node config file, plain or gzip-compressed
    pub fn load(path: &Path) -> Result<Self, ShardError> {
        let lines = open_shard(path)?.read_all()?;
        Ok(Self::parse(lines.iter().map(String::as_str)))
    }

    /// Parse config rows; malformed rows are ignored
    pub fn parse<'a>(lines: impl IntoIterator<Item = &'a str>) -> Self {
        let mut config = Self::default();

        for line in lines {
            let tokens: Vec<&str> = line.split_whitespace().collect();
            if tokens.len() < 3 {
                continue;
            }

            match tokens[1] {
                "no" => {
                    if let Ok(id) = tokens[0].parse() {
                        config.local_ids.insert(tokens[2].to_string(), id);
                    }
                }
                "yes" => {
                    let latency = tokens.get(4).and_then(|v| v.parse::<f64>().ok());
                    if let Some(latency) = latency.filter(|l| *l != -1.0 && l.is_finite()) {
                        config.closest_ns_ms = Some(match config.closest_ns_ms {
                            Some(best) => best.min(latency),
                            None => latency,
                        });
                    }
                }
                _ => {}
            }
        }

        config
    }

    /// Experiment node id of a local name server hostname
    pub fn node_id(&self, host: &str) -> Option<i64> {
        self.local_ids.get(host).copied()
    }

    /// Lowest ping latency to any name server
    pub fn closest_ns_ms(&self) -> Option<f64> {
        self.closest_ns_ms
    }
}
