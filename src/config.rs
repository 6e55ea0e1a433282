use std::fmt::Display;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// On-disk format marker, carried for forward compatibility even though the
/// current layout is declared bit-exact (spec.md §6.2, Non-goals: no schema
/// migration is implemented yet).
#[derive(Debug, Clone, Copy, Serialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageVersion {
    #[default]
    V1,
}

impl<'de> Deserialize<'de> for StorageVersion {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let repr: Option<String> = Deserialize::deserialize(deserializer)?;
        match repr.as_deref() {
            None | Some("v1") => Ok(StorageVersion::V1),
            Some(other) => Err(<D::Error as serde::de::Error>::custom(format!(
                "unsupported storage version {other:?}"
            ))),
        }
    }
}

impl Display for StorageVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", match self { Self::V1 => "v1" })
    }
}

/// Tuning for the queue-facing half of the node: how often UT/PT
/// subscribers are flushed, independent of block cadence (spec.md §4.9).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueConfig {
    #[serde(default = "QueueConfig::default_flush_interval_ms")]
    pub flush_interval_ms: u64,
}

impl QueueConfig {
    fn default_flush_interval_ms() -> u64 {
        1_000
    }
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            flush_interval_ms: Self::default_flush_interval_ms(),
        }
    }
}

/// Tuning for the broker's per-queue poll loop (spec.md §5, "scheduler runs
/// one consumer callback at a time per queue").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrokerConfig {
    #[serde(default = "BrokerConfig::default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

impl BrokerConfig {
    fn default_poll_interval_ms() -> u64 {
        200
    }
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: Self::default_poll_interval_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default)]
    pub verbose: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { verbose: false }
    }
}

/// The node's full configuration, loaded via the `config` crate from a
/// layered TOML source (see `load` / `src/bin` callers), matching the
/// teacher's `StorageConfig`/`SyncConfig` shape in `crates/core/src/config.rs`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeConfig {
    pub data_directory: PathBuf,

    #[serde(default)]
    pub storage_version: StorageVersion,

    #[serde(default)]
    pub queue: QueueConfig,

    #[serde(default)]
    pub broker: BrokerConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            data_directory: PathBuf::from("./data"),
            storage_version: StorageVersion::default(),
            queue: QueueConfig::default(),
            broker: BrokerConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl NodeConfig {
    /// Loads configuration from an optional TOML file layered under
    /// environment variables prefixed `CATAPULT_`, mirroring the
    /// `config::Config::builder()` / `add_source` idiom used by the teacher
    /// (`src/tests/submit/mod.rs`).
    pub fn load(path: Option<&std::path::Path>) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder();

        if let Some(path) = path {
            builder = builder.add_source(
                config::File::from(path).required(false),
            );
        }

        builder = builder.add_source(config::Environment::with_prefix("CATAPULT").separator("__"));

        builder.build()?.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let config = NodeConfig::default();
        assert_eq!(config.storage_version, StorageVersion::V1);
        assert_eq!(config.queue.flush_interval_ms, 1_000);
        assert_eq!(config.broker.poll_interval_ms, 200);
    }

    #[test]
    fn loads_with_no_file_and_no_env() {
        let config = NodeConfig::load(None).unwrap();
        assert_eq!(config.data_directory, PathBuf::from("./data"));
    }
}
