//! Indexer configuration with TOML file support.

use serde::{Deserialize, Serialize};

use shardex_utils::{init_logging, LogFormat};

use crate::IndexerError;

/// Shard id of the metachain, outside the `0..num_of_shards` range.
pub const METACHAIN_SHARD_ID: u32 = u32::MAX;

/// Configuration of a [`crate::BlockIndexer`].
///
/// Can be loaded from a TOML file via [`IndexerConfig::from_toml_file`] or
/// built programmatically (e.g. for tests).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct IndexerConfig {
    /// Shard whose blocks this indexer receives.
    #[serde(default)]
    pub self_shard_id: u32,

    /// Number of regular shards of the chain.
    #[serde(default = "default_num_of_shards")]
    pub num_of_shards: u32,

    /// Decimals used to render `*Num` float fields.
    #[serde(default = "default_denomination")]
    pub denomination: u32,

    /// Byte cap of one bulk request.
    #[serde(default = "default_bulk_request_max_size")]
    pub bulk_request_max_size: usize,

    /// Upper bound of concurrently flushed indices.
    #[serde(default = "default_max_concurrent_flushes")]
    pub max_concurrent_flushes: usize,

    /// Log format: "human" or "json".
    #[serde(default)]
    pub log_format: LogFormat,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_num_of_shards() -> u32 {
    3
}

fn default_denomination() -> u32 {
    18
}

fn default_bulk_request_max_size() -> usize {
    4 * 1024 * 1024
}

fn default_max_concurrent_flushes() -> usize {
    4
}

fn default_log_level() -> String {
    "info".to_string()
}

// ── Impl ───────────────────────────────────────────────────────────────

impl IndexerConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: impl AsRef<std::path::Path>) -> Result<Self, IndexerError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| IndexerError::Config(e.to_string()))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, IndexerError> {
        toml::from_str(s).map_err(|e| IndexerError::Config(e.to_string()))
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml_string(&self) -> Result<String, IndexerError> {
        toml::to_string_pretty(self).map_err(|e| IndexerError::Config(e.to_string()))
    }

    /// Reject values the indexer cannot run with.
    pub fn validate(&self) -> Result<(), IndexerError> {
        if self.num_of_shards == 0 {
            return Err(IndexerError::Config("num_of_shards must be positive".into()));
        }
        if self.self_shard_id >= self.num_of_shards && self.self_shard_id != METACHAIN_SHARD_ID {
            return Err(IndexerError::Config(format!(
                "self_shard_id {} is not one of the {} shards or the metachain",
                self.self_shard_id, self.num_of_shards
            )));
        }
        if self.max_concurrent_flushes == 0 {
            return Err(IndexerError::Config(
                "max_concurrent_flushes must be positive".into(),
            ));
        }
        if self.bulk_request_max_size == 0 {
            return Err(IndexerError::Config(
                "bulk_request_max_size must be positive".into(),
            ));
        }
        Ok(())
    }

    /// Install the global subscriber for the configured format and level.
    pub fn init_logging(&self) -> bool {
        init_logging(self.log_format, &self.log_level)
    }
}

impl Default for IndexerConfig {
    fn default() -> Self {
        Self {
            self_shard_id: 0,
            num_of_shards: default_num_of_shards(),
            denomination: default_denomination(),
            bulk_request_max_size: default_bulk_request_max_size(),
            max_concurrent_flushes: default_max_concurrent_flushes(),
            log_format: LogFormat::Human,
            log_level: default_log_level(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn default_config_round_trips_through_toml() {
        let config = IndexerConfig::default();
        let toml_str = config.to_toml_string().expect("serializable");
        let parsed = IndexerConfig::from_toml_str(&toml_str).expect("should parse");
        assert_eq!(parsed, config);
    }

    #[test]
    fn minimal_toml_uses_defaults() {
        let config = IndexerConfig::from_toml_str("").expect("empty toml should use defaults");
        assert_eq!(config.num_of_shards, 3);
        assert_eq!(config.denomination, 18);
        assert_eq!(config.bulk_request_max_size, 4 * 1024 * 1024);
        assert_eq!(config.log_format, LogFormat::Human);
    }

    #[test]
    fn partial_toml_overrides() {
        let toml = r#"
            self_shard_id = 2
            max_concurrent_flushes = 8
            log_format = "json"
        "#;
        let config = IndexerConfig::from_toml_str(toml).expect("should parse");
        assert_eq!(config.self_shard_id, 2);
        assert_eq!(config.max_concurrent_flushes, 8);
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.log_level, "info"); // default
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(file, "denomination = 6").expect("write");
        let config = IndexerConfig::from_toml_file(file.path()).expect("should load");
        assert_eq!(config.denomination, 6);
    }

    #[test]
    fn missing_file_returns_config_error() {
        let result = IndexerConfig::from_toml_file("/nonexistent/shardex.toml");
        assert!(matches!(result, Err(IndexerError::Config(_))));
    }

    #[test]
    fn zero_values_are_rejected() {
        for config in [
            IndexerConfig { num_of_shards: 0, ..Default::default() },
            IndexerConfig { max_concurrent_flushes: 0, ..Default::default() },
            IndexerConfig { bulk_request_max_size: 0, ..Default::default() },
        ] {
            assert!(matches!(config.validate(), Err(IndexerError::Config(_))));
        }
        assert!(IndexerConfig::default().validate().is_ok());
    }

    #[test]
    fn self_shard_must_exist() {
        let shard = |self_shard_id| IndexerConfig { self_shard_id, ..Default::default() };
        assert!(shard(2).validate().is_ok());
        assert!(shard(METACHAIN_SHARD_ID).validate().is_ok());
        assert!(matches!(shard(3).validate(), Err(IndexerError::Config(_))));
    }
}
