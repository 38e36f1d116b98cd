//! Configuration for the token ledger

use crate::types::AccountId;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default per-byte storage cost in native payment units
pub const DEFAULT_STORAGE_BYTE_COST: u64 = 10_000_000_000_000_000_000;

/// Ledger configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Data directory for RocksDB
    pub data_dir: PathBuf,

    /// Logical account the ledger runs inside
    pub account_id: AccountId,

    /// Cost of one byte of durable storage, in native payment units;
    /// drives the registration bound
    pub storage_byte_cost: u64,

    /// RocksDB tuning
    pub rocksdb: RocksDbConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data/token-ledger"),
            account_id: AccountId::new("tokenrail"),
            storage_byte_cost: DEFAULT_STORAGE_BYTE_COST,
            rocksdb: RocksDbConfig::default(),
        }
    }
}

/// RocksDB configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RocksDbConfig {
    /// Write buffer size (MB)
    pub write_buffer_size_mb: usize,

    /// Max write buffers
    pub max_write_buffer_number: i32,

    /// Max background jobs (compaction + flush)
    pub max_background_jobs: i32,

    /// Enable statistics
    pub enable_statistics: bool,
}

impl Default for RocksDbConfig {
    fn default() -> Self {
        Self {
            write_buffer_size_mb: 64,
            max_write_buffer_number: 2,
            max_background_jobs: 2,
            enable_statistics: false,
        }
    }
}

impl Config {
    /// Load from file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| crate::Error::Config(format!("Failed to parse config: {}", e)))?;
        Ok(config)
    }

    /// Load from environment variables
    pub fn from_env() -> crate::Result<Self> {
        let mut config = Config::default();

        if let Ok(data_dir) = std::env::var("TOKEN_LEDGER_DATA_DIR") {
            config.data_dir = PathBuf::from(data_dir);
        }

        if let Ok(account_id) = std::env::var("TOKEN_LEDGER_ACCOUNT_ID") {
            config.account_id = AccountId::new(account_id);
        }

        if let Ok(cost) = std::env::var("TOKEN_LEDGER_STORAGE_BYTE_COST") {
            config.storage_byte_cost = cost
                .parse()
                .map_err(|e| crate::Error::Config(format!("Invalid storage byte cost: {}", e)))?;
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.account_id.as_str(), "tokenrail");
        assert_eq!(config.storage_byte_cost, DEFAULT_STORAGE_BYTE_COST);
        assert!(!config.rocksdb.enable_statistics);
    }

    #[test]
    fn test_config_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
data_dir = "/var/lib/token-ledger"
account_id = "token.rail"
storage_byte_cost = 100

[rocksdb]
write_buffer_size_mb = 128
max_write_buffer_number = 4
max_background_jobs = 4
enable_statistics = true
"#,
        )
        .unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.account_id.as_str(), "token.rail");
        assert_eq!(config.storage_byte_cost, 100);
        assert_eq!(config.rocksdb.write_buffer_size_mb, 128);
    }

    #[test]
    fn test_config_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "not valid toml [[[").unwrap();
        assert!(Config::from_file(&path).is_err());
    }
}
