//! Balance store backed by RocksDB
//!
//! # Column Families
//!
//! - `balances` - account id → balance (key: account id bytes)
//! - `meta` - contract root record under a fixed key
//!
//! The store is exclusively owned and mutated by the ledger core. Writes
//! that must land together go through [`Storage::apply`], which commits a
//! single `WriteBatch`.

use crate::{
    config::Config,
    error::{Error, Result},
    types::{AccountId, Balance, ContractRoot},
};
use rocksdb::{BoundColumnFamily, ColumnFamilyDescriptor, IteratorMode, Options, WriteBatch, DB};
use std::sync::Arc;

/// Column family names
const CF_BALANCES: &str = "balances";
const CF_META: &str = "meta";

/// Key of the single root record in the `meta` column family
const ROOT_KEY: &[u8] = b"root";

/// Storage wrapper for RocksDB
pub struct Storage {
    db: DB,
}

impl Storage {
    /// Open or create the database
    pub fn open(config: &Config) -> Result<Self> {
        let path = &config.data_dir;

        // Create directory if not exists
        std::fs::create_dir_all(path)?;

        // Database options
        let mut db_opts = Options::default();
        db_opts.create_if_missing(true);
        db_opts.create_missing_column_families(true);

        // Tuning from config
        db_opts.set_write_buffer_size(config.rocksdb.write_buffer_size_mb * 1024 * 1024);
        db_opts.set_max_write_buffer_number(config.rocksdb.max_write_buffer_number);
        db_opts.set_max_background_jobs(config.rocksdb.max_background_jobs);

        if config.rocksdb.enable_statistics {
            db_opts.enable_statistics();
        }

        let cf_descriptors = vec![
            ColumnFamilyDescriptor::new(CF_BALANCES, Self::cf_options_balances()),
            ColumnFamilyDescriptor::new(CF_META, Options::default()),
        ];

        let db = DB::open_cf_descriptors(&db_opts, path, cf_descriptors)?;

        tracing::info!(path = %path.display(), "Opened RocksDB balance store");

        Ok(Self { db })
    }

    fn cf_options_balances() -> Options {
        let mut opts = Options::default();
        // Balances are point-looked-up on every operation
        opts.set_compression_type(rocksdb::DBCompressionType::Lz4);
        let mut block_opts = rocksdb::BlockBasedOptions::default();
        block_opts.set_bloom_filter(10.0, false);
        opts.set_block_based_table_factory(&block_opts);
        opts
    }

    // Helper: get column family handle

    fn cf(&self, name: &str) -> Result<Arc<BoundColumnFamily<'_>>> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| Error::Storage(format!("Column family {} not found", name)))
    }

    // Balance operations

    /// Whether the account has a balance entry (registered)
    pub fn contains_account(&self, account_id: &AccountId) -> Result<bool> {
        let cf = self.cf(CF_BALANCES)?;
        Ok(self.db.get_cf(&cf, account_id.as_bytes())?.is_some())
    }

    /// Stored balance, or `None` for an unregistered account
    pub fn get_balance(&self, account_id: &AccountId) -> Result<Option<Balance>> {
        let cf = self.cf(CF_BALANCES)?;
        match self.db.get_cf(&cf, account_id.as_bytes())? {
            Some(value) => Ok(Some(bincode::deserialize(&value)?)),
            None => Ok(None),
        }
    }

    /// Set balance (total overwrite)
    pub fn set_balance(&self, account_id: &AccountId, balance: Balance) -> Result<()> {
        let cf = self.cf(CF_BALANCES)?;
        self.db
            .put_cf(&cf, account_id.as_bytes(), bincode::serialize(&balance)?)?;
        Ok(())
    }

    /// Commit balance updates, and optionally the root record, atomically
    pub fn apply(
        &self,
        balances: &[(AccountId, Balance)],
        root: Option<&ContractRoot>,
    ) -> Result<()> {
        let mut batch = WriteBatch::default();

        let cf_balances = self.cf(CF_BALANCES)?;
        for (account_id, balance) in balances {
            batch.put_cf(&cf_balances, account_id.as_bytes(), bincode::serialize(balance)?);
        }

        if let Some(root) = root {
            let cf_meta = self.cf(CF_META)?;
            batch.put_cf(&cf_meta, ROOT_KEY, bincode::serialize(root)?);
        }

        self.db.write(batch)?;
        Ok(())
    }

    // Root record operations

    /// Load the root record, if the contract has been initialized
    pub fn get_root(&self) -> Result<Option<ContractRoot>> {
        let cf = self.cf(CF_META)?;
        match self.db.get_cf(&cf, ROOT_KEY)? {
            Some(value) => Ok(Some(bincode::deserialize(&value)?)),
            None => Ok(None),
        }
    }

    /// Persist the root record
    pub fn put_root(&self, root: &ContractRoot) -> Result<()> {
        let cf = self.cf(CF_META)?;
        self.db.put_cf(&cf, ROOT_KEY, bincode::serialize(root)?)?;
        Ok(())
    }

    // Invariant helpers

    /// Sum of all stored balances (full scan)
    pub fn sum_balances(&self) -> Result<u128> {
        let cf = self.cf(CF_BALANCES)?;
        let mut sum: u128 = 0;

        for item in self.db.iterator_cf(&cf, IteratorMode::Start) {
            let (_, value) = item?;
            let balance: Balance = bincode::deserialize(&value)?;
            sum = sum
                .checked_add(balance)
                .ok_or_else(|| Error::Storage("Balance sum overflow".to_string()))?;
        }

        Ok(sum)
    }

    /// Number of registered accounts (full scan)
    pub fn account_count(&self) -> Result<u64> {
        let cf = self.cf(CF_BALANCES)?;
        let mut count = 0u64;
        for item in self.db.iterator_cf(&cf, IteratorMode::Start) {
            item?;
            count += 1;
        }
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Metadata;
    use tempfile::TempDir;

    fn test_storage() -> (Storage, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let mut config = Config::default();
        config.data_dir = temp_dir.path().to_path_buf();
        (Storage::open(&config).unwrap(), temp_dir)
    }

    #[test]
    fn test_storage_open() {
        let (storage, _temp) = test_storage();
        assert_eq!(storage.account_count().unwrap(), 0);
        assert!(storage.get_root().unwrap().is_none());
    }

    #[test]
    fn test_balance_round_trip() {
        let (storage, _temp) = test_storage();
        let alice = AccountId::new("alice");

        assert!(!storage.contains_account(&alice).unwrap());
        assert_eq!(storage.get_balance(&alice).unwrap(), None);

        storage.set_balance(&alice, 42).unwrap();
        assert!(storage.contains_account(&alice).unwrap());
        assert_eq!(storage.get_balance(&alice).unwrap(), Some(42));

        // Total overwrite, not incremental
        storage.set_balance(&alice, 7).unwrap();
        assert_eq!(storage.get_balance(&alice).unwrap(), Some(7));
    }

    #[test]
    fn test_zero_balance_entry_is_registered() {
        let (storage, _temp) = test_storage();
        let alice = AccountId::new("alice");
        storage.set_balance(&alice, 0).unwrap();
        assert!(storage.contains_account(&alice).unwrap());
    }

    #[test]
    fn test_apply_batch() {
        let (storage, _temp) = test_storage();
        let alice = AccountId::new("alice");
        let bob = AccountId::new("bob");

        let root = ContractRoot {
            owner_id: alice.clone(),
            total_supply: 100,
            metadata: Metadata::default(),
            bytes_for_longest_account_id: 80,
        };

        storage
            .apply(&[(alice.clone(), 60), (bob.clone(), 40)], Some(&root))
            .unwrap();

        assert_eq!(storage.get_balance(&alice).unwrap(), Some(60));
        assert_eq!(storage.get_balance(&bob).unwrap(), Some(40));
        assert_eq!(storage.get_root().unwrap().unwrap().total_supply, 100);
        assert_eq!(storage.sum_balances().unwrap(), 100);
        assert_eq!(storage.account_count().unwrap(), 2);
    }

    #[test]
    fn test_root_round_trip() {
        let (storage, _temp) = test_storage();
        let root = ContractRoot {
            owner_id: AccountId::new("owner"),
            total_supply: 1_000_000,
            metadata: Metadata::new("Test Token", "TT", 8),
            bytes_for_longest_account_id: 80,
        };

        storage.put_root(&root).unwrap();
        let loaded = storage.get_root().unwrap().unwrap();
        assert_eq!(loaded, root);
    }

    #[test]
    fn test_large_balance_survives_serialization() {
        let (storage, _temp) = test_storage();
        let alice = AccountId::new("alice");
        storage.set_balance(&alice, u128::MAX).unwrap();
        assert_eq!(storage.get_balance(&alice).unwrap(), Some(u128::MAX));
    }
}
