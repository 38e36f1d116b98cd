//! Error types for the token ledger

use crate::types::{AccountId, Balance, NativeAmount};
use thiserror::Error;

/// Result type for ledger operations
pub type Result<T> = std::result::Result<T, Error>;

/// Ledger errors
///
/// Every precondition violation aborts the current operation before any
/// write is issued; no partial state survives a failed call.
#[derive(Error, Debug)]
pub enum Error {
    /// Contract has not been initialized
    #[error("The contract is not initialized")]
    Uninitialized,

    /// Contract was already initialized
    #[error("The contract is already initialized")]
    AlreadyInitialized,

    /// Account has no balance entry
    #[error("The account {0} is not registered")]
    UnregisteredAccount(AccountId),

    /// Account already has a balance entry
    #[error("The account {0} is already registered")]
    AlreadyRegistered(AccountId),

    /// Withdrawal exceeds the stored balance
    #[error("The account {account} doesn't have enough balance: {balance} < {amount}")]
    InsufficientBalance {
        /// Account being debited
        account: AccountId,
        /// Stored balance at the time of the attempt
        balance: Balance,
        /// Requested debit
        amount: Balance,
    },

    /// Sender and receiver are the same account
    #[error("Sender and receiver should be different")]
    SelfTransfer,

    /// Transfer amount must be positive
    #[error("The amount should be a positive number")]
    ZeroAmount,

    /// Crediting would overflow the balance or the total supply
    #[error("Crediting {amount} to {account} would overflow")]
    BalanceOverflow {
        /// Account being credited
        account: AccountId,
        /// Requested credit
        amount: Balance,
    },

    /// Attached payment is below the registration minimum
    #[error("The attached deposit {attached} is less than the minimum storage balance {minimum}")]
    InsufficientStoragePayment {
        /// Payment attached to the call
        attached: NativeAmount,
        /// Minimum required by the storage bounds
        minimum: NativeAmount,
    },

    /// Caller may not perform this operation
    #[error("Unauthorized caller: {0}")]
    UnauthorizedCaller(AccountId),

    /// The minimal fixed payment gate was not satisfied
    #[error("Exactly 1 unit of native payment must be attached")]
    MissingRequiredPayment,

    /// Storage error (RocksDB)
    #[error("Storage error: {0}")]
    Storage(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<rocksdb::Error> for Error {
    fn from(err: rocksdb::Error) -> Self {
        Error::Storage(err.to_string())
    }
}
