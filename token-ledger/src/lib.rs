//! Fungible-token ledger with an asynchronous transfer-and-notify protocol
//!
//! The ledger runs inside a single logical account of a larger execution
//! environment. The environment supplies durable key-value storage, the
//! identity of each caller, and the scheduling of asynchronous sub-calls;
//! this crate supplies the contract itself.
//!
//! # Architecture
//!
//! - **Balance store** ([`store`]): RocksDB-backed map from account id to
//!   balance, plus the contract root record
//! - **Ledger core** ([`ledger`]): register/deposit/withdraw/transfer
//!   primitives — the sole mutator of the balance store
//! - **Transfer protocol** ([`protocol`]): synchronous `ft_transfer` and the
//!   two-phase `ft_transfer_call` / `ft_resolve_transfer` chain
//! - **Admin operations** ([`contract`]): owner-gated mint, self-gated burn
//! - **Events** ([`events`]): NEP-141 mint/burn/transfer records
//!
//! # Invariants
//!
//! - Conservation: total supply equals the sum of all registered balances
//! - Non-negativity: a withdrawal never takes a balance below zero
//! - Registration: only registered accounts hold or move tokens
//! - Fail-before-write: a failed operation leaves no partial state

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

pub mod config;
pub mod contract;
pub mod error;
pub mod events;
pub mod ledger;
pub mod metrics;
pub mod protocol;
pub mod store;
pub mod types;

// Re-exports
pub use config::Config;
pub use contract::Contract;
pub use error::{Error, Result};
pub use protocol::{PendingTransfer, SubCallResult, REQUIRED_TRANSFER_PAYMENT};
pub use store::Storage;
pub use types::{
    AccountId, Balance, CallContext, ContractRoot, Metadata, NativeAmount, StorageBalance,
    StorageBalanceBounds, StorageDeposit,
};
