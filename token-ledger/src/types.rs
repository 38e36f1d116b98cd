//! Core types for the token ledger
//!
//! All persisted types use deterministic bincode serialization. Token
//! amounts are plain unsigned integers; fractional display is a frontend
//! concern driven by [`Metadata::decimals`].

use serde::{Deserialize, Serialize};
use std::fmt;

/// Token amount in the ledger's own unit
pub type Balance = u128;

/// Amount in the surrounding environment's native payment unit
///
/// Attached payments and storage costs are denominated in this unit; it is
/// unrelated to the token's own [`Balance`] unit.
pub type NativeAmount = u128;

/// Account identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AccountId(String);

impl AccountId {
    /// Longest admissible identifier, in bytes. Drives the storage bound
    /// computed at initialization.
    pub const MAX_LENGTH: usize = 64;

    /// Create new account ID
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get as string
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Get as raw bytes (the storage key)
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for AccountId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Identity and payment context the environment attaches to every call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallContext {
    /// Account the ledger runs inside
    pub current_account: AccountId,

    /// Immediate caller of this operation
    pub caller: AccountId,

    /// Originator of the call chain; differs from `caller` when the call
    /// was relayed through another contract
    pub signer: AccountId,

    /// Payment attached to the call, in native units
    pub attached_payment: NativeAmount,
}

impl CallContext {
    /// Context for a call submitted directly by `caller`
    pub fn direct(
        current_account: AccountId,
        caller: AccountId,
        attached_payment: NativeAmount,
    ) -> Self {
        Self {
            current_account,
            signer: caller.clone(),
            caller,
            attached_payment,
        }
    }
}

/// Metadata spec version this contract adheres to
pub const FT_METADATA_SPEC: &str = "ft-1.0.0";

/// Token metadata, set once at initialization and read-only thereafter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    /// Metadata spec version, `ft-1.0.0`
    pub spec: String,

    /// Human-readable token name
    pub name: String,

    /// Token abbreviation, like wETH or AMPL
    pub symbol: String,

    /// Token icon (data URL)
    pub icon: Option<String>,

    /// Link to a JSON file with supplementary token details
    pub reference: Option<String>,

    /// Base64-encoded sha256 of the `reference` file, guarding against
    /// off-chain tampering
    pub reference_hash: Option<String>,

    /// Significant digits frontends should display
    pub decimals: u8,
}

impl Metadata {
    /// Metadata with the given name, symbol, and decimals
    pub fn new(name: impl Into<String>, symbol: impl Into<String>, decimals: u8) -> Self {
        Self {
            spec: FT_METADATA_SPEC.to_string(),
            name: name.into(),
            symbol: symbol.into(),
            icon: None,
            reference: None,
            reference_hash: None,
            decimals,
        }
    }
}

impl Default for Metadata {
    fn default() -> Self {
        Self::new("TokenRail Token", "RAIL", 18)
    }
}

/// Storage balance of a registered account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageBalance {
    /// Native amount locked for the account's storage
    pub total: NativeAmount,

    /// Withdrawable portion; always 0, storage cannot be overpaid
    pub available: NativeAmount,
}

/// Bounds of the fixed-cost registration gate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageBalanceBounds {
    /// Minimum acceptable payment
    pub min: NativeAmount,

    /// Maximum useful payment; equal to `min` for this fixed-cost gate
    pub max: NativeAmount,
}

/// Outcome of `storage_deposit`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StorageDeposit {
    /// Storage balance of the target account after the call
    pub balance: StorageBalance,

    /// Portion of the attached payment the environment owes back to the
    /// caller
    pub refund: NativeAmount,
}

/// Persistent root record of the contract
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractRoot {
    /// Owner set at initialization; the only identity allowed to mint
    pub owner_id: AccountId,

    /// Total token supply; equals the sum of all registered balances
    pub total_supply: Balance,

    /// Immutable token metadata
    pub metadata: Metadata,

    /// Bytes a balance entry for the longest admissible account id
    /// occupies; measured once at initialization
    pub bytes_for_longest_account_id: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_account_id_display() {
        let account = AccountId::new("alice.tokenrail");
        assert_eq!(account.to_string(), "alice.tokenrail");
        assert_eq!(account.as_str(), "alice.tokenrail");
    }

    #[test]
    fn test_default_metadata() {
        let metadata = Metadata::default();
        assert_eq!(metadata.spec, FT_METADATA_SPEC);
        assert_eq!(metadata.symbol, "RAIL");
        assert_eq!(metadata.decimals, 18);
        assert!(metadata.icon.is_none());
    }

    #[test]
    fn test_direct_context_signer_is_caller() {
        let ctx = CallContext::direct(
            AccountId::new("tokenrail"),
            AccountId::new("alice"),
            1,
        );
        assert_eq!(ctx.caller, ctx.signer);
        assert_eq!(ctx.attached_payment, 1);
    }
}
