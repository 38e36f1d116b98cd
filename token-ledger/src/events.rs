//! Structured mint/burn/transfer event emission
//!
//! Every mutating operation emits a single-line `EVENT_JSON:`-prefixed
//! record in the NEP-141 wire format, with all non-string data fields
//! stringified before emission. Records are written through `tracing` under
//! the [`EVENT_TARGET`] target so collectors can filter them.

use crate::types::{AccountId, Balance};
use serde_json::json;

/// Event log standard identifier
pub const EVENT_STANDARD: &str = "nep141";

/// Event log standard version
pub const EVENT_VERSION: &str = "1.0.0";

/// Logging target events are emitted under
pub const EVENT_TARGET: &str = "token_ledger::events";

/// A mint, burn, or transfer event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FtEvent<'a> {
    /// Tokens created into an account
    Mint {
        /// Credited account
        account_id: &'a AccountId,
        /// Minted amount
        amount: Balance,
        /// Optional note
        memo: Option<&'a str>,
    },
    /// Tokens destroyed from an account
    Burn {
        /// Debited account
        account_id: &'a AccountId,
        /// Burned amount
        amount: Balance,
        /// Optional note
        memo: Option<&'a str>,
    },
    /// Tokens moved between two accounts
    Transfer {
        /// Debited account
        sender_id: &'a AccountId,
        /// Credited account
        receiver_id: &'a AccountId,
        /// Transferred amount
        amount: Balance,
        /// Optional note
        memo: Option<&'a str>,
    },
}

impl FtEvent<'_> {
    /// Event kind tag in the emitted record
    pub fn kind(&self) -> &'static str {
        match self {
            FtEvent::Mint { .. } => "ft_mint",
            FtEvent::Burn { .. } => "ft_burn",
            FtEvent::Transfer { .. } => "ft_transfer",
        }
    }

    /// Render the full `EVENT_JSON:`-prefixed log line
    pub fn to_log_line(&self) -> String {
        let mut data = match self {
            FtEvent::Mint { account_id, amount, memo: _ }
            | FtEvent::Burn { account_id, amount, memo: _ } => json!({
                "accountId": account_id.as_str(),
                "amount": amount.to_string(),
            }),
            FtEvent::Transfer { sender_id, receiver_id, amount, memo: _ } => json!({
                "sender_id": sender_id.as_str(),
                "receiver_id": receiver_id.as_str(),
                "amount": amount.to_string(),
            }),
        };

        let memo = match self {
            FtEvent::Mint { memo, .. }
            | FtEvent::Burn { memo, .. }
            | FtEvent::Transfer { memo, .. } => *memo,
        };
        if let Some(memo) = memo {
            data["memo"] = json!(memo);
        }

        let envelope = json!({
            "standard": EVENT_STANDARD,
            "version": EVENT_VERSION,
            "event": self.kind(),
            "data": [data],
        });

        format!("EVENT_JSON:{}", envelope)
    }

    /// Write the event to the log
    pub fn emit(&self) {
        tracing::info!(target: "token_ledger::events", "{}", self.to_log_line());
    }
}
