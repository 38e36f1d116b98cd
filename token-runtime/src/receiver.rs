//! Receiving-party interface for transfer-call notifications
//!
//! A [`TransferReceiver`] models the external contract living at the
//! receiver account. When a transfer-call chain reaches its notification
//! step, the runtime invokes the receiver's handler with
//! `(sender_id, amount, msg)` and feeds whatever it reports back into the
//! resolution step.
//!
//! The stock implementations cover the outcomes the resolution algorithm
//! has to handle: full consumption, partial consumption, outright failure,
//! an unreadable reply, and a receiver that spends the optimistic credit
//! before resolution runs.

use token_ledger::{AccountId, Balance};

/// Reply the resolution step will observe from the notification sub-call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationReply {
    /// Well-formed reply naming the unused portion of the transfer
    Unused(Balance),

    /// Raw payload returned as-is; the resolver may find it unreadable
    Raw(Vec<u8>),

    /// The sub-call failed or exhausted its budget
    Failure,
}

/// A sub-operation the receiver issues while handling the notification.
///
/// The runtime executes these after the notification returns and before the
/// chained resolution step runs; this is how a receiver can spend the
/// optimistically credited funds before any clawback.
#[derive(Debug, Clone)]
pub enum ReceiverAction {
    /// Spend credited funds with a plain transfer
    Transfer {
        /// Account to send to
        receiver_id: AccountId,
        /// Amount to move
        amount: Balance,
        /// Optional note
        memo: Option<String>,
    },
}

/// Response from a receiver's `on_transfer` handler
#[derive(Debug, Clone)]
pub struct ReceiverResponse {
    /// What the resolution step will observe
    pub reply: NotificationReply,

    /// Sub-operations to run before the resolution step
    pub actions: Vec<ReceiverAction>,
}

impl ReceiverResponse {
    /// Reply with an unused amount and no follow-up actions
    pub fn unused(amount: Balance) -> Self {
        Self {
            reply: NotificationReply::Unused(amount),
            actions: Vec::new(),
        }
    }

    /// A failed sub-call
    pub fn failure() -> Self {
        Self {
            reply: NotificationReply::Failure,
            actions: Vec::new(),
        }
    }

    /// Reply with a raw payload
    pub fn raw(payload: impl Into<Vec<u8>>) -> Self {
        Self {
            reply: NotificationReply::Raw(payload.into()),
            actions: Vec::new(),
        }
    }

    /// Attach a follow-up action
    pub fn with_action(mut self, action: ReceiverAction) -> Self {
        self.actions.push(action);
        self
    }
}

/// The receiving party's notification entry point
pub trait TransferReceiver: Send + Sync {
    /// Handle an incoming transfer of `amount` from `sender_id` and report
    /// how much of it went unused
    fn on_transfer(&self, sender_id: &AccountId, amount: Balance, msg: &str) -> ReceiverResponse;
}

/// Consumes the whole transfer
#[derive(Debug, Default)]
pub struct SinkReceiver;

impl TransferReceiver for SinkReceiver {
    fn on_transfer(&self, _sender_id: &AccountId, _amount: Balance, _msg: &str) -> ReceiverResponse {
        ReceiverResponse::unused(0)
    }
}

/// Reports a fixed unused amount
#[derive(Debug)]
pub struct PartialReceiver {
    /// Unused amount to report
    pub unused: Balance,
}

impl TransferReceiver for PartialReceiver {
    fn on_transfer(&self, _sender_id: &AccountId, _amount: Balance, _msg: &str) -> ReceiverResponse {
        ReceiverResponse::unused(self.unused)
    }
}

/// Always fails
#[derive(Debug, Default)]
pub struct FailingReceiver;

impl TransferReceiver for FailingReceiver {
    fn on_transfer(&self, _sender_id: &AccountId, _amount: Balance, _msg: &str) -> ReceiverResponse {
        ReceiverResponse::failure()
    }
}

/// Replies with a payload the resolver cannot read
#[derive(Debug, Default)]
pub struct GarbageReceiver;

impl TransferReceiver for GarbageReceiver {
    fn on_transfer(&self, _sender_id: &AccountId, _amount: Balance, _msg: &str) -> ReceiverResponse {
        ReceiverResponse::raw(&b"not a number"[..])
    }
}

/// Reports `unused` after spending `spend` of the credit to `spend_to`
#[derive(Debug)]
pub struct SpendingReceiver {
    /// Unused amount to report
    pub unused: Balance,
    /// Account the spend goes to
    pub spend_to: AccountId,
    /// Amount spent before resolution
    pub spend: Balance,
}

impl TransferReceiver for SpendingReceiver {
    fn on_transfer(&self, _sender_id: &AccountId, _amount: Balance, _msg: &str) -> ReceiverResponse {
        ReceiverResponse::unused(self.unused).with_action(ReceiverAction::Transfer {
            receiver_id: self.spend_to.clone(),
            amount: self.spend,
            memo: None,
        })
    }
}
