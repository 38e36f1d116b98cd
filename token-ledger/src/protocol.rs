//! Transfer protocol: synchronous transfers and the asynchronous
//! transfer-and-notify chain
//!
//! `ft_transfer_call` applies the transfer optimistically and returns a
//! [`PendingTransfer`] continuation descriptor instead of performing any
//! scheduling itself. The environment notifies the receiving party, then
//! invokes `ft_resolve_transfer` with the sub-call outcome; resolution
//! reconciles the optimistic credit against what the receiver reports as
//! unused, capped by the amount sent and by the receiver's balance at
//! resolution time.

use crate::{
    contract::Contract,
    error::{Error, Result},
    types::{AccountId, Balance, CallContext, NativeAmount},
};

/// Fixed payment that must accompany `ft_transfer` and `ft_transfer_call`.
/// It forces the caller to sign the transaction and is not part of the
/// token ledger.
pub const REQUIRED_TRANSFER_PAYMENT: NativeAmount = 1;

/// Execution-resource budget for the receiver notification sub-call
pub const NOTIFY_BUDGET: u64 = 30_000_000_000_000;

/// Execution-resource budget for the resolution callback
pub const RESOLVE_BUDGET: u64 = 5_000_000_000_000;

/// Continuation descriptor returned by `ft_transfer_call`.
///
/// The transfer has already been applied when this value is produced. The
/// scheduler is expected to invoke the receiver's `on_transfer` with
/// `(sender_id, amount, msg)` under `notify_budget`, then — regardless of
/// that outcome — invoke `ft_resolve_transfer` under `resolve_budget`.
/// Nothing is persisted for the in-flight chain; if the environment never
/// runs the resolution step, the transfer stays optimistically applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingTransfer {
    /// Account that initiated the transfer-call
    pub sender_id: AccountId,

    /// Account that was optimistically credited
    pub receiver_id: AccountId,

    /// Amount already moved to the receiver
    pub amount: Balance,

    /// Opaque message forwarded to the receiver's notification handler
    pub msg: String,

    /// Budget for the notification sub-call
    pub notify_budget: u64,

    /// Budget for the resolution callback
    pub resolve_budget: u64,
}

/// Outcome of the receiver-notification sub-call as observed by the
/// resolution step
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubCallResult {
    /// The sub-call completed and returned a payload
    Completed(Vec<u8>),

    /// The sub-call failed or exhausted its budget
    Failed,
}

impl Contract {
    /// Transfer `amount` from the caller to `receiver_id`.
    ///
    /// The caller is the sender; there are no delegated transfers. Requires
    /// the minimal fixed payment.
    pub fn ft_transfer(
        &mut self,
        ctx: &CallContext,
        receiver_id: &AccountId,
        amount: Balance,
        memo: Option<&str>,
    ) -> Result<()> {
        self.root()?;
        require_transfer_payment(ctx)?;
        self.internal_transfer(&ctx.caller, receiver_id, amount, memo)
    }

    /// Transfer `amount` from the caller to `receiver_id` and hand back the
    /// continuation the environment must schedule: notify the receiver, then
    /// resolve.
    ///
    /// The receiver is credited before it confirms anything; the eventual
    /// result of the whole chain is whatever the resolution step computes.
    pub fn ft_transfer_call(
        &mut self,
        ctx: &CallContext,
        receiver_id: &AccountId,
        amount: Balance,
        memo: Option<&str>,
        msg: &str,
    ) -> Result<PendingTransfer> {
        self.root()?;
        require_transfer_payment(ctx)?;

        self.internal_transfer(&ctx.caller, receiver_id, amount, memo)?;
        self.metrics.transfer_calls_total.inc();

        tracing::debug!(
            sender_id = %ctx.caller,
            receiver_id = %receiver_id,
            amount = %amount,
            "Transfer applied, notification pending"
        );

        Ok(PendingTransfer {
            sender_id: ctx.caller.clone(),
            receiver_id: receiver_id.clone(),
            amount,
            msg: msg.to_string(),
            notify_budget: NOTIFY_BUDGET,
            resolve_budget: RESOLVE_BUDGET,
        })
    }

    /// Reconcile a transfer-call against the notification outcome and
    /// return the amount the receiver actually used.
    ///
    /// Only callable as the resolution step of the chain scheduled by
    /// `ft_transfer_call`, never directly by outside callers. A failed
    /// sub-call is absorbed here rather than propagated: it counts as
    /// "receiver used nothing" and drives a full refund attempt.
    pub fn ft_resolve_transfer(
        &mut self,
        ctx: &CallContext,
        sender_id: &AccountId,
        receiver_id: &AccountId,
        amount: Balance,
        result: &SubCallResult,
    ) -> Result<Balance> {
        self.root()?;
        if ctx.caller != ctx.current_account {
            return Err(Error::UnauthorizedCaller(ctx.caller.clone()));
        }

        let unused_amount = match result {
            SubCallResult::Failed => amount,
            SubCallResult::Completed(payload) => match parse_unused_amount(payload) {
                // The receiver cannot claim more unused than was sent.
                Some(value) => value.min(amount),
                // An unreadable reply counts as nothing used.
                None => amount,
            },
        };

        if unused_amount > 0 {
            let receiver_balance = self.balance_of(receiver_id)?;

            if receiver_balance > 0 {
                // Claw back no more than the receiver still holds.
                let refund_amount = unused_amount.min(receiver_balance);
                self.internal_transfer(
                    receiver_id,
                    sender_id,
                    refund_amount,
                    Some("Refund from ft_transfer_call"),
                )?;
                self.metrics.refunds_total.inc();

                tracing::debug!(
                    sender_id = %sender_id,
                    receiver_id = %receiver_id,
                    refund_amount = %refund_amount,
                    "Transfer-call refund applied"
                );
                return Ok(amount - refund_amount);
            }

            tracing::warn!(
                sender_id = %sender_id,
                receiver_id = %receiver_id,
                unused_amount = %unused_amount,
                "Receiver balance exhausted, no refund possible"
            );
        }

        Ok(amount)
    }
}

/// The minimal fixed payment gate shared by both transfer entry points
pub(crate) fn require_transfer_payment(ctx: &CallContext) -> Result<()> {
    if ctx.attached_payment != REQUIRED_TRANSFER_PAYMENT {
        return Err(Error::MissingRequiredPayment);
    }
    Ok(())
}

/// Parse the receiver's reply as an unsigned amount: a JSON string-encoded
/// integer or a bare JSON number. Anything else is unreadable.
fn parse_unused_amount(payload: &[u8]) -> Option<Balance> {
    if let Ok(text) = serde_json::from_slice::<String>(payload) {
        return text.parse().ok();
    }
    serde_json::from_slice::<Balance>(payload).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::Config,
        types::Metadata,
    };
    use tempfile::TempDir;

    const SUPPLY: Balance = 1_000;

    fn test_contract() -> (Contract, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let mut config = Config::default();
        config.data_dir = temp_dir.path().to_path_buf();

        let mut contract = Contract::open(&config).unwrap();
        let ctx = CallContext::direct(config.account_id.clone(), AccountId::new("sender"), 0);
        contract
            .init(&ctx, None, SUPPLY, Metadata::default())
            .unwrap();
        contract.register_account(&AccountId::new("receiver")).unwrap();
        (contract, temp_dir)
    }

    fn caller_ctx(contract: &Contract, caller: &str, attached: NativeAmount) -> CallContext {
        CallContext::direct(
            contract.account_id().clone(),
            AccountId::new(caller),
            attached,
        )
    }

    fn resolve_ctx(contract: &Contract) -> CallContext {
        CallContext::direct(
            contract.account_id().clone(),
            contract.account_id().clone(),
            0,
        )
    }

    fn json_reply(unused: Balance) -> SubCallResult {
        SubCallResult::Completed(format!("\"{}\"", unused).into_bytes())
    }

    #[test]
    fn test_parse_unused_amount() {
        assert_eq!(parse_unused_amount(b"\"30\""), Some(30));
        assert_eq!(parse_unused_amount(b"30"), Some(30));
        assert_eq!(parse_unused_amount(b"0"), Some(0));
        assert_eq!(parse_unused_amount(b"\"not a number\""), None);
        assert_eq!(parse_unused_amount(b"-5"), None);
        assert_eq!(parse_unused_amount(b"{}"), None);
        assert_eq!(parse_unused_amount(b""), None);
    }

    #[test]
    fn test_ft_transfer_requires_exact_payment() {
        let (mut contract, _temp) = test_contract();
        let receiver = AccountId::new("receiver");

        for attached in [0, 2, 100] {
            let ctx = caller_ctx(&contract, "sender", attached);
            let result = contract.ft_transfer(&ctx, &receiver, 10, None);
            assert!(matches!(result, Err(Error::MissingRequiredPayment)));
        }

        let ctx = caller_ctx(&contract, "sender", REQUIRED_TRANSFER_PAYMENT);
        contract.ft_transfer(&ctx, &receiver, 10, None).unwrap();
        assert_eq!(contract.balance_of(&receiver).unwrap(), 10);
    }

    #[test]
    fn test_transfer_call_applies_optimistically() {
        let (mut contract, _temp) = test_contract();
        let sender = AccountId::new("sender");
        let receiver = AccountId::new("receiver");

        let ctx = caller_ctx(&contract, "sender", 1);
        let pending = contract
            .ft_transfer_call(&ctx, &receiver, 100, None, "take these")
            .unwrap();

        // Credited before any confirmation
        assert_eq!(contract.balance_of(&receiver).unwrap(), 100);
        assert_eq!(contract.balance_of(&sender).unwrap(), SUPPLY - 100);

        assert_eq!(pending.sender_id, sender);
        assert_eq!(pending.receiver_id, receiver);
        assert_eq!(pending.amount, 100);
        assert_eq!(pending.msg, "take these");
        assert_eq!(pending.notify_budget, NOTIFY_BUDGET);
    }

    #[test]
    fn test_transfer_call_requires_payment() {
        let (mut contract, _temp) = test_contract();
        let ctx = caller_ctx(&contract, "sender", 0);
        let result =
            contract.ft_transfer_call(&ctx, &AccountId::new("receiver"), 100, None, "");
        assert!(matches!(result, Err(Error::MissingRequiredPayment)));
    }

    #[test]
    fn test_resolve_rejects_outside_callers() {
        let (mut contract, _temp) = test_contract();
        let sender = AccountId::new("sender");
        let receiver = AccountId::new("receiver");

        let ctx = caller_ctx(&contract, "mallory", 0);
        let result =
            contract.ft_resolve_transfer(&ctx, &sender, &receiver, 100, &json_reply(100));
        assert!(matches!(result, Err(Error::UnauthorizedCaller(_))));
    }

    #[test]
    fn test_resolve_full_use_applies_no_correction() {
        let (mut contract, _temp) = test_contract();
        let sender = AccountId::new("sender");
        let receiver = AccountId::new("receiver");

        let ctx = caller_ctx(&contract, "sender", 1);
        contract
            .ft_transfer_call(&ctx, &receiver, 100, None, "")
            .unwrap();

        let used = contract
            .ft_resolve_transfer(&resolve_ctx(&contract), &sender, &receiver, 100, &json_reply(0))
            .unwrap();

        assert_eq!(used, 100);
        assert_eq!(contract.balance_of(&receiver).unwrap(), 100);
        assert_eq!(contract.balance_of(&sender).unwrap(), SUPPLY - 100);
    }

    #[test]
    fn test_resolve_partial_use_refunds_unused() {
        let (mut contract, _temp) = test_contract();
        let sender = AccountId::new("sender");
        let receiver = AccountId::new("receiver");

        let ctx = caller_ctx(&contract, "sender", 1);
        contract
            .ft_transfer_call(&ctx, &receiver, 100, None, "")
            .unwrap();

        let used = contract
            .ft_resolve_transfer(&resolve_ctx(&contract), &sender, &receiver, 100, &json_reply(30))
            .unwrap();

        assert_eq!(used, 70);
        assert_eq!(contract.balance_of(&receiver).unwrap(), 70);
        assert_eq!(contract.balance_of(&sender).unwrap(), SUPPLY - 70);
        assert!(contract.verify_supply().unwrap());
    }

    #[test]
    fn test_resolve_failed_subcall_reverts_everything() {
        let (mut contract, _temp) = test_contract();
        let sender = AccountId::new("sender");
        let receiver = AccountId::new("receiver");

        let ctx = caller_ctx(&contract, "sender", 1);
        contract
            .ft_transfer_call(&ctx, &receiver, 100, None, "")
            .unwrap();

        let used = contract
            .ft_resolve_transfer(
                &resolve_ctx(&contract),
                &sender,
                &receiver,
                100,
                &SubCallResult::Failed,
            )
            .unwrap();

        assert_eq!(used, 0);
        assert_eq!(contract.balance_of(&receiver).unwrap(), 0);
        assert_eq!(contract.balance_of(&sender).unwrap(), SUPPLY);
    }

    #[test]
    fn test_resolve_unreadable_reply_counts_as_unused() {
        let (mut contract, _temp) = test_contract();
        let sender = AccountId::new("sender");
        let receiver = AccountId::new("receiver");

        let ctx = caller_ctx(&contract, "sender", 1);
        contract
            .ft_transfer_call(&ctx, &receiver, 100, None, "")
            .unwrap();

        let reply = SubCallResult::Completed(b"certainly not an amount".to_vec());
        let used = contract
            .ft_resolve_transfer(&resolve_ctx(&contract), &sender, &receiver, 100, &reply)
            .unwrap();

        assert_eq!(used, 0);
        assert_eq!(contract.balance_of(&sender).unwrap(), SUPPLY);
    }

    #[test]
    fn test_resolve_caps_claim_at_amount() {
        let (mut contract, _temp) = test_contract();
        let sender = AccountId::new("sender");
        let receiver = AccountId::new("receiver");

        let ctx = caller_ctx(&contract, "sender", 1);
        contract
            .ft_transfer_call(&ctx, &receiver, 100, None, "")
            .unwrap();

        // A malicious receiver claiming more unused than was sent gets
        // clamped to the transferred amount.
        let used = contract
            .ft_resolve_transfer(
                &resolve_ctx(&contract),
                &sender,
                &receiver,
                100,
                &json_reply(1_000_000),
            )
            .unwrap();

        assert_eq!(used, 0);
        assert_eq!(contract.balance_of(&receiver).unwrap(), 0);
        assert_eq!(contract.balance_of(&sender).unwrap(), SUPPLY);
    }

    #[test]
    fn test_resolve_caps_refund_at_receiver_balance() {
        let (mut contract, _temp) = test_contract();
        let sender = AccountId::new("sender");
        let receiver = AccountId::new("receiver");
        let elsewhere = AccountId::new("elsewhere");
        contract.register_account(&elsewhere).unwrap();

        let ctx = caller_ctx(&contract, "sender", 1);
        contract
            .ft_transfer_call(&ctx, &receiver, 100, None, "")
            .unwrap();

        // The receiver spends 90 of the optimistic credit before the
        // resolution step runs.
        let spend_ctx = caller_ctx(&contract, "receiver", 1);
        contract
            .ft_transfer(&spend_ctx, &elsewhere, 90, None)
            .unwrap();

        let used = contract
            .ft_resolve_transfer(&resolve_ctx(&contract), &sender, &receiver, 100, &json_reply(30))
            .unwrap();

        // Claimed 30 unused, but only 10 is left to claw back
        assert_eq!(used, 90);
        assert_eq!(contract.balance_of(&receiver).unwrap(), 0);
        assert_eq!(contract.balance_of(&sender).unwrap(), SUPPLY - 90);
        assert_eq!(contract.balance_of(&elsewhere).unwrap(), 90);
        assert!(contract.verify_supply().unwrap());
    }

    #[test]
    fn test_resolve_receiver_spent_everything() {
        let (mut contract, _temp) = test_contract();
        let sender = AccountId::new("sender");
        let receiver = AccountId::new("receiver");
        let elsewhere = AccountId::new("elsewhere");
        contract.register_account(&elsewhere).unwrap();

        let ctx = caller_ctx(&contract, "sender", 1);
        contract
            .ft_transfer_call(&ctx, &receiver, 100, None, "")
            .unwrap();

        let spend_ctx = caller_ctx(&contract, "receiver", 1);
        contract
            .ft_transfer(&spend_ctx, &elsewhere, 100, None)
            .unwrap();

        // No refund is possible regardless of the claimed unused amount;
        // the sender absorbs the loss.
        let used = contract
            .ft_resolve_transfer(
                &resolve_ctx(&contract),
                &sender,
                &receiver,
                100,
                &SubCallResult::Failed,
            )
            .unwrap();

        assert_eq!(used, 100);
        assert_eq!(contract.balance_of(&sender).unwrap(), SUPPLY - 100);
        assert_eq!(contract.balance_of(&elsewhere).unwrap(), 100);
    }
}
