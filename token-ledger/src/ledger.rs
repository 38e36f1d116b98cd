//! Ledger core primitives
//!
//! The sole mutator of the balance store. Every precondition is checked
//! before the first write is issued, so a failed operation leaves no
//! partial state behind.

use crate::{
    contract::Contract,
    error::{Error, Result},
    events::FtEvent,
    types::{AccountId, Balance},
};

impl Contract {
    /// Create a zero-balance entry for the account. Double registration is
    /// an error, not a no-op.
    pub(crate) fn register_account(&mut self, account_id: &AccountId) -> Result<()> {
        if self.store.contains_account(account_id)? {
            return Err(Error::AlreadyRegistered(account_id.clone()));
        }
        self.store.set_balance(account_id, 0)?;
        self.metrics.registrations_total.inc();

        tracing::debug!(account_id = %account_id, "Account registered");
        Ok(())
    }

    /// Credit `amount` to a registered account
    pub(crate) fn deposit(&mut self, account_id: &AccountId, amount: Balance) -> Result<()> {
        let new_balance = self.credited(account_id, amount)?;
        self.store.set_balance(account_id, new_balance)
    }

    /// Debit `amount` from a registered account holding at least that much
    pub(crate) fn withdraw(&mut self, account_id: &AccountId, amount: Balance) -> Result<()> {
        let new_balance = self.debited(account_id, amount)?;
        self.store.set_balance(account_id, new_balance)
    }

    /// Move `amount` from `sender_id` to `receiver_id` as a single logical
    /// unit and emit the transfer event. Both sides are validated before
    /// the debit and credit land in one write batch.
    pub(crate) fn internal_transfer(
        &mut self,
        sender_id: &AccountId,
        receiver_id: &AccountId,
        amount: Balance,
        memo: Option<&str>,
    ) -> Result<()> {
        if sender_id == receiver_id {
            return Err(Error::SelfTransfer);
        }
        if amount == 0 {
            return Err(Error::ZeroAmount);
        }

        let sender_balance = self.debited(sender_id, amount)?;
        let receiver_balance = self.credited(receiver_id, amount)?;

        self.store.apply(
            &[
                (sender_id.clone(), sender_balance),
                (receiver_id.clone(), receiver_balance),
            ],
            None,
        )?;

        FtEvent::Transfer {
            sender_id,
            receiver_id,
            amount,
            memo,
        }
        .emit();
        self.metrics.transfers_total.inc();

        tracing::debug!(
            sender_id = %sender_id,
            receiver_id = %receiver_id,
            amount = %amount,
            "Transfer applied"
        );
        Ok(())
    }

    /// Stored balance, or 0 for an unregistered account. Reading is always
    /// safe; only mutation requires registration.
    pub fn balance_of(&self, account_id: &AccountId) -> Result<Balance> {
        Ok(self.store.get_balance(account_id)?.unwrap_or(0))
    }

    /// Whether the account has a balance entry
    pub fn is_registered(&self, account_id: &AccountId) -> Result<bool> {
        self.store.contains_account(account_id)
    }

    /// Conservation check: total supply equals the sum of all balances
    pub fn verify_supply(&self) -> Result<bool> {
        Ok(self.store.sum_balances()? == self.root()?.total_supply)
    }

    /// New balance after crediting `amount`; fails without writing
    fn credited(&self, account_id: &AccountId, amount: Balance) -> Result<Balance> {
        let balance = self.unwrap_balance_of(account_id)?;
        balance
            .checked_add(amount)
            .ok_or_else(|| Error::BalanceOverflow {
                account: account_id.clone(),
                amount,
            })
    }

    /// New balance after debiting `amount`; fails without writing
    fn debited(&self, account_id: &AccountId, amount: Balance) -> Result<Balance> {
        let balance = self.unwrap_balance_of(account_id)?;
        if balance < amount {
            return Err(Error::InsufficientBalance {
                account: account_id.clone(),
                balance,
                amount,
            });
        }
        Ok(balance - amount)
    }

    /// Stored balance of a registered account; `UnregisteredAccount`
    /// otherwise
    fn unwrap_balance_of(&self, account_id: &AccountId) -> Result<Balance> {
        self.store
            .get_balance(account_id)?
            .ok_or_else(|| Error::UnregisteredAccount(account_id.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::Config,
        types::{CallContext, Metadata},
    };
    use tempfile::TempDir;

    fn test_contract(total_supply: Balance) -> (Contract, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let mut config = Config::default();
        config.data_dir = temp_dir.path().to_path_buf();

        let mut contract = Contract::open(&config).unwrap();
        let ctx = CallContext::direct(config.account_id.clone(), AccountId::new("owner"), 0);
        contract
            .init(&ctx, None, total_supply, Metadata::default())
            .unwrap();
        (contract, temp_dir)
    }

    #[test]
    fn test_register_then_double_register() {
        let (mut contract, _temp) = test_contract(0);
        let alice = AccountId::new("alice");

        contract.register_account(&alice).unwrap();
        assert!(contract.is_registered(&alice).unwrap());
        assert_eq!(contract.balance_of(&alice).unwrap(), 0);

        let result = contract.register_account(&alice);
        assert!(matches!(result, Err(Error::AlreadyRegistered(_))));
    }

    #[test]
    fn test_deposit_requires_registration() {
        let (mut contract, _temp) = test_contract(0);
        let ghost = AccountId::new("ghost");

        let result = contract.deposit(&ghost, 10);
        assert!(matches!(result, Err(Error::UnregisteredAccount(_))));
        // Reading stays safe
        assert_eq!(contract.balance_of(&ghost).unwrap(), 0);
    }

    #[test]
    fn test_withdraw_requires_registration() {
        let (mut contract, _temp) = test_contract(0);
        let result = contract.withdraw(&AccountId::new("ghost"), 10);
        assert!(matches!(result, Err(Error::UnregisteredAccount(_))));
    }

    #[test]
    fn test_withdraw_insufficient_balance_leaves_state_unchanged() {
        let (mut contract, _temp) = test_contract(0);
        let alice = AccountId::new("alice");
        contract.register_account(&alice).unwrap();
        contract.deposit(&alice, 5).unwrap();

        let result = contract.withdraw(&alice, 6);
        assert!(matches!(
            result,
            Err(Error::InsufficientBalance {
                balance: 5,
                amount: 6,
                ..
            })
        ));
        assert_eq!(contract.balance_of(&alice).unwrap(), 5);
    }

    #[test]
    fn test_deposit_overflow_is_rejected() {
        let (mut contract, _temp) = test_contract(0);
        let alice = AccountId::new("alice");
        contract.register_account(&alice).unwrap();
        contract.deposit(&alice, Balance::MAX).unwrap();

        let result = contract.deposit(&alice, 1);
        assert!(matches!(result, Err(Error::BalanceOverflow { .. })));
        assert_eq!(contract.balance_of(&alice).unwrap(), Balance::MAX);
    }

    #[test]
    fn test_transfer_moves_funds_and_conserves_supply() {
        let (mut contract, _temp) = test_contract(100);
        let owner = AccountId::new("owner");
        let alice = AccountId::new("alice");
        contract.register_account(&alice).unwrap();

        contract
            .internal_transfer(&owner, &alice, 40, Some("test transfer"))
            .unwrap();

        assert_eq!(contract.balance_of(&owner).unwrap(), 60);
        assert_eq!(contract.balance_of(&alice).unwrap(), 40);
        assert_eq!(contract.ft_total_supply().unwrap(), 100);
        assert!(contract.verify_supply().unwrap());
    }

    #[test]
    fn test_self_transfer_rejected() {
        let (mut contract, _temp) = test_contract(100);
        let owner = AccountId::new("owner");
        let result = contract.internal_transfer(&owner, &owner, 10, None);
        assert!(matches!(result, Err(Error::SelfTransfer)));
        assert_eq!(contract.balance_of(&owner).unwrap(), 100);
    }

    #[test]
    fn test_zero_amount_transfer_rejected() {
        let (mut contract, _temp) = test_contract(100);
        let owner = AccountId::new("owner");
        let alice = AccountId::new("alice");
        contract.register_account(&alice).unwrap();

        let result = contract.internal_transfer(&owner, &alice, 0, None);
        assert!(matches!(result, Err(Error::ZeroAmount)));
    }

    #[test]
    fn test_transfer_to_unregistered_leaves_sender_untouched() {
        let (mut contract, _temp) = test_contract(100);
        let owner = AccountId::new("owner");
        let ghost = AccountId::new("ghost");

        let result = contract.internal_transfer(&owner, &ghost, 10, None);
        assert!(matches!(result, Err(Error::UnregisteredAccount(_))));
        // The sender debit must not have landed
        assert_eq!(contract.balance_of(&owner).unwrap(), 100);
        assert!(contract.verify_supply().unwrap());
    }

    #[test]
    fn test_transfer_receiver_overflow_leaves_sender_untouched() {
        let (mut contract, _temp) = test_contract(100);
        let owner = AccountId::new("owner");
        let alice = AccountId::new("alice");
        contract.register_account(&alice).unwrap();
        contract.deposit(&alice, Balance::MAX - 5).unwrap();

        let result = contract.internal_transfer(&owner, &alice, 10, None);
        assert!(matches!(result, Err(Error::BalanceOverflow { .. })));
        assert_eq!(contract.balance_of(&owner).unwrap(), 100);
        assert_eq!(contract.balance_of(&alice).unwrap(), Balance::MAX - 5);
    }

    #[test]
    fn test_balance_of_unregistered_is_zero() {
        let (contract, _temp) = test_contract(0);
        assert_eq!(
            contract.balance_of(&AccountId::new("nobody")).unwrap(),
            0
        );
    }
}
