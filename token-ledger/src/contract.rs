//! Contract state and entry points
//!
//! [`Contract`] is the single explicit state struct every operation takes by
//! exclusive reference: owner, total supply, metadata, the derived storage
//! cost, and the balance store. There is no ambient state; the environment's
//! per-call identity and attached payment arrive in a
//! [`CallContext`](crate::types::CallContext).

use crate::{
    config::Config,
    error::{Error, Result},
    events::FtEvent,
    metrics::Metrics,
    store::Storage,
    types::{
        AccountId, Balance, CallContext, ContractRoot, Metadata, NativeAmount, StorageBalance,
        StorageBalanceBounds, StorageDeposit,
    },
};

/// Bytes a balance entry occupies beyond the account id itself
const BALANCE_RECORD_BYTES: u64 = 16;

/// The fungible-token contract
pub struct Contract {
    pub(crate) store: Storage,
    pub(crate) metrics: Metrics,
    root: Option<ContractRoot>,
    account_id: AccountId,
    storage_byte_cost: NativeAmount,
}

impl Contract {
    /// Open the contract, loading persisted state if present
    pub fn open(config: &Config) -> Result<Self> {
        let store = Storage::open(config)?;
        let root = store.get_root()?;

        Ok(Self {
            store,
            metrics: Metrics::default(),
            root,
            account_id: config.account_id.clone(),
            storage_byte_cost: config.storage_byte_cost as NativeAmount,
        })
    }

    /// Account the contract runs inside
    pub fn account_id(&self) -> &AccountId {
        &self.account_id
    }

    /// Whether `init` has run
    pub fn is_initialized(&self) -> bool {
        self.root.is_some()
    }

    pub(crate) fn root(&self) -> Result<&ContractRoot> {
        self.root.as_ref().ok_or(Error::Uninitialized)
    }

    fn root_mut(&mut self) -> Result<&mut ContractRoot> {
        self.root.as_mut().ok_or(Error::Uninitialized)
    }

    /// One-time setup; must run before any other entry point is usable.
    ///
    /// Registers the owner, credits the initial supply to them, and emits a
    /// mint event. The owner defaults to the caller.
    pub fn init(
        &mut self,
        ctx: &CallContext,
        owner_id: Option<AccountId>,
        total_supply: Balance,
        metadata: Metadata,
    ) -> Result<()> {
        if self.root.is_some() {
            return Err(Error::AlreadyInitialized);
        }

        let owner_id = owner_id.unwrap_or_else(|| ctx.caller.clone());
        let root = ContractRoot {
            owner_id: owner_id.clone(),
            total_supply,
            metadata,
            bytes_for_longest_account_id: AccountId::MAX_LENGTH as u64 + BALANCE_RECORD_BYTES,
        };

        self.register_account(&owner_id)?;
        self.deposit(&owner_id, total_supply)?;
        self.store.put_root(&root)?;
        self.root = Some(root);

        FtEvent::Mint {
            account_id: &owner_id,
            amount: total_supply,
            memo: Some("Initial token supply is minted"),
        }
        .emit();
        self.metrics.mints_total.inc();

        tracing::info!(owner_id = %owner_id, total_supply = %total_supply, "Contract initialized");
        Ok(())
    }

    /* STORAGE MANAGEMENT */

    /// Fixed registration cost: `min == max == byte cost × bytes for the
    /// longest admissible account id`
    pub fn storage_balance_bounds(&self) -> Result<StorageBalanceBounds> {
        let required = self.storage_byte_cost
            * NativeAmount::from(self.root()?.bytes_for_longest_account_id);
        Ok(StorageBalanceBounds {
            min: required,
            max: required,
        })
    }

    /// Storage balance of a registered account; `None` if unregistered.
    /// `available` is always 0 since storage cannot be overpaid.
    pub fn storage_balance_of(&self, account_id: &AccountId) -> Result<Option<StorageBalance>> {
        if self.store.contains_account(account_id)? {
            let bounds = self.storage_balance_bounds()?;
            Ok(Some(StorageBalance {
                total: bounds.min,
                available: 0,
            }))
        } else {
            Ok(None)
        }
    }

    /// Admit an account into the balance store against the attached payment.
    ///
    /// An already-registered target gets the full payment back; otherwise the
    /// payment must cover the minimum bound and only the excess is refunded.
    /// The environment pays `refund` back to the caller.
    pub fn storage_deposit(
        &mut self,
        ctx: &CallContext,
        account_id: Option<AccountId>,
        registration_only: Option<bool>,
    ) -> Result<StorageDeposit> {
        // Accepted for interface compatibility, not consulted.
        let _ = registration_only;

        let bounds = self.storage_balance_bounds()?;
        let account_id = account_id.unwrap_or_else(|| ctx.caller.clone());
        let attached = ctx.attached_payment;

        let refund = if self.store.contains_account(&account_id)? {
            tracing::info!(
                account_id = %account_id,
                "The account is already registered, refunding the deposit"
            );
            attached
        } else {
            if attached < bounds.min {
                return Err(Error::InsufficientStoragePayment {
                    attached,
                    minimum: bounds.min,
                });
            }
            self.register_account(&account_id)?;
            attached - bounds.min
        };

        Ok(StorageDeposit {
            balance: StorageBalance {
                total: bounds.min,
                available: 0,
            },
            refund,
        })
    }

    /* FT CORE VIEWS */

    /// Token metadata
    pub fn ft_metadata(&self) -> Result<Metadata> {
        Ok(self.root()?.metadata.clone())
    }

    /// Total token supply
    pub fn ft_total_supply(&self) -> Result<Balance> {
        Ok(self.root()?.total_supply)
    }

    /// Balance of the account, 0 if unregistered
    pub fn ft_balance_of(&self, account_id: &AccountId) -> Result<Balance> {
        self.balance_of(account_id)
    }

    /* CUSTOM VIEWS */

    /// Token name
    pub fn name(&self) -> Result<String> {
        Ok(self.root()?.metadata.name.clone())
    }

    /// Contract owner
    pub fn owner(&self) -> Result<AccountId> {
        Ok(self.root()?.owner_id.clone())
    }

    /// Token symbol
    pub fn symbol(&self) -> Result<String> {
        Ok(self.root()?.metadata.symbol.clone())
    }

    /// Display decimals
    pub fn decimals(&self) -> Result<u8> {
        Ok(self.root()?.metadata.decimals)
    }

    /* ADMIN OPERATIONS */

    /// Create `amount` new tokens in `account_id`. Owner-only.
    pub fn mint(
        &mut self,
        ctx: &CallContext,
        account_id: &AccountId,
        amount: Balance,
        memo: Option<&str>,
    ) -> Result<()> {
        let new_supply = {
            let root = self.root()?;
            if ctx.caller != root.owner_id {
                return Err(Error::UnauthorizedCaller(ctx.caller.clone()));
            }
            root.total_supply
                .checked_add(amount)
                .ok_or_else(|| Error::BalanceOverflow {
                    account: account_id.clone(),
                    amount,
                })?
        };

        self.deposit(account_id, amount)?;
        self.root_mut()?.total_supply = new_supply;
        self.store.put_root(self.root()?)?;

        FtEvent::Mint {
            account_id,
            amount,
            memo,
        }
        .emit();
        self.metrics.mints_total.inc();

        tracing::info!(account_id = %account_id, amount = %amount, "Tokens minted");
        Ok(())
    }

    /// Destroy `amount` tokens from the caller's own account. A relayed call
    /// (`caller != signer`) may not burn on the signer's behalf.
    pub fn burn(&mut self, ctx: &CallContext, amount: Balance, memo: Option<&str>) -> Result<()> {
        if ctx.caller != ctx.signer {
            return Err(Error::UnauthorizedCaller(ctx.caller.clone()));
        }

        let current_supply = self.root()?.total_supply;
        self.withdraw(&ctx.caller, amount)?;

        // withdraw bounds `amount` by the caller's balance, which is itself
        // bounded by the supply
        self.root_mut()?.total_supply = current_supply.saturating_sub(amount);
        self.store.put_root(self.root()?)?;

        FtEvent::Burn {
            account_id: &ctx.caller,
            amount,
            memo,
        }
        .emit();
        self.metrics.burns_total.inc();

        tracing::info!(account_id = %ctx.caller, amount = %amount, "Tokens burned");
        Ok(())
    }
}
