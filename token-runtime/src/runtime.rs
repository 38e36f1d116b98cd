//! Single-writer runtime actor for the token ledger
//!
//! The environment half of the contract: every entry-point call is sent to
//! one actor task that owns the [`Contract`] exclusively, so calls execute
//! serialized and to completion with no interleaving. The only suspension
//! point is the transfer-call chain, which the actor drives itself:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │             RuntimeHandle (Clone)                    │
//! │        Sends messages to the actor mailbox           │
//! └─────────────────────┬────────────────────────────────┘
//!                       │ mpsc::channel (bounded)
//!                       ▼
//! ┌──────────────────────────────────────────────────────┐
//! │             Runtime (single task)                    │
//! │   owns Contract; per message:                        │
//! │     stage 1: contract call → PendingTransfer         │
//! │     notify:  receiver.on_transfer(...)               │
//! │     actions: receiver-issued sub-operations          │
//! │     stage 2: contract.ft_resolve_transfer(outcome)   │
//! └──────────────────────────────────────────────────────┘
//! ```
//!
//! The caller of `ft_transfer_call` is answered with whatever the
//! resolution step computes, matching the environment's
//! return-value-of-a-scheduled-chain semantics.

use crate::{
    error::{Error, Result},
    receiver::{NotificationReply, ReceiverAction, TransferReceiver},
};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use token_ledger::{
    AccountId, Balance, CallContext, Contract, Metadata, NativeAmount, PendingTransfer,
    StorageBalance, StorageBalanceBounds, StorageDeposit, SubCallResult,
    REQUIRED_TRANSFER_PAYMENT,
};
use tokio::sync::{mpsc, oneshot};
use uuid::Uuid;

/// Registry of notification handlers, shared between the actor and handles
type ReceiverRegistry = Arc<RwLock<HashMap<AccountId, Arc<dyn TransferReceiver>>>>;

/// Message sent to the runtime actor
pub enum RuntimeMessage {
    /// One-time contract setup
    Init {
        /// Caller identity
        caller: AccountId,
        /// Owner; defaults to the caller
        owner_id: Option<AccountId>,
        /// Initial supply credited to the owner
        total_supply: Balance,
        /// Token metadata
        metadata: Metadata,
        /// Response channel
        response: oneshot::Sender<Result<()>>,
    },

    /// Registration cost bounds
    StorageBalanceBounds {
        /// Response channel
        response: oneshot::Sender<Result<StorageBalanceBounds>>,
    },

    /// Storage balance of an account
    StorageBalanceOf {
        /// Queried account
        account_id: AccountId,
        /// Response channel
        response: oneshot::Sender<Result<Option<StorageBalance>>>,
    },

    /// Register an account against an attached payment
    StorageDeposit {
        /// Caller identity
        caller: AccountId,
        /// Attached payment
        attached: NativeAmount,
        /// Target account; defaults to the caller
        account_id: Option<AccountId>,
        /// Accepted for interface compatibility
        registration_only: Option<bool>,
        /// Response channel
        response: oneshot::Sender<Result<StorageDeposit>>,
    },

    /// Token metadata
    FtMetadata {
        /// Response channel
        response: oneshot::Sender<Result<Metadata>>,
    },

    /// Total token supply
    FtTotalSupply {
        /// Response channel
        response: oneshot::Sender<Result<Balance>>,
    },

    /// Balance of an account, 0 if unregistered
    FtBalanceOf {
        /// Queried account
        account_id: AccountId,
        /// Response channel
        response: oneshot::Sender<Result<Balance>>,
    },

    /// Synchronous transfer
    FtTransfer {
        /// Caller identity (the sender)
        caller: AccountId,
        /// Attached payment
        attached: NativeAmount,
        /// Receiving account
        receiver_id: AccountId,
        /// Amount to move
        amount: Balance,
        /// Optional note
        memo: Option<String>,
        /// Response channel
        response: oneshot::Sender<Result<()>>,
    },

    /// Transfer plus notification chain; answered with the used amount
    FtTransferCall {
        /// Caller identity (the sender)
        caller: AccountId,
        /// Attached payment
        attached: NativeAmount,
        /// Receiving account
        receiver_id: AccountId,
        /// Amount to move
        amount: Balance,
        /// Optional note
        memo: Option<String>,
        /// Message forwarded to the receiver's handler
        msg: String,
        /// Response channel
        response: oneshot::Sender<Result<Balance>>,
    },

    /// Owner-gated mint
    Mint {
        /// Caller identity
        caller: AccountId,
        /// Credited account
        account_id: AccountId,
        /// Minted amount
        amount: Balance,
        /// Optional note
        memo: Option<String>,
        /// Response channel
        response: oneshot::Sender<Result<()>>,
    },

    /// Self-gated burn
    Burn {
        /// Caller identity
        caller: AccountId,
        /// Burned amount
        amount: Balance,
        /// Optional note
        memo: Option<String>,
        /// Response channel
        response: oneshot::Sender<Result<()>>,
    },

    /// Contract owner
    Owner {
        /// Response channel
        response: oneshot::Sender<Result<AccountId>>,
    },

    /// Token name
    Name {
        /// Response channel
        response: oneshot::Sender<Result<String>>,
    },

    /// Token symbol
    Symbol {
        /// Response channel
        response: oneshot::Sender<Result<String>>,
    },

    /// Display decimals
    Decimals {
        /// Response channel
        response: oneshot::Sender<Result<u8>>,
    },

    /// Conservation check
    VerifySupply {
        /// Response channel
        response: oneshot::Sender<Result<bool>>,
    },

    /// Shutdown the actor
    Shutdown,
}

/// Actor that serializes all contract calls
pub struct Runtime {
    /// Contract state, exclusively owned
    contract: Contract,

    /// Account the contract runs inside
    account_id: AccountId,

    /// Mailbox for incoming calls
    mailbox: mpsc::Receiver<RuntimeMessage>,

    /// Notification handlers by receiver account
    receivers: ReceiverRegistry,
}

impl Runtime {
    /// Run the actor event loop
    pub async fn run(mut self) {
        while let Some(msg) = self.mailbox.recv().await {
            match msg {
                RuntimeMessage::Shutdown => break,
                msg => self.handle_message(msg),
            }
        }
    }

    /// Handle one serialized call
    fn handle_message(&mut self, msg: RuntimeMessage) {
        let call_id = Uuid::new_v4();
        let span = tracing::debug_span!("call", %call_id);
        let _guard = span.enter();

        match msg {
            RuntimeMessage::Init {
                caller,
                owner_id,
                total_supply,
                metadata,
                response,
            } => {
                let ctx = self.direct_ctx(caller, 0);
                let result = self
                    .contract
                    .init(&ctx, owner_id, total_supply, metadata)
                    .map_err(Error::from);
                let _ = response.send(result);
            }

            RuntimeMessage::StorageBalanceBounds { response } => {
                let result = self.contract.storage_balance_bounds().map_err(Error::from);
                let _ = response.send(result);
            }

            RuntimeMessage::StorageBalanceOf {
                account_id,
                response,
            } => {
                let result = self
                    .contract
                    .storage_balance_of(&account_id)
                    .map_err(Error::from);
                let _ = response.send(result);
            }

            RuntimeMessage::StorageDeposit {
                caller,
                attached,
                account_id,
                registration_only,
                response,
            } => {
                let ctx = self.direct_ctx(caller, attached);
                let result = self
                    .contract
                    .storage_deposit(&ctx, account_id, registration_only)
                    .map_err(Error::from);
                let _ = response.send(result);
            }

            RuntimeMessage::FtMetadata { response } => {
                let _ = response.send(self.contract.ft_metadata().map_err(Error::from));
            }

            RuntimeMessage::FtTotalSupply { response } => {
                let _ = response.send(self.contract.ft_total_supply().map_err(Error::from));
            }

            RuntimeMessage::FtBalanceOf {
                account_id,
                response,
            } => {
                let _ = response.send(self.contract.ft_balance_of(&account_id).map_err(Error::from));
            }

            RuntimeMessage::FtTransfer {
                caller,
                attached,
                receiver_id,
                amount,
                memo,
                response,
            } => {
                let ctx = self.direct_ctx(caller, attached);
                let result = self
                    .contract
                    .ft_transfer(&ctx, &receiver_id, amount, memo.as_deref())
                    .map_err(Error::from);
                let _ = response.send(result);
            }

            RuntimeMessage::FtTransferCall {
                caller,
                attached,
                receiver_id,
                amount,
                memo,
                msg,
                response,
            } => {
                let result =
                    self.execute_transfer_call(caller, attached, receiver_id, amount, memo, msg);
                let _ = response.send(result);
            }

            RuntimeMessage::Mint {
                caller,
                account_id,
                amount,
                memo,
                response,
            } => {
                let ctx = self.direct_ctx(caller, 0);
                let result = self
                    .contract
                    .mint(&ctx, &account_id, amount, memo.as_deref())
                    .map_err(Error::from);
                let _ = response.send(result);
            }

            RuntimeMessage::Burn {
                caller,
                amount,
                memo,
                response,
            } => {
                let ctx = self.direct_ctx(caller, 0);
                let result = self
                    .contract
                    .burn(&ctx, amount, memo.as_deref())
                    .map_err(Error::from);
                let _ = response.send(result);
            }

            RuntimeMessage::Owner { response } => {
                let _ = response.send(self.contract.owner().map_err(Error::from));
            }

            RuntimeMessage::Name { response } => {
                let _ = response.send(self.contract.name().map_err(Error::from));
            }

            RuntimeMessage::Symbol { response } => {
                let _ = response.send(self.contract.symbol().map_err(Error::from));
            }

            RuntimeMessage::Decimals { response } => {
                let _ = response.send(self.contract.decimals().map_err(Error::from));
            }

            RuntimeMessage::VerifySupply { response } => {
                let _ = response.send(self.contract.verify_supply().map_err(Error::from));
            }

            RuntimeMessage::Shutdown => {
                // Handled in the main loop
            }
        }
    }

    /// Run a full transfer-call chain: optimistic transfer, receiver
    /// notification, receiver-issued sub-operations, resolution
    fn execute_transfer_call(
        &mut self,
        caller: AccountId,
        attached: NativeAmount,
        receiver_id: AccountId,
        amount: Balance,
        memo: Option<String>,
        msg: String,
    ) -> Result<Balance> {
        let ctx = self.direct_ctx(caller, attached);
        let pending = self
            .contract
            .ft_transfer_call(&ctx, &receiver_id, amount, memo.as_deref(), &msg)?;

        let outcome = self.dispatch_notification(&ctx.signer, &pending);

        // The resolution step runs as the contract's own account; the
        // original signer is preserved through the chain.
        let resolve_ctx = CallContext {
            current_account: self.account_id.clone(),
            caller: self.account_id.clone(),
            signer: ctx.signer.clone(),
            attached_payment: 0,
        };

        let used = self.contract.ft_resolve_transfer(
            &resolve_ctx,
            &pending.sender_id,
            &pending.receiver_id,
            pending.amount,
            &outcome,
        )?;
        Ok(used)
    }

    /// Invoke the receiver's notification handler and translate its reply
    /// into the sub-call outcome the resolution step observes
    fn dispatch_notification(
        &mut self,
        signer: &AccountId,
        pending: &PendingTransfer,
    ) -> SubCallResult {
        let handler = self.receivers.read().get(&pending.receiver_id).cloned();
        let Some(handler) = handler else {
            tracing::warn!(
                receiver_id = %pending.receiver_id,
                "Receiver has no notification handler, sub-call failed"
            );
            return SubCallResult::Failed;
        };

        let response = handler.on_transfer(&pending.sender_id, pending.amount, &pending.msg);

        // Sub-operations issued by the receiver run before the chained
        // resolution step. Their failures are absorbed, not propagated.
        for action in response.actions {
            match action {
                ReceiverAction::Transfer {
                    receiver_id,
                    amount,
                    memo,
                } => {
                    let ctx = CallContext {
                        current_account: self.account_id.clone(),
                        caller: pending.receiver_id.clone(),
                        signer: signer.clone(),
                        attached_payment: REQUIRED_TRANSFER_PAYMENT,
                    };
                    if let Err(error) =
                        self.contract
                            .ft_transfer(&ctx, &receiver_id, amount, memo.as_deref())
                    {
                        tracing::warn!(
                            receiver_id = %receiver_id,
                            %error,
                            "Receiver-issued transfer failed"
                        );
                    }
                }
            }
        }

        match response.reply {
            NotificationReply::Unused(value) => {
                SubCallResult::Completed(format!("\"{}\"", value).into_bytes())
            }
            NotificationReply::Raw(payload) => SubCallResult::Completed(payload),
            NotificationReply::Failure => SubCallResult::Failed,
        }
    }

    fn direct_ctx(&self, caller: AccountId, attached: NativeAmount) -> CallContext {
        CallContext::direct(self.account_id.clone(), caller, attached)
    }
}

/// Handle for sending calls to the runtime actor
#[derive(Clone)]
pub struct RuntimeHandle {
    sender: mpsc::Sender<RuntimeMessage>,
    receivers: ReceiverRegistry,
}

impl RuntimeHandle {
    /// Install the notification handler living at `account_id`
    pub fn register_receiver(&self, account_id: AccountId, handler: Arc<dyn TransferReceiver>) {
        self.receivers.write().insert(account_id, handler);
    }

    /// One-time contract setup
    pub async fn init(
        &self,
        caller: AccountId,
        owner_id: Option<AccountId>,
        total_supply: Balance,
        metadata: Metadata,
    ) -> Result<()> {
        let (tx, rx) = oneshot::channel();
        self.send(RuntimeMessage::Init {
            caller,
            owner_id,
            total_supply,
            metadata,
            response: tx,
        })
        .await?;
        Self::receive(rx).await
    }

    /// Registration cost bounds
    pub async fn storage_balance_bounds(&self) -> Result<StorageBalanceBounds> {
        let (tx, rx) = oneshot::channel();
        self.send(RuntimeMessage::StorageBalanceBounds { response: tx })
            .await?;
        Self::receive(rx).await
    }

    /// Storage balance of an account
    pub async fn storage_balance_of(&self, account_id: AccountId) -> Result<Option<StorageBalance>> {
        let (tx, rx) = oneshot::channel();
        self.send(RuntimeMessage::StorageBalanceOf {
            account_id,
            response: tx,
        })
        .await?;
        Self::receive(rx).await
    }

    /// Register an account against an attached payment
    pub async fn storage_deposit(
        &self,
        caller: AccountId,
        attached: NativeAmount,
        account_id: Option<AccountId>,
        registration_only: Option<bool>,
    ) -> Result<StorageDeposit> {
        let (tx, rx) = oneshot::channel();
        self.send(RuntimeMessage::StorageDeposit {
            caller,
            attached,
            account_id,
            registration_only,
            response: tx,
        })
        .await?;
        Self::receive(rx).await
    }

    /// Token metadata
    pub async fn ft_metadata(&self) -> Result<Metadata> {
        let (tx, rx) = oneshot::channel();
        self.send(RuntimeMessage::FtMetadata { response: tx }).await?;
        Self::receive(rx).await
    }

    /// Total token supply
    pub async fn ft_total_supply(&self) -> Result<Balance> {
        let (tx, rx) = oneshot::channel();
        self.send(RuntimeMessage::FtTotalSupply { response: tx })
            .await?;
        Self::receive(rx).await
    }

    /// Balance of an account, 0 if unregistered
    pub async fn ft_balance_of(&self, account_id: AccountId) -> Result<Balance> {
        let (tx, rx) = oneshot::channel();
        self.send(RuntimeMessage::FtBalanceOf {
            account_id,
            response: tx,
        })
        .await?;
        Self::receive(rx).await
    }

    /// Synchronous transfer from `caller` to `receiver_id`
    pub async fn ft_transfer(
        &self,
        caller: AccountId,
        attached: NativeAmount,
        receiver_id: AccountId,
        amount: Balance,
        memo: Option<String>,
    ) -> Result<()> {
        let (tx, rx) = oneshot::channel();
        self.send(RuntimeMessage::FtTransfer {
            caller,
            attached,
            receiver_id,
            amount,
            memo,
            response: tx,
        })
        .await?;
        Self::receive(rx).await
    }

    /// Transfer plus notification chain; resolves to the used amount
    pub async fn ft_transfer_call(
        &self,
        caller: AccountId,
        attached: NativeAmount,
        receiver_id: AccountId,
        amount: Balance,
        memo: Option<String>,
        msg: String,
    ) -> Result<Balance> {
        let (tx, rx) = oneshot::channel();
        self.send(RuntimeMessage::FtTransferCall {
            caller,
            attached,
            receiver_id,
            amount,
            memo,
            msg,
            response: tx,
        })
        .await?;
        Self::receive(rx).await
    }

    /// Owner-gated mint
    pub async fn mint(
        &self,
        caller: AccountId,
        account_id: AccountId,
        amount: Balance,
        memo: Option<String>,
    ) -> Result<()> {
        let (tx, rx) = oneshot::channel();
        self.send(RuntimeMessage::Mint {
            caller,
            account_id,
            amount,
            memo,
            response: tx,
        })
        .await?;
        Self::receive(rx).await
    }

    /// Self-gated burn
    pub async fn burn(
        &self,
        caller: AccountId,
        amount: Balance,
        memo: Option<String>,
    ) -> Result<()> {
        let (tx, rx) = oneshot::channel();
        self.send(RuntimeMessage::Burn {
            caller,
            amount,
            memo,
            response: tx,
        })
        .await?;
        Self::receive(rx).await
    }

    /// Contract owner
    pub async fn owner(&self) -> Result<AccountId> {
        let (tx, rx) = oneshot::channel();
        self.send(RuntimeMessage::Owner { response: tx }).await?;
        Self::receive(rx).await
    }

    /// Token name
    pub async fn name(&self) -> Result<String> {
        let (tx, rx) = oneshot::channel();
        self.send(RuntimeMessage::Name { response: tx }).await?;
        Self::receive(rx).await
    }

    /// Token symbol
    pub async fn symbol(&self) -> Result<String> {
        let (tx, rx) = oneshot::channel();
        self.send(RuntimeMessage::Symbol { response: tx }).await?;
        Self::receive(rx).await
    }

    /// Display decimals
    pub async fn decimals(&self) -> Result<u8> {
        let (tx, rx) = oneshot::channel();
        self.send(RuntimeMessage::Decimals { response: tx }).await?;
        Self::receive(rx).await
    }

    /// Conservation check
    pub async fn verify_supply(&self) -> Result<bool> {
        let (tx, rx) = oneshot::channel();
        self.send(RuntimeMessage::VerifySupply { response: tx })
            .await?;
        Self::receive(rx).await
    }

    /// Shutdown the actor
    pub async fn shutdown(&self) -> Result<()> {
        self.sender
            .send(RuntimeMessage::Shutdown)
            .await
            .map_err(|_| Error::Concurrency("Actor mailbox closed".to_string()))
    }

    async fn send(&self, msg: RuntimeMessage) -> Result<()> {
        self.sender
            .send(msg)
            .await
            .map_err(|_| Error::Concurrency("Actor mailbox closed".to_string()))
    }

    async fn receive<T>(rx: oneshot::Receiver<Result<T>>) -> Result<T> {
        rx.await
            .map_err(|_| Error::Concurrency("Response channel closed".to_string()))?
    }
}

/// Spawn the runtime actor around a contract
pub fn spawn_runtime(contract: Contract) -> RuntimeHandle {
    let (tx, rx) = mpsc::channel(256); // Bounded channel for backpressure
    let receivers: ReceiverRegistry = Arc::new(RwLock::new(HashMap::new()));

    let actor = Runtime {
        account_id: contract.account_id().clone(),
        contract,
        mailbox: rx,
        receivers: receivers.clone(),
    };

    tokio::spawn(async move {
        actor.run().await;
    });

    RuntimeHandle {
        sender: tx,
        receivers,
    }
}
