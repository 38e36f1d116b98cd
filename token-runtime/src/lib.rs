//! Execution-environment runtime for the token ledger
//!
//! The contract itself (`token-ledger`) performs no scheduling: its
//! asynchronous entry point returns a continuation descriptor. This crate is
//! the environment collaborator that makes the protocol run — a single-writer
//! actor that serializes every call, owns the contract state exclusively,
//! dispatches the scheduled receiver notification, executes receiver-issued
//! sub-operations, and invokes the resolution callback with the sub-call
//! outcome.

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

pub mod error;
pub mod receiver;
pub mod runtime;

// Re-exports
pub use error::{Error, Result};
pub use receiver::{
    FailingReceiver, GarbageReceiver, NotificationReply, PartialReceiver, ReceiverAction,
    ReceiverResponse, SinkReceiver, SpendingReceiver, TransferReceiver,
};
pub use runtime::{spawn_runtime, Runtime, RuntimeHandle, RuntimeMessage};
