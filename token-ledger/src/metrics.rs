//! Prometheus metrics for the token ledger
//!
//! Collectors are registered on a per-instance [`Registry`] rather than the
//! process-global one, so several contract instances can coexist in a single
//! process (tests open many).

use prometheus::{IntCounter, Registry};
use std::sync::Arc;

/// Metrics collector
#[derive(Clone)]
pub struct Metrics {
    /// Accounts registered
    pub registrations_total: IntCounter,

    /// Completed transfers, including refund transfers
    pub transfers_total: IntCounter,

    /// Transfer-call chains initiated
    pub transfer_calls_total: IntCounter,

    /// Refunds applied by the resolution step
    pub refunds_total: IntCounter,

    /// Mint operations
    pub mints_total: IntCounter,

    /// Burn operations
    pub burns_total: IntCounter,

    /// Prometheus registry
    registry: Arc<Registry>,
}

impl Metrics {
    /// Create a collector with its own registry
    pub fn new() -> prometheus::Result<Self> {
        let registry = Arc::new(Registry::new());

        let registrations_total =
            IntCounter::new("token_registrations_total", "Accounts registered")?;
        registry.register(Box::new(registrations_total.clone()))?;

        let transfers_total = IntCounter::new(
            "token_transfers_total",
            "Completed transfers, including refund transfers",
        )?;
        registry.register(Box::new(transfers_total.clone()))?;

        let transfer_calls_total = IntCounter::new(
            "token_transfer_calls_total",
            "Transfer-call chains initiated",
        )?;
        registry.register(Box::new(transfer_calls_total.clone()))?;

        let refunds_total = IntCounter::new(
            "token_refunds_total",
            "Refunds applied by the resolution step",
        )?;
        registry.register(Box::new(refunds_total.clone()))?;

        let mints_total = IntCounter::new("token_mints_total", "Mint operations")?;
        registry.register(Box::new(mints_total.clone()))?;

        let burns_total = IntCounter::new("token_burns_total", "Burn operations")?;
        registry.register(Box::new(burns_total.clone()))?;

        Ok(Self {
            registrations_total,
            transfers_total,
            transfer_calls_total,
            refunds_total,
            mints_total,
            burns_total,
            registry,
        })
    }

    /// Get metrics registry
    pub fn registry(&self) -> &Registry {
        &self.registry
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new().expect("Failed to create metrics")
    }
}
