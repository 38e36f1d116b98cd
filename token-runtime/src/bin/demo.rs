//! Scripted demo: registration, mint, transfer, and a transfer-call chain
//! against a partially consuming receiver

use std::sync::Arc;
use token_ledger::{AccountId, Config, Contract, Metadata, REQUIRED_TRANSFER_PAYMENT};
use token_runtime::{spawn_runtime, PartialReceiver};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    tracing::info!("Starting token ledger demo");

    // Load configuration, defaulting to a scratch directory
    let mut config = Config::from_env()?;
    if std::env::var("TOKEN_LEDGER_DATA_DIR").is_err() {
        config.data_dir =
            std::env::temp_dir().join(format!("token-ledger-demo-{}", std::process::id()));
    }

    let contract = Contract::open(&config)?;
    let handle = spawn_runtime(contract);

    let root = AccountId::new("root");
    let alice = AccountId::new("alice");

    // The receiving party consumes 70 of whatever it is sent
    handle.register_receiver(alice.clone(), Arc::new(PartialReceiver { unused: 30 }));

    handle
        .init(root.clone(), None, 0, Metadata::default())
        .await?;

    let bounds = handle.storage_balance_bounds().await?;
    handle
        .storage_deposit(alice.clone(), bounds.min, Some(alice.clone()), None)
        .await?;

    handle.mint(root.clone(), root.clone(), 1_000, None).await?;
    let supply = handle.ft_total_supply().await?;
    tracing::info!(supply = %supply, "Minted initial supply");

    handle
        .ft_transfer(
            root.clone(),
            REQUIRED_TRANSFER_PAYMENT,
            alice.clone(),
            100,
            Some("plain transfer".to_string()),
        )
        .await?;

    let used = handle
        .ft_transfer_call(
            root.clone(),
            REQUIRED_TRANSFER_PAYMENT,
            alice.clone(),
            100,
            None,
            "partial consumption".to_string(),
        )
        .await?;

    let root_balance = handle.ft_balance_of(root.clone()).await?;
    let alice_balance = handle.ft_balance_of(alice.clone()).await?;
    let supply_conserved = handle.verify_supply().await?;
    tracing::info!(
        used = %used,
        root_balance = %root_balance,
        alice_balance = %alice_balance,
        supply_conserved,
        "Transfer-call chain resolved"
    );

    handle.shutdown().await?;
    Ok(())
}
