use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use alloy::primitives::Address;
use alloy::providers::RootProvider;
use alloy::signers::local::PrivateKeySigner;
use alloy::transports::http::reqwest::Url;
use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use batch_swap::config;
use batch_swap::core::{SwapOrchestrator, SwapSettings};
use batch_swap::execution::transport::RpcTransport;
use batch_swap::execution::wallet::LocalWalletSession;
use batch_swap::logging;
use batch_swap::types::{SelectedToken, SwapInput};

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Load .env file (ignore if missing).
    let _ = dotenvy::dotenv();

    let inputs_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .context("usage: batch-swap <inputs.json>")?;

    let config_dir = std::env::var("BATCH_SWAP_CONFIG_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config"));

    let config = config::load_config(&config_dir)?;

    // Dropped when main returns, flushing the file writer.
    let _guard = logging::init_tracing(&config.app.logging)?;

    info!(
        chain_id = config.chain.chain_id,
        chain_name = %config.chain.chain_name,
        contract = %config.chain.contracts.batch_swap,
        "batch-swap starting"
    );

    let usdc: Address = config
        .chain
        .contracts
        .usdc
        .parse()
        .context("failed to parse USDC address")?;
    let inputs = read_inputs(&inputs_path, usdc)?;

    let signer = init_signer()?;
    let settings = SwapSettings::from_config(&config)?;

    let rpc_url: Url = config
        .chain
        .rpc
        .http_url
        .parse()
        .context("failed to parse RPC URL")?;
    let provider = RootProvider::new_http(rpc_url);

    let wallet = LocalWalletSession::new(signer, provider.clone(), config.chain.chain_id);
    let transport = RpcTransport::new(
        provider,
        Duration::from_secs(config.timing.call_timeout_seconds),
    );
    let orchestrator = Arc::new(SwapOrchestrator::new(wallet, transport, settings));

    // Print each transition as it happens.
    let mut status_rx = orchestrator.subscribe();
    let status_printer = tokio::spawn(async move {
        while status_rx.changed().await.is_ok() {
            let status = status_rx.borrow_and_update().clone();
            println!("{status}");
            if status.is_terminal() {
                break;
            }
        }
    });

    let cancel = CancellationToken::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("interrupt received, cancelling swap");
                cancel.cancel();
            }
        }
    });

    let result = orchestrator
        .swap_to_usdc_cancellable(&inputs, &cancel)
        .await;
    let _ = status_printer.await;

    match result {
        Ok(tx_hash) => {
            info!(%tx_hash, "batch swap complete");
            println!("{tx_hash}");
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            error!(kind = e.kind(), error = %e, "batch swap did not complete");
            match e.user_message() {
                Some(msg) => eprintln!("{msg}"),
                None => eprintln!("{e}"),
            }
            Ok(ExitCode::FAILURE)
        }
    }
}

/// Read the selected tokens and scale them to raw units.
///
/// USDC itself is dropped from the batch; it is already the target.
fn read_inputs(path: &Path, usdc: Address) -> Result<Vec<SwapInput>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read inputs file: {}", path.display()))?;
    let selected: Vec<SelectedToken> =
        serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))?;

    let mut inputs = Vec::with_capacity(selected.len());
    for token in &selected {
        if token.token == usdc {
            warn!(token = %token.token, "skipping USDC in batch");
            continue;
        }
        inputs.push(token.to_input()?);
    }

    info!(selected = selected.len(), batched = inputs.len(), "inputs loaded");
    Ok(inputs)
}

fn init_signer() -> Result<PrivateKeySigner> {
    let key = std::env::var("PRIVATE_KEY")
        .ok()
        .filter(|v| !v.is_empty())
        .context("PRIVATE_KEY is required")?;
    let key = key.strip_prefix("0x").unwrap_or(&key);
    let signer = key
        .parse::<PrivateKeySigner>()
        .context("failed to parse PRIVATE_KEY")?;
    info!(address = %signer.address(), "signer initialized");
    Ok(signer)
}
