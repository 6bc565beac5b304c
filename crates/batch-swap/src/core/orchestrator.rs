//! Batch-swap orchestrator.
//!
//! Sequences one attempt through
//! `Idle → Resolving → Building → Signing → Submitting → Confirming →
//! Succeeded`, with any failure exiting to `Failed`. Each attempt reads a
//! fresh nonce and requests a fresh signature; nothing is retried. Status
//! transitions are published on a `watch` channel.
//!
//! Signing and confirmation are the two suspension points and both observe a
//! [`CancellationToken`]. Cancelling while confirming does not withdraw the
//! transaction, so that outcome is indeterminate.

use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use alloy::primitives::{Address, B256, U256};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::config::BatchSwapConfig;
use crate::errors::SwapError;
use crate::execution::nonce::NonceResolver;
use crate::execution::payload::build_payload_for_inputs;
use crate::execution::preflight::check_funds;
use crate::execution::signing::sign_payload;
use crate::execution::slippage::SlippagePolicy;
use crate::execution::submitter::{BatchSwapCall, BatchSwapSubmitter};
use crate::execution::transport::ChainTransport;
use crate::execution::wallet::WalletSession;
use crate::types::{SwapInput, SwapStatus};

/// Resolved, typed settings for the orchestrator.
#[derive(Debug, Clone)]
pub struct SwapSettings {
    pub chain_id: u64,
    pub contract: Address,
    pub deadline_window: Duration,
    pub confirmation_timeout: Duration,
    pub poll_interval: Duration,
    pub slippage: SlippagePolicy,
    pub preflight: bool,
    pub simulate: bool,
}

impl SwapSettings {
    pub fn from_config(config: &BatchSwapConfig) -> Result<Self, SwapError> {
        let contract = Address::from_str(&config.chain.contracts.batch_swap).map_err(|e| {
            SwapError::Config(format!(
                "chain.contracts.batch_swap '{}': {e}",
                config.chain.contracts.batch_swap
            ))
        })?;

        Ok(Self {
            chain_id: config.chain.chain_id,
            contract,
            deadline_window: Duration::from_secs(config.timing.deadline_seconds),
            confirmation_timeout: Duration::from_secs(config.timing.confirmation_timeout_seconds),
            poll_interval: Duration::from_millis(config.timing.receipt_poll_interval_ms),
            slippage: SlippagePolicy::from_config(&config.swap.slippage)?,
            preflight: config.swap.preflight.enabled,
            simulate: config.swap.simulate_before_submit,
        })
    }
}

/// Clears the in-flight flag when the attempt ends, however it ends.
struct InFlightGuard<'a>(&'a AtomicBool);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Drives batch-swap attempts for one wallet session.
pub struct SwapOrchestrator<W, T> {
    wallet: W,
    transport: T,
    settings: SwapSettings,
    nonce_resolver: NonceResolver,
    submitter: BatchSwapSubmitter,
    status_tx: watch::Sender<SwapStatus>,
    in_flight: AtomicBool,
}

impl<W, T> SwapOrchestrator<W, T>
where
    W: WalletSession,
    T: ChainTransport,
{
    pub fn new(wallet: W, transport: T, settings: SwapSettings) -> Self {
        let (status_tx, _) = watch::channel(SwapStatus::Idle);
        Self {
            nonce_resolver: NonceResolver::new(settings.contract),
            submitter: BatchSwapSubmitter::new(
                settings.contract,
                settings.confirmation_timeout,
                settings.poll_interval,
            ),
            wallet,
            transport,
            settings,
            status_tx,
            in_flight: AtomicBool::new(false),
        }
    }

    /// Receive every status transition from now on.
    pub fn subscribe(&self) -> watch::Receiver<SwapStatus> {
        self.status_tx.subscribe()
    }

    pub fn status(&self) -> SwapStatus {
        self.status_tx.borrow().clone()
    }

    /// Run one attempt with the configured deadline window.
    pub async fn swap_to_usdc(&self, inputs: &[SwapInput]) -> Result<B256, SwapError> {
        self.swap_to_usdc_cancellable(inputs, &CancellationToken::new())
            .await
    }

    pub async fn swap_to_usdc_cancellable(
        &self,
        inputs: &[SwapInput],
        cancel: &CancellationToken,
    ) -> Result<B256, SwapError> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();
        let deadline = U256::from(now.saturating_add(self.settings.deadline_window.as_secs()));
        self.swap_with_deadline(inputs, deadline, cancel).await
    }

    /// Run one attempt signing over an explicit absolute `deadline`.
    ///
    /// A concurrent call on the same orchestrator is refused with
    /// `SwapError::Validation` and leaves the running attempt untouched.
    pub async fn swap_with_deadline(
        &self,
        inputs: &[SwapInput],
        deadline: U256,
        cancel: &CancellationToken,
    ) -> Result<B256, SwapError> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_err()
        {
            warn!("rejected swap request: a swap is already in flight");
            return Err(SwapError::Validation("a swap is already in flight".into()));
        }
        let _guard = InFlightGuard(&self.in_flight);

        match self.run(inputs, deadline, cancel).await {
            Ok(tx_hash) => {
                self.publish(SwapStatus::Succeeded { tx_hash });
                Ok(tx_hash)
            }
            Err(err) => {
                log_failure(&err);
                self.publish(SwapStatus::Failed(err.clone()));
                Err(err)
            }
        }
    }

    async fn run(
        &self,
        inputs: &[SwapInput],
        deadline: U256,
        cancel: &CancellationToken,
    ) -> Result<B256, SwapError> {
        validate_inputs(inputs)?;

        // -- Resolving -------------------------------------------------------
        self.publish(SwapStatus::Resolving);
        let signer = self.wallet.signing_account()?;
        let nonce = self
            .nonce_resolver
            .get_nonce(&self.transport, signer)
            .await?;

        if self.settings.preflight {
            check_funds(&self.transport, self.settings.contract, signer, inputs).await?;
        }

        // -- Building --------------------------------------------------------
        self.publish(SwapStatus::Building);
        let orders = self.settings.slippage.orders_for(inputs)?;
        let payload = build_payload_for_inputs(
            inputs,
            deadline,
            self.settings.chain_id,
            self.settings.contract,
        )?;

        // -- Signing ---------------------------------------------------------
        self.publish(SwapStatus::Signing);
        let signature = tokio::select! {
            _ = cancel.cancelled() => {
                return Err(SwapError::Cancelled { stage: "signing" });
            }
            result = sign_payload(&self.wallet, &payload, signer) => result?,
        };

        // -- Submitting ------------------------------------------------------
        self.publish(SwapStatus::Submitting);
        let call = BatchSwapCall {
            orders,
            user: signer,
            nonce,
            signature,
        };
        if self.settings.simulate {
            self.submitter.simulate(&self.transport, &call).await?;
        }
        let tx_hash = self.submitter.submit(&self.wallet, &call).await?;

        // -- Confirming ------------------------------------------------------
        self.publish(SwapStatus::Confirming { tx_hash });
        tokio::select! {
            _ = cancel.cancelled() => {
                warn!(%tx_hash, "stopped waiting for confirmation; transaction may still land");
                Err(SwapError::Cancelled { stage: "confirming" })
            }
            result = self.submitter.await_confirmation(&self.transport, tx_hash) => {
                result.map(|receipt| receipt.tx_hash)
            }
        }
    }

    fn publish(&self, status: SwapStatus) {
        info!(stage = status.stage(), "swap status: {status}");
        self.status_tx.send_replace(status);
    }
}

fn validate_inputs(inputs: &[SwapInput]) -> Result<(), SwapError> {
    if inputs.is_empty() {
        return Err(SwapError::Validation("no tokens selected".into()));
    }
    if let Some(zero) = inputs.iter().find(|i| i.amount_in.is_zero()) {
        return Err(SwapError::Validation(format!(
            "amount for {} must be positive",
            zero.token_in
        )));
    }
    Ok(())
}

fn log_failure(err: &SwapError) {
    match err {
        SwapError::Validation(_) => warn!(kind = err.kind(), error = %err, "swap request rejected"),
        e if e.is_expected() => info!(kind = err.kind(), "{err}"),
        e if e.is_indeterminate() => {
            warn!(kind = err.kind(), error = %err, "swap outcome indeterminate")
        }
        _ => error!(kind = err.kind(), error = %err, "swap failed"),
    }
}
