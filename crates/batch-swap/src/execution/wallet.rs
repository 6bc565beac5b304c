//! Wallet session: the signing and sending side of the user's account.
//!
//! The core never reads ambient wallet state: a [`WalletSession`] value is
//! passed into every operation that needs one. [`LocalWalletSession`] backs
//! it with a local private key, signing typed data and EIP-1559 transactions
//! in-process and submitting raw bytes over HTTP.

use std::sync::Arc;

use alloy::consensus::{SignableTransaction, TxEip1559, TxEnvelope};
use alloy::eips::eip2718::Encodable2718;
use alloy::network::TransactionBuilder;
use alloy::primitives::{Address, Signature, TxKind, B256};
use alloy::providers::Provider;
use alloy::rpc::types::TransactionRequest;
use alloy::signers::local::PrivateKeySigner;
use alloy::signers::SignerSync;
use async_trait::async_trait;
use tracing::{debug, info};

use crate::errors::SwapError;
use crate::execution::classifier::RawFailure;
use crate::execution::payload::Eip712Payload;
use crate::execution::transport::HttpProvider;

#[async_trait]
pub trait WalletSession: Send + Sync {
    /// Account that signs and sends. `SwapError::WalletUnavailable` when no
    /// session is connected.
    fn signing_account(&self) -> Result<Address, SwapError>;

    /// Sign an EIP-712 payload. May suspend until the user approves or
    /// rejects.
    async fn sign_typed_data(&self, payload: &Eip712Payload) -> Result<Signature, RawFailure>;

    /// Send a transaction from the signing account. Returns once the node has
    /// accepted it into the pending pool.
    async fn send_transaction(&self, tx: TransactionRequest) -> Result<B256, RawFailure>;
}

#[async_trait]
impl<W: WalletSession + ?Sized> WalletSession for Arc<W> {
    fn signing_account(&self) -> Result<Address, SwapError> {
        (**self).signing_account()
    }

    async fn sign_typed_data(&self, payload: &Eip712Payload) -> Result<Signature, RawFailure> {
        (**self).sign_typed_data(payload).await
    }

    async fn send_transaction(&self, tx: TransactionRequest) -> Result<B256, RawFailure> {
        (**self).send_transaction(tx).await
    }
}

/// Wallet session backed by a local key.
pub struct LocalWalletSession {
    signer: PrivateKeySigner,
    provider: HttpProvider,
    chain_id: u64,
}

impl LocalWalletSession {
    pub fn new(signer: PrivateKeySigner, provider: HttpProvider, chain_id: u64) -> Self {
        info!(address = %signer.address(), chain_id, "local wallet session initialized");
        Self {
            signer,
            provider,
            chain_id,
        }
    }
}

#[async_trait]
impl WalletSession for LocalWalletSession {
    fn signing_account(&self) -> Result<Address, SwapError> {
        Ok(self.signer.address())
    }

    async fn sign_typed_data(&self, payload: &Eip712Payload) -> Result<Signature, RawFailure> {
        self.signer
            .sign_hash_sync(&payload.signing_hash())
            .map_err(|e| RawFailure::network(format!("typed-data signing failed: {e}")))
    }

    async fn send_transaction(&self, tx: TransactionRequest) -> Result<B256, RawFailure> {
        let from = self.signer.address();
        let tx = tx.with_from(from);

        let nonce = self
            .provider
            .get_transaction_count(from)
            .pending()
            .await
            .map_err(RawFailure::from)?;

        // Gas estimation executes the call, so a revert surfaces here with
        // its revert data.
        let gas_limit = match tx.gas {
            Some(gas) => gas,
            None => self
                .provider
                .estimate_gas(tx.clone())
                .await
                .map_err(RawFailure::from)?,
        };

        let fees = self
            .provider
            .estimate_eip1559_fees()
            .await
            .map_err(RawFailure::from)?;

        let unsigned = TxEip1559 {
            chain_id: self.chain_id,
            nonce,
            gas_limit,
            max_fee_per_gas: fees.max_fee_per_gas,
            max_priority_fee_per_gas: fees.max_priority_fee_per_gas,
            to: tx.to.unwrap_or(TxKind::Create),
            value: tx.value.unwrap_or_default(),
            access_list: Default::default(),
            input: tx.input.into_input().unwrap_or_default(),
        };

        let sig = self
            .signer
            .sign_hash_sync(&unsigned.signature_hash())
            .map_err(|e| RawFailure::network(format!("transaction signing failed: {e}")))?;

        let envelope = TxEnvelope::Eip1559(unsigned.into_signed(sig));
        let raw = envelope.encoded_2718();

        let pending = self
            .provider
            .send_raw_transaction(&raw)
            .await
            .map_err(RawFailure::from)?;

        debug!(
            tx_hash = %pending.tx_hash(),
            nonce,
            gas_limit,
            max_fee_per_gas = fees.max_fee_per_gas,
            "raw transaction accepted"
        );

        Ok(*pending.tx_hash())
    }
}
