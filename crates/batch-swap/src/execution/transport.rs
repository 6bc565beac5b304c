//! Chain read transport.
//!
//! [`ChainTransport`] is the read side of the chain: `eth_call` and receipt
//! lookups. [`RpcTransport`] implements it over an Alloy HTTP provider.

use std::sync::Arc;
use std::time::Duration;

use alloy::primitives::{Bytes, B256};
use alloy::providers::{Provider, RootProvider};
use alloy::rpc::types::TransactionRequest;
use async_trait::async_trait;
use tracing::debug;

use crate::execution::classifier::RawFailure;

/// Concrete provider type: Alloy HTTP provider over Ethereum network.
pub type HttpProvider = RootProvider;

/// Outcome of a mined transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReceiptStatus {
    pub tx_hash: B256,
    pub success: bool,
    pub block_number: Option<u64>,
    pub gas_used: u64,
}

#[async_trait]
pub trait ChainTransport: Send + Sync {
    /// Read-only `eth_call` at the latest block.
    async fn call(&self, tx: TransactionRequest) -> Result<Bytes, RawFailure>;

    /// `Ok(None)` while the transaction is still pending.
    async fn transaction_receipt(&self, tx_hash: B256) -> Result<Option<ReceiptStatus>, RawFailure>;
}

#[async_trait]
impl<T: ChainTransport + ?Sized> ChainTransport for Arc<T> {
    async fn call(&self, tx: TransactionRequest) -> Result<Bytes, RawFailure> {
        (**self).call(tx).await
    }

    async fn transaction_receipt(&self, tx_hash: B256) -> Result<Option<ReceiptStatus>, RawFailure> {
        (**self).transaction_receipt(tx_hash).await
    }
}

/// [`ChainTransport`] over JSON-RPC.
pub struct RpcTransport {
    provider: HttpProvider,
    /// Upper bound for a single RPC request.
    call_timeout: Duration,
}

impl RpcTransport {
    pub fn new(provider: HttpProvider, call_timeout: Duration) -> Self {
        Self {
            provider,
            call_timeout,
        }
    }
}

#[async_trait]
impl ChainTransport for RpcTransport {
    async fn call(&self, tx: TransactionRequest) -> Result<Bytes, RawFailure> {
        let provider = &self.provider;
        match tokio::time::timeout(self.call_timeout, async move { provider.call(tx).await }).await
        {
            Ok(Ok(output)) => {
                debug!(output_len = output.len(), "eth_call succeeded");
                Ok(output)
            }
            Ok(Err(e)) => Err(e.into()),
            Err(_) => Err(RawFailure::network(format!(
                "eth_call timed out after {}s",
                self.call_timeout.as_secs()
            ))),
        }
    }

    async fn transaction_receipt(&self, tx_hash: B256) -> Result<Option<ReceiptStatus>, RawFailure> {
        let provider = &self.provider;
        let receipt = match tokio::time::timeout(self.call_timeout, async move {
            provider.get_transaction_receipt(tx_hash).await
        })
        .await
        {
            Ok(result) => result?,
            Err(_) => {
                return Err(RawFailure::network(format!(
                    "eth_getTransactionReceipt timed out after {}s",
                    self.call_timeout.as_secs()
                )))
            }
        };

        Ok(receipt.map(|r| ReceiptStatus {
            tx_hash: r.transaction_hash,
            success: r.status(),
            block_number: r.block_number,
            gas_used: r.gas_used,
        }))
    }
}
