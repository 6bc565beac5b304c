//! Submission client: encodes `batchSwapToUSDC`, sends it through the
//! wallet and polls for the receipt.
//!
//! There is no automatic resubmission. A confirmation timeout leaves the
//! outcome indeterminate and is reported with the transaction hash.

use std::time::Duration;

use alloy::network::TransactionBuilder;
use alloy::primitives::{Address, Bytes, Signature, B256, U256};
use alloy::rpc::types::TransactionRequest;
use alloy::sol_types::SolCall;
use tracing::{debug, info, warn};

use crate::errors::SwapError;
use crate::execution::classifier::{classify, RawFailure};
use crate::execution::contracts::IBatchSwapToUSDC;
use crate::execution::transport::{ChainTransport, ReceiptStatus};
use crate::execution::wallet::WalletSession;
use crate::types::SwapOrder;

/// Arguments of one `batchSwapToUSDC` call, in ABI order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchSwapCall {
    pub orders: Vec<SwapOrder>,
    pub user: Address,
    pub nonce: U256,
    pub signature: Signature,
}

impl BatchSwapCall {
    pub fn calldata(&self) -> Bytes {
        IBatchSwapToUSDC::batchSwapToUSDCCall {
            orders: self.orders.iter().map(Into::into).collect(),
            user: self.user,
            nonce: self.nonce,
            signature: Bytes::copy_from_slice(&self.signature.as_bytes()),
        }
        .abi_encode()
        .into()
    }
}

pub struct BatchSwapSubmitter {
    contract: Address,
    confirmation_timeout: Duration,
    poll_interval: Duration,
}

impl BatchSwapSubmitter {
    pub fn new(contract: Address, confirmation_timeout: Duration, poll_interval: Duration) -> Self {
        Self {
            contract,
            confirmation_timeout,
            poll_interval,
        }
    }

    pub fn build_request(&self, call: &BatchSwapCall) -> TransactionRequest {
        TransactionRequest::default()
            .with_from(call.user)
            .with_to(self.contract)
            .with_input(call.calldata())
    }

    /// Dry-run the exact call via `eth_call` from the signer.
    pub async fn simulate<T>(&self, transport: &T, call: &BatchSwapCall) -> Result<(), SwapError>
    where
        T: ChainTransport + ?Sized,
    {
        match transport.call(self.build_request(call)).await {
            Ok(_) => {
                debug!(user = %call.user, nonce = %call.nonce, "batch swap simulation succeeded");
                Ok(())
            }
            Err(failure) => {
                let err = classify(&failure);
                warn!(user = %call.user, error = %err, "batch swap simulation failed");
                Err(err)
            }
        }
    }

    /// Send the call from the wallet's account. Returns once the node has
    /// accepted the transaction.
    pub async fn submit<W>(&self, wallet: &W, call: &BatchSwapCall) -> Result<B256, SwapError>
    where
        W: WalletSession + ?Sized,
    {
        let tx = self.build_request(call);
        let tx_hash = wallet
            .send_transaction(tx)
            .await
            .map_err(|failure| classify(&failure))?;

        info!(
            %tx_hash,
            user = %call.user,
            nonce = %call.nonce,
            orders = call.orders.len(),
            "batch swap submitted"
        );
        Ok(tx_hash)
    }

    /// Poll for a receipt until mined or until the confirmation timeout.
    ///
    /// `status == 0` maps to `ContractRevert`; a timeout to
    /// `SwapError::Timeout`. The timeout bounds the whole wait, including a
    /// receipt request that never returns. Poll-level RPC errors are logged
    /// and polling continues.
    pub async fn await_confirmation<T>(
        &self,
        transport: &T,
        tx_hash: B256,
    ) -> Result<ReceiptStatus, SwapError>
    where
        T: ChainTransport + ?Sized,
    {
        let poll = async {
            loop {
                match transport.transaction_receipt(tx_hash).await {
                    Ok(Some(receipt)) => return receipt,
                    Ok(None) => {}
                    Err(e) => {
                        warn!(error = %e, %tx_hash, "receipt poll error, retrying");
                    }
                }
                tokio::time::sleep(self.poll_interval).await;
            }
        };

        let receipt = tokio::time::timeout(self.confirmation_timeout, poll)
            .await
            .map_err(|_| SwapError::Timeout {
                tx_hash,
                timeout_seconds: self.confirmation_timeout.as_secs(),
            })?;

        if !receipt.success {
            return Err(classify(&RawFailure::RevertedOnChain { tx_hash }));
        }
        info!(
            %tx_hash,
            block = ?receipt.block_number,
            gas_used = receipt.gas_used,
            "batch swap confirmed"
        );
        Ok(receipt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{BASE_CHAIN_ID, BATCH_SWAP_CONTRACT};
    use crate::execution::contracts::IBatchSwapToUSDC::{batchSwapToUSDCCall, InvalidNonce};
    use crate::execution::mock::{MockChain, MockWallet};
    use crate::execution::payload::build_payload;
    use alloy::primitives::address;
    use alloy::sol_types::SolError;
    use std::sync::atomic::Ordering;
    use std::sync::Arc;

    const TOKEN_A: Address = address!("aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa1");
    const DEADLINE: u64 = 1_700_003_600;

    fn submitter(timeout_ms: u64) -> BatchSwapSubmitter {
        BatchSwapSubmitter::new(
            BATCH_SWAP_CONTRACT,
            Duration::from_millis(timeout_ms),
            Duration::from_millis(5),
        )
    }

    async fn signed_call(wallet: &MockWallet, nonce: u64) -> BatchSwapCall {
        let amount = U256::from(1_000_000u64);
        let payload = build_payload(
            &[TOKEN_A],
            &[amount],
            U256::from(DEADLINE),
            BASE_CHAIN_ID,
            BATCH_SWAP_CONTRACT,
        )
        .unwrap();
        BatchSwapCall {
            orders: vec![SwapOrder {
                token_in: TOKEN_A,
                amount_in: amount,
                min_amount_out: U256::ZERO,
            }],
            user: wallet.signing_account().unwrap(),
            nonce: U256::from(nonce),
            signature: wallet.sign_typed_data(&payload).await.unwrap(),
        }
    }

    fn setup() -> (Arc<MockChain>, MockWallet) {
        let chain = Arc::new(MockChain::new());
        chain.expect_deadline(U256::from(DEADLINE));
        let wallet = MockWallet::new(chain.clone());
        (chain, wallet)
    }

    #[tokio::test]
    async fn calldata_preserves_argument_order() {
        let (_, wallet) = setup();
        let call = signed_call(&wallet, 3).await;
        let decoded = batchSwapToUSDCCall::abi_decode(&call.calldata()).unwrap();
        assert_eq!(decoded.orders.len(), 1);
        assert_eq!(decoded.orders[0].tokenIn, TOKEN_A);
        assert_eq!(decoded.orders[0].amountIn, U256::from(1_000_000u64));
        assert_eq!(decoded.orders[0].minAmountOut, U256::ZERO);
        assert_eq!(decoded.user, call.user);
        assert_eq!(decoded.nonce, U256::from(3u64));
        assert_eq!(decoded.signature.len(), 65);
    }

    #[tokio::test]
    async fn submit_and_confirm() {
        let (chain, wallet) = setup();
        let call = signed_call(&wallet, 0).await;
        let submitter = submitter(1_000);

        submitter.simulate(&*chain, &call).await.unwrap();
        let tx_hash = submitter.submit(&wallet, &call).await.unwrap();
        let receipt = submitter
            .await_confirmation(&*chain, tx_hash)
            .await
            .unwrap();

        assert_eq!(receipt.tx_hash, tx_hash);
        assert!(receipt.success);
        assert_eq!(chain.nonce_of(call.user), U256::from(1u64));
    }

    #[tokio::test]
    async fn replayed_signature_fails_on_consumed_nonce() {
        let (_, wallet) = setup();
        let call = signed_call(&wallet, 0).await;
        let submitter = submitter(1_000);

        submitter.submit(&wallet, &call).await.unwrap();
        let err = submitter.submit(&wallet, &call).await.unwrap_err();
        assert_eq!(
            err,
            SwapError::ContractRevert {
                reason: "InvalidNonce".into()
            }
        );
        assert_eq!(wallet.send_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn simulation_surfaces_revert_without_sending() {
        let (chain, wallet) = setup();
        chain.revert_swaps_with(
            InvalidNonce {
                expected: U256::from(4u64),
                provided: U256::ZERO,
            }
            .abi_encode(),
        );
        let call = signed_call(&wallet, 0).await;
        let err = submitter(1_000)
            .simulate(&*chain, &call)
            .await
            .unwrap_err();
        assert_eq!(
            err,
            SwapError::ContractRevert {
                reason: "InvalidNonce".into()
            }
        );
        assert_eq!(wallet.send_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn tampered_signature_is_rejected_by_contract() {
        let (chain, wallet) = setup();
        let mut call = signed_call(&wallet, 0).await;
        call.orders[0].amount_in = U256::from(2_000_000u64);
        let err = submitter(1_000)
            .simulate(&*chain, &call)
            .await
            .unwrap_err();
        assert_eq!(
            err,
            SwapError::ContractRevert {
                reason: "InvalidSignature".into()
            }
        );
    }

    #[tokio::test]
    async fn status_zero_receipt_is_contract_revert() {
        let (chain, wallet) = setup();
        chain.revert_on_chain();
        let call = signed_call(&wallet, 0).await;
        let submitter = submitter(1_000);
        let tx_hash = submitter.submit(&wallet, &call).await.unwrap();
        let err = submitter
            .await_confirmation(&*chain, tx_hash)
            .await
            .unwrap_err();
        assert_eq!(
            err,
            SwapError::ContractRevert {
                reason: "TransactionReverted".into()
            }
        );
    }

    #[tokio::test]
    async fn unmined_transaction_times_out_with_hash() {
        let (chain, wallet) = setup();
        chain.hold_receipts();
        let call = signed_call(&wallet, 0).await;
        let submitter = submitter(40);
        let tx_hash = submitter.submit(&wallet, &call).await.unwrap();
        let err = submitter
            .await_confirmation(&*chain, tx_hash)
            .await
            .unwrap_err();
        assert!(matches!(err, SwapError::Timeout { tx_hash: h, .. } if h == tx_hash));
        assert!(err.is_indeterminate());
        assert!(chain.receipt_polls.load(Ordering::SeqCst) > 1);
    }

    /// Receipt lookups that never return.
    struct StalledReceipts;

    #[async_trait::async_trait]
    impl ChainTransport for StalledReceipts {
        async fn call(&self, _tx: TransactionRequest) -> Result<Bytes, RawFailure> {
            Ok(Bytes::new())
        }

        async fn transaction_receipt(
            &self,
            _tx_hash: B256,
        ) -> Result<Option<ReceiptStatus>, RawFailure> {
            std::future::pending().await
        }
    }

    #[tokio::test]
    async fn stalled_receipt_request_still_times_out() {
        let tx_hash = B256::repeat_byte(0x11);
        let result = tokio::time::timeout(
            Duration::from_secs(2),
            submitter(50).await_confirmation(&StalledReceipts, tx_hash),
        )
        .await
        .expect("confirmation wait must end at its own timeout");

        assert_eq!(
            result.unwrap_err(),
            SwapError::Timeout {
                tx_hash,
                timeout_seconds: 0
            }
        );
    }

    #[tokio::test]
    async fn send_failure_without_revert_data_is_provider_error() {
        let (_, wallet) = setup();
        let wallet = wallet.failing_sends(RawFailure::network("nonce too low"));
        let call = signed_call(&wallet, 0).await;
        let err = submitter(1_000).submit(&wallet, &call).await.unwrap_err();
        assert_eq!(
            err,
            SwapError::ProviderError {
                message: "nonce too low".into()
            }
        );
    }
}
