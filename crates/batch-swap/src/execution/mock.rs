//! In-memory chain and wallet for unit tests.
//!
//! `MockChain` answers `nonces`, `balanceOf`, `allowance` and simulates
//! `batchSwapToUSDC`: it checks the nonce and, when an expected deadline is
//! configured, recovers the signer from the EIP-712 digest the same way the
//! deployed contract does.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use alloy::primitives::{b256, Address, Bytes, Signature, B256, U256};
use alloy::rpc::types::TransactionRequest;
use alloy::signers::local::PrivateKeySigner;
use alloy::signers::SignerSync;
use alloy::sol_types::{SolCall, SolError, SolStruct};
use async_trait::async_trait;
use tokio::sync::Notify;

use crate::constants::{BASE_CHAIN_ID, BATCH_SWAP_CONTRACT};
use crate::errors::SwapError;
use crate::execution::classifier::RawFailure;
use crate::execution::contracts::{BatchSwap, IBatchSwapToUSDC, IERC20};
use crate::execution::payload::{signing_domain, Eip712Payload};
use crate::execution::transport::{ChainTransport, ReceiptStatus};
use crate::execution::wallet::WalletSession;

const TEST_KEY: B256 = b256!("4c0883a69102937d6231471b5dbb6204fe5129617082792ae468d01a3f362318");

fn word(value: U256) -> Bytes {
    Bytes::from(value.to_be_bytes::<32>().to_vec())
}

#[derive(Default)]
struct ChainState {
    nonces: HashMap<Address, U256>,
    /// (token, owner)
    balances: HashMap<(Address, Address), U256>,
    /// (token, owner); spender is always the batch-swap contract
    allowances: HashMap<(Address, Address), U256>,
    receipts: HashMap<B256, ReceiptStatus>,
    read_failure: Option<String>,
    output_override: Option<Bytes>,
    swap_revert: Option<Bytes>,
    expected_deadline: Option<U256>,
    revert_on_chain: bool,
    hold_receipts: bool,
    executed: Vec<IBatchSwapToUSDC::batchSwapToUSDCCall>,
    tx_counter: u64,
}

pub(crate) struct MockChain {
    chain_id: u64,
    contract: Address,
    state: Mutex<ChainState>,
    pub(crate) calls: AtomicUsize,
    pub(crate) receipt_polls: AtomicUsize,
}

impl MockChain {
    pub(crate) fn new() -> Self {
        Self {
            chain_id: BASE_CHAIN_ID,
            contract: BATCH_SWAP_CONTRACT,
            state: Mutex::new(ChainState::default()),
            calls: AtomicUsize::new(0),
            receipt_polls: AtomicUsize::new(0),
        }
    }

    pub(crate) fn set_nonce(&self, user: Address, nonce: U256) {
        self.state.lock().unwrap().nonces.insert(user, nonce);
    }

    pub(crate) fn nonce_of(&self, user: Address) -> U256 {
        self.state
            .lock()
            .unwrap()
            .nonces
            .get(&user)
            .copied()
            .unwrap_or_default()
    }

    pub(crate) fn set_balance(&self, token: Address, owner: Address, amount: U256) {
        self.state
            .lock()
            .unwrap()
            .balances
            .insert((token, owner), amount);
    }

    pub(crate) fn set_allowance(&self, token: Address, owner: Address, amount: U256) {
        self.state
            .lock()
            .unwrap()
            .allowances
            .insert((token, owner), amount);
    }

    /// Every subsequent `eth_call` fails with a network error.
    pub(crate) fn fail_reads(&self, message: &str) {
        self.state.lock().unwrap().read_failure = Some(message.to_string());
    }

    /// Every subsequent `eth_call` returns `output` verbatim.
    pub(crate) fn override_call_output(&self, output: Vec<u8>) {
        self.state.lock().unwrap().output_override = Some(output.into());
    }

    /// Swap simulation and execution revert with `data`.
    pub(crate) fn revert_swaps_with(&self, data: Vec<u8>) {
        self.state.lock().unwrap().swap_revert = Some(data.into());
    }

    /// Verify swap signatures against this deadline.
    pub(crate) fn expect_deadline(&self, deadline: U256) {
        self.state.lock().unwrap().expected_deadline = Some(deadline);
    }

    /// Swaps are accepted but mined with `status == 0`.
    pub(crate) fn revert_on_chain(&self) {
        self.state.lock().unwrap().revert_on_chain = true;
    }

    /// Swaps are accepted but never mined.
    pub(crate) fn hold_receipts(&self) {
        self.state.lock().unwrap().hold_receipts = true;
    }

    pub(crate) fn executed(&self) -> Vec<IBatchSwapToUSDC::batchSwapToUSDCCall> {
        self.state.lock().unwrap().executed.clone()
    }

    fn run_swap(
        &self,
        state: &ChainState,
        data: &[u8],
    ) -> Result<IBatchSwapToUSDC::batchSwapToUSDCCall, RawFailure> {
        if let Some(revert) = &state.swap_revert {
            return Err(RawFailure::revert(revert.clone()));
        }

        let call = IBatchSwapToUSDC::batchSwapToUSDCCall::abi_decode(data)
            .map_err(|e| RawFailure::network(format!("bad calldata: {e}")))?;

        if call.orders.is_empty() {
            return Err(RawFailure::revert(IBatchSwapToUSDC::EmptyBatch {}.abi_encode()));
        }

        let expected = state.nonces.get(&call.user).copied().unwrap_or_default();
        if call.nonce != expected {
            return Err(RawFailure::revert(
                IBatchSwapToUSDC::InvalidNonce {
                    expected,
                    provided: call.nonce,
                }
                .abi_encode(),
            ));
        }

        if let Some(deadline) = state.expected_deadline {
            let message = BatchSwap {
                tokens: call.orders.iter().map(|o| o.tokenIn).collect(),
                amounts: call.orders.iter().map(|o| o.amountIn).collect(),
                deadline,
            };
            let digest = message.eip712_signing_hash(&signing_domain(self.chain_id, self.contract));
            let signer = Signature::try_from(&call.signature[..])
                .ok()
                .and_then(|sig| sig.recover_address_from_prehash(&digest).ok());
            if signer != Some(call.user) {
                return Err(RawFailure::revert(
                    IBatchSwapToUSDC::InvalidSignature {}.abi_encode(),
                ));
            }
        }

        Ok(call)
    }

    /// Mine a swap transaction: verify, bump the nonce, record a receipt.
    fn execute(&self, tx: &TransactionRequest) -> Result<B256, RawFailure> {
        let data = tx.input.input().cloned().unwrap_or_default();
        let mut state = self.state.lock().unwrap();
        let call = self.run_swap(&state, &data)?;

        let next = call.nonce + U256::from(1u64);
        state.nonces.insert(call.user, next);
        state.tx_counter += 1;
        let tx_hash = B256::from(U256::from(0xab00_0000u64 + state.tx_counter));

        if !state.hold_receipts {
            let success = !state.revert_on_chain;
            let block = 1_000 + state.tx_counter;
            state.receipts.insert(
                tx_hash,
                ReceiptStatus {
                    tx_hash,
                    success,
                    block_number: Some(block),
                    gas_used: 180_000,
                },
            );
        }
        state.executed.push(call);
        Ok(tx_hash)
    }
}

#[async_trait]
impl ChainTransport for MockChain {
    async fn call(&self, tx: TransactionRequest) -> Result<Bytes, RawFailure> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let state = self.state.lock().unwrap();
        if let Some(message) = &state.read_failure {
            return Err(RawFailure::network(message.clone()));
        }
        if let Some(output) = &state.output_override {
            return Ok(output.clone());
        }

        let data = tx.input.input().cloned().unwrap_or_default();
        if data.len() < 4 {
            return Err(RawFailure::network("calldata too short"));
        }
        let selector: [u8; 4] = [data[0], data[1], data[2], data[3]];

        if selector == IBatchSwapToUSDC::noncesCall::SELECTOR {
            let call = IBatchSwapToUSDC::noncesCall::abi_decode(&data)
                .map_err(|e| RawFailure::network(e.to_string()))?;
            let nonce = state.nonces.get(&call.user).copied().unwrap_or_default();
            return Ok(word(nonce));
        }

        if selector == IERC20::balanceOfCall::SELECTOR {
            let call = IERC20::balanceOfCall::abi_decode(&data)
                .map_err(|e| RawFailure::network(e.to_string()))?;
            let token = tx.to.and_then(|k| k.to().copied()).unwrap_or_default();
            let balance = state
                .balances
                .get(&(token, call.account))
                .copied()
                .unwrap_or_default();
            return Ok(word(balance));
        }

        if selector == IERC20::allowanceCall::SELECTOR {
            let call = IERC20::allowanceCall::abi_decode(&data)
                .map_err(|e| RawFailure::network(e.to_string()))?;
            let token = tx.to.and_then(|k| k.to().copied()).unwrap_or_default();
            let allowance = if call.spender == self.contract {
                state
                    .allowances
                    .get(&(token, call.owner))
                    .copied()
                    .unwrap_or_default()
            } else {
                U256::ZERO
            };
            return Ok(word(allowance));
        }

        if selector == IBatchSwapToUSDC::batchSwapToUSDCCall::SELECTOR {
            self.run_swap(&state, &data)?;
            return Ok(Bytes::new());
        }

        Err(RawFailure::revert(Vec::<u8>::new()))
    }

    async fn transaction_receipt(&self, tx_hash: B256) -> Result<Option<ReceiptStatus>, RawFailure> {
        self.receipt_polls.fetch_add(1, Ordering::SeqCst);
        Ok(self.state.lock().unwrap().receipts.get(&tx_hash).copied())
    }
}

/// Wallet backed by a fixed test key that sends into a [`MockChain`].
pub(crate) struct MockWallet {
    chain: Arc<MockChain>,
    signer: PrivateKeySigner,
    reject: bool,
    disconnected: bool,
    send_failure: Option<RawFailure>,
    signing_gate: Option<Arc<Notify>>,
    pub(crate) sign_calls: AtomicUsize,
    pub(crate) send_calls: AtomicUsize,
}

impl MockWallet {
    pub(crate) fn new(chain: impl Into<Arc<MockChain>>) -> Self {
        Self {
            chain: chain.into(),
            signer: PrivateKeySigner::from_bytes(&TEST_KEY).unwrap(),
            reject: false,
            disconnected: false,
            send_failure: None,
            signing_gate: None,
            sign_calls: AtomicUsize::new(0),
            send_calls: AtomicUsize::new(0),
        }
    }

    pub(crate) fn address() -> Address {
        PrivateKeySigner::from_bytes(&TEST_KEY).unwrap().address()
    }

    /// The user declines every signature request.
    pub(crate) fn rejecting(mut self) -> Self {
        self.reject = true;
        self
    }

    pub(crate) fn disconnected(mut self) -> Self {
        self.disconnected = true;
        self
    }

    pub(crate) fn failing_sends(mut self, failure: RawFailure) -> Self {
        self.send_failure = Some(failure);
        self
    }

    /// Signing suspends until the returned handle is notified.
    pub(crate) fn gated(mut self) -> (Self, Arc<Notify>) {
        let gate = Arc::new(Notify::new());
        self.signing_gate = Some(gate.clone());
        (self, gate)
    }

    pub(crate) fn chain(&self) -> &Arc<MockChain> {
        &self.chain
    }
}

#[async_trait]
impl WalletSession for MockWallet {
    fn signing_account(&self) -> Result<Address, SwapError> {
        if self.disconnected {
            return Err(SwapError::WalletUnavailable {
                reason: "no wallet session".into(),
            });
        }
        Ok(self.signer.address())
    }

    async fn sign_typed_data(&self, payload: &Eip712Payload) -> Result<Signature, RawFailure> {
        self.sign_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.signing_gate {
            gate.notified().await;
        }
        if self.reject {
            return Err(RawFailure::Rejected {
                message: "User rejected the request.".into(),
            });
        }
        self.signer
            .sign_hash_sync(&payload.signing_hash())
            .map_err(|e| RawFailure::network(e.to_string()))
    }

    async fn send_transaction(&self, tx: TransactionRequest) -> Result<B256, RawFailure> {
        self.send_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(failure) = &self.send_failure {
            return Err(failure.clone());
        }
        self.chain.execute(&tx)
    }
}
