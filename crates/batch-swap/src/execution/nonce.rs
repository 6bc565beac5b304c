//! Nonce resolver: reads the signer's replay-protection counter from the
//! verifying contract.
//!
//! The value is read fresh for every attempt and never cached. A failed read
//! is an error, never a default of zero.

use alloy::network::TransactionBuilder;
use alloy::primitives::{Address, U256};
use alloy::rpc::types::TransactionRequest;
use alloy::sol_types::SolCall;
use tracing::debug;

use crate::errors::SwapError;
use crate::execution::contracts::IBatchSwapToUSDC;
use crate::execution::transport::ChainTransport;

pub struct NonceResolver {
    contract: Address,
}

impl NonceResolver {
    pub fn new(contract: Address) -> Self {
        Self { contract }
    }

    /// `nonces(signer)` on the verifying contract.
    pub async fn get_nonce<T>(&self, transport: &T, signer: Address) -> Result<U256, SwapError>
    where
        T: ChainTransport + ?Sized,
    {
        let calldata = IBatchSwapToUSDC::noncesCall { user: signer }.abi_encode();
        let tx = TransactionRequest::default()
            .with_to(self.contract)
            .with_input(calldata);

        let output = transport
            .call(tx)
            .await
            .map_err(|e| SwapError::NonceReadFailure {
                signer,
                message: e.to_string(),
            })?;

        let nonce = IBatchSwapToUSDC::noncesCall::abi_decode_returns(&output).map_err(|e| {
            SwapError::NonceReadFailure {
                signer,
                message: format!("malformed nonces() return data: {e}"),
            }
        })?;

        debug!(%signer, %nonce, "nonce resolved");
        Ok(nonce)
    }
}
