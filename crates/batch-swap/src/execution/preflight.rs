//! Balance and allowance checks before the user is asked to sign.
//!
//! Duplicate tokens in one batch are summed: the contract pulls each order
//! separately, so the owner needs the total.

use std::collections::BTreeMap;

use alloy::network::TransactionBuilder;
use alloy::primitives::{Address, U256};
use alloy::rpc::types::TransactionRequest;
use alloy::sol_types::SolCall;
use tracing::debug;

use crate::errors::SwapError;
use crate::execution::classifier::classify;
use crate::execution::contracts::IERC20;
use crate::execution::transport::ChainTransport;
use crate::types::SwapInput;

/// Verify `owner` holds and has approved `spender` for every input.
pub async fn check_funds<T>(
    transport: &T,
    spender: Address,
    owner: Address,
    inputs: &[SwapInput],
) -> Result<(), SwapError>
where
    T: ChainTransport + ?Sized,
{
    let mut required: BTreeMap<Address, U256> = BTreeMap::new();
    for input in inputs {
        let total = required.entry(input.token_in).or_default();
        *total = total.checked_add(input.amount_in).ok_or_else(|| {
            SwapError::Validation(format!("amount overflow for {}", input.token_in))
        })?;
    }

    for (token, required) in required {
        let available = read_u256(
            transport,
            token,
            IERC20::balanceOfCall { account: owner }.abi_encode(),
        )
        .await?;
        if available < required {
            return Err(SwapError::InsufficientBalance {
                token,
                required,
                available,
            });
        }

        let allowance = read_u256(
            transport,
            token,
            IERC20::allowanceCall { owner, spender }.abi_encode(),
        )
        .await?;
        if allowance < required {
            return Err(SwapError::InsufficientAllowance {
                token,
                required,
                allowance,
            });
        }

        debug!(%token, %required, %available, %allowance, "preflight ok");
    }

    Ok(())
}

async fn read_u256<T>(transport: &T, token: Address, calldata: Vec<u8>) -> Result<U256, SwapError>
where
    T: ChainTransport + ?Sized,
{
    let tx = TransactionRequest::default()
        .with_to(token)
        .with_input(calldata);
    let output = transport.call(tx).await.map_err(|e| classify(&e))?;
    if output.len() < 32 {
        return Err(SwapError::ProviderError {
            message: format!("short return data from {token}"),
        });
    }
    Ok(U256::from_be_slice(&output[..32]))
}
