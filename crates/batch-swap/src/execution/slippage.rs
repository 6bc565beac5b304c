//! Per-order `minAmountOut` floors.
//!
//! With no floors the batch is submitted unprotected (`minAmountOut == 0`),
//! which exposes it to sandwiching. That mode must be opted into explicitly
//! and is logged on every attempt.

use std::collections::HashMap;
use std::str::FromStr;

use alloy::primitives::{Address, U256};
use tracing::warn;

use crate::config::types::SlippageConfig;
use crate::errors::SwapError;
use crate::types::{SwapInput, SwapOrder};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlippagePolicy {
    /// Every order carries `minAmountOut = 0`.
    Unprotected,
    /// USDC floor per input token. Every token in a batch must have one.
    Floors(HashMap<Address, U256>),
}

impl SlippagePolicy {
    pub fn from_config(config: &SlippageConfig) -> Result<Self, SwapError> {
        if !config.min_amount_out.is_empty() {
            let mut floors = HashMap::with_capacity(config.min_amount_out.len());
            for (token, floor) in &config.min_amount_out {
                let token = Address::from_str(token)
                    .map_err(|e| SwapError::Config(format!("bad floor token '{token}': {e}")))?;
                let floor = U256::from_str(floor)
                    .map_err(|e| SwapError::Config(format!("bad floor for {token}: {e}")))?;
                floors.insert(token, floor);
            }
            return Ok(Self::Floors(floors));
        }
        if config.allow_unprotected {
            Ok(Self::Unprotected)
        } else {
            Err(SwapError::Config(
                "no minAmountOut floors configured and allow_unprotected is false".into(),
            ))
        }
    }

    /// Expand inputs into on-chain orders, preserving order.
    pub fn orders_for(&self, inputs: &[SwapInput]) -> Result<Vec<SwapOrder>, SwapError> {
        match self {
            Self::Unprotected => {
                warn!(
                    orders = inputs.len(),
                    "submitting batch with minAmountOut = 0 (no slippage protection)"
                );
                Ok(inputs
                    .iter()
                    .map(|i| SwapOrder::from_input(i, U256::ZERO))
                    .collect())
            }
            Self::Floors(floors) => inputs
                .iter()
                .map(|i| match floors.get(&i.token_in) {
                    Some(floor) => Ok(SwapOrder::from_input(i, *floor)),
                    None => Err(SwapError::Validation(format!(
                        "no minAmountOut floor configured for {}",
                        i.token_in
                    ))),
                })
                .collect(),
        }
    }
}
