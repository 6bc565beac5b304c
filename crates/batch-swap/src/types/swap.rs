use alloy::primitives::{Address, U256};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::SwapError;
use crate::execution::contracts::IBatchSwapToUSDC;
use crate::types::units::to_raw_amount;

/// One token the user wants converted, in raw token units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapInput {
    pub token_in: Address,
    pub amount_in: U256,
}

impl SwapInput {
    pub fn new(token_in: Address, amount_in: U256) -> Self {
        Self {
            token_in,
            amount_in,
        }
    }
}

/// On-chain expansion of a [`SwapInput`] with its slippage floor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapOrder {
    pub token_in: Address,
    pub amount_in: U256,
    pub min_amount_out: U256,
}

impl SwapOrder {
    pub fn from_input(input: &SwapInput, min_amount_out: U256) -> Self {
        Self {
            token_in: input.token_in,
            amount_in: input.amount_in,
            min_amount_out,
        }
    }
}

impl From<&SwapOrder> for IBatchSwapToUSDC::SwapOrder {
    fn from(order: &SwapOrder) -> Self {
        Self {
            tokenIn: order.token_in,
            amountIn: order.amount_in,
            minAmountOut: order.min_amount_out,
        }
    }
}

/// A token picked from the user's balance list, in human units.
///
/// This is the shape the CLI reads from its inputs file.
#[derive(Debug, Clone, Deserialize)]
pub struct SelectedToken {
    pub token: Address,
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(with = "rust_decimal::serde::str")]
    pub amount: Decimal,
    pub decimals: u8,
}

impl SelectedToken {
    /// Scale to raw units. Fails on zero amounts or excess precision.
    pub fn to_input(&self) -> Result<SwapInput, SwapError> {
        let amount_in = to_raw_amount(self.amount, self.decimals).map_err(|e| match e {
            SwapError::Validation(msg) => SwapError::Validation(format!(
                "{}: {msg}",
                self.symbol.as_deref().unwrap_or("token")
            )),
            other => other,
        })?;
        Ok(SwapInput::new(self.token, amount_in))
    }
}
