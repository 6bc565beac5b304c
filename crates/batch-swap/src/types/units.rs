//! Scaling human token amounts into raw on-chain units.
//!
//! Raw amounts are `U256` in the token's smallest unit. Scaling goes through
//! the `Decimal` mantissa so no precision is lost for 18-decimal tokens.

use alloy::primitives::U256;
use rust_decimal::Decimal;

use crate::errors::SwapError;

/// Largest token decimals accepted. ERC-20 tokens in practice use at most 18.
pub const MAX_TOKEN_DECIMALS: u8 = 36;

/// Scale a human amount (e.g. `1.5`) into raw token units.
///
/// Fails with `SwapError::Validation` if the amount is not strictly positive
/// or carries more fractional digits than the token supports.
pub fn to_raw_amount(amount: Decimal, decimals: u8) -> Result<U256, SwapError> {
    if amount <= Decimal::ZERO {
        return Err(SwapError::Validation(format!(
            "amount must be positive, got {amount}"
        )));
    }
    if decimals > MAX_TOKEN_DECIMALS {
        return Err(SwapError::Validation(format!(
            "token decimals {decimals} exceed {MAX_TOKEN_DECIMALS}"
        )));
    }

    let normalized = amount.normalize();
    let scale = normalized.scale();
    if scale > u32::from(decimals) {
        return Err(SwapError::Validation(format!(
            "amount {amount} has {scale} fractional digits, token supports {decimals}"
        )));
    }

    let mantissa = U256::from(normalized.mantissa().unsigned_abs());
    let factor = U256::from(10u64).pow(U256::from(u32::from(decimals) - scale));
    mantissa
        .checked_mul(factor)
        .ok_or_else(|| SwapError::Validation(format!("amount {amount} overflows uint256")))
}
