//! Failure normalization and classification.
//!
//! Wallet and transport failures are converted into [`RawFailure`] at the
//! boundary, then [`classify`] maps them onto the closed
//! `UserRejected | ContractRevert | ProviderError` set. Revert data is decoded
//! against the `BatchSwapToUSDC` error ABI, then `Error(string)` and
//! `Panic(uint256)`. Raw revert bytes never reach the user.

use alloy::primitives::{Bytes, B256, U256};
use alloy::sol_types::{Panic, Revert, SolError, SolInterface};
use alloy::transports::TransportError;
use thiserror::Error;
use tracing::debug;

use crate::constants::EIP1193_USER_REJECTED;
use crate::errors::SwapError;
use crate::execution::contracts::IBatchSwapToUSDC::IBatchSwapToUSDCErrors;

/// Reason surfaced when revert data is present but cannot be decoded.
pub const UNDECODABLE_REVERT: &str = "could not decode error";

/// Reason surfaced when a mined receipt reports `status == 0`.
pub const REVERTED_ON_CHAIN: &str = "TransactionReverted";

/// A wallet or transport failure, normalized but not yet classified.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RawFailure {
    /// The wallet reported an explicit user rejection.
    #[error("request rejected by wallet: {message}")]
    Rejected { message: String },

    /// JSON-RPC or transport failure. `revert_data` is set when the node
    /// returned execution-revert data.
    #[error("{message}")]
    Rpc {
        code: Option<i64>,
        message: String,
        revert_data: Option<Bytes>,
    },

    /// The transaction was mined with `status == 0`.
    #[error("transaction {tx_hash} reverted on-chain")]
    RevertedOnChain { tx_hash: B256 },
}

impl RawFailure {
    /// Transport-level failure with no code and no revert data.
    pub fn network(message: impl Into<String>) -> Self {
        Self::Rpc {
            code: None,
            message: message.into(),
            revert_data: None,
        }
    }

    /// Execution revert carrying `data`, as returned by `eth_call` or
    /// `eth_estimateGas`.
    pub fn revert(data: impl Into<Bytes>) -> Self {
        Self::Rpc {
            code: Some(3),
            message: "execution reverted".into(),
            revert_data: Some(data.into()),
        }
    }

    /// Normalize an Alloy transport error.
    pub fn from_transport(err: &TransportError) -> Self {
        match err.as_error_resp() {
            Some(payload) => Self::Rpc {
                code: Some(payload.code),
                message: payload.message.to_string(),
                revert_data: payload.as_revert_data(),
            },
            None => Self::network(err.to_string()),
        }
    }
}

impl From<TransportError> for RawFailure {
    fn from(err: TransportError) -> Self {
        Self::from_transport(&err)
    }
}

/// Classify a failed step. Runs once per failure and never panics.
pub fn classify(failure: &RawFailure) -> SwapError {
    match failure {
        RawFailure::Rejected { .. } => SwapError::UserRejected,
        RawFailure::Rpc { code, message, .. } if is_user_rejection(*code, message) => {
            SwapError::UserRejected
        }
        RawFailure::Rpc {
            revert_data: Some(data),
            ..
        } => SwapError::ContractRevert {
            reason: decode_revert_reason(data),
        },
        RawFailure::Rpc { message, .. } => SwapError::ProviderError {
            message: message.clone(),
        },
        RawFailure::RevertedOnChain { .. } => SwapError::ContractRevert {
            reason: REVERTED_ON_CHAIN.into(),
        },
    }
}

/// Wallets signal rejection with EIP-1193 code 4001; some only say so in the
/// message.
fn is_user_rejection(code: Option<i64>, message: &str) -> bool {
    if code == Some(EIP1193_USER_REJECTED) {
        return true;
    }
    let lower = message.to_lowercase();
    lower.contains("user rejected") || lower.contains("user denied")
}

/// Decode revert data to a symbolic reason.
///
/// Tries, in order:
/// - `BatchSwapToUSDC` custom errors → the error name (e.g. `InvalidNonce`).
/// - `Error(string)` (0x08c379a0) → the revert message.
/// - `Panic(uint256)` (0x4e487b71) → a description of the panic code.
///
/// Anything else, including empty or truncated data, yields
/// [`UNDECODABLE_REVERT`].
pub fn decode_revert_reason(data: &[u8]) -> String {
    if data.len() < 4 {
        return UNDECODABLE_REVERT.into();
    }

    if let Ok(err) = IBatchSwapToUSDCErrors::abi_decode(data) {
        return contract_error_name(&err).into();
    }

    if let Ok(revert) = Revert::abi_decode(data) {
        if revert.reason.is_empty() {
            return UNDECODABLE_REVERT.into();
        }
        return revert.reason;
    }

    if let Ok(panic) = Panic::abi_decode(data) {
        return panic_reason(panic.code);
    }

    debug!(data = %hex::encode(data), "unrecognized revert data");
    UNDECODABLE_REVERT.into()
}

fn contract_error_name(err: &IBatchSwapToUSDCErrors) -> &'static str {
    use IBatchSwapToUSDCErrors as E;
    match err {
        E::DeadlineExpired(_) => "DeadlineExpired",
        E::InvalidSignature(_) => "InvalidSignature",
        E::InvalidNonce(_) => "InvalidNonce",
        E::EmptyBatch(_) => "EmptyBatch",
        E::LengthMismatch(_) => "LengthMismatch",
        E::ZeroAmount(_) => "ZeroAmount",
        E::UnsupportedToken(_) => "UnsupportedToken",
        E::TransferFailed(_) => "TransferFailed",
        E::SwapFailed(_) => "SwapFailed",
        E::InsufficientOutput(_) => "InsufficientOutput",
    }
}

fn panic_reason(code: U256) -> String {
    match code.saturating_to::<u64>() {
        0x01 => "Panic: assertion failed".into(),
        0x11 => "Panic: arithmetic overflow/underflow".into(),
        0x12 => "Panic: division by zero".into(),
        0x21 => "Panic: enum conversion out of range".into(),
        0x22 => "Panic: incorrectly encoded storage byte array".into(),
        0x31 => "Panic: pop on empty array".into(),
        0x32 => "Panic: array index out of bounds".into(),
        0x41 => "Panic: too much memory allocated".into(),
        0x51 => "Panic: called zero-initialized function pointer".into(),
        _ => format!("Panic(0x{code:x})"),
    }
}
