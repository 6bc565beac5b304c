use alloy::primitives::{Address, B256, U256};
use thiserror::Error;

/// Typed error hierarchy for a batch-swap attempt.
///
/// Every variant is terminal for the attempt. Transport and wallet failures are
/// normalized into these variants at the boundary (see
/// [`crate::execution::classifier`]), so nothing downstream inspects raw RPC
/// error shapes. Application code (config loading, `main`) wraps with
/// `anyhow::Context` instead.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SwapError {
    // -- Caller -------------------------------------------------------------
    #[error("invalid swap request: {0}")]
    Validation(String),

    // -- Wallet -------------------------------------------------------------
    #[error("no signing session available: {reason}")]
    WalletUnavailable { reason: String },

    #[error("signing declined by user")]
    UserRejected,

    // -- Chain reads --------------------------------------------------------
    #[error("failed to read nonce for {signer}: {message}")]
    NonceReadFailure { signer: Address, message: String },

    #[error("insufficient balance of {token}: need {required}, have {available}")]
    InsufficientBalance {
        token: Address,
        required: U256,
        available: U256,
    },

    #[error("insufficient allowance for {token}: need {required}, approved {allowance}")]
    InsufficientAllowance {
        token: Address,
        required: U256,
        allowance: U256,
    },

    // -- Submission ---------------------------------------------------------
    #[error("contract reverted: {reason}")]
    ContractRevert { reason: String },

    #[error("provider error: {message}")]
    ProviderError { message: String },

    #[error("confirmation timed out after {timeout_seconds}s (tx: {tx_hash})")]
    Timeout { tx_hash: B256, timeout_seconds: u64 },

    #[error("swap cancelled while {stage}")]
    Cancelled { stage: &'static str },

    // -- Configuration ------------------------------------------------------
    #[error("configuration error: {0}")]
    Config(String),
}

impl SwapError {
    /// Stable short name of the error kind, used as a structured log field.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::WalletUnavailable { .. } => "wallet_unavailable",
            Self::UserRejected => "user_rejected",
            Self::NonceReadFailure { .. } => "nonce_read_failure",
            Self::InsufficientBalance { .. } => "insufficient_balance",
            Self::InsufficientAllowance { .. } => "insufficient_allowance",
            Self::ContractRevert { .. } => "contract_revert",
            Self::ProviderError { .. } => "provider_error",
            Self::Timeout { .. } => "timeout",
            Self::Cancelled { .. } => "cancelled",
            Self::Config(_) => "config",
        }
    }

    /// Whether the on-chain outcome is unknown: the transaction may still land.
    pub fn is_indeterminate(&self) -> bool {
        matches!(self, Self::Timeout { .. } | Self::Cancelled { stage: "confirming" })
    }

    /// Expected outcomes that should not be logged as anomalies.
    pub fn is_expected(&self) -> bool {
        matches!(self, Self::UserRejected | Self::Cancelled { .. })
    }

    /// Message suitable for end-user surfaces.
    ///
    /// Returns `None` for caller defects (`Validation`, `Config`), which must
    /// never reach end users.
    pub fn user_message(&self) -> Option<String> {
        let msg = match self {
            Self::Validation(_) | Self::Config(_) => return None,
            Self::WalletUnavailable { .. } => "Wallet not connected".to_string(),
            Self::UserRejected => "Signing declined".to_string(),
            Self::NonceReadFailure { message, .. } => {
                format!("Swap failed: could not read nonce ({message})")
            }
            Self::InsufficientBalance { token, .. } => {
                format!("Swap failed: insufficient balance of {token}")
            }
            Self::InsufficientAllowance { token, .. } => {
                format!("Swap failed: {token} is not approved for the swap contract")
            }
            Self::ContractRevert { reason } => format!("Swap failed: {reason}"),
            Self::ProviderError { message } => format!("Swap failed: {message}"),
            Self::Timeout { tx_hash, .. } => format!(
                "Swap pending: {tx_hash} was not confirmed in time, check its status before retrying"
            ),
            Self::Cancelled { .. } => "Swap cancelled".to_string(),
        };
        Some(msg)
    }
}
