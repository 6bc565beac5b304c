use std::fmt;

use alloy::primitives::B256;

use crate::errors::SwapError;

/// Lifecycle of one batch-swap attempt.
///
/// `Succeeded` and `Failed` are terminal. A new attempt always starts from
/// `Idle` with a fresh nonce read and a fresh signature.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SwapStatus {
    #[default]
    Idle,
    /// Reading the signer's nonce (and balances when preflight is enabled).
    Resolving,
    Building,
    /// Waiting on the wallet. Unbounded, user-driven.
    Signing,
    Submitting,
    /// Accepted into the pending pool; waiting for the receipt.
    Confirming { tx_hash: B256 },
    Succeeded { tx_hash: B256 },
    Failed(SwapError),
}

impl SwapStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded { .. } | Self::Failed(_))
    }

    /// Stage name used in logs and in `SwapError::Cancelled`.
    pub fn stage(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Resolving => "resolving",
            Self::Building => "building",
            Self::Signing => "signing",
            Self::Submitting => "submitting",
            Self::Confirming { .. } => "confirming",
            Self::Succeeded { .. } => "succeeded",
            Self::Failed(_) => "failed",
        }
    }
}

impl fmt::Display for SwapStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "Ready"),
            Self::Resolving => write!(f, "Preparing batch swap"),
            Self::Building => write!(f, "Building signature request"),
            Self::Signing => write!(f, "Waiting for signature"),
            Self::Submitting => write!(f, "Submitting transaction"),
            Self::Confirming { tx_hash } => write!(f, "Transaction pending: {tx_hash}"),
            Self::Succeeded { tx_hash } => write!(f, "Swap confirmed: {tx_hash}"),
            Self::Failed(err) => match err.user_message() {
                Some(msg) => write!(f, "{msg}"),
                None => write!(f, "Swap failed"),
            },
        }
    }
}
