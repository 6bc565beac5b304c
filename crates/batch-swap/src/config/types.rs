use serde::Deserialize;
use std::collections::HashMap;

use crate::constants::{
    DEFAULT_CONFIRMATION_TIMEOUT_SECONDS, DEFAULT_DEADLINE_SECONDS, DEFAULT_RECEIPT_POLL_MILLIS,
};

// ---------------------------------------------------------------------------
// Top-level aggregate
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct BatchSwapConfig {
    pub app: AppConfig,
    pub chain: ChainConfig,
    pub timing: TimingConfig,
    pub swap: SwapConfig,
}

// ---------------------------------------------------------------------------
// app.json
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub log_dir: String,
    #[serde(default = "default_log_file")]
    pub file_name: String,
}

fn default_log_file() -> String {
    "batch-swap.log".into()
}

// ---------------------------------------------------------------------------
// chains/<id>.json
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct ChainConfig {
    pub chain_id: u64,
    pub chain_name: String,
    pub rpc: RpcConfig,
    pub contracts: ContractAddresses,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RpcConfig {
    pub http_url: String,
}

/// Addresses are kept as strings here and checked by validation.
#[derive(Debug, Clone, Deserialize)]
pub struct ContractAddresses {
    pub batch_swap: String,
    pub usdc: String,
}

// ---------------------------------------------------------------------------
// timing.json
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct TimingConfig {
    /// Signed deadline is `now + deadline_seconds`.
    #[serde(default = "default_deadline_seconds")]
    pub deadline_seconds: u64,
    #[serde(default = "default_confirmation_timeout_seconds")]
    pub confirmation_timeout_seconds: u64,
    #[serde(default = "default_receipt_poll_interval_ms")]
    pub receipt_poll_interval_ms: u64,
    pub call_timeout_seconds: u64,
}

fn default_deadline_seconds() -> u64 {
    DEFAULT_DEADLINE_SECONDS
}

fn default_confirmation_timeout_seconds() -> u64 {
    DEFAULT_CONFIRMATION_TIMEOUT_SECONDS
}

fn default_receipt_poll_interval_ms() -> u64 {
    DEFAULT_RECEIPT_POLL_MILLIS
}

// ---------------------------------------------------------------------------
// swap.json
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct SwapConfig {
    pub slippage: SlippageConfig,
    pub preflight: PreflightConfig,
    pub simulate_before_submit: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SlippageConfig {
    /// Accept `minAmountOut = 0` when no floors are configured.
    pub allow_unprotected: bool,
    /// Token address → minimum USDC out, in raw units (decimal string).
    #[serde(default)]
    pub min_amount_out: HashMap<String, String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PreflightConfig {
    pub enabled: bool,
}
