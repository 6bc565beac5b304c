use anyhow::{bail, Result};
use std::str::FromStr;

use alloy::primitives::U256;

use super::types::BatchSwapConfig;

/// Chains the batch-swap contract is deployed on: Base and Base Sepolia.
const SUPPORTED_CHAIN_IDS: [u64; 2] = [8453, 84532];

/// Validate invariants across the merged config that serde alone cannot enforce.
///
/// Called automatically by [`super::load_config`]. Every problem is collected
/// and reported in a single error.
pub fn validate_config(config: &BatchSwapConfig) -> Result<()> {
    let mut errors: Vec<String> = Vec::new();

    validate_chain_config(config, &mut errors);
    validate_timing_config(config, &mut errors);
    validate_swap_config(config, &mut errors);

    if errors.is_empty() {
        Ok(())
    } else {
        let msg = format!(
            "Configuration validation failed ({} error{}):\n  - {}",
            errors.len(),
            if errors.len() == 1 { "" } else { "s" },
            errors.join("\n  - ")
        );
        bail!("{msg}");
    }
}

// ---------------------------------------------------------------------------
// Chain config
// ---------------------------------------------------------------------------

fn validate_chain_config(config: &BatchSwapConfig, errors: &mut Vec<String>) {
    let chain = &config.chain;

    if !SUPPORTED_CHAIN_IDS.contains(&chain.chain_id) {
        errors.push(format!(
            "chain: chain_id must be one of {SUPPORTED_CHAIN_IDS:?}, got {}",
            chain.chain_id
        ));
    }

    if chain.rpc.http_url.is_empty() {
        errors.push("chain.rpc: http_url is empty".into());
    } else if !chain.rpc.http_url.starts_with("http://")
        && !chain.rpc.http_url.starts_with("https://")
    {
        errors.push(format!(
            "chain.rpc: http_url '{}' must be an http(s) URL",
            chain.rpc.http_url
        ));
    }

    let contract_addrs = [
        ("batch_swap", &chain.contracts.batch_swap),
        ("usdc", &chain.contracts.usdc),
    ];
    for (name, addr) in &contract_addrs {
        if let Err(e) = validate_address(addr) {
            errors.push(format!("chain.contracts.{name}: {e}"));
        }
    }
}

// ---------------------------------------------------------------------------
// Timing config
// ---------------------------------------------------------------------------

fn validate_timing_config(config: &BatchSwapConfig, errors: &mut Vec<String>) {
    let t = &config.timing;

    if t.deadline_seconds < 60 {
        errors.push(format!(
            "timing.deadline_seconds ({}) must be at least 60",
            t.deadline_seconds
        ));
    }
    if t.deadline_seconds > 86_400 {
        errors.push(format!(
            "timing.deadline_seconds ({}) must not exceed 86400",
            t.deadline_seconds
        ));
    }
    if t.confirmation_timeout_seconds == 0 {
        errors.push("timing.confirmation_timeout_seconds must be > 0".into());
    }
    if t.receipt_poll_interval_ms == 0 {
        errors.push("timing.receipt_poll_interval_ms must be > 0".into());
    } else if t.receipt_poll_interval_ms >= t.confirmation_timeout_seconds.saturating_mul(1000) {
        errors.push(format!(
            "timing.receipt_poll_interval_ms ({}) must be shorter than the confirmation timeout ({}s)",
            t.receipt_poll_interval_ms, t.confirmation_timeout_seconds
        ));
    }
    if t.call_timeout_seconds == 0 {
        errors.push("timing.call_timeout_seconds must be > 0".into());
    }
}

// ---------------------------------------------------------------------------
// Swap config
// ---------------------------------------------------------------------------

fn validate_swap_config(config: &BatchSwapConfig, errors: &mut Vec<String>) {
    let slippage = &config.swap.slippage;

    if slippage.min_amount_out.is_empty() && !slippage.allow_unprotected {
        errors.push(
            "swap.slippage: no min_amount_out floors configured; set allow_unprotected to submit with minAmountOut = 0"
                .into(),
        );
    }

    for (token, floor) in &slippage.min_amount_out {
        if let Err(e) = validate_address(token) {
            errors.push(format!("swap.slippage.min_amount_out: {e}"));
        }
        if U256::from_str(floor).is_err() {
            errors.push(format!(
                "swap.slippage.min_amount_out[{token}]: '{floor}' is not an unsigned integer"
            ));
        }
    }
}

/// Check that `addr` is a 0x-prefixed, 20-byte hex string.
fn validate_address(addr: &str) -> Result<(), String> {
    if addr.is_empty() {
        return Err("address is empty".into());
    }
    if !addr.starts_with("0x") && !addr.starts_with("0X") {
        return Err(format!("address '{addr}' must start with 0x"));
    }
    if addr.len() != 42 {
        return Err(format!(
            "address '{addr}' has length {} (expected 42)",
            addr.len()
        ));
    }
    if !addr[2..].chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(format!("address '{addr}' contains non-hex characters"));
    }
    Ok(())
}
