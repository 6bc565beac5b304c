pub mod types;
pub mod validate;

pub use types::*;

use anyhow::{Context, Result};
use std::path::Path;
use std::str::FromStr;
use tracing::info;

/// Load and merge all config JSON files into a single [`BatchSwapConfig`],
/// then apply environment variable overrides and validate.
///
/// Expected directory layout:
/// ```text
/// config/
///   app.json
///   chains/8453.json
///   timing.json
///   swap.json
/// ```
///
/// # Environment variable overrides
///
/// | Env Var                        | Config Field                       |
/// |--------------------------------|------------------------------------|
/// | `BASE_RPC_URL_HTTP`            | `chain.rpc.http_url`               |
/// | `BATCH_SWAP_CONTRACT_ADDRESS`  | `chain.contracts.batch_swap`       |
/// | `SWAP_DEADLINE_SECONDS`        | `timing.deadline_seconds`          |
/// | `CONFIRMATION_TIMEOUT_SECONDS` | `timing.confirmation_timeout_seconds` |
/// | `SWAP_ALLOW_UNPROTECTED`       | `swap.slippage.allow_unprotected`  |
pub fn load_config(config_dir: &Path) -> Result<BatchSwapConfig> {
    let read = |name: &str| -> Result<String> {
        let path = config_dir.join(name);
        std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read config file: {}", path.display()))
    };

    let app: AppConfig = serde_json::from_str(&read("app.json")?).context("parsing app.json")?;

    let chain: ChainConfig =
        serde_json::from_str(&read("chains/8453.json")?).context("parsing chains/8453.json")?;

    let timing: TimingConfig =
        serde_json::from_str(&read("timing.json")?).context("parsing timing.json")?;

    let swap: SwapConfig = serde_json::from_str(&read("swap.json")?).context("parsing swap.json")?;

    let mut config = BatchSwapConfig {
        app,
        chain,
        timing,
        swap,
    };

    apply_env_overrides(&mut config);
    validate::validate_config(&config)?;

    Ok(config)
}

// ---------------------------------------------------------------------------
// Environment variable overrides
// ---------------------------------------------------------------------------

/// Apply environment variable overrides to the loaded config.
///
/// Only non-empty env vars take effect. Parse failures are skipped and the
/// JSON value remains.
fn apply_env_overrides(config: &mut BatchSwapConfig) {
    if let Some(val) = env_string("BASE_RPC_URL_HTTP") {
        info!("env override: BASE_RPC_URL_HTTP");
        config.chain.rpc.http_url = val;
    }

    if let Some(val) = env_string("BATCH_SWAP_CONTRACT_ADDRESS") {
        info!("env override: BATCH_SWAP_CONTRACT_ADDRESS");
        config.chain.contracts.batch_swap = val;
    }

    if let Some(val) = env_parse::<u64>("SWAP_DEADLINE_SECONDS") {
        info!(val, "env override: SWAP_DEADLINE_SECONDS");
        config.timing.deadline_seconds = val;
    }

    if let Some(val) = env_parse::<u64>("CONFIRMATION_TIMEOUT_SECONDS") {
        info!(val, "env override: CONFIRMATION_TIMEOUT_SECONDS");
        config.timing.confirmation_timeout_seconds = val;
    }

    if let Some(val) = env_bool("SWAP_ALLOW_UNPROTECTED") {
        info!(allow_unprotected = val, "env override: SWAP_ALLOW_UNPROTECTED");
        config.swap.slippage.allow_unprotected = val;
    }
}

/// Read a non-empty env var as a `String`.
fn env_string(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

/// Read a non-empty env var as a bool (`true`, `1`, `yes` → true).
fn env_bool(key: &str) -> Option<bool> {
    env_string(key).map(|v| matches!(v.to_lowercase().as_str(), "true" | "1" | "yes"))
}

/// Read a non-empty env var and parse it as `T`.
fn env_parse<T: FromStr>(key: &str) -> Option<T> {
    env_string(key).and_then(|v| v.parse().ok())
}
