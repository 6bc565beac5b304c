use alloy::primitives::{address, Address};

// ---------------------------------------------------------------------------
// Chain
// ---------------------------------------------------------------------------

/// Base mainnet.
pub const BASE_CHAIN_ID: u64 = 8453;

/// Native USDC on Base, the swap target.
pub const USDC_BASE: Address = address!("833589fCD6eDb6E08f4c7C32D4f71b54bdA02913");

// ---------------------------------------------------------------------------
// BatchSwapToUSDC deployment
// ---------------------------------------------------------------------------

pub const BATCH_SWAP_CONTRACT: Address = address!("4A0d6ECA963Cc75c1318c79AE4830A33941C3Be5");

/// EIP-712 domain name. Must match the verifying contract's constructor.
pub const EIP712_DOMAIN_NAME: &str = "BatchSwapToUSDC";

/// EIP-712 domain version.
pub const EIP712_DOMAIN_VERSION: &str = "1";

/// Primary type of the signed message.
pub const PRIMARY_TYPE: &str = "BatchSwap";

// ---------------------------------------------------------------------------
// Timing defaults
// ---------------------------------------------------------------------------

/// Signature validity window added to the current time.
pub const DEFAULT_DEADLINE_SECONDS: u64 = 3_600;

pub const DEFAULT_CONFIRMATION_TIMEOUT_SECONDS: u64 = 120;

pub const DEFAULT_RECEIPT_POLL_MILLIS: u64 = 1_000;

// ---------------------------------------------------------------------------
// Wallet
// ---------------------------------------------------------------------------

/// EIP-1193 `userRejectedRequest` provider error code.
pub const EIP1193_USER_REJECTED: i64 = 4001;
