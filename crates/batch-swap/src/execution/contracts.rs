//! Compile-time ABI definitions for the batch-swap entry point via Alloy `sol!`.
//!
//! The `BatchSwap` struct is the EIP-712 message the user signs; its field
//! names, types and order are part of the signed digest and must match the
//! verifying contract byte for byte.

use alloy::sol;

// ---------------------------------------------------------------------------
// EIP-712 message
// ---------------------------------------------------------------------------

sol! {
    /// Typed-data message bound by the user's signature.
    #[derive(Debug, PartialEq, Eq)]
    struct BatchSwap {
        address[] tokens;
        uint256[] amounts;
        uint256 deadline;
    }
}

// ---------------------------------------------------------------------------
// BatchSwapToUSDC
// ---------------------------------------------------------------------------

sol! {
    /// Batch-swap entry point. Pulls each `tokenIn` from `user`, swaps to USDC
    /// and consumes `nonces[user]`.
    #[derive(Debug, PartialEq, Eq)]
    interface IBatchSwapToUSDC {
        struct SwapOrder {
            address tokenIn;
            uint256 amountIn;
            uint256 minAmountOut;
        }

        error DeadlineExpired();
        error InvalidSignature();
        error InvalidNonce(uint256 expected, uint256 provided);
        error EmptyBatch();
        error LengthMismatch();
        error ZeroAmount(address tokenIn);
        error UnsupportedToken(address tokenIn);
        error TransferFailed(address tokenIn);
        error SwapFailed(address tokenIn);
        error InsufficientOutput(address tokenIn, uint256 amountOut, uint256 minAmountOut);

        function batchSwapToUSDC(
            SwapOrder[] calldata orders,
            address user,
            uint256 nonce,
            bytes calldata signature
        ) external;

        /// Replay-protection counter, incremented on every successful batch.
        function nonces(address user) external view returns (uint256);
    }
}

// ---------------------------------------------------------------------------
// ERC-20
// ---------------------------------------------------------------------------

sol! {
    /// Subset of ERC-20 used for preflight checks.
    interface IERC20 {
        function balanceOf(address account) external view returns (uint256);
        function allowance(address owner, address spender) external view returns (uint256);
    }
}
