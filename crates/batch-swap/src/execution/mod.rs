pub mod classifier;
pub mod contracts;
pub mod nonce;
pub mod payload;
pub mod preflight;
pub mod signing;
pub mod slippage;
pub mod submitter;
pub mod transport;
pub mod wallet;

#[cfg(test)]
pub(crate) mod mock;
