pub mod status;
pub mod swap;
pub mod units;

pub use status::SwapStatus;
pub use swap::{SelectedToken, SwapInput, SwapOrder};
