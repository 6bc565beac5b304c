pub mod orchestrator;

pub use orchestrator::{SwapOrchestrator, SwapSettings};
