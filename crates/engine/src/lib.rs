pub mod replay;
pub mod runner;

pub use replay::{replay_depths, ReplayStats};
pub use runner::StrategyRunner;
