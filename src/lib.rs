pub mod config;
pub mod error;
pub mod format;
pub mod news;
pub mod panel;
pub mod pool;
pub mod poller;
pub mod simulation;

pub use error::PollError;
pub use poller::{LivePoolBalancePoller, PollHandle, PoolWatcher};
