pub mod api;
pub mod client;
pub mod types;

pub use api::AccountReader;
pub use client::RpcBalanceReader;
pub use types::{BalanceSnapshot, PoolAccountRef, PoolAccounts, PoolBalance, PoolSide, TokenAmount};
