use thiserror::Error;

use crate::pool::types::{PoolAccountRef, PoolSide};

/// Errors surfaced by a polling session.
#[derive(Error, Debug)]
pub enum PollError {
    /// One of the three balance reads in a cycle failed. The cycle publishes nothing.
    #[error("Balance lookup failed for {side} account {account}: {source}")]
    LookupFailure {
        side: PoolSide,
        account: PoolAccountRef,
        #[source]
        source: anyhow::Error,
    },

    /// A cycle finished after its session was stopped.
    #[error("Poll session {0} was disposed before the result arrived")]
    SessionDisposed(uuid::Uuid),

    #[error("Invalid poll period: {0} ms (must be > 0)")]
    InvalidPeriod(u128),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AccountRefError {
    #[error("Account address is empty")]
    Empty,

    #[error("Account address has invalid length {0} (expected 32-44 chars)")]
    InvalidLength(usize),

    #[error("Account address contains non-base58 character {0:?}")]
    InvalidCharacter(char),

    #[error("Account address is not valid base58: {0}")]
    Undecodable(String),

    #[error("Account address decodes to {0} bytes (expected 32)")]
    InvalidKeyLength(usize),
}

/// Failures talking to the Solana JSON-RPC endpoint.
#[derive(Error, Debug)]
pub enum RpcError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("RPC endpoint returned HTTP {0}")]
    Status(reqwest::StatusCode),

    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("Invalid RPC response: {0}")]
    InvalidResponse(String),
}

impl From<serde_json::Error> for RpcError {
    fn from(err: serde_json::Error) -> Self {
        RpcError::InvalidResponse(err.to_string())
    }
}

#[derive(Error, Debug)]
pub enum NewsError {
    #[error("News API key is not configured")]
    MissingApiKey,

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("News API error {code}: {message}")]
    Api { code: String, message: String },
}
