use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::{debug, trace};

use super::api::AccountReader;
use super::types::{PoolAccountRef, TokenAmount};
use crate::config::RpcConfig;
use crate::error::RpcError;

#[derive(Debug, Deserialize)]
struct RpcEnvelope<T> {
    result: Option<T>,
    error: Option<RpcErrorBody>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorBody {
    code: i64,
    message: String,
}

/// `{"context": {...}, "value": ...}` wrapper used by account queries
#[derive(Debug, Deserialize)]
struct Contextual<T> {
    value: T,
}

/// Solana JSON-RPC backed [`AccountReader`].
pub struct RpcBalanceReader {
    http_client: reqwest::Client,
    url: String,
    commitment: String,
    next_id: AtomicU64,
}

impl RpcBalanceReader {
    pub fn new(config: &RpcConfig) -> Result<Self, RpcError> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .tcp_nodelay(true)
            .pool_max_idle_per_host(8)
            .build()?;

        Ok(Self {
            http_client,
            url: config.url.clone(),
            commitment: config.commitment.clone(),
            next_id: AtomicU64::new(1),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// `getTokenAccountBalance` for one account
    pub async fn fetch_balance(&self, account: &PoolAccountRef) -> Result<TokenAmount, RpcError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let request_body = serde_json::json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": "getTokenAccountBalance",
            "params": [
                account.as_str(),
                { "commitment": self.commitment }
            ]
        });

        trace!("RPC #{} getTokenAccountBalance {}", id, account);

        let response = self
            .http_client
            .post(&self.url)
            .json(&request_body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(RpcError::Status(response.status()));
        }

        let body = response.text().await?;
        let amount = parse_balance_response(&body)?;
        debug!("Balance {} = {:?}", account, amount.ui_amount_string);
        Ok(amount)
    }
}

#[async_trait]
impl AccountReader for RpcBalanceReader {
    async fn get_token_account_balance(&self, account: &PoolAccountRef) -> Result<TokenAmount> {
        Ok(self.fetch_balance(account).await?)
    }
}

/// Decode a `getTokenAccountBalance` response body.
pub fn parse_balance_response(body: &str) -> Result<TokenAmount, RpcError> {
    let envelope: RpcEnvelope<Contextual<TokenAmount>> = serde_json::from_str(body)?;

    if let Some(err) = envelope.error {
        return Err(RpcError::Rpc {
            code: err.code,
            message: err.message,
        });
    }

    envelope
        .result
        .map(|r| r.value)
        .ok_or_else(|| RpcError::InvalidResponse("missing result".to_string()))
}
