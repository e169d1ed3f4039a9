use serde::{Deserialize, Serialize};
use std::env;

use crate::pool::types::{PoolAccountRef, PoolAccounts};

pub const DEFAULT_POLL_INTERVAL_MS: u64 = 15_000;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub rpc: RpcConfig,
    pub poller: PollerConfig,
    pub display: DisplayConfig,
    pub news: NewsConfig,
    pub agent: AgentConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RpcConfig {
    pub url: String,
    pub commitment: String,
    pub timeout_ms: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PollerConfig {
    pub interval_ms: u64,
    pub pool_account_a: Option<String>,
    pub pool_account_b: Option<String>,
    pub pool_lp_account: Option<String>,
    /// Swap program that owns the pool, shown in the address list only
    pub amm_program_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DisplayConfig {
    pub locale: String,
    pub explorer_cluster: String,
    pub slippage_pct: f64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NewsConfig {
    pub api_url: String,
    pub api_key: Option<String>,
    pub search_term: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AgentConfig {
    pub simulation_mode: bool,
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            url: "https://api.devnet.solana.com".to_string(),
            commitment: "confirmed".to_string(),
            timeout_ms: 4000,
        }
    }
}

impl PollerConfig {
    /// Parse the three configured pool accounts, if all are present.
    pub fn pool_accounts(&self) -> anyhow::Result<Option<PoolAccounts>> {
        match (&self.pool_account_a, &self.pool_account_b, &self.pool_lp_account) {
            (Some(a), Some(b), Some(lp)) => Ok(Some(PoolAccounts::new(
                a.parse::<PoolAccountRef>()
                    .map_err(|e| anyhow::anyhow!("POOL_ACCOUNT_A: {}", e))?,
                b.parse::<PoolAccountRef>()
                    .map_err(|e| anyhow::anyhow!("POOL_ACCOUNT_B: {}", e))?,
                lp.parse::<PoolAccountRef>()
                    .map_err(|e| anyhow::anyhow!("POOL_LP_ACCOUNT: {}", e))?,
            ))),
            (None, None, None) => Ok(None),
            _ => anyhow::bail!(
                "POOL_ACCOUNT_A, POOL_ACCOUNT_B and POOL_LP_ACCOUNT must be set together"
            ),
        }
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let rpc = RpcConfig {
            url: env::var("SOLANA_RPC_URL")
                .unwrap_or_else(|_| "https://api.devnet.solana.com".to_string()),
            commitment: env::var("RPC_COMMITMENT").unwrap_or_else(|_| "confirmed".to_string()),
            timeout_ms: env::var("RPC_TIMEOUT_MS")
                .unwrap_or_else(|_| "4000".to_string())
                .parse()
                .unwrap_or(4000),
        };

        let interval_ms = env::var("POOL_POLL_INTERVAL_MS")
            .unwrap_or_else(|_| DEFAULT_POLL_INTERVAL_MS.to_string())
            .parse()
            .unwrap_or(DEFAULT_POLL_INTERVAL_MS);
        if interval_ms == 0 {
            anyhow::bail!("POOL_POLL_INTERVAL_MS must be greater than zero");
        }

        let poller = PollerConfig {
            interval_ms,
            pool_account_a: env::var("POOL_ACCOUNT_A").ok(),
            pool_account_b: env::var("POOL_ACCOUNT_B").ok(),
            pool_lp_account: env::var("POOL_LP_ACCOUNT").ok(),
            amm_program_id: env::var("AMM_PROGRAM_ID").ok(),
        };

        let display = DisplayConfig {
            locale: env::var("DISPLAY_LOCALE").unwrap_or_else(|_| "en-US".to_string()),
            explorer_cluster: env::var("EXPLORER_CLUSTER")
                .unwrap_or_else(|_| "devnet".to_string()),
            slippage_pct: env::var("SLIPPAGE_PCT")
                .unwrap_or_else(|_| "1".to_string())
                .parse()
                .unwrap_or(1.0),
        };

        let news = NewsConfig {
            api_url: env::var("NEWS_API_URL")
                .unwrap_or_else(|_| "https://newsapi.org/v2/everything".to_string()),
            api_key: env::var("NEWS_API_KEY").ok().filter(|k| !k.is_empty()),
            search_term: env::var("NEWS_SEARCH_TERM").ok().filter(|t| !t.is_empty()),
        };

        let agent = AgentConfig {
            simulation_mode: env::var("SIMULATION_MODE")
                .unwrap_or_else(|_| "false".to_string())
                .parse()
                .unwrap_or(false),
        };

        Ok(Config {
            rpc,
            poller,
            display,
            news,
            agent,
        })
    }
}
