use anyhow::Result;
use async_trait::async_trait;

use super::types::{PoolAccountRef, TokenAmount};

/// Read access to on-chain token accounts.
///
/// Implementations are shared between sessions and must tolerate concurrent calls.
#[async_trait]
pub trait AccountReader: Send + Sync {
    /// Fetch the balance of a single token account
    async fn get_token_account_balance(&self, account: &PoolAccountRef) -> Result<TokenAmount>;
}
