use anyhow::{anyhow, Result};
use async_trait::async_trait;
use rand::Rng;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tracing::{debug, info};

use crate::pool::{AccountReader, PoolAccountRef, PoolAccounts, TokenAmount};

const SIM_DECIMALS: u8 = 6;

/// In-memory stand-in for an RPC connection.
///
/// Used by `SIMULATION_MODE` and by tests: balances are set directly,
/// individual accounts can be made to fail, and every read can be delayed.
pub struct SimulatedReader {
    balances: Mutex<HashMap<PoolAccountRef, TokenAmount>>,
    failing: Mutex<HashSet<PoolAccountRef>>,
    latency: Mutex<Duration>,
    /// Max relative change applied to a balance on each read (0.02 = ±2%)
    drift: Mutex<f64>,
    calls: AtomicUsize,
}

impl SimulatedReader {
    pub fn new() -> Self {
        Self {
            balances: Mutex::new(HashMap::new()),
            failing: Mutex::new(HashSet::new()),
            latency: Mutex::new(Duration::ZERO),
            drift: Mutex::new(0.0),
            calls: AtomicUsize::new(0),
        }
    }

    /// Seed a pool with plausible reserves
    pub fn seeded(accounts: &PoolAccounts) -> Self {
        let sim = Self::new();
        sim.set_balance(&accounts.side_a, 125_000.0);
        sim.set_balance(&accounts.side_b, 98_500.5);
        sim.set_balance(&accounts.lp_supply, 110_250.0);
        info!("🎞️  Simulator seeded pool {}", accounts.lp_supply.truncated(8));
        sim
    }

    pub fn set_balance(&self, account: &PoolAccountRef, ui_amount: f64) {
        self.set_token_amount(account, TokenAmount::from_ui(ui_amount, SIM_DECIMALS));
    }

    pub fn set_token_amount(&self, account: &PoolAccountRef, amount: TokenAmount) {
        lock(&self.balances).insert(account.clone(), amount);
    }

    pub fn fail_account(&self, account: &PoolAccountRef) {
        lock(&self.failing).insert(account.clone());
    }

    pub fn recover_account(&self, account: &PoolAccountRef) {
        lock(&self.failing).remove(account);
    }

    pub fn set_latency(&self, latency: Duration) {
        *lock(&self.latency) = latency;
    }

    pub fn set_drift(&self, drift: f64) {
        *lock(&self.drift) = drift.abs();
    }

    /// Number of balance reads served or failed so far
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn apply_drift(&self, account: &PoolAccountRef) {
        let drift = *lock(&self.drift);
        if drift == 0.0 {
            return;
        }
        let mut balances = lock(&self.balances);
        if let Some(current) = balances.get_mut(account) {
            let base = current.ui_amount.unwrap_or(0.0);
            let factor = 1.0 + rand::rng().random_range(-drift..=drift);
            *current = TokenAmount::from_ui((base * factor).max(0.0), current.decimals);
        }
    }
}

impl Default for SimulatedReader {
    fn default() -> Self {
        Self::new()
    }
}

fn lock<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

#[async_trait]
impl AccountReader for SimulatedReader {
    async fn get_token_account_balance(&self, account: &PoolAccountRef) -> Result<TokenAmount> {
        let latency = *lock(&self.latency);
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
        self.calls.fetch_add(1, Ordering::SeqCst);

        if lock(&self.failing).contains(account) {
            debug!("[SIM] Injected failure for {}", account);
            return Err(anyhow!("Simulated RPC failure for {}", account));
        }

        self.apply_drift(account);
        lock(&self.balances)
            .get(account)
            .cloned()
            .ok_or_else(|| anyhow!("Account {} not found in simulation", account))
    }
}
