//! Headless model of a market's liquidity box: the latest pool balances,
//! slippage, and the addresses behind the pool.

use serde::Serialize;

use crate::error::PollError;
use crate::format::{format_balance, NumberLocale};
use crate::pool::{BalanceSnapshot, PoolAccountRef, PoolAccounts, PoolSide};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PanelRow {
    pub label: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AddressRow {
    pub label: String,
    pub address: String,
    pub short: String,
    pub explorer_url: String,
}

pub struct LiquidityPanel {
    accounts: PoolAccounts,
    amm_program: Option<PoolAccountRef>,
    locale: NumberLocale,
    explorer_cluster: String,
    slippage_pct: f64,
    latest: Option<BalanceSnapshot>,
    last_error: Option<String>,
}

impl LiquidityPanel {
    pub fn new(accounts: PoolAccounts, locale: NumberLocale) -> Self {
        Self {
            accounts,
            amm_program: None,
            locale,
            explorer_cluster: "devnet".to_string(),
            slippage_pct: 1.0,
            latest: None,
            last_error: None,
        }
    }

    pub fn with_amm_program(mut self, program: PoolAccountRef) -> Self {
        self.amm_program = Some(program);
        self
    }

    pub fn with_explorer_cluster(mut self, cluster: impl Into<String>) -> Self {
        self.explorer_cluster = cluster.into();
        self
    }

    pub fn with_slippage_pct(mut self, slippage_pct: f64) -> Self {
        self.slippage_pct = slippage_pct;
        self
    }

    /// Point the panel at another pool. Balances of the old pool are dropped.
    pub fn set_accounts(&mut self, accounts: PoolAccounts) {
        if self.accounts != accounts {
            self.accounts = accounts;
            self.latest = None;
            self.last_error = None;
        }
    }

    pub fn apply_snapshot(&mut self, snapshot: BalanceSnapshot) {
        // Late delivery from a session for a different pool
        if snapshot.accounts != self.accounts {
            return;
        }
        self.latest = Some(snapshot);
        self.last_error = None;
    }

    /// Record a failed cycle. The previous snapshot stays on display.
    pub fn apply_error(&mut self, error: &PollError) {
        self.last_error = Some(error.to_string());
    }

    pub fn latest(&self) -> Option<&BalanceSnapshot> {
        self.latest.as_ref()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    fn balance_display(&self, side: PoolSide) -> String {
        match &self.latest {
            Some(snapshot) => snapshot.get(side).display.clone(),
            None => format_balance(None, self.locale),
        }
    }

    pub fn rows(&self) -> Vec<PanelRow> {
        let row = |label: &str, value: String| PanelRow {
            label: label.to_string(),
            value,
        };
        vec![
            row(
                "Pool Liquidity (YES)",
                format!("{} {}", self.balance_display(PoolSide::A), PoolSide::A.unit()),
            ),
            row(
                "Pool Liquidity (NO)",
                format!("{} {}", self.balance_display(PoolSide::B), PoolSide::B.unit()),
            ),
            row(
                "LP Supply",
                format!("{} {}", self.balance_display(PoolSide::Lp), PoolSide::Lp.unit()),
            ),
            row("Slippage", format!("{}%", self.slippage_pct)),
        ]
    }

    pub fn address_rows(&self) -> Vec<AddressRow> {
        let mut entries = vec![
            ("YES", &self.accounts.side_a),
            ("NO", &self.accounts.side_b),
            ("LP", &self.accounts.lp_supply),
        ];
        if let Some(program) = &self.amm_program {
            entries.push(("AMM ID", program));
        }

        entries
            .into_iter()
            .map(|(label, account)| AddressRow {
                label: label.to_string(),
                address: account.to_string(),
                short: account.truncated(8),
                explorer_url: account.explorer_url(&self.explorer_cluster),
            })
            .collect()
    }

    /// One-line summary for logs
    pub fn render_line(&self) -> String {
        self.rows()
            .iter()
            .map(|r| format!("{}: {}", r.label, r.value))
            .collect::<Vec<_>>()
            .join(" | ")
    }
}
