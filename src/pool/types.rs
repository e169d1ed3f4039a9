use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::AccountRefError;
use crate::format::NumberLocale;

/// Decoded size of an account public key.
pub const ACCOUNT_KEY_LEN: usize = 32;

/// Base58 address of an on-chain token account.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PoolAccountRef(String);

impl PoolAccountRef {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Shortened form for display, e.g. `7xKX...gAsU` for `visible = 8`.
    pub fn truncated(&self, visible: usize) -> String {
        let half = visible / 2;
        if half == 0 || self.0.len() <= visible {
            return self.0.clone();
        }
        // Base58 is ASCII, byte slicing is safe
        format!("{}...{}", &self.0[..half], &self.0[self.0.len() - half..])
    }

    pub fn explorer_url(&self, cluster: &str) -> String {
        format!("https://solscan.io/account/{}?cluster={}", self.0, cluster)
    }
}

impl FromStr for PoolAccountRef {
    type Err = AccountRefError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(AccountRefError::Empty);
        }
        if !(32..=44).contains(&s.len()) {
            return Err(AccountRefError::InvalidLength(s.len()));
        }
        let bytes = bs58::decode(s).into_vec().map_err(|e| match e {
            bs58::decode::Error::InvalidCharacter { character, .. } => {
                AccountRefError::InvalidCharacter(character)
            }
            other => AccountRefError::Undecodable(other.to_string()),
        })?;
        if bytes.len() != ACCOUNT_KEY_LEN {
            return Err(AccountRefError::InvalidKeyLength(bytes.len()));
        }
        Ok(Self(s.to_string()))
    }
}

impl TryFrom<String> for PoolAccountRef {
    type Error = AccountRefError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<PoolAccountRef> for String {
    fn from(value: PoolAccountRef) -> Self {
        value.0
    }
}

impl fmt::Display for PoolAccountRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PoolSide {
    /// YES reserves
    A,
    /// NO reserves
    B,
    Lp,
}

impl PoolSide {
    pub fn unit(&self) -> &'static str {
        match self {
            PoolSide::A => "YES",
            PoolSide::B => "NO",
            PoolSide::Lp => "LP",
        }
    }
}

impl fmt::Display for PoolSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.unit())
    }
}

/// The three token accounts backing one market's pool.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PoolAccounts {
    pub side_a: PoolAccountRef,
    pub side_b: PoolAccountRef,
    pub lp_supply: PoolAccountRef,
}

impl PoolAccounts {
    pub fn new(side_a: PoolAccountRef, side_b: PoolAccountRef, lp_supply: PoolAccountRef) -> Self {
        Self {
            side_a,
            side_b,
            lp_supply,
        }
    }

    pub fn get(&self, side: PoolSide) -> &PoolAccountRef {
        match side {
            PoolSide::A => &self.side_a,
            PoolSide::B => &self.side_b,
            PoolSide::Lp => &self.lp_supply,
        }
    }
}

/// Token account balance as returned by `getTokenAccountBalance`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenAmount {
    /// Raw amount in base units
    pub amount: String,
    pub decimals: u8,
    #[serde(default)]
    pub ui_amount: Option<f64>,
    #[serde(default)]
    pub ui_amount_string: Option<String>,
}

impl TokenAmount {
    pub fn from_ui(value: f64, decimals: u8) -> Self {
        let ui = Decimal::from_f64_retain(value).unwrap_or_default();
        let mut raw = ui;
        raw.rescale(decimals as u32);
        Self {
            amount: raw.mantissa().to_string(),
            decimals,
            ui_amount: Some(value),
            ui_amount_string: Some(ui.normalize().to_string()),
        }
    }

    /// Human-scale value. Prefers the exact string form, then the float,
    /// then derives it from the raw amount. `None` when nothing is usable.
    pub fn ui_value(&self) -> Option<Decimal> {
        if let Some(s) = &self.ui_amount_string {
            if let Ok(d) = Decimal::from_str(s) {
                return Some(d);
            }
        }
        if let Some(f) = self.ui_amount {
            return Decimal::from_f64_retain(f);
        }
        let raw: i128 = self.amount.parse().ok()?;
        Decimal::try_from_i128_with_scale(raw, self.decimals as u32).ok()
    }
}

/// One formatted balance inside a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoolBalance {
    pub amount: Option<Decimal>,
    pub display: String,
}

impl PoolBalance {
    pub fn new(amount: Option<Decimal>, locale: NumberLocale) -> Self {
        Self {
            amount,
            display: crate::format::format_balance(amount, locale),
        }
    }

    pub fn is_known(&self) -> bool {
        self.amount.is_some()
    }
}

/// Immutable bundle of the three balances fetched in one cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceSnapshot {
    pub session: uuid::Uuid,
    pub accounts: PoolAccounts,
    pub side_a: PoolBalance,
    pub side_b: PoolBalance,
    pub lp_supply: PoolBalance,
    pub fetched_at: DateTime<Utc>,
}

impl BalanceSnapshot {
    pub fn get(&self, side: PoolSide) -> &PoolBalance {
        match side {
            PoolSide::A => &self.side_a,
            PoolSide::B => &self.side_b,
            PoolSide::Lp => &self.lp_supply,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ADDR: &str = "7xKXtg2CW87d97TXJSDpbD5jBkheTqA83TZRuJosgAsU";

    #[test]
    fn test_account_ref_parsing() {
        let acc: PoolAccountRef = ADDR.parse().unwrap();
        assert_eq!(acc.as_str(), ADDR);

        assert_eq!("".parse::<PoolAccountRef>(), Err(AccountRefError::Empty));
        assert_eq!("abc".parse::<PoolAccountRef>(), Err(AccountRefError::InvalidLength(3)));
        // '0' is not in the base58 alphabet
        let bad = format!("0{}", &ADDR[1..]);
        assert_eq!(bad.parse::<PoolAccountRef>(), Err(AccountRefError::InvalidCharacter('0')));
    }

    #[test]
    fn test_account_ref_must_decode_to_key() {
        assert!("So11111111111111111111111111111111111111112".parse::<PoolAccountRef>().is_ok());
        assert!("11111111111111111111111111111111".parse::<PoolAccountRef>().is_ok());

        // Alphabet and length look right but the key is too short or too long
        let short = "a".repeat(40);
        assert!(matches!(
            short.parse::<PoolAccountRef>(),
            Err(AccountRefError::InvalidKeyLength(n)) if n < ACCOUNT_KEY_LEN
        ));
        let long = "z".repeat(44);
        assert!(matches!(
            long.parse::<PoolAccountRef>(),
            Err(AccountRefError::InvalidKeyLength(n)) if n > ACCOUNT_KEY_LEN
        ));
    }

    #[test]
    fn test_truncate_and_explorer_link() {
        let acc: PoolAccountRef = ADDR.parse().unwrap();
        assert_eq!(acc.truncated(8), "7xKX...gAsU");
        assert_eq!(
            acc.explorer_url("devnet"),
            format!("https://solscan.io/account/{}?cluster=devnet", ADDR)
        );
    }

    #[test]
    fn test_ui_value_fallbacks() {
        let exact = TokenAmount {
            amount: "1234500".into(),
            decimals: 3,
            ui_amount: Some(1234.5),
            ui_amount_string: Some("1234.5".into()),
        };
        assert_eq!(exact.ui_value(), Some(Decimal::new(12345, 1)));

        // No ui fields: derived from the raw amount
        let raw_only = TokenAmount {
            amount: "2500000".into(),
            decimals: 6,
            ui_amount: None,
            ui_amount_string: None,
        };
        assert_eq!(raw_only.ui_value(), Some(Decimal::new(25, 1)));

        let garbage = TokenAmount {
            amount: "n/a".into(),
            decimals: 6,
            ui_amount: None,
            ui_amount_string: None,
        };
        assert_eq!(garbage.ui_value(), None);
    }

    #[test]
    fn test_from_ui() {
        let amount = TokenAmount::from_ui(42.0, 6);
        assert_eq!(amount.amount, "42000000");
        assert_eq!(amount.ui_value(), Some(Decimal::from(42)));
    }
}
