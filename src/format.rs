use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use std::str::FromStr;

/// Shown for a balance that has not been fetched yet. Never rendered as `0`.
pub const UNKNOWN_BALANCE: &str = "unknown";

/// Fraction digits kept when rendering, same as a default `toLocaleString()`.
const MAX_FRACTION_DIGITS: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NumberLocale {
    #[default]
    EnUs,
    DeDe,
    FrFr,
}

impl NumberLocale {
    fn separators(&self) -> (&'static str, &'static str) {
        // (grouping, decimal)
        match self {
            NumberLocale::EnUs => (",", "."),
            NumberLocale::DeDe => (".", ","),
            NumberLocale::FrFr => ("\u{202f}", ","),
        }
    }
}

impl FromStr for NumberLocale {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "en" | "en-us" => Ok(NumberLocale::EnUs),
            "de" | "de-de" => Ok(NumberLocale::DeDe),
            "fr" | "fr-fr" => Ok(NumberLocale::FrFr),
            other => anyhow::bail!("Unsupported display locale: {}", other),
        }
    }
}

/// Render a number with locale grouping, e.g. `1234567.891` -> `1,234,567.891`.
pub fn format_decimal(value: Decimal, locale: NumberLocale) -> String {
    let (group_sep, decimal_sep) = locale.separators();
    let rounded = value
        .round_dp_with_strategy(MAX_FRACTION_DIGITS, RoundingStrategy::MidpointAwayFromZero)
        .normalize();

    let text = rounded.abs().to_string();
    let (int_part, frac_part) = match text.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (text.as_str(), None),
    };

    let mut out = String::with_capacity(text.len() + text.len() / 3 + 1);
    if rounded.is_sign_negative() && !rounded.is_zero() {
        out.push('-');
    }
    let digits = int_part.len();
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (digits - i) % 3 == 0 {
            out.push_str(group_sep);
        }
        out.push(ch);
    }
    if let Some(frac) = frac_part {
        out.push_str(decimal_sep);
        out.push_str(frac);
    }
    out
}

pub fn format_balance(value: Option<Decimal>, locale: NumberLocale) -> String {
    match value {
        Some(v) => format_decimal(v, locale),
        None => UNKNOWN_BALANCE.to_string(),
    }
}

/// Coarse age of a timestamp: minutes under an hour, hours under a day, days after.
///
/// Units are never singularised, so one hour reads `"1 hours"`.
pub fn time_elapsed(published: DateTime<Utc>, now: DateTime<Utc>) -> String {
    // Future timestamps (clock skew) count as just published
    let minutes = (now - published).num_milliseconds().max(0) as f64 / 60_000.0;

    if (60.0..1440.0).contains(&minutes) {
        format!("{} hours", (minutes / 60.0).floor())
    } else if minutes >= 1440.0 {
        format!("{} days", (minutes / 1440.0).floor())
    } else {
        format!("{} minutes", minutes.floor())
    }
}
