//! Monetary display and amount normalization.
//!
//! Every amount shown to a reader goes through [`round_cents`], which rounds
//! half away from zero on the shortest decimal form of the value. Backend rows
//! may carry amounts as numbers or strings; [`coerce_json_amount`] turns either
//! into an `f64` and degrades to zero instead of failing.

use std::str::FromStr;

use rust_decimal::prelude::FromPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde_json::Value;
use tracing::warn;

/// Exact decimal form of a float, taken from its shortest round-trip text.
fn to_decimal(val: f64) -> Decimal {
    let val = finite_or_zero(val);
    Decimal::from_str(&val.to_string())
        .ok()
        .or_else(|| Decimal::from_f64(val))
        .unwrap_or_else(|| {
            warn!(value = val, "amount out of displayable range, showing zero");
            Decimal::ZERO
        })
}

/// Round to cents, half away from zero, always carrying two decimal places.
pub fn round_cents(val: Decimal) -> Decimal {
    let mut rounded = val.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(2);
    rounded
}

fn format_decimal(val: Decimal) -> String {
    let rounded = round_cents(val);
    let negative = rounded.is_sign_negative() && !rounded.is_zero();
    let cents = rounded.abs().to_string();
    let (int_part, dec_part) = cents.split_once('.').unwrap_or((cents.as_str(), "00"));

    let mut with_commas = String::new();
    for (i, c) in int_part.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            with_commas.push(',');
        }
        with_commas.push(c);
    }
    let with_commas: String = with_commas.chars().rev().collect();

    if negative {
        format!("-${with_commas}.{dec_part}")
    } else {
        format!("${with_commas}.{dec_part}")
    }
}

/// Format a float as a dollar amount with thousands separators: $1,234.56
pub fn money(val: f64) -> String {
    format_decimal(to_decimal(val))
}

/// Format a decimal string as a dollar amount. Unparseable input shows $0.00.
pub fn money_str(raw: &str) -> String {
    let cleaned = clean_amount_text(raw);
    match Decimal::from_str(&cleaned) {
        Ok(d) => format_decimal(d),
        Err(_) => {
            warn!(value = raw, "unparseable amount, displaying as zero");
            format_decimal(Decimal::ZERO)
        }
    }
}

/// Two-decimal numeric label, e.g. a percentage: 12.5 -> "12.50".
pub fn fixed2(val: f64) -> String {
    round_cents(to_decimal(val)).to_string()
}

pub fn finite_or_zero(val: f64) -> f64 {
    if val.is_finite() {
        val
    } else {
        0.0
    }
}

fn clean_amount_text(raw: &str) -> String {
    raw.trim().chars().filter(|c| *c != '$' && *c != ',').collect()
}

/// Parse a textual amount such as "10.50", "$1,200" or " 5 ".
pub fn parse_amount(raw: &str) -> Option<f64> {
    let cleaned = clean_amount_text(raw);
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Normalize a backend amount that may be a number, a string or absent.
///
/// Null and missing values count as zero without noise; anything that cannot
/// be read as a number counts as zero and logs a warning.
pub fn coerce_json_amount(value: Option<&Value>, field: &str) -> f64 {
    match value {
        None | Some(Value::Null) => 0.0,
        Some(Value::Number(n)) => n.as_f64().map(finite_or_zero).unwrap_or(0.0),
        Some(Value::String(s)) => match parse_amount(s) {
            Some(v) => v,
            None => {
                if !s.trim().is_empty() {
                    warn!(field, value = s.as_str(), "malformed amount coerced to zero");
                }
                0.0
            }
        },
        Some(other) => {
            warn!(field, value = %other, "non-numeric amount coerced to zero");
            0.0
        }
    }
}
