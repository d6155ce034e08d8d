//! Pure figures derived from already-fetched rows.

use crate::money::finite_or_zero;

/// Tolerance band applied to the monthly budget before a category is at risk.
const RISK_TOLERANCE: f64 = 1.1;

/// Percent change from `previous` to `current`, safe against a zero baseline.
pub fn percentage_change(current: f64, previous: f64) -> f64 {
    let current = finite_or_zero(current);
    let previous = finite_or_zero(previous);
    if previous == 0.0 {
        return if current > 0.0 { 100.0 } else { 0.0 };
    }
    (current - previous) / previous.abs() * 100.0
}

fn clamp_month(month: u32) -> f64 {
    month.clamp(1, 12) as f64
}

/// Linear full-year estimate from a year-to-date amount at calendar `month`.
pub fn annual_projection(amount_to_date: f64, month: u32) -> f64 {
    finite_or_zero(amount_to_date) / clamp_month(month) * 12.0
}

/// True when the monthly spend rate runs past the monthly budget plus 10%.
pub fn is_budget_at_risk(spent: f64, budgeted: f64, month: u32) -> bool {
    let spent = finite_or_zero(spent);
    let budgeted = finite_or_zero(budgeted);
    let monthly_rate = spent / clamp_month(month);
    monthly_rate > budgeted / 12.0 * RISK_TOLERANCE
}

/// `part` as a percentage of `whole`; zero when `whole` is zero.
pub fn percent_of(part: f64, whole: f64) -> f64 {
    let whole = finite_or_zero(whole);
    if whole == 0.0 {
        return 0.0;
    }
    finite_or_zero(finite_or_zero(part) / whole * 100.0)
}

/// English ordinal: 1st, 2nd, 3rd, 4th, 11th, 12th, 13th, 21st, ...
pub fn ordinal(n: usize) -> String {
    let suffix = match (n % 10, n % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    };
    format!("{n}{suffix}")
}

/// "medical CARE" -> "Medical Care"; '-' and '/' also start a new word.
pub fn title_case(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut start_of_word = true;
    for c in raw.trim().chars() {
        if c.is_whitespace() || c == '-' || c == '/' {
            out.push(c);
            start_of_word = true;
        } else if start_of_word {
            out.extend(c.to_uppercase());
            start_of_word = false;
        } else {
            out.extend(c.to_lowercase());
        }
    }
    out
}
