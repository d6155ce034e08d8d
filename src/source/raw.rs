//! Row shapes as the hosted backend returns them, and their conversion into
//! canonical models.
//!
//! The backend is inconsistent: amounts arrive as numbers or strings, the
//! anonymity flag is spelled `is_anonymous` or `isAnonymous`, and budget spend
//! is `spent`, `amountSpent` or `amount_spent`. All of that is settled here.

use chrono::{DateTime, NaiveDate};
use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

use crate::models::{BudgetCategory, Campaign, CatRef, Donation, DonationStatus, Expense};
use crate::money::{coerce_json_amount, parse_amount};

pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.date_naive());
    }
    let parsed = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| raw.get(..10).and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok()));
    if parsed.is_none() {
        warn!(value = raw, "unparseable date ignored");
    }
    parsed
}

fn parse_opt_date(raw: Option<&str>) -> Option<NaiveDate> {
    raw.and_then(parse_date)
}

/// Integer id from a number or numeric string.
pub fn coerce_id(value: Option<&Value>) -> Option<i64> {
    match value? {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// First value that is present and not null.
fn first_present<'a>(candidates: &[Option<&'a Value>]) -> Option<&'a Value> {
    candidates
        .iter()
        .flatten()
        .copied()
        .find(|v| !v.is_null())
}

/// Truthiness of a text flag column: "1", "true", "yes" and so on.
pub fn parse_flag_text(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "t" | "yes" | "y" => Some(true),
        "" | "0" | "false" | "f" | "no" | "n" => Some(false),
        _ => None,
    }
}

/// Boolean from a bool, number or string. Anything unreadable is false.
pub fn coerce_flag(value: Option<&Value>, field: &str) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|v| v != 0.0),
        Some(Value::String(s)) => parse_flag_text(s).unwrap_or_else(|| {
            warn!(field, value = s.as_str(), "unreadable flag treated as false");
            false
        }),
        Some(other) => {
            warn!(field, value = %other, "unreadable flag treated as false");
            false
        }
    }
}

/// Calendar year from a number or numeric string.
pub fn coerce_year(value: Option<&Value>, field: &str) -> Option<i32> {
    let year = match value? {
        Value::Null => return None,
        Value::Number(n) => n.as_i64().and_then(|y| i32::try_from(y).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    };
    if year.is_none() {
        warn!(field, "unreadable year ignored");
    }
    year
}

fn non_blank(s: Option<String>) -> Option<String> {
    s.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawDonation {
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub amount: Option<Value>,
    #[serde(default, alias = "donationDate", alias = "date")]
    pub donation_date: Option<String>,
    #[serde(default, alias = "donorName", alias = "name")]
    pub donor_name: Option<String>,
    #[serde(default)]
    pub is_anonymous: Option<Value>,
    #[serde(default, rename = "isAnonymous")]
    pub is_anonymous_camel: Option<Value>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default, alias = "isRecurring")]
    pub is_recurring: Option<Value>,
    #[serde(default, alias = "campaignId")]
    pub campaign_id: Option<Value>,
}

impl From<RawDonation> for Donation {
    fn from(raw: RawDonation) -> Self {
        Donation {
            id: coerce_id(raw.id.as_ref()).unwrap_or_default(),
            amount: coerce_json_amount(raw.amount.as_ref(), "donations.amount"),
            date: parse_opt_date(raw.donation_date.as_deref()),
            donor_name: non_blank(raw.donor_name),
            is_anonymous: coerce_flag(raw.is_anonymous.as_ref(), "donations.is_anonymous")
                || coerce_flag(raw.is_anonymous_camel.as_ref(), "donations.isAnonymous"),
            status: raw
                .status
                .as_deref()
                .map(DonationStatus::parse)
                .unwrap_or(DonationStatus::Pending),
            is_recurring: coerce_flag(raw.is_recurring.as_ref(), "donations.is_recurring"),
            campaign_id: coerce_id(raw.campaign_id.as_ref()),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawCatJoin {
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawExpense {
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub amount: Option<Value>,
    #[serde(default, alias = "expenseDate", alias = "date")]
    pub expense_date: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub vendor: Option<String>,
    #[serde(default, alias = "paymentMethod")]
    pub payment_method: Option<String>,
    #[serde(default, alias = "catId")]
    pub cat_id: Option<Value>,
    #[serde(default, alias = "catName")]
    pub cat_name: Option<String>,
    #[serde(default, alias = "cat")]
    pub cats: Option<RawCatJoin>,
    #[serde(default, alias = "donationId")]
    pub donation_id: Option<Value>,
}

impl RawExpense {
    /// Nested join wins over the flat columns.
    fn cat_ref(&self) -> Option<CatRef> {
        let joined = self.cats.as_ref();
        let id = joined
            .and_then(|c| coerce_id(c.id.as_ref()))
            .or_else(|| coerce_id(self.cat_id.as_ref()))?;
        let name = joined
            .and_then(|c| c.name.clone())
            .or_else(|| self.cat_name.clone())
            .and_then(|n| non_blank(Some(n)))
            .unwrap_or_else(|| format!("Cat #{id}"));
        Some(CatRef { id, name })
    }
}

impl From<RawExpense> for Expense {
    fn from(raw: RawExpense) -> Self {
        let cat = raw.cat_ref();
        Expense {
            id: coerce_id(raw.id.as_ref()).unwrap_or_default(),
            amount: coerce_json_amount(raw.amount.as_ref(), "expenses.amount"),
            date: parse_opt_date(raw.expense_date.as_deref()),
            category: non_blank(raw.category),
            description: raw.description.unwrap_or_default(),
            vendor: non_blank(raw.vendor),
            payment_method: non_blank(raw.payment_method),
            cat,
            donation_id: coerce_id(raw.donation_id.as_ref()),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawBudgetCategory {
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default, alias = "category")]
    pub name: Option<String>,
    #[serde(default, alias = "budgeted", alias = "allocated_amount", alias = "allocatedAmount")]
    pub allocated: Option<Value>,
    #[serde(default)]
    pub spent: Option<Value>,
    #[serde(default, rename = "amountSpent")]
    pub amount_spent_camel: Option<Value>,
    #[serde(default)]
    pub amount_spent: Option<Value>,
    #[serde(default)]
    pub year: Option<Value>,
}

impl RawBudgetCategory {
    pub fn year(&self) -> Option<i32> {
        coerce_year(self.year.as_ref(), "budget_categories.year")
    }
}

impl From<RawBudgetCategory> for BudgetCategory {
    fn from(raw: RawBudgetCategory) -> Self {
        let spent = first_present(&[
            raw.spent.as_ref(),
            raw.amount_spent_camel.as_ref(),
            raw.amount_spent.as_ref(),
        ]);
        BudgetCategory {
            id: coerce_id(raw.id.as_ref()).unwrap_or_default(),
            name: raw.name.unwrap_or_default(),
            allocated: coerce_json_amount(raw.allocated.as_ref(), "budget_categories.allocated"),
            spent: coerce_json_amount(spent, "budget_categories.spent"),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawCampaign {
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, alias = "goal", alias = "target_amount", alias = "targetAmount")]
    pub target: Option<Value>,
    #[serde(default, alias = "amount_raised", alias = "amountRaised", alias = "current_amount")]
    pub raised: Option<Value>,
    #[serde(default, alias = "startDate")]
    pub start_date: Option<String>,
    #[serde(default, alias = "endDate")]
    pub end_date: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
}

impl RawCampaign {
    /// Whether the row carries its own raised-to-date figure.
    pub fn has_raised(&self) -> bool {
        self.raised.as_ref().is_some_and(|v| !v.is_null())
    }
}

impl From<RawCampaign> for Campaign {
    fn from(raw: RawCampaign) -> Self {
        Campaign {
            id: coerce_id(raw.id.as_ref()).unwrap_or_default(),
            name: raw.name.unwrap_or_default(),
            description: non_blank(raw.description),
            target: coerce_json_amount(raw.target.as_ref(), "campaigns.target"),
            raised: coerce_json_amount(raw.raised.as_ref(), "campaigns.raised"),
            start_date: parse_opt_date(raw.start_date.as_deref()),
            end_date: parse_opt_date(raw.end_date.as_deref()),
            category: non_blank(raw.category),
        }
    }
}

/// Amount from a loosely typed text column, zero when unreadable.
pub fn coerce_text_amount(raw: &str, field: &str) -> f64 {
    parse_amount(raw).unwrap_or_else(|| {
        if !raw.trim().is_empty() {
            warn!(field, value = raw, "malformed amount coerced to zero");
        }
        0.0
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn donation(v: Value) -> Donation {
        serde_json::from_value::<RawDonation>(v).unwrap().into()
    }

    #[test]
    fn test_anonymous_flag_either_spelling() {
        let snake = donation(json!({"id": 1, "amount": 5, "donor_name": "Jane Doe", "is_anonymous": true}));
        let camel = donation(json!({"id": 2, "amount": 5, "donor_name": "Jane Doe", "isAnonymous": true}));
        let neither = donation(json!({"id": 3, "amount": 5, "donor_name": "Jane Doe"}));
        assert!(snake.is_anonymous);
        assert!(camel.is_anonymous);
        assert!(!neither.is_anonymous);
    }

    #[test]
    fn test_anonymous_flag_loose_spellings() {
        for (key, value) in [
            ("is_anonymous", json!(1)),
            ("is_anonymous", json!("true")),
            ("is_anonymous", json!("Yes")),
            ("isAnonymous", json!(1)),
            ("isAnonymous", json!("true")),
        ] {
            let d = donation(json!({"id": 1, "amount": 5, "donor_name": "Jane Doe", key: value.clone()}));
            assert!(d.is_anonymous, "{key} = {value}");
        }
        for (key, value) in [
            ("is_anonymous", json!(0)),
            ("is_anonymous", json!("false")),
            ("isAnonymous", json!("maybe")),
            ("isAnonymous", json!([true])),
        ] {
            let d = donation(json!({"id": 1, "amount": 5, "donor_name": "Jane Doe", key: value.clone()}));
            assert!(!d.is_anonymous, "{key} = {value}");
        }
        let mixed = donation(json!({"is_anonymous": "0", "isAnonymous": 1}));
        assert!(mixed.is_anonymous);
    }

    #[test]
    fn test_recurring_and_year_coercion() {
        let d = donation(json!({"is_recurring": "1"}));
        assert!(d.is_recurring);

        let year = |v: Value| {
            serde_json::from_value::<RawBudgetCategory>(json!({"name": "food", "year": v}))
                .unwrap()
                .year()
        };
        assert_eq!(year(json!(2025)), Some(2025));
        assert_eq!(year(json!(" 2025 ")), Some(2025));
        assert_eq!(year(json!("next year")), None);
        assert_eq!(year(json!(null)), None);
        assert_eq!(year(json!(1e12)), None);
    }

    #[test]
    fn test_parse_flag_text() {
        assert_eq!(parse_flag_text(" TRUE "), Some(true));
        assert_eq!(parse_flag_text("0"), Some(false));
        assert_eq!(parse_flag_text(""), Some(false));
        assert_eq!(parse_flag_text("sometimes"), None);
    }

    #[test]
    fn test_donation_string_amount_and_timestamp() {
        let d = donation(json!({
            "id": "7",
            "amount": "25.50",
            "donation_date": "2025-03-04T12:30:00Z",
            "status": "completed",
            "isRecurring": true
        }));
        assert_eq!(d.id, 7);
        assert_eq!(d.amount, 25.5);
        assert_eq!(d.date, NaiveDate::from_ymd_opt(2025, 3, 4));
        assert_eq!(d.status, DonationStatus::Completed);
        assert!(d.is_recurring);
    }

    #[test]
    fn test_donation_malformed_fields_degrade() {
        let d = donation(json!({"amount": null, "donation_date": "last tuesday"}));
        assert_eq!(d.amount, 0.0);
        assert_eq!(d.date, None);
        assert_eq!(d.status, DonationStatus::Pending);
        assert_eq!(d.donor_name, None);
    }

    #[test]
    fn test_expense_cat_from_join_or_columns() {
        let joined: Expense = serde_json::from_value::<RawExpense>(json!({
            "id": 1, "amount": "10.50", "cats": {"id": 4, "name": "Mittens"}
        }))
        .unwrap()
        .into();
        assert_eq!(joined.cat, Some(CatRef { id: 4, name: "Mittens".into() }));
        assert_eq!(joined.amount, 10.5);

        let flat: Expense = serde_json::from_value::<RawExpense>(json!({
            "id": 2, "amount": 5, "cat_id": 9
        }))
        .unwrap()
        .into();
        assert_eq!(flat.cat, Some(CatRef { id: 9, name: "Cat #9".into() }));

        let none: Expense = serde_json::from_value::<RawExpense>(json!({"id": 3, "amount": 1, "cats": null}))
            .unwrap()
            .into();
        assert_eq!(none.cat, None);
    }

    #[test]
    fn test_budget_spent_precedence() {
        let both: BudgetCategory = serde_json::from_value::<RawBudgetCategory>(json!({
            "name": "food", "allocated": 1200, "spent": 300, "amountSpent": 999
        }))
        .unwrap()
        .into();
        assert_eq!(both.spent, 300.0);

        let camel: BudgetCategory = serde_json::from_value::<RawBudgetCategory>(json!({
            "name": "food", "allocated": "1200", "amountSpent": "450.25"
        }))
        .unwrap()
        .into();
        assert_eq!(camel.spent, 450.25);
        assert_eq!(camel.allocated, 1200.0);

        let null_spent: BudgetCategory = serde_json::from_value::<RawBudgetCategory>(json!({
            "name": "food", "spent": null, "amount_spent": 12
        }))
        .unwrap()
        .into();
        assert_eq!(null_spent.spent, 12.0);
    }

    #[test]
    fn test_campaign_aliases() {
        let raw: RawCampaign = serde_json::from_value(json!({
            "id": 1, "name": "Winter Shelter", "goal": "5000", "startDate": "2025-11-01"
        }))
        .unwrap();
        assert!(!raw.has_raised());
        let c: Campaign = raw.into();
        assert_eq!(c.target, 5000.0);
        assert_eq!(c.raised, 0.0);
        assert_eq!(c.start_date, NaiveDate::from_ymd_opt(2025, 11, 1));
    }

    #[test]
    fn test_coerce_text_amount() {
        assert_eq!(coerce_text_amount("12.5", "x"), 12.5);
        assert_eq!(coerce_text_amount("oops", "x"), 0.0);
        assert_eq!(coerce_text_amount("", "x"), 0.0);
    }
}
