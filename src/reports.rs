use std::collections::HashMap;

use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use tracing::warn;

use crate::derive::{annual_projection, is_budget_at_risk, ordinal, percent_of, percentage_change, title_case};
use crate::error::{RescueError, Result};
use crate::models::{BudgetCategory, Campaign, DateRange, Donation, DonationFilter, Expense};
use crate::money::{finite_or_zero, fixed2};
use crate::source::DataSource;

pub const ANONYMOUS_DONOR: &str = "Anonymous Donor";

/// Smallest bar drawn once anything at all has been raised.
pub const MIN_PROGRESS_BAR: f64 = 0.25;

fn round1(val: f64) -> f64 {
    (finite_or_zero(val) * 10.0).round() / 10.0
}

// ---------------------------------------------------------------------------
// Summary totals
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SummaryTotals {
    pub income: f64,
    pub expenses: f64,
    pub net: f64,
    pub income_change: f64,
    pub expense_change: f64,
    pub net_change: f64,
    pub projected_income: f64,
    pub projected_expenses: f64,
    pub donation_count: usize,
}

fn completed_total(donations: &[Donation]) -> f64 {
    donations
        .iter()
        .filter(|d| d.is_completed())
        .map(|d| finite_or_zero(d.amount))
        .sum()
}

fn expense_total(expenses: &[Expense]) -> f64 {
    expenses.iter().map(|e| finite_or_zero(e.amount)).sum()
}

/// Totals for `period` compared with the rows of the preceding period.
pub fn summarize(
    current_donations: &[Donation],
    current_expenses: &[Expense],
    previous_donations: &[Donation],
    previous_expenses: &[Expense],
    period: &DateRange,
) -> SummaryTotals {
    let income = completed_total(current_donations);
    let expenses = expense_total(current_expenses);
    let prev_income = completed_total(previous_donations);
    let prev_expenses = expense_total(previous_expenses);
    let month = period.end.month();

    SummaryTotals {
        income,
        expenses,
        net: income - expenses,
        income_change: percentage_change(income, prev_income),
        expense_change: percentage_change(expenses, prev_expenses),
        net_change: percentage_change(income - expenses, prev_income - prev_expenses),
        projected_income: annual_projection(income, month),
        projected_expenses: annual_projection(expenses, month),
        donation_count: current_donations.iter().filter(|d| d.is_completed()).count(),
    }
}

pub fn summary(source: &dyn DataSource, period: &DateRange) -> Result<SummaryTotals> {
    let current_donations = source.donations(&DonationFilter::completed_in(*period))?;
    let current_expenses = source.expenses(Some(period))?;
    // No comparison window before the earliest date: change figures run against zero.
    let (previous_donations, previous_expenses) = match period.previous() {
        Some(previous) => (
            source.donations(&DonationFilter::completed_in(previous))?,
            source.expenses(Some(&previous))?,
        ),
        None => (Vec::new(), Vec::new()),
    };
    Ok(summarize(
        &current_donations,
        &current_expenses,
        &previous_donations,
        &previous_expenses,
        period,
    ))
}

// ---------------------------------------------------------------------------
// Budget category progress
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BudgetProgress {
    pub name: String,
    pub allocated: f64,
    pub spent: f64,
    pub remaining: f64,
    /// True share used, one decimal, may exceed 100.
    pub percent_used: f64,
    /// Progress bar width, clamped to 0..=100.
    pub bar_width: f64,
    pub over_budget: bool,
    pub at_risk: bool,
}

/// Progress per category as of calendar `month`.
pub fn budget_progress(categories: &[BudgetCategory], month: u32) -> Vec<BudgetProgress> {
    categories
        .iter()
        .map(|c| {
            let allocated = finite_or_zero(c.allocated);
            let spent = finite_or_zero(c.spent);
            let percent_used = round1(percent_of(spent, allocated));
            BudgetProgress {
                name: title_case(&c.name),
                allocated,
                spent,
                remaining: allocated - spent,
                percent_used,
                bar_width: percent_used.clamp(0.0, 100.0),
                over_budget: spent > allocated,
                at_risk: is_budget_at_risk(spent, allocated, month),
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Fundraising progress
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FundraisingProgress {
    pub raised: f64,
    pub target: f64,
    /// True percentage; zero when there is no target.
    pub percent_complete: f64,
    /// Numeric label, always two decimals.
    pub label: String,
    /// Progress bar width: clamped to 0..=100, floored once anything is raised.
    pub bar_width: f64,
}

impl Default for FundraisingProgress {
    fn default() -> Self {
        Self::new(0.0, 0.0)
    }
}

impl FundraisingProgress {
    pub fn new(raised: f64, target: f64) -> Self {
        let raised = finite_or_zero(raised);
        let target = finite_or_zero(target);
        let percent_complete = if target > 0.0 {
            percent_of(raised, target)
        } else {
            0.0
        };
        let mut bar_width = percent_complete.clamp(0.0, 100.0);
        if raised > 0.0 {
            bar_width = bar_width.max(MIN_PROGRESS_BAR);
        }
        Self {
            raised,
            target,
            percent_complete,
            label: fixed2(percent_complete),
            bar_width,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CampaignProgress {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub category: Option<String>,
    pub progress: FundraisingProgress,
}

pub fn campaign_progress(campaign: &Campaign) -> CampaignProgress {
    CampaignProgress {
        id: campaign.id,
        name: campaign.name.clone(),
        description: campaign.description.clone(),
        start_date: campaign.start_date,
        end_date: campaign.end_date,
        category: campaign.category.clone(),
        progress: FundraisingProgress::new(campaign.raised, campaign.target),
    }
}

/// Combined progress across every campaign.
pub fn overall_progress(campaigns: &[Campaign]) -> FundraisingProgress {
    let raised = campaigns.iter().map(|c| finite_or_zero(c.raised)).sum();
    let target = campaigns.iter().map(|c| finite_or_zero(c.target)).sum();
    FundraisingProgress::new(raised, target)
}

// ---------------------------------------------------------------------------
// Donor ranking
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Standing {
    /// Leaderboard position, e.g. "1st".
    Rank(String),
    /// Gift date for the recent donors view.
    Date(Option<NaiveDate>),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DonorEntry {
    pub name: String,
    pub amount: f64,
    pub is_recurring: bool,
    pub standing: Standing,
}

/// Name shown for a donation. The anonymity flag always wins.
pub fn donor_display_name(donation: &Donation) -> String {
    if donation.is_anonymous {
        return ANONYMOUS_DONOR.to_string();
    }
    match donation.donor_name.as_deref().map(str::trim) {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => ANONYMOUS_DONOR.to_string(),
    }
}

fn donor_entry(donation: &Donation, standing: Standing) -> DonorEntry {
    DonorEntry {
        name: donor_display_name(donation),
        amount: finite_or_zero(donation.amount),
        is_recurring: donation.is_recurring,
        standing,
    }
}

/// Newest `limit` completed gifts, newest first; undated gifts sort last.
pub fn recent_donors(donations: &[Donation], limit: usize) -> Vec<DonorEntry> {
    let mut completed: Vec<&Donation> = donations.iter().filter(|d| d.is_completed()).collect();
    completed.sort_by(|a, b| b.date.cmp(&a.date).then(b.id.cmp(&a.id)));
    completed
        .into_iter()
        .take(limit)
        .map(|d| donor_entry(d, Standing::Date(d.date)))
        .collect()
}

/// Largest `limit` completed gifts with ordinal positions.
pub fn rank_top_donors(mut donations: Vec<Donation>, limit: usize) -> Vec<DonorEntry> {
    donations.retain(|d| d.is_completed());
    donations.sort_by(|a, b| {
        finite_or_zero(b.amount)
            .total_cmp(&finite_or_zero(a.amount))
            .then(b.date.cmp(&a.date))
            .then(a.id.cmp(&b.id))
    });
    donations
        .iter()
        .take(limit)
        .enumerate()
        .map(|(i, d)| donor_entry(d, Standing::Rank(ordinal(i + 1))))
        .collect()
}

pub fn recent_donors_from(source: &dyn DataSource, limit: usize) -> Result<Vec<DonorEntry>> {
    let donations = source.donations(&DonationFilter::completed())?;
    Ok(recent_donors(&donations, limit))
}

/// Top donors from the ranking call, or from a plain query when it is missing.
pub fn top_donors(source: &dyn DataSource, limit: usize) -> Result<Vec<DonorEntry>> {
    let rpc_err = match source.top_donors_rpc(limit) {
        Ok(rows) => return Ok(rank_top_donors(rows, limit)),
        Err(e) => e,
    };
    warn!(error = %rpc_err, "top donor ranking call failed, using direct query");
    match source.donations(&DonationFilter::completed()) {
        Ok(rows) => Ok(rank_top_donors(rows, limit)),
        Err(fallback_err) => Err(RescueError::TopDonors {
            rpc: rpc_err.to_string(),
            fallback: fallback_err.to_string(),
        }),
    }
}

// ---------------------------------------------------------------------------
// Per-cat expenses
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CatExpenseItem {
    pub date: Option<NaiveDate>,
    pub category: Option<String>,
    pub amount: f64,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CatExpenseGroup {
    pub cat_id: i64,
    pub cat_name: String,
    pub total_spent: f64,
    pub items: Vec<CatExpenseItem>,
}

/// One group per cat, largest spend first. Expenses without a cat are dropped.
pub fn group_cat_expenses(expenses: &[Expense]) -> Vec<CatExpenseGroup> {
    let mut order: Vec<i64> = Vec::new();
    let mut groups: HashMap<i64, CatExpenseGroup> = HashMap::new();
    for expense in expenses {
        let Some(cat) = &expense.cat else {
            continue;
        };
        let amount = finite_or_zero(expense.amount);
        let group = groups.entry(cat.id).or_insert_with(|| {
            order.push(cat.id);
            CatExpenseGroup {
                cat_id: cat.id,
                cat_name: cat.name.clone(),
                total_spent: 0.0,
                items: Vec::new(),
            }
        });
        group.total_spent += amount;
        group.items.push(CatExpenseItem {
            date: expense.date,
            category: expense.category.clone(),
            amount,
            description: expense.description.clone(),
        });
    }

    let mut result: Vec<CatExpenseGroup> = order
        .into_iter()
        .filter_map(|id| groups.remove(&id))
        .collect();
    result.sort_by(|a, b| {
        b.total_spent
            .total_cmp(&a.total_spent)
            .then_with(|| a.cat_name.cmp(&b.cat_name))
    });
    result
}

// ---------------------------------------------------------------------------
// Dashboard
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
pub struct DashboardOptions {
    pub period: DateRange,
    pub budget_year: i32,
    /// Calendar month used for budget risk and projections.
    pub month: u32,
    pub recent_limit: usize,
    pub top_limit: usize,
}

impl DashboardOptions {
    /// Year-to-date view as of `today`.
    pub fn as_of(today: NaiveDate) -> Self {
        Self {
            period: DateRange::year_to_date(today),
            budget_year: today.year(),
            month: today.month(),
            recent_limit: 10,
            top_limit: 10,
        }
    }

    /// Whole calendar year, judged as if the year were complete.
    pub fn for_year(year: i32) -> Option<Self> {
        Some(Self {
            period: DateRange::year(year)?,
            budget_year: year,
            month: 12,
            recent_limit: 10,
            top_limit: 10,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Dashboard {
    pub summary: SummaryTotals,
    pub budgets: Vec<BudgetProgress>,
    pub campaigns: Vec<CampaignProgress>,
    pub overall: FundraisingProgress,
    pub recent_donors: Vec<DonorEntry>,
    pub top_donors: Vec<DonorEntry>,
    pub cat_expenses: Vec<CatExpenseGroup>,
}

/// Run one section; a failure is logged and the section shows no data.
fn section<T: Default>(name: &str, build: impl FnOnce() -> Result<T>) -> T {
    match build() {
        Ok(value) => value,
        Err(e) => {
            warn!(section = name, error = %e, "dashboard section unavailable");
            T::default()
        }
    }
}

impl Dashboard {
    pub fn build(source: &dyn DataSource, opts: &DashboardOptions) -> Self {
        let summary = section("summary", || summary(source, &opts.period));
        let budgets = section("budgets", || {
            Ok(budget_progress(&source.budget_categories(opts.budget_year)?, opts.month))
        });
        let campaign_rows = section("campaigns", || source.campaigns());
        let recent = section("recent_donors", || recent_donors_from(source, opts.recent_limit));
        let top = section("top_donors", || top_donors(source, opts.top_limit));
        let cat_expenses = section("cat_expenses", || {
            Ok(group_cat_expenses(&source.expenses(Some(&opts.period))?))
        });

        Dashboard {
            summary,
            budgets,
            campaigns: campaign_rows.iter().map(campaign_progress).collect(),
            overall: overall_progress(&campaign_rows),
            recent_donors: recent,
            top_donors: top,
            cat_expenses,
        }
    }
}
