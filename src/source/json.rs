use std::path::Path;

use chrono::Datelike;
use serde::Deserialize;

use crate::error::{RescueError, Result};
use crate::models::{BudgetCategory, Campaign, DateRange, Donation, DonationFilter, DonationStatus, Expense};
use crate::source::raw::{RawBudgetCategory, RawCampaign, RawDonation, RawExpense};
use crate::money::finite_or_zero;
use crate::source::DataSource;

#[derive(Debug, Default, Deserialize)]
struct ExportFile {
    #[serde(default)]
    donations: Vec<RawDonation>,
    #[serde(default)]
    expenses: Vec<RawExpense>,
    #[serde(default)]
    budget_categories: Vec<RawBudgetCategory>,
    #[serde(default)]
    campaigns: Vec<RawCampaign>,
    #[serde(default)]
    top_donors: Option<Vec<RawDonation>>,
}

struct BudgetRow {
    year: Option<i32>,
    category: BudgetCategory,
}

/// Snapshot of the hosted backend's tables, normalized on load.
pub struct JsonExport {
    donations: Vec<Donation>,
    expenses: Vec<Expense>,
    budgets: Vec<BudgetRow>,
    campaigns: Vec<Campaign>,
    top_donors: Option<Vec<Donation>>,
}

impl JsonExport {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self> {
        let file: ExportFile = serde_json::from_str(content)?;
        let donations: Vec<Donation> = file.donations.into_iter().map(Donation::from).collect();

        let campaigns = file
            .campaigns
            .into_iter()
            .map(|raw| {
                let has_raised = raw.has_raised();
                let mut campaign = Campaign::from(raw);
                if !has_raised {
                    campaign.raised = donations
                        .iter()
                        .filter(|d| d.is_completed() && d.campaign_id == Some(campaign.id))
                        .map(|d| d.amount)
                        .sum();
                }
                campaign
            })
            .collect();

        let budgets = file
            .budget_categories
            .into_iter()
            .map(|raw| BudgetRow {
                year: raw.year(),
                category: BudgetCategory::from(raw),
            })
            .collect();

        // Ranking rows only ever contain settled gifts.
        let top_donors = file.top_donors.map(|rows| {
            rows.into_iter()
                .map(|raw| {
                    let mut d = Donation::from(raw);
                    d.status = DonationStatus::Completed;
                    d
                })
                .collect()
        });

        Ok(Self {
            donations,
            expenses: file.expenses.into_iter().map(Expense::from).collect(),
            budgets,
            campaigns,
            top_donors,
        })
    }

    pub fn donation_rows(&self) -> &[Donation] {
        &self.donations
    }

    pub fn expense_rows(&self) -> &[Expense] {
        &self.expenses
    }

    pub fn campaign_rows(&self) -> &[Campaign] {
        &self.campaigns
    }

    /// Budget allocations with the year each row was tagged with, if any.
    pub fn budget_rows(&self) -> impl Iterator<Item = (Option<i32>, &BudgetCategory)> {
        self.budgets.iter().map(|b| (b.year, &b.category))
    }
}

impl DataSource for JsonExport {
    fn donations(&self, filter: &DonationFilter) -> Result<Vec<Donation>> {
        Ok(self
            .donations
            .iter()
            .filter(|d| filter.matches(d))
            .cloned()
            .collect())
    }

    fn expenses(&self, range: Option<&DateRange>) -> Result<Vec<Expense>> {
        Ok(self
            .expenses
            .iter()
            .filter(|e| match (range, e.date) {
                (Some(r), Some(date)) => r.contains(date),
                (Some(_), None) => false,
                (None, _) => true,
            })
            .cloned()
            .collect())
    }

    fn budget_categories(&self, year: i32) -> Result<Vec<BudgetCategory>> {
        Ok(self
            .budgets
            .iter()
            .filter(|b| b.year.map_or(true, |y| y == year))
            .map(|b| b.category.clone())
            .collect())
    }

    fn campaigns(&self) -> Result<Vec<Campaign>> {
        Ok(self.campaigns.clone())
    }

    fn top_donors_rpc(&self, limit: usize) -> Result<Vec<Donation>> {
        match &self.top_donors {
            Some(rows) => {
                let mut ranked = rows.clone();
                ranked.sort_by(|a, b| finite_or_zero(b.amount).total_cmp(&finite_or_zero(a.amount)));
                ranked.truncate(limit);
                Ok(ranked)
            }
            None => Err(RescueError::RpcUnavailable(
                "export has no top_donors ranking".to_string(),
            )),
        }
    }
}

/// Calendar year of the newest dated donation or expense, if any.
pub fn latest_year(export: &JsonExport) -> Option<i32> {
    let donation_dates = export.donations.iter().filter_map(|d| d.date);
    let expense_dates = export.expenses.iter().filter_map(|e| e.date);
    donation_dates.chain(expense_dates).max().map(|d| d.year())
}
