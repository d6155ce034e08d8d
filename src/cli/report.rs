use std::path::Path;

use colored::Colorize;
use comfy_table::{Cell, Table};

use rescue_ledger::error::Result;
use rescue_ledger::money::{fixed2, money};
use rescue_ledger::reports::{
    self, BudgetProgress, CampaignProgress, CatExpenseGroup, Dashboard, DonorEntry,
    FundraisingProgress, Standing, SummaryTotals,
};
use rescue_ledger::models::DateRange;
use rescue_ledger::settings::load_settings;
use rescue_ledger::source::DataSource;

use super::{dashboard_options, open_source};

const BAR_CELLS: usize = 20;

/// Text progress bar; any non-zero width shows at least one cell.
fn bar(width_pct: f64) -> String {
    let filled = if width_pct > 0.0 {
        ((width_pct / 100.0 * BAR_CELLS as f64).ceil() as usize).clamp(1, BAR_CELLS)
    } else {
        0
    };
    format!("{}{}", "\u{2588}".repeat(filled), "\u{2591}".repeat(BAR_CELLS - filled))
}

fn change(pct: f64) -> String {
    let text = if pct > 0.0 {
        format!("+{}%", fixed2(pct))
    } else {
        format!("{}%", fixed2(pct))
    };
    if pct >= 0.0 {
        text.green().to_string()
    } else {
        text.red().to_string()
    }
}

fn print_summary(s: &SummaryTotals) {
    let mut table = Table::new();
    table.set_header(vec!["", "Amount", "Change", "Projected (year)"]);
    table.add_row(vec![
        Cell::new("Income".green().bold()),
        Cell::new(money(s.income)),
        Cell::new(change(s.income_change)),
        Cell::new(money(s.projected_income)),
    ]);
    table.add_row(vec![
        Cell::new("Expenses".red().bold()),
        Cell::new(money(s.expenses)),
        Cell::new(change(s.expense_change)),
        Cell::new(money(s.projected_expenses)),
    ]);
    let net_label = if s.net >= 0.0 {
        "Net".green().bold()
    } else {
        "Net".red().bold()
    };
    table.add_row(vec![
        Cell::new(net_label),
        Cell::new(money(s.net)),
        Cell::new(change(s.net_change)),
        Cell::new(""),
    ]);
    println!("Summary ({} donations)\n{table}", s.donation_count);
}

fn print_budgets(budgets: &[BudgetProgress]) {
    if budgets.is_empty() {
        println!("No budget categories.");
        return;
    }
    let mut table = Table::new();
    table.set_header(vec!["Category", "Allocated", "Spent", "Remaining", "Used", "", "Status"]);
    for b in budgets {
        let status = if b.over_budget {
            "Over budget".red().bold().to_string()
        } else if b.at_risk {
            "At risk".yellow().to_string()
        } else {
            "On track".green().to_string()
        };
        table.add_row(vec![
            Cell::new(&b.name),
            Cell::new(money(b.allocated)),
            Cell::new(money(b.spent)),
            Cell::new(money(b.remaining)),
            Cell::new(format!("{:.1}%", b.percent_used)),
            Cell::new(bar(b.bar_width)),
            Cell::new(status),
        ]);
    }
    println!("Budget Categories\n{table}");
}

fn print_campaigns(campaigns: &[CampaignProgress], overall: &FundraisingProgress) {
    if campaigns.is_empty() {
        println!("No fundraising campaigns.");
        return;
    }
    let mut table = Table::new();
    table.set_header(vec!["Campaign", "Raised", "Goal", "Complete", ""]);
    for c in campaigns {
        table.add_row(vec![
            Cell::new(&c.name),
            Cell::new(money(c.progress.raised)),
            Cell::new(money(c.progress.target)),
            Cell::new(format!("{}%", c.progress.label)),
            Cell::new(bar(c.progress.bar_width)),
        ]);
    }
    table.add_row(vec![
        Cell::new("All campaigns".bold()),
        Cell::new(money(overall.raised)),
        Cell::new(money(overall.target)),
        Cell::new(format!("{}%", overall.label)),
        Cell::new(bar(overall.bar_width)),
    ]);
    println!("Fundraising\n{table}");
}

fn print_donors(title: &str, entries: &[DonorEntry]) {
    if entries.is_empty() {
        println!("{title}: no donations yet.");
        return;
    }
    let mut table = Table::new();
    table.set_header(vec!["", "Donor", "Amount"]);
    for e in entries {
        let standing = match &e.standing {
            Standing::Rank(rank) => rank.clone(),
            Standing::Date(Some(date)) => date.format("%Y-%m-%d").to_string(),
            Standing::Date(None) => "\u{2014}".to_string(),
        };
        let name = if e.is_recurring {
            format!("{} (monthly)", e.name)
        } else {
            e.name.clone()
        };
        table.add_row(vec![Cell::new(standing), Cell::new(name), Cell::new(money(e.amount))]);
    }
    println!("{title}\n{table}");
}

fn print_cat_expenses(groups: &[CatExpenseGroup]) {
    if groups.is_empty() {
        println!("No expenses linked to cats.");
        return;
    }
    let mut table = Table::new();
    table.set_header(vec!["Cat", "Date", "Category", "Description", "Amount"]);
    for g in groups {
        table.add_row(vec![
            Cell::new(g.cat_name.bold()),
            Cell::new(""),
            Cell::new(""),
            Cell::new(format!("{} expenses", g.items.len())),
            Cell::new(money(g.total_spent).bold()),
        ]);
        for item in &g.items {
            table.add_row(vec![
                Cell::new(""),
                Cell::new(item.date.map(|d| d.format("%Y-%m-%d").to_string()).unwrap_or_default()),
                Cell::new(item.category.as_deref().unwrap_or("\u{2014}")),
                Cell::new(&item.description),
                Cell::new(money(item.amount)),
            ]);
        }
    }
    println!("Spending by Cat\n{table}");
}

pub fn summary(db: Option<&Path>, export: Option<&Path>, year: Option<i32>) -> Result<()> {
    let source = open_source(db, export)?;
    let opts = dashboard_options(year, &load_settings())?;
    let totals = reports::summary(source.as_ref(), &opts.period)?;
    print_summary(&totals);
    Ok(())
}

pub fn budgets(db: Option<&Path>, export: Option<&Path>, year: Option<i32>) -> Result<()> {
    let source = open_source(db, export)?;
    let opts = dashboard_options(year, &load_settings())?;
    let rows = source.budget_categories(opts.budget_year)?;
    print_budgets(&reports::budget_progress(&rows, opts.month));
    Ok(())
}

pub fn campaigns(db: Option<&Path>, export: Option<&Path>) -> Result<()> {
    let source = open_source(db, export)?;
    let rows = source.campaigns()?;
    let progress: Vec<CampaignProgress> = rows.iter().map(reports::campaign_progress).collect();
    print_campaigns(&progress, &reports::overall_progress(&rows));
    Ok(())
}

pub fn donors(db: Option<&Path>, export: Option<&Path>, limit: Option<usize>) -> Result<()> {
    let source = open_source(db, export)?;
    let settings = load_settings();
    let recent_limit = limit.unwrap_or(settings.recent_donor_limit);
    let top_limit = limit.unwrap_or(settings.top_donor_limit);
    print_donors("Recent Donors", &reports::recent_donors_from(source.as_ref(), recent_limit)?);
    println!();
    print_donors("Top Donors", &reports::top_donors(source.as_ref(), top_limit)?);
    Ok(())
}

pub fn cats(db: Option<&Path>, export: Option<&Path>, year: Option<i32>) -> Result<()> {
    let source = open_source(db, export)?;
    let opts = dashboard_options(year, &load_settings())?;
    let rows = source.expenses(Some(&opts.period))?;
    print_cat_expenses(&reports::group_cat_expenses(&rows));
    Ok(())
}

fn dashboard_heading(organization: &str, period: &DateRange) -> String {
    let span = format!(
        "{} to {}",
        period.start.format("%Y-%m-%d"),
        period.end.format("%Y-%m-%d")
    );
    match organization.trim() {
        "" => format!("Financial Dashboard ({span})"),
        org => format!("{org} Financial Dashboard ({span})"),
    }
}

pub fn dashboard(db: Option<&Path>, export: Option<&Path>, year: Option<i32>) -> Result<()> {
    let source = open_source(db, export)?;
    let settings = load_settings();
    let opts = dashboard_options(year, &settings)?;
    let dash = Dashboard::build(source.as_ref(), &opts);

    println!("{}\n", dashboard_heading(&settings.organization, &opts.period).bold());
    print_summary(&dash.summary);
    println!();
    print_budgets(&dash.budgets);
    println!();
    print_campaigns(&dash.campaigns, &dash.overall);
    println!();
    print_donors("Recent Donors", &dash.recent_donors);
    println!();
    print_donors("Top Donors", &dash.top_donors);
    println!();
    print_cat_expenses(&dash.cat_expenses);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dashboard_heading_names_organization() {
        let year = DateRange::year(2025).unwrap();
        assert_eq!(
            dashboard_heading("Whisker Haven", &year),
            "Whisker Haven Financial Dashboard (2025-01-01 to 2025-12-31)"
        );
        assert_eq!(
            dashboard_heading("  ", &year),
            "Financial Dashboard (2025-01-01 to 2025-12-31)"
        );
    }

    #[test]
    fn test_bar_floor_shows_one_cell() {
        assert_eq!(bar(0.0).chars().filter(|c| *c == '\u{2588}').count(), 0);
        assert_eq!(bar(0.25).chars().filter(|c| *c == '\u{2588}').count(), 1);
        assert_eq!(bar(50.0).chars().filter(|c| *c == '\u{2588}').count(), 10);
        assert_eq!(bar(100.0).chars().filter(|c| *c == '\u{2588}').count(), BAR_CELLS);
        assert_eq!(bar(50.0).chars().count(), BAR_CELLS);
    }
}
