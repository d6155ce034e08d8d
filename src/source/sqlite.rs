use std::collections::HashMap;
use std::path::Path;

use chrono::{Datelike, NaiveDate};
use rusqlite::types::ValueRef;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use tracing::{info, warn};

use crate::categorizer::{categorize_expense, ExpenseCategory};
use crate::error::{RescueError, Result};
use crate::models::{
    BudgetCategory, Campaign, CatRef, DateRange, Donation, DonationFilter, DonationStatus, Expense,
};
use crate::money::finite_or_zero;
use crate::source::json::JsonExport;
use crate::source::raw::{coerce_text_amount, parse_date, parse_flag_text};
use crate::source::DataSource;

// Amount columns carry no declared type so imported text amounts are kept
// verbatim and normalized on read.
pub const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS cats (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    intake_date TEXT,
    created_at TEXT DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS campaigns (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    description TEXT,
    target DEFAULT 0,
    start_date TEXT,
    end_date TEXT,
    category TEXT,
    created_at TEXT DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS donations (
    id INTEGER PRIMARY KEY,
    amount DEFAULT 0,
    donation_date TEXT,
    donor_name TEXT,
    is_anonymous INTEGER DEFAULT 0,
    status TEXT DEFAULT 'pending',
    is_recurring INTEGER DEFAULT 0,
    campaign_id INTEGER,
    created_at TEXT DEFAULT (datetime('now')),
    FOREIGN KEY (campaign_id) REFERENCES campaigns(id)
);

CREATE TABLE IF NOT EXISTS expenses (
    id INTEGER PRIMARY KEY,
    amount DEFAULT 0,
    expense_date TEXT,
    category TEXT,
    description TEXT NOT NULL DEFAULT '',
    vendor TEXT,
    payment_method TEXT,
    cat_id INTEGER,
    donation_id INTEGER,
    created_at TEXT DEFAULT (datetime('now')),
    FOREIGN KEY (cat_id) REFERENCES cats(id),
    FOREIGN KEY (donation_id) REFERENCES donations(id)
);

CREATE TABLE IF NOT EXISTS budget_categories (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL COLLATE NOCASE,
    allocated DEFAULT 0,
    year INTEGER NOT NULL,
    UNIQUE (name, year)
);
";

pub const TOP_DONORS_VIEW: &str = "
CREATE VIEW IF NOT EXISTS top_donors_ranked AS
SELECT id, amount, donation_date, donor_name, is_anonymous, status, is_recurring, campaign_id
FROM donations
WHERE lower(trim(status)) = 'completed'
ORDER BY CAST(amount AS REAL) DESC, donation_date DESC, id;
";

// (name, annual allocation)
const DEFAULT_BUDGETS: &[(&str, f64)] = &[
    ("Medical", 24000.0),
    ("Food", 9000.0),
    ("Supplies", 4000.0),
    ("Transport", 1500.0),
    ("Spay/Neuter", 6000.0),
    ("Vaccinations", 2500.0),
    ("Microchipping", 800.0),
    ("Facilities", 12000.0),
    ("Administration", 3000.0),
    ("Operations", 2000.0),
];

const DONATION_COLUMNS: &str =
    "id, amount, donation_date, donor_name, is_anonymous, status, is_recurring, campaign_id";

fn amount_at(row: &Row, idx: usize, field: &str) -> rusqlite::Result<f64> {
    Ok(match row.get_ref(idx)? {
        ValueRef::Null => 0.0,
        ValueRef::Integer(i) => i as f64,
        ValueRef::Real(r) => finite_or_zero(r),
        ValueRef::Text(t) => coerce_text_amount(&String::from_utf8_lossy(t), field),
        ValueRef::Blob(_) => {
            warn!(field, "binary amount coerced to zero");
            0.0
        }
    })
}

fn flag_at(row: &Row, idx: usize) -> rusqlite::Result<bool> {
    Ok(match row.get_ref(idx)? {
        ValueRef::Integer(i) => i != 0,
        ValueRef::Real(r) => r != 0.0,
        ValueRef::Text(t) => parse_flag_text(&String::from_utf8_lossy(t)).unwrap_or(false),
        ValueRef::Null | ValueRef::Blob(_) => false,
    })
}

fn date_at(row: &Row, idx: usize) -> rusqlite::Result<Option<NaiveDate>> {
    let raw: Option<String> = row.get(idx)?;
    Ok(raw.as_deref().and_then(parse_date))
}

fn donation_from_row(row: &Row) -> rusqlite::Result<Donation> {
    let status: Option<String> = row.get(5)?;
    Ok(Donation {
        id: row.get(0)?,
        amount: amount_at(row, 1, "donations.amount")?,
        date: date_at(row, 2)?,
        donor_name: row
            .get::<_, Option<String>>(3)?
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty()),
        is_anonymous: flag_at(row, 4)?,
        status: status
            .as_deref()
            .map(DonationStatus::parse)
            .unwrap_or(DonationStatus::Pending),
        is_recurring: flag_at(row, 6)?,
        campaign_id: row.get(7)?,
    })
}

fn iso(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

pub struct CategorizeResult {
    pub categorized: usize,
    pub by_category: Vec<(ExpenseCategory, usize)>,
}

/// SQLite-backed store managed by the CLI.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub fn open(db_path: &Path) -> Result<Self> {
        let conn = Connection::open(db_path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Create the schema; seed this year's budget allocations on first run.
    pub fn init(&self) -> Result<()> {
        self.init_for_year(chrono::Local::now().year())
    }

    pub fn init_for_year(&self, year: i32) -> Result<()> {
        self.conn.execute_batch(SCHEMA)?;

        let count: i64 =
            self.conn
                .query_row("SELECT count(*) FROM budget_categories", [], |row| row.get(0))?;
        if count == 0 {
            for (name, allocated) in DEFAULT_BUDGETS {
                self.set_budget(name, *allocated, year)?;
            }
        }
        Ok(())
    }

    pub fn install_top_donors_view(&self) -> Result<()> {
        self.conn.execute_batch(TOP_DONORS_VIEW)?;
        Ok(())
    }

    /// Names match case-insensitively, so "medical" updates a seeded "Medical".
    pub fn set_budget(&self, name: &str, allocated: f64, year: i32) -> Result<()> {
        self.conn.execute(
            "INSERT INTO budget_categories (name, allocated, year) VALUES (?1, ?2, ?3) \
             ON CONFLICT(name, year) DO UPDATE SET allocated = excluded.allocated",
            params![name.trim(), allocated, year],
        )?;
        Ok(())
    }

    pub fn add_cat(&self, cat: &CatRef) -> Result<()> {
        self.conn.execute(
            "INSERT INTO cats (id, name) VALUES (?1, ?2) \
             ON CONFLICT(id) DO UPDATE SET name = excluded.name",
            params![cat.id, cat.name],
        )?;
        Ok(())
    }

    fn id_or_null(id: i64) -> Option<i64> {
        (id != 0).then_some(id)
    }

    pub fn add_campaign(&self, campaign: &Campaign) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO campaigns (id, name, description, target, start_date, end_date, category) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7) \
             ON CONFLICT(id) DO UPDATE SET name = excluded.name, description = excluded.description, \
             target = excluded.target, start_date = excluded.start_date, \
             end_date = excluded.end_date, category = excluded.category",
            params![
                Self::id_or_null(campaign.id),
                campaign.name,
                campaign.description,
                campaign.target,
                campaign.start_date.map(iso),
                campaign.end_date.map(iso),
                campaign.category,
            ],
        )?;
        Ok(Self::id_or_null(campaign.id).unwrap_or_else(|| self.conn.last_insert_rowid()))
    }

    pub fn add_donation(&self, donation: &Donation) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO donations \
             (id, amount, donation_date, donor_name, is_anonymous, status, is_recurring, campaign_id) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8) \
             ON CONFLICT(id) DO UPDATE SET amount = excluded.amount, \
             donation_date = excluded.donation_date, donor_name = excluded.donor_name, \
             is_anonymous = excluded.is_anonymous, status = excluded.status, \
             is_recurring = excluded.is_recurring, campaign_id = excluded.campaign_id",
            params![
                Self::id_or_null(donation.id),
                donation.amount,
                donation.date.map(iso),
                donation.donor_name,
                donation.is_anonymous,
                donation.status.as_str(),
                donation.is_recurring,
                donation.campaign_id,
            ],
        )?;
        Ok(Self::id_or_null(donation.id).unwrap_or_else(|| self.conn.last_insert_rowid()))
    }

    pub fn add_expense(&self, expense: &Expense) -> Result<i64> {
        if let Some(cat) = &expense.cat {
            self.add_cat(cat)?;
        }
        self.conn.execute(
            "INSERT OR REPLACE INTO expenses \
             (id, amount, expense_date, category, description, vendor, payment_method, cat_id, donation_id) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                Self::id_or_null(expense.id),
                expense.amount,
                expense.date.map(iso),
                expense.category,
                expense.description,
                expense.vendor,
                expense.payment_method,
                expense.cat.as_ref().map(|c| c.id),
                expense.donation_id,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Copy a backend export into this database in one transaction.
    pub fn import_export(&self, export: &JsonExport, default_year: i32) -> Result<ImportSummary> {
        let tx = self.conn.unchecked_transaction()?;
        let mut summary = ImportSummary::default();
        for campaign in export.campaign_rows() {
            self.add_campaign(campaign)?;
            summary.campaigns += 1;
        }
        for donation in export.donation_rows() {
            // Donations pointing at unknown campaigns keep their amount but lose the link.
            let mut donation = donation.clone();
            if let Some(cid) = donation.campaign_id {
                let known: Option<i64> = self
                    .conn
                    .query_row("SELECT id FROM campaigns WHERE id = ?1", [cid], |r| r.get(0))
                    .optional()?;
                if known.is_none() {
                    donation.campaign_id = None;
                }
            }
            self.add_donation(&donation)?;
            summary.donations += 1;
        }
        for expense in export.expense_rows() {
            let mut expense = expense.clone();
            if let Some(did) = expense.donation_id {
                let known: Option<i64> = self
                    .conn
                    .query_row("SELECT id FROM donations WHERE id = ?1", [did], |r| r.get(0))
                    .optional()?;
                if known.is_none() {
                    expense.donation_id = None;
                }
            }
            self.add_expense(&expense)?;
            summary.expenses += 1;
        }
        for (year, budget) in export.budget_rows() {
            self.set_budget(&budget.name, budget.allocated, year.unwrap_or(default_year))?;
            summary.budgets += 1;
        }
        tx.commit()?;
        info!(
            donations = summary.donations,
            expenses = summary.expenses,
            budgets = summary.budgets,
            campaigns = summary.campaigns,
            "imported backend export"
        );
        Ok(summary)
    }

    /// Fill in a category for every expense that has none.
    pub fn categorize_uncategorized(&self) -> Result<CategorizeResult> {
        let mut stmt = self.conn.prepare(
            "SELECT id, description, vendor FROM expenses \
             WHERE category IS NULL OR trim(category) = '' ORDER BY id",
        )?;
        let pending: Vec<(i64, String, Option<String>)> = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let mut counts: HashMap<ExpenseCategory, usize> = HashMap::new();
        for (id, description, vendor) in &pending {
            let category = categorize_expense(description, vendor.as_deref());
            self.conn.execute(
                "UPDATE expenses SET category = ?1 WHERE id = ?2",
                params![category.label(), id],
            )?;
            *counts.entry(category).or_default() += 1;
        }

        let by_category = ExpenseCategory::ALL
            .iter()
            .filter_map(|c| counts.get(c).map(|n| (*c, *n)))
            .collect();
        Ok(CategorizeResult {
            categorized: pending.len(),
            by_category,
        })
    }
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub donations: usize,
    pub expenses: usize,
    pub budgets: usize,
    pub campaigns: usize,
}

impl DataSource for SqliteStore {
    fn donations(&self, filter: &DonationFilter) -> Result<Vec<Donation>> {
        let mut clauses: Vec<String> = Vec::new();
        let mut values: Vec<String> = Vec::new();
        match filter.status {
            Some(DonationStatus::Completed) => {
                clauses.push("lower(trim(status)) = 'completed'".to_string())
            }
            Some(DonationStatus::Pending) => clauses
                .push("(status IS NULL OR lower(trim(status)) <> 'completed')".to_string()),
            None => {}
        }
        if let Some(range) = filter.range {
            values.push(iso(range.start));
            values.push(iso(range.end));
            clauses.push(format!(
                "substr(donation_date, 1, 10) BETWEEN ?{} AND ?{}",
                values.len() - 1,
                values.len()
            ));
        }
        let where_clause = if clauses.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", clauses.join(" AND "))
        };
        let sql = format!(
            "SELECT {DONATION_COLUMNS} FROM donations{where_clause} \
             ORDER BY donation_date DESC, id DESC"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params_from_iter(values.iter()), donation_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn expenses(&self, range: Option<&DateRange>) -> Result<Vec<Expense>> {
        let (clause, values) = match range {
            Some(r) => (
                " WHERE substr(e.expense_date, 1, 10) BETWEEN ?1 AND ?2",
                vec![iso(r.start), iso(r.end)],
            ),
            None => ("", Vec::new()),
        };
        let sql = format!(
            "SELECT e.id, e.amount, e.expense_date, e.category, e.description, e.vendor, \
             e.payment_method, e.cat_id, c.name, e.donation_id \
             FROM expenses e LEFT JOIN cats c ON e.cat_id = c.id{clause} \
             ORDER BY e.expense_date, e.id"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params_from_iter(values.iter()), |row| {
                let cat_id: Option<i64> = row.get(7)?;
                let cat_name: Option<String> = row.get(8)?;
                Ok(Expense {
                    id: row.get(0)?,
                    amount: amount_at(row, 1, "expenses.amount")?,
                    date: date_at(row, 2)?,
                    category: row
                        .get::<_, Option<String>>(3)?
                        .filter(|c| !c.trim().is_empty()),
                    description: row.get(4)?,
                    vendor: row.get(5)?,
                    payment_method: row.get(6)?,
                    cat: cat_id.map(|id| CatRef {
                        id,
                        name: cat_name.unwrap_or_else(|| format!("Cat #{id}")),
                    }),
                    donation_id: row.get(9)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn budget_categories(&self, year: i32) -> Result<Vec<BudgetCategory>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, allocated FROM budget_categories WHERE year = ?1 ORDER BY name",
        )?;
        let mut budgets: Vec<BudgetCategory> = stmt
            .query_map([year], |row| {
                Ok(BudgetCategory {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    allocated: amount_at(row, 2, "budget_categories.allocated")?,
                    spent: 0.0,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let mut spent_by_name: HashMap<String, f64> = HashMap::new();
        let mut stmt = self.conn.prepare(
            "SELECT category, amount FROM expenses \
             WHERE category IS NOT NULL AND substr(expense_date, 1, 4) = ?1",
        )?;
        let rows = stmt.query_map([format!("{year:04}")], |row| {
            Ok((row.get::<_, String>(0)?, amount_at(row, 1, "expenses.amount")?))
        })?;
        for row in rows {
            let (category, amount) = row?;
            *spent_by_name.entry(category.trim().to_lowercase()).or_default() += amount;
        }

        for budget in &mut budgets {
            budget.spent = spent_by_name
                .get(&budget.name.trim().to_lowercase())
                .copied()
                .unwrap_or(0.0);
        }
        Ok(budgets)
    }

    fn campaigns(&self) -> Result<Vec<Campaign>> {
        let mut raised: HashMap<i64, f64> = HashMap::new();
        let mut stmt = self.conn.prepare(
            "SELECT campaign_id, amount FROM donations \
             WHERE campaign_id IS NOT NULL AND lower(trim(status)) = 'completed'",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, i64>(0)?, amount_at(row, 1, "donations.amount")?))
        })?;
        for row in rows {
            let (id, amount) = row?;
            *raised.entry(id).or_default() += amount;
        }

        let mut stmt = self.conn.prepare(
            "SELECT id, name, description, target, start_date, end_date, category \
             FROM campaigns ORDER BY start_date DESC, id",
        )?;
        let campaigns = stmt
            .query_map([], |row| {
                let id: i64 = row.get(0)?;
                Ok(Campaign {
                    id,
                    name: row.get(1)?,
                    description: row.get(2)?,
                    target: amount_at(row, 3, "campaigns.target")?,
                    raised: raised.get(&id).copied().unwrap_or(0.0),
                    start_date: date_at(row, 4)?,
                    end_date: date_at(row, 5)?,
                    category: row.get(6)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(campaigns)
    }

    fn top_donors_rpc(&self, limit: usize) -> Result<Vec<Donation>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let mut stmt = self
            .conn
            .prepare(&format!(
                "SELECT {DONATION_COLUMNS} FROM top_donors_ranked LIMIT ?1"
            ))
            .map_err(|e| RescueError::RpcUnavailable(e.to_string()))?;
        let rows = stmt
            .query_map([limit], donation_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_store() -> (tempfile::TempDir, SqliteStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteStore::open(&dir.path().join("test.db")).unwrap();
        store.init_for_year(2024).unwrap();
        (dir, store)
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn seed(store: &SqliteStore) {
        let conn = store.connection();
        conn.execute("INSERT INTO cats (id, name) VALUES (1, 'Mittens'), (2, 'Shadow')", [])
            .unwrap();
        conn.execute(
            "INSERT INTO campaigns (id, name, target, start_date) VALUES (1, 'Winter Shelter', 1000, '2024-11-01')",
            [],
        )
        .unwrap();
        conn.execute_batch(
            "INSERT INTO donations (amount, donation_date, donor_name, is_anonymous, status, campaign_id) VALUES
                (100, '2024-01-10', 'Ann', 0, 'completed', 1),
                ('250.50', '2024-02-10', 'Jane Doe', 1, 'completed', NULL),
                (75, '2024-02-11', 'Bo', 0, 'pending', 1),
                (40, '2024-03-01T09:15:00Z', 'Cy', 'true', 'Completed', 1);
             INSERT INTO expenses (amount, expense_date, category, description, cat_id) VALUES
                ('10.50', '2024-01-05', 'medical', 'Vet visit', 1),
                (5, '2024-01-06', 'Medical', 'Pills', 1),
                (20, '2024-02-01', 'Food', 'Kibble', 2),
                ('$oops', '2024-02-02', NULL, 'Litter box supplies', NULL),
                (99, '2023-12-31', 'Medical', 'Old vet bill', NULL);",
        )
        .unwrap();
    }

    #[test]
    fn test_init_creates_tables() {
        let (_dir, store) = test_store();
        let tables: Vec<String> = store
            .connection()
            .prepare("SELECT name FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%'")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<std::result::Result<Vec<_>, _>>()
            .unwrap();
        for expected in &["cats", "campaigns", "donations", "expenses", "budget_categories"] {
            assert!(tables.contains(&expected.to_string()), "missing table: {expected}");
        }
    }

    #[test]
    fn test_init_is_idempotent_and_seeds_budgets_once() {
        let (_dir, store) = test_store();
        store.init_for_year(2025).unwrap();
        assert_eq!(store.budget_categories(2024).unwrap().len(), DEFAULT_BUDGETS.len());
        assert!(store.budget_categories(2025).unwrap().is_empty());
    }

    #[test]
    fn test_donation_filters_and_coercion() {
        let (_dir, store) = test_store();
        seed(&store);
        let all = store.donations(&DonationFilter::default()).unwrap();
        assert_eq!(all.len(), 4);

        let completed = store.donations(&DonationFilter::completed()).unwrap();
        assert_eq!(completed.len(), 3);
        let jane = completed.iter().find(|d| d.donor_name.as_deref() == Some("Jane Doe")).unwrap();
        assert_eq!(jane.amount, 250.5);
        assert!(jane.is_anonymous);
        let cy = completed.iter().find(|d| d.donor_name.as_deref() == Some("Cy")).unwrap();
        assert!(cy.is_anonymous);
        assert_eq!(cy.date, Some(date(2024, 3, 1)));

        let feb = DateRange::new(date(2024, 2, 1), date(2024, 3, 1));
        let in_feb = store.donations(&DonationFilter::completed_in(feb)).unwrap();
        assert_eq!(in_feb.len(), 2);

        let pending = store
            .donations(&DonationFilter {
                status: Some(DonationStatus::Pending),
                range: None,
            })
            .unwrap();
        assert_eq!(pending.len(), 1);
    }

    #[test]
    fn test_expenses_join_cats_and_coerce_amounts() {
        let (_dir, store) = test_store();
        seed(&store);
        let year = DateRange::year(2024).unwrap();
        let rows = store.expenses(Some(&year)).unwrap();
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[0].amount, 10.5);
        assert_eq!(rows[0].cat.as_ref().map(|c| c.name.as_str()), Some("Mittens"));
        let bad = rows.iter().find(|e| e.description == "Litter box supplies").unwrap();
        assert_eq!(bad.amount, 0.0);
        assert!(bad.cat.is_none());
        assert_eq!(store.expenses(None).unwrap().len(), 5);
    }

    #[test]
    fn test_budget_spent_is_case_insensitive_and_yearly() {
        let (_dir, store) = test_store();
        seed(&store);
        let budgets = store.budget_categories(2024).unwrap();
        let medical = budgets.iter().find(|b| b.name == "Medical").unwrap();
        assert_eq!(medical.spent, 15.5);
        assert_eq!(medical.allocated, 24000.0);
        let food = budgets.iter().find(|b| b.name == "Food").unwrap();
        assert_eq!(food.spent, 20.0);
    }

    #[test]
    fn test_campaign_raised_counts_completed_only() {
        let (_dir, store) = test_store();
        seed(&store);
        let campaigns = store.campaigns().unwrap();
        assert_eq!(campaigns.len(), 1);
        assert_eq!(campaigns[0].raised, 140.0);
        assert_eq!(campaigns[0].target, 1000.0);
    }

    #[test]
    fn test_top_donors_rpc_requires_view() {
        let (_dir, store) = test_store();
        seed(&store);
        let err = store.top_donors_rpc(3).unwrap_err();
        assert!(matches!(err, RescueError::RpcUnavailable(_)));

        store.install_top_donors_view().unwrap();
        let rows = store.top_donors_rpc(2).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].amount, 250.5);
        assert_eq!(rows[1].amount, 100.0);
    }

    #[test]
    fn test_categorize_uncategorized() {
        let (_dir, store) = test_store();
        seed(&store);
        let result = store.categorize_uncategorized().unwrap();
        assert_eq!(result.categorized, 1);
        assert_eq!(result.by_category, vec![(ExpenseCategory::Supplies, 1)]);
        let category: String = store
            .connection()
            .query_row(
                "SELECT category FROM expenses WHERE description = 'Litter box supplies'",
                [],
                |r| r.get(0),
            )
            .unwrap();
        assert_eq!(category, "Supplies");
        assert_eq!(store.categorize_uncategorized().unwrap().categorized, 0);
    }

    #[test]
    fn test_import_export() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.init_for_year(2024).unwrap();
        let export = JsonExport::from_str(
            r#"{
                "campaigns": [{"id": 3, "name": "Kitten Season", "target": "500"}],
                "donations": [
                    {"id": 10, "amount": "60", "donation_date": "2024-05-01", "status": "completed", "campaign_id": 3},
                    {"id": 11, "amount": 5, "donation_date": "2024-05-02", "status": "completed", "campaign_id": 42}
                ],
                "expenses": [
                    {"id": 1, "amount": "12.25", "expense_date": "2024-05-03", "description": "Kibble", "cats": {"id": 7, "name": "Pepper"}, "donation_id": 999}
                ],
                "budget_categories": [{"name": "Food", "allocated": 700}]
            }"#,
        )
        .unwrap();
        let summary = store.import_export(&export, 2024).unwrap();
        assert_eq!(
            summary,
            ImportSummary {
                donations: 2,
                expenses: 1,
                budgets: 1,
                campaigns: 1
            }
        );
        let campaigns = store.campaigns().unwrap();
        assert_eq!(campaigns[0].raised, 60.0);
        let expenses = store.expenses(None).unwrap();
        assert_eq!(expenses[0].cat.as_ref().map(|c| c.name.as_str()), Some("Pepper"));
        assert_eq!(expenses[0].donation_id, None);
        let food = store
            .budget_categories(2024)
            .unwrap()
            .into_iter()
            .find(|b| b.name == "Food")
            .unwrap();
        assert_eq!(food.allocated, 700.0);
        assert_eq!(food.spent, 0.0);
    }

    #[test]
    fn test_reimport_updates_in_place() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.init_for_year(2024).unwrap();
        let first = JsonExport::from_str(
            r#"{
                "campaigns": [{"id": 1, "name": "Winter Shelter", "target": 1000}],
                "donations": [{"id": 1, "amount": 10, "status": "completed", "campaign_id": 1}]
            }"#,
        )
        .unwrap();
        store.import_export(&first, 2024).unwrap();
        let second = JsonExport::from_str(
            r#"{
                "campaigns": [{"id": 1, "name": "Winter Shelter", "target": 2000}],
                "donations": [{"id": 1, "amount": 25, "status": "completed", "campaign_id": 1}]
            }"#,
        )
        .unwrap();
        store.import_export(&second, 2024).unwrap();

        let campaigns = store.campaigns().unwrap();
        assert_eq!(campaigns.len(), 1);
        assert_eq!(campaigns[0].target, 2000.0);
        assert_eq!(campaigns[0].raised, 25.0);
        assert_eq!(store.donations(&DonationFilter::default()).unwrap().len(), 1);
    }

    #[test]
    fn test_import_budget_matches_seeded_name_case_insensitively() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.init_for_year(2025).unwrap();
        let export = JsonExport::from_str(
            r#"{
                "budget_categories": [{"name": " medical", "allocated": 5000, "year": 2025}],
                "expenses": [{"id": 1, "amount": 100, "expense_date": "2025-04-01", "category": "medical", "description": "Vet"}]
            }"#,
        )
        .unwrap();
        store.import_export(&export, 2025).unwrap();

        let budgets = store.budget_categories(2025).unwrap();
        assert_eq!(budgets.len(), DEFAULT_BUDGETS.len());
        let medical: Vec<&BudgetCategory> = budgets
            .iter()
            .filter(|b| b.name.eq_ignore_ascii_case("medical"))
            .collect();
        assert_eq!(medical.len(), 1);
        assert_eq!(medical[0].name, "Medical");
        assert_eq!(medical[0].allocated, 5000.0);
        assert_eq!(medical[0].spent, 100.0);
        let total_spent: f64 = budgets.iter().map(|b| b.spent).sum();
        assert_eq!(total_spent, 100.0);
    }

    #[test]
    fn test_reimport_renames_cat() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.init_for_year(2025).unwrap();
        for name in ["Kitten 7", "Pepper"] {
            let export = JsonExport::from_str(&format!(
                r#"{{"expenses": [{{"id": 1, "amount": 5, "description": "Kibble", "cats": {{"id": 7, "name": "{name}"}}}}]}}"#
            ))
            .unwrap();
            store.import_export(&export, 2025).unwrap();
        }
        let expenses = store.expenses(None).unwrap();
        assert_eq!(expenses.len(), 1);
        assert_eq!(expenses[0].cat.as_ref().map(|c| c.name.as_str()), Some("Pepper"));
    }
}
