//! Query layer: typed reads against the backing store.
//!
//! Every source hands back canonical [`crate::models`] rows; schema quirks
//! (string amounts, duplicate field spellings) are resolved in [`raw`] and in
//! the SQLite row mappers before anything else sees the data.

pub mod json;
pub mod raw;
pub mod sqlite;

use crate::error::Result;
use crate::models::{BudgetCategory, Campaign, DateRange, Donation, DonationFilter, Expense};

pub trait DataSource {
    fn donations(&self, filter: &DonationFilter) -> Result<Vec<Donation>>;

    /// Expenses, optionally limited to a date range, with their cat joined.
    fn expenses(&self, range: Option<&DateRange>) -> Result<Vec<Expense>>;

    /// Allocations for `year` with spend to date.
    fn budget_categories(&self, year: i32) -> Result<Vec<BudgetCategory>>;

    fn campaigns(&self) -> Result<Vec<Campaign>>;

    /// Server-side top donor ranking. Sources without one return
    /// [`crate::error::RescueError::RpcUnavailable`].
    fn top_donors_rpc(&self, limit: usize) -> Result<Vec<Donation>>;
}
