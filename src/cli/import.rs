use std::path::Path;

use rescue_ledger::error::Result;
use rescue_ledger::source::json::{latest_year, JsonExport};

use super::{current_year, open_store};

pub fn run(db: Option<&Path>, file: &Path) -> Result<()> {
    let store = open_store(db)?;
    let export = JsonExport::load(file)?;
    let default_year = latest_year(&export).unwrap_or_else(current_year);
    let summary = store.import_export(&export, default_year)?;
    println!(
        "{} donations, {} expenses, {} budgets, {} campaigns imported",
        summary.donations, summary.expenses, summary.budgets, summary.campaigns
    );
    Ok(())
}
