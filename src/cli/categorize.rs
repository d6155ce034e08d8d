use std::path::Path;

use comfy_table::{Cell, Table};

use rescue_ledger::error::Result;

use super::open_store;

pub fn run(db: Option<&Path>) -> Result<()> {
    let store = open_store(db)?;
    let result = store.categorize_uncategorized()?;
    if result.categorized == 0 {
        println!("No uncategorized expenses.");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["Category", "Expenses"]);
    for (category, count) in &result.by_category {
        table.add_row(vec![Cell::new(category.label()), Cell::new(count)]);
    }
    println!("{} expenses categorized\n{table}", result.categorized);
    Ok(())
}
