use rescue_ledger::categorizer::categorize_expense;
use rescue_ledger::error::Result;

pub fn run(description: &str, vendor: Option<&str>) -> Result<()> {
    println!("{}", categorize_expense(description, vendor));
    Ok(())
}
