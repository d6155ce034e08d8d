pub mod categorize;
pub mod classify;
pub mod import;
pub mod init;
pub mod report;

use std::path::{Path, PathBuf};

use chrono::Datelike;
use clap::{Parser, Subcommand};

use rescue_ledger::error::{RescueError, Result};
use rescue_ledger::reports::DashboardOptions;
use rescue_ledger::settings::{default_db_path, Settings};
use rescue_ledger::source::json::JsonExport;
use rescue_ledger::source::sqlite::SqliteStore;
use rescue_ledger::source::DataSource;

#[derive(Parser)]
#[command(
    name = "rescue-ledger",
    about = "Financial transparency dashboards for a nonprofit cat rescue."
)]
pub struct Cli {
    /// Database to use instead of the configured one
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,
    /// Read from a backend JSON export instead of a database
    #[arg(long, global = true, conflicts_with = "db")]
    pub export: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Choose a data directory and initialize the database.
    Init {
        /// Path for data (default: ~/Documents/rescue-ledger)
        #[arg(long = "data-dir")]
        data_dir: Option<String>,
        /// Organization name shown in the dashboard heading
        #[arg(long)]
        organization: Option<String>,
    },
    /// Copy a backend JSON export into the database.
    Import {
        /// Path to the export file
        file: PathBuf,
    },
    /// Show which expense category a description falls into.
    Classify {
        description: String,
        #[arg(long)]
        vendor: Option<String>,
    },
    /// Assign categories to expenses that have none.
    Categorize,
    /// Print dashboards.
    Report {
        #[command(subcommand)]
        command: ReportCommands,
    },
}

#[derive(Subcommand)]
pub enum ReportCommands {
    /// Income, expenses and net with change from the prior period.
    Summary {
        #[arg(long)]
        year: Option<i32>,
    },
    /// Budget category progress.
    Budgets {
        #[arg(long)]
        year: Option<i32>,
    },
    /// Fundraising campaign progress.
    Campaigns,
    /// Recent and top donors.
    Donors {
        /// Entries per list (default from settings)
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Spending grouped by cat.
    Cats {
        #[arg(long)]
        year: Option<i32>,
    },
    /// Every dashboard at once.
    Dashboard {
        #[arg(long)]
        year: Option<i32>,
    },
}

pub(crate) fn db_path(db: Option<&Path>) -> PathBuf {
    db.map(Path::to_path_buf).unwrap_or_else(default_db_path)
}

pub(crate) fn open_store(db: Option<&Path>) -> Result<SqliteStore> {
    let path = db_path(db);
    if !path.exists() {
        return Err(RescueError::Other(format!(
            "Database not found at {}. Run `rescue-ledger init` to set up.",
            path.display()
        )));
    }
    SqliteStore::open(&path)
}

pub(crate) fn open_source(db: Option<&Path>, export: Option<&Path>) -> Result<Box<dyn DataSource>> {
    match export {
        Some(path) => Ok(Box::new(JsonExport::load(path)?)),
        None => Ok(Box::new(open_store(db)?)),
    }
}

/// Whole-year view when `year` is given, otherwise year to date.
pub(crate) fn dashboard_options(year: Option<i32>, settings: &Settings) -> Result<DashboardOptions> {
    let mut opts = match year {
        Some(y) => DashboardOptions::for_year(y)
            .ok_or_else(|| RescueError::Other(format!("Invalid year: {y}")))?,
        None => DashboardOptions::as_of(chrono::Local::now().date_naive()),
    };
    opts.recent_limit = settings.recent_donor_limit;
    opts.top_limit = settings.top_donor_limit;
    Ok(opts)
}

pub(crate) fn current_year() -> i32 {
    chrono::Local::now().year()
}
