mod cli;

use clap::Parser;

use cli::{Cli, Commands, ReportCommands};
use rescue_ledger::logging::init_tracing;
use rescue_ledger::settings::load_settings;

fn main() {
    let cli = Cli::parse();
    init_tracing(&load_settings().log_filter);

    let db = cli.db.as_deref();
    let export = cli.export.as_deref();

    let result = match cli.command {
        Commands::Init {
            data_dir,
            organization,
        } => cli::init::run(db, data_dir, organization),
        Commands::Import { file } => cli::import::run(db, &file),
        Commands::Classify {
            description,
            vendor,
        } => cli::classify::run(&description, vendor.as_deref()),
        Commands::Categorize => cli::categorize::run(db),
        Commands::Report { command } => match command {
            ReportCommands::Summary { year } => cli::report::summary(db, export, year),
            ReportCommands::Budgets { year } => cli::report::budgets(db, export, year),
            ReportCommands::Campaigns => cli::report::campaigns(db, export),
            ReportCommands::Donors { limit } => cli::report::donors(db, export, limit),
            ReportCommands::Cats { year } => cli::report::cats(db, export, year),
            ReportCommands::Dashboard { year } => cli::report::dashboard(db, export, year),
        },
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
