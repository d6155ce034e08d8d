use std::path::Path;

use tracing::info;

use rescue_ledger::error::Result;
use rescue_ledger::settings::{expand_path, load_settings, save_settings};
use rescue_ledger::source::sqlite::SqliteStore;

pub fn run(db: Option<&Path>, data_dir: Option<String>, organization: Option<String>) -> Result<()> {
    let mut settings = load_settings();
    if let Some(dir) = data_dir {
        settings.data_dir = expand_path(&dir).to_string_lossy().into_owned();
    }
    if let Some(org) = organization {
        settings.organization = org;
    }
    save_settings(&settings)?;

    let db_path = match db {
        Some(path) => path.to_path_buf(),
        None => {
            std::fs::create_dir_all(&settings.data_dir)?;
            settings.db_path()
        }
    };

    let store = SqliteStore::open(&db_path)?;
    store.init()?;
    store.install_top_donors_view()?;

    info!(path = %db_path.display(), "database initialized");
    println!("Initialized rescue-ledger at {}", db_path.display());
    Ok(())
}
