//! Financial transparency for a nonprofit cat rescue: donations, expenses,
//! budgets and fundraising campaigns turned into dashboard view models.

pub mod categorizer;
pub mod derive;
pub mod error;
pub mod logging;
pub mod models;
pub mod money;
pub mod reports;
pub mod settings;
pub mod source;
