pub mod catalog;
pub mod compare;
pub mod config;
pub mod error;
pub mod forecast;
pub mod funds;
pub mod history;
pub mod history_provider;
pub mod log;
pub mod providers;
pub mod returns;
pub mod series;
pub mod table;
pub mod ui;

use anyhow::Result;

pub use compare::{CompareOptions, ModelChoice};

pub enum AppCommand {
    /// List the funds available for comparison.
    Funds,
    /// Fetch, calculate and display return comparisons.
    Compare(CompareOptions),
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    match command {
        AppCommand::Funds => funds::run(config_path).await,
        AppCommand::Compare(options) => compare::run(config_path, options).await,
    }
}
