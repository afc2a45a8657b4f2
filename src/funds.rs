//! The `funds` command: fetch the catalog and list selectable funds.

use crate::catalog::CatalogProvider;
use crate::config::AppConfig;
use crate::providers::vanguard::VanguardProvider;
use crate::ui;
use anyhow::Result;
use comfy_table::Cell;
use tracing::{debug, info};

pub async fn run(config_path: Option<&str>) -> Result<()> {
    info!("Listing available funds...");

    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");

    let provider = VanguardProvider::new(&config.provider.base_url)?;
    let catalog = provider.fetch_catalog().await?;

    if catalog.is_empty() {
        println!("No accumulation funds found in the catalog.");
        return Ok(());
    }

    let mut table = ui::new_styled_table();
    table.set_header(vec![ui::header_cell("Fund"), ui::header_cell("Code")]);
    for listing in catalog.iter() {
        table.add_row(vec![
            Cell::new(listing.name.trim()),
            Cell::new(&listing.code),
        ]);
    }

    println!("{table}");
    println!("{} accumulation funds available.", catalog.len());
    Ok(())
}
