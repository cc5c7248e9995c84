//! Catalog listing command

use anyhow::{Context, Result};
use order_dispatch::Config;
use tracing::debug;

pub fn run(config: &Config, json: bool) -> Result<()> {
    let catalog = config.catalog()?;
    debug!(items = catalog.len(), json, "Listing catalog");

    if json {
        let rendered =
            serde_json::to_string_pretty(catalog.items()).context("Failed to serialize catalog")?;
        println!("{}", rendered);
    } else {
        print!("{}", catalog.render_menu());
    }
    Ok(())
}
