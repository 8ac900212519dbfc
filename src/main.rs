#![allow(clippy::result_large_err)]

use dotenvy::dotenv;
use jewelry_inventory::api::{CatalogApi, HttpCatalogClient};
use jewelry_inventory::config;
use jewelry_inventory::core::Inventory;
use jewelry_inventory::errors::Result;
use jewelry_inventory::models::StockLevel;
use std::{env, sync::Arc};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file; env vars can also be set externally
    dotenv().ok();
    info!("Attempted to load .env file.");

    // 3. Load the main application configuration
    let app_config = config::load_app_configuration()
        .inspect_err(|e| error!("Critical error loading application configuration: {}", e))?;

    // 4. Connect the catalog client
    let api: Arc<dyn CatalogApi> = Arc::new(
        HttpCatalogClient::new(&app_config.api)
            .inspect_err(|e| error!("Failed to build catalog client: {}", e))?,
    );

    // 5. Load the catalog
    let mut inventory = Inventory::new(api, &app_config);
    inventory
        .load()
        .await
        .inspect(|count| info!("Catalog loaded with {} groups.", count))
        .inspect_err(|e| error!("Failed to load catalog: {}", e))?;

    // 6. Optional search text from the command line
    let search = env::args().skip(1).collect::<Vec<_>>().join(" ");
    if !search.is_empty() {
        inventory.catalog_mut().set_search(search);
    }

    let catalog = inventory.catalog();
    let stats = catalog.stats();
    info!(
        "{} groups, {} variants, {} units in stock",
        stats.group_count, stats.variant_count, stats.total_stock
    );
    for section in catalog.sections() {
        info!("{}: {} groups", section.category, section.groups.len());
        for group in section.groups {
            info!("  {} ({} units)", group.name, group.total_stock());
        }
    }
    for group in catalog.low_stock_groups() {
        warn!(
            "Low stock: {} has {} units (threshold {})",
            group.name,
            group.total_stock(),
            catalog.low_stock_threshold()
        );
    }
    for (group, variant, level) in catalog.variants_needing_restock() {
        let label = variant
            .color
            .as_ref()
            .map_or_else(|| variant.id.to_string(), |c| c.name.clone());
        match level {
            StockLevel::Critical => warn!(
                "Critical stock: {} / {} has {} units",
                group.name, label, variant.stock
            ),
            _ => info!("Low stock: {} / {} has {} units", group.name, label, variant.stock),
        }
    }

    Ok(())
}
