//! Recompute `items.stock_qty` from the stock lots table.
//!
//! Aggregates are maintained transactionally by the purchase workflow;
//! this binary restores them after manual data surgery.

use tracing_subscriber::EnvFilter;

use retailer_rs::{config::Config, db, repos::stock_repo};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = Config::from_env().expect("Failed to load configuration from environment");

    let pool = db::init_pool(&config.database_url)
        .await
        .expect("Failed to connect to database");

    tracing::info!("Rebuilding stock aggregates...");

    let changed = stock_repo::rebuild_aggregates(&pool)
        .await
        .expect("Failed to rebuild stock aggregates");

    tracing::info!(rows_updated = changed, "Stock aggregates rebuilt");
}
