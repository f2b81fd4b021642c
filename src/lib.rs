pub mod config;
pub mod contracts;
pub mod db;
pub mod health;
pub mod metrics;
pub mod middleware;
pub mod repos;
pub mod routes;
pub mod services;
pub mod validation;

use sqlx::PgPool;

/// Shared state for the /api/retailer handlers
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub metrics: metrics::Metrics,
}
