use axum::{middleware::from_fn_with_state, routing::get, Router};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing_subscriber::EnvFilter;

use retailer_rs::{
    config::Config,
    db,
    metrics::Metrics,
    middleware::metrics::{metrics_middleware, MetricsMiddlewareState},
    routes,
    AppState,
};

#[tokio::main]
async fn main() {
    // Load environment variables from .env file (if present)
    dotenvy::dotenv().ok();

    // Initialize tracing/logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    tracing::info!("Starting retailer service...");

    // Load configuration from environment
    let config = Config::from_env().expect("Failed to load configuration from environment");

    tracing::info!(
        "Configuration loaded: host={}, port={}",
        config.host,
        config.port
    );

    // Database connection
    tracing::info!("Connecting to database...");
    let pool = db::init_pool(&config.database_url)
        .await
        .expect("Failed to connect to database");

    // Run migrations
    tracing::info!("Running migrations...");
    sqlx::migrate!("./db/migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations");

    let metrics = Metrics::new();
    metrics.dep_up.with_label_values(&["db"]).set(1);

    let state = Arc::new(AppState {
        pool,
        metrics: metrics.clone(),
    });

    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::metrics))
        .with_state(Arc::new(routes::metrics::MetricsState {
            metrics: metrics.clone(),
        }));

    let metrics_mw_state = Arc::new(MetricsMiddlewareState { metrics });

    // Build the application router
    let app = routes::api_router(state)
        .merge(metrics_router)
        .layer(from_fn_with_state(metrics_mw_state, metrics_middleware))
        .layer(
            CorsLayer::new()
                .allow_origin(tower_http::cors::Any)
                .allow_methods(tower_http::cors::Any)
                .allow_headers(tower_http::cors::Any),
        );

    // Bind to the configured address
    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind address");

    tracing::info!("Retailer service listening on {}", addr);

    // Start the server
    axum::serve(listener, app)
        .await
        .expect("Server failed to start");
}
