//! HTTP API server with observability for the order backend.
//!
//! Provides REST endpoints for the order lifecycle (create, get, pay,
//! cancel), with structured logging (tracing) and Prometheus metrics.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::http::StatusCode;
use axum::routing::{get, post};
use domain::{Money, Part};
use metrics_exporter_prometheus::PrometheusHandle;
use orchestrator::{InMemoryInventoryService, InMemoryPaymentService, OrderService};
use order_store::{InMemoryOrderStore, OrderStore, PostgresOrderStore, StoreError};
use sqlx::postgres::PgPoolOptions;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use config::Config;
use routes::orders::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app(
    state: Arc<AppState>,
    metrics_handle: PrometheusHandle,
    request_timeout: Duration,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/api/v1/orders", post(routes::orders::create))
        .route("/api/v1/orders/{order_uuid}", get(routes::orders::get))
        .route("/api/v1/orders/{order_uuid}/pay", post(routes::orders::pay))
        .route(
            "/api/v1/orders/{order_uuid}/cancel",
            post(routes::orders::cancel),
        )
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            request_timeout,
        ))
        .layer(TraceLayer::new_for_http())
}

/// Creates the application state over the given store, with the seeded
/// part catalog and an in-memory payment service.
pub fn create_default_state(store: Arc<dyn OrderStore>) -> Arc<AppState> {
    create_state(store, seed_catalog(), InMemoryPaymentService::new())
}

/// Creates the application state from explicit collaborators.
pub fn create_state(
    store: Arc<dyn OrderStore>,
    inventory: InMemoryInventoryService,
    payment: InMemoryPaymentService,
) -> Arc<AppState> {
    Arc::new(AppState {
        order_service: OrderService::new(store, inventory, payment),
    })
}

/// Returns the catalog the server starts with.
pub fn seed_catalog() -> InMemoryInventoryService {
    InMemoryInventoryService::with_parts([
        Part::new("engine-1", "Main Engine", Money::from_units(1_500_000), 10),
        Part::new("wing-1", "Left Wing", Money::from_units(250_000), 5),
    ])
}

/// Opens the order store described by the configuration.
///
/// Uses PostgreSQL, running pending migrations, when a database URL is
/// configured and an in-memory store otherwise.
pub async fn connect_store(config: &Config) -> Result<Arc<dyn OrderStore>, StoreError> {
    let Some(url) = config.database_url.as_deref() else {
        tracing::info!("no DATABASE_URL set, using in-memory order store");
        return Ok(Arc::new(InMemoryOrderStore::new()));
    };

    let pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .connect(url)
        .await?;

    let store = PostgresOrderStore::new(pool);
    store.run_migrations().await?;
    tracing::info!(
        max_connections = config.database_max_connections,
        "connected to PostgreSQL order store"
    );

    Ok(Arc::new(store))
}
