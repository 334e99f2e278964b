//! station-forge binary entry point.
//!
//! Loads configuration, initializes tracing, wires the pipeline and
//! storage services, and serves the thin HTTP layer. The primary
//! document store is an external collaborator; without one configured
//! the service runs in degraded mode against the local fallback.

use std::sync::Arc;

use axum::http::HeaderValue;
use axum::{routing::get, Router};
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

use station_forge::adapters::ai::{GeminiConfig, GeminiProvider};
use station_forge::adapters::http::{health, station_router, StationAppState};
use station_forge::adapters::storage::FileStationStore;
use station_forge::application::{Pipeline, StationService};
use station_forge::config::{AppConfig, ServerConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    config.validate()?;

    init_tracing(&config.server);
    info!(
        environment = ?config.server.environment,
        "starting station-forge"
    );

    let generator = GeminiProvider::new(GeminiConfig::from_app_config(&config.ai));
    let pipeline = Arc::new(Pipeline::new(Arc::new(generator)));

    let fallback = Arc::new(FileStationStore::new(config.storage.fallback_path()));
    // The document database client is wired by deployment; until then
    // every write lands on the filesystem fallback.
    let service = Arc::new(StationService::new(None, fallback));

    let state = StationAppState { pipeline, service };

    let cors = if config.server.is_production() {
        let origins: Vec<HeaderValue> = config
            .server
            .cors_origins_list()
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();
        CorsLayer::new().allow_origin(origins)
    } else {
        CorsLayer::permissive()
    };

    let app = Router::new()
        .route("/health", get(health))
        .nest("/api/stations", station_router())
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(config.server.request_timeout()))
        .layer(cors)
        .with_state(state);

    let addr = config.server.socket_addr()?;
    info!(%addr, "listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn init_tracing(server: &ServerConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(server.log_level.clone()));

    if server.is_production() {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}
