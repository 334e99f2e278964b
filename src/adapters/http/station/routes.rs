//! Axum router configuration for station endpoints.

use axum::{routing::post, Router};

use super::handlers::{process_station, sync_station, StationAppState};

/// Create the station API router.
///
/// # Routes
///
/// - `POST /process` - Process raw LLM output and persist the result
/// - `POST /sync` - Promote a locally persisted record to the primary store
///
/// Suitable for mounting at `/api/stations`.
pub fn station_router() -> Router<StationAppState> {
    Router::new()
        .route("/process", post(process_station))
        .route("/sync", post(sync_station))
}
