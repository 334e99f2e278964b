//! HTTP handlers for station endpoints.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use tracing::error;

use crate::application::{Pipeline, StationService};

use super::dto::{
    ErrorResponse, HealthResponse, ProcessStationRequest, ProcessStationResponse,
    SyncStationRequest, SyncStationResponse,
};

/// Application state for station endpoints.
#[derive(Clone)]
pub struct StationAppState {
    /// The repair/validation pipeline.
    pub pipeline: Arc<Pipeline>,
    /// Persistence with fallback behavior.
    pub service: Arc<StationService>,
}

/// Process raw LLM output into a stored station document.
///
/// POST /stations/process
///
/// Never fails for syntactic reasons: malformed input yields a corrected
/// or stub document with the defects listed in the report. Only a
/// storage failure (primary and fallback both down) produces an error.
pub async fn process_station(
    State(state): State<StationAppState>,
    Json(request): Json<ProcessStationRequest>,
) -> impl IntoResponse {
    let processed = state.pipeline.process(&request.raw_text).await;

    match state.service.store_station(&processed.document).await {
        Ok(stored) => (
            StatusCode::OK,
            Json(ProcessStationResponse {
                status: "success".to_string(),
                station_id: stored.station_id,
                persisted_to: stored.backend.as_str().to_string(),
                report: processed.report,
                station_data: processed.document,
            }),
        )
            .into_response(),
        Err(err) => {
            error!(error = %err, "station could not be persisted anywhere");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: format!("Erro ao salvar a estação: {}", err),
                }),
            )
                .into_response()
        }
    }
}

/// Retry a locally persisted record against the primary store.
///
/// POST /stations/sync
pub async fn sync_station(
    State(state): State<StationAppState>,
    Json(request): Json<SyncStationRequest>,
) -> impl IntoResponse {
    match state
        .service
        .sync_to_primary(&request.local_id, &request.document)
        .await
    {
        Ok(canonical_id) => (
            StatusCode::OK,
            Json(SyncStationResponse {
                status: "success".to_string(),
                canonical_id,
            }),
        )
            .into_response(),
        Err(err) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ErrorResponse {
                error: err.to_string(),
            }),
        )
            .into_response(),
    }
}

/// Liveness probe.
///
/// GET /health
pub async fn health() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
