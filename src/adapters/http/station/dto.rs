//! Data transfer objects for station HTTP endpoints.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::station::ValidationReport;

/// Request to process raw LLM output into a stored station.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessStationRequest {
    /// Raw model output, fences and prose included.
    pub raw_text: String,
}

/// Response after processing and persisting a station.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessStationResponse {
    pub status: String,
    /// Canonical or locally generated record id.
    pub station_id: String,
    /// Which backend accepted the write ("primary" or "local_fallback").
    pub persisted_to: String,
    /// The full validation report, wire field names preserved.
    pub report: ValidationReport,
    /// The corrected station document.
    pub station_data: Value,
}

/// Request to sync a locally persisted record to the primary store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncStationRequest {
    pub local_id: String,
    pub document: Value,
}

/// Response after a successful sync.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncStationResponse {
    pub status: String,
    pub canonical_id: String,
}

/// Error payload for failed requests.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Health check payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}
