//! Application layer - pipeline orchestration and persistence services.
//!
//! Coordinates the domain stages and the storage ports; holds no domain
//! logic of its own.

mod pipeline;
mod station_service;

pub use pipeline::{Pipeline, ProcessedStation};
pub use station_service::{StationService, StorageBackend, StoredStation};
