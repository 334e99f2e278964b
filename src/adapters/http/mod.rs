//! HTTP adapters - REST API implementations.

pub mod station;

pub use station::handlers::health;
pub use station::{station_router, StationAppState};
