//! Station HTTP adapter - thin endpoint layer over the pipeline.

pub mod dto;
pub mod handlers;
pub mod routes;

pub use handlers::StationAppState;
pub use routes::station_router;
