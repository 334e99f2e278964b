//! Storage adapters - station store implementations.

mod file_station_store;
mod in_memory_station_store;

pub use file_station_store::FileStationStore;
pub use in_memory_station_store::InMemoryStationStore;
