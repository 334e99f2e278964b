//! Station document vocabulary.
//!
//! A station document is a `serde_json::Value` tree; this module holds the
//! field contract it is validated against, the canonical exhibit content
//! types, and the report type the validation stages accumulate into.

pub mod contract;
mod content_type;
mod report;

pub use content_type::ContentType;
pub use report::ValidationReport;
