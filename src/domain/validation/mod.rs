//! Validation and correction stages for parsed station documents.
//!
//! `schema` checks the document against the field contract and fills in
//! missing evaluation sub-scores. `rubric`, `materials` and `exhibits`
//! repair their respective subtrees, and `depth` enforces the document
//! store's nesting ceiling. Every stage takes its input by reference and
//! produces a corrected copy.

pub mod depth;
pub mod exhibits;
pub mod materials;
pub mod rubric;
pub mod schema;

pub use exhibits::{validate_exhibits, ExhibitOutcome};
pub use materials::{sanitize_materials, sanitize_verbal_information};
pub use rubric::sanitize_rubric;
pub use schema::validate_station;
