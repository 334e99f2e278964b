//! JSON recovery from malformed LLM output.
//!
//! Three layers, applied in order by the pipeline: extraction pulls a
//! candidate payload out of surrounding prose, the sanitizer fixes textual
//! slips, and the structural repairer rebuilds broken nesting. Every layer
//! degrades gracefully; none of them panics on arbitrary input.

mod extract;
mod sanitize;
mod structural;

pub use extract::{expand_boundaries, extract_json, is_balanced};
pub use sanitize::sanitize;
pub use structural::{
    aggressive_repair, balance_brackets, repair, DiagnosticStub, RepairExhausted,
};
