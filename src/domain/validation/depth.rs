//! Nesting-depth enforcement for the document store.
//!
//! The store rejects writes whose fields nest past a fixed ceiling. Rather
//! than rejecting the whole document, over-deep branches are serialized to
//! JSON strings exactly where the ceiling would be breached, preserving
//! every leaf value while guaranteeing storability. Sequence order is
//! load-bearing: exhibit sections are shown to proctors in authored order.

use serde_json::Value;

/// Hard ceiling on recursion regardless of the configured depth limit.
/// The source data is tree-shaped JSON, so true cycles cannot occur, but
/// malformed input must not cause unbounded recursion.
pub const RECURSION_CEILING: usize = 20;

/// Maximum nesting depth anywhere under `value`.
///
/// The root sits at depth 0; entering a map or sequence adds one level.
pub fn max_depth(value: &Value) -> usize {
    depth_from(value, 0)
}

fn depth_from(value: &Value, current: usize) -> usize {
    if current > RECURSION_CEILING {
        return current;
    }

    match value {
        Value::Object(map) => map
            .values()
            .map(|v| depth_from(v, current + 1))
            .max()
            .unwrap_or(current),
        Value::Array(items) => items
            .iter()
            .map(|v| depth_from(v, current + 1))
            .max()
            .unwrap_or(current),
        _ => current,
    }
}

/// True when `value` holds any node at or past `max_depth`, counting from
/// `current_depth`. Evaluated before sanitizing a branch to decide
/// stringify-versus-recurse.
pub fn has_deep_nesting(value: &Value, current_depth: usize, max_depth: usize) -> bool {
    if current_depth >= max_depth {
        return true;
    }

    match value {
        Value::Object(map) => map
            .values()
            .any(|v| has_deep_nesting(v, current_depth + 1, max_depth)),
        Value::Array(items) => items
            .iter()
            .any(|v| has_deep_nesting(v, current_depth + 1, max_depth)),
        _ => false,
    }
}

/// Rewrites `value` so no branch nests past `max_depth`.
///
/// Scalars pass through. Container children that would breach the ceiling
/// are serialized to JSON strings; the rest are sanitized recursively.
/// Sequences keep their length and element order.
pub fn sanitize(value: &Value, max_depth: usize) -> Value {
    match value {
        Value::Object(map) => {
            let mut out = serde_json::Map::with_capacity(map.len());
            for (key, child) in map {
                out.insert(key.clone(), sanitize_child(child, max_depth));
            }
            Value::Object(out)
        }
        Value::Array(items) => Value::Array(
            items
                .iter()
                .map(|child| sanitize_child(child, max_depth))
                .collect(),
        ),
        scalar => scalar.clone(),
    }
}

fn sanitize_child(child: &Value, max_depth: usize) -> Value {
    match child {
        Value::Object(_) | Value::Array(_) => {
            if has_deep_nesting(child, 1, max_depth) {
                Value::String(stringify(child))
            } else {
                sanitize(child, max_depth)
            }
        }
        scalar => scalar.clone(),
    }
}

fn stringify(value: &Value) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| value.to_string())
}
