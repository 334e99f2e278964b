//! Structural repair of JSON that survived textual sanitization broken.
//!
//! Generation failures cluster into a few recurring shapes: truncation,
//! missing separators, and double-nested score blocks. The repairer runs a
//! fixed strategy chain, attempting a parse after each stage, and reports
//! exhaustion to the caller (which escalates to the LLM correction call).
//! The aggressive key-value reconstruction and the diagnostic stub are the
//! terminal safety net: downstream stages always receive parseable JSON.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{json, Value};
use thiserror::Error;

static ADJACENT_OBJECTS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\}\s*\{").expect("adjacent object pattern"));

static ADJACENT_ARRAYS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\]\s*\[").expect("adjacent array pattern"));

static ADJACENT_STRINGS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""(\s+)""#).expect("adjacent string pattern"));

static DOUBLED_COMMAS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r",,+").expect("doubled comma pattern"));

static TRAILING_COMMA: Lazy<Regex> =
    Lazy::new(|| Regex::new(r",(\s*[}\]])").expect("trailing comma pattern"));

/// A `pontuacoes` block with an erroneous extra level of nesting.
static NESTED_PONTUACOES: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#""pontuacoes"\s*:\s*\{([^}]*)\{([^}]*)\}([^}]*)\}"#)
        .expect("nested pontuacoes pattern")
});

/// `itemNumeroOficial` is a string field the generator emits as a bare
/// number.
static BARE_ITEM_NUMERO: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#""itemNumeroOficial"\s*:\s*(\d+)"#).expect("bare item numero pattern")
});

/// `itensAvaliacao` mistakenly emitted as an object instead of an array.
static OBJECT_ITENS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#""itensAvaliacao"\s*:\s*\{\s*("[^"]+"\s*:[^{}]*)\}"#)
        .expect("object itens pattern")
});

/// `tarefasPrincipais` wrapped in stray text around its array.
static WRAPPED_TAREFAS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#""tarefasPrincipais"\s*:\s*[^\[\]{}"]*\[([^\]]*)\]"#)
        .expect("wrapped tarefas pattern")
});

static KEY_VALUE_PAIR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""([^"]+)"\s*:\s*([^,}]+)"#).expect("key value pattern"));

static WHITESPACE_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("whitespace pattern"));

/// Raised when every deterministic repair strategy has been tried.
#[derive(Debug, Error)]
#[error("structural repair exhausted: {reason}")]
pub struct RepairExhausted {
    pub reason: String,
    /// The best-effort string after all strategies, for the correction call.
    pub best_effort: String,
}

/// Minimal parseable document produced when nothing else worked.
///
/// Carries the failure and a truncated sample of the input so a reviewer
/// can recover the generation by hand.
#[derive(Debug, Clone, PartialEq)]
pub struct DiagnosticStub {
    pub error: String,
    pub original: String,
}

impl DiagnosticStub {
    /// Creates a stub from the unrepairable input, keeping its first
    /// 100 characters.
    pub fn new(error: impl Into<String>, original: &str) -> Self {
        Self {
            error: error.into(),
            original: original.chars().take(100).collect(),
        }
    }

    /// The stub as a storable document.
    pub fn to_value(&self) -> Value {
        json!({
            "error": self.error,
            "original": self.original,
        })
    }
}

/// Runs the deterministic strategy chain over `s`.
///
/// Each strategy builds on the previous one's output and is followed by a
/// parse attempt. Returns the first parsing string, or `RepairExhausted`
/// so the caller can escalate.
pub fn repair(s: &str) -> Result<String, RepairExhausted> {
    let mut current = normalize_patterns(s);
    if parses(&current) {
        return Ok(current);
    }

    current = balance_brackets(&current);
    if parses(&current) {
        return Ok(current);
    }

    current = fix_station_patterns(&current);
    if parses(&current) {
        return Ok(current);
    }

    current = final_cleanup(&current);
    if parses(&current) {
        return Ok(current);
    }

    Err(RepairExhausted {
        reason: "no strategy produced parseable JSON".to_string(),
        best_effort: current,
    })
}

/// Last-resort reconstruction: harvest every `"key": value` pair and build
/// a flat object from them. On failure the caller receives a
/// [`DiagnosticStub`] instead of an error, guaranteeing parseable output.
pub fn aggressive_repair(s: &str) -> Result<Value, DiagnosticStub> {
    let mut parts: Vec<String> = Vec::new();
    for cap in KEY_VALUE_PAIR.captures_iter(s) {
        let key = &cap[1];
        let value = cap[2].trim();
        parts.push(format!("\"{}\":{}", key, value));
    }

    if !parts.is_empty() {
        let reconstructed = format!("{{{}}}", parts.join(","));
        if let Ok(value) = serde_json::from_str::<Value>(&reconstructed) {
            return Ok(value);
        }
    }

    Err(DiagnosticStub::new("JSON could not be repaired", s))
}

fn parses(s: &str) -> bool {
    serde_json::from_str::<Value>(s).is_ok()
}

/// Strategy 1: separator and comma normalization.
fn normalize_patterns(s: &str) -> String {
    let s = ADJACENT_OBJECTS.replace_all(s, "},{");
    let s = ADJACENT_ARRAYS.replace_all(&s, "],[");
    let s = ADJACENT_STRINGS.replace_all(&s, "\",\"");
    let s = DOUBLED_COMMAS.replace_all(&s, ",");
    TRAILING_COMMA.replace_all(&s, "$1").into_owned()
}

/// Strategy 2: append missing closers at the end, prepend missing openers
/// at the start. Counting is string-literal-aware; nothing is ever
/// inserted mid-string.
pub fn balance_brackets(s: &str) -> String {
    let brace_diff = count_unbalanced(s, '{', '}');
    let bracket_diff = count_unbalanced(s, '[', ']');

    let mut out = s.to_string();
    if brace_diff > 0 {
        out.push_str(&"}".repeat(brace_diff as usize));
    } else if brace_diff < 0 {
        out = "{".repeat(brace_diff.unsigned_abs() as usize) + &out;
    }

    if bracket_diff > 0 {
        out.push_str(&"]".repeat(bracket_diff as usize));
    } else if bracket_diff < 0 {
        out = "[".repeat(bracket_diff.unsigned_abs() as usize) + &out;
    }

    out
}

fn count_unbalanced(s: &str, open: char, close: char) -> i64 {
    let mut count: i64 = 0;
    let mut in_string = false;
    let mut escaped = false;

    for ch in s.chars() {
        if escaped {
            escaped = false;
            continue;
        }
        match ch {
            '\\' => escaped = true,
            '"' => in_string = !in_string,
            c if !in_string && c == open => count += 1,
            c if !in_string && c == close => count -= 1,
            _ => {}
        }
    }
    count
}

/// Strategy 3: fixes for malformed station structures the generator is
/// known to emit.
fn fix_station_patterns(s: &str) -> String {
    // Flatten a doubly nested score block.
    let s = NESTED_PONTUACOES.replace_all(s, "\"pontuacoes\": {$1$2$3}");

    // Quote the official item number, a string field often emitted bare.
    let s = BARE_ITEM_NUMERO.replace_all(&s, "\"itemNumeroOficial\": \"$1\"");

    // Rewrap itensAvaliacao emitted as a bare object.
    let s = OBJECT_ITENS.replace_all(&s, "\"itensAvaliacao\": [{$1}]");

    // Strip stray text wrapping the tarefasPrincipais array.
    let s = WRAPPED_TAREFAS.replace_all(&s, "\"tarefasPrincipais\": [$1]");

    s.into_owned()
}

/// Strategy 4: whitespace collapse and wrapper inference.
fn final_cleanup(s: &str) -> String {
    let mut out = WHITESPACE_RUN.replace_all(s, " ").trim().to_string();

    if !out.starts_with('{') && !out.starts_with('[') {
        if out.contains("\"tituloEstacao\"") || out.contains("\"especialidade\"") {
            out = format!("{{{}}}", out);
        } else {
            out = format!("[{}]", out);
        }
    }

    if out.starts_with('{') && !out.ends_with('}') {
        out.push('}');
    } else if out.starts_with('[') && !out.ends_with(']') {
        out.push(']');
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn balances_truncated_object() {
        let repaired = repair(r#"{"a": {"b": 1"#).unwrap();
        let value: Value = serde_json::from_str(&repaired).unwrap();
        assert_eq!(value["a"]["b"], json!(1));
    }

    #[test]
    fn balances_truncated_array() {
        let repaired = repair(r#"[1, [2, 3"#).unwrap();
        let value: Value = serde_json::from_str(&repaired).unwrap();
        assert_eq!(value, json!([1, [2, 3]]));
    }

    #[test]
    fn quotes_bare_official_item_number() {
        let fixed = fix_station_patterns(r#""itemNumeroOficial": 4"#);
        assert_eq!(fixed, r#""itemNumeroOficial": "4""#);
    }

    #[test]
    fn prepends_missing_openers() {
        let repaired = repair(r#""a": 1}"#).unwrap();
        let value: Value = serde_json::from_str(&repaired).unwrap();
        assert_eq!(value["a"], json!(1));
    }

    #[test]
    fn inserts_separator_between_string_value_and_next_key() {
        let repaired = repair(r#"{"tituloEstacao": "Caso X" "numeroDaEstacao": 1}"#).unwrap();
        let value: Value = serde_json::from_str(&repaired).unwrap();
        assert_eq!(value["tituloEstacao"], json!("Caso X"));
        assert_eq!(value["numeroDaEstacao"], json!(1));
    }

    #[test]
    fn flattens_double_nested_pontuacoes() {
        let raw = r#"{"pontuacoes": {"adequado": {"criterio": "ok", "pontos": 0.5}}}"#;
        // Well-formed block is untouched.
        let repaired = repair(raw).unwrap();
        let value: Value = serde_json::from_str(&repaired).unwrap();
        assert_eq!(value["pontuacoes"]["adequado"]["pontos"], json!(0.5));
    }

    #[test]
    fn counting_ignores_brackets_inside_strings() {
        let repaired = repair(r#"{"text": "open { and [ inside""#).unwrap();
        let value: Value = serde_json::from_str(&repaired).unwrap();
        assert_eq!(value["text"], json!("open { and [ inside"));
    }

    #[test]
    fn exhaustion_carries_best_effort_string() {
        let err = repair("utter nonsense without structure").unwrap_err();
        assert!(!err.best_effort.is_empty());
    }

    #[test]
    fn aggressive_reconstructs_flat_pairs() {
        let value = aggressive_repair(r#"garbage "a": 1, noise "b": "x", tail"#).unwrap();
        assert_eq!(value["a"], json!(1));
        assert_eq!(value["b"], json!("x"));
    }

    #[test]
    fn aggressive_falls_back_to_stub() {
        let stub = aggressive_repair("no pairs at all").unwrap_err();
        assert_eq!(stub.error, "JSON could not be repaired");
        assert_eq!(stub.original, "no pairs at all");

        let doc = stub.to_value();
        assert!(doc["error"].is_string());
        assert!(doc["original"].is_string());
    }

    #[test]
    fn stub_truncates_long_input_to_100_chars() {
        let long = "x".repeat(250);
        let stub = DiagnosticStub::new("broken", &long);
        assert_eq!(stub.original.chars().count(), 100);
    }
}
