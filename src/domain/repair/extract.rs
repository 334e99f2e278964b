//! Candidate JSON extraction from free-running LLM output.
//!
//! Models wrap their JSON in prose, code fences, or ad-hoc tags, and often
//! truncate it. Extraction tries a fixed ladder of strategies and returns
//! the first structurally balanced candidate; when everything fails it
//! returns the trimmed input so the caller's parse attempt produces the
//! diagnostic instead of this module.

use once_cell::sync::Lazy;
use regex::Regex;

static FENCED_JSON: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)```json\s*(\{[\s\S]*?\}|\[[\s\S]*?\])\s*```").expect("fenced json pattern")
});

static FENCED_ANY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)```\s*(\{[\s\S]*?\}|\[[\s\S]*?\])\s*```").expect("fenced pattern")
});

static TAGGED_JSON: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)<json>\s*(\{[\s\S]*?\}|\[[\s\S]*?\])\s*</json>").expect("tagged pattern")
});

static OBJECT_CANDIDATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\{[^{}]*(?:\{[^{}]*\}[^{}]*)*\}").expect("object candidate pattern")
});

static ARRAY_CANDIDATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\[[^\[\]]*(?:\[[^\[\]]*\][^\[\]]*)*\]").expect("array candidate pattern")
});

/// Key pairs that identify a station object even when the regex only
/// captured a fragment of it.
static STATION_MARKERS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r#"\{[^{}]*"tituloEstacao"[^{}]*"numeroDaEstacao"[^{}]*\}"#,
        r#"\{[^{}]*"idEstacao"[^{}]*"especialidade"[^{}]*\}"#,
        r#"\{[^{}]*"instrucoesParticipante"[^{}]*"padraoEsperadoProcedimento"[^{}]*\}"#,
    ]
    .iter()
    .map(|p| Regex::new(p).expect("station marker pattern"))
    .collect()
});

/// Extracts the most likely JSON payload from `text`.
///
/// Strategies are tried in order; the first balanced candidate wins. When
/// several candidates match a strategy, the earliest in document order is
/// chosen, never the longest.
pub fn extract_json(text: &str) -> String {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return trimmed.to_string();
    }

    // 1) ```json fenced block
    if let Some(m) = FENCED_JSON.captures(text) {
        let candidate = m.get(1).map(|g| g.as_str().trim()).unwrap_or_default();
        if is_balanced(candidate) {
            return candidate.to_string();
        }
    }

    // 2) any fenced block
    if let Some(m) = FENCED_ANY.captures(text) {
        let candidate = m.get(1).map(|g| g.as_str().trim()).unwrap_or_default();
        if is_balanced(candidate) {
            return candidate.to_string();
        }
    }

    // 3) <json> tags
    if let Some(m) = TAGGED_JSON.captures(text) {
        let candidate = m.get(1).map(|g| g.as_str().trim()).unwrap_or_default();
        if is_balanced(candidate) {
            return candidate.to_string();
        }
    }

    // 4) balanced object/array candidates anywhere in the text
    let mut candidates: Vec<(usize, &str)> = Vec::new();
    for m in OBJECT_CANDIDATE.find_iter(text) {
        if is_balanced(m.as_str()) {
            candidates.push((m.start(), m.as_str()));
        }
    }
    for m in ARRAY_CANDIDATE.find_iter(text) {
        if is_balanced(m.as_str()) {
            candidates.push((m.start(), m.as_str()));
        }
    }
    if let Some((_, candidate)) = candidates.iter().min_by_key(|(start, _)| *start) {
        return candidate.to_string();
    }

    // 5) station marker fragments, expanded outward to balance
    for pattern in STATION_MARKERS.iter() {
        if let Some(m) = pattern.find(text) {
            let candidate = expand_boundaries(text, m.start(), m.end());
            if !candidate.is_empty() && is_balanced(&candidate) {
                return candidate;
            }
        }
    }

    // 6) first opener to matching last closer
    let first_brace = text.find('{');
    let first_bracket = text.find('[');
    let first = match (first_brace, first_bracket) {
        (Some(b), Some(k)) => Some(b.min(k)),
        (Some(b), None) => Some(b),
        (None, Some(k)) => Some(k),
        (None, None) => None,
    };

    if let Some(start) = first {
        let closer = if text.as_bytes()[start] == b'{' { '}' } else { ']' };
        if let Some(end) = text.rfind(closer) {
            if end > start {
                let candidate = text[start..=end].trim();
                if is_balanced(candidate) {
                    return candidate.to_string();
                }
            }
        }
    }

    trimmed.to_string()
}

/// Checks that every brace/bracket outside string literals is matched and
/// nesting never goes negative. String literals are tracked with a
/// quote-toggle state machine that honors backslash escapes.
pub fn is_balanced(text: &str) -> bool {
    let text = text.trim();
    if text.is_empty() {
        return false;
    }

    let (open, close) = if text.starts_with('{') && text.ends_with('}') {
        ('{', '}')
    } else if text.starts_with('[') && text.ends_with(']') {
        ('[', ']')
    } else {
        return false;
    };

    let mut count: i64 = 0;
    let mut in_string = false;
    let mut escaped = false;

    for ch in text.chars() {
        if escaped {
            escaped = false;
            continue;
        }
        match ch {
            '\\' => escaped = true,
            '"' => in_string = !in_string,
            c if !in_string && c == open => count += 1,
            c if !in_string && c == close => {
                count -= 1;
                if count < 0 {
                    return false;
                }
            }
            _ => {}
        }
    }

    count == 0
}

/// Expands a fragment match outward to the nearest zero-balance points.
///
/// Scans backward from `start` until the brace or bracket balance goes
/// negative (the enclosing opener), then forward from `end` the same way.
/// Both scans are string-literal- and escape-aware.
pub fn expand_boundaries(text: &str, start: usize, end: usize) -> String {
    let bytes = text.as_bytes();

    let mut real_start = start;
    let mut brace: i64 = 0;
    let mut bracket: i64 = 0;
    let mut in_string = false;
    let mut escaped = false;
    for i in (0..=start.min(bytes.len().saturating_sub(1))).rev() {
        let ch = bytes[i] as char;
        if escaped {
            escaped = false;
            continue;
        }
        match ch {
            '\\' => escaped = true,
            '"' => in_string = !in_string,
            '}' if !in_string => brace += 1,
            '{' if !in_string => {
                brace -= 1;
                if brace < 0 {
                    real_start = i;
                    break;
                }
            }
            ']' if !in_string => bracket += 1,
            '[' if !in_string => {
                bracket -= 1;
                if bracket < 0 {
                    real_start = i;
                    break;
                }
            }
            _ => {}
        }
    }

    let mut real_end = end;
    brace = 0;
    bracket = 0;
    in_string = false;
    escaped = false;
    for (offset, ch) in text[end.min(text.len())..].char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match ch {
            '\\' => escaped = true,
            '"' => in_string = !in_string,
            '{' if !in_string => brace += 1,
            '}' if !in_string => {
                brace -= 1;
                if brace < 0 {
                    real_end = end + offset + 1;
                    break;
                }
            }
            '[' if !in_string => bracket += 1,
            ']' if !in_string => {
                bracket -= 1;
                if bracket < 0 {
                    real_end = end + offset + 1;
                    break;
                }
            }
            _ => {}
        }
    }

    if real_start < real_end && real_end <= text.len() {
        text[real_start..real_end].trim().to_string()
    } else {
        text[start..end.min(text.len())].trim().to_string()
    }
}
