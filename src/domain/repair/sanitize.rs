//! Textual repair of JSON-like strings that failed to parse.
//!
//! Each repair is a small pure function; the sanitizer runs them as an
//! explicit ordered list rather than a try/fall-through chain, so a step
//! that finds nothing to fix simply returns its input. The whole chain is
//! iterated to a fixpoint, which makes the sanitizer idempotent:
//! `sanitize(sanitize(s)) == sanitize(s)`.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

/// Upper bound on chain iterations. Realistic inputs converge in one or
/// two passes; the cap guards termination on adversarial input.
const MAX_PASSES: usize = 8;

static TRAILING_COMMA: Lazy<Regex> =
    Lazy::new(|| Regex::new(r",(\s*[}\]])").expect("trailing comma pattern"));

static TRAILING_COMMA_EOS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r",\s*$").expect("trailing comma eos pattern"));

static DOUBLED_COMMAS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r",,+").expect("doubled comma pattern"));

static ADJACENT_OBJECTS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\}\s*\{").expect("adjacent object pattern"));

static ADJACENT_ARRAYS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\]\s*\[").expect("adjacent array pattern"));

static DECIMAL_COMMA: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+),(\d+)").expect("decimal comma pattern"));

static SPLIT_DIGITS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+) +(\d+)").expect("split digits pattern"));

static BOOL_NULL_VARIANTS: &[(&str, &str)] = &[
    (r"\bTrue\b", "true"),
    (r"\bTRUE\b", "true"),
    (r"\bFalse\b", "false"),
    (r"\bFALSE\b", "false"),
    (r"\bNull\b", "null"),
    (r"\bNULL\b", "null"),
    (r"\bNone\b", "null"),
    (r"\bNONE\b", "null"),
];

static BOOL_NULL_REGEXES: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    BOOL_NULL_VARIANTS
        .iter()
        .map(|(p, r)| (Regex::new(p).expect("literal casing pattern"), *r))
        .collect()
});

/// The ordered repair steps. Order matters: structural comma fixes run
/// after literal-level fixes so they see the corrected text.
const STEPS: &[fn(&str) -> String] = &[
    close_unterminated_strings,
    escape_stray_backslashes,
    strip_trailing_commas,
    normalize_literal_casing,
    normalize_numbers,
    separate_adjacent_containers,
];

/// Repairs common LLM-generated JSON defects in `s`.
///
/// Returns the input unchanged when it already parses. Never fails; when
/// the repairs are not enough the best-effort string is returned for the
/// structural repairer to take over.
pub fn sanitize(s: &str) -> String {
    if parses(s) {
        return s.to_string();
    }

    let mut current = s.to_string();
    for _ in 0..MAX_PASSES {
        let mut next = current.clone();
        for step in STEPS {
            next = step(&next);
        }
        let converged = next == current;
        current = next;
        if converged || parses(&current) {
            break;
        }
    }

    if parses(&current) {
        return current;
    }

    // Last textual resort: drop non-printable control characters.
    let cleaned = strip_control_characters(&current);
    if parses(&cleaned) {
        cleaned
    } else {
        current
    }
}

fn parses(s: &str) -> bool {
    serde_json::from_str::<Value>(s).is_ok()
}

/// Closes string literals left open at a newline or at end of input.
fn close_unterminated_strings(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    let mut in_string = false;
    let mut escaped = false;

    for ch in s.chars() {
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            } else if ch == '\n' {
                // Close at the nearest delimiter boundary: the line break.
                out.push('"');
                in_string = false;
            }
        } else if ch == '"' {
            in_string = true;
        }
        out.push(ch);
    }

    if in_string {
        out.push('"');
    }
    out
}

/// Escapes backslashes that do not begin a valid JSON escape sequence.
fn escape_stray_backslashes(s: &str) -> String {
    let chars: Vec<char> = s.chars().collect();
    let mut out = String::with_capacity(s.len());
    let mut i = 0;

    while i < chars.len() {
        let ch = chars[i];
        if ch == '\\' {
            match chars.get(i + 1) {
                Some(next) if matches!(next, '"' | '\\' | '/' | 'b' | 'f' | 'n' | 'r' | 't' | 'u') => {
                    out.push('\\');
                    out.push(*next);
                    i += 2;
                }
                _ => {
                    out.push('\\');
                    out.push('\\');
                    i += 1;
                }
            }
        } else {
            out.push(ch);
            i += 1;
        }
    }
    out
}

fn strip_trailing_commas(s: &str) -> String {
    let s = TRAILING_COMMA.replace_all(s, "$1");
    let s = TRAILING_COMMA_EOS.replace_all(&s, "");
    DOUBLED_COMMAS.replace_all(&s, ",").into_owned()
}

fn normalize_literal_casing(s: &str) -> String {
    let mut out = s.to_string();
    for (re, replacement) in BOOL_NULL_REGEXES.iter() {
        out = re.replace_all(&out, *replacement).into_owned();
    }
    out
}

/// Converts decimal-comma numbers to decimal-point form and joins digit
/// runs split by spaces.
fn normalize_numbers(s: &str) -> String {
    let s = DECIMAL_COMMA.replace_all(s, "$1.$2");
    SPLIT_DIGITS.replace_all(&s, "$1$2").into_owned()
}

fn separate_adjacent_containers(s: &str) -> String {
    let s = ADJACENT_OBJECTS.replace_all(s, "},{");
    ADJACENT_ARRAYS.replace_all(&s, "],[").into_owned()
}

fn strip_control_characters(s: &str) -> String {
    s.chars()
        .filter(|c| !c.is_control() || matches!(c, '\n' | '\r' | '\t'))
        .collect()
}
