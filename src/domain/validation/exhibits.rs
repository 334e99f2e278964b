//! Validation and repair of printed materials ("impressos").
//!
//! Each exhibit is validated on its own; a malformed item never aborts the
//! batch and never loses its position in the sequence. Content-type tags
//! are normalized before dispatch, so the per-type validators only ever
//! see canonical tags.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{json, Map, Value};
use tracing::{debug, info};

use crate::domain::station::{contract, ContentType};
use crate::domain::validation::depth;

static ID_IMPRESSO: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("id impresso pattern"));

/// Structural markers a written report (laudo) is expected to carry.
const LAUDO_MARKERS: &[&str] = &["ACHADOS", "DESCRIÇÃO", "CONCLUSÃO", "IMPRESSÃO DIAGNÓSTICA"];

/// Minimum length of a meaningful laudo.
const MIN_LAUDO_LEN: usize = 50;

/// Minimum length of an exhibit title.
const MIN_TITLE_LEN: usize = 5;

/// The four vital signs every `sinais_vitais` exhibit should carry, with
/// the spellings generation uses for each.
const REQUIRED_VITALS: &[(&str, &[&str])] = &[
    ("pressão arterial", &["pressão arterial", "pa"]),
    ("frequência cardíaca", &["frequência cardíaca", "fc"]),
    ("frequência respiratória", &["frequência respiratória", "fr"]),
    ("temperatura", &["temperatura", "tax"]),
];

/// Reference ranges for common analytes, appended to bare numeric lab
/// values. Purely cosmetic enrichment; unknown analytes are left alone.
static REFERENCE_RANGES: &[(&str, &str)] = &[
    ("hemoglobina", "12-16 g/dL"),
    ("hematócrito", "36-46%"),
    ("leucócitos", "4.000-10.000/mm³"),
    ("plaquetas", "150.000-400.000/mm³"),
    ("creatinina", "0,6-1,2 mg/dL"),
    ("ureia", "10-40 mg/dL"),
    ("glicemia", "70-99 mg/dL"),
    ("sódio", "135-145 mEq/L"),
    ("potássio", "3,5-5,0 mEq/L"),
    ("pcr", "< 5 mg/L"),
    ("troponina", "< 14 ng/L"),
];

/// Outcome of validating one exhibit batch.
#[derive(Debug, Clone)]
pub struct ExhibitOutcome {
    pub is_valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub corrections: Vec<String>,
    /// Corrected exhibits, same length and order as the input.
    pub items: Vec<Value>,
}

/// Validates and repairs a sequence of exhibits.
///
/// Never fails: items that are not objects are replaced with a minimal
/// stub so the sequence keeps its positional integrity.
pub fn validate_exhibits(exhibits: &[Value]) -> ExhibitOutcome {
    let mut outcome = ExhibitOutcome {
        is_valid: true,
        errors: Vec::new(),
        warnings: Vec::new(),
        corrections: Vec::new(),
        items: Vec::with_capacity(exhibits.len()),
    };

    for (index, exhibit) in exhibits.iter().enumerate() {
        let Some(map) = exhibit.as_object() else {
            outcome.is_valid = false;
            outcome
                .errors
                .push(format!("impresso {}: não é um objeto", index + 1));
            outcome.items.push(invalid_item_stub(exhibit));
            continue;
        };

        let corrected = validate_exhibit(map, index, &mut outcome);
        outcome.items.push(corrected);
    }

    debug!(
        exhibits = exhibits.len(),
        errors = outcome.errors.len(),
        corrections = outcome.corrections.len(),
        "exhibit validation finished"
    );
    outcome
}

/// Stub standing in for an item that is not a mapping.
fn invalid_item_stub(original: &Value) -> Value {
    let text = match original {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    json!({
        "tituloImpresso": "Impresso Inválido",
        "conteudo": {"textoDescritivo": text},
    })
}

fn validate_exhibit(exhibit: &Map<String, Value>, index: usize, outcome: &mut ExhibitOutcome) -> Value {
    let mut item = exhibit.clone();
    let position = index + 1;

    check_required_fields(&item, position, outcome);

    // Normalize the content type before any dispatch.
    let content_type = match item.get("tipoConteudo").and_then(Value::as_str) {
        Some(raw_tag) => match ContentType::normalize(raw_tag) {
            Some(ct) => {
                if ct.as_str() != raw_tag {
                    info!(from = raw_tag, to = ct.as_str(), "content type remapped");
                    outcome.corrections.push(format!(
                        "impresso {}: tipoConteudo '{}' corrigido para '{}'",
                        position,
                        raw_tag,
                        ct.as_str()
                    ));
                    item.insert("tipoConteudo".to_string(), json!(ct.as_str()));
                }
                Some(ct)
            }
            None => {
                outcome.is_valid = false;
                outcome.errors.push(format!(
                    "impresso {}: tipoConteudo '{}' desconhecido",
                    position, raw_tag
                ));
                None
            }
        },
        None => None,
    };

    if let Some(ct) = content_type {
        match ct {
            ContentType::ListaChaveValorSecoes => {
                validate_key_value_sections(&mut item, position, outcome);
                enrich_reference_ranges(&mut item, position, outcome);
            }
            ContentType::ImagemComTexto => validate_report(&mut item, position, outcome),
            ContentType::SinaisVitais => check_vital_signs(&item, position, outcome),
            ContentType::TextoSimples => {}
        }
    }

    reduce_content_depth(&mut item, position, outcome);

    Value::Object(item)
}

fn check_required_fields(item: &Map<String, Value>, position: usize, outcome: &mut ExhibitOutcome) {
    match item.get("idImpresso").and_then(Value::as_str) {
        Some(id) if ID_IMPRESSO.is_match(id) => {}
        Some(id) => {
            outcome.is_valid = false;
            outcome.errors.push(format!(
                "impresso {}: idImpresso '{}' contém caracteres inválidos",
                position, id
            ));
        }
        None => {
            outcome.is_valid = false;
            outcome
                .errors
                .push(format!("impresso {}: campo 'idImpresso' ausente", position));
        }
    }

    match item.get("tituloImpresso").and_then(Value::as_str) {
        Some(title) if title.chars().count() >= MIN_TITLE_LEN => {}
        Some(_) => {
            outcome.is_valid = false;
            outcome.errors.push(format!(
                "impresso {}: tituloImpresso com menos de {} caracteres",
                position, MIN_TITLE_LEN
            ));
        }
        None => {
            outcome.is_valid = false;
            outcome
                .errors
                .push(format!("impresso {}: campo 'tituloImpresso' ausente", position));
        }
    }

    if !item.contains_key("tipoConteudo") {
        outcome.is_valid = false;
        outcome
            .errors
            .push(format!("impresso {}: campo 'tipoConteudo' ausente", position));
    }

    if !item.contains_key("conteudo") {
        outcome.is_valid = false;
        outcome
            .errors
            .push(format!("impresso {}: campo 'conteudo' ausente", position));
    }
}

/// `lista_chave_valor_secoes`: sections must be a non-empty list; string
/// elements that decode to objects are converted in place.
fn validate_key_value_sections(
    item: &mut Map<String, Value>,
    position: usize,
    outcome: &mut ExhibitOutcome,
) {
    let Some(conteudo) = item.get_mut("conteudo").and_then(Value::as_object_mut) else {
        outcome.is_valid = false;
        outcome
            .errors
            .push(format!("impresso {}: conteudo deve ser um objeto", position));
        return;
    };

    let Some(secoes) = conteudo.get_mut("secoes") else {
        outcome.is_valid = false;
        outcome
            .errors
            .push(format!("impresso {}: campo 'secoes' ausente no conteúdo", position));
        return;
    };

    let Some(sections) = secoes.as_array_mut() else {
        outcome.is_valid = false;
        outcome
            .errors
            .push(format!("impresso {}: campo 'secoes' deve ser uma lista", position));
        return;
    };

    if sections.is_empty() {
        outcome.is_valid = false;
        outcome
            .errors
            .push(format!("impresso {}: lista 'secoes' não pode estar vazia", position));
        return;
    }

    for (section_index, section) in sections.iter_mut().enumerate() {
        match section {
            Value::Object(map) => {
                if !map.contains_key("tituloSecao") || !map.contains_key("itens") {
                    outcome.warnings.push(format!(
                        "impresso {}: seção {} sem 'tituloSecao' ou 'itens'",
                        position,
                        section_index + 1
                    ));
                }
            }
            Value::String(s) => match serde_json::from_str::<Value>(s) {
                Ok(parsed) if parsed.is_object() => {
                    outcome.corrections.push(format!(
                        "impresso {}: seção {} convertida de string JSON para objeto",
                        position,
                        section_index + 1
                    ));
                    *section = parsed;
                }
                _ => {
                    outcome.is_valid = false;
                    outcome.errors.push(format!(
                        "impresso {}: seção {} não é um JSON válido",
                        position,
                        section_index + 1
                    ));
                }
            },
            _ => {
                outcome.is_valid = false;
                outcome.errors.push(format!(
                    "impresso {}: seção {} deve ser objeto ou string JSON",
                    position,
                    section_index + 1
                ));
            }
        }
    }
}

/// `imagem_com_texto`: the written report must exist, have substance, and
/// follow the structured laudo format. An unstructured report is wrapped
/// rather than rejected.
fn validate_report(item: &mut Map<String, Value>, position: usize, outcome: &mut ExhibitOutcome) {
    let Some(conteudo) = item.get_mut("conteudo").and_then(Value::as_object_mut) else {
        outcome.is_valid = false;
        outcome
            .errors
            .push(format!("impresso {}: conteudo deve ser um objeto", position));
        return;
    };

    let Some(laudo) = conteudo.get("laudo").and_then(Value::as_str).map(String::from) else {
        outcome.is_valid = false;
        outcome
            .errors
            .push(format!("impresso {}: campo 'laudo' ausente no conteúdo", position));
        return;
    };

    if laudo.chars().count() < MIN_LAUDO_LEN {
        outcome.is_valid = false;
        outcome.errors.push(format!(
            "impresso {}: laudo com menos de {} caracteres",
            position, MIN_LAUDO_LEN
        ));
        return;
    }

    let upper = laudo.to_uppercase();
    let has_marker = LAUDO_MARKERS.iter().any(|marker| upper.contains(marker));
    if !has_marker {
        conteudo.insert(
            "laudo".to_string(),
            json!(format!(
                "ACHADOS:\n{}\n\nCONCLUSÃO:\n[A ser preenchida conforme achados]",
                laudo
            )),
        );
        outcome.corrections.push(format!(
            "impresso {}: laudo sem estrutura reconhecida, modelo ACHADOS/CONCLUSÃO aplicado",
            position
        ));
    }
}

/// `sinais_vitais`: warn about missing canonical vitals. Clinical values
/// cannot be safely synthesized, so nothing is corrected here.
fn check_vital_signs(item: &Map<String, Value>, position: usize, outcome: &mut ExhibitOutcome) {
    let mut found_keys = String::new();
    if let Some(conteudo) = item.get("conteudo") {
        collect_keys_and_strings(conteudo, &mut found_keys);
    }
    let haystack = found_keys.to_lowercase();

    for (label, spellings) in REQUIRED_VITALS {
        let present = spellings.iter().any(|s| haystack.contains(s));
        if !present {
            outcome.warnings.push(format!(
                "impresso {}: sinal vital '{}' não encontrado",
                position, label
            ));
        }
    }
}

fn collect_keys_and_strings(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                out.push_str(key);
                out.push('\n');
                collect_keys_and_strings(child, out);
            }
        }
        Value::Array(items) => {
            for child in items {
                collect_keys_and_strings(child, out);
            }
        }
        Value::String(s) => {
            out.push_str(s);
            out.push('\n');
        }
        _ => {}
    }
}

/// Appends the known reference range to bare numeric lab values.
fn enrich_reference_ranges(
    item: &mut Map<String, Value>,
    position: usize,
    outcome: &mut ExhibitOutcome,
) {
    let Some(sections) = item
        .get_mut("conteudo")
        .and_then(Value::as_object_mut)
        .and_then(|c| c.get_mut("secoes"))
        .and_then(Value::as_array_mut)
    else {
        return;
    };

    for section in sections.iter_mut() {
        let Some(entries) = section
            .as_object_mut()
            .and_then(|s| s.get_mut("itens"))
            .and_then(Value::as_array_mut)
        else {
            continue;
        };

        for entry in entries.iter_mut() {
            let Some(entry_map) = entry.as_object_mut() else {
                continue;
            };
            let Some(chave) = entry_map.get("chave").and_then(Value::as_str).map(str::to_owned) else {
                continue;
            };
            let Some(valor) = entry_map.get("valor").and_then(Value::as_str).map(str::to_owned) else {
                continue;
            };

            if valor.contains('(') || !valor.chars().any(|c| c.is_ascii_digit()) {
                continue;
            }

            let chave_lower = chave.to_lowercase();
            if let Some((_, range)) = REFERENCE_RANGES
                .iter()
                .find(|(analyte, _)| chave_lower.contains(analyte))
            {
                let enriched = format!("{} (VR: {})", valor, range);
                entry_map.insert("valor".to_string(), json!(enriched));
                outcome.corrections.push(format!(
                    "impresso {}: valor de referência adicionado para '{}'",
                    position, chave
                ));
            }
        }
    }
}

/// Exhibit content must fit the store's nesting ceiling. Key/value
/// sections are rebuilt flat; everything else is depth-sanitized.
fn reduce_content_depth(item: &mut Map<String, Value>, position: usize, outcome: &mut ExhibitOutcome) {
    let is_sections = item.get("tipoConteudo").and_then(Value::as_str)
        == Some(ContentType::ListaChaveValorSecoes.as_str());

    let Some(conteudo) = item.get("conteudo") else {
        return;
    };

    if depth::max_depth(conteudo) <= contract::EXHIBIT_CONTENT_MAX_DEPTH && !is_sections {
        return;
    }

    let reduced = if is_sections {
        match flatten_sections(conteudo) {
            Some(flat) => flat,
            None => return,
        }
    } else {
        depth::sanitize(conteudo, contract::EXHIBIT_CONTENT_MAX_DEPTH)
    };

    if &reduced != conteudo {
        item.insert("conteudo".to_string(), reduced);
        outcome.corrections.push(format!(
            "impresso {}: profundidade do conteúdo reduzida para o limite do armazenamento",
            position
        ));
    }
}

/// Rebuilds a sections subtree keeping only `tituloSecao` and flat
/// `{chave, valor}` item records, in their original order.
fn flatten_sections(conteudo: &Value) -> Option<Value> {
    let sections = conteudo.get("secoes")?.as_array()?;

    let mut out_sections = Vec::with_capacity(sections.len());
    for section in sections {
        let Some(map) = section.as_object() else {
            out_sections.push(section.clone());
            continue;
        };

        let titulo = map
            .get("tituloSecao")
            .and_then(Value::as_str)
            .unwrap_or_default();

        let mut out_items = Vec::new();
        if let Some(entries) = map.get("itens").and_then(Value::as_array) {
            for entry in entries {
                let Some(entry_map) = entry.as_object() else {
                    continue;
                };
                let chave = entry_map.get("chave").and_then(Value::as_str).unwrap_or_default();
                let valor = match entry_map.get("valor") {
                    Some(Value::String(s)) => s.clone(),
                    Some(other @ (Value::Object(_) | Value::Array(_))) => {
                        serde_json::to_string(other).unwrap_or_else(|_| other.to_string())
                    }
                    Some(other) => other.to_string(),
                    None => String::new(),
                };
                if !chave.is_empty() && !valor.is_empty() {
                    out_items.push(json!({"chave": chave, "valor": valor}));
                }
            }
        }

        out_sections.push(json!({"tituloSecao": titulo, "itens": out_items}));
    }

    Some(json!({"secoes": out_sections}))
}
