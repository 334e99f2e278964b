//! Sanitization of the scoring rubric (`padraoEsperadoProcedimento`).
//!
//! Coerces every rubric field to the type the store expects. The rubric is
//! the one subtree graders consume programmatically, so stray structures
//! become strings and malformed items become minimal scored stubs instead
//! of disappearing.

use serde_json::{json, Map, Value};

/// Returns a sanitized copy of a `padraoEsperadoProcedimento` object.
/// Non-object input yields an empty object.
pub fn sanitize_rubric(rubric: &Value) -> Value {
    let Some(map) = rubric.as_object() else {
        return json!({});
    };

    let mut out = Map::with_capacity(map.len());
    for (key, value) in map {
        out.insert(key.clone(), value.clone());
    }

    for field in ["idChecklistAssociado", "pontuacaoTotalEstacao"] {
        if let Some(value) = map.get(field) {
            if !matches!(value, Value::String(_) | Value::Number(_)) {
                out.insert(field.to_string(), Value::String(coerce_string(value)));
            }
        }
    }

    if let Some(sintese) = map.get("sinteseEstacao") {
        out.insert("sinteseEstacao".to_string(), sanitize_sintese(sintese));
    }

    if let Some(itens) = map.get("itensAvaliacao") {
        out.insert("itensAvaliacao".to_string(), sanitize_itens(itens));
    }

    if let Some(feedback) = map.get("feedbackEstacao") {
        out.insert("feedbackEstacao".to_string(), sanitize_feedback(feedback));
    }

    Value::Object(out)
}

fn sanitize_sintese(sintese: &Value) -> Value {
    let Some(map) = sintese.as_object() else {
        return json!({});
    };

    let mut out = map.clone();

    if let Some(resumo) = map.get("resumoCasoPEP") {
        if !resumo.is_string() {
            out.insert("resumoCasoPEP".to_string(), Value::String(coerce_string(resumo)));
        }
    }

    if let Some(foco) = map.get("focoPrincipalDetalhado") {
        let list = match foco {
            Value::Array(items) => items.iter().map(coerce_string).map(Value::String).collect(),
            other => vec![Value::String(coerce_string(other))],
        };
        out.insert("focoPrincipalDetalhado".to_string(), Value::Array(list));
    }

    Value::Object(out)
}

fn sanitize_itens(itens: &Value) -> Value {
    let Some(items) = itens.as_array() else {
        return Value::Array(Vec::new());
    };

    let out = items
        .iter()
        .map(|item| match item {
            Value::Object(map) => sanitize_item(map),
            other => basic_item(other),
        })
        .collect();

    Value::Array(out)
}

fn sanitize_item(item: &Map<String, Value>) -> Value {
    let mut out = Map::new();

    for field in ["idItem", "itemNumeroOficial", "descricaoItem"] {
        if let Some(value) = item.get(field) {
            out.insert(field.to_string(), Value::String(coerce_string(value)));
        }
    }

    if let Some(Value::Object(pontuacoes)) = item.get("pontuacoes") {
        let mut tiers = Map::new();
        for tier in ["adequado", "parcialmenteAdequado", "inadequado"] {
            if let Some(Value::Object(tier_data)) = pontuacoes.get(tier) {
                let mut sanitized = Map::new();
                if let Some(criterio) = tier_data.get("criterio") {
                    sanitized.insert(
                        "criterio".to_string(),
                        Value::String(coerce_string(criterio)),
                    );
                }
                if let Some(pontos) = tier_data.get("pontos") {
                    sanitized.insert("pontos".to_string(), json!(coerce_points(pontos)));
                }
                tiers.insert(tier.to_string(), Value::Object(sanitized));
            }
        }
        out.insert("pontuacoes".to_string(), Value::Object(tiers));
    }

    Value::Object(out)
}

/// Minimal scored item standing in for a non-object entry.
fn basic_item(original: &Value) -> Value {
    json!({
        "idItem": "item_basico",
        "descricaoItem": coerce_string(original),
        "pontuacoes": {
            "adequado": {"criterio": "Item básico", "pontos": 0.5},
            "parcialmenteAdequado": {"criterio": "Item básico parcial", "pontos": 0.25},
            "inadequado": {"criterio": "Item básico inadequado", "pontos": 0.0},
        },
    })
}

fn sanitize_feedback(feedback: &Value) -> Value {
    let Some(map) = feedback.as_object() else {
        return json!({});
    };

    let mut out = map.clone();

    if let Some(resumo) = map.get("resumoTecnico") {
        if !resumo.is_string() {
            out.insert("resumoTecnico".to_string(), Value::String(coerce_string(resumo)));
        }
    }

    if let Some(fontes) = map.get("fontes") {
        let list = match fontes {
            Value::Array(items) => items.iter().map(coerce_string).map(Value::String).collect(),
            other => vec![Value::String(coerce_string(other))],
        };
        out.insert("fontes".to_string(), Value::Array(list));
    }

    Value::Object(out)
}

fn coerce_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn coerce_points(value: &Value) -> f64 {
    match value {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => s.trim().replace(',', ".").parse().unwrap_or(0.0),
        _ => 0.0,
    }
}
