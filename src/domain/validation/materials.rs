//! Sanitization of the `materiaisDisponiveis` subtree.
//!
//! Verbal information entries must be flat two-field records and the three
//! material lists must exist even when generation omitted them. Anything
//! nested inside `informacao` is serialized to a string so the element
//! depth stays at one.

use serde_json::{json, Map, Value};
use tracing::debug;

/// Context label applied to verbal information that arrived as a bare
/// string.
const GENERIC_CONTEXT: &str = "Informação Geral";

/// Returns a sanitized copy of a `materiaisDisponiveis` object.
///
/// Non-object input yields an empty object: the field contract requires
/// the three lists, and downstream stages rely on their presence.
pub fn sanitize_materials(materials: &Value) -> Value {
    let Some(map) = materials.as_object() else {
        debug!("materiaisDisponiveis is not an object, replacing with empty lists");
        return json!({
            "informacoesVerbaisSimulado": [],
            "impressos": [],
            "perguntasAtorSimulado": [],
        });
    };

    let mut out = Map::with_capacity(map.len());
    for (key, value) in map {
        out.insert(key.clone(), value.clone());
    }

    let verbal = map
        .get("informacoesVerbaisSimulado")
        .map(sanitize_verbal_information)
        .unwrap_or_else(|| Value::Array(Vec::new()));
    out.insert("informacoesVerbaisSimulado".to_string(), verbal);

    let impressos = match map.get("impressos") {
        Some(Value::Array(items)) => Value::Array(items.clone()),
        _ => Value::Array(Vec::new()),
    };
    out.insert("impressos".to_string(), impressos);

    let perguntas = match map.get("perguntasAtorSimulado") {
        Some(Value::Array(items)) => Value::Array(items.clone()),
        _ => Value::Array(Vec::new()),
    };
    out.insert("perguntasAtorSimulado".to_string(), perguntas);

    Value::Object(out)
}

/// Rebuilds `informacoesVerbaisSimulado` as a list of flat
/// `{contextoOuPerguntaChave, informacao}` records, preserving order.
pub fn sanitize_verbal_information(data: &Value) -> Value {
    let Some(items) = data.as_array() else {
        return Value::Array(Vec::new());
    };

    let mut out = Vec::with_capacity(items.len());
    for item in items {
        match item {
            Value::Object(map) => {
                let contexto = map.get("contextoOuPerguntaChave").and_then(Value::as_str);
                let informacao = map.get("informacao");

                let informacao = match informacao {
                    Some(Value::String(s)) => Some(s.clone()),
                    Some(v @ (Value::Object(_) | Value::Array(_))) => {
                        // Nested content would breach the element depth
                        // ceiling; keep it as serialized text.
                        Some(serde_json::to_string(v).unwrap_or_else(|_| v.to_string()))
                    }
                    Some(Value::Null) | None => None,
                    Some(other) => Some(other.to_string()),
                };

                if let Some(contexto) = contexto {
                    out.push(json!({
                        "contextoOuPerguntaChave": contexto,
                        "informacao": informacao.unwrap_or_default(),
                    }));
                }
            }
            Value::String(s) => {
                out.push(json!({
                    "contextoOuPerguntaChave": GENERIC_CONTEXT,
                    "informacao": s,
                }));
            }
            _ => {}
        }
    }

    Value::Array(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guarantees_all_three_lists() {
        let out = sanitize_materials(&json!({}));
        assert!(out["informacoesVerbaisSimulado"].is_array());
        assert!(out["impressos"].is_array());
        assert!(out["perguntasAtorSimulado"].is_array());
    }

    #[test]
    fn non_object_input_becomes_empty_lists() {
        let out = sanitize_materials(&json!("not an object"));
        assert_eq!(out["impressos"], json!([]));
    }

    #[test]
    fn nested_informacao_is_serialized_to_string() {
        let data = json!([
            {"contextoOuPerguntaChave": "Alergias?", "informacao": {"lista": ["dipirona"]}}
        ]);
        let out = sanitize_verbal_information(&data);
        let informacao = out[0]["informacao"].as_str().unwrap();
        let decoded: Value = serde_json::from_str(informacao).unwrap();
        assert_eq!(decoded["lista"][0], json!("dipirona"));
    }

    #[test]
    fn bare_strings_get_generic_context() {
        let out = sanitize_verbal_information(&json!(["Paciente nega febre."]));
        assert_eq!(out[0]["contextoOuPerguntaChave"], json!("Informação Geral"));
        assert_eq!(out[0]["informacao"], json!("Paciente nega febre."));
    }

    #[test]
    fn null_informacao_becomes_empty_string() {
        let data = json!([{"contextoOuPerguntaChave": "Dor?", "informacao": null}]);
        let out = sanitize_verbal_information(&data);
        assert_eq!(out[0]["informacao"], json!(""));
    }

    #[test]
    fn entries_without_context_are_dropped_in_order() {
        let data = json!([
            {"contextoOuPerguntaChave": "A", "informacao": "1"},
            {"semContexto": true},
            {"contextoOuPerguntaChave": "B", "informacao": "2"},
        ]);
        let out = sanitize_verbal_information(&data);
        let items = out.as_array().unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0]["contextoOuPerguntaChave"], json!("A"));
        assert_eq!(items[1]["contextoOuPerguntaChave"], json!("B"));
    }

    #[test]
    fn non_list_verbal_information_becomes_empty() {
        assert_eq!(sanitize_verbal_information(&json!({"a": 1})), json!([]));
    }
}
