//! Station document validation against the field contract.
//!
//! Validation accumulates findings instead of short-circuiting, so a
//! single pass yields the complete defect list. The only mutation
//! performed here is the synthesis of missing evaluation sub-scores;
//! every other repair belongs to earlier or later stages.

use serde_json::{json, Map, Value};
use tracing::info;

use crate::domain::station::contract::{
    BINARY_ITEM_THRESHOLD, CRITERIO_ADEQUADO, CRITERIO_INADEQUADO, CRITERIO_PARCIAL,
    ID_ESTACAO_PREFIX, REQUIRED_CENARIO, REQUIRED_INSTRUCOES, REQUIRED_ITEM, REQUIRED_PADRAO,
    REQUIRED_TOP_LEVEL, SCORE_TIERS, VALID_ESPECIALIDADES,
};
use crate::domain::station::ValidationReport;

/// Validates `doc` against the station contract, synthesizing missing
/// evaluation sub-scores in place.
pub fn validate_station(doc: &mut Value) -> ValidationReport {
    let mut report = ValidationReport::new();

    let Some(root) = doc.as_object_mut() else {
        report.structural_issue("documento raiz deve ser um objeto");
        return report;
    };

    for field in REQUIRED_TOP_LEVEL {
        if !root.contains_key(*field) {
            report.missing_field(*field);
        }
    }

    check_instrucoes(root, &mut report);
    check_padrao(root, &mut report);
    check_scalar_types(root, &mut report);
    check_enumerations(root, &mut report);
    check_materials_shape(root, &mut report);

    report
}

fn check_instrucoes(root: &Map<String, Value>, report: &mut ValidationReport) {
    let Some(instrucoes) = root.get("instrucoesParticipante") else {
        return;
    };
    let Some(instrucoes) = instrucoes.as_object() else {
        report.structural_issue("instrucoesParticipante deve ser um objeto");
        return;
    };

    for field in REQUIRED_INSTRUCOES {
        if !instrucoes.contains_key(*field) {
            report.structural_issue(format!("instrucoesParticipante.{} ausente", field));
        }
    }

    if let Some(cenario) = instrucoes.get("cenarioAtendimento") {
        match cenario.as_object() {
            Some(cenario) => {
                for field in REQUIRED_CENARIO {
                    if !cenario.contains_key(*field) {
                        report.structural_issue(format!("cenarioAtendimento.{} ausente", field));
                    }
                }
            }
            None => report.structural_issue("cenarioAtendimento deve ser um objeto"),
        }
    }

    if let Some(tarefas) = instrucoes.get("tarefasPrincipais") {
        match tarefas.as_array() {
            Some(tarefas) if tarefas.len() < 3 => {
                report.warn(format!(
                    "tarefasPrincipais tem apenas {} itens (recomendado: 3-5)",
                    tarefas.len()
                ));
            }
            Some(_) => {}
            None => report.invalid_type("tarefasPrincipais deve ser uma lista"),
        }
    }
}

fn check_padrao(root: &mut Map<String, Value>, report: &mut ValidationReport) {
    let Some(padrao) = root.get_mut("padraoEsperadoProcedimento") else {
        return;
    };
    let Some(padrao) = padrao.as_object_mut() else {
        report.structural_issue("padraoEsperadoProcedimento deve ser um objeto");
        return;
    };

    for field in REQUIRED_PADRAO {
        if !padrao.contains_key(*field) {
            report.structural_issue(format!("padraoEsperadoProcedimento.{} ausente", field));
        }
    }

    if let Some(sintese) = padrao.get("sinteseEstacao") {
        check_sintese(sintese, report);
    }

    if let Some(itens) = padrao.get_mut("itensAvaliacao") {
        check_itens_avaliacao(itens, report);
    }

    if let Some(total) = padrao.get("pontuacaoTotalEstacao") {
        match total.as_f64() {
            Some(total) if total <= 0.0 => {
                report.warn("padraoEsperadoProcedimento.pontuacaoTotalEstacao deve ser maior que 0");
            }
            Some(_) => {}
            None => report.structural_issue(
                "padraoEsperadoProcedimento.pontuacaoTotalEstacao deve ser numérico",
            ),
        }
    }

    if let Some(feedback) = padrao.get("feedbackEstacao") {
        check_feedback(feedback, report);
    }
}

fn check_sintese(sintese: &Value, report: &mut ValidationReport) {
    let Some(sintese) = sintese.as_object() else {
        report.structural_issue("padraoEsperadoProcedimento.sinteseEstacao deve ser um objeto");
        return;
    };

    match sintese.get("resumoCasoPEP") {
        Some(Value::String(_)) => {}
        Some(_) => report.structural_issue(
            "padraoEsperadoProcedimento.sinteseEstacao.resumoCasoPEP deve ser string",
        ),
        None => report.structural_issue(
            "padraoEsperadoProcedimento.sinteseEstacao.resumoCasoPEP ausente",
        ),
    }

    match sintese.get("focoPrincipalDetalhado") {
        Some(Value::Array(_)) => {}
        Some(_) => report.structural_issue(
            "padraoEsperadoProcedimento.sinteseEstacao.focoPrincipalDetalhado deve ser uma lista",
        ),
        None => report.structural_issue(
            "padraoEsperadoProcedimento.sinteseEstacao.focoPrincipalDetalhado ausente",
        ),
    }
}

fn check_feedback(feedback: &Value, report: &mut ValidationReport) {
    let Some(feedback) = feedback.as_object() else {
        report.structural_issue("padraoEsperadoProcedimento.feedbackEstacao deve ser um objeto");
        return;
    };

    match feedback.get("resumoTecnico") {
        Some(Value::String(_)) => {}
        Some(_) => report.structural_issue(
            "padraoEsperadoProcedimento.feedbackEstacao.resumoTecnico deve ser string",
        ),
        None => {
            report.structural_issue("padraoEsperadoProcedimento.feedbackEstacao.resumoTecnico ausente")
        }
    }

    match feedback.get("fontes") {
        Some(Value::Array(_)) => {}
        Some(_) => report.structural_issue(
            "padraoEsperadoProcedimento.feedbackEstacao.fontes deve ser uma lista",
        ),
        None => report.structural_issue("padraoEsperadoProcedimento.feedbackEstacao.fontes ausente"),
    }
}

fn check_itens_avaliacao(itens: &mut Value, report: &mut ValidationReport) {
    let Some(items) = itens.as_array_mut() else {
        report.invalid_type("itensAvaliacao deve ser uma lista");
        return;
    };

    if items.len() < 3 {
        report.warn(format!(
            "itensAvaliacao tem apenas {} itens (recomendado: 5-8)",
            items.len()
        ));
    }

    for (index, item) in items.iter_mut().enumerate() {
        let Some(item) = item.as_object_mut() else {
            report.structural_issue(format!("itensAvaliacao[{}] deve ser um objeto", index));
            continue;
        };

        for field in REQUIRED_ITEM {
            if !item.contains_key(*field) {
                report.structural_issue(format!("itensAvaliacao[{}].{} ausente", index, field));
            }
        }

        if let Some(pontuacoes) = item.get_mut("pontuacoes") {
            match pontuacoes.as_object_mut() {
                Some(pontuacoes) => check_pontuacoes(pontuacoes, index, report),
                None => report.structural_issue(format!(
                    "itensAvaliacao[{}].pontuacoes deve ser um objeto",
                    index
                )),
            }
        }
    }
}

fn check_pontuacoes(
    pontuacoes: &mut Map<String, Value>,
    index: usize,
    report: &mut ValidationReport,
) {
    synthesize_missing_tiers(pontuacoes, index, report);
    recheck_tiers(pontuacoes, index, report);

    // Shape of the tiers that are present.
    let mut total = 0.0;
    for tier in SCORE_TIERS {
        let Some(tier_value) = pontuacoes.get(*tier) else {
            continue;
        };
        let Some(tier_map) = tier_value.as_object() else {
            report.structural_issue(format!(
                "itensAvaliacao[{}].pontuacoes.{} deve ser um objeto",
                index, tier
            ));
            continue;
        };
        match tier_map.get("pontos") {
            Some(pontos) => match pontos.as_f64() {
                Some(pontos) => total += pontos,
                None => report.structural_issue(format!(
                    "itensAvaliacao[{}].pontuacoes.{}.pontos deve ser numérico",
                    index, tier
                )),
            },
            None => report.structural_issue(format!(
                "itensAvaliacao[{}].pontuacoes.{}.pontos ausente",
                index, tier
            )),
        }
    }

    if total > 1.0 {
        report.warn(format!(
            "Item {}: pontuação total ({}) excede 1.0",
            index, total
        ));
    }
}

/// First pass: synthesize the tiers generation left out.
///
/// A partial-credit tier is only synthesized when the full score exceeds
/// the binary threshold; at or below it the item legitimately has no
/// middle tier.
fn synthesize_missing_tiers(
    pontuacoes: &mut Map<String, Value>,
    index: usize,
    report: &mut ValidationReport,
) {
    let missing: Vec<&str> = SCORE_TIERS
        .iter()
        .filter(|tier| !pontuacoes.contains_key(**tier))
        .copied()
        .collect();

    if missing.is_empty() {
        return;
    }

    info!(item = index, tiers = ?missing, "synthesizing missing score tiers");
    let mut pontos_adequado = resolve_adequado_points(pontuacoes);

    for tier in missing {
        match tier {
            "adequado" => {
                pontuacoes.insert(
                    "adequado".to_string(),
                    json!({"criterio": CRITERIO_ADEQUADO, "pontos": 0.5}),
                );
                pontos_adequado = 0.5;
                let message = format!("Pontuação adequado (0.5pts) adicionada para item {}", index);
                report.correction(message.clone());
                report.warn(message);
            }
            "parcialmenteAdequado" => {
                if pontos_adequado > BINARY_ITEM_THRESHOLD {
                    let pontos = round2(pontos_adequado / 2.0);
                    pontuacoes.insert(
                        "parcialmenteAdequado".to_string(),
                        json!({"criterio": CRITERIO_PARCIAL, "pontos": pontos}),
                    );
                    let message = format!(
                        "Pontuação parcialmenteAdequado ({}pts) adicionada para item {}",
                        pontos, index
                    );
                    report.correction(message.clone());
                    report.warn(message);
                } else {
                    report.correction(format!(
                        "Item {} identificado como binário - parcialmenteAdequado não aplicável",
                        index
                    ));
                    report.warn(format!(
                        "Item {} é binário (≤0.25pts) - parcialmenteAdequado não aplicável",
                        index
                    ));
                }
            }
            "inadequado" => {
                pontuacoes.insert(
                    "inadequado".to_string(),
                    json!({"criterio": CRITERIO_INADEQUADO, "pontos": 0.0}),
                );
                let message = format!("Pontuação inadequado adicionada para item {}", index);
                report.correction(message.clone());
                report.warn(message);
            }
            _ => {}
        }
    }
}

/// Second pass: any tier still absent is a structural defect, except a
/// partial tier on a binary item. The threshold here is the same one the
/// synthesis pass used; the re-check is what separates binary items from
/// defective records.
fn recheck_tiers(pontuacoes: &Map<String, Value>, index: usize, report: &mut ValidationReport) {
    for tier in SCORE_TIERS {
        if pontuacoes.contains_key(*tier) {
            continue;
        }

        if *tier == "parcialmenteAdequado" {
            let pontos_adequado = pontuacoes
                .get("adequado")
                .and_then(|a| a.get("pontos"))
                .and_then(Value::as_f64)
                .unwrap_or(0.0);
            if pontos_adequado > BINARY_ITEM_THRESHOLD {
                report.structural_issue(format!(
                    "itensAvaliacao[{}].pontuacoes.{} ausente",
                    index, tier
                ));
            }
        } else {
            report.structural_issue(format!(
                "itensAvaliacao[{}].pontuacoes.{} ausente",
                index, tier
            ));
        }
    }
}

/// Looks up the full-credit score, tolerating variant layouts: a proper
/// `pontos` field first, then any positive numeric value in the tier.
fn resolve_adequado_points(pontuacoes: &Map<String, Value>) -> f64 {
    let Some(adequado) = pontuacoes.get("adequado").and_then(Value::as_object) else {
        return 0.0;
    };

    if let Some(pontos) = adequado.get("pontos").and_then(Value::as_f64) {
        return pontos;
    }

    for value in adequado.values() {
        if let Some(n) = value.as_f64() {
            if n > 0.0 {
                return n;
            }
        }
    }

    0.0
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn check_scalar_types(root: &Map<String, Value>, report: &mut ValidationReport) {
    for field in ["tempoDuracaoMinutos", "numeroDaEstacao"] {
        if let Some(value) = root.get(field) {
            if !value.is_i64() && !value.is_u64() {
                report.invalid_type(format!("{} deve ser int", field));
            }
        }
    }

    if let Some(tempo) = root.get("tempoDuracaoMinutos").and_then(Value::as_i64) {
        if !(5..=30).contains(&tempo) {
            report.warn("tempoDuracaoMinutos fora do intervalo recomendado (5-30 minutos)");
        }
    }

    if let Some(titulo) = root.get("tituloEstacao").and_then(Value::as_str) {
        if titulo.trim().chars().count() < 10 {
            report.warn("tituloEstacao muito curto ou inválido");
        }
    }

    if let Some(palavras) = root.get("palavrasChave") {
        match palavras.as_array() {
            Some(palavras) if palavras.len() < 3 => {
                report.warn("palavrasChave deve ter pelo menos 3 termos");
            }
            Some(_) => {}
            None => report.invalid_type("palavrasChave deve ser uma lista"),
        }
    }
}

fn check_enumerations(root: &Map<String, Value>, report: &mut ValidationReport) {
    if let Some(especialidade) = root.get("especialidade").and_then(Value::as_str) {
        if !VALID_ESPECIALIDADES.contains(&especialidade) {
            report.warn(format!(
                "Especialidade '{}' não está na lista padrão INEP",
                especialidade
            ));
        }
    }

    if let Some(id) = root.get("idEstacao").and_then(Value::as_str) {
        if !id.starts_with(ID_ESTACAO_PREFIX) {
            report.warn(
                "idEstacao não segue o padrão REVALIDA_FACIL_[ANO]_[SEMESTRE]_EST[NUMERO]_...",
            );
        }
    }
}

fn check_materials_shape(root: &Map<String, Value>, report: &mut ValidationReport) {
    let Some(materiais) = root.get("materiaisDisponiveis") else {
        return;
    };
    let Some(materiais) = materiais.as_object() else {
        report.structural_issue("materiaisDisponiveis deve ser um objeto");
        return;
    };

    if let Some(info_verbais) = materiais.get("informacoesVerbaisSimulado") {
        match info_verbais.as_array() {
            Some(entries) => {
                for (index, entry) in entries.iter().enumerate() {
                    let well_formed = entry
                        .as_object()
                        .map(|e| {
                            e.get("contextoOuPerguntaChave").map_or(false, Value::is_string)
                                && e.get("informacao").map_or(false, Value::is_string)
                        })
                        .unwrap_or(false);
                    if !well_formed {
                        report.structural_issue(format!(
                            "informacoesVerbaisSimulado[{}] item malformado",
                            index
                        ));
                    }
                }
            }
            None => report.structural_issue("informacoesVerbaisSimulado deve ser uma lista"),
        }
    }

    if let Some(impressos) = materiais.get("impressos") {
        match impressos.as_array() {
            Some(entries) => {
                for (index, entry) in entries.iter().enumerate() {
                    let has_content = entry
                        .as_object()
                        .map(|e| e.contains_key("conteudo"))
                        .unwrap_or(false);
                    if !has_content {
                        report.structural_issue(format!(
                            "impressos[{}] item malformado ou sem 'conteudo'",
                            index
                        ));
                    }
                }
            }
            None => report.structural_issue("impressos deve ser uma lista"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_station() -> Value {
        json!({
            "idEstacao": "REVALIDA_FACIL_2024_1_EST01_IAM",
            "tituloEstacao": "Dor torácica aguda no pronto-socorro",
            "numeroDaEstacao": 1,
            "especialidade": "CLÍNICA MÉDICA",
            "tempoDuracaoMinutos": 10,
            "palavrasChave": ["infarto", "dor torácica", "emergência"],
            "nivelDificuldade": "intermediário",
            "instrucoesParticipante": {
                "cenarioAtendimento": {
                    "nivelAtencao": "terciária",
                    "tipoAtendimento": "urgência",
                    "infraestruturaUnidade": "sala de emergência",
                },
                "descricaoCasoCompleta": "Paciente masculino, 58 anos, com dor torácica.",
                "tarefasPrincipais": [
                    "Realizar anamnese dirigida",
                    "Interpretar o eletrocardiograma",
                    "Indicar a conduta inicial",
                ],
            },
            "materiaisDisponiveis": {
                "informacoesVerbaisSimulado": [
                    {"contextoOuPerguntaChave": "Dor?", "informacao": "Iniciou há 2 horas."},
                ],
                "impressos": [],
                "perguntasAtorSimulado": [],
            },
            "padraoEsperadoProcedimento": {
                "idChecklistAssociado": "CHECK_EST01",
                "sinteseEstacao": {
                    "resumoCasoPEP": "IAM com supra de ST.",
                    "focoPrincipalDetalhado": ["diagnóstico precoce", "conduta inicial"],
                },
                "itensAvaliacao": [
                    {
                        "idItem": "item_01",
                        "itemNumeroOficial": "1",
                        "descricaoItem": "Apresenta-se e acolhe o paciente",
                        "pontuacoes": {
                            "adequado": {"criterio": "Faz ambos", "pontos": 0.5},
                            "parcialmenteAdequado": {"criterio": "Faz um", "pontos": 0.25},
                            "inadequado": {"criterio": "Não faz", "pontos": 0.0},
                        },
                    },
                    {
                        "idItem": "item_02",
                        "itemNumeroOficial": "2",
                        "descricaoItem": "Solicita eletrocardiograma",
                        "pontuacoes": {
                            "adequado": {"criterio": "Solicita", "pontos": 0.25},
                            "inadequado": {"criterio": "Não solicita", "pontos": 0.0},
                        },
                    },
                    {
                        "idItem": "item_03",
                        "itemNumeroOficial": "3",
                        "descricaoItem": "Prescreve AAS",
                        "pontuacoes": {
                            "adequado": {"criterio": "Prescreve", "pontos": 0.5},
                            "parcialmenteAdequado": {"criterio": "Parcial", "pontos": 0.25},
                            "inadequado": {"criterio": "Não prescreve", "pontos": 0.0},
                        },
                    },
                ],
                "pontuacaoTotalEstacao": 10.0,
                "feedbackEstacao": {
                    "resumoTecnico": "Estação de síndrome coronariana aguda.",
                    "fontes": ["Diretriz SBC 2021"],
                },
            },
        })
    }

    #[test]
    fn complete_station_is_valid() {
        let mut doc = minimal_station();
        let report = validate_station(&mut doc);
        assert!(report.is_valid, "issues: {:?}", report);
        // The binary item produces an informational note; nothing is
        // actually synthesized into the document.
        assert!(report
            .corrections_applied
            .iter()
            .all(|c| c.contains("binário")));
    }

    #[test]
    fn missing_top_level_fields_are_reported() {
        let mut doc = json!({"tituloEstacao": "Estação incompleta de teste"});
        let report = validate_station(&mut doc);
        assert!(!report.is_valid);
        assert!(report
            .missing_required_fields
            .contains(&"numeroDaEstacao".to_string()));
        assert!(report
            .missing_required_fields
            .contains(&"padraoEsperadoProcedimento".to_string()));
    }

    #[test]
    fn binary_item_partial_tier_absence_is_not_flagged() {
        let mut doc = minimal_station();
        let report = validate_station(&mut doc);
        // item_02 has adequado 0.25 and no parcialmenteAdequado.
        assert!(report.is_valid, "issues: {:?}", report);
        assert!(doc["padraoEsperadoProcedimento"]["itensAvaliacao"][1]["pontuacoes"]
            .get("parcialmenteAdequado")
            .is_none());
    }

    #[test]
    fn partial_tier_is_synthesized_at_half_points() {
        let mut doc = minimal_station();
        doc["padraoEsperadoProcedimento"]["itensAvaliacao"][0]["pontuacoes"]
            .as_object_mut()
            .unwrap()
            .remove("parcialmenteAdequado");

        let report = validate_station(&mut doc);

        let synthesized =
            &doc["padraoEsperadoProcedimento"]["itensAvaliacao"][0]["pontuacoes"]["parcialmenteAdequado"];
        assert_eq!(synthesized["pontos"], json!(0.25));
        assert_eq!(
            synthesized["criterio"],
            json!("Realiza parcialmente as ações esperadas.")
        );
        assert!(report
            .corrections_applied
            .iter()
            .any(|c| c.contains("parcialmenteAdequado")));
        assert!(report.is_valid, "issues: {:?}", report);
    }

    #[test]
    fn inadequado_tier_is_synthesized_at_zero() {
        let mut doc = minimal_station();
        doc["padraoEsperadoProcedimento"]["itensAvaliacao"][0]["pontuacoes"]
            .as_object_mut()
            .unwrap()
            .remove("inadequado");

        let report = validate_station(&mut doc);

        let synthesized =
            &doc["padraoEsperadoProcedimento"]["itensAvaliacao"][0]["pontuacoes"]["inadequado"];
        assert_eq!(synthesized["pontos"], json!(0.0));
        assert!(report.is_valid, "issues: {:?}", report);
    }

    #[test]
    fn empty_pontuacoes_synthesizes_all_three_tiers() {
        let mut doc = minimal_station();
        doc["padraoEsperadoProcedimento"]["itensAvaliacao"][0]["pontuacoes"] = json!({});

        let report = validate_station(&mut doc);

        let pontuacoes = &doc["padraoEsperadoProcedimento"]["itensAvaliacao"][0]["pontuacoes"];
        assert_eq!(pontuacoes["adequado"]["pontos"], json!(0.5));
        assert_eq!(pontuacoes["parcialmenteAdequado"]["pontos"], json!(0.25));
        assert_eq!(pontuacoes["inadequado"]["pontos"], json!(0.0));
        assert!(report.corrections_applied.len() >= 3);
    }

    #[test]
    fn scenario_c_synthesizes_partial_and_inadequate() {
        let mut doc = minimal_station();
        doc["padraoEsperadoProcedimento"]["itensAvaliacao"][0]["pontuacoes"] = json!({
            "adequado": {"pontos": 0.5, "criterio": "ok"},
        });

        let report = validate_station(&mut doc);

        let pontuacoes = &doc["padraoEsperadoProcedimento"]["itensAvaliacao"][0]["pontuacoes"];
        assert_eq!(pontuacoes["parcialmenteAdequado"]["pontos"], json!(0.25));
        assert_eq!(pontuacoes["inadequado"]["pontos"], json!(0.0));
        assert_eq!(
            report
                .corrections_applied
                .iter()
                .filter(|c| c.contains("item 0"))
                .count(),
            2
        );
    }

    #[test]
    fn adequado_points_found_in_variant_layout() {
        let mut doc = minimal_station();
        doc["padraoEsperadoProcedimento"]["itensAvaliacao"][0]["pontuacoes"] = json!({
            "adequado": {"criterio": "ok", "valor": 0.6},
        });

        let mut report = ValidationReport::new();
        let padrao = doc["padraoEsperadoProcedimento"]["itensAvaliacao"][0]["pontuacoes"]
            .as_object_mut()
            .unwrap();
        synthesize_missing_tiers(padrao, 0, &mut report);

        assert_eq!(padrao["parcialmenteAdequado"]["pontos"], json!(0.3));
    }

    #[test]
    fn wrong_scalar_types_are_reported() {
        let mut doc = minimal_station();
        doc["numeroDaEstacao"] = json!("um");
        doc["tempoDuracaoMinutos"] = json!(10.5);

        let report = validate_station(&mut doc);
        assert!(!report.is_valid);
        assert_eq!(report.invalid_field_types.len(), 2);
    }

    #[test]
    fn unknown_specialty_is_a_warning_only() {
        let mut doc = minimal_station();
        doc["especialidade"] = json!("DERMATOLOGIA");

        let report = validate_station(&mut doc);
        assert!(report.is_valid, "issues: {:?}", report);
        assert!(report.warnings.iter().any(|w| w.contains("DERMATOLOGIA")));
    }

    #[test]
    fn id_prefix_deviation_is_a_warning_only() {
        let mut doc = minimal_station();
        doc["idEstacao"] = json!("EST_01");

        let report = validate_station(&mut doc);
        assert!(report.is_valid, "issues: {:?}", report);
        assert!(report.warnings.iter().any(|w| w.contains("idEstacao")));
    }

    #[test]
    fn tier_points_sum_above_one_is_a_warning() {
        let mut doc = minimal_station();
        doc["padraoEsperadoProcedimento"]["itensAvaliacao"][0]["pontuacoes"] = json!({
            "adequado": {"criterio": "a", "pontos": 0.8},
            "parcialmenteAdequado": {"criterio": "b", "pontos": 0.4},
            "inadequado": {"criterio": "c", "pontos": 0.0},
        });

        let report = validate_station(&mut doc);
        assert!(report.warnings.iter().any(|w| w.contains("excede 1.0")));
    }

    #[test]
    fn malformed_verbal_information_is_structural() {
        let mut doc = minimal_station();
        doc["materiaisDisponiveis"]["informacoesVerbaisSimulado"] = json!([{"informacao": 5}]);

        let report = validate_station(&mut doc);
        assert!(!report.is_valid);
        assert!(report
            .structural_issues
            .iter()
            .any(|s| s.contains("informacoesVerbaisSimulado[0]")));
    }
}
