//! Pipeline - end-to-end processing of raw LLM output into a storable
//! station document.
//!
//! Stage order is fixed: extraction, textual sanitization and structural
//! repair run until one of them yields parseable JSON; the LLM correction
//! call is the escalation path when every deterministic strategy is
//! exhausted, and the aggressive reconstruction plus diagnostic stub sit
//! behind it. The parsed document then goes through schema validation,
//! rubric and materials sanitization, and exhibit validation, which
//! enforce the store's nesting ceilings on their subtrees. Later stages
//! assume earlier stages' invariants, so the order must not change.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::domain::repair::{aggressive_repair, extract_json, repair, sanitize};
use crate::domain::station::ValidationReport;
use crate::domain::validation::{
    sanitize_materials, sanitize_rubric, validate_exhibits, validate_station,
};
use crate::ports::{ModelPreference, TextGenerator};

/// Timeout for the last-resort correction call. Shorter than the
/// generation timeout: a correction that takes longer than this is not
/// worth waiting for when the aggressive reconstruction can still run.
const CORRECTION_TIMEOUT: Duration = Duration::from_secs(60);

/// Document plus the accumulated validation report.
///
/// `process` never fails for syntactic reasons: the worst case is a
/// diagnostic stub document with `is_valid == false` and a populated
/// issue trail.
#[derive(Debug, Clone)]
pub struct ProcessedStation {
    pub document: Value,
    pub report: ValidationReport,
}

/// Orchestrates the repair, validation and sanitization stages.
pub struct Pipeline {
    generator: Arc<dyn TextGenerator>,
    correction_timeout: Duration,
}

impl Pipeline {
    /// Creates a pipeline using `generator` for the correction escalation.
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self {
            generator,
            correction_timeout: CORRECTION_TIMEOUT,
        }
    }

    /// Overrides the correction call timeout.
    pub fn with_correction_timeout(mut self, timeout: Duration) -> Self {
        self.correction_timeout = timeout;
        self
    }

    /// Processes raw LLM text into a corrected document and report.
    pub async fn process(&self, raw: &str) -> ProcessedStation {
        let mut report = ValidationReport::new();
        let mut document = self.recover_document(raw, &mut report).await;

        report.merge(validate_station(&mut document));

        if let Some(root) = document.as_object_mut() {
            if let Some(padrao) = root.get("padraoEsperadoProcedimento") {
                let sanitized = sanitize_rubric(padrao);
                root.insert("padraoEsperadoProcedimento".to_string(), sanitized);
            }

            if let Some(materials) = root.get("materiaisDisponiveis") {
                let sanitized = sanitize_materials(materials);
                root.insert("materiaisDisponiveis".to_string(), sanitized);
            }
        }

        self.process_exhibits(&mut document, &mut report);

        annotate_unresolved(&mut document, &report);

        info!(
            is_valid = report.is_valid,
            corrections = report.corrections_applied.len(),
            warnings = report.warnings.len(),
            "pipeline finished"
        );

        ProcessedStation { document, report }
    }

    /// Turns raw text into parsed JSON, escalating through the repair
    /// layers. Always returns a parseable document.
    async fn recover_document(&self, raw: &str, report: &mut ValidationReport) -> Value {
        let candidate = extract_json(raw);
        if let Ok(value) = serde_json::from_str::<Value>(&candidate) {
            debug!("extracted candidate parsed directly");
            return value;
        }

        let sanitized = sanitize(&candidate);
        if let Ok(value) = serde_json::from_str::<Value>(&sanitized) {
            report.correction("JSON recuperado pela sanitização textual".to_string());
            return value;
        }

        let best_effort = match repair(&sanitized) {
            Ok(repaired) => {
                if let Ok(value) = serde_json::from_str::<Value>(&repaired) {
                    report.correction("JSON recuperado pela reparação estrutural".to_string());
                    return value;
                }
                repaired
            }
            Err(exhausted) => {
                debug!(reason = %exhausted.reason, "deterministic repair exhausted");
                exhausted.best_effort
            }
        };

        if let Some(value) = self.request_correction(&best_effort).await {
            report.correction("JSON corrigido pelo modelo de linguagem".to_string());
            return value;
        }

        match aggressive_repair(&best_effort) {
            Ok(value) => {
                report.correction(
                    "JSON reconstruído a partir dos pares chave-valor".to_string(),
                );
                report.structural_issue(
                    "estrutura original perdida na reconstrução agressiva".to_string(),
                );
                value
            }
            Err(stub) => {
                warn!("all repair strategies failed, emitting diagnostic stub");
                report.structural_issue(format!("documento irreparável: {}", stub.error));
                stub.to_value()
            }
        }
    }

    /// Last-resort correction through the text generation port.
    ///
    /// Failures are absorbed: the caller falls back to the aggressive
    /// reconstruction, never blocks on the collaborator.
    async fn request_correction(&self, broken: &str) -> Option<Value> {
        let prompt = correction_prompt(broken);
        match self
            .generator
            .generate(&prompt, ModelPreference::Fast, self.correction_timeout)
            .await
        {
            Ok(text) => {
                let candidate = extract_json(&text);
                if let Ok(value) = serde_json::from_str::<Value>(&candidate) {
                    info!("JSON corrected by the language model");
                    return Some(value);
                }
                let resanitized = sanitize(&candidate);
                match serde_json::from_str::<Value>(&resanitized) {
                    Ok(value) => {
                        info!("model correction parsed after re-sanitization");
                        Some(value)
                    }
                    Err(err) => {
                        warn!(error = %err, "model correction still unparseable");
                        None
                    }
                }
            }
            Err(err) => {
                warn!(error = %err, "correction call failed");
                None
            }
        }
    }

    /// Validates exhibits and folds the outcome into the report. The
    /// exhibit validator enforces the content depth ceiling itself, as
    /// its type-specific repairs shift nesting levels the ceiling pass
    /// must see last.
    fn process_exhibits(&self, document: &mut Value, report: &mut ValidationReport) {
        let outcome = document
            .get("materiaisDisponiveis")
            .and_then(|m| m.get("impressos"))
            .and_then(Value::as_array)
            .map(|items| validate_exhibits(items));

        let Some(outcome) = outcome else {
            return;
        };

        for error in outcome.errors {
            report.structural_issue(error);
        }
        for warning in outcome.warnings {
            report.warn(warning);
        }
        for correction in outcome.corrections {
            report.correction(correction);
        }

        if let Some(materials) = document
            .get_mut("materiaisDisponiveis")
            .and_then(Value::as_object_mut)
        {
            materials.insert("impressos".to_string(), Value::Array(outcome.items));
        }
    }
}

/// Builds the correction prompt around the broken JSON.
fn correction_prompt(broken: &str) -> String {
    format!(
        "O seguinte texto deveria ser um JSON válido para uma estação médica REVALIDA, \
         mas contém erros de sintaxe.\n\
         Corrija TODOS os erros de sintaxe JSON e retorne APENAS o código JSON válido, \
         sem nenhum texto ou explicação adicional.\n\n\
         IMPORTANTE:\n\
         - Mantenha toda a estrutura e o conteúdo clínico\n\
         - Corrija apenas erros de sintaxe (aspas, vírgulas, chaves)\n\n\
         JSON Inválido:\n```\n{}\n```\n\n\
         JSON Corrigido (APENAS o JSON, nada mais):",
        broken
    )
}

/// Attaches unresolved defects to the document so storage is not blocked
/// and a reviewer can find the record later.
fn annotate_unresolved(document: &mut Value, report: &ValidationReport) {
    let Some(root) = document.as_object_mut() else {
        return;
    };

    if report.has_issues() {
        let annotation = serde_json::to_value(report).unwrap_or(Value::Null);
        root.insert("_validation_issues".to_string(), annotation);
    } else if !report.warnings.is_empty() {
        root.insert(
            "_validation_warnings".to_string(),
            Value::Array(
                report
                    .warnings
                    .iter()
                    .map(|w| Value::String(w.clone()))
                    .collect(),
            ),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::ai::{MockGenerationFailure, MockTextGenerator};
    use serde_json::json;

    fn pipeline_with(generator: MockTextGenerator) -> (Pipeline, MockTextGenerator) {
        let tracked = generator.clone();
        (Pipeline::new(Arc::new(generator)), tracked)
    }

    #[tokio::test]
    async fn valid_json_passes_through_untouched() {
        let (pipeline, generator) = pipeline_with(MockTextGenerator::new());
        let raw = r#"{"tituloEstacao": "Dor torácica aguda", "numeroDaEstacao": 2}"#;

        let processed = pipeline.process(raw).await;

        assert_eq!(processed.document["tituloEstacao"], json!("Dor torácica aguda"));
        assert_eq!(generator.call_count(), 0);
    }

    #[tokio::test]
    async fn fenced_block_with_comma_slips_is_repaired_deterministically() {
        let (pipeline, generator) = pipeline_with(MockTextGenerator::new());
        let raw = "Here is the station:\n```json\n{\"tituloEstacao\": \"Caso X\" \"numeroDaEstacao\": 1,}\n```";

        let processed = pipeline.process(raw).await;

        assert_eq!(processed.document["tituloEstacao"], json!("Caso X"));
        assert_eq!(processed.document["numeroDaEstacao"], json!(1));
        // Other required fields are missing, but no exception and no
        // escalation to the model.
        assert!(!processed.report.is_valid);
        assert_eq!(generator.call_count(), 0);
    }

    #[tokio::test]
    async fn escalates_to_model_when_deterministic_repair_fails() {
        let generator = MockTextGenerator::new()
            .with_response(r#"{"tituloEstacao": "Recuperada pelo modelo", "numeroDaEstacao": 7}"#);
        let (pipeline, tracked) = pipeline_with(generator);

        // Bare-word values defeat every deterministic strategy.
        let raw = r#"{"tituloEstacao": valor sem aspas nem estrutura}"#;
        let processed = pipeline.process(raw).await;

        assert_eq!(tracked.call_count(), 1);
        assert_eq!(
            processed.document["tituloEstacao"],
            json!("Recuperada pelo modelo")
        );
        assert!(processed
            .report
            .corrections_applied
            .iter()
            .any(|c| c.contains("modelo")));
    }

    #[tokio::test]
    async fn correction_prompt_carries_the_broken_payload() {
        let generator = MockTextGenerator::new().with_response(r#"{"a": 1}"#);
        let (pipeline, tracked) = pipeline_with(generator);

        pipeline.process(r#"{"x": valor sem aspas}"#).await;

        let prompt = tracked.last_prompt().expect("correction call recorded");
        assert!(prompt.contains("erros de sintaxe"));
        assert!(prompt.contains("APENAS o código JSON válido"));
    }

    #[tokio::test]
    async fn stub_document_when_model_also_fails() {
        let generator = MockTextGenerator::new().with_failure(MockGenerationFailure::Timeout {
            timeout_secs: 60,
        });
        let (pipeline, _) = pipeline_with(generator);

        let processed = pipeline.process("not json in any shape or form").await;

        assert!(processed.document.get("error").is_some());
        assert!(!processed.report.is_valid);
        assert!(!processed.report.structural_issues.is_empty());
    }

    #[tokio::test]
    async fn aggressive_reconstruction_before_stub() {
        let generator = MockTextGenerator::new()
            .with_failure(MockGenerationFailure::NoValidContent);
        let (pipeline, _) = pipeline_with(generator);

        // Unparseable as a whole but rich in key-value pairs.
        let raw = r#"ruído "tituloEstacao": "Caso Y", lixo "numeroDaEstacao": 3, fim"#;
        let processed = pipeline.process(raw).await;

        assert_eq!(processed.document["tituloEstacao"], json!("Caso Y"));
        assert_eq!(processed.document["numeroDaEstacao"], json!(3));
        assert!(processed
            .report
            .structural_issues
            .iter()
            .any(|issue| issue.contains("reconstrução")));
    }

    #[tokio::test]
    async fn missing_sub_scores_are_synthesized_end_to_end() {
        let (pipeline, _) = pipeline_with(MockTextGenerator::new());
        let raw = serde_json::to_string(&json!({
            "padraoEsperadoProcedimento": {
                "itensAvaliacao": [
                    {"pontuacoes": {"adequado": {"pontos": 0.5, "criterio": "ok"}}}
                ]
            }
        }))
        .unwrap();

        let processed = pipeline.process(&raw).await;

        let pontuacoes = &processed.document["padraoEsperadoProcedimento"]["itensAvaliacao"][0]
            ["pontuacoes"];
        assert_eq!(pontuacoes["parcialmenteAdequado"]["pontos"], json!(0.25));
        assert_eq!(pontuacoes["inadequado"]["pontos"], json!(0.0));
        assert!(processed.report.corrections_applied.len() >= 2);
    }

    #[tokio::test]
    async fn exhibit_content_respects_depth_ceiling() {
        let (pipeline, _) = pipeline_with(MockTextGenerator::new());
        let raw = serde_json::to_string(&json!({
            "materiaisDisponiveis": {
                "impressos": [{
                    "idImpresso": "imp_desc_01",
                    "tituloImpresso": "Descrição do caso",
                    "tipoConteudo": "texto_simples",
                    "conteudo": {
                        "texto": {"nivel1": {"nivel2": {"nivel3": "x"}}}
                    }
                }]
            }
        }))
        .unwrap();

        let processed = pipeline.process(&raw).await;

        let conteudo = &processed.document["materiaisDisponiveis"]["impressos"][0]["conteudo"];
        assert!(
            crate::domain::validation::depth::max_depth(conteudo)
                <= crate::domain::station::contract::EXHIBIT_CONTENT_MAX_DEPTH
        );
        // The deep branch is stringified, not dropped.
        let branch = conteudo["texto"].as_str().expect("stringified branch");
        assert!(branch.contains("nivel3"));
    }

    #[tokio::test]
    async fn legacy_table_type_is_remapped() {
        let (pipeline, _) = pipeline_with(MockTextGenerator::new());
        let raw = serde_json::to_string(&json!({
            "materiaisDisponiveis": {
                "impressos": [{
                    "idImpresso": "imp_lab_01",
                    "tituloImpresso": "Hemograma completo",
                    "tipoConteudo": "tabela",
                    "conteudo": {
                        "secoes": [{
                            "tituloSecao": "SÉRIE VERMELHA",
                            "itens": [{"chave": "Hb", "valor": "12 g/dL"}]
                        }]
                    }
                }]
            }
        }))
        .unwrap();

        let processed = pipeline.process(&raw).await;

        let impresso = &processed.document["materiaisDisponiveis"]["impressos"][0];
        assert_eq!(impresso["tipoConteudo"], json!("lista_chave_valor_secoes"));
        assert_eq!(
            impresso["conteudo"]["secoes"][0]["itens"][0]["chave"],
            json!("Hb")
        );
    }

    #[tokio::test]
    async fn unresolved_issues_are_annotated_on_the_document() {
        let (pipeline, _) = pipeline_with(MockTextGenerator::new());

        let processed = pipeline
            .process(r#"{"tituloEstacao": "Sem os demais campos"}"#)
            .await;

        let issues = processed
            .document
            .get("_validation_issues")
            .expect("annotation present");
        assert_eq!(issues["is_valid"], json!(false));
        assert!(issues["missing_required_fields"]
            .as_array()
            .map(|a| !a.is_empty())
            .unwrap_or(false));
    }

    #[tokio::test]
    async fn warnings_only_documents_get_the_lighter_annotation() {
        let (pipeline, _) = pipeline_with(MockTextGenerator::new());
        let raw = serde_json::to_string(&json!({
            "idEstacao": "REVALIDA_FACIL_EST_001",
            "tituloEstacao": "Atendimento de dor abdominal",
            "numeroDaEstacao": 1,
            "especialidade": "CLÍNICA MÉDICA",
            "tempoDuracaoMinutos": 10,
            "nivelDificuldade": "médio",
            "palavrasChave": ["dor", "abdome"],
            "instrucoesParticipante": {
                "descricaoCasoCompleta": "Paciente com dor abdominal difusa.",
                "cenarioAtendimento": {
                    "nivelAtencao": "atenção primária",
                    "tipoAtendimento": "consulta",
                    "infraestruturaUnidade": "UBS"
                },
                "tarefasPrincipais": ["Anamnese", "Exame físico", "Conduta"]
            },
            "materiaisDisponiveis": {
                "informacoesVerbaisSimulado": [],
                "impressos": [],
                "perguntasAtorSimulado": []
            },
            "padraoEsperadoProcedimento": {
                "idChecklistAssociado": "chk_001",
                "sinteseEstacao": {
                    "resumoCasoPEP": "Dor abdominal a esclarecer.",
                    "focoPrincipalDetalhado": ["anamnese dirigida"]
                },
                "itensAvaliacao": [
                    {
                        "idItem": "item_01",
                        "itemNumeroOficial": "1",
                        "descricaoItem": "Apresenta-se ao paciente",
                        "pontuacoes": {
                            "adequado": {"criterio": "ok", "pontos": 0.25},
                            "inadequado": {"criterio": "não", "pontos": 0.0}
                        }
                    },
                    {
                        "idItem": "item_02",
                        "itemNumeroOficial": "2",
                        "descricaoItem": "Realiza anamnese",
                        "pontuacoes": {
                            "adequado": {"criterio": "ok", "pontos": 0.5},
                            "parcialmenteAdequado": {"criterio": "parcial", "pontos": 0.25},
                            "inadequado": {"criterio": "não", "pontos": 0.0}
                        }
                    }
                ],
                "pontuacaoTotalEstacao": 0.75,
                "feedbackEstacao": {
                    "resumoTecnico": "Estação de anamnese.",
                    "fontes": ["Diretriz SBC"]
                }
            }
        }))
        .unwrap();

        let processed = pipeline.process(&raw).await;

        assert!(processed.report.is_valid, "{:?}", processed.report);
        assert!(processed.document.get("_validation_issues").is_none());
        // Two evaluation items trigger the cardinality warning.
        assert!(processed.document.get("_validation_warnings").is_some());
    }
}
