//! The station document field contract.
//!
//! The effective schema is this enumeration of required fields and allowed
//! values, mirrored from the official station template. It is intentionally
//! not a JSON-Schema engine: the checks in `validation::schema` are the
//! contract.

/// Required top-level fields of a station document.
pub const REQUIRED_TOP_LEVEL: &[&str] = &[
    "idEstacao",
    "tituloEstacao",
    "numeroDaEstacao",
    "especialidade",
    "tempoDuracaoMinutos",
    "palavrasChave",
    "nivelDificuldade",
    "instrucoesParticipante",
    "materiaisDisponiveis",
    "padraoEsperadoProcedimento",
];

/// Required fields of `instrucoesParticipante`.
pub const REQUIRED_INSTRUCOES: &[&str] = &[
    "cenarioAtendimento",
    "descricaoCasoCompleta",
    "tarefasPrincipais",
];

/// Required fields of `instrucoesParticipante.cenarioAtendimento`.
pub const REQUIRED_CENARIO: &[&str] = &[
    "nivelAtencao",
    "tipoAtendimento",
    "infraestruturaUnidade",
];

/// Required fields of `padraoEsperadoProcedimento`.
pub const REQUIRED_PADRAO: &[&str] = &[
    "idChecklistAssociado",
    "sinteseEstacao",
    "itensAvaliacao",
    "pontuacaoTotalEstacao",
    "feedbackEstacao",
];

/// Required fields of each entry in `itensAvaliacao`.
pub const REQUIRED_ITEM: &[&str] = &[
    "idItem",
    "itemNumeroOficial",
    "descricaoItem",
    "pontuacoes",
];

/// The three scoring tiers of an evaluation item.
pub const SCORE_TIERS: &[&str] = &["adequado", "parcialmenteAdequado", "inadequado"];

/// Specialties recognized by the INEP exam board. Other values are warned
/// about, never rejected.
pub const VALID_ESPECIALIDADES: &[&str] = &[
    "CLÍNICA MÉDICA",
    "CIRURGIA GERAL",
    "PEDIATRIA",
    "GINECOLOGIA E OBSTETRÍCIA",
    "MEDICINA DA FAMÍLIA E COMUNIDADE",
];

/// Expected prefix of `idEstacao`.
pub const ID_ESTACAO_PREFIX: &str = "REVALIDA_FACIL_";

/// An item whose full score is at or below this threshold is binary:
/// it has no meaningful partial-credit tier.
pub const BINARY_ITEM_THRESHOLD: f64 = 0.25;

/// Criterion text synthesized for a missing `adequado` tier.
pub const CRITERIO_ADEQUADO: &str =
    "Realiza todas as ações esperadas de forma adequada.";

/// Criterion text synthesized for a missing `parcialmenteAdequado` tier.
pub const CRITERIO_PARCIAL: &str = "Realiza parcialmente as ações esperadas.";

/// Criterion text synthesized for a missing `inadequado` tier.
pub const CRITERIO_INADEQUADO: &str =
    "Não realiza as ações esperadas ou realiza de forma inadequada.";

/// Nesting ceiling for exhibit `conteudo` subtrees, imposed by the
/// document store. Verbal information elements carry a stricter ceiling
/// of one, enforced structurally by the materials sanitizer.
pub const EXHIBIT_CONTENT_MAX_DEPTH: usize = 2;
