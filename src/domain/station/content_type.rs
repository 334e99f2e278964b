//! Exhibit content types.
//!
//! Each printed material ("impresso") declares a `tipoConteudo` that selects
//! its structural validator. Generation occasionally emits legacy or
//! misspelled tags; those are normalized to a canonical variant before any
//! dispatch happens, so invalid tags never reach the validators.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Canonical content type of a printed material.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
    /// Free-running descriptive text.
    TextoSimples,
    /// An image accompanied by a written report (laudo).
    ImagemComTexto,
    /// Sections of key/value items (lab panels, physical exam findings).
    ListaChaveValorSecoes,
    /// Vital signs chart.
    SinaisVitais,
}

/// Legacy tag spellings observed in generated output, mapped to canon.
const LEGACY_REMAP: &[(&str, ContentType)] = &[
    ("imagemComLaudo", ContentType::ImagemComTexto),
    ("imagemComTexto", ContentType::ImagemComTexto),
    ("tabela", ContentType::ListaChaveValorSecoes),
    ("textosimples", ContentType::TextoSimples),
];

impl ContentType {
    /// All canonical variants.
    pub fn all() -> &'static [ContentType] {
        &[
            ContentType::TextoSimples,
            ContentType::ImagemComTexto,
            ContentType::ListaChaveValorSecoes,
            ContentType::SinaisVitais,
        ]
    }

    /// The canonical wire tag.
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::TextoSimples => "texto_simples",
            ContentType::ImagemComTexto => "imagem_com_texto",
            ContentType::ListaChaveValorSecoes => "lista_chave_valor_secoes",
            ContentType::SinaisVitais => "sinais_vitais",
        }
    }

    /// Parses a canonical tag. Legacy spellings are rejected here;
    /// use [`ContentType::normalize`] first.
    pub fn parse(tag: &str) -> Option<ContentType> {
        ContentType::all().iter().copied().find(|ct| ct.as_str() == tag)
    }

    /// Resolves a raw tag to its canonical variant, applying the legacy
    /// remap table. Returns `None` for tags with no known mapping.
    pub fn normalize(tag: &str) -> Option<ContentType> {
        if let Some(ct) = ContentType::parse(tag) {
            return Some(ct);
        }
        LEGACY_REMAP
            .iter()
            .find(|(legacy, _)| *legacy == tag)
            .map(|(_, ct)| *ct)
    }

}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
