//! # Menções de Espécies
//!
//! Tipos compartilhados pelo casamento de regras, pela fusão de menções e pela
//! síntese de paradas.
//!
//! | Label         | Significado                      | Exemplo          |
//! |---------------|----------------------------------|------------------|
//! | `SPECIES`     | Nome científico canônico         | Quercus alba     |
//! | `ALT_SPECIES` | Grafia alternativa do táxon      | Platanus acerifolia |
//! | `COMMON_NAME` | Nome popular (singular ou plural)| white oaks       |

use serde::{Deserialize, Serialize};

/// Rótulo de uma regra e das menções que ela produz.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Label {
    #[serde(rename = "SPECIES")]
    Species,
    #[serde(rename = "ALT_SPECIES")]
    AltSpecies,
    #[serde(rename = "COMMON_NAME")]
    CommonName,
}

impl Label {
    pub fn name(&self) -> &'static str {
        match self {
            Label::Species => "SPECIES",
            Label::AltSpecies => "ALT_SPECIES",
            Label::CommonName => "COMMON_NAME",
        }
    }

    /// Táxon (canônico ou alternativo), em oposição a nome popular.
    pub fn is_taxon(&self) -> bool {
        matches!(self, Label::Species | Label::AltSpecies)
    }
}

impl std::fmt::Display for Label {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Intervalo semiaberto `[start, end)` em bytes no documento.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CharSpan {
    pub start: usize,
    pub end: usize,
}

/// Um trecho do texto reconhecido por uma regra.
///
/// Menções vindas do casamento sempre têm `span`. A fusão pode sintetizar uma
/// menção de espécie sem posição (quando o nome popular aparece sozinho), e
/// essa fica com `span: None`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Mention {
    /// Texto original, com a caixa do documento (ex: "white oak").
    pub text: String,
    pub span: Option<CharSpan>,
    pub label: Label,
    /// Id da espécie dona da regra.
    pub species_id: Option<String>,
}

impl Mention {
    pub fn start(&self) -> Option<usize> {
        self.span.map(|s| s.start)
    }

    /// Texto com mais de uma palavra (separadas por espaço).
    pub fn is_multi_word(&self) -> bool {
        self.text.split_whitespace().nth(1).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_serde_names() {
        let json = serde_json::to_string(&Label::AltSpecies).unwrap();
        assert_eq!(json, "\"ALT_SPECIES\"");
        assert_eq!(Label::CommonName.to_string(), "COMMON_NAME");
    }

    #[test]
    fn test_multi_word() {
        let m = Mention {
            text: "white oak".into(),
            span: Some(CharSpan { start: 0, end: 9 }),
            label: Label::CommonName,
            species_id: Some("Q1".into()),
        };
        assert!(m.is_multi_word());
        assert_eq!(m.start(), Some(0));
        let single = Mention { text: "Hackberry".into(), ..m };
        assert!(!single.is_multi_word());
    }
}
