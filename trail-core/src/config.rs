//! # Configuração do Pipeline
//!
//! Tudo que é específico do livro de 1968 (marcadores, tamanhos de lead-in,
//! correções de OCR) fica aqui, com padrões que reproduzem a edição original.
//! Um arquivo JSON parcial sobrescreve apenas os campos presentes.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TrailError};
use crate::segment::SectionLayout;
use crate::sources::read_json;

/// Marcadores das seções montadas à mão (matéria inicial e final).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FixedSectionMarkers {
    pub title: String,
    pub contents: String,
    pub introduction: String,
    pub footnote: String,
    pub author: String,
    /// Rodapé de página removido do texto do autor.
    pub page_trailer: String,
}

impl Default for FixedSectionMarkers {
    fn default() -> Self {
        Self {
            title: "Tree Trails in Prospect Park".to_string(),
            contents: "TABLE".to_string(),
            introduction: "INTRODUCTION".to_string(),
            footnote: "FOOTNOTE".to_string(),
            author: "A WORD ABOUT".to_string(),
            page_trailer: "Top of page".to_string(),
        }
    }
}

/// Formato do excerto exportado.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Formatting {
    /// Texto rico em HTML (negrito e itálico colorido).
    #[default]
    Memento,
    /// Texto puro, sem marcação.
    Plain,
}

/// Correção literal aplicada ao documento antes da tokenização.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Correction {
    pub find: String,
    pub replace: String,
}

impl Correction {
    pub fn new(find: &str, replace: &str) -> Self {
        Self {
            find: find.to_string(),
            replace: replace.to_string(),
        }
    }
}

/// Erros de OCR conhecidos da edição digitalizada.
fn default_corrections() -> Vec<Correction> {
    vec![
        Correction::new("Comus florida", "Cornus florida"),
        Correction::new("anwricana", "americana"),
        Correction::new("veluntina", "velutina"),
        Correction::new("Uhnus procera", "Ulmus procera"),
        Correction::new("Tilia europea", "Tilia europaea"),
        Correction::new("P. onentalis", "P. orientalis"),
        Correction::new("P. strobits", "P. strobus"),
    ]
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub layout: SectionLayout,
    pub fixed: FixedSectionMarkers,
    pub formatting: Formatting,
    /// Cor dos itálicos, no formato "R, G, B".
    pub highlight_rgb: Option<String>,
    pub lead_in_chars: usize,
    pub front_matter_lead_in_chars: usize,
    pub corrections: Vec<Correction>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            layout: SectionLayout::default(),
            fixed: FixedSectionMarkers::default(),
            formatting: Formatting::default(),
            highlight_rgb: Some("156, 39, 176".to_string()),
            lead_in_chars: 35,
            front_matter_lead_in_chars: 30,
            corrections: default_corrections(),
        }
    }
}

impl PipelineConfig {
    /// Configuração completa do livro: quatro tours e matéria final obrigatória.
    pub fn tree_trails() -> Self {
        Self {
            layout: SectionLayout::tree_trails(),
            ..Self::default()
        }
    }

    /// Carrega um JSON parcial e valida o resultado.
    pub fn from_file(path: &Path) -> Result<Self> {
        let config: Self = read_json(path)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.layout.tour_marker.trim().is_empty() {
            return Err(TrailError::config("marcador de tour vazio"));
        }
        if self.layout.back_matter_marker.trim().is_empty() {
            return Err(TrailError::config("marcador de matéria final vazio"));
        }
        if self.layout.expected_tours == Some(0) {
            return Err(TrailError::config("expected_tours deve ser pelo menos 1"));
        }
        if self.lead_in_chars == 0 || self.front_matter_lead_in_chars == 0 {
            return Err(TrailError::config("tamanho de lead-in deve ser positivo"));
        }
        if let Some(c) = self.corrections.iter().find(|c| c.find.is_empty()) {
            return Err(TrailError::config(format!("correção vazia para \"{}\"", c.replace)));
        }
        Ok(())
    }

    /// Aplica as correções de OCR, na ordem configurada.
    pub fn correct(&self, document: &str) -> String {
        self.corrections
            .iter()
            .fold(document.to_string(), |text, c| text.replace(&c.find, &c.replace))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PipelineConfig::default();
        assert_eq!(config.lead_in_chars, 35);
        assert_eq!(config.front_matter_lead_in_chars, 30);
        assert_eq!(config.corrections.len(), 7);
        assert_eq!(config.layout.expected_tours, None);
        assert_eq!(PipelineConfig::tree_trails().layout.expected_tours, Some(4));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json() {
        let config: PipelineConfig =
            serde_json::from_str(r#"{"formatting": "plain", "layout": {"expected_tours": 2}}"#).unwrap();
        assert_eq!(config.formatting, Formatting::Plain);
        assert_eq!(config.layout.expected_tours, Some(2));
        assert_eq!(config.layout.tour_marker, "TOUR");
        assert_eq!(config.fixed.author, "A WORD ABOUT");
    }

    #[test]
    fn test_validate_rejects_empty_marker() {
        let mut config = PipelineConfig::default();
        config.layout.tour_marker = " ".into();
        assert!(matches!(config.validate(), Err(TrailError::Config(_))));
    }

    #[test]
    fn test_correct() {
        let config = PipelineConfig::default();
        assert_eq!(
            config.correct("Comus florida and P. strobits."),
            "Cornus florida and P. strobus."
        );
    }
}
