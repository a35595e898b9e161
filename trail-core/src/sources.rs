//! # Fontes de Dados
//!
//! Formatos de entrada do pipeline. A coleta (Wikipedia, Wikidata, SPARQL) fica
//! fora deste crate: aqui só chegam dados já materializados, por meio de fontes
//! síncronas.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Uma espécie como vem da base de conhecimento, antes de ganhar id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SpeciesEntry {
    /// Nome científico (ex: "Quercus alba").
    pub name: String,
    /// Id externo (ex: Wikidata "Q1").
    #[serde(default)]
    pub external_id: Option<String>,
    #[serde(default)]
    pub common_names: Vec<String>,
    #[serde(default)]
    pub alt_names: Vec<String>,
    /// Link da Wikipedia, absoluto ou relativo ("/wiki/Quercus_alba").
    #[serde(default)]
    pub wikipedia: Option<String>,
    /// Página ou categoria do Wikimedia Commons.
    #[serde(default)]
    pub wikimedia_commons: Option<String>,
    /// Id de táxon ou URL do iNaturalist.
    #[serde(default)]
    pub inaturalist: Option<String>,
}

impl SpeciesEntry {
    pub fn new(name: impl Into<String>, external_id: Option<&str>) -> Self {
        Self {
            name: name.into(),
            external_id: external_id.map(str::to_string),
            ..Self::default()
        }
    }

    pub fn with_common_names(mut self, names: &[&str]) -> Self {
        self.common_names = names.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_alt_names(mut self, names: &[&str]) -> Self {
        self.alt_names = names.iter().map(|s| s.to_string()).collect();
        self
    }
}

/// Acréscimo manual: um nome popular ou uma grafia alternativa para um id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameAddition {
    pub external_id: String,
    #[serde(default)]
    pub common_name: Option<String>,
    #[serde(default)]
    pub alt_species: Option<String>,
}

/// Remoção manual: um nome popular ambíguo, ou a espécie inteira quando o
/// nome canônico coincide.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameRemoval {
    pub external_id: String,
    #[serde(default)]
    pub common_name: Option<String>,
    #[serde(default)]
    pub species_name: Option<String>,
}

/// Listas de ajuste manual do dicionário.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Overrides {
    #[serde(default)]
    pub additions: Vec<NameAddition>,
    #[serde(default)]
    pub removals: Vec<NameRemoval>,
}

/// Uma parada a excluir na curadoria, identificada pelo lead-in e pela espécie.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StopDeletion {
    #[serde(rename = "lead-in")]
    pub lead_in: String,
    #[serde(default)]
    pub species: Option<String>,
}

/// Fornece a lista de espécies, já completa, antes do pipeline começar.
pub trait SpeciesSource {
    fn species(&self) -> Result<Vec<SpeciesEntry>>;
}

/// Fornece o texto bruto do documento.
pub trait DocumentSource {
    fn document(&self) -> Result<String>;
}

impl SpeciesSource for Vec<SpeciesEntry> {
    fn species(&self) -> Result<Vec<SpeciesEntry>> {
        Ok(self.clone())
    }
}

impl DocumentSource for String {
    fn document(&self) -> Result<String> {
        Ok(self.clone())
    }
}

/// Arquivo JSON com um array de [`SpeciesEntry`].
pub struct JsonSpeciesFile {
    pub path: PathBuf,
}

impl SpeciesSource for JsonSpeciesFile {
    fn species(&self) -> Result<Vec<SpeciesEntry>> {
        read_json(&self.path)
    }
}

/// Arquivo de texto simples com o livro.
pub struct TextFile {
    pub path: PathBuf,
}

impl DocumentSource for TextFile {
    fn document(&self) -> Result<String> {
        Ok(std::fs::read_to_string(&self.path)?)
    }
}

/// Lê e desserializa um arquivo JSON.
pub fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}
