//! # Dicionário de Espécies
//!
//! Transforma a lista bruta de espécies (vinda da Wikipedia/Wikidata) em um
//! conjunto congelado de [`SpeciesRecord`], cada um com um id estável.
//!
//! ## Etapas de `DictionaryBuilder::build`
//!
//! 1. Remove entradas duplicadas (igualdade de todos os campos).
//! 2. Descarta entradas sem nome ou com id externo em branco.
//! 3. Atribui ids: o id externo, ou um id local `x1`, `x2`, ... que nunca
//!    colide com ids externos.
//! 4. Aplica os acréscimos manuais e só depois as remoções manuais.
//! 5. Normaliza nomes populares ("Title Case", sem repetição).
//!
//! Depois de construído, o dicionário é imutável e todo o resto do pipeline
//! se refere às espécies apenas pelo id.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::sources::{NameAddition, NameRemoval, Overrides, SpeciesEntry};
use crate::text::title_case;

const MISSING_PAGE_SUFFIX: &str = " (page does not exist)";
const WIKIPEDIA_BASE: &str = "https://en.wikipedia.org";
const COMMONS_BASE: &str = "https://commons.wikimedia.org/wiki/";
const INATURALIST_BASE: &str = "https://inaturalist.org/taxa/";

/// Uma espécie pronta para casamento e exportação.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpeciesRecord {
    pub id: String,
    /// Nome científico canônico.
    pub name: String,
    pub common_names: Vec<String>,
    pub alt_names: Vec<String>,
    pub wikipedia: Option<String>,
    pub wikimedia_commons: Option<String>,
    pub inaturalist: Option<String>,
}

impl SpeciesRecord {
    /// Galeria de fotos do iNaturalist.
    pub fn images_url(&self) -> Option<String> {
        self.inaturalist.as_ref().map(|url| format!("{url}/browse_photos"))
    }
}

/// Conjunto congelado de espécies, indexado por id.
#[derive(Debug, Clone, Default)]
pub struct SpeciesDictionary {
    records: Vec<SpeciesRecord>,
    index: HashMap<String, usize>,
}

impl SpeciesDictionary {
    fn from_records(records: Vec<SpeciesRecord>) -> Self {
        let index = records
            .iter()
            .enumerate()
            .map(|(i, r)| (r.id.clone(), i))
            .collect();
        Self { records, index }
    }

    pub fn get(&self, id: &str) -> Option<&SpeciesRecord> {
        self.index.get(id).map(|&i| &self.records[i])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Nome canônico de uma espécie, se o id existir.
    pub fn name_of(&self, id: &str) -> Option<&str> {
        self.get(id).map(|r| r.name.as_str())
    }

    /// Nomes populares de uma espécie (vazio para ids desconhecidos).
    pub fn common_names(&self, id: &str) -> &[String] {
        self.get(id).map(|r| r.common_names.as_slice()).unwrap_or(&[])
    }

    /// Registros na ordem de entrada.
    pub fn records(&self) -> &[SpeciesRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Construtor do dicionário a partir das entradas brutas e das listas manuais.
#[derive(Debug, Clone, Default)]
pub struct DictionaryBuilder {
    entries: Vec<SpeciesEntry>,
    additions: Vec<NameAddition>,
    removals: Vec<NameRemoval>,
}

impl DictionaryBuilder {
    pub fn new(entries: Vec<SpeciesEntry>) -> Self {
        Self {
            entries,
            ..Self::default()
        }
    }

    pub fn with_overrides(mut self, overrides: Overrides) -> Self {
        self.additions.extend(overrides.additions);
        self.removals.extend(overrides.removals);
        self
    }

    pub fn build(self) -> SpeciesDictionary {
        let mut seen = HashSet::new();
        let entries: Vec<SpeciesEntry> = self
            .entries
            .into_iter()
            .filter(|e| seen.insert(e.clone()))
            .collect();

        let external_ids: HashSet<String> = entries
            .iter()
            .filter_map(|e| e.external_id.as_ref())
            .map(|id| id.trim().to_string())
            .collect();

        let mut records: Vec<SpeciesRecord> = Vec::new();
        let mut by_id: HashMap<String, usize> = HashMap::new();
        let mut next_local = 1usize;

        for entry in entries {
            let Some(mut record) = normalize_entry(entry) else { continue };

            if record.id.is_empty() {
                loop {
                    let candidate = format!("x{next_local}");
                    next_local += 1;
                    if !external_ids.contains(&candidate) {
                        record.id = candidate;
                        break;
                    }
                }
            }

            let existing_index = by_id.get(&record.id).copied();
            match existing_index {
                Some(i) => {
                    debug!(id = %record.id, "entradas com o mesmo id foram unidas");
                    let existing = &mut records[i];
                    existing.common_names.extend(record.common_names);
                    existing.alt_names.extend(record.alt_names);
                    existing.wikipedia = existing.wikipedia.take().or(record.wikipedia);
                    existing.wikimedia_commons = existing.wikimedia_commons.take().or(record.wikimedia_commons);
                    existing.inaturalist = existing.inaturalist.take().or(record.inaturalist);
                }
                None => {
                    by_id.insert(record.id.clone(), records.len());
                    records.push(record);
                }
            }
        }

        for addition in &self.additions {
            let Some(&i) = by_id.get(addition.external_id.trim()) else {
                warn!(id = %addition.external_id, "acréscimo para id inexistente ignorado");
                continue;
            };
            let record = &mut records[i];
            if let Some(name) = non_blank(addition.common_name.as_deref()) {
                record.common_names.push(name.to_string());
            }
            if let Some(alt) = non_blank(addition.alt_species.as_deref()) {
                record.alt_names.push(alt.to_string());
            }
        }

        let mut dropped: HashSet<String> = HashSet::new();
        for removal in &self.removals {
            let Some(&i) = by_id.get(removal.external_id.trim()) else {
                warn!(id = %removal.external_id, "remoção para id inexistente ignorada");
                continue;
            };
            let record = &mut records[i];
            if let Some(name) = non_blank(removal.common_name.as_deref()) {
                let target = title_case(name);
                record.common_names.retain(|c| title_case(c) != target);
            }
            if let Some(species) = non_blank(removal.species_name.as_deref()) {
                if record.name == species {
                    dropped.insert(record.id.clone());
                }
            }
        }
        records.retain(|r| !dropped.contains(&r.id));

        for record in &mut records {
            record.common_names = dedup(record.common_names.iter().map(|c| title_case(c.trim())));
            record.alt_names = dedup(record.alt_names.iter().map(|a| a.trim().to_string()));
        }

        SpeciesDictionary::from_records(records)
    }
}

/// Limpa uma entrada. `None` quando ela deve ser descartada.
/// O id fica vazio quando não há id externo (preenchido depois).
fn normalize_entry(entry: SpeciesEntry) -> Option<SpeciesRecord> {
    let mut name = entry.name.trim().to_string();
    let mut wikipedia = entry.wikipedia;
    if let Some(stripped) = name.strip_suffix(MISSING_PAGE_SUFFIX) {
        name = stripped.trim().to_string();
        wikipedia = None;
    }

    if name.is_empty() {
        warn!(external_id = ?entry.external_id, "espécie sem nome descartada");
        return None;
    }

    let id = match entry.external_id {
        Some(id) if id.trim().is_empty() => {
            warn!(%name, "espécie com id externo em branco descartada");
            return None;
        }
        Some(id) => id.trim().to_string(),
        None => String::new(),
    };

    Some(SpeciesRecord {
        id,
        name,
        common_names: entry.common_names,
        alt_names: entry.alt_names,
        wikipedia: wikipedia.as_deref().and_then(|w| non_blank(Some(w))).map(wikipedia_url),
        wikimedia_commons: entry.wikimedia_commons.as_deref().and_then(|c| non_blank(Some(c))).map(commons_url),
        inaturalist: entry.inaturalist.as_deref().and_then(|n| non_blank(Some(n))).map(inaturalist_url),
    })
}

fn wikipedia_url(link: &str) -> String {
    if link.starts_with("http") {
        link.to_string()
    } else if link.starts_with('/') {
        format!("{WIKIPEDIA_BASE}{link}")
    } else {
        format!("{WIKIPEDIA_BASE}/wiki/{link}")
    }
}

fn commons_url(page: &str) -> String {
    if page.starts_with("http") {
        page.to_string()
    } else {
        format!("{COMMONS_BASE}{page}")
    }
}

fn inaturalist_url(taxon: &str) -> String {
    if taxon.chars().all(|c| c.is_ascii_digit()) {
        format!("{INATURALIST_BASE}{taxon}")
    } else {
        taxon.to_string()
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn dedup(names: impl Iterator<Item = String>) -> Vec<String> {
    let mut seen = HashSet::new();
    names.filter(|n| !n.is_empty() && seen.insert(n.clone())).collect()
}
