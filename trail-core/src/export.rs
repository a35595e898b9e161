//! # Exportação
//!
//! As duas tabelas CSV importadas pelo banco de dados do aplicativo (espécies e
//! paradas) e o arquivo JSONL de padrões do casador.

use std::io::Write;

use serde::Serialize;

use crate::error::Result;
use crate::rule_based::MatchRule;
use crate::species::SpeciesRecord;
use crate::stops::Stop;

const SPECIES_HEADERS: [&str; 6] = [
    "Species",
    "Common names",
    "Images",
    "Wikipedia",
    "Wikimedia Commons",
    "iNaturalist",
];
const STOP_HEADERS: [&str; 6] = ["Name", "Description", "Excerpt", "Tree species", "Tour", "Sequence"];

/// Cabeçalho escrito sempre, mesmo sem linhas.
fn writer_with_headers<W: Write>(out: W, headers: &[&str]) -> Result<csv::Writer<W>> {
    let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(out);
    writer.write_record(headers)?;
    Ok(writer)
}

#[derive(Debug, Serialize)]
struct SpeciesRow<'a> {
    #[serde(rename = "Species")]
    species: &'a str,
    #[serde(rename = "Common names")]
    common_names: String,
    #[serde(rename = "Images")]
    images: String,
    #[serde(rename = "Wikipedia")]
    wikipedia: &'a str,
    #[serde(rename = "Wikimedia Commons")]
    wikimedia_commons: &'a str,
    #[serde(rename = "iNaturalist")]
    inaturalist: &'a str,
}

#[derive(Debug, Serialize)]
struct StopRow<'a> {
    #[serde(rename = "Name")]
    name: &'a str,
    #[serde(rename = "Description")]
    description: &'a str,
    #[serde(rename = "Excerpt")]
    excerpt: &'a str,
    #[serde(rename = "Tree species")]
    tree_species: &'a str,
    #[serde(rename = "Tour")]
    tour: &'a str,
    #[serde(rename = "Sequence")]
    sequence: Option<usize>,
}

/// Escreve a tabela de espécies.
pub fn write_species_csv<W: Write>(out: W, species: &[SpeciesRecord]) -> Result<()> {
    let mut writer = writer_with_headers(out, &SPECIES_HEADERS)?;
    for record in species {
        writer.serialize(SpeciesRow {
            species: &record.name,
            common_names: record.common_names.join(", "),
            images: record.images_url().unwrap_or_default(),
            wikipedia: record.wikipedia.as_deref().unwrap_or_default(),
            wikimedia_commons: record.wikimedia_commons.as_deref().unwrap_or_default(),
            inaturalist: record.inaturalist.as_deref().unwrap_or_default(),
        })?;
    }
    writer.flush()?;
    Ok(())
}

/// Escreve a tabela de paradas, na ordem recebida.
pub fn write_stops_csv<W: Write>(out: W, stops: &[Stop]) -> Result<()> {
    let mut writer = writer_with_headers(out, &STOP_HEADERS)?;
    for stop in stops {
        writer.serialize(StopRow {
            name: &stop.title,
            description: &stop.lead_in,
            excerpt: &stop.excerpt,
            tree_species: stop.species.as_deref().unwrap_or_default(),
            tour: &stop.tour,
            sequence: stop.sequence,
        })?;
    }
    writer.flush()?;
    Ok(())
}

/// Um padrão por linha, no formato JSON das regras.
pub fn write_patterns_jsonl<W: Write>(mut out: W, rules: &[MatchRule]) -> Result<()> {
    for rule in rules {
        serde_json::to_writer(&mut out, rule)?;
        out.write_all(b"\n")?;
    }
    out.flush()?;
    Ok(())
}
