//! # Pipeline: Orquestrador com Eventos Observáveis
//!
//! Conecta os estágios em ordem fixa e emite um evento ao fim de cada um, por
//! um canal `mpsc`, para que quem chama acompanhe o progresso:
//!
//! 1. Correções de OCR no texto bruto.
//! 2. Tokenização e detecção de sentenças.
//! 3. Casamento das regras do dicionário (menções).
//! 4. Segmentação em seções e parágrafos.
//! 5. Síntese de paradas (com fusão de menções por parágrafo).
//! 6. Curadoria e numeração.
//!
//! Cada estágio recebe coleções imutáveis do anterior. O dicionário e as
//! regras são montados uma vez, na construção do pipeline.

use std::collections::HashSet;
use std::sync::mpsc;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::PipelineConfig;
use crate::curation::curate;
use crate::error::Result;
use crate::mention::Label;
use crate::rule_based::RuleEngine;
use crate::segment::segment_document;
use crate::sentence::split_sentences;
use crate::sources::{DocumentSource, Overrides, SpeciesSource, StopDeletion};
use crate::species::{DictionaryBuilder, SpeciesDictionary, SpeciesRecord};
use crate::stops::{Stop, StopSynthesizer};
use crate::tokenizer::tokenize;

/// Eventos emitidos ao fim de cada estágio.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum PipelineEvent {
    /// **Passo 1**: correções de OCR aplicadas.
    Corrected { replacements: usize },
    /// **Passo 2**: tokens e sentenças.
    TokenizationDone { tokens: usize, sentences: usize },
    /// **Passo 3**: menções por rótulo.
    MentionsFound {
        species: usize,
        alt_species: usize,
        common_names: usize,
    },
    /// **Passo 4**: seções e parágrafos.
    Segmented { sections: usize, paragraphs: usize },
    /// **Passo 5**: paradas antes da curadoria.
    StopsSynthesized { total: usize },
    /// **Passo 6**: paradas mantidas e removidas.
    Curated { kept: usize, removed: usize },
    /// **Conclusão**.
    Done { stops: usize, species: usize, processing_ms: u64 },
    /// **Falha**: erro estrutural, o pipeline parou.
    Error { message: String },
}

/// Resultado final: as duas tabelas de exportação.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineOutput {
    /// Apenas as espécies ligadas a alguma parada final, na ordem do dicionário.
    pub species: Vec<SpeciesRecord>,
    pub stops: Vec<Stop>,
}

pub struct TrailPipeline {
    dictionary: SpeciesDictionary,
    engine: RuleEngine,
    config: PipelineConfig,
}

impl TrailPipeline {
    /// Monta as regras a partir de um dicionário já construído.
    pub fn new(dictionary: SpeciesDictionary, config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        let engine = RuleEngine::from_dictionary(&dictionary);
        info!(species = dictionary.len(), rules = engine.len(), "pipeline pronto");
        Ok(Self {
            dictionary,
            engine,
            config,
        })
    }

    /// Constrói o dicionário a partir de uma fonte de espécies e das listas manuais.
    pub fn from_sources<S: SpeciesSource>(source: &S, overrides: Overrides, config: PipelineConfig) -> Result<Self> {
        let dictionary = DictionaryBuilder::new(source.species()?)
            .with_overrides(overrides)
            .build();
        Self::new(dictionary, config)
    }

    pub fn dictionary(&self) -> &SpeciesDictionary {
        &self.dictionary
    }

    pub fn engine(&self) -> &RuleEngine {
        &self.engine
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Processa o documento de forma síncrona, descartando os eventos.
    pub fn run(&self, document: &str, deletions: &[StopDeletion]) -> Result<PipelineOutput> {
        let (tx, _rx) = mpsc::channel();
        self.run_streaming(document, deletions, &tx)
    }

    pub fn run_source<D: DocumentSource>(&self, source: &D, deletions: &[StopDeletion]) -> Result<PipelineOutput> {
        self.run(&source.document()?, deletions)
    }

    /// Processa o documento enviando um [`PipelineEvent`] por estágio.
    ///
    /// Um erro estrutural emite `Error` e é devolvido ao chamador.
    pub fn run_streaming(
        &self,
        document: &str,
        deletions: &[StopDeletion],
        tx: &mpsc::Sender<PipelineEvent>,
    ) -> Result<PipelineOutput> {
        let result = self.stages(document, deletions, tx);
        if let Err(e) = &result {
            let _ = tx.send(PipelineEvent::Error { message: e.to_string() });
        }
        result
    }

    fn stages(
        &self,
        document: &str,
        deletions: &[StopDeletion],
        tx: &mpsc::Sender<PipelineEvent>,
    ) -> Result<PipelineOutput> {
        let start = std::time::Instant::now();

        // === Passo 1: Correções ===
        let replacements: usize = self
            .config
            .corrections
            .iter()
            .map(|c| document.matches(c.find.as_str()).count())
            .sum();
        let text = self.config.correct(document);
        let _ = tx.send(PipelineEvent::Corrected { replacements });

        // === Passo 2: Tokenização e sentenças ===
        let tokens = tokenize(&text);
        let sentences = split_sentences(&text, &tokens);
        info!(tokens = tokens.len(), sentences = sentences.len(), "texto tokenizado");
        let _ = tx.send(PipelineEvent::TokenizationDone {
            tokens: tokens.len(),
            sentences: sentences.len(),
        });

        // === Passo 3: Menções ===
        let mentions = self.engine.apply(&text, &tokens);
        let count = |label: Label| mentions.iter().filter(|m| m.label == label).count();
        let found = PipelineEvent::MentionsFound {
            species: count(Label::Species),
            alt_species: count(Label::AltSpecies),
            common_names: count(Label::CommonName),
        };
        info!(mentions = mentions.len(), "menções encontradas");
        let _ = tx.send(found);

        // === Passo 4: Segmentação ===
        let sections = segment_document(&sentences, &mentions, &self.config.layout)?;
        let paragraphs: usize = sections.iter().map(|s| s.paragraphs.len()).sum();
        info!(sections = sections.len(), paragraphs, "documento segmentado");
        let _ = tx.send(PipelineEvent::Segmented {
            sections: sections.len(),
            paragraphs,
        });

        // === Passo 5: Paradas ===
        let stops = StopSynthesizer::new(&text, &self.dictionary, &self.config).synthesize(&sections)?;
        let total = stops.len();
        info!(stops = total, "paradas sintetizadas");
        let _ = tx.send(PipelineEvent::StopsSynthesized { total });

        // === Passo 6: Curadoria ===
        let stops = curate(stops, deletions);
        let _ = tx.send(PipelineEvent::Curated {
            kept: stops.len(),
            removed: total - stops.len(),
        });

        let species = self.referenced_species(&stops);
        let _ = tx.send(PipelineEvent::Done {
            stops: stops.len(),
            species: species.len(),
            processing_ms: start.elapsed().as_millis() as u64,
        });
        Ok(PipelineOutput { species, stops })
    }

    fn referenced_species(&self, stops: &[Stop]) -> Vec<SpeciesRecord> {
        let ids: HashSet<&str> = stops.iter().filter_map(|s| s.species_id.as_deref()).collect();
        self.dictionary
            .records()
            .iter()
            .filter(|r| ids.contains(r.id.as_str()))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TrailError;
    use crate::merge::merge_mentions;
    use crate::sources::SpeciesEntry;
    use crate::text::strip_markup;

    const E2E_DOCUMENT: &str = "TOUR 1\n\nThe white oak stands tall. Quercus alba is common.";

    fn pipeline(entries: Vec<SpeciesEntry>) -> TrailPipeline {
        TrailPipeline::from_sources(&entries, Overrides::default(), PipelineConfig::default()).unwrap()
    }

    fn oak_pipeline() -> TrailPipeline {
        pipeline(vec![SpeciesEntry::new("Quercus alba", Some("Q1")).with_common_names(&["White oak"])])
    }

    #[test]
    fn test_end_to_end_scenario() {
        let output = oak_pipeline().run(E2E_DOCUMENT, &[]).unwrap();
        let stops = &output.stops;
        assert_eq!(stops.len(), 2);
        assert_eq!(stops[0].title, "TOUR 1");
        assert_eq!(stops[0].sequence, Some(1));

        let oak = &stops[1];
        assert_eq!(oak.title, "White oak (Quercus alba)");
        assert_eq!(oak.tour, "TOUR 1");
        assert_eq!(oak.sequence, Some(2));
        assert_eq!(
            oak.excerpt,
            "The <i style=\"color: rgb(156, 39, 176);\">white oak</i> stands tall. \
<b><i style=\"color: rgb(156, 39, 176);\">Quercus alba</i></b> is common."
        );
        assert_eq!(output.species.len(), 1);
        assert_eq!(output.species[0].id, "Q1");
    }

    #[test]
    fn test_two_groups_replicate_paragraph() {
        let p = pipeline(vec![
            SpeciesEntry::new("Quercus alba", Some("Q1")).with_common_names(&["White oak"]),
            SpeciesEntry::new("Acer rubrum", Some("Q2")).with_common_names(&["Red maple"]),
        ]);
        let doc = "TOUR 1\n\nNear Quercus alba grows Acer rubrum.";
        let stops = p.run(doc, &[]).unwrap().stops;
        assert_eq!(stops.len(), 3);
        let (a, b) = (&stops[1], &stops[2]);
        assert_eq!(a.species.as_deref(), Some("Quercus alba"));
        assert_eq!(b.species.as_deref(), Some("Acer rubrum"));
        assert_eq!(a.lead_in, b.lead_in);
        assert_eq!(strip_markup(&a.excerpt), strip_markup(&b.excerpt));
    }

    #[test]
    fn test_no_entity_paragraph_extends_previous() {
        let p = oak_pipeline();
        let base = p.run(E2E_DOCUMENT, &[]).unwrap().stops;
        let extended = p
            .run(&format!("{E2E_DOCUMENT}\n\nFollow the path to the lake."), &[])
            .unwrap()
            .stops;
        assert_eq!(base.len(), extended.len());
        assert!(extended[1].excerpt.len() > base[1].excerpt.len());
        assert!(extended[1].excerpt.ends_with("\n\nFollow the path to the lake."));
    }

    #[test]
    fn test_possessive_mentions_make_stops() {
        let p = oak_pipeline();
        for doc in ["TOUR 1\n\nThe white oak's bark is pale.", "TOUR 1\n\nQuercus alba\u{2019}s bark is pale."] {
            let stops = p.run(doc, &[]).unwrap().stops;
            assert_eq!(stops.len(), 2, "{doc}");
            assert_eq!(stops[1].species.as_deref(), Some("Quercus alba"));
        }
        let stops = p.run("TOUR 1\n\nThe white oak's bark is pale.", &[]).unwrap().stops;
        assert_eq!(stops[1].title, "White oak (Quercus alba)");
        assert!(stops[1].excerpt.contains("white oak</i>'s bark"));
    }

    #[test]
    fn test_alternate_spelling_opens_group() {
        let p = pipeline(vec![
            SpeciesEntry::new("Platanus hispanica", Some("Q8")).with_alt_names(&["Platanus acerifolia"])
        ]);
        let doc = "TOUR 2\n\nThe P. acerifolia lines the drive.";

        let mentions = p.engine().apply(doc, &tokenize(doc));
        assert_eq!(mentions.len(), 1);
        assert_eq!(mentions[0].label, Label::AltSpecies);
        assert_eq!(mentions[0].text, "P. acerifolia");
        let groups = merge_mentions(&mentions, p.dictionary());
        assert_eq!(groups.keys().collect::<Vec<_>>(), vec!["Q8"]);

        let output = p.run(doc, &[]).unwrap();
        let stop = &output.stops[1];
        assert_eq!(stop.title, "Platanus hispanica");
        assert_eq!(stop.species.as_deref(), Some("Platanus hispanica"));
        assert_eq!(stop.tour, "TOUR 2");
        assert!(stop
            .excerpt
            .contains("<b><i style=\"color: rgb(156, 39, 176);\">P. acerifolia</i></b>"));
        assert_eq!(output.species[0].id, "Q8");
    }

    #[test]
    fn test_curation_round_trip() {
        let p = oak_pipeline();
        let stops = p.run(E2E_DOCUMENT, &[]).unwrap().stops;
        let target = stops[1].clone();
        let deletions = vec![StopDeletion {
            lead_in: target.lead_in.clone(),
            species: target.species.clone(),
        }];

        let output = p.run(E2E_DOCUMENT, &deletions).unwrap();
        assert!(output.stops.iter().all(|s| s.lead_in != target.lead_in));
        assert!(output.stops[0].excerpt.contains(&strip_markup(&target.excerpt)));
        assert!(output.species.is_empty());
    }

    #[test]
    fn test_corrections_applied_before_matching() {
        let p = pipeline(vec![SpeciesEntry::new("Cornus florida", Some("Q5"))]);
        let stops = p.run("TOUR 1\n\nA fine Comus florida.", &[]).unwrap().stops;
        assert_eq!(stops[1].title, "Cornus florida");
    }

    #[test]
    fn test_structural_error_is_fatal() {
        let err = oak_pipeline().run("No tours here.", &[]).unwrap_err();
        assert!(matches!(err, TrailError::Structural(_)));
        assert!(err.is_fatal());
    }

    #[test]
    fn test_events_streaming() {
        let p = oak_pipeline();
        let (tx, rx) = mpsc::channel();
        p.run_streaming(E2E_DOCUMENT, &[], &tx).unwrap();
        drop(tx);
        let events: Vec<PipelineEvent> = rx.iter().collect();
        assert_eq!(events.len(), 7);
        assert!(matches!(events[0], PipelineEvent::Corrected { replacements: 0 }));
        assert!(matches!(
            events[2],
            PipelineEvent::MentionsFound { species: 1, alt_species: 0, common_names: 1 }
        ));
        assert!(matches!(events[6], PipelineEvent::Done { stops: 2, species: 1, .. }));
    }

    #[test]
    fn test_error_event_on_failure() {
        let (tx, rx) = mpsc::channel();
        assert!(oak_pipeline().run_streaming("Nothing.", &[], &tx).is_err());
        drop(tx);
        let last = rx.iter().last();
        assert!(matches!(last, Some(PipelineEvent::Error { .. })));
    }
}
