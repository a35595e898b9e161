//! # Segmentação em Seções e Parágrafos
//!
//! O livro tem uma forma fixa: matéria inicial (introdução), os tours e a
//! matéria final (nota de rodapé e nota sobre o autor). As seções começam em
//! sentenças que contêm um marcador ("TOUR" ou "FOOTNOTE"), e a própria
//! sentença marcadora abre a seção.
//!
//! Dentro de cada seção, um parágrafo começa em toda sentença iniciada por
//! `"\n\n"`. Os parágrafos de uma seção são contíguos, não se sobrepõem e
//! cobrem cada sentença exatamente uma vez.
//!
//! A quantidade de tours e a obrigatoriedade da matéria final vêm de
//! [`SectionLayout`], para que documentos sintéticos de outras formas também
//! possam ser segmentados.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, TrailError};
use crate::mention::Mention;
use crate::sentence::Sentence;
use crate::text::join_sentences;

/// Marcadores e forma esperada do documento.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SectionLayout {
    pub tour_marker: String,
    pub back_matter_marker: String,
    /// Número exato de tours, quando conhecido.
    pub expected_tours: Option<usize>,
    pub require_back_matter: bool,
}

impl Default for SectionLayout {
    fn default() -> Self {
        Self {
            tour_marker: "TOUR".to_string(),
            back_matter_marker: "FOOTNOTE".to_string(),
            expected_tours: None,
            require_back_matter: false,
        }
    }
}

impl SectionLayout {
    /// Forma do livro de 1968: introdução, quatro tours e matéria final.
    pub fn tree_trails() -> Self {
        Self {
            expected_tours: Some(4),
            require_back_matter: true,
            ..Self::default()
        }
    }

    fn is_marker(&self, sentence: &Sentence) -> bool {
        sentence.text.contains(&self.tour_marker) || sentence.text.contains(&self.back_matter_marker)
    }
}

/// Papel de uma seção no livro.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SectionKind {
    FrontMatter,
    /// Tour numerado a partir de 1.
    Tour(usize),
    BackMatter,
}

/// Sequência de sentenças consecutivas, com as menções que começam dentro dela.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paragraph {
    /// Número do parágrafo no documento inteiro. Identifica a origem das paradas.
    pub origin: usize,
    pub sentences: Vec<Sentence>,
    pub start: usize,
    pub end: usize,
    pub mentions: Vec<Mention>,
}

impl Paragraph {
    /// Texto das sentenças unidas por espaço.
    pub fn joined_text(&self) -> String {
        join_sentences(self.sentences.iter().map(|s| s.text.as_str()))
    }

    /// Anexa as menções cujo início cai em `[start, end)`.
    pub fn attach_mentions(&mut self, mentions: &[Mention]) {
        self.mentions = mentions
            .iter()
            .filter(|m| m.start().is_some_and(|s| s >= self.start && s < self.end))
            .cloned()
            .collect();
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    pub kind: SectionKind,
    pub paragraphs: Vec<Paragraph>,
}

impl Section {
    pub fn start(&self) -> Option<usize> {
        self.paragraphs.first().map(|p| p.start)
    }

    pub fn end(&self) -> Option<usize> {
        self.paragraphs.last().map(|p| p.end)
    }

    pub fn is_empty(&self) -> bool {
        self.paragraphs.is_empty()
    }
}

/// Divide as sentenças em seções nos marcadores. A primeira seção (matéria
/// inicial) sempre existe, mesmo vazia.
pub fn split_sections(sentences: &[Sentence], layout: &SectionLayout) -> Vec<Vec<Sentence>> {
    let mut sections = Vec::new();
    let mut current = Vec::new();
    for sentence in sentences {
        if layout.is_marker(sentence) {
            sections.push(std::mem::take(&mut current));
        }
        current.push(sentence.clone());
    }
    sections.push(current);
    sections
}

/// Agrupa as sentenças de uma seção em parágrafos. `next_origin` numera os
/// parágrafos ao longo do documento.
pub fn split_paragraphs(sentences: &[Sentence], next_origin: &mut usize) -> Vec<Paragraph> {
    let mut groups: Vec<Vec<Sentence>> = Vec::new();
    let mut current: Vec<Sentence> = Vec::new();
    for sentence in sentences {
        if sentence.text.starts_with("\n\n") && !current.is_empty() {
            groups.push(std::mem::take(&mut current));
        }
        current.push(sentence.clone());
    }
    if !current.is_empty() {
        groups.push(current);
    }

    groups
        .into_iter()
        .filter_map(|sentences| {
            let start = sentences.first()?.start;
            let end = sentences.last()?.end;
            let origin = *next_origin;
            *next_origin += 1;
            Some(Paragraph {
                origin,
                sentences,
                start,
                end,
                mentions: Vec::new(),
            })
        })
        .collect()
}

/// Segmenta o documento inteiro e distribui as menções pelos parágrafos.
///
/// Falha (erro estrutural) quando não há tour, quando a contagem de tours
/// difere da esperada ou quando a matéria final falta ou não é a última seção.
pub fn segment_document(
    sentences: &[Sentence],
    mentions: &[Mention],
    layout: &SectionLayout,
) -> Result<Vec<Section>> {
    let raw_sections = split_sections(sentences, layout);
    let mut next_origin = 0;
    let mut sections = Vec::with_capacity(raw_sections.len());
    let mut tours = 0;
    let mut back_matter_seen = false;

    for (i, raw) in raw_sections.iter().enumerate() {
        let kind = if i == 0 {
            SectionKind::FrontMatter
        } else if back_matter_seen {
            return Err(TrailError::structural(format!(
                "seção após a matéria final (\"{}\")",
                raw.first().map(|s| s.text.trim()).unwrap_or_default()
            )));
        } else if raw[0].text.contains(&layout.tour_marker) {
            tours += 1;
            SectionKind::Tour(tours)
        } else {
            back_matter_seen = true;
            SectionKind::BackMatter
        };

        let mut paragraphs = split_paragraphs(raw, &mut next_origin);
        for paragraph in &mut paragraphs {
            paragraph.attach_mentions(mentions);
        }
        debug!(?kind, paragraphs = paragraphs.len(), "seção segmentada");
        sections.push(Section { kind, paragraphs });
    }

    if tours == 0 {
        return Err(TrailError::structural(format!(
            "nenhuma sentença com o marcador \"{}\"",
            layout.tour_marker
        )));
    }
    if let Some(expected) = layout.expected_tours {
        if tours != expected {
            return Err(TrailError::structural(format!(
                "esperados {expected} tours, encontrados {tours}"
            )));
        }
    }
    if layout.require_back_matter && !back_matter_seen {
        return Err(TrailError::structural(format!(
            "nenhuma sentença com o marcador \"{}\"",
            layout.back_matter_marker
        )));
    }

    Ok(sections)
}
