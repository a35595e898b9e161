//! # Síntese de Paradas
//!
//! Transforma parágrafos segmentados em paradas ("stops") de tour, o registro
//! que vai para o banco de dados do aplicativo.
//!
//! ## Regras por parágrafo de tour
//!
//! - **Sem entidades, sem marcador**: o texto é anexado ao excerto da parada
//!   anterior e de todas as paradas vizinhas da mesma origem.
//! - **Sem entidades, com marcador**: vira a parada de cabeçalho "TOUR n". O
//!   texto antes do marcador vai para as paradas anteriores.
//! - **Com entidades**: uma parada por grupo, em ordem de primeira menção,
//!   todas com o mesmo texto e lead-in.
//!
//! A matéria inicial e a final não passam pela fusão: são recortadas por
//! marcadores fixos em quatro paradas (matéria inicial, introdução, nota de
//! rodapé e nota sobre o autor).

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::{Formatting, PipelineConfig};
use crate::error::{Result, TrailError};
use crate::mention::{Label, Mention};
use crate::merge::{merge_mentions, ordered_groups};
use crate::segment::{Paragraph, Section, SectionKind};
use crate::species::SpeciesDictionary;
use crate::text::{capitalize, line_breaks, truncate_chars};

const INTRODUCTION_TOUR: &str = "Introduction";
const BACK_MATTER_TOUR: &str = "Back matter";

/// Um registro exportável de tour.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stop {
    pub title: String,
    pub lead_in: String,
    pub excerpt: String,
    pub tour: String,
    pub species_id: Option<String>,
    /// Nome canônico da espécie ligada.
    pub species: Option<String>,
    /// Parágrafo de origem. Paradas replicadas do mesmo parágrafo compartilham o valor.
    pub origin: Option<usize>,
    /// Posição final, atribuída pela curadoria.
    pub sequence: Option<usize>,
}

impl Stop {
    fn fixed(title: &str, lead_in: String, excerpt: String, tour: &str) -> Self {
        Self {
            title: title.to_string(),
            lead_in,
            excerpt,
            tour: tour.to_string(),
            species_id: None,
            species: None,
            origin: None,
            sequence: None,
        }
    }
}

/// Marcação de texto rico para o excerto.
#[derive(Debug, Clone)]
pub struct Markup {
    formatting: Formatting,
    rgb: Option<String>,
}

impl Markup {
    pub fn new(formatting: Formatting, rgb: Option<String>) -> Self {
        Self { formatting, rgb }
    }

    pub fn bold(&self, text: &str) -> String {
        match self.formatting {
            Formatting::Memento => format!("<b>{text}</b>"),
            Formatting::Plain => text.to_string(),
        }
    }

    pub fn italic(&self, text: &str) -> String {
        match (self.formatting, &self.rgb) {
            (Formatting::Plain, _) => text.to_string(),
            (Formatting::Memento, Some(rgb)) => format!("<i style=\"color: rgb({rgb});\">{text}</i>"),
            (Formatting::Memento, None) => format!("<i>{text}</i>"),
        }
    }

    /// Realça cada texto distinto do grupo por substituição de string inteira.
    ///
    /// Um texto contido em outro já realçado é envolvido de novo (ex: "oak"
    /// dentro de "white oak"). O comportamento é mantido.
    pub fn highlight(&self, text: &str, mentions: &[Mention]) -> String {
        let mut by_label: Vec<(Label, Vec<&str>)> = Vec::new();
        for mention in mentions {
            match by_label.iter_mut().find(|(label, _)| *label == mention.label) {
                Some((_, texts)) => {
                    if !texts.contains(&mention.text.as_str()) {
                        texts.push(&mention.text);
                    }
                }
                None => by_label.push((mention.label, vec![&mention.text])),
            }
        }

        let mut out = text.to_string();
        for (label, texts) in by_label {
            for t in texts {
                let wrapped = if label.is_taxon() {
                    self.bold(&self.italic(t))
                } else {
                    self.italic(t)
                };
                out = out.replace(t, &wrapped);
            }
        }
        out
    }
}

/// Nome popular como aparece no título: uma linha só, primeira letra maiúscula.
fn title_text(text: &str) -> String {
    capitalize(&text.split_whitespace().collect::<Vec<_>>().join(" "))
}

/// Anexa um parágrafo sem entidades à última parada e às paradas anteriores
/// da mesma origem. Retorna quantas paradas foram alteradas.
pub fn append_to_previous(stops: &mut [Stop], text: &str) -> usize {
    let Some(last) = stops.last() else {
        return 0;
    };
    let origin = last.origin;
    let addition = format!("\n\n{text}");

    let mut touched = 0;
    for stop in stops.iter_mut().rev() {
        if touched > 0 && (origin.is_none() || stop.origin != origin) {
            break;
        }
        stop.excerpt = line_breaks(&format!("{}{addition}", stop.excerpt));
        touched += 1;
    }
    touched
}

/// Primeira sentença, sem quebras de linha, cortada em `n` caracteres, com reticências.
pub fn lead_in(paragraph: &Paragraph, n: usize) -> String {
    let first = paragraph
        .sentences
        .first()
        .map(|s| s.text.replace('\n', " "))
        .unwrap_or_default();
    format!("{}...", truncate_chars(first.trim(), n))
}

/// Gera as paradas de todas as seções, em ordem de documento.
pub struct StopSynthesizer<'a> {
    document: &'a str,
    dictionary: &'a SpeciesDictionary,
    config: &'a PipelineConfig,
    markup: Markup,
}

impl<'a> StopSynthesizer<'a> {
    pub fn new(document: &'a str, dictionary: &'a SpeciesDictionary, config: &'a PipelineConfig) -> Self {
        Self {
            document,
            dictionary,
            config,
            markup: Markup::new(config.formatting, config.highlight_rgb.clone()),
        }
    }

    pub fn synthesize(&self, sections: &[Section]) -> Result<Vec<Stop>> {
        let mut stops = Vec::new();
        for section in sections {
            match section.kind {
                SectionKind::FrontMatter => self.front_matter(section, &mut stops),
                SectionKind::Tour(n) => self.tour(n, section, &mut stops),
                SectionKind::BackMatter => self.back_matter(section, &mut stops)?,
            }
        }
        Ok(stops)
    }

    /// Texto do documento coberto pela seção.
    fn section_text(&self, section: &Section) -> &'a str {
        match (section.start(), section.end()) {
            (Some(start), Some(end)) => self.document.get(start..end).unwrap_or_default(),
            _ => "",
        }
    }

    fn front_matter(&self, section: &Section, stops: &mut Vec<Stop>) {
        let text = self.section_text(section);
        if text.trim().is_empty() {
            return;
        }
        let markers = &self.config.fixed;

        let front = match text.find(&markers.title) {
            Some(i) => &text[i..],
            None => text,
        };
        let front = match front.find(&markers.contents) {
            Some(i) => &front[..i],
            None => front,
        };
        let front = line_breaks(front);
        if !front.trim().is_empty() {
            let lead_in = format!("{}...", truncate_chars(&front, self.config.front_matter_lead_in_chars));
            stops.push(Stop::fixed("Front Matter", lead_in, front, INTRODUCTION_TOUR));
        }

        let intro = match text.rfind(&markers.introduction) {
            Some(i) => &text[i + markers.introduction.len()..],
            None => text,
        };
        let intro = line_breaks(intro);
        if !intro.trim().is_empty() {
            let lead_in = format!("{}...", truncate_chars(&intro, self.config.lead_in_chars));
            stops.push(Stop::fixed("INTRODUCTION", lead_in, intro, INTRODUCTION_TOUR));
        }
    }

    fn tour(&self, n: usize, section: &Section, stops: &mut Vec<Stop>) {
        let label = format!("{} {n}", self.config.layout.tour_marker);
        for paragraph in &section.paragraphs {
            let groups = merge_mentions(&paragraph.mentions, self.dictionary);
            if groups.is_empty() {
                self.no_entity_paragraph(&label, paragraph, stops);
                continue;
            }
            for (id, mentions) in ordered_groups(&groups) {
                match self.entity_stop(paragraph, id, mentions, &label) {
                    Ok(stop) => stops.push(stop),
                    Err(e) => warn!(origin = paragraph.origin, id, error = %e, "parada ignorada"),
                }
            }
        }
    }

    fn no_entity_paragraph(&self, label: &str, paragraph: &Paragraph, stops: &mut Vec<Stop>) {
        let text = paragraph.joined_text();
        let marker = &self.config.layout.tour_marker;
        let Some(at) = text.find(marker.as_str()) else {
            if append_to_previous(stops, &text) == 0 {
                warn!(origin = paragraph.origin, "parágrafo sem entidades e sem parada anterior");
            }
            return;
        };

        let prefix = &text[..at];
        if !prefix.trim().is_empty() && append_to_previous(stops, prefix) == 0 {
            warn!(origin = paragraph.origin, "texto antes do marcador sem parada anterior");
        }
        let rest = &text[at..];
        debug!(origin = paragraph.origin, tour = label, "cabeçalho de tour");
        stops.push(Stop {
            title: label.to_string(),
            lead_in: line_breaks(&format!("{}...", truncate_chars(rest, self.config.lead_in_chars))),
            excerpt: line_breaks(rest),
            tour: label.to_string(),
            species_id: None,
            species: None,
            origin: Some(paragraph.origin),
            sequence: None,
        });
    }

    /// Monta a parada de um grupo de entidades. Sem nome popular nem espécie
    /// conhecida, o título fica indefinido e a parada é rejeitada.
    pub fn entity_stop(&self, paragraph: &Paragraph, id: &str, mentions: &[Mention], tour: &str) -> Result<Stop> {
        let species = self.dictionary.name_of(id);
        let first_common = mentions
            .iter()
            .filter(|m| m.label == Label::CommonName)
            .min_by_key(|m| m.start());

        let title = match (first_common, species) {
            (Some(common), Some(name)) => format!("{} ({})", title_text(&common.text), capitalize(name)),
            (Some(common), None) => title_text(&common.text),
            (None, Some(name)) => capitalize(name),
            (None, None) => {
                return Err(TrailError::data_quality(format!(
                    "sem título para o grupo {id} no parágrafo {}",
                    paragraph.origin
                )))
            }
        };

        let excerpt = line_breaks(&paragraph.joined_text());
        Ok(Stop {
            title,
            lead_in: lead_in(paragraph, self.config.lead_in_chars),
            excerpt: self.markup.highlight(&excerpt, mentions),
            tour: tour.to_string(),
            species_id: species.map(|_| id.to_string()),
            species: species.map(str::to_string),
            origin: Some(paragraph.origin),
            sequence: None,
        })
    }

    fn back_matter(&self, section: &Section, stops: &mut Vec<Stop>) -> Result<()> {
        let text = self.section_text(section);
        if text.trim().is_empty() {
            return Ok(());
        }
        let markers = &self.config.fixed;

        let footnote_at = text.find(&markers.footnote).unwrap_or(0);
        let author_at = text[footnote_at..]
            .find(&markers.author)
            .map(|i| footnote_at + i)
            .ok_or_else(|| {
                TrailError::structural(format!("matéria final sem o marcador \"{}\"", markers.author))
            })?;

        let prefix = &text[..footnote_at];
        if !prefix.trim().is_empty() {
            append_to_previous(stops, prefix);
        }

        let footnote = line_breaks(&text[footnote_at..author_at]);
        let lead_in = format!("{}...", truncate_chars(&footnote, self.config.lead_in_chars));
        stops.push(Stop::fixed("FOOTNOTE TO TREE TRAILS", lead_in, footnote, BACK_MATTER_TOUR));

        let author = line_breaks(&text[author_at..]);
        let lead_in = format!("{}...", truncate_chars(&author, self.config.lead_in_chars));
        let excerpt = line_breaks(&author.replace(&markers.page_trailer, ""));
        stops.push(Stop::fixed("A WORD ABOUT THE AUTHOR", lead_in, excerpt, BACK_MATTER_TOUR));
        Ok(())
    }
}
