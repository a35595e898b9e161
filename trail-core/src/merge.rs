//! # Fusão de Menções
//!
//! Agrupa, dentro de um parágrafo, as menções que se referem à mesma espécie.
//! É o equivalente ao "linking" de um pipeline de NER: o nome popular solto
//! ("white oak") precisa ser ligado a um id da base de espécies.
//!
//! 1. Toda menção de táxon (`SPECIES` ou `ALT_SPECIES`) abre um grupo pelo id.
//! 2. Em ordem de texto, cada nome popular entra no grupo do seu id, se houver.
//! 3. Sem grupo próprio, um nome de uma palavra é descartado (ambíguo demais).
//! 4. Um nome de várias palavras é comparado aos nomes populares das espécies
//!    citadas no parágrafo, na ordem do texto; a primeira que casar leva.
//!    Sem acerto, vale o próprio id, e uma menção de espécie sem posição é
//!    sintetizada para o grupo.

use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use crate::mention::{Label, Mention};
use crate::species::SpeciesDictionary;
use crate::text::{pluralize, title_case};

/// Menções de um parágrafo agrupadas por id de espécie.
pub type EntityGroups = BTreeMap<String, Vec<Mention>>;

/// Agrupa as menções de um parágrafo. A saída depende só da entrada.
pub fn merge_mentions(mentions: &[Mention], dictionary: &SpeciesDictionary) -> EntityGroups {
    let mut groups = EntityGroups::new();

    for mention in mentions.iter().filter(|m| m.label.is_taxon()) {
        if let Some(id) = &mention.species_id {
            groups.entry(id.clone()).or_default().push(mention.clone());
        }
    }
    let seeded = seeded_in_text_order(mentions);

    let mut common: Vec<&Mention> = mentions.iter().filter(|m| m.label == Label::CommonName).collect();
    common.sort_by_key(|m| m.start());

    for mention in common {
        let Some(id) = mention.species_id.as_deref() else {
            continue;
        };

        if let Some(group) = groups.get_mut(id) {
            group.push(mention.clone());
            continue;
        }

        if !mention.is_multi_word() {
            debug!(text = %mention.text, id, "nome popular isolado descartado");
            continue;
        }

        let present = seeded
            .iter()
            .find(|other| dictionary.common_names(other).iter().any(|name| same_name(&mention.text, name)));
        if let Some(other) = present {
            debug!(text = %mention.text, id, linked = %other, "nome popular ligado à espécie do parágrafo");
            groups.entry(other.clone()).or_default().push(mention.clone());
            continue;
        }

        match dictionary.name_of(id) {
            Some(name) => {
                let species = Mention {
                    text: name.to_string(),
                    span: None,
                    label: Label::Species,
                    species_id: Some(id.to_string()),
                };
                groups.insert(id.to_string(), vec![species, mention.clone()]);
            }
            None => debug!(text = %mention.text, id, "id desconhecido, menção descartada"),
        }
    }

    groups
}

/// Ids dos táxons do parágrafo na ordem em que aparecem no texto, sem repetição.
fn seeded_in_text_order(mentions: &[Mention]) -> Vec<String> {
    let mut taxa: Vec<&Mention> = mentions.iter().filter(|m| m.label.is_taxon()).collect();
    taxa.sort_by_key(|m| (m.start().is_none(), m.start()));
    let mut seen = BTreeSet::new();
    taxa.into_iter()
        .filter_map(|m| m.species_id.clone())
        .filter(|id| seen.insert(id.clone()))
        .collect()
}

/// Compara um texto do documento com um nome popular, no singular ou plural.
fn same_name(text: &str, common_name: &str) -> bool {
    let text = title_case(text);
    text == title_case(common_name) || text == title_case(&pluralize(common_name))
}

/// Menor posição entre as menções de um grupo.
pub fn group_start(mentions: &[Mention]) -> Option<usize> {
    mentions.iter().filter_map(Mention::start).min()
}

/// Grupos em ordem de primeira aparição. Grupos sem posição vão para o fim.
pub fn ordered_groups(groups: &EntityGroups) -> Vec<(&str, &[Mention])> {
    let mut ordered: Vec<(&str, &[Mention])> = groups
        .iter()
        .map(|(id, mentions)| (id.as_str(), mentions.as_slice()))
        .collect();
    ordered.sort_by_key(|(_, mentions)| match group_start(mentions) {
        Some(start) => (0, start),
        None => (1, 0),
    });
    ordered
}
