//! # Motor de Regras: Padrões Léxicos de Espécies
//!
//! Cada espécie do dicionário vira um punhado de regras, sequências de
//! restrições por token, serializáveis como padrões JSON:
//!
//! | Origem                 | Regra A (forma plena)            | Regra B (variante)              |
//! |------------------------|----------------------------------|---------------------------------|
//! | táxon / táxon alt.     | `[{LOWER:quercus},{LOWER:alba}]` | `[{LOWER:"q."},{LOWER:alba}]`   |
//! | nome popular           | `[{LOWER:white},{LOWER:oak}]`    | `[{LOWER:white},{LOWER:oaks}]`  |
//!
//! Palavras com hífen viram três restrições (prefixo, `{ORTH:"-"}`, sufixo), e
//! um possessivo vira duas (`"devil's"` → `{LOWER:devil},{LOWER:"'s"}`), como
//! o tokenizador os separa. O apóstrofo tipográfico é normalizado para `'`.
//!
//! ## Resolução de sobreposição
//!
//! Todas as ocorrências candidatas são coletadas e aceitas gulosamente:
//! a mais longa primeiro; em empate, a que começa antes; depois a regra
//! registrada antes. Regras de táxon são registradas antes das de nome popular,
//! então "Quercus alba" vence um nome popular que coincida com parte dele.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::mention::{CharSpan, Label, Mention};
use crate::species::SpeciesDictionary;
use crate::text::pluralize;
use crate::tokenizer::{Token, TokenKind};

/// Restrição sobre um único token.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TokenPattern {
    /// Igualdade com o texto do token em minúsculas.
    #[serde(rename = "LOWER")]
    Lower(String),
    /// Igualdade exata com o texto do token (usado para o hífen).
    #[serde(rename = "ORTH")]
    Orth(String),
}

impl TokenPattern {
    fn key(&self) -> String {
        match self {
            TokenPattern::Lower(s) => s.clone(),
            TokenPattern::Orth(s) => s.to_lowercase(),
        }
    }

    fn matches(&self, text: &str, lowered: &str) -> bool {
        match self {
            TokenPattern::Lower(s) => s == lowered,
            TokenPattern::Orth(s) => s == text,
        }
    }
}

/// Uma regra: rótulo, espécie dona e sequência de restrições.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MatchRule {
    pub label: Label,
    #[serde(rename = "id")]
    pub species_id: String,
    pub pattern: Vec<TokenPattern>,
}

/// Regras de um nome científico: forma plena e gênero abreviado.
///
/// Nomes de uma palavra só geram a forma plena: a abreviada seria uma inicial
/// solta ("s.") e casaria com qualquer inicial do texto.
pub fn taxon_rules(name: &str, label: Label, species_id: &str) -> Vec<MatchRule> {
    let words: Vec<String> = name.split_whitespace().map(str::to_lowercase).collect();
    let Some(first) = words.first() else { return vec![] };

    let full = words.iter().map(|w| TokenPattern::Lower(w.clone())).collect();
    let mut rules = vec![MatchRule {
        label,
        species_id: species_id.to_string(),
        pattern: full,
    }];

    if words.len() > 1 {
        if let Some(initial) = first.chars().next() {
            let mut abbreviated = vec![TokenPattern::Lower(format!("{initial}."))];
            abbreviated.extend(words[1..].iter().map(|w| TokenPattern::Lower(w.clone())));
            rules.push(MatchRule {
                label,
                species_id: species_id.to_string(),
                pattern: abbreviated,
            });
        }
    }
    rules
}

/// Regras de um nome popular: singular e plural (só a última palavra flexiona).
pub fn common_name_rules(name: &str, species_id: &str) -> Vec<MatchRule> {
    let words: Vec<String> = name.split_whitespace().map(normalize).collect();
    if words.is_empty() {
        return vec![];
    }
    let last = words.len() - 1;

    let singular = words.iter().flat_map(|w| word_patterns(w, false)).collect();
    let plural = words
        .iter()
        .enumerate()
        .flat_map(|(i, w)| word_patterns(w, i == last))
        .collect();

    [singular, plural]
        .into_iter()
        .map(|pattern| MatchRule {
            label: Label::CommonName,
            species_id: species_id.to_string(),
            pattern,
        })
        .collect()
}

/// Restrições de uma palavra, separando hífens. Com `plural`, flexiona a última parte.
fn word_patterns(word: &str, plural: bool) -> Vec<TokenPattern> {
    let parts: Vec<&str> = word.split('-').collect();
    let last = parts.len() - 1;
    let mut patterns = Vec::new();
    for (i, part) in parts.iter().enumerate() {
        if i > 0 {
            patterns.push(TokenPattern::Orth("-".to_string()));
        }
        if part.is_empty() {
            continue;
        }
        if let Some(stem) = part.strip_suffix("'s").filter(|stem| !stem.is_empty()) {
            patterns.push(TokenPattern::Lower(stem.to_string()));
            patterns.push(TokenPattern::Lower("'s".to_string()));
        } else if plural && i == last {
            patterns.push(TokenPattern::Lower(pluralize(part)));
        } else {
            patterns.push(TokenPattern::Lower(part.to_string()));
        }
    }
    patterns
}

/// Minúsculas com o apóstrofo tipográfico trocado pelo simples.
fn normalize(text: &str) -> String {
    text.to_lowercase().replace('\u{2019}', "'")
}

/// Conjunto congelado de regras, indexado pela primeira restrição.
pub struct RuleEngine {
    rules: Vec<MatchRule>,
    by_first: HashMap<String, Vec<usize>>,
}

impl RuleEngine {
    /// Monta as regras na ordem de registro: primeiro todos os táxons
    /// (canônicos e alternativos), depois todos os nomes populares.
    pub fn from_dictionary(dictionary: &SpeciesDictionary) -> Self {
        let mut rules = Vec::new();
        for record in dictionary.records() {
            rules.extend(taxon_rules(&record.name, Label::Species, &record.id));
            for alt in &record.alt_names {
                rules.extend(taxon_rules(alt, Label::AltSpecies, &record.id));
            }
        }
        for record in dictionary.records() {
            for common in &record.common_names {
                rules.extend(common_name_rules(common, &record.id));
            }
        }
        Self::from_rules(rules)
    }

    /// Remove regras repetidas (mantendo a primeira) e monta o índice.
    pub fn from_rules(rules: Vec<MatchRule>) -> Self {
        let mut seen = HashSet::new();
        let rules: Vec<MatchRule> = rules
            .into_iter()
            .filter(|r| !r.pattern.is_empty() && seen.insert(r.clone()))
            .collect();

        let mut by_first: HashMap<String, Vec<usize>> = HashMap::new();
        for (i, rule) in rules.iter().enumerate() {
            by_first.entry(rule.pattern[0].key()).or_default().push(i);
        }
        Self { rules, by_first }
    }

    pub fn rules(&self) -> &[MatchRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Aplica todas as regras à sequência de tokens e devolve as menções
    /// aceitas, em ordem de offset.
    ///
    /// Quebras de linha são ignoradas, mas uma ocorrência nunca atravessa uma
    /// quebra de parágrafo.
    pub fn apply(&self, text: &str, tokens: &[Token]) -> Vec<Mention> {
        let mut words: Vec<&Token> = Vec::new();
        let mut segments: Vec<usize> = Vec::new();
        let mut segment = 0;
        for token in tokens {
            if token.kind == TokenKind::Break {
                if token.is_paragraph_break() {
                    segment += 1;
                }
                continue;
            }
            words.push(token);
            segments.push(segment);
        }
        let lowered: Vec<String> = words.iter().map(|t| normalize(&t.text)).collect();

        // (início, tamanho, regra)
        let mut candidates: Vec<(usize, usize, usize)> = Vec::new();
        for i in 0..words.len() {
            let Some(rule_ids) = self.by_first.get(&lowered[i]) else { continue };
            for &r in rule_ids {
                let pattern = &self.rules[r].pattern;
                let n = pattern.len();
                if i + n > words.len() || segments[i + n - 1] != segments[i] {
                    continue;
                }
                let all_match = pattern
                    .iter()
                    .enumerate()
                    .all(|(j, p)| p.matches(&words[i + j].text, &lowered[i + j]));
                if all_match {
                    candidates.push((i, n, r));
                }
            }
        }

        candidates.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)).then(a.2.cmp(&b.2)));
        let mut taken = vec![false; words.len()];
        let mut accepted = Vec::new();
        for (i, n, r) in candidates {
            if taken[i..i + n].iter().any(|&t| t) {
                continue;
            }
            taken[i..i + n].iter_mut().for_each(|t| *t = true);
            accepted.push((i, n, r));
        }
        accepted.sort_by_key(|&(i, _, _)| i);

        accepted
            .into_iter()
            .map(|(i, n, r)| {
                let rule = &self.rules[r];
                let start = words[i].start;
                let end = words[i + n - 1].end;
                Mention {
                    text: text[start..end].to_string(),
                    span: Some(CharSpan { start, end }),
                    label: rule.label,
                    species_id: Some(rule.species_id.clone()),
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::species::DictionaryBuilder;
    use crate::sources::SpeciesEntry;
    use crate::tokenizer::tokenize;

    fn lower(s: &str) -> TokenPattern {
        TokenPattern::Lower(s.to_string())
    }

    fn engine(entries: Vec<SpeciesEntry>) -> RuleEngine {
        RuleEngine::from_dictionary(&DictionaryBuilder::new(entries).build())
    }

    #[test]
    fn test_taxon_rules() {
        let rules = taxon_rules("Quercus alba", Label::Species, "Q1");
        assert_eq!(rules.len(), 2);
        assert_eq!(rules[0].pattern, vec![lower("quercus"), lower("alba")]);
        assert_eq!(rules[1].pattern, vec![lower("q."), lower("alba")]);
        assert!(rules.iter().all(|r| r.species_id == "Q1" && r.label == Label::Species));
    }

    #[test]
    fn test_single_word_taxon_has_no_abbreviation() {
        let rules = taxon_rules("Sophora", Label::AltSpecies, "Q9");
        assert_eq!(rules.len(), 1);
    }

    #[test]
    fn test_common_name_rules_hyphen_and_plural() {
        let rules = common_name_rules("Silver-leafed linden", "Q2");
        assert_eq!(
            rules[0].pattern,
            vec![lower("silver"), TokenPattern::Orth("-".into()), lower("leafed"), lower("linden")]
        );
        assert_eq!(rules[1].pattern.last(), Some(&lower("lindens")));

        let birch = common_name_rules("Black Birch", "Q3");
        assert_eq!(birch[1].pattern, vec![lower("black"), lower("birches")]);
    }

    #[test]
    fn test_rule_serialization() {
        let rule = &taxon_rules("Quercus alba", Label::Species, "Q1")[1];
        let json = serde_json::to_string(rule).unwrap();
        assert_eq!(json, r#"{"label":"SPECIES","id":"Q1","pattern":[{"LOWER":"q."},{"LOWER":"alba"}]}"#);
    }

    #[test]
    fn test_registration_order_taxa_first() {
        let engine = engine(vec![
            SpeciesEntry::new("Quercus alba", Some("Q1")).with_common_names(&["White oak"]),
            SpeciesEntry::new("Acer rubrum", Some("Q2")),
        ]);
        let labels: Vec<Label> = engine.rules().iter().map(|r| r.label).collect();
        let first_common = labels.iter().position(|l| *l == Label::CommonName).unwrap();
        assert!(labels[..first_common].iter().all(|l| l.is_taxon()));
        assert_eq!(engine.len(), 6);
    }

    #[test]
    fn test_apply_finds_mentions() {
        let engine = engine(vec![
            SpeciesEntry::new("Quercus alba", Some("Q1")).with_common_names(&["White oak"]),
        ]);
        let text = "The white oaks stand near Q. alba and QUERCUS ALBA.";
        let mentions = engine.apply(text, &tokenize(text));
        let found: Vec<(&str, Label)> = mentions.iter().map(|m| (m.text.as_str(), m.label)).collect();
        assert_eq!(
            found,
            vec![
                ("white oaks", Label::CommonName),
                ("Q. alba", Label::Species),
                ("QUERCUS ALBA", Label::Species),
            ]
        );
        assert_eq!(mentions[0].span, Some(CharSpan { start: 4, end: 14 }));
        assert_eq!(mentions[0].species_id.as_deref(), Some("Q1"));
    }

    #[test]
    fn test_apply_prefers_longest() {
        let engine = engine(vec![
            SpeciesEntry::new("Acer rubrum", Some("Q2")).with_common_names(&["Maple"]),
            SpeciesEntry::new("Acer saccharum", Some("Q3")).with_common_names(&["Sugar maple"]),
        ]);
        let text = "A sugar maple grows here.";
        let mentions = engine.apply(text, &tokenize(text));
        assert_eq!(mentions.len(), 1);
        assert_eq!(mentions[0].text, "sugar maple");
        assert_eq!(mentions[0].species_id.as_deref(), Some("Q3"));
    }

    #[test]
    fn test_apply_tie_goes_to_taxon() {
        let engine = engine(vec![
            SpeciesEntry::new("Magnolia", Some("Q5")),
            SpeciesEntry::new("Magnolia virginiana", Some("Q6")).with_common_names(&["Magnolia"]),
        ]);
        let text = "A magnolia.";
        let mentions = engine.apply(text, &tokenize(text));
        assert_eq!(mentions.len(), 1);
        assert_eq!(mentions[0].label, Label::Species);
        assert_eq!(mentions[0].species_id.as_deref(), Some("Q5"));
    }

    #[test]
    fn test_apply_hyphenated_name() {
        let engine = engine(vec![
            SpeciesEntry::new("Tilia tomentosa", Some("Q7")).with_common_names(&["Silver-leafed linden"]),
        ]);
        let text = "Two silver-leafed lindens.";
        let mentions = engine.apply(text, &tokenize(text));
        assert_eq!(mentions.len(), 1);
        assert_eq!(mentions[0].text, "silver-leafed lindens");
    }

    #[test]
    fn test_apply_possessive() {
        let engine = engine(vec![
            SpeciesEntry::new("Quercus alba", Some("Q1")).with_common_names(&["White oak"]),
            SpeciesEntry::new("Aralia spinosa", Some("Q4")).with_common_names(&["Devil's walkingstick"]),
        ]);
        let text = "The white oak's bark is pale, unlike Quercus alba\u{2019}s twigs. A devil\u{2019}s walkingstick.";
        let mentions = engine.apply(text, &tokenize(text));
        let found: Vec<(&str, Label)> = mentions.iter().map(|m| (m.text.as_str(), m.label)).collect();
        assert_eq!(
            found,
            vec![
                ("white oak", Label::CommonName),
                ("Quercus alba", Label::Species),
                ("devil\u{2019}s walkingstick", Label::CommonName),
            ]
        );
        assert_eq!(mentions[2].species_id.as_deref(), Some("Q4"));
    }

    #[test]
    fn test_apply_does_not_cross_paragraphs() {
        let engine = engine(vec![
            SpeciesEntry::new("Quercus alba", Some("Q1")).with_common_names(&["White oak"]),
        ]);
        let text = "It was white\n\nOak trees follow. A white\noak.";
        let mentions = engine.apply(text, &tokenize(text));
        assert_eq!(mentions.len(), 1);
        assert_eq!(mentions[0].text, "white\noak");
    }
}
