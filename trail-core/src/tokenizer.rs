//! # Tokenizador
//!
//! Divide o texto do livro em tokens, preservando a posição original de cada um
//! (offsets em bytes) para que menções e sentenças possam ser relacionadas
//! depois apenas por offsets.
//!
//! ## Esquema de Tokenização
//!
//! A base são as fronteiras de palavra do Unicode (UAX #29, via `unicode-segmentation`),
//! que já separam hífens ("silver-leafed" → "silver", "-", "leafed") e mantêm
//! números inteiros ("1.5"). Sobre isso:
//!
//! - O possessivo vira um token próprio ("oak's" → "oak", "'s"), assim como o
//!   apóstrofo final solto ("trees'" → "trees", "'").
//! - Uma letra isolada seguida de ponto vira um único token ("Q."), para o
//!   gênero abreviado de nomes científicos ("Q. alba").
//! - Abreviações conhecidas também absorvem o ponto ("St.", "Mt.").
//! - Espaços horizontais são descartados. Sequências de espaço que contêm
//!   quebra de linha viram tokens [`TokenKind::Break`], começando na primeira
//!   quebra, para que a detecção de parágrafos as enxergue.
//!
//! ## Exemplo de Uso
//!
//! ```rust
//! use trail_core::tokenizer::tokenize;
//!
//! let tokens = tokenize("Q. alba is a white-oak.");
//! let texts: Vec<&str> = tokens.iter().map(|t| t.text.as_str()).collect();
//! assert_eq!(texts, vec!["Q.", "alba", "is", "a", "white", "-", "oak", "."]);
//! ```

use serde::{Deserialize, Serialize};
use unicode_segmentation::UnicodeSegmentation;

/// Um token extraído do texto original.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Token {
    /// O texto do token (ex: "Quercus", "-", "\n\n").
    pub text: String,
    /// Índice de byte inicial no texto original (inclusive).
    pub start: usize,
    /// Índice de byte final no texto original (exclusivo).
    pub end: usize,
    /// Índice sequencial do token na lista (0, 1, 2...).
    pub index: usize,
    pub kind: TokenKind,
}

/// Classe do token, usada pelo casamento de regras e pela detecção de sentenças.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    /// Contém ao menos um caractere alfanumérico.
    Word,
    /// Pontuação ou símbolo isolado.
    Punct,
    /// Espaço em branco com uma ou mais quebras de linha.
    Break,
}

impl Token {
    /// Número de quebras de linha (`\n`) no token. Só é diferente de zero em `Break`.
    pub fn newlines(&self) -> usize {
        self.text.matches('\n').count()
    }

    /// Dois ou mais `\n` separam parágrafos.
    pub fn is_paragraph_break(&self) -> bool {
        self.kind == TokenKind::Break && self.newlines() >= 2
    }
}

/// Abreviações comuns no texto que não devem ter o ponto tratado como fim de sentença
const ABBREVIATIONS: &[&str] = &[
    "Mr", "Mrs", "Dr", "St", "Mt", "Ave", "Rd", "var", "etc", "vs", "ca", "cf", "No",
];

/// Tokeniza o texto completo.
pub fn tokenize(text: &str) -> Vec<Token> {
    let segments: Vec<(usize, &str)> = text.split_word_bound_indices().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < segments.len() {
        let (start, segment) = segments[i];

        if is_blank(segment) {
            // Agrupa espaços consecutivos (UAX #29 separa "\n" de "\n")
            let mut end = start + segment.len();
            let mut j = i + 1;
            while j < segments.len() && is_blank(segments[j].1) {
                end = segments[j].0 + segments[j].1.len();
                j += 1;
            }
            if let Some(newline) = text[start..end].find('\n') {
                push_token(&mut tokens, text, start + newline, end, TokenKind::Break);
            }
            i = j;
            continue;
        }

        let next_is_period = segments.get(i + 1).map(|(_, s)| *s == ".").unwrap_or(false);
        if next_is_period && absorbs_period(segment) {
            push_token(&mut tokens, text, start, start + segment.len() + 1, TokenKind::Word);
            i += 2;
            continue;
        }

        if let Some(stem) = possessive_stem(segment) {
            push_token(&mut tokens, text, start, start + stem, TokenKind::Word);
            push_token(&mut tokens, text, start + stem, start + segment.len(), TokenKind::Punct);
            i += 1;
            continue;
        }

        let kind = if segment.chars().any(char::is_alphanumeric) {
            TokenKind::Word
        } else {
            TokenKind::Punct
        };
        push_token(&mut tokens, text, start, start + segment.len(), kind);
        i += 1;
    }

    tokens
}

fn is_blank(segment: &str) -> bool {
    segment.chars().all(char::is_whitespace)
}

/// Letra isolada ("Q") ou abreviação conhecida ("St").
fn absorbs_period(segment: &str) -> bool {
    let mut chars = segment.chars();
    let single_letter = matches!((chars.next(), chars.next()), (Some(c), None) if c.is_alphabetic());
    single_letter || ABBREVIATIONS.contains(&segment)
}

const POSSESSIVES: &[&str] = &["'s", "'S", "\u{2019}s", "\u{2019}S"];

/// Tamanho em bytes da palavra antes do possessivo ("oak's" → 3).
fn possessive_stem(segment: &str) -> Option<usize> {
    POSSESSIVES
        .iter()
        .find(|suffix| segment.len() > suffix.len() && segment.ends_with(*suffix))
        .map(|suffix| segment.len() - suffix.len())
}

fn push_token(tokens: &mut Vec<Token>, text: &str, start: usize, end: usize, kind: TokenKind) {
    let index = tokens.len();
    tokens.push(Token {
        text: text[start..end].to_string(),
        start,
        end,
        index,
        kind,
    });
}
