//! # Detecção de Sentenças
//!
//! Agrupa tokens em sentenças, de forma independente do casamento de regras.
//! Só os offsets de caractere relacionam sentenças e menções depois.
//!
//! Uma nova sentença começa:
//! - no primeiro token que não é pontuação depois de um terminador (`.`, `!`, `?`, `…`);
//! - em toda quebra de parágrafo (dois ou mais `\n`).
//!
//! Como a quebra abre a sentença seguinte, sentenças que iniciam parágrafo
//! começam com `"\n\n"`, e é isso que o segmentador usa para achar parágrafos.

use serde::{Deserialize, Serialize};

use crate::tokenizer::{Token, TokenKind};

/// Uma sentença com seus offsets no documento (intervalo semiaberto).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sentence {
    pub text: String,
    pub start: usize,
    pub end: usize,
}

const TERMINATORS: &[&str] = &[".", "!", "?", "\u{2026}"];

/// Divide o documento em sentenças a partir dos seus tokens.
pub fn split_sentences(text: &str, tokens: &[Token]) -> Vec<Sentence> {
    let mut sentences = Vec::new();
    let mut current: Vec<&Token> = Vec::new();
    let mut after_terminator = false;

    for token in tokens {
        let boundary = !current.is_empty()
            && (token.is_paragraph_break() || (after_terminator && token.kind != TokenKind::Punct));
        if boundary {
            flush_sentence(&mut sentences, text, &current);
            current.clear();
            after_terminator = false;
        }
        if token.kind == TokenKind::Punct && TERMINATORS.contains(&token.text.as_str()) {
            after_terminator = true;
        }
        current.push(token);
    }
    flush_sentence(&mut sentences, text, &current);

    sentences
}

fn flush_sentence(sentences: &mut Vec<Sentence>, text: &str, tokens: &[&Token]) {
    let Some(first) = tokens.first() else { return };
    // Quebras no fim pertencem à próxima sentença (ou a nenhuma)
    let Some(last) = tokens.iter().rev().find(|t| t.kind != TokenKind::Break) else {
        return;
    };
    sentences.push(Sentence {
        text: text[first.start..last.end].to_string(),
        start: first.start,
        end: last.end,
    });
}
