//! # Utilitários de Texto
//!
//! Funções pequenas e puras usadas por vários estágios: pluralização heurística,
//! capitalização no estilo "Title Case", normalização de quebras de linha e
//! remoção de marcação.

use std::sync::LazyLock;

use regex::Regex;

static RE_LEADING_BREAKS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\n+").unwrap());
static RE_EXCESS_BREAKS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n\n+").unwrap());
static RE_SPACES: LazyLock<Regex> = LazyLock::new(|| Regex::new(r" +").unwrap());
static RE_TAGS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<.*?>").unwrap());

/// Plural em inglês por sufixo (sem dicionário).
///
/// - termina em `y` → troca o `y` final por `ies` ("cherry" → "cherries")
/// - termina em `ch`, `s`, `sh`, `z`, `x` → acrescenta `es` ("birch" → "birches")
/// - caso contrário → acrescenta `s` ("oak" → "oaks")
pub fn pluralize(word: &str) -> String {
    if let Some(stem) = word.strip_suffix('y') {
        format!("{stem}ies")
    } else if ["ch", "s", "sh", "z", "x"].iter().any(|suffix| word.ends_with(suffix)) {
        format!("{word}es")
    } else {
        format!("{word}s")
    }
}

/// Cada letra que segue um caractere não alfabético vira maiúscula, as demais minúsculas.
///
/// O possessivo é preservado: "devil's walking stick" → "Devil's Walking Stick"
/// (tanto com apóstrofo reto quanto curvo).
pub fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut prev_alpha = false;
    for ch in text.chars() {
        if ch.is_alphabetic() {
            if prev_alpha {
                out.extend(ch.to_lowercase());
            } else {
                out.extend(ch.to_uppercase());
            }
            prev_alpha = true;
        } else {
            out.push(ch);
            prev_alpha = false;
        }
    }
    out.replace("'S", "'s").replace("\u{2019}S", "\u{2019}s")
}

/// Primeira letra maiúscula, resto minúsculo ("quercus ALBA" → "Quercus alba").
pub fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

/// Normaliza quebras de linha de um trecho:
/// remove espaços não separáveis, remove quebras iniciais e reduz 3+ quebras para 2.
pub fn line_breaks(text: &str) -> String {
    let text = text.replace('\u{a0}', "");
    let text = RE_LEADING_BREAKS.replace(&text, "");
    RE_EXCESS_BREAKS.replace_all(&text, "\n\n").into_owned()
}

/// Junta sentenças com um espaço, colapsando espaços repetidos.
pub fn join_sentences<'a, I>(sentences: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let joined = sentences.into_iter().collect::<Vec<_>>().join(" ");
    RE_SPACES.replace_all(&joined, " ").into_owned()
}

/// Remove marcação HTML (`<...>`) e markdown (`**`, `_`).
pub fn strip_markup(text: &str) -> String {
    let text = text.replace("**", "").replace('_', "");
    RE_TAGS.replace_all(&text, "").into_owned()
}

/// Os primeiros `n` caracteres (não bytes) de `text`.
pub fn truncate_chars(text: &str, n: usize) -> &str {
    match text.char_indices().nth(n) {
        Some((byte, _)) => &text[..byte],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pluralize() {
        assert_eq!(pluralize("oak"), "oaks");
        assert_eq!(pluralize("birch"), "birches");
        assert_eq!(pluralize("cherry"), "cherries");
        assert_eq!(pluralize("box"), "boxes");
        assert_eq!(pluralize("ash"), "ashes");
        assert_eq!(pluralize("cypress"), "cypresses");
    }

    #[test]
    fn test_pluralize_only_trailing_y() {
        assert_eq!(pluralize("yellowy"), "yellowies");
        assert_eq!(pluralize("yew"), "yews");
    }

    #[test]
    fn test_title_case_possessive() {
        assert_eq!(title_case("white oak"), "White Oak");
        assert_eq!(title_case("devil's walking stick"), "Devil's Walking Stick");
        assert_eq!(title_case("devil\u{2019}s club"), "Devil\u{2019}s Club");
        assert_eq!(title_case("silver-leafed LINDEN"), "Silver-Leafed Linden");
    }

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("white oak"), "White oak");
        assert_eq!(capitalize("Quercus Alba"), "Quercus alba");
        assert_eq!(capitalize(""), "");
    }

    #[test]
    fn test_line_breaks() {
        assert_eq!(line_breaks("\n\nA\u{a0}B\n\n\n\nC"), "AB\n\nC");
        assert_eq!(line_breaks("A\nB"), "A\nB");
    }

    #[test]
    fn test_join_sentences() {
        assert_eq!(join_sentences(["A tree.", " Another  one."]), "A tree. Another one.");
    }

    #[test]
    fn test_strip_markup() {
        let marked = "<b><i style=\"color: rgb(1, 2, 3);\">Quercus alba</i></b> and **bold** _x_";
        assert_eq!(strip_markup(marked), "Quercus alba and bold x");
    }

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("árvore", 3), "árv");
        assert_eq!(truncate_chars("oak", 10), "oak");
    }
}
