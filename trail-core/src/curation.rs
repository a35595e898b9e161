//! # Curadoria
//!
//! Remove as paradas listadas manualmente (referências a árvores que não estão
//! no percurso) e numera o resultado.
//!
//! Quando a parada removida era a única do seu parágrafo, o texto dela não
//! pode sumir: vai, sem marcação, para a parada sobrevivente anterior (e para
//! as vizinhas da mesma origem).

use std::collections::HashSet;

use tracing::{info, warn};

use crate::sources::StopDeletion;
use crate::stops::Stop;
use crate::text::strip_markup;

fn is_deleted(stop: &Stop, deletions: &[StopDeletion]) -> bool {
    deletions
        .iter()
        .any(|d| d.lead_in == stop.lead_in && d.species == stop.species)
}

/// Acrescenta `text` à última parada e às anteriores da mesma origem.
fn fold_into_previous(kept: &mut [Stop], text: &str) -> bool {
    let Some(origin) = kept.last().map(|s| s.origin) else {
        return false;
    };
    for (i, stop) in kept.iter_mut().rev().enumerate() {
        if i > 0 && (origin.is_none() || stop.origin != origin) {
            break;
        }
        stop.excerpt = format!("{}\n{text}", stop.excerpt);
    }
    true
}

/// Aplica as exclusões e atribui a sequência 1..N.
pub fn curate(stops: Vec<Stop>, deletions: &[StopDeletion]) -> Vec<Stop> {
    let total = stops.len();
    let deleted: Vec<bool> = stops.iter().map(|s| is_deleted(s, deletions)).collect();
    let surviving_origins: HashSet<usize> = stops
        .iter()
        .zip(&deleted)
        .filter(|(_, gone)| !**gone)
        .filter_map(|(s, _)| s.origin)
        .collect();

    let mut kept: Vec<Stop> = Vec::with_capacity(total);
    let mut folded: HashSet<usize> = HashSet::new();

    for (stop, gone) in stops.into_iter().zip(deleted) {
        if !gone {
            kept.push(stop);
            continue;
        }
        let orphan = match stop.origin {
            Some(origin) => !surviving_origins.contains(&origin) && folded.insert(origin),
            None => true,
        };
        if !orphan {
            continue;
        }
        if !fold_into_previous(&mut kept, &strip_markup(&stop.excerpt)) {
            warn!(title = %stop.title, lead_in = %stop.lead_in, "parada removida sem anterior, texto descartado");
        }
    }

    for (i, stop) in kept.iter_mut().enumerate() {
        stop.sequence = Some(i + 1);
    }
    info!(total, kept = kept.len(), "curadoria concluída");
    kept
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stop(title: &str, lead_in: &str, species: Option<&str>, origin: usize) -> Stop {
        Stop {
            title: title.into(),
            lead_in: lead_in.into(),
            excerpt: format!("<b>{title}</b> text."),
            tour: "TOUR 1".into(),
            species_id: None,
            species: species.map(str::to_string),
            origin: Some(origin),
            sequence: None,
        }
    }

    fn deletion(lead_in: &str, species: Option<&str>) -> StopDeletion {
        StopDeletion {
            lead_in: lead_in.into(),
            species: species.map(str::to_string),
        }
    }

    #[test]
    fn test_no_deletions_assigns_sequence() {
        let stops = vec![stop("A", "a...", Some("X"), 0), stop("B", "b...", Some("Y"), 1)];
        let out = curate(stops, &[]);
        assert_eq!(out.iter().map(|s| s.sequence).collect::<Vec<_>>(), vec![Some(1), Some(2)]);
    }

    #[test]
    fn test_sole_stop_folds_into_previous() {
        let stops = vec![
            stop("A", "a...", Some("X"), 0),
            stop("B", "b...", Some("Y"), 1),
            stop("C", "c...", Some("Z"), 2),
        ];
        let out = curate(stops, &[deletion("b...", Some("Y"))]);
        assert_eq!(out.len(), 2);
        assert!(out.iter().all(|s| s.lead_in != "b..."));
        assert_eq!(out[0].excerpt, "<b>A</b> text.\nB text.");
        assert_eq!(out[1].sequence, Some(2));
    }

    #[test]
    fn test_replicated_stop_deletion_keeps_text_in_sibling() {
        let stops = vec![
            stop("A", "a...", Some("X"), 0),
            stop("B", "b...", Some("Y"), 1),
            stop("B2", "b...", Some("W"), 1),
        ];
        let out = curate(stops, &[deletion("b...", Some("Y"))]);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].excerpt, "<b>A</b> text.");
        assert_eq!(out[1].title, "B2");
    }

    #[test]
    fn test_all_replicas_deleted_fold_once() {
        let stops = vec![
            stop("A", "a...", Some("X"), 0),
            stop("A2", "a...", Some("V"), 0),
            stop("B", "b...", Some("Y"), 1),
            stop("B2", "b...", Some("W"), 1),
        ];
        let out = curate(stops, &[deletion("b...", Some("Y")), deletion("b...", Some("W"))]);
        assert_eq!(out.len(), 2);
        for s in &out {
            assert_eq!(s.excerpt.matches("B text.").count(), 1);
            assert!(!s.excerpt.contains("B2 text."));
        }
    }

    #[test]
    fn test_deletion_requires_species_match() {
        let stops = vec![stop("A", "a...", Some("X"), 0), stop("B", "b...", None, 1)];
        let out = curate(stops, &[deletion("a...", None), deletion("b...", Some("Y"))]);
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn test_first_stop_deleted_text_dropped() {
        let stops = vec![stop("A", "a...", Some("X"), 0), stop("B", "b...", Some("Y"), 1)];
        let out = curate(stops, &[deletion("a...", Some("X"))]);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].sequence, Some(1));
    }
}
