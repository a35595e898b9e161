//! # trail-core: Enriquecimento do livro "Tree Trails in Prospect Park"
//!
//! Este crate transforma o texto de um guia de caminhadas de 1968 em registros
//! importáveis por um banco de dados: cada parada do tour ligada à espécie de
//! árvore que ela descreve, com nomes científicos e populares realçados.
//!
//! ## Arquitetura do Sistema
//!
//! O sistema segue uma arquitetura de pipeline linear:
//!
//! 1.  **Dicionário** ([`species`]): entradas brutas viram registros com id estável.
//! 2.  **Regras** ([`rule_based`]): cada nome vira padrões de tokens (completo,
//!     gênero abreviado, plural).
//! 3.  **Tokenização** ([`tokenizer`], [`sentence`]): tokens e sentenças com offsets.
//! 4.  **Casamento**: as regras produzem [`Mention`]s no texto.
//! 5.  **Segmentação** ([`segment`]): seções (introdução, tours, matéria final) e parágrafos.
//! 6.  **Fusão** ([`merge`]): menções do mesmo parágrafo agrupadas por espécie.
//! 7.  **Paradas** ([`stops`]): uma parada por grupo, com excerto em texto rico.
//! 8.  **Curadoria** ([`curation`]): exclusões manuais e numeração.
//! 9.  **Saída** ([`export`]): tabelas CSV de espécies e de paradas.
//!
//! ## Exemplo de Uso
//!
//! ```rust
//! use trail_core::{PipelineConfig, SpeciesEntry, Overrides, TrailPipeline};
//!
//! let species = vec![SpeciesEntry::new("Quercus alba", Some("Q1")).with_common_names(&["White oak"])];
//! let pipeline = TrailPipeline::from_sources(&species, Overrides::default(), PipelineConfig::default()).unwrap();
//!
//! let output = pipeline
//!     .run("TOUR 1\n\nThe white oak stands tall. Quercus alba is common.", &[])
//!     .unwrap();
//!
//! assert_eq!(output.stops[1].title, "White oak (Quercus alba)");
//! ```

pub mod config;
pub mod curation;
pub mod error;
pub mod export;
pub mod mention;
pub mod merge;
pub mod pipeline;
pub mod rule_based;
pub mod segment;
pub mod sentence;
pub mod sources;
pub mod species;
pub mod stops;
pub mod text;
pub mod tokenizer;

pub use config::{Formatting, PipelineConfig};
pub use error::{Result, TrailError};
pub use mention::{Label, Mention};
pub use pipeline::{PipelineEvent, PipelineOutput, TrailPipeline};
pub use segment::SectionLayout;
pub use sources::{Overrides, SpeciesEntry, StopDeletion};
pub use species::{DictionaryBuilder, SpeciesDictionary, SpeciesRecord};
pub use stops::Stop;
pub use tokenizer::Token;
