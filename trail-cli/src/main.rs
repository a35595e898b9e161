//! Linha de comando do pipeline: lê as entradas em arquivos, executa e grava as tabelas.

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::sync::mpsc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::de::DeserializeOwned;
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use trail_core::export::{write_patterns_jsonl, write_species_csv, write_stops_csv};
use trail_core::sources::{read_json, DocumentSource, JsonSpeciesFile, TextFile};
use trail_core::{Overrides, PipelineConfig, StopDeletion, TrailPipeline};

const SPECIES_CSV: &str = "tree_species.csv";
const STOPS_CSV: &str = "tree_trails.csv";

#[derive(Parser)]
#[command(name = "trail")]
#[command(about = "Gera as tabelas de espécies e paradas do Tree Trails in Prospect Park")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Executa o pipeline completo e grava os dois CSVs
    Run {
        /// JSON com a lista de espécies
        #[arg(long)]
        species: PathBuf,
        /// Texto do livro
        #[arg(long)]
        document: PathBuf,
        /// JSON com acréscimos e remoções de nomes
        #[arg(long)]
        overrides: Option<PathBuf>,
        /// JSON com as paradas a excluir
        #[arg(long)]
        deletions: Option<PathBuf>,
        /// JSON de configuração (parcial)
        #[arg(long)]
        config: Option<PathBuf>,
        /// Diretório de saída
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,
        /// Grava também os padrões do casador em JSONL
        #[arg(long)]
        patterns_out: Option<PathBuf>,
    },

    /// Gera apenas os padrões do casador (JSONL)
    Patterns {
        #[arg(long)]
        species: PathBuf,
        #[arg(long)]
        overrides: Option<PathBuf>,
        #[arg(long)]
        out: PathBuf,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    match Cli::parse().command {
        Commands::Run {
            species,
            document,
            overrides,
            deletions,
            config,
            out_dir,
            patterns_out,
        } => {
            let config = match config {
                Some(path) => PipelineConfig::from_file(&path)
                    .with_context(|| format!("lendo configuração {}", path.display()))?,
                None => PipelineConfig::default(),
            };
            let pipeline = build_pipeline(&species, overrides.as_deref(), config)?;
            if let Some(path) = patterns_out {
                write_patterns(&pipeline, &path)?;
            }
            let deletions: Vec<StopDeletion> = optional_json(deletions.as_deref())?;
            run(&pipeline, &document, &deletions, &out_dir)
        }
        Commands::Patterns { species, overrides, out } => {
            let pipeline = build_pipeline(&species, overrides.as_deref(), PipelineConfig::default())?;
            write_patterns(&pipeline, &out)
        }
    }
}

fn optional_json<T: DeserializeOwned + Default>(path: Option<&Path>) -> Result<T> {
    match path {
        Some(path) => read_json(path).with_context(|| format!("lendo {}", path.display())),
        None => Ok(T::default()),
    }
}

fn build_pipeline(species: &Path, overrides: Option<&Path>, config: PipelineConfig) -> Result<TrailPipeline> {
    let overrides: Overrides = optional_json(overrides)?;
    let source = JsonSpeciesFile {
        path: species.to_path_buf(),
    };
    TrailPipeline::from_sources(&source, overrides, config)
        .with_context(|| format!("lendo espécies {}", species.display()))
}

fn write_patterns(pipeline: &TrailPipeline, path: &Path) -> Result<()> {
    let file = File::create(path).with_context(|| format!("criando {}", path.display()))?;
    write_patterns_jsonl(BufWriter::new(file), pipeline.engine().rules())
        .with_context(|| format!("gravando {}", path.display()))?;
    info!(rules = pipeline.engine().len(), path = %path.display(), "padrões gravados");
    Ok(())
}

fn run(pipeline: &TrailPipeline, document: &Path, deletions: &[StopDeletion], out_dir: &Path) -> Result<()> {
    let text = TextFile {
        path: document.to_path_buf(),
    }
    .document()
    .with_context(|| format!("lendo documento {}", document.display()))?;

    let (tx, rx) = mpsc::channel();
    let output = pipeline.run_streaming(&text, deletions, &tx)?;
    drop(tx);
    for event in rx.iter() {
        debug!(?event, "estágio concluído");
    }

    std::fs::create_dir_all(out_dir).with_context(|| format!("criando {}", out_dir.display()))?;

    let species_path = out_dir.join(SPECIES_CSV);
    let file = File::create(&species_path).with_context(|| format!("criando {}", species_path.display()))?;
    write_species_csv(BufWriter::new(file), &output.species)?;

    let stops_path = out_dir.join(STOPS_CSV);
    let file = File::create(&stops_path).with_context(|| format!("criando {}", stops_path.display()))?;
    write_stops_csv(BufWriter::new(file), &output.stops)?;

    info!(
        species = output.species.len(),
        stops = output.stops.len(),
        dir = %out_dir.display(),
        "tabelas gravadas"
    );
    Ok(())
}
