//! Command-line interface for importing OSM highways into a segmented
//! topology database.
#![forbid(unsafe_code)]

use camino::{Utf8Path, Utf8PathBuf};
use clap::{Parser, Subcommand};
use log::{LevelFilter, info};
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};
use waysplit_core::{CleanReport, run_pipeline};
use waysplit_data::{
    OsmIngestSummary, PersistReport, ingest_osm_pbf, persist_topology_to_sqlite,
};

mod error;

pub use error::CliError;

const ARG_OSM_PBF: &str = "osm-pbf";
const ARG_DATABASE: &str = "database";
const ARG_LOG_LEVEL: &str = "log-level";
const ENV_OSM_PBF: &str = "WAYSPLIT_CMDS_IMPORT_OSM_PBF";
const DEFAULT_DATABASE: &str = "waysplit.db";
const DEFAULT_LOG_LEVEL: LevelFilter = LevelFilter::Info;

/// Run the waysplit CLI with the current process arguments and environment.
///
/// # Errors
/// Returns [`CliError`] when arguments, configuration or any import stage
/// fail.
pub fn run() -> Result<(), CliError> {
    let cli = Cli::try_parse().map_err(CliError::ArgumentParsing)?;
    match cli.command {
        Command::Import(args) => {
            let config = resolve_import_config(args)?;
            init_logging(config.log_level)?;
            let outcome = run_import(&config)?;
            info!(
                "Imported {} of {} highways ({} incomplete, {} unclassified) as {} segments",
                outcome.persisted.highways,
                outcome.ingest.highways,
                outcome.clean.incomplete_ways,
                outcome.clean.unclassified_ways,
                outcome.persisted.segments
            );
        }
    }
    Ok(())
}

fn init_logging(level: LevelFilter) -> Result<(), CliError> {
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .try_init()
        .map_err(CliError::InitLogging)
}

fn resolve_import_config(args: ImportArgs) -> Result<ImportConfig, CliError> {
    let config = args.into_config()?;
    config.validate_sources()?;
    Ok(config)
}

#[derive(Debug, Parser)]
#[command(
    name = "waysplit",
    about = "Clean OSM highways and split them into segments at shared points",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Import highways from an OSM PBF extract into a SQLite database.
    Import(ImportArgs),
}

/// CLI arguments for the `import` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "Read highways from an OSM PBF extract, repair dangling \
                 references, split ways at shared points and write the \
                 result to SQLite. Paths can come from CLI flags, \
                 configuration files, or environment variables.",
    about = "Import and segment highways from an OSM extract"
)]
#[ortho_config(prefix = "WAYSPLIT")]
struct ImportArgs {
    /// Path to the OpenStreetMap PBF file.
    #[arg(long = ARG_OSM_PBF, value_name = "path")]
    #[serde(default)]
    osm_pbf: Option<Utf8PathBuf>,
    /// Destination SQLite database (defaults to `waysplit.db`).
    #[arg(long = ARG_DATABASE, value_name = "path")]
    #[serde(default)]
    database: Option<Utf8PathBuf>,
    /// Log verbosity: off, error, warn, info, debug or trace.
    #[arg(long = ARG_LOG_LEVEL, value_name = "level")]
    #[serde(default)]
    log_level: Option<String>,
}

impl ImportArgs {
    fn into_config(self) -> Result<ImportConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        ImportConfig::try_from(merged)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct ImportConfig {
    osm_pbf: Utf8PathBuf,
    database: Utf8PathBuf,
    log_level: LevelFilter,
}

impl ImportConfig {
    fn validate_sources(&self) -> Result<(), CliError> {
        Self::require_existing(&self.osm_pbf, ARG_OSM_PBF)
    }

    fn require_existing(path: &Utf8Path, field: &'static str) -> Result<(), CliError> {
        if path.is_file() {
            Ok(())
        } else {
            Err(CliError::MissingSourceFile {
                field,
                path: path.to_path_buf(),
            })
        }
    }
}

impl TryFrom<ImportArgs> for ImportConfig {
    type Error = CliError;

    fn try_from(args: ImportArgs) -> Result<Self, Self::Error> {
        let osm_pbf = args.osm_pbf.ok_or(CliError::MissingArgument {
            field: ARG_OSM_PBF,
            env: ENV_OSM_PBF,
        })?;
        let database = args
            .database
            .unwrap_or_else(|| Utf8PathBuf::from(DEFAULT_DATABASE));
        let log_level = match args.log_level {
            Some(value) => value
                .parse()
                .map_err(|_| CliError::InvalidLogLevel { value })?,
            None => DEFAULT_LOG_LEVEL,
        };
        Ok(Self {
            osm_pbf,
            database,
            log_level,
        })
    }
}

/// Counts gathered across one import run.
#[derive(Debug, Clone, PartialEq)]
struct ImportOutcome {
    ingest: OsmIngestSummary,
    clean: CleanReport,
    persisted: PersistReport,
}

fn run_import(config: &ImportConfig) -> Result<ImportOutcome, CliError> {
    info!("Reading {}", config.osm_pbf);
    let dataset = ingest_osm_pbf(config.osm_pbf.as_std_path())?;
    info!(
        "Read {} nodes, {} ways ({} highways), {} relations",
        dataset.summary.nodes,
        dataset.summary.ways,
        dataset.summary.highways,
        dataset.summary.relations
    );

    let output = run_pipeline(dataset.coords, dataset.ways)?;
    let persisted = persist_topology_to_sqlite(&config.database, &output).map_err(|source| {
        CliError::PersistTopology {
            path: config.database.clone(),
            source,
        }
    })?;
    info!(
        "Wrote {} coords, {} highways, {} segments to {}",
        persisted.coords, persisted.highways, persisted.segments, config.database
    );

    Ok(ImportOutcome {
        ingest: dataset.summary,
        clean: *output.clean_report(),
        persisted,
    })
}

#[cfg(test)]
mod tests;
