//! Error types emitted by the waysplit CLI.
//!
//! Keep this error type reasonably small, as many CLI helpers return
//! `Result<_, CliError>` and the workspace enables `clippy::result_large_err`.

use std::sync::Arc;

use camino::Utf8PathBuf;
use thiserror::Error;
use waysplit_core::SegmentationError;
use waysplit_data::{OsmIngestError, PersistTopologyError};

/// Errors emitted by the waysplit CLI.
#[derive(Debug, Error)]
pub enum CliError {
    /// Provided arguments failed Clap validation.
    #[error(transparent)]
    ArgumentParsing(#[from] clap::Error),
    /// Configuration layering failed (files, env, CLI).
    #[error("failed to load configuration: {0}")]
    Configuration(#[from] Arc<ortho_config::OrthoError>),
    /// A required option is missing after configuration merging.
    #[error("missing {field} (set --{field} or {env})")]
    MissingArgument {
        field: &'static str,
        env: &'static str,
    },
    /// The configured log level is not recognised.
    #[error("unknown log level {value:?}")]
    InvalidLogLevel { value: String },
    /// A referenced input path does not exist on disk or is not a file.
    #[error("{field} path {path:?} does not exist or is not a file")]
    MissingSourceFile {
        field: &'static str,
        path: Utf8PathBuf,
    },
    /// Installing the global logger failed.
    #[error("failed to initialise logging: {0}")]
    InitLogging(#[source] log::SetLoggerError),
    /// OSM ingestion failed.
    #[error("failed to ingest OSM data: {0}")]
    OsmIngest(#[from] OsmIngestError),
    /// The segmenter broke one of its invariants; nothing was written.
    #[error("segmentation aborted: {0}")]
    Segmentation(#[from] SegmentationError),
    /// Persisting the topology to SQLite failed.
    #[error("failed to persist topology to {path:?}: {source}")]
    PersistTopology {
        path: Utf8PathBuf,
        #[source]
        source: PersistTopologyError,
    },
}
