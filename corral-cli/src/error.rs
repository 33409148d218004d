//! Error types emitted by the Corral CLI.
//!
//! Keep this error type reasonably small, as many CLI helpers return
//! `Result<_, CliError>` and the workspace enables `clippy::result_large_err`.

use std::sync::Arc;

use camino::Utf8PathBuf;
use corral_core::{ConfigError, EntitySinkError, UnknownSource, UnknownTieBreak};
use corral_data::geocode::NominatimBuildError;
use corral_engine::PipelineError;
use thiserror::Error;

/// Errors emitted by the Corral CLI.
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
        /// Flag name.
        field: &'static str,
        /// Environment variable name.
        env: &'static str,
    },
    /// The tie-break rule is not one the engine knows.
    #[error(transparent)]
    TieBreak(#[from] UnknownTieBreak),
    /// The source ranking names an unknown provider.
    #[error("invalid source ranking: {0}")]
    Ranking(#[from] UnknownSource),
    /// The merged settings failed validation.
    #[error("invalid reconciliation settings: {0}")]
    Settings(#[from] ConfigError),
    /// A referenced input path does not exist on disk.
    #[error("{field} path {path:?} does not exist")]
    MissingSourceFile {
        /// Flag name.
        field: &'static str,
        /// Offending path.
        path: Utf8PathBuf,
    },
    /// A referenced input path exists but is not a file.
    #[error("{field} path {path:?} exists but is not a file")]
    SourcePathNotFile {
        /// Flag name.
        field: &'static str,
        /// Offending path.
        path: Utf8PathBuf,
    },
    /// A referenced input path could not be inspected due to an IO error.
    #[error("failed to inspect {field} path {path:?}: {source}")]
    InspectSourcePath {
        /// Flag name.
        field: &'static str,
        /// Offending path.
        path: Utf8PathBuf,
        /// Underlying failure.
        #[source]
        source: std::io::Error,
    },
    /// Constructing the geocoder failed.
    #[error("failed to build geocoder for {base_url:?}: {source}")]
    BuildGeocoder {
        /// Configured service root.
        base_url: String,
        /// Underlying failure.
        #[source]
        source: NominatimBuildError,
    },
    /// The async runtime could not start.
    #[error("failed to start the async runtime: {0}")]
    Runtime(#[source] std::io::Error),
    /// The reconciliation run failed.
    #[error("reconciliation failed: {0}")]
    Pipeline(#[from] PipelineError),
    /// Writing the merged entities failed.
    #[error("failed to write entities: {0}")]
    WriteEntities(#[from] EntitySinkError),
    /// Writing the run summary failed.
    #[error("failed to write run summary: {0}")]
    WriteSummary(#[source] std::io::Error),
}
