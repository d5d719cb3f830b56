//! Error types emitted by the hidden gems CLI.
//!
//! Keep this error type reasonably small, as many CLI helpers return
//! `Result<_, CliError>` and the workspace enables `clippy::result_large_err`.

use std::sync::Arc;

use camino::Utf8PathBuf;
use gems_data::output::OutputError;
use gems_data::overpass::SourceBuildError;
use gems_data::sampler::SamplerConfigError;
use thiserror::Error;

/// Errors emitted by the hidden gems CLI.
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
        /// Flag name without leading dashes.
        field: &'static str,
        /// Environment variable that can supply the value.
        env: &'static str,
    },
    /// The bounding box could not be parsed.
    #[error("invalid bounding box {value:?}: {reason}")]
    InvalidBbox {
        /// Value as supplied.
        value: String,
        /// What was wrong with it.
        reason: &'static str,
    },
    /// A deduplication threshold is negative or not finite.
    #[error("{field} must be a finite, non-negative distance in kilometres, got {value}")]
    InvalidThreshold {
        /// Flag name without leading dashes.
        field: &'static str,
        /// Offending value.
        value: f64,
    },
    /// The sampling parameters are inconsistent.
    #[error(transparent)]
    SamplerConfig(#[from] SamplerConfigError),
    /// Constructing the Overpass client failed.
    #[error("failed to build Overpass client for {endpoint:?}: {source}")]
    BuildSource {
        /// Endpoint as configured.
        endpoint: String,
        /// Underlying build error.
        #[source]
        source: SourceBuildError,
    },
    /// None of the consolidation inputs could be loaded.
    #[error("none of the {count} input files could be loaded")]
    NothingToConsolidate {
        /// Number of inputs supplied.
        count: usize,
    },
    /// Writing a place file or report failed.
    #[error(transparent)]
    Output(#[from] OutputError),
    /// Writing the run summary failed.
    #[error("failed to write summary: {0}")]
    WriteSummary(#[source] std::io::Error),
    /// An output path names an existing directory.
    #[error("output path {path:?} is a directory")]
    OutputIsDirectory {
        /// Offending path.
        path: Utf8PathBuf,
    },
}
