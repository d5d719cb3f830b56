//! Command-line interface for the hidden gems sampling tools.
#![forbid(unsafe_code)]

use clap::{Parser, Subcommand};

mod consolidate;
mod error;
mod sample;

pub use error::CliError;

use consolidate::{ConsolidateArgs, run_consolidate};
use sample::{SampleArgs, run_sample};

pub(crate) const ARG_BBOX: &str = "bbox";
pub(crate) const ARG_GRID_SIZE: &str = "grid-size";
pub(crate) const ARG_PLACES_PER_CELL: &str = "places-per-cell";
pub(crate) const ARG_MIN_PER_QUADRANT: &str = "min-per-quadrant";
pub(crate) const ARG_SEED: &str = "seed";
pub(crate) const ARG_ENDPOINT: &str = "endpoint";
pub(crate) const ARG_TIMEOUT_SECS: &str = "timeout-secs";
pub(crate) const ARG_MAX_ATTEMPTS: &str = "max-attempts";
pub(crate) const ARG_CACHE_DIR: &str = "cache-dir";
pub(crate) const ARG_CACHE_MAX_AGE_HOURS: &str = "cache-max-age-hours";
pub(crate) const ARG_DEDUP_KM: &str = "dedup-km";
pub(crate) const ARG_OUTPUT: &str = "output";
pub(crate) const ARG_REPORT: &str = "report";
pub(crate) const ARG_INPUTS: &str = "inputs";
pub(crate) const ENV_INPUTS: &str = "GEMS_CMDS_CONSOLIDATE_INPUTS";

/// Run the CLI with the current process arguments and environment.
///
/// # Errors
/// Returns [`CliError`] when argument parsing, configuration, sampling
/// setup, or writing the output fails.
pub fn run() -> Result<(), CliError> {
    let cli = Cli::try_parse().map_err(CliError::ArgumentParsing)?;
    match cli.command {
        Command::Sample(args) => run_sample(args),
        Command::Consolidate(args) => run_consolidate(args),
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "gems",
    about = "Sample lesser-known places from OpenStreetMap",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Sample places across a grid laid over a bounding box.
    Sample(SampleArgs),
    /// Merge place files from earlier runs and drop duplicates.
    Consolidate(ConsolidateArgs),
}

#[cfg(test)]
mod tests;
