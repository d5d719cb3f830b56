//! Consolidate command implementation for the hidden gems CLI.

use std::io::Write;

use camino::Utf8PathBuf;
use clap::Parser;
use gems_core::DedupConfig;
use gems_data::consolidate::{ConsolidationReport, consolidate_files};
use gems_data::output::{DEFAULT_OUTPUT_PATH, write_places};
use log::info;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};

use crate::{ARG_DEDUP_KM, ARG_INPUTS, ARG_OUTPUT, CliError, ENV_INPUTS};

/// CLI arguments for the `consolidate` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "Load place arrays or run reports written by earlier \
                 runs, keep the first occurrence of every place, and write \
                 the merged list. Unreadable inputs are skipped with a \
                 warning.",
    about = "Merge and deduplicate place files"
)]
#[ortho_config(prefix = "GEMS")]
pub(crate) struct ConsolidateArgs {
    /// Place files to merge, in priority order.
    #[arg(value_name = "path")]
    #[serde(default)]
    pub(crate) inputs: Vec<Utf8PathBuf>,
    /// Destination for the merged places.
    #[arg(long = ARG_OUTPUT, value_name = "path")]
    #[serde(default)]
    pub(crate) output: Option<Utf8PathBuf>,
    /// Places closer than this many kilometres are duplicates.
    #[arg(long = ARG_DEDUP_KM, value_name = "km")]
    #[serde(default)]
    pub(crate) dedup_km: Option<f64>,
}

impl ConsolidateArgs {
    pub(crate) fn into_config(self) -> Result<ConsolidateConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        ConsolidateConfig::try_from(merged)
    }
}

/// Resolved `consolidate` command configuration.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ConsolidateConfig {
    pub(crate) inputs: Vec<Utf8PathBuf>,
    pub(crate) output: Utf8PathBuf,
    pub(crate) dedup: DedupConfig,
}

impl TryFrom<ConsolidateArgs> for ConsolidateConfig {
    type Error = CliError;

    fn try_from(args: ConsolidateArgs) -> Result<Self, Self::Error> {
        if args.inputs.is_empty() {
            return Err(CliError::MissingArgument {
                field: ARG_INPUTS,
                env: ENV_INPUTS,
            });
        }
        let dedup = match args.dedup_km {
            Some(value) if !value.is_finite() || value < 0.0 => {
                return Err(CliError::InvalidThreshold {
                    field: ARG_DEDUP_KM,
                    value,
                });
            }
            Some(value) => DedupConfig::new(value),
            None => DedupConfig::default(),
        };
        let output = args
            .output
            .unwrap_or_else(|| Utf8PathBuf::from(DEFAULT_OUTPUT_PATH));
        if output.is_dir() {
            return Err(CliError::OutputIsDirectory { path: output });
        }
        Ok(Self {
            inputs: args.inputs,
            output,
            dedup,
        })
    }
}

pub(super) fn run_consolidate(args: ConsolidateArgs) -> Result<(), CliError> {
    let mut stdout = std::io::stdout().lock();
    run_consolidate_with(args, &mut stdout)
}

pub(super) fn run_consolidate_with(
    args: ConsolidateArgs,
    writer: &mut dyn Write,
) -> Result<(), CliError> {
    let config = args.into_config()?;
    let report = consolidate_files(&config.inputs, &config.dedup);
    if report.files_read == 0 {
        return Err(CliError::NothingToConsolidate {
            count: config.inputs.len(),
        });
    }
    write_places(&config.output, &report.places)?;
    info!("wrote {} places to {}", report.places.len(), config.output);
    write_summary(writer, &report, &config)
}

fn write_summary(
    writer: &mut dyn Write,
    report: &ConsolidationReport,
    config: &ConsolidateConfig,
) -> Result<(), CliError> {
    writeln!(
        writer,
        "kept {} of {} places from {} files ({} duplicates removed, {} files skipped)",
        report.places.len(),
        report.places_loaded,
        report.files_read,
        report.duplicates_removed,
        report.files_skipped.len(),
    )
    .and_then(|()| writeln!(writer, "wrote {}", config.output))
    .map_err(CliError::WriteSummary)
}

#[cfg(test)]
pub(crate) fn config_from_layers_for_test(
    layers: Vec<ortho_config::MergeLayer<'static>>,
) -> Result<ConsolidateConfig, CliError> {
    let merged = ConsolidateArgs::merge_from_layers(layers).map_err(CliError::from)?;
    ConsolidateConfig::try_from(merged)
}
