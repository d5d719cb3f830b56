//! Sample command implementation for the hidden gems CLI.

use std::io::Write;
use std::time::Duration;

use camino::{Utf8Path, Utf8PathBuf};
use clap::Parser;
use gems_core::{DedupConfig, Quadrant};
use gems_data::cache::{DEFAULT_CACHE_DIR, ResponseCache};
use gems_data::fetcher::{CachedFetcher, RetryPolicy};
use gems_data::output::{DEFAULT_OUTPUT_PATH, write_places, write_report};
use gems_data::overpass::{
    DEFAULT_ENDPOINT, ElementSource, HttpOverpassSource, HttpOverpassSourceConfig,
};
use gems_data::sampler::{GridSampler, SampleReport, SamplerConfig};
use log::info;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};

use crate::{
    ARG_BBOX, ARG_CACHE_DIR, ARG_CACHE_MAX_AGE_HOURS, ARG_DEDUP_KM, ARG_ENDPOINT, ARG_GRID_SIZE,
    ARG_MAX_ATTEMPTS, ARG_MIN_PER_QUADRANT, ARG_OUTPUT, ARG_PLACES_PER_CELL, ARG_REPORT, ARG_SEED,
    ARG_TIMEOUT_SECS, CliError,
};

/// Slack added to the server-side timeout before the HTTP client gives up.
const HTTP_TIMEOUT_SLACK: Duration = Duration::from_secs(10);

/// CLI arguments for the `sample` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "Lay a grid over a bounding box, query Overpass once per \
                 cell, drop chains and unnamed places, and keep a \
                 category-balanced sample from every cell. Responses are \
                 cached on disk so interrupted runs resume cheaply.",
    about = "Sample hidden gems across a grid"
)]
#[ortho_config(prefix = "GEMS")]
pub(crate) struct SampleArgs {
    /// Bounding box as `min_lat,min_lon,max_lat,max_lon`.
    #[arg(long = ARG_BBOX, value_name = "bbox", allow_hyphen_values = true)]
    #[serde(default)]
    pub(crate) bbox: Option<String>,
    /// Rows and columns in the grid.
    #[arg(long = ARG_GRID_SIZE, value_name = "n")]
    #[serde(default)]
    pub(crate) grid_size: Option<u32>,
    /// Most places kept from one cell.
    #[arg(long = ARG_PLACES_PER_CELL, value_name = "n")]
    #[serde(default)]
    pub(crate) places_per_cell: Option<usize>,
    /// Quadrant total below which a warning is logged.
    #[arg(long = ARG_MIN_PER_QUADRANT, value_name = "n")]
    #[serde(default)]
    pub(crate) min_per_quadrant: Option<usize>,
    /// Seed for the per-cell sampler.
    #[arg(long = ARG_SEED, value_name = "seed")]
    #[serde(default)]
    pub(crate) seed: Option<u64>,
    /// Overpass interpreter URL.
    #[arg(long = ARG_ENDPOINT, value_name = "url")]
    #[serde(default)]
    pub(crate) endpoint: Option<String>,
    /// Server-side query timeout in seconds.
    #[arg(long = ARG_TIMEOUT_SECS, value_name = "secs")]
    #[serde(default)]
    pub(crate) timeout_secs: Option<u32>,
    /// Attempts per cell before giving up.
    #[arg(long = ARG_MAX_ATTEMPTS, value_name = "n")]
    #[serde(default)]
    pub(crate) max_attempts: Option<u32>,
    /// Directory holding cached Overpass responses.
    #[arg(long = ARG_CACHE_DIR, value_name = "dir")]
    #[serde(default)]
    pub(crate) cache_dir: Option<Utf8PathBuf>,
    /// Ignore cached responses older than this many hours.
    #[arg(long = ARG_CACHE_MAX_AGE_HOURS, value_name = "hours")]
    #[serde(default)]
    pub(crate) cache_max_age_hours: Option<u64>,
    /// Drop places within this many kilometres of one already kept in
    /// another cell. Off unless set; `0` also disables it.
    #[arg(long = ARG_DEDUP_KM, value_name = "km")]
    #[serde(default)]
    pub(crate) dedup_km: Option<f64>,
    /// Destination for the sampled places.
    #[arg(long = ARG_OUTPUT, value_name = "path")]
    #[serde(default)]
    pub(crate) output: Option<Utf8PathBuf>,
    /// Optional destination for the full run report.
    #[arg(long = ARG_REPORT, value_name = "path")]
    #[serde(default)]
    pub(crate) report: Option<Utf8PathBuf>,
}

impl SampleArgs {
    pub(crate) fn into_config(self) -> Result<SampleConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        SampleConfig::try_from(merged)
    }
}

/// Resolved `sample` command configuration.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct SampleConfig {
    /// Grid, quota and deduplication parameters.
    pub(crate) sampler: SamplerConfig,
    /// Overpass interpreter URL.
    pub(crate) endpoint: String,
    /// Client-side request timeout.
    pub(crate) http_timeout: Duration,
    /// Retry schedule for each cell.
    pub(crate) retry: RetryPolicy,
    /// On-disk response cache.
    pub(crate) cache: ResponseCache,
    /// Destination for the sampled places.
    pub(crate) output: Utf8PathBuf,
    /// Destination for the run report, if requested.
    pub(crate) report: Option<Utf8PathBuf>,
}

impl SampleConfig {
    fn require_file_destination(path: &Utf8Path) -> Result<(), CliError> {
        if path.is_dir() {
            Err(CliError::OutputIsDirectory {
                path: path.to_path_buf(),
            })
        } else {
            Ok(())
        }
    }
}

impl TryFrom<SampleArgs> for SampleConfig {
    type Error = CliError;

    fn try_from(args: SampleArgs) -> Result<Self, Self::Error> {
        let mut sampler = SamplerConfig::default();
        if let Some(bbox) = args.bbox.as_deref() {
            sampler = sampler.with_bbox(parse_bbox(bbox)?);
        }
        if let Some(grid_size) = args.grid_size {
            sampler = sampler.with_grid_size(grid_size);
        }
        if let Some(places_per_cell) = args.places_per_cell {
            sampler = sampler.with_places_per_cell(places_per_cell);
        }
        if let Some(minimum) = args.min_per_quadrant {
            sampler = sampler.with_min_places_per_quadrant(minimum);
        }
        if let Some(seed) = args.seed {
            sampler = sampler.with_seed(seed);
        }
        if let Some(secs) = args.timeout_secs {
            sampler = sampler.with_query_timeout_secs(secs);
        }
        if let Some(km) = args.dedup_km {
            let dedup = (km != 0.0).then(|| DedupConfig::new(km));
            sampler = sampler.with_dedup(dedup);
        }
        sampler.validate()?;

        let http_timeout =
            Duration::from_secs(u64::from(sampler.query_timeout_secs)) + HTTP_TIMEOUT_SLACK;
        let retry = args
            .max_attempts
            .map_or_else(RetryPolicy::default, |attempts| {
                RetryPolicy::default().with_max_attempts(attempts)
            });
        let cache_dir = args
            .cache_dir
            .unwrap_or_else(|| Utf8PathBuf::from(DEFAULT_CACHE_DIR));
        let cache = match args.cache_max_age_hours {
            Some(hours) => ResponseCache::new(cache_dir)
                .with_max_age(Duration::from_secs(hours.saturating_mul(3600))),
            None => ResponseCache::new(cache_dir),
        };
        let output = args
            .output
            .unwrap_or_else(|| Utf8PathBuf::from(DEFAULT_OUTPUT_PATH));
        Self::require_file_destination(&output)?;
        if let Some(report) = &args.report {
            Self::require_file_destination(report)?;
        }

        Ok(Self {
            sampler,
            endpoint: args.endpoint.unwrap_or_else(|| DEFAULT_ENDPOINT.to_owned()),
            http_timeout,
            retry,
            cache,
            output,
            report: args.report,
        })
    }
}

/// Parse `min_lat,min_lon,max_lat,max_lon`.
///
/// Range and ordering checks are left to [`SamplerConfig::validate`].
pub(crate) fn parse_bbox(value: &str) -> Result<[f64; 4], CliError> {
    let invalid = |reason| CliError::InvalidBbox {
        value: value.to_owned(),
        reason,
    };
    let parts = value
        .split(',')
        .map(|part| part.trim().parse::<f64>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|_| invalid("every component must be a number"))?;
    <[f64; 4]>::try_from(parts).map_err(|_| invalid("expected min_lat,min_lon,max_lat,max_lon"))
}

/// Builds the Overpass source for the current sample invocation.
pub(super) trait SourceBuilder {
    fn build(&self, config: &SampleConfig) -> Result<Box<dyn ElementSource>, CliError>;
}

pub(super) struct HttpSourceBuilder;

impl SourceBuilder for HttpSourceBuilder {
    fn build(&self, config: &SampleConfig) -> Result<Box<dyn ElementSource>, CliError> {
        let http = HttpOverpassSourceConfig::new(config.endpoint.clone())
            .with_timeout(config.http_timeout);
        let source =
            HttpOverpassSource::with_config(http).map_err(|source| CliError::BuildSource {
                endpoint: config.endpoint.clone(),
                source,
            })?;
        Ok(Box::new(source))
    }
}

pub(super) fn run_sample(args: SampleArgs) -> Result<(), CliError> {
    let mut stdout = std::io::stdout().lock();
    run_sample_with(args, &HttpSourceBuilder, &mut stdout)
}

pub(super) fn run_sample_with(
    args: SampleArgs,
    builder: &dyn SourceBuilder,
    writer: &mut dyn Write,
) -> Result<(), CliError> {
    let config = args.into_config()?;
    let report = execute_sample(&config, builder)?;
    write_places(&config.output, &report.places)?;
    info!("wrote {} places to {}", report.places.len(), config.output);
    if let Some(path) = &config.report {
        write_report(path, &report)?;
        info!("wrote run report to {path}");
    }
    write_summary(writer, &report, &config.output)
}

fn execute_sample(
    config: &SampleConfig,
    builder: &dyn SourceBuilder,
) -> Result<SampleReport, CliError> {
    let source = builder.build(config)?;
    let fetcher =
        CachedFetcher::new(source, config.cache.clone()).with_retry_policy(config.retry);
    let sampler = GridSampler::new(fetcher, config.sampler.clone())?;
    Ok(sampler.run())
}

fn write_summary(
    writer: &mut dyn Write,
    report: &SampleReport,
    output: &Utf8Path,
) -> Result<(), CliError> {
    let quadrants = Quadrant::ALL
        .into_iter()
        .map(|quadrant| format!("{} {}", quadrant.label(), report.quadrant_count(quadrant)))
        .collect::<Vec<_>>()
        .join(", ");
    writeln!(
        writer,
        "sampled {} places ({quadrants}); {} cells empty, {} failed, {} duplicates removed",
        report.total_places,
        report.cells_without_places,
        report.failed_cells.len(),
        report.duplicates_removed,
    )
    .and_then(|()| writeln!(writer, "wrote {output}"))
    .map_err(CliError::WriteSummary)
}

#[cfg(test)]
pub(crate) fn config_from_layers_for_test(
    layers: Vec<ortho_config::MergeLayer<'static>>,
) -> Result<SampleConfig, CliError> {
    let merged = SampleArgs::merge_from_layers(layers).map_err(CliError::from)?;
    SampleConfig::try_from(merged)
}
