//! Grid-wide sampling of hidden gems.
//!
//! [`GridSampler`] partitions the configured region, fetches every cell in
//! row-major order, filters and normalises the elements, drops low-quality
//! places and caps each cell with a category-balanced sample. Cross-cell
//! deduplication runs only when configured. A failed cell counts as empty
//! and the run carries on.
//!
//! # Example
//!
//! ```
//! use gems_data::fetcher::CachedFetcher;
//! use gems_data::overpass::test_support::StubElementSource;
//! use gems_data::sampler::{GridSampler, SamplerConfig};
//!
//! let config = SamplerConfig::default().with_grid_size(2).with_seed(7);
//! let sampler = GridSampler::new(CachedFetcher::without_cache(StubElementSource::empty()), config)?;
//! let report = sampler.run();
//! assert_eq!(report.total_places, 0);
//! assert_eq!(report.cells_without_places, 4);
//! # Ok::<(), gems_data::sampler::SamplerConfigError>(())
//! ```

mod config;
mod report;

pub use config::{
    DEFAULT_GRID_SIZE, DEFAULT_MIN_PLACES_PER_QUADRANT, DEFAULT_PLACES_PER_CELL,
    NORTHERN_CALIFORNIA, SamplerConfig, SamplerConfigError,
};
pub use report::{CellOutcome, CellStatus, FailedCell, SampleReport, SparseQuadrant};

use gems_core::{
    FilterStats, GridCell, Place, Quadrant, Region, RejectReason, dedupe_with_report, partition,
    quadrant_of_cell, select_balanced,
};
use log::{debug, info, warn};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::fetcher::{CachedFetcher, FetchOutcome};
use crate::normalise::normalise_elements;
use crate::overpass::{ElementSource, OverpassQuery};

/// Drives a sampling run over every grid cell.
#[derive(Debug)]
pub struct GridSampler<S> {
    fetcher: CachedFetcher<S>,
    config: SamplerConfig,
    region: Region,
    cells: Vec<GridCell>,
}

impl<S: ElementSource> GridSampler<S> {
    /// Validate `config` and partition its region.
    ///
    /// Nothing is fetched until [`run`](Self::run).
    ///
    /// # Errors
    /// Returns a [`SamplerConfigError`] when the configuration is invalid.
    pub fn new(fetcher: CachedFetcher<S>, config: SamplerConfig) -> Result<Self, SamplerConfigError> {
        let region = config.validate()?;
        let cells = partition(&region, config.grid_size)?;
        Ok(Self {
            fetcher,
            config,
            region,
            cells,
        })
    }

    /// Validated region.
    #[must_use]
    pub const fn region(&self) -> &Region {
        &self.region
    }

    /// Cells in processing order.
    #[must_use]
    pub fn cells(&self) -> &[GridCell] {
        &self.cells
    }

    /// Run configuration.
    #[must_use]
    pub const fn config(&self) -> &SamplerConfig {
        &self.config
    }

    /// Fetcher used for every cell.
    #[must_use]
    pub const fn fetcher(&self) -> &CachedFetcher<S> {
        &self.fetcher
    }

    /// Sample every cell, seeding the balancer from the configuration.
    pub fn run(&self) -> SampleReport {
        let mut rng = match self.config.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        self.run_with_rng(&mut rng)
    }

    /// Sample every cell using `rng` for balancing.
    pub fn run_with_rng<R: Rng + ?Sized>(&self, rng: &mut R) -> SampleReport {
        info!(
            "sampling {} as a {}x{} grid, up to {} places per cell",
            self.region, self.config.grid_size, self.config.grid_size, self.config.places_per_cell
        );

        let mut stats = FilterStats::default();
        let mut sampled: Vec<(Quadrant, Place)> = Vec::new();
        let mut cells_with_places = 0_usize;
        let mut failed_cells = Vec::new();
        for cell in &self.cells {
            let outcome = self.sample_cell(cell, rng);
            stats.merge(&outcome.stats);
            if let CellStatus::Failed { error } = &outcome.status {
                failed_cells.push(FailedCell {
                    row: outcome.row,
                    col: outcome.col,
                    error: error.to_string(),
                });
            }
            if !outcome.places.is_empty() {
                cells_with_places += 1;
            }
            let quadrant = outcome.quadrant;
            sampled.extend(outcome.places.into_iter().map(|place| (quadrant, place)));
        }

        let (sampled, duplicates_removed) = self.deduplicate(sampled);
        let mut report = SampleReport::tally(self.region, self.config.grid_size, sampled);
        report.filter_stats = stats;
        report.cells_with_places = cells_with_places;
        report.cells_without_places = self.cells.len().saturating_sub(cells_with_places);
        report.failed_cells = failed_cells;
        report.duplicates_removed = duplicates_removed;
        report.flag_sparse(self.config.min_places_per_quadrant);

        for sparse in &report.sparse_quadrants {
            warn!(
                "quadrant {} has only {} places (minimum {})",
                sparse.quadrant, sparse.count, sparse.minimum
            );
        }
        info!(
            "sampled {} places from {} of {} cells ({} rejected, {} low quality, {} duplicates, {} failed cells)",
            report.total_places,
            report.cells_with_places,
            self.cells.len(),
            report.filter_stats.rejected(),
            report.filter_stats.low_quality,
            report.duplicates_removed,
            report.failed_cells.len()
        );
        report
    }

    /// Fetch, filter and cap a single cell.
    pub fn sample_cell<R: Rng + ?Sized>(&self, cell: &GridCell, rng: &mut R) -> CellOutcome {
        let quadrant = quadrant_of_cell(cell, &self.region);
        let query = OverpassQuery::new(cell.bounds, self.config.tags.clone())
            .with_timeout_secs(self.config.query_timeout_secs);
        let mut outcome = CellOutcome {
            row: cell.row,
            col: cell.col,
            quadrant,
            status: CellStatus::Empty,
            stats: FilterStats::default(),
            places: Vec::new(),
        };

        let elements = match self.fetcher.fetch(&query) {
            FetchOutcome::Failed { last_error, .. } => {
                outcome.status = CellStatus::Failed { error: last_error };
                return outcome;
            }
            fetched => fetched.into_elements(),
        };
        if elements.is_empty() {
            debug!("cell ({}, {}) returned no elements", cell.row, cell.col);
            return outcome;
        }

        let (accepted, mut stats) = normalise_elements(&elements);
        let mut candidates = Vec::with_capacity(accepted.len());
        for place in accepted {
            let place = place.with_quality_assessed();
            if place.is_high_quality {
                candidates.push(place);
            } else {
                stats.record(RejectReason::LowQuality);
            }
        }
        let places = if candidates.len() > self.config.places_per_cell {
            select_balanced(candidates, self.config.places_per_cell, rng)
        } else {
            candidates
        };
        debug!(
            "cell ({}, {}) in {quadrant}: {} elements, {} accepted, {} kept",
            cell.row,
            cell.col,
            elements.len(),
            stats.accepted,
            places.len()
        );

        outcome.status = CellStatus::Sampled;
        outcome.stats = stats;
        outcome.places = places;
        outcome
    }

    fn deduplicate(&self, sampled: Vec<(Quadrant, Place)>) -> (Vec<(Quadrant, Place)>, usize) {
        let Some(dedup) = self.config.dedup else {
            return (sampled, 0);
        };
        let (quadrants, places): (Vec<Quadrant>, Vec<Place>) = sampled.into_iter().unzip();
        let report = dedupe_with_report(places, &dedup);
        let duplicates = report.duplicates.len();
        let kept = report
            .kept_positions
            .iter()
            .filter_map(|position| quadrants.get(*position).copied())
            .zip(report.kept)
            .collect();
        (kept, duplicates)
    }
}
