//! Grid sampling parameters and their validation.

use gems_core::{DedupConfig, GridError, Region, RegionError};
use thiserror::Error;

use crate::overpass::{OverpassQuery, TagSpec};

/// Northern California, `[min_lat, min_lon, max_lat, max_lon]`.
pub const NORTHERN_CALIFORNIA: [f64; 4] = [
    37.336_962_631_031_504,
    -124.109_534_458_580_7,
    41.747_462_173_453_73,
    -118.282_223_026_246_24,
];

/// Default number of rows and columns.
pub const DEFAULT_GRID_SIZE: u32 = 16;

/// Default cap on places kept from one cell.
pub const DEFAULT_PLACES_PER_CELL: usize = 10;

/// Default quadrant total below which a quadrant is reported as sparse.
pub const DEFAULT_MIN_PLACES_PER_QUADRANT: usize = 100;

/// Errors raised by [`SamplerConfig::validate`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SamplerConfigError {
    /// The bounding box is malformed.
    #[error("invalid sampling region: {0}")]
    Region(#[from] RegionError),
    /// The grid has no cells.
    #[error("invalid sampling grid: {0}")]
    Grid(#[from] GridError),
    /// No places may be kept from any cell.
    #[error("places per cell must be at least 1")]
    ZeroPlacesPerCell,
    /// The tag specification selects nothing.
    #[error("tag specification must name at least one key")]
    EmptyTagSpec,
    /// The deduplication threshold is negative or not finite.
    #[error("deduplication threshold must be a finite, non-negative distance, got {value}")]
    InvalidDedupThreshold {
        /// Offending threshold in kilometres.
        value: f64,
    },
}

/// Parameters for a [`GridSampler`](super::GridSampler) run.
#[derive(Debug, Clone, PartialEq)]
pub struct SamplerConfig {
    /// Region to sample, `[min_lat, min_lon, max_lat, max_lon]`.
    pub bbox: [f64; 4],
    /// Rows and columns in the grid.
    pub grid_size: u32,
    /// Most places kept from one cell.
    pub places_per_cell: usize,
    /// Quadrant total below which a warning is reported.
    pub min_places_per_quadrant: usize,
    /// Tags requested from every cell.
    pub tags: TagSpec,
    /// Server-side query timeout in seconds.
    pub query_timeout_secs: u32,
    /// Seed for the balancing sampler; `None` draws one from the OS.
    pub seed: Option<u64>,
    /// Cross-cell deduplication; `None`, the default, keeps every sampled
    /// place.
    pub dedup: Option<DedupConfig>,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            bbox: NORTHERN_CALIFORNIA,
            grid_size: DEFAULT_GRID_SIZE,
            places_per_cell: DEFAULT_PLACES_PER_CELL,
            min_places_per_quadrant: DEFAULT_MIN_PLACES_PER_QUADRANT,
            tags: TagSpec::points_of_interest(),
            query_timeout_secs: OverpassQuery::DEFAULT_TIMEOUT_SECS,
            seed: None,
            dedup: None,
        }
    }
}

impl SamplerConfig {
    /// Set the region.
    #[must_use]
    pub fn with_bbox(mut self, bbox: [f64; 4]) -> Self {
        self.bbox = bbox;
        self
    }

    /// Set the grid size.
    #[must_use]
    pub fn with_grid_size(mut self, grid_size: u32) -> Self {
        self.grid_size = grid_size;
        self
    }

    /// Set the per-cell cap.
    #[must_use]
    pub fn with_places_per_cell(mut self, places_per_cell: usize) -> Self {
        self.places_per_cell = places_per_cell;
        self
    }

    /// Set the sparse-quadrant threshold.
    #[must_use]
    pub fn with_min_places_per_quadrant(mut self, minimum: usize) -> Self {
        self.min_places_per_quadrant = minimum;
        self
    }

    /// Set the requested tags.
    #[must_use]
    pub fn with_tags(mut self, tags: TagSpec) -> Self {
        self.tags = tags;
        self
    }

    /// Set the server-side query timeout.
    #[must_use]
    pub fn with_query_timeout_secs(mut self, secs: u32) -> Self {
        self.query_timeout_secs = secs;
        self
    }

    /// Fix the sampler seed.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Set or disable cross-cell deduplication.
    #[must_use]
    pub fn with_dedup(mut self, dedup: Option<DedupConfig>) -> Self {
        self.dedup = dedup;
        self
    }

    /// Check every parameter and return the validated region.
    ///
    /// # Errors
    /// Returns the first [`SamplerConfigError`] found.
    ///
    /// # Examples
    ///
    /// ```
    /// use gems_data::sampler::{SamplerConfig, SamplerConfigError};
    ///
    /// assert!(SamplerConfig::default().validate().is_ok());
    /// let err = SamplerConfig::default().with_places_per_cell(0).validate();
    /// assert_eq!(err, Err(SamplerConfigError::ZeroPlacesPerCell));
    /// ```
    pub fn validate(&self) -> Result<Region, SamplerConfigError> {
        let region = Region::from_bbox(self.bbox)?;
        if self.grid_size == 0 {
            return Err(GridError::EmptyGrid.into());
        }
        if self.places_per_cell == 0 {
            return Err(SamplerConfigError::ZeroPlacesPerCell);
        }
        if self.tags.is_empty() {
            return Err(SamplerConfigError::EmptyTagSpec);
        }
        if let Some(dedup) = self.dedup {
            let value = dedup.threshold_km;
            if !value.is_finite() || value < 0.0 {
                return Err(SamplerConfigError::InvalidDedupThreshold { value });
            }
        }
        Ok(region)
    }
}
