//! Data access and sampling pipeline for the hidden gems dataset.
//!
//! Responsibilities:
//! - Query Overpass for tagged elements inside a bounding box.
//! - Cache verbatim responses on disk and retry transient failures.
//! - Normalise raw elements into [`gems_core::Place`] records.
//! - Drive grid-wide sampling and consolidate place files.
//!
//! Boundaries:
//! - Do not encode domain rules (live in `gems-core`).
//! - Network failures never escape [`fetcher::CachedFetcher`]; they surface
//!   as [`fetcher::FetchOutcome::Failed`] and log entries.
//!
//! Invariants:
//! - No global mutable state.
//! - Cache and output files are replaced atomically.

pub mod cache;
pub mod consolidate;
pub mod fetcher;
pub mod normalise;
pub mod output;
pub mod overpass;
pub mod sampler;

pub use cache::{CacheError, ResponseCache};
pub use consolidate::{ConsolidateError, ConsolidationReport, consolidate_files, load_places};
pub use fetcher::{CachedFetcher, FetchOutcome, RetryPolicy};
pub use normalise::{normalise_element, normalise_elements};
pub use output::{OutputError, write_places, write_report};
pub use overpass::{
    ElementSource, FetchError, HttpOverpassSource, HttpOverpassSourceConfig, OverpassQuery,
    RawElement, TagSpec,
};
pub use sampler::{
    CellOutcome, CellStatus, GridSampler, SampleReport, SamplerConfig, SamplerConfigError,
    SparseQuadrant,
};
