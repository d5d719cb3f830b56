//! Facade crate for the hidden gems sampler.
//!
//! This crate re-exports the core domain types and, behind the `data`
//! feature, the Overpass-backed sampling pipeline.

#![forbid(unsafe_code)]

pub use gems_core::{
    Category, DedupConfig, FilterStats, GridCell, Place, PlaceKind, Quadrant, Rarity, Region,
    RejectReason, dedupe, distance_km, filter_place, haversine_km, partition, select_balanced,
};

#[cfg(feature = "data")]
pub use gems_data::{
    CachedFetcher, FetchOutcome, GridSampler, HttpOverpassSource, OverpassQuery, SampleReport,
    SamplerConfig, TagSpec, consolidate_files,
};
