//! Domain logic for the hidden gems sampling pipeline.
//!
//! Everything here is pure: regions and grids, great-circle distance, the
//! normalised [`Place`] record, name filters, filtering statistics,
//! balanced sampling and deduplication. Network and filesystem concerns
//! live in `gems-data`.
#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod balance;
pub mod dedup;
pub mod distance;
pub mod filter;
pub mod grid;
pub mod place;
pub mod rarity;
pub mod stats;

#[cfg(any(test, feature = "test-support"))]
#[cfg_attr(docsrs, doc(cfg(feature = "test-support")))]
pub mod test_support;

pub use balance::{select_balanced, select_balanced_by};
pub use dedup::{DedupConfig, DedupReport, Duplicate, DuplicateMatch, dedupe, dedupe_with_report};
pub use distance::{EARTH_RADIUS_KM, distance_km, haversine_km};
pub use filter::{
    AMBIGUOUS_BRANDS, CHAIN_GROUPS, FilterDecision, FilterReason, all_chains, filter_name, filter_place,
    is_chain_establishment, is_unnamed_place, matched_chain,
};
pub use grid::{
    GridCell, GridError, Quadrant, Region, RegionError, partition, quadrant_of, quadrant_of_cell,
};
pub use place::{Category, PRIORITY_KEYS, Place, PlaceKind, Tags, validated_coord};
pub use rarity::Rarity;
pub use stats::{FilterStats, RejectReason};
