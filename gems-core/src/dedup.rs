//! First-occurrence-wins deduplication by name and proximity.
//!
//! A candidate is a duplicate when its name equals, ignoring case, the name
//! of a place already kept, or when it lies closer than the configured
//! threshold to one. The kept record is never enriched with fields from the
//! duplicates it shadows.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::{Place, distance_km};

/// Tuning for [`dedupe`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DedupConfig {
    /// Places strictly closer than this many kilometres are duplicates.
    pub threshold_km: f64,
}

impl DedupConfig {
    /// Threshold used when merging recommendation files.
    pub const RECOMMENDATION_THRESHOLD_KM: f64 = 0.1;
    /// Threshold used when merging raw OSM extracts.
    pub const OSM_DATABASE_THRESHOLD_KM: f64 = 0.5;

    /// Configuration with the given distance threshold.
    #[must_use]
    pub const fn new(threshold_km: f64) -> Self {
        Self { threshold_km }
    }

    /// Override the distance threshold.
    #[must_use]
    pub const fn with_threshold_km(mut self, threshold_km: f64) -> Self {
        self.threshold_km = threshold_km;
        self
    }
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self::new(Self::RECOMMENDATION_THRESHOLD_KM)
    }
}

/// How a duplicate was recognised.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DuplicateMatch {
    /// Names are equal ignoring case.
    Name,
    /// The places are within the threshold.
    Distance {
        /// Separation in kilometres.
        km: f64,
    },
}

/// A place dropped by [`dedupe_with_report`].
#[derive(Debug, Clone, PartialEq)]
pub struct Duplicate {
    /// The dropped place.
    pub place: Place,
    /// Index, within [`DedupReport::kept`], of the place that shadowed it.
    pub kept_index: usize,
    /// What made the two places match.
    pub matched_by: DuplicateMatch,
}

/// Result of [`dedupe_with_report`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DedupReport {
    /// Unique places in input order.
    pub kept: Vec<Place>,
    /// Input position of each entry in [`DedupReport::kept`].
    pub kept_positions: Vec<usize>,
    /// Dropped places in input order.
    pub duplicates: Vec<Duplicate>,
}

/// Remove duplicates, keeping the first occurrence of each place.
///
/// # Examples
///
/// ```
/// use geo::Coord;
/// use gems_core::{DedupConfig, Place, PlaceKind, dedupe};
///
/// let at = |name: &str, lon: f64| {
///     Place::new(name, name, PlaceKind::new("leisure", "park"), Coord { x: lon, y: 38.0 })
/// };
/// let places = vec![at("Fern Glen", -122.0), at("FERN GLEN", -121.0), at("Oak Knoll", -120.0)];
/// let unique = dedupe(places, &DedupConfig::default());
/// assert_eq!(unique.len(), 2);
/// ```
#[must_use]
pub fn dedupe(places: Vec<Place>, config: &DedupConfig) -> Vec<Place> {
    dedupe_with_report(places, config).kept
}

/// [`dedupe`] that also returns what was dropped and why.
///
/// Comparison is pairwise against every kept place.
#[must_use]
pub fn dedupe_with_report(places: Vec<Place>, config: &DedupConfig) -> DedupReport {
    let mut report = DedupReport::default();
    let mut kept_names: Vec<String> = Vec::new();
    for (position, candidate) in places.into_iter().enumerate() {
        let candidate_name = candidate.name.to_lowercase();
        let found = report
            .kept
            .iter()
            .zip(&kept_names)
            .enumerate()
            .find_map(|(index, (kept, kept_name))| {
                match_against(kept, kept_name, &candidate, &candidate_name, config)
                    .map(|matched_by| (index, matched_by))
            });
        match found {
            Some((kept_index, matched_by)) => {
                debug!(
                    "dropping duplicate {} ({}) shadowed by kept place #{kept_index}: {matched_by:?}",
                    candidate.name, candidate.id
                );
                report.duplicates.push(Duplicate {
                    place: candidate,
                    kept_index,
                    matched_by,
                });
            }
            None => {
                kept_names.push(candidate_name);
                report.kept.push(candidate);
                report.kept_positions.push(position);
            }
        }
    }
    report
}

fn match_against(
    kept: &Place,
    kept_name: &str,
    candidate: &Place,
    candidate_name: &str,
    config: &DedupConfig,
) -> Option<DuplicateMatch> {
    if kept_name == candidate_name {
        return Some(DuplicateMatch::Name);
    }
    let km = distance_km(kept.coordinates, candidate.coordinates);
    (km < config.threshold_km).then_some(DuplicateMatch::Distance { km })
}
