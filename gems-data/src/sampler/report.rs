//! Per-cell outcomes and the end-of-run report.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use gems_core::{Category, FilterStats, Place, Quadrant, Region};
use serde::{Deserialize, Serialize};

use crate::overpass::FetchError;

/// How a cell's fetch went.
#[derive(Debug, Clone, PartialEq)]
pub enum CellStatus {
    /// The source returned no elements.
    Empty,
    /// Elements were returned and filtered.
    Sampled,
    /// Every fetch attempt failed; counted as zero results.
    Failed {
        /// Error from the final attempt.
        error: FetchError,
    },
}

/// Result of sampling one grid cell.
#[derive(Debug, Clone, PartialEq)]
pub struct CellOutcome {
    /// Row index, counted northwards.
    pub row: u32,
    /// Column index, counted eastwards.
    pub col: u32,
    /// Quadrant of the cell's centroid.
    pub quadrant: Quadrant,
    /// Fetch status.
    pub status: CellStatus,
    /// Filter tallies for the cell's elements.
    pub stats: FilterStats,
    /// Places selected from the cell.
    pub places: Vec<Place>,
}

/// A cell whose fetch failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedCell {
    /// Row index.
    pub row: u32,
    /// Column index.
    pub col: u32,
    /// Rendered error from the final attempt.
    pub error: String,
}

/// A quadrant with fewer places than the configured minimum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SparseQuadrant {
    /// The quadrant.
    pub quadrant: Quadrant,
    /// Places found there.
    pub count: usize,
    /// Configured minimum.
    pub minimum: usize,
}

/// Everything a grid sampling run produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleReport {
    /// Places in [`SampleReport::places`].
    pub total_places: usize,
    /// When the run finished.
    pub sample_date: DateTime<Utc>,
    /// Sampled region.
    pub region: Region,
    /// Rows and columns in the grid.
    pub grid_size: u32,
    /// Places per quadrant; every quadrant is present.
    pub quadrant_counts: BTreeMap<Quadrant, usize>,
    /// Places per category within each quadrant.
    pub quadrant_category_counts: BTreeMap<Quadrant, BTreeMap<Category, usize>>,
    /// Places per category.
    pub category_counts: BTreeMap<Category, usize>,
    /// Places per `key:value` type.
    pub subcategory_counts: BTreeMap<String, usize>,
    /// Filter tallies merged across cells.
    pub filter_stats: FilterStats,
    /// Cells contributing at least one place.
    pub cells_with_places: usize,
    /// Cells contributing nothing.
    pub cells_without_places: usize,
    /// Cells whose fetch failed.
    #[serde(default)]
    pub failed_cells: Vec<FailedCell>,
    /// Places dropped by cross-cell deduplication.
    #[serde(default)]
    pub duplicates_removed: usize,
    /// Quadrants below the configured minimum.
    pub sparse_quadrants: Vec<SparseQuadrant>,
    /// The sampled places.
    pub places: Vec<Place>,
}

impl SampleReport {
    /// Tally `places`, each tagged with its cell's quadrant.
    pub(crate) fn tally(region: Region, grid_size: u32, places: Vec<(Quadrant, Place)>) -> Self {
        let mut quadrant_counts: BTreeMap<Quadrant, usize> =
            Quadrant::ALL.iter().map(|quadrant| (*quadrant, 0)).collect();
        let mut quadrant_category_counts: BTreeMap<Quadrant, BTreeMap<Category, usize>> =
            BTreeMap::new();
        let mut category_counts: BTreeMap<Category, usize> = BTreeMap::new();
        let mut subcategory_counts: BTreeMap<String, usize> = BTreeMap::new();

        let mut kept = Vec::with_capacity(places.len());
        for (quadrant, place) in places {
            bump(quadrant_counts.entry(quadrant).or_default());
            bump(
                quadrant_category_counts
                    .entry(quadrant)
                    .or_default()
                    .entry(place.category)
                    .or_default(),
            );
            bump(category_counts.entry(place.category).or_default());
            bump(subcategory_counts.entry(place.kind.to_string()).or_default());
            kept.push(place);
        }

        Self {
            total_places: kept.len(),
            sample_date: Utc::now(),
            region,
            grid_size,
            quadrant_counts,
            quadrant_category_counts,
            category_counts,
            subcategory_counts,
            filter_stats: FilterStats::default(),
            cells_with_places: 0,
            cells_without_places: 0,
            failed_cells: Vec::new(),
            duplicates_removed: 0,
            sparse_quadrants: Vec::new(),
            places: kept,
        }
    }

    /// Record quadrants whose count is below `minimum`.
    pub(crate) fn flag_sparse(&mut self, minimum: usize) {
        self.sparse_quadrants = self
            .quadrant_counts
            .iter()
            .filter(|(_, count)| **count < minimum)
            .map(|(quadrant, count)| SparseQuadrant {
                quadrant: *quadrant,
                count: *count,
                minimum,
            })
            .collect();
    }

    /// Count for `quadrant`.
    #[must_use]
    pub fn quadrant_count(&self, quadrant: Quadrant) -> usize {
        self.quadrant_counts.get(&quadrant).copied().unwrap_or(0)
    }

    /// The `n` most common types, most frequent first, ties by name.
    #[must_use]
    pub fn top_subcategories(&self, n: usize) -> Vec<(&str, usize)> {
        let mut ranked: Vec<(&str, usize)> = self
            .subcategory_counts
            .iter()
            .map(|(kind, count)| (kind.as_str(), *count))
            .collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        ranked.truncate(n);
        ranked
    }
}

fn bump(counter: &mut usize) {
    *counter = counter.saturating_add(1);
}

#[cfg(test)]
mod tests {
    use super::*;
    use gems_core::test_support::place;
    use rstest::{fixture, rstest};

    #[fixture]
    fn region() -> Region {
        Region::new(0.0, 0.0, 2.0, 2.0).expect("valid region")
    }

    fn tallied(region: Region) -> SampleReport {
        SampleReport::tally(
            region,
            2,
            vec![
                (Quadrant::SouthWest, place("node/1", "Lone Oak", ("leisure", "park"), 0.5, 0.5)),
                (Quadrant::SouthWest, place("node/2", "Bell Rock", ("leisure", "park"), 0.6, 0.6)),
                (Quadrant::NorthEast, place("node/3", "Tin Shed", ("amenity", "cafe"), 1.5, 1.5)),
                (Quadrant::NorthEast, place("node/4", "Gull Point", ("tourism", "viewpoint"), 1.6, 1.6)),
            ],
        )
    }

    #[rstest]
    fn every_quadrant_is_reported(region: Region) {
        let report = tallied(region);
        assert_eq!(report.total_places, 4);
        assert_eq!(report.quadrant_counts.len(), 4);
        assert_eq!(report.quadrant_count(Quadrant::SouthWest), 2);
        assert_eq!(report.quadrant_count(Quadrant::NorthWest), 0);
        assert_eq!(report.quadrant_count(Quadrant::NorthEast), 2);
    }

    #[rstest]
    fn categories_are_counted_per_quadrant(region: Region) {
        let report = tallied(region);
        let north_east = report
            .quadrant_category_counts
            .get(&Quadrant::NorthEast)
            .expect("north-east tallies");
        assert_eq!(north_east.get(&Category::Amenity), Some(&1));
        assert_eq!(north_east.get(&Category::Tourism), Some(&1));
        assert_eq!(report.category_counts.get(&Category::Leisure), Some(&2));
    }

    #[rstest]
    fn top_subcategories_rank_by_count_then_name(region: Region) {
        let report = tallied(region);
        assert_eq!(
            report.top_subcategories(2),
            vec![("leisure:park", 2), ("amenity:cafe", 1)]
        );
    }

    #[rstest]
    fn sparse_quadrants_fall_below_minimum(region: Region) {
        let mut report = tallied(region);
        report.flag_sparse(2);
        let sparse: Vec<_> = report.sparse_quadrants.iter().map(|s| s.quadrant).collect();
        assert_eq!(sparse, vec![Quadrant::SouthEast, Quadrant::NorthWest]);
        assert!(report.sparse_quadrants.iter().all(|s| s.count == 0 && s.minimum == 2));
    }

    #[rstest]
    fn report_serialises_with_compass_keys(region: Region) {
        let report = tallied(region);
        let json = serde_json::to_value(&report).expect("serialise");
        assert_eq!(json["quadrant_counts"]["SW"], 2);
        assert_eq!(json["category_counts"]["leisure"], 2);
        assert_eq!(json["region"], serde_json::json!([0.0, 0.0, 2.0, 2.0]));
        let back: SampleReport = serde_json::from_value(json).expect("deserialise");
        assert_eq!(back, report);
    }
}
