//! Sampling regions, grid partitioning and quadrant classification.
//!
//! A [`Region`] is a validated latitude/longitude bounding box. [`partition`]
//! splits it into an `N × N` grid of [`GridCell`] values in row-major order,
//! starting from the south-west corner. [`quadrant_of`] assigns points to one
//! of four [`Quadrant`]s around the region's midpoint for balance reporting.

use std::fmt;

use geo::Coord;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// An axis-aligned latitude/longitude bounding box.
///
/// Bounds are stored in the `[min_lat, min_lon, max_lat, max_lon]` order used
/// on the wire. Construction guarantees finite values inside the WGS84 ranges
/// and a non-empty span on both axes.
///
/// # Examples
///
/// ```
/// use gems_core::Region;
///
/// # fn main() -> Result<(), gems_core::RegionError> {
/// let region = Region::new(37.0, -124.0, 42.0, -118.0)?;
/// assert_eq!(region.midpoint().y, 39.5);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(into = "[f64; 4]", try_from = "[f64; 4]")]
pub struct Region {
    min_lat: f64,
    min_lon: f64,
    max_lat: f64,
    max_lon: f64,
}

/// Errors returned by [`Region::new`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RegionError {
    /// One of the bounds was NaN or infinite.
    #[error("region bounds must be finite")]
    NonFinite,
    /// A latitude bound fell outside `[-90, 90]`.
    #[error("latitude {value} is outside [-90, 90]")]
    LatitudeOutOfRange {
        /// Offending latitude.
        value: f64,
    },
    /// A longitude bound fell outside `[-180, 180]`.
    #[error("longitude {value} is outside [-180, 180]")]
    LongitudeOutOfRange {
        /// Offending longitude.
        value: f64,
    },
    /// The southern bound was not strictly below the northern bound.
    #[error("minimum latitude {min} must be below maximum latitude {max}")]
    EmptyLatitudeSpan {
        /// Southern bound.
        min: f64,
        /// Northern bound.
        max: f64,
    },
    /// The western bound was not strictly below the eastern bound.
    #[error("minimum longitude {min} must be below maximum longitude {max}")]
    EmptyLongitudeSpan {
        /// Western bound.
        min: f64,
        /// Eastern bound.
        max: f64,
    },
}

impl Region {
    /// Validate and construct a region.
    ///
    /// # Errors
    /// Returns [`RegionError`] when a bound is not finite, outside the WGS84
    /// range, or when either span is empty.
    pub fn new(min_lat: f64, min_lon: f64, max_lat: f64, max_lon: f64) -> Result<Self, RegionError> {
        let bounds = [min_lat, min_lon, max_lat, max_lon];
        if bounds.iter().any(|value| !value.is_finite()) {
            return Err(RegionError::NonFinite);
        }
        for value in [min_lat, max_lat] {
            if !(-90.0..=90.0).contains(&value) {
                return Err(RegionError::LatitudeOutOfRange { value });
            }
        }
        for value in [min_lon, max_lon] {
            if !(-180.0..=180.0).contains(&value) {
                return Err(RegionError::LongitudeOutOfRange { value });
            }
        }
        if min_lat >= max_lat {
            return Err(RegionError::EmptyLatitudeSpan {
                min: min_lat,
                max: max_lat,
            });
        }
        if min_lon >= max_lon {
            return Err(RegionError::EmptyLongitudeSpan {
                min: min_lon,
                max: max_lon,
            });
        }
        Ok(Self {
            min_lat,
            min_lon,
            max_lat,
            max_lon,
        })
    }

    /// Construct a region from `[min_lat, min_lon, max_lat, max_lon]`.
    ///
    /// # Errors
    /// See [`Region::new`].
    pub fn from_bbox(bbox: [f64; 4]) -> Result<Self, RegionError> {
        let [min_lat, min_lon, max_lat, max_lon] = bbox;
        Self::new(min_lat, min_lon, max_lat, max_lon)
    }

    /// Bounds as `[min_lat, min_lon, max_lat, max_lon]`.
    #[must_use]
    pub const fn to_bbox(&self) -> [f64; 4] {
        [self.min_lat, self.min_lon, self.max_lat, self.max_lon]
    }

    /// Southern bound.
    #[must_use]
    pub const fn min_lat(&self) -> f64 {
        self.min_lat
    }

    /// Western bound.
    #[must_use]
    pub const fn min_lon(&self) -> f64 {
        self.min_lon
    }

    /// Northern bound.
    #[must_use]
    pub const fn max_lat(&self) -> f64 {
        self.max_lat
    }

    /// Eastern bound.
    #[must_use]
    pub const fn max_lon(&self) -> f64 {
        self.max_lon
    }

    /// Centre of the box with `x = longitude` and `y = latitude`.
    #[must_use]
    #[expect(
        clippy::float_arithmetic,
        reason = "the midpoint is the mean of the opposing bounds"
    )]
    pub fn midpoint(&self) -> Coord {
        Coord {
            x: (self.min_lon + self.max_lon) / 2.0,
            y: (self.min_lat + self.max_lat) / 2.0,
        }
    }

    /// Whether `point` lies inside the box. Edges count as inside.
    #[must_use]
    pub fn contains(&self, point: Coord) -> bool {
        (self.min_lon..=self.max_lon).contains(&point.x)
            && (self.min_lat..=self.max_lat).contains(&point.y)
    }
}

impl From<Region> for [f64; 4] {
    fn from(region: Region) -> Self {
        region.to_bbox()
    }
}

impl TryFrom<[f64; 4]> for Region {
    type Error = RegionError;

    fn try_from(bbox: [f64; 4]) -> Result<Self, Self::Error> {
        Self::from_bbox(bbox)
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{:.4}, {:.4}, {:.4}, {:.4}]",
            self.min_lat, self.min_lon, self.max_lat, self.max_lon
        )
    }
}

/// One cell of a partitioned [`Region`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridCell {
    /// Row index counted northwards from the southern edge.
    pub row: u32,
    /// Column index counted eastwards from the western edge.
    pub col: u32,
    /// Bounds of the cell.
    pub bounds: Region,
}

impl GridCell {
    /// Centre of the cell.
    #[must_use]
    pub fn centroid(&self) -> Coord {
        self.bounds.midpoint()
    }
}

/// Errors returned by [`partition`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GridError {
    /// A grid needs at least one row and one column.
    #[error("grid size must be at least 1")]
    EmptyGrid,
}

/// Split `region` into `grid_size²` cells in row-major order.
///
/// Steps are uniform on both axes. The outermost row and column take the
/// region's own northern and eastern bounds, so the cells tile the region
/// exactly and neighbouring cells share their edge coordinate.
///
/// # Errors
/// Returns [`GridError::EmptyGrid`] when `grid_size` is zero.
///
/// # Examples
///
/// ```
/// use gems_core::{Region, partition};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let region = Region::new(0.0, 0.0, 2.0, 2.0)?;
/// let cells = partition(&region, 2)?;
/// assert_eq!(cells.len(), 4);
/// assert_eq!(cells[1].bounds.min_lon(), 1.0);
/// # Ok(())
/// # }
/// ```
pub fn partition(region: &Region, grid_size: u32) -> Result<Vec<GridCell>, GridError> {
    if grid_size == 0 {
        return Err(GridError::EmptyGrid);
    }
    let cell_count = u64::from(grid_size).saturating_mul(u64::from(grid_size));
    let mut cells = Vec::with_capacity(usize::try_from(cell_count).unwrap_or(usize::MAX));
    for row in 0..grid_size {
        let south = grid_edge(region.min_lat, region.max_lat, grid_size, row);
        let north = grid_edge(region.min_lat, region.max_lat, grid_size, row + 1);
        for col in 0..grid_size {
            let west = grid_edge(region.min_lon, region.max_lon, grid_size, col);
            let east = grid_edge(region.min_lon, region.max_lon, grid_size, col + 1);
            cells.push(GridCell {
                row,
                col,
                bounds: Region {
                    min_lat: south,
                    min_lon: west,
                    max_lat: north,
                    max_lon: east,
                },
            });
        }
    }
    Ok(cells)
}

#[expect(
    clippy::float_arithmetic,
    reason = "grid edges are offsets of a uniform step"
)]
fn grid_edge(min: f64, max: f64, grid_size: u32, index: u32) -> f64 {
    if index >= grid_size {
        return max;
    }
    let step = (max - min) / f64::from(grid_size);
    min + step * f64::from(index)
}

/// One of four partitions around a region's midpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Quadrant {
    /// South of and west of the midpoint.
    #[serde(rename = "SW")]
    SouthWest,
    /// South of the midpoint, on or east of it.
    #[serde(rename = "SE")]
    SouthEast,
    /// On or north of the midpoint, west of it.
    #[serde(rename = "NW")]
    NorthWest,
    /// On or north of and on or east of the midpoint.
    #[serde(rename = "NE")]
    NorthEast,
}

impl Quadrant {
    /// Every quadrant in reporting order.
    pub const ALL: [Self; 4] = [
        Self::SouthWest,
        Self::SouthEast,
        Self::NorthWest,
        Self::NorthEast,
    ];

    /// Two-letter compass label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::SouthWest => "SW",
            Self::SouthEast => "SE",
            Self::NorthWest => "NW",
            Self::NorthEast => "NE",
        }
    }
}

impl fmt::Display for Quadrant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Classify `point` against the midpoint of `region`.
///
/// A point exactly on the midpoint latitude counts as north and one exactly
/// on the midpoint longitude counts as east.
#[must_use]
pub fn quadrant_of(point: Coord, region: &Region) -> Quadrant {
    let mid = region.midpoint();
    match (point.y >= mid.y, point.x >= mid.x) {
        (true, true) => Quadrant::NorthEast,
        (true, false) => Quadrant::NorthWest,
        (false, true) => Quadrant::SouthEast,
        (false, false) => Quadrant::SouthWest,
    }
}

/// Classify a cell by its centroid.
#[must_use]
pub fn quadrant_of_cell(cell: &GridCell, region: &Region) -> Quadrant {
    quadrant_of(cell.centroid(), region)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};

    #[fixture]
    fn unit_square() -> Region {
        Region::new(0.0, 0.0, 1.0, 1.0).expect("valid region")
    }

    #[rstest]
    #[case(1.0, 0.0, 0.0, 1.0, RegionError::EmptyLatitudeSpan { min: 1.0, max: 0.0 })]
    #[case(0.0, 1.0, 1.0, 1.0, RegionError::EmptyLongitudeSpan { min: 1.0, max: 1.0 })]
    #[case(-91.0, 0.0, 1.0, 1.0, RegionError::LatitudeOutOfRange { value: -91.0 })]
    #[case(0.0, 0.0, 1.0, 181.0, RegionError::LongitudeOutOfRange { value: 181.0 })]
    #[case(f64::NAN, 0.0, 1.0, 1.0, RegionError::NonFinite)]
    fn region_rejects_invalid_bounds(
        #[case] min_lat: f64,
        #[case] min_lon: f64,
        #[case] max_lat: f64,
        #[case] max_lon: f64,
        #[case] expected: RegionError,
    ) {
        let err = Region::new(min_lat, min_lon, max_lat, max_lon).expect_err("invalid region");
        assert_eq!(err, expected);
    }

    #[rstest]
    fn region_serialises_as_bbox_array(unit_square: Region) {
        let json = serde_json::to_string(&unit_square).expect("serialise region");
        assert_eq!(json, "[0.0,0.0,1.0,1.0]");
        let parsed: Region = serde_json::from_str(&json).expect("parse region");
        assert_eq!(parsed, unit_square);
        assert!(serde_json::from_str::<Region>("[1.0,0.0,0.0,1.0]").is_err());
    }

    #[rstest]
    fn partition_rejects_zero(unit_square: Region) {
        assert_eq!(partition(&unit_square, 0), Err(GridError::EmptyGrid));
    }

    #[rstest]
    fn partition_is_row_major_from_south_west(unit_square: Region) {
        let cells = partition(&unit_square, 2).expect("grid");
        let indices: Vec<_> = cells.iter().map(|cell| (cell.row, cell.col)).collect();
        assert_eq!(indices, vec![(0, 0), (0, 1), (1, 0), (1, 1)]);

        let first = cells.first().expect("first cell");
        assert_eq!(first.bounds.to_bbox(), [0.0, 0.0, 0.5, 0.5]);
        let last = cells.last().expect("last cell");
        assert_eq!(last.bounds.to_bbox(), [0.5, 0.5, 1.0, 1.0]);
    }

    #[rstest]
    #[expect(clippy::float_cmp, reason = "outer edges are copied, not computed")]
    fn outer_cells_snap_to_region_edges() {
        let region = Region::new(37.3, -124.1, 41.7, -118.3).expect("valid region");
        let cells = partition(&region, 7).expect("grid");
        let max_lat = cells.iter().map(|c| c.bounds.max_lat()).fold(f64::MIN, f64::max);
        let max_lon = cells.iter().map(|c| c.bounds.max_lon()).fold(f64::MIN, f64::max);
        assert_eq!(max_lat, region.max_lat());
        assert_eq!(max_lon, region.max_lon());
    }

    #[rstest]
    #[case(Coord { x: 0.25, y: 0.25 }, Quadrant::SouthWest)]
    #[case(Coord { x: 0.75, y: 0.25 }, Quadrant::SouthEast)]
    #[case(Coord { x: 0.25, y: 0.75 }, Quadrant::NorthWest)]
    #[case(Coord { x: 0.75, y: 0.75 }, Quadrant::NorthEast)]
    #[case(Coord { x: 0.5, y: 0.5 }, Quadrant::NorthEast)]
    #[case(Coord { x: 0.25, y: 0.5 }, Quadrant::NorthWest)]
    #[case(Coord { x: 0.5, y: 0.25 }, Quadrant::SouthEast)]
    fn quadrant_ties_go_north_and_east(
        unit_square: Region,
        #[case] point: Coord,
        #[case] expected: Quadrant,
    ) {
        assert_eq!(quadrant_of(point, &unit_square), expected);
    }

    #[rstest]
    fn cells_map_to_their_quadrant(unit_square: Region) {
        let cells = partition(&unit_square, 2).expect("grid");
        let quadrants: Vec<_> = cells
            .iter()
            .map(|cell| quadrant_of_cell(cell, &unit_square))
            .collect();
        assert_eq!(quadrants, Quadrant::ALL.to_vec());
    }

    #[rstest]
    fn quadrant_serialises_as_label() {
        let json = serde_json::to_string(&Quadrant::NorthWest).expect("serialise");
        assert_eq!(json, "\"NW\"");
    }
}
