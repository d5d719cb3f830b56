//! The normalised place record and its classification.

use std::collections::BTreeMap;
use std::fmt;

use geo::Coord;
use serde::{Deserialize, Serialize};

use crate::Rarity;
use crate::filter::is_unnamed_place;

/// Free-form OpenStreetMap tags keyed by tag name.
pub type Tags = BTreeMap<String, String>;

/// Tag keys that classify a place, checked in this order.
pub const PRIORITY_KEYS: [&str; 4] = ["leisure", "amenity", "historic", "tourism"];

/// Validate a longitude/latitude pair and return it as a [`Coord`].
///
/// Returns `None` for non-finite values or values outside the WGS84 ranges.
#[must_use]
pub fn validated_coord(lon: f64, lat: f64) -> Option<Coord> {
    is_valid_lon_lat(lon, lat).then_some(Coord { x: lon, y: lat })
}

fn is_valid_lon_lat(lon: f64, lat: f64) -> bool {
    lon.is_finite()
        && lat.is_finite()
        && (-180.0..=180.0).contains(&lon)
        && (-90.0..=90.0).contains(&lat)
}

/// The primary classifying tag of a place, serialised as `key:value`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct PlaceKind {
    key: String,
    value: String,
}

impl PlaceKind {
    /// Construct a kind from a tag key and value.
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Find the first [`PRIORITY_KEYS`] entry present in `tags`.
    #[must_use]
    pub fn from_tags(tags: &Tags) -> Option<Self> {
        PRIORITY_KEYS
            .iter()
            .find_map(|key| tags.get(*key).map(|value| Self::new(*key, value.as_str())))
    }

    /// Tag key, for example `leisure`.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Tag value, for example `park`.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }
}

impl fmt::Display for PlaceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.key.is_empty() && self.value.is_empty() {
            return Ok(());
        }
        write!(f, "{}:{}", self.key, self.value)
    }
}

impl From<String> for PlaceKind {
    fn from(raw: String) -> Self {
        match raw.split_once(':') {
            Some((key, value)) => Self::new(key, value),
            None => Self::new(raw, String::new()),
        }
    }
}

impl From<PlaceKind> for String {
    fn from(kind: PlaceKind) -> Self {
        kind.to_string()
    }
}

/// Coarse bucket used to balance samples and summarise output.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// Restaurants and food courts.
    Food,
    /// Any other `amenity`.
    Amenity,
    /// Anything tagged `historic`.
    Historic,
    /// Anything tagged `leisure`.
    Leisure,
    /// Anything tagged `tourism`.
    Tourism,
    /// Fallback for places with no recognised kind.
    #[default]
    #[serde(other)]
    Scenic,
}

impl Category {
    /// Bucket a place by its primary kind.
    ///
    /// # Examples
    ///
    /// ```
    /// use gems_core::{Category, PlaceKind};
    ///
    /// assert_eq!(Category::for_kind(&PlaceKind::new("amenity", "restaurant")), Category::Food);
    /// assert_eq!(Category::for_kind(&PlaceKind::new("amenity", "library")), Category::Amenity);
    /// assert_eq!(Category::for_kind(&PlaceKind::new("natural", "peak")), Category::Scenic);
    /// ```
    #[must_use]
    pub fn for_kind(kind: &PlaceKind) -> Self {
        match (kind.key(), kind.value()) {
            ("amenity", "restaurant" | "food_court") => Self::Food,
            ("amenity", _) => Self::Amenity,
            ("historic", _) => Self::Historic,
            ("leisure", _) => Self::Leisure,
            ("tourism", _) => Self::Tourism,
            _ => Self::Scenic,
        }
    }

    /// Lower-case name used in serialised output.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Food => "food",
            Self::Amenity => "amenity",
            Self::Historic => "historic",
            Self::Leisure => "leisure",
            Self::Tourism => "tourism",
            Self::Scenic => "scenic",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A normalised point of interest.
///
/// Coordinates use `x = longitude`, `y = latitude` and serialise as a
/// `[lon, lat]` array.
///
/// # Examples
///
/// ```
/// use geo::Coord;
/// use gems_core::{Category, Place, PlaceKind};
///
/// let place = Place::new(
///     "node/1",
///     "Test Park",
///     PlaceKind::new("leisure", "park"),
///     Coord { x: -122.0, y: 38.0 },
/// )
/// .with_quality_assessed();
///
/// assert_eq!(place.category, Category::Leisure);
/// assert_eq!(place.subcategory, "park");
/// assert!(place.is_high_quality);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Place {
    /// Stable identifier, `"{element type}/{element id}"` for OSM sources.
    #[serde(default)]
    pub id: String,
    /// Display name.
    pub name: String,
    /// Primary classifying tag.
    #[serde(rename = "type", default)]
    pub kind: PlaceKind,
    /// Balancing bucket derived from [`Place::kind`].
    #[serde(default)]
    pub category: Category,
    /// Value of the primary classifying tag.
    #[serde(default)]
    pub subcategory: String,
    /// Position as `[lon, lat]`.
    #[serde(with = "lon_lat")]
    pub coordinates: Coord,
    /// Raw OSM tags, kept for downstream enrichment.
    #[serde(default)]
    pub tags: Tags,
    /// Comma-separated address fragments, empty when unknown.
    #[serde(default)]
    pub address: String,
    /// Raw `opening_hours` tag, empty when unknown.
    #[serde(default)]
    pub opening_hours: String,
    /// Raw `wheelchair` tag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wheelchair: Option<String>,
    /// Raw `website` tag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    /// Raw `phone` tag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    /// Raw `description` tag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Popularity on a 0 to 100 scale, present only on imported records.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub popularity_score: Option<f64>,
    /// Hidden-ness label.
    #[serde(default)]
    pub rarity: Rarity,
    /// Result of [`Place::passes_quality_check`] once assessed.
    #[serde(default)]
    pub is_high_quality: bool,
}

impl Place {
    /// Construct a place, deriving category and subcategory from `kind`.
    ///
    /// Optional descriptive fields start empty and quality starts unassessed.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        kind: PlaceKind,
        coordinates: Coord,
    ) -> Self {
        let category = Category::for_kind(&kind);
        let subcategory = kind.value().to_owned();
        Self {
            id: id.into(),
            name: name.into(),
            kind,
            category,
            subcategory,
            coordinates,
            tags: Tags::new(),
            address: String::new(),
            opening_hours: String::new(),
            wheelchair: None,
            website: None,
            phone: None,
            description: None,
            popularity_score: None,
            rarity: Rarity::default(),
            is_high_quality: false,
        }
    }

    /// Whether the place is good enough to publish.
    ///
    /// The name must be present and not a generic placeholder, and the
    /// coordinates must be finite and inside the WGS84 ranges.
    #[must_use]
    pub fn passes_quality_check(&self) -> bool {
        !self.name.trim().is_empty()
            && !is_unnamed_place(&self.name)
            && is_valid_lon_lat(self.coordinates.x, self.coordinates.y)
    }

    /// Re-derive [`Place::rarity`] from the popularity score, when one exists.
    ///
    /// # Examples
    ///
    /// ```
    /// use geo::Coord;
    /// use gems_core::{Place, PlaceKind, Rarity};
    ///
    /// let mut place = Place::new(
    ///     "node/7",
    ///     "Quarry Pond",
    ///     PlaceKind::new("natural", "water"),
    ///     Coord { x: -121.0, y: 38.5 },
    /// );
    /// place.rarity = Rarity::LeastHidden;
    /// place.popularity_score = Some(4.0);
    /// assert_eq!(place.with_scored_rarity().rarity, Rarity::MostHidden);
    /// ```
    #[must_use]
    pub fn with_scored_rarity(mut self) -> Self {
        if self.popularity_score.is_some() {
            self.rarity = Rarity::from_score(self.popularity_score);
        }
        self
    }

    /// Record the outcome of [`Place::passes_quality_check`].
    #[must_use]
    pub fn with_quality_assessed(mut self) -> Self {
        self.is_high_quality = self.passes_quality_check();
        self
    }

    /// Longitude.
    #[must_use]
    pub const fn lon(&self) -> f64 {
        self.coordinates.x
    }

    /// Latitude.
    #[must_use]
    pub const fn lat(&self) -> f64 {
        self.coordinates.y
    }
}

mod lon_lat {
    use geo::Coord;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub(super) fn serialize<S: Serializer>(coord: &Coord, serializer: S) -> Result<S::Ok, S::Error> {
        [coord.x, coord.y].serialize(serializer)
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Coord, D::Error> {
        let [x, y] = <[f64; 2]>::deserialize(deserializer)?;
        Ok(Coord { x, y })
    }
}
