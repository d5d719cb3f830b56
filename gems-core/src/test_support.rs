//! Place fixtures shared by unit and behaviour tests across the workspace.

use geo::Coord;

use crate::{Place, PlaceKind, Tags};

/// Build a quality-assessed place of the given kind.
///
/// The `kind` pair is also copied into the tags, alongside `name`, so the
/// place looks like a normalised OSM element.
#[must_use]
pub fn place(id: &str, name: &str, kind: (&str, &str), lon: f64, lat: f64) -> Place {
    let (key, value) = kind;
    let mut tags = Tags::new();
    tags.insert(key.to_owned(), value.to_owned());
    tags.insert("name".to_owned(), name.to_owned());
    Place {
        tags,
        ..Place::new(id, name, PlaceKind::new(key, value), Coord { x: lon, y: lat })
    }
    .with_quality_assessed()
}

/// Build a `leisure=park` place.
#[must_use]
pub fn park(id: &str, name: &str, lon: f64, lat: f64) -> Place {
    place(id, name, ("leisure", "park"), lon, lat)
}
