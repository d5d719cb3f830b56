//! Conversion of raw Overpass elements into [`Place`] records.

use gems_core::{
    FilterStats, Place, PlaceKind, Rarity, RejectReason, filter_name, validated_coord,
};
use geo::Coord;

use crate::overpass::{ElementKind, RawElement};

/// Address tags joined, in this order, into [`Place::address`].
const ADDRESS_KEYS: [&str; 5] = [
    "addr:housenumber",
    "addr:street",
    "addr:city",
    "addr:state",
    "addr:postcode",
];

/// Normalise one element.
///
/// Checks run in a fixed order and the first failure wins: tags and a
/// classifying key, then a usable coordinate, then the name filter.
///
/// # Errors
/// Returns the [`RejectReason`] for the first failed check.
///
/// # Examples
///
/// ```
/// use gems_core::Category;
/// use gems_data::normalise::normalise_element;
/// use gems_data::overpass::parse_response;
///
/// let body = r#"{"elements":[{"type":"node","id":1,"lat":38.0,"lon":-122.0,
///     "tags":{"leisure":"park","name":"Test Park"}}]}"#;
/// let response = parse_response(body).expect("valid body");
/// let place = normalise_element(&response.elements[0]).expect("accepted");
/// assert_eq!(place.category, Category::Leisure);
/// assert_eq!(place.subcategory, "park");
/// assert_eq!(place.name, "Test Park");
/// ```
pub fn normalise_element(element: &RawElement) -> Result<Place, RejectReason> {
    let tags = element
        .tags
        .as_ref()
        .filter(|tags| !tags.is_empty())
        .ok_or(RejectReason::MissingTags)?;
    let kind = PlaceKind::from_tags(tags).ok_or(RejectReason::MissingTags)?;
    let coordinates = element_coord(element).ok_or(RejectReason::MissingCoords)?;

    let name = tags.get("name").map_or("", String::as_str);
    if let Some(reason) = filter_name(name).reason() {
        return Err(reason.into());
    }

    let optional = |key: &str| tags.get(key).cloned();
    let mut place = Place::new(element.osm_id(), name, kind, coordinates);
    place.address = join_address(tags);
    place.opening_hours = optional("opening_hours").unwrap_or_default();
    place.wheelchair = optional("wheelchair");
    place.website = optional("website");
    place.phone = optional("phone");
    place.description = optional("description");
    place.rarity = Rarity::infer_from_tags(tags);
    place.tags = tags.clone();
    Ok(place)
}

/// Normalise a batch, tallying every outcome.
///
/// Accepted places keep input order.
pub fn normalise_elements(elements: &[RawElement]) -> (Vec<Place>, FilterStats) {
    let mut stats = FilterStats::default();
    let mut places = Vec::with_capacity(elements.len());
    for element in elements {
        stats.record_seen();
        match normalise_element(element) {
            Ok(place) => {
                stats.record_accepted();
                places.push(place);
            }
            Err(reason) => stats.record(reason),
        }
    }
    (places, stats)
}

fn element_coord(element: &RawElement) -> Option<Coord> {
    match element.kind {
        ElementKind::Node => validated_coord(element.lon?, element.lat?),
        _ => element
            .center
            .and_then(|center| validated_coord(center.lon, center.lat)),
    }
}

fn join_address(tags: &gems_core::Tags) -> String {
    ADDRESS_KEYS
        .iter()
        .filter_map(|key| tags.get(*key))
        .map(|value| value.trim())
        .filter(|value| !value.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
}
