//! Wire types for Overpass JSON responses.

use std::fmt;

use gems_core::Tags;
use serde::{Deserialize, Serialize};

use super::FetchError;

/// OSM element type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementKind {
    /// A single point.
    Node,
    /// An ordered list of nodes.
    Way,
    /// A group of other elements.
    Relation,
    /// Anything else Overpass may emit, such as derived areas.
    #[serde(other)]
    Other,
}

impl ElementKind {
    /// Lower-case name used in OSM identifiers.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Node => "node",
            Self::Way => "way",
            Self::Relation => "relation",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Representative point Overpass attaches to ways and relations with
/// `out center`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Center {
    /// Latitude.
    pub lat: f64,
    /// Longitude.
    pub lon: f64,
}

/// One element from an Overpass response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawElement {
    /// OSM identifier, unique per element type.
    pub id: i64,
    /// Element type.
    #[serde(rename = "type")]
    pub kind: ElementKind,
    /// Node latitude.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lat: Option<f64>,
    /// Node longitude.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lon: Option<f64>,
    /// Centre of a way or relation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub center: Option<Center>,
    /// Tags, absent for untagged elements.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Tags>,
}

impl RawElement {
    /// Stable identifier in `type/id` form.
    #[must_use]
    pub fn osm_id(&self) -> String {
        format!("{}/{}", self.kind, self.id)
    }
}

/// Top-level Overpass JSON document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OverpassResponse {
    /// Returned elements; a missing list reads as empty.
    #[serde(default)]
    pub elements: Vec<RawElement>,
}

/// Parse an Overpass JSON body.
///
/// # Errors
/// Returns [`FetchError::Parse`] when the body is not valid JSON or does
/// not match the Overpass shape.
pub fn parse_response(body: &str) -> Result<OverpassResponse, FetchError> {
    serde_json::from_str(body).map_err(|err| FetchError::Parse {
        message: err.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn parses_nodes_and_centred_ways() {
        let body = r#"{
            "version": 0.6,
            "elements": [
                {"type": "node", "id": 1, "lat": 38.1, "lon": -122.2, "tags": {"leisure": "park"}},
                {"type": "way", "id": 2, "center": {"lat": 38.3, "lon": -122.4}},
                {"type": "area", "id": 3}
            ]
        }"#;
        let response = parse_response(body).expect("valid body");
        let kinds: Vec<_> = response.elements.iter().map(|e| e.kind).collect();
        assert_eq!(kinds, vec![ElementKind::Node, ElementKind::Way, ElementKind::Other]);

        let way = response.elements.get(1).expect("way present");
        assert_eq!(way.osm_id(), "way/2");
        assert!(way.tags.is_none());
        assert_eq!(way.center, Some(Center { lat: 38.3, lon: -122.4 }));
    }

    #[rstest]
    fn missing_element_list_is_empty() {
        let response = parse_response(r#"{"remark": "runtime error"}"#).expect("valid JSON");
        assert!(response.elements.is_empty());
    }

    #[rstest]
    #[case("")]
    #[case("<html>busy</html>")]
    #[case(r#"{"elements": [{"type": "node"}]}"#)]
    fn malformed_bodies_are_parse_errors(#[case] body: &str) {
        let err = parse_response(body).expect_err("malformed body");
        assert!(matches!(err, FetchError::Parse { .. }), "got {err:?}");
    }
}
