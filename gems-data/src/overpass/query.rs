//! Overpass QL generation and deterministic cache keys.

use std::collections::{BTreeMap, BTreeSet};

use gems_core::Region;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Tag filters for an Overpass query.
///
/// Each key maps to the set of accepted values; an empty set accepts any
/// value. Keys and values are kept sorted so equal specifications always
/// render and hash identically.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TagSpec(BTreeMap<String, BTreeSet<String>>);

impl TagSpec {
    /// A specification with no filters.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// The leisure, amenity, historic and tourism values sampled for hidden
    /// gems.
    #[must_use]
    pub fn points_of_interest() -> Self {
        Self::empty()
            .with_values(
                "leisure",
                [
                    "park",
                    "garden",
                    "wildlife_hide",
                    "bird_hide",
                    "picnic_site",
                    "playground",
                ],
            )
            .with_values(
                "amenity",
                [
                    "restaurant",
                    "cafe",
                    "food_court",
                    "library",
                    "museum",
                    "theatre",
                    "arts_centre",
                    "marketplace",
                    "community_centre",
                    "fountain",
                    "viewpoint",
                    "social_centre",
                    "stage",
                ],
            )
            .with_values(
                "historic",
                [
                    "monument",
                    "memorial",
                    "ruins",
                    "castle",
                    "fort",
                    "wreck",
                    "wayside_cross",
                    "wayside_shrine",
                    "milestone",
                ],
            )
            .with_values(
                "tourism",
                ["attraction", "viewpoint", "artwork", "gallery", "museum"],
            )
    }

    /// Accept the listed values for `key`, adding to any already present.
    #[must_use]
    pub fn with_values<I, V>(mut self, key: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        self.0
            .entry(key.into())
            .or_default()
            .extend(values.into_iter().map(Into::into));
        self
    }

    /// Accept any value for `key`.
    #[must_use]
    pub fn with_any(mut self, key: impl Into<String>) -> Self {
        self.0.insert(key.into(), BTreeSet::new());
        self
    }

    /// Whether no key is filtered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Keys with their accepted values, sorted by key.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &BTreeSet<String>)> {
        self.0.iter().map(|(key, values)| (key.as_str(), values))
    }

    /// Stable textual form, for example `amenity=cafe,museum;leisure=*`.
    #[must_use]
    pub fn canonical(&self) -> String {
        self.iter()
            .map(|(key, values)| {
                if values.is_empty() {
                    format!("{key}=*")
                } else {
                    let joined: Vec<&str> = values.iter().map(String::as_str).collect();
                    format!("{key}={}", joined.join(","))
                }
            })
            .collect::<Vec<_>>()
            .join(";")
    }
}

/// A bounding-box query for tagged elements.
#[derive(Debug, Clone, PartialEq)]
pub struct OverpassQuery {
    bounds: Region,
    tags: TagSpec,
    timeout_secs: u32,
}

impl OverpassQuery {
    /// Server-side timeout used unless overridden.
    pub const DEFAULT_TIMEOUT_SECS: u32 = 60;

    /// Query `tags` inside `bounds`.
    #[must_use]
    pub fn new(bounds: Region, tags: TagSpec) -> Self {
        Self {
            bounds,
            tags,
            timeout_secs: Self::DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Override the server-side timeout.
    #[must_use]
    pub fn with_timeout_secs(mut self, timeout_secs: u32) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Queried bounds.
    #[must_use]
    pub fn bounds(&self) -> &Region {
        &self.bounds
    }

    /// Tag filters.
    #[must_use]
    pub fn tags(&self) -> &TagSpec {
        &self.tags
    }

    /// Server-side timeout in seconds.
    #[must_use]
    pub fn timeout_secs(&self) -> u32 {
        self.timeout_secs
    }

    /// Render Overpass QL.
    ///
    /// Valued filters select nodes and ways; any-value filters also select
    /// relations. The query ends with `out center;` so ways and relations
    /// carry a representative point.
    ///
    /// # Examples
    ///
    /// ```
    /// use gems_core::Region;
    /// use gems_data::overpass::{OverpassQuery, TagSpec};
    ///
    /// # fn main() -> Result<(), gems_core::RegionError> {
    /// let bounds = Region::new(37.0, -123.0, 38.0, -122.0)?;
    /// let query = OverpassQuery::new(bounds, TagSpec::empty().with_values("leisure", ["park"]));
    /// let ql = query.to_ql();
    /// assert!(ql.contains(r#"node["leisure"="park"](37,-123,38,-122);"#));
    /// assert!(ql.ends_with("out center;\n"));
    /// # Ok(())
    /// # }
    /// ```
    #[must_use]
    pub fn to_ql(&self) -> String {
        let bbox = format!(
            "({},{},{},{})",
            self.bounds.min_lat(),
            self.bounds.min_lon(),
            self.bounds.max_lat(),
            self.bounds.max_lon()
        );
        let mut ql = format!("[out:json][timeout:{}];\n(\n", self.timeout_secs);
        for (key, values) in self.tags.iter() {
            let key = quote(key);
            if values.is_empty() {
                for element in ["node", "way", "relation"] {
                    ql.push_str(&format!("  {element}[{key}]{bbox};\n"));
                }
                continue;
            }
            for value in values {
                let value = quote(value);
                for element in ["node", "way"] {
                    ql.push_str(&format!("  {element}[{key}={value}]{bbox};\n"));
                }
            }
        }
        ql.push_str(");\nout center;\n");
        ql
    }

    /// Filename-safe cache key for this query.
    ///
    /// The key is the SHA-256 of the bounds rounded to four decimal places
    /// and the canonical tag specification. The server timeout is not part
    /// of the key.
    #[must_use]
    pub fn cache_key(&self) -> String {
        let material = format!(
            "{:.4},{:.4},{:.4},{:.4}|{}",
            self.bounds.min_lat(),
            self.bounds.min_lon(),
            self.bounds.max_lat(),
            self.bounds.max_lon(),
            self.tags.canonical()
        );
        let mut hasher = Sha256::new();
        hasher.update(material.as_bytes());
        format!("{:x}", hasher.finalize())
    }
}

fn quote(raw: &str) -> String {
    let escaped = raw.replace('\\', "\\\\").replace('"', "\\\"");
    format!("\"{escaped}\"")
}
