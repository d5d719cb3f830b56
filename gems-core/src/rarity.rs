//! How far off the beaten path a place is.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::Tags;

/// Tag values that mark a place as well served and therefore easy to find.
const VISITOR_AMENITIES: [&str; 5] = ["parking", "toilets", "information", "restaurant", "cafe"];

/// Three-level hidden-ness label shown alongside a place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Rarity {
    /// Rarely visited; shown in red.
    #[serde(rename = "most hidden")]
    MostHidden,
    /// Occasionally visited; shown in purple.
    #[default]
    #[serde(rename = "moderately hidden")]
    ModeratelyHidden,
    /// Well known locally; shown in blue.
    #[serde(rename = "least hidden")]
    LeastHidden,
}

impl Rarity {
    /// Classify a popularity score.
    ///
    /// Missing scores, and anything below 10, are the most hidden. Scores
    /// below 25 are moderately hidden.
    ///
    /// # Examples
    ///
    /// ```
    /// use gems_core::Rarity;
    ///
    /// assert_eq!(Rarity::from_score(None), Rarity::MostHidden);
    /// assert_eq!(Rarity::from_score(Some(12.0)), Rarity::ModeratelyHidden);
    /// assert_eq!(Rarity::from_score(Some(40.0)), Rarity::LeastHidden);
    /// ```
    #[must_use]
    pub fn from_score(score: Option<f64>) -> Self {
        match score {
            Some(value) if value >= 25.0 => Self::LeastHidden,
            Some(value) if value >= 10.0 => Self::ModeratelyHidden,
            _ => Self::MostHidden,
        }
    }

    /// Guess a rarity from tags when no popularity score exists.
    ///
    /// Any tag value naming a common visitor amenity makes the place least
    /// hidden; everything else is moderately hidden.
    #[must_use]
    pub fn infer_from_tags(tags: &Tags) -> Self {
        if tags
            .values()
            .any(|value| VISITOR_AMENITIES.contains(&value.as_str()))
        {
            Self::LeastHidden
        } else {
            Self::ModeratelyHidden
        }
    }

    /// Human-readable label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::MostHidden => "most hidden",
            Self::ModeratelyHidden => "moderately hidden",
            Self::LeastHidden => "least hidden",
        }
    }

    /// Marker colour used by map front ends.
    #[must_use]
    pub const fn colour(self) -> &'static str {
        match self {
            Self::MostHidden => "red",
            Self::ModeratelyHidden => "purple",
            Self::LeastHidden => "blue",
        }
    }
}

impl fmt::Display for Rarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
