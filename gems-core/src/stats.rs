//! Running tallies of why raw elements were kept or dropped.

use std::ops::AddAssign;

use serde::{Deserialize, Serialize};

use crate::FilterReason;

/// Why an element did not make it into the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    /// No tags, or no classifying tag.
    MissingTags,
    /// No usable coordinate.
    MissingCoords,
    /// Missing or placeholder name.
    Unnamed,
    /// Chain or franchise outlet.
    ChainEstablishment,
    /// Failed the final quality check.
    LowQuality,
}

impl From<FilterReason> for RejectReason {
    fn from(reason: FilterReason) -> Self {
        match reason {
            FilterReason::Unnamed => Self::Unnamed,
            FilterReason::ChainEstablishment => Self::ChainEstablishment,
        }
    }
}

/// Counts of every filtering outcome.
///
/// Cells produce their own tallies which the orchestrator merges, so the
/// totals do not depend on the order cells are processed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FilterStats {
    /// Raw elements inspected.
    pub total_elements: usize,
    /// Rejected for [`RejectReason::MissingTags`].
    pub missing_tags: usize,
    /// Rejected for [`RejectReason::MissingCoords`].
    pub missing_coords: usize,
    /// Rejected for [`RejectReason::Unnamed`].
    pub unnamed: usize,
    /// Rejected for [`RejectReason::ChainEstablishment`].
    pub chain_establishment: usize,
    /// Normalised successfully.
    pub accepted: usize,
    /// Normalised but failed the quality check.
    #[serde(default)]
    pub low_quality: usize,
}

impl FilterStats {
    /// Count one rejection.
    pub const fn record(&mut self, reason: RejectReason) {
        let counter = match reason {
            RejectReason::MissingTags => &mut self.missing_tags,
            RejectReason::MissingCoords => &mut self.missing_coords,
            RejectReason::Unnamed => &mut self.unnamed,
            RejectReason::ChainEstablishment => &mut self.chain_establishment,
            RejectReason::LowQuality => &mut self.low_quality,
        };
        *counter = counter.saturating_add(1);
    }

    /// Count one accepted element.
    pub const fn record_accepted(&mut self) {
        self.accepted = self.accepted.saturating_add(1);
    }

    /// Count one inspected element.
    pub const fn record_seen(&mut self) {
        self.total_elements = self.total_elements.saturating_add(1);
    }

    /// Number of elements rejected during normalisation.
    ///
    /// Quality failures are excluded: those places were accepted first.
    #[must_use]
    pub const fn rejected(&self) -> usize {
        self.missing_tags
            .saturating_add(self.missing_coords)
            .saturating_add(self.unnamed)
            .saturating_add(self.chain_establishment)
    }

    /// Fold another tally into this one.
    pub const fn merge(&mut self, other: &Self) {
        self.total_elements = self.total_elements.saturating_add(other.total_elements);
        self.missing_tags = self.missing_tags.saturating_add(other.missing_tags);
        self.missing_coords = self.missing_coords.saturating_add(other.missing_coords);
        self.unnamed = self.unnamed.saturating_add(other.unnamed);
        self.chain_establishment = self
            .chain_establishment
            .saturating_add(other.chain_establishment);
        self.accepted = self.accepted.saturating_add(other.accepted);
        self.low_quality = self.low_quality.saturating_add(other.low_quality);
    }
}

impl AddAssign for FilterStats {
    fn add_assign(&mut self, other: Self) {
        self.merge(&other);
    }
}
