//! Merging of place files from several runs.
//!
//! Inputs may be bare place arrays, as written by
//! [`write_places`](crate::output::write_places), or report objects with a
//! `places` field, as written by [`write_report`](crate::output::write_report).
//! Files are read in the order given and the first occurrence of each place
//! wins.

use camino::{Utf8Path, Utf8PathBuf};
use gems_core::{DedupConfig, Place, dedupe_with_report};
use gems_fs::read_to_string;
use log::{info, warn};
use serde::Deserialize;
use thiserror::Error;

/// Errors raised while loading a place file.
#[derive(Debug, Error)]
pub enum ConsolidateError {
    /// The file could not be read.
    #[error("failed to read places from {path:?}: {source}")]
    Read {
        /// File path.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The file is not a place array or report.
    #[error("failed to parse places in {path:?}: {source}")]
    Parse {
        /// File path.
        path: Utf8PathBuf,
        /// Decoder error.
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PlaceFile {
    Bare(Vec<Place>),
    Wrapped { places: Vec<Place> },
}

impl From<PlaceFile> for Vec<Place> {
    fn from(file: PlaceFile) -> Self {
        match file {
            PlaceFile::Bare(places) | PlaceFile::Wrapped { places } => places,
        }
    }
}

/// Outcome of [`consolidate_files`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConsolidationReport {
    /// Unique places in first-seen order.
    pub places: Vec<Place>,
    /// Files loaded successfully.
    pub files_read: usize,
    /// Files skipped because they could not be loaded.
    pub files_skipped: Vec<Utf8PathBuf>,
    /// Places loaded before deduplication.
    pub places_loaded: usize,
    /// Places dropped as duplicates.
    pub duplicates_removed: usize,
}

/// Load the places stored in `path`.
///
/// Records carrying a `popularity_score` have their rarity re-derived from it.
///
/// # Errors
/// Returns [`ConsolidateError`] when the file cannot be read or parsed.
pub fn load_places(path: &Utf8Path) -> Result<Vec<Place>, ConsolidateError> {
    let text = read_to_string(path).map_err(|source| ConsolidateError::Read {
        path: path.to_owned(),
        source,
    })?;
    let file: PlaceFile = serde_json::from_str(&text).map_err(|source| ConsolidateError::Parse {
        path: path.to_owned(),
        source,
    })?;
    Ok(Vec::from(file)
        .into_iter()
        .map(Place::with_scored_rarity)
        .collect())
}

/// Load every file in `paths` and deduplicate the combined places.
///
/// Files that fail to load are skipped with a warning.
pub fn consolidate_files(paths: &[Utf8PathBuf], dedup: &DedupConfig) -> ConsolidationReport {
    let mut report = ConsolidationReport::default();
    let mut combined = Vec::new();
    for path in paths {
        match load_places(path) {
            Ok(places) => {
                info!("loaded {} places from {path}", places.len());
                report.files_read += 1;
                combined.extend(places);
            }
            Err(err) => {
                warn!("skipping {path}: {err}");
                report.files_skipped.push(path.clone());
            }
        }
    }
    report.places_loaded = combined.len();
    let deduplicated = dedupe_with_report(combined, dedup);
    report.duplicates_removed = deduplicated.duplicates.len();
    report.places = deduplicated.kept;
    info!(
        "consolidated {} places from {} files ({} duplicates removed, {} files skipped)",
        report.places.len(),
        report.files_read,
        report.duplicates_removed,
        report.files_skipped.len()
    );
    report
}
