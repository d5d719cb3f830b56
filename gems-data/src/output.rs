//! JSON artefacts written at the end of a run.

use camino::{Utf8Path, Utf8PathBuf};
use gems_core::Place;
use gems_fs::write_atomic;
use serde::Serialize;
use thiserror::Error;

use crate::sampler::SampleReport;

/// Default output file for sampled places.
pub const DEFAULT_OUTPUT_PATH: &str = "hidden_gems.json";

/// Errors raised while writing output files.
#[derive(Debug, Error)]
pub enum OutputError {
    /// The value could not be encoded as JSON.
    #[error("failed to encode {path:?} as JSON: {source}")]
    Serialise {
        /// Destination path.
        path: Utf8PathBuf,
        /// Encoder error.
        #[source]
        source: serde_json::Error,
    },
    /// Writing the file failed.
    #[error("failed to write {path:?}: {source}")]
    Write {
        /// Destination path.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

/// A place as published, with the map marker colour for its rarity.
#[derive(Serialize)]
struct PlaceRecord<'a> {
    #[serde(flatten)]
    place: &'a Place,
    color: &'static str,
}

impl<'a> From<&'a Place> for PlaceRecord<'a> {
    fn from(place: &'a Place) -> Self {
        Self {
            place,
            color: place.rarity.colour(),
        }
    }
}

/// Write `places` as a pretty-printed JSON array.
///
/// Each record carries a `color` field derived from its rarity. Readers
/// that decode [`Place`] ignore it.
///
/// # Errors
/// Returns [`OutputError`] when encoding or writing fails.
pub fn write_places(path: &Utf8Path, places: &[Place]) -> Result<(), OutputError> {
    let records: Vec<PlaceRecord<'_>> = places.iter().map(PlaceRecord::from).collect();
    write_json(path, &records)
}

/// Write the full run report, places included.
///
/// # Errors
/// Returns [`OutputError`] when encoding or writing fails.
pub fn write_report(path: &Utf8Path, report: &SampleReport) -> Result<(), OutputError> {
    write_json(path, report)
}

fn write_json<T: Serialize + ?Sized>(path: &Utf8Path, value: &T) -> Result<(), OutputError> {
    let mut json = serde_json::to_string_pretty(value).map_err(|source| OutputError::Serialise {
        path: path.to_owned(),
        source,
    })?;
    json.push('\n');
    write_atomic(path, json).map_err(|source| OutputError::Write {
        path: path.to_owned(),
        source,
    })
}
