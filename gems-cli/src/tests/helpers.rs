//! Test helpers for composing CLI workspaces and stub Overpass sources.

use std::sync::Arc;

use camino::{Utf8Path, Utf8PathBuf};
use gems_data::overpass::test_support::StubElementSource;
use gems_data::overpass::{ElementSource, FetchError, OverpassQuery};
use geo::Coord;
use tempfile::TempDir;

use crate::CliError;
use crate::sample::{SampleConfig, SourceBuilder};

/// Region used by the sample scenarios, `min_lat,min_lon,max_lat,max_lon`.
pub(super) const SMALL_BBOX: &str = "37.0,-123.0,38.0,-122.0";

/// A point inside the south-west cell of a 2x2 grid over [`SMALL_BBOX`].
pub(super) const SOUTH_WEST_POINT: Coord = Coord {
    x: -122.75,
    y: 37.25,
};

/// Two independent places and one chain, all in the south-west cell.
pub(super) const SOUTH_WEST_BODY: &str = r#"{"elements":[
    {"type":"node","id":11,"lat":37.1,"lon":-122.9,"tags":{"leisure":"park","name":"Bolinas Ridge Park"}},
    {"type":"node","id":12,"lat":37.4,"lon":-122.6,"tags":{"historic":"ruins","name":"Old Mill Ruins"}},
    {"type":"node","id":13,"lat":37.3,"lon":-122.7,"tags":{"amenity":"cafe","name":"Starbucks"}}
]}"#;

pub(super) struct Workspace {
    _dir: TempDir,
    root: Utf8PathBuf,
}

impl Workspace {
    pub(super) fn new() -> Self {
        let dir = TempDir::new().expect("tempdir");
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf-8 workspace");
        Self { _dir: dir, root }
    }

    pub(super) fn path(&self, name: &str) -> Utf8PathBuf {
        self.root.join(name)
    }
}

impl std::fmt::Debug for Workspace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Workspace").field("root", &self.root).finish()
    }
}

pub(super) fn write_utf8(path: &Utf8Path, contents: &[u8]) {
    std::fs::write(path, contents).expect("write fixture");
}

/// Hands out a shared stub so call counts stay observable after the run.
#[derive(Debug, Clone)]
pub(super) struct StubSourceBuilder {
    stub: Arc<StubElementSource>,
}

impl StubSourceBuilder {
    pub(super) fn new(stub: StubElementSource) -> Self {
        Self {
            stub: Arc::new(stub),
        }
    }

    pub(super) fn south_west_places() -> Self {
        Self::new(StubElementSource::empty().with_body_within(SOUTH_WEST_POINT, SOUTH_WEST_BODY))
    }

    pub(super) fn call_count(&self) -> usize {
        self.stub.call_count()
    }
}

struct SharedStub(Arc<StubElementSource>);

impl ElementSource for SharedStub {
    fn fetch(&self, query: &OverpassQuery) -> Result<String, FetchError> {
        self.0.fetch(query)
    }
}

impl SourceBuilder for StubSourceBuilder {
    fn build(&self, _config: &SampleConfig) -> Result<Box<dyn ElementSource>, CliError> {
        Ok(Box::new(SharedStub(Arc::clone(&self.stub))))
    }
}
