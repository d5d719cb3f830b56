//! Behavioural tests for [`CachedFetcher`].
//!
//! Responses come from [`StubElementSource`]; no network access is needed.

use camino::Utf8PathBuf;
use gems_core::Region;
use gems_data::cache::ResponseCache;
use gems_data::fetcher::{CachedFetcher, FetchOutcome, RetryPolicy};
use gems_data::overpass::test_support::StubElementSource;
use gems_data::overpass::{FetchError, OverpassQuery, TagSpec};
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use std::cell::RefCell;
use std::path::PathBuf;
use std::time::Duration;
use tempfile::TempDir;

const ONE_PARK: &str = r#"{"elements":[{"type":"node","id":42,"lat":38.25,"lon":-122.75,"tags":{"leisure":"park","name":"Laguna Park"}}]}"#;

#[derive(Default)]
struct FetchWorld {
    _dir: Option<TempDir>,
    cache: Option<ResponseCache>,
    fetcher: Option<CachedFetcher<StubElementSource>>,
    outcomes: Vec<FetchOutcome>,
}

impl FetchWorld {
    fn install(&mut self, source: StubElementSource) {
        let cache = self.cache.clone().expect("cache directory must be prepared first");
        let retry = RetryPolicy::default().with_base_delay(Duration::ZERO);
        self.fetcher = Some(CachedFetcher::new(source, cache).with_retry_policy(retry));
    }

    fn fetch(&mut self, times: usize) {
        let fetcher = self.fetcher.as_ref().expect("source must be configured");
        let query = cell_query();
        for _ in 0..times {
            self.outcomes.push(fetcher.fetch(&query));
        }
    }

    fn call_count(&self) -> usize {
        self.fetcher
            .as_ref()
            .map_or(0, |fetcher| fetcher.source().call_count())
    }

    fn cache_entry_exists(&self) -> bool {
        let cache = self.cache.as_ref().expect("cache configured");
        cache
            .lookup(&cell_query().cache_key())
            .expect("cache lookup")
            .is_some()
    }
}

fn cell_query() -> OverpassQuery {
    let bounds = Region::new(38.0, -123.0, 38.5, -122.5).expect("valid region");
    OverpassQuery::new(bounds, TagSpec::points_of_interest())
}

fn timeout() -> FetchError {
    FetchError::Timeout {
        url: "https://overpass.invalid/api/interpreter".to_owned(),
        timeout_secs: 70,
    }
}

#[fixture]
fn world() -> RefCell<FetchWorld> {
    RefCell::new(FetchWorld::default())
}

// --- Given steps ---

#[given("an empty cache directory")]
fn empty_cache(#[from(world)] world: &RefCell<FetchWorld>) {
    let dir = TempDir::new().expect("create temp dir");
    let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf8 temp path");
    let mut world = world.borrow_mut();
    world.cache = Some(ResponseCache::new(root.join("osm_cache")));
    world._dir = Some(dir);
}

#[given("an Overpass source returning one park")]
fn source_one_park(#[from(world)] world: &RefCell<FetchWorld>) {
    world
        .borrow_mut()
        .install(StubElementSource::with_body(ONE_PARK));
}

#[given("an Overpass source that always times out")]
fn source_timing_out(#[from(world)] world: &RefCell<FetchWorld>) {
    world
        .borrow_mut()
        .install(StubElementSource::with_error(timeout()));
}

#[given("an Overpass source that fails once and then returns one park")]
fn source_flaky(#[from(world)] world: &RefCell<FetchWorld>) {
    world.borrow_mut().install(StubElementSource::with_sequence([
        Err(timeout()),
        Ok(ONE_PARK.to_owned()),
    ]));
}

// --- When steps ---

#[when("the same cell is fetched once")]
fn fetch_once(#[from(world)] world: &RefCell<FetchWorld>) {
    world.borrow_mut().fetch(1);
}

#[when("the same cell is fetched twice")]
fn fetch_twice(#[from(world)] world: &RefCell<FetchWorld>) {
    world.borrow_mut().fetch(2);
}

// --- Then steps ---

#[then("the source was called {count} time")]
fn called_once(#[from(world)] world: &RefCell<FetchWorld>, count: usize) {
    assert_eq!(world.borrow().call_count(), count);
}

#[then("the source was called {count} times")]
fn called_many(#[from(world)] world: &RefCell<FetchWorld>, count: usize) {
    assert_eq!(world.borrow().call_count(), count);
}

#[then("every fetch returns {count} element")]
fn every_fetch_returns(#[from(world)] world: &RefCell<FetchWorld>, count: usize) {
    let world = world.borrow();
    assert!(!world.outcomes.is_empty(), "no fetch was made");
    for outcome in &world.outcomes {
        assert_eq!(outcome.elements().len(), count, "unexpected outcome {outcome:?}");
    }
}

#[then("the fetch failed with a timeout")]
fn failed_with_timeout(#[from(world)] world: &RefCell<FetchWorld>) {
    let world = world.borrow();
    let outcome = world.outcomes.last().expect("a fetch was made");
    assert!(outcome.elements().is_empty());
    assert!(
        matches!(outcome.error(), Some(FetchError::Timeout { .. })),
        "expected a timeout, got {outcome:?}"
    );
}

#[then("a cache entry exists for the cell")]
fn cache_entry_present(#[from(world)] world: &RefCell<FetchWorld>) {
    assert!(world.borrow().cache_entry_exists());
}

#[then("no cache entry exists for the cell")]
fn cache_entry_absent(#[from(world)] world: &RefCell<FetchWorld>) {
    assert!(!world.borrow().cache_entry_exists());
}

#[test]
fn scenario_indices_follow_feature_order() {
    let feature =
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/features/fetch_cache.feature");
    let contents = std::fs::read_to_string(&feature).unwrap_or_else(|err| {
        panic!("failed to read feature file {feature:?}: {err}");
    });
    let titles: Vec<&str> = contents
        .lines()
        .filter_map(|line| line.trim().strip_prefix("Scenario: "))
        .collect();
    assert_eq!(
        titles,
        [
            "serving a repeated query from the cache",
            "degrading to an empty result after repeated failures",
            "recovering after a transient failure",
        ],
        "scenario order changed in feature file"
    );
}

#[scenario(path = "tests/features/fetch_cache.feature", index = 0)]
fn serving_from_cache(world: RefCell<FetchWorld>) {
    let _ = (world,);
}

#[scenario(path = "tests/features/fetch_cache.feature", index = 1)]
fn degrading_to_empty(world: RefCell<FetchWorld>) {
    let _ = (world,);
}

#[scenario(path = "tests/features/fetch_cache.feature", index = 2)]
fn recovering_after_failure(world: RefCell<FetchWorld>) {
    let _ = (world,);
}
