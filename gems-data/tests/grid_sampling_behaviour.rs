//! Behavioural tests for [`GridSampler`].

use geo::Coord;
use gems_core::Quadrant;
use gems_data::fetcher::{CachedFetcher, RetryPolicy};
use gems_data::overpass::FetchError;
use gems_data::overpass::test_support::StubElementSource;
use gems_data::sampler::{GridSampler, SampleReport, SamplerConfig, SamplerConfigError};
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use std::cell::RefCell;
use std::time::Duration;

/// Three well separated places plus one chain and one unnamed element.
const SOUTH_WEST_BODY: &str = r#"{"elements":[
    {"type":"node","id":1,"lat":37.2,"lon":-122.8,"tags":{"leisure":"park","name":"Arroyo Seco Park"}},
    {"type":"node","id":2,"lat":37.5,"lon":-122.5,"tags":{"historic":"ruins","name":"Kiln Ruins"}},
    {"type":"way","id":3,"center":{"lat":37.8,"lon":-122.2},"tags":{"tourism":"viewpoint","name":"Condor Lookout"}},
    {"type":"node","id":4,"lat":37.3,"lon":-122.6,"tags":{"amenity":"cafe","name":"Starbucks"}},
    {"type":"node","id":5,"lat":37.4,"lon":-122.4,"tags":{"leisure":"garden"}}
]}"#;

/// Three memorials about 110 m apart along one street.
const TOWN_BLOCK_BODY: &str = r#"{"elements":[
    {"type":"node","id":11,"lat":37.500,"lon":-122.5,"tags":{"historic":"memorial","name":"Veterans Memorial"}},
    {"type":"node","id":12,"lat":37.501,"lon":-122.5,"tags":{"historic":"memorial","name":"Pioneer Plaque"}},
    {"type":"node","id":13,"lat":37.502,"lon":-122.5,"tags":{"historic":"memorial","name":"Founders Bench"}}
]}"#;

#[derive(Default)]
struct SamplingWorld {
    config: SamplerConfig,
    populated: Option<(Coord, String)>,
    source: Option<StubElementSource>,
    report: Option<SampleReport>,
    rejected: Option<SamplerConfigError>,
    calls: usize,
}

impl SamplingWorld {
    fn report(&self) -> &SampleReport {
        self.report.as_ref().expect("the grid must be sampled")
    }
}

#[fixture]
fn world() -> RefCell<SamplingWorld> {
    RefCell::new(SamplingWorld::default())
}

fn install(world: &RefCell<SamplingWorld>, fallback: StubElementSource) {
    let mut world = world.borrow_mut();
    let source = match world.populated.clone() {
        Some((point, body)) => fallback.with_body_within(point, body),
        None => fallback,
    };
    world.source = Some(source);
}

// --- Given steps ---

#[given("a grid of size {grid_size} over latitude {min_lat} to {max_lat} and longitude {min_lon} to {max_lon}")]
fn given_grid(
    #[from(world)] world: &RefCell<SamplingWorld>,
    grid_size: u32,
    min_lat: f64,
    max_lat: f64,
    min_lon: f64,
    max_lon: f64,
) {
    world.borrow_mut().config = SamplerConfig::default()
        .with_bbox([min_lat, min_lon, max_lat, max_lon])
        .with_grid_size(grid_size)
        .with_min_places_per_quadrant(1)
        .with_seed(5);
}

#[given("the south-west cell holds three independent places, a chain and an unnamed place")]
fn given_populated_cell(#[from(world)] world: &RefCell<SamplingWorld>) {
    world.borrow_mut().populated = Some((Coord { x: -122.5, y: 37.5 }, SOUTH_WEST_BODY.to_owned()));
}

#[given("the south-west cell holds three places on one town block")]
fn given_town_block(#[from(world)] world: &RefCell<SamplingWorld>) {
    world.borrow_mut().populated = Some((Coord { x: -122.5, y: 37.5 }, TOWN_BLOCK_BODY.to_owned()));
}

#[given("every other cell is empty")]
fn given_empty_cells(#[from(world)] world: &RefCell<SamplingWorld>) {
    install(world, StubElementSource::empty());
}

#[given("every other cell fails")]
fn given_failing_cells(#[from(world)] world: &RefCell<SamplingWorld>) {
    install(
        world,
        StubElementSource::with_error(FetchError::Http {
            url: "https://overpass.invalid/api/interpreter".to_owned(),
            status: 504,
            message: "gateway timeout".to_owned(),
        }),
    );
}

// --- When steps ---

#[when("the grid is sampled")]
fn when_sampled(#[from(world)] world: &RefCell<SamplingWorld>) {
    let mut world = world.borrow_mut();
    let source = world.source.take().expect("a source must be configured");
    let fetcher = CachedFetcher::without_cache(&source)
        .with_retry_policy(RetryPolicy::default().with_base_delay(Duration::ZERO));
    match GridSampler::new(fetcher, world.config.clone()) {
        Ok(sampler) => world.report = Some(sampler.run()),
        Err(err) => world.rejected = Some(err),
    }
    world.calls = source.call_count();
}

// --- Then steps ---

#[then("{count} places are accepted")]
fn then_accepted(#[from(world)] world: &RefCell<SamplingWorld>, count: usize) {
    let world = world.borrow();
    let report = world.report();
    assert_eq!(report.filter_stats.accepted, count);
    assert_eq!(report.total_places, count);
}

#[then("{count} chain establishment is rejected")]
fn then_chains(#[from(world)] world: &RefCell<SamplingWorld>, count: usize) {
    assert_eq!(world.borrow().report().filter_stats.chain_establishment, count);
}

#[then("{count} unnamed place is rejected")]
fn then_unnamed(#[from(world)] world: &RefCell<SamplingWorld>, count: usize) {
    assert_eq!(world.borrow().report().filter_stats.unnamed, count);
}

#[then("the {label} quadrant holds {count} places")]
fn then_quadrant(#[from(world)] world: &RefCell<SamplingWorld>, label: String, count: usize) {
    let quadrant = Quadrant::ALL
        .into_iter()
        .find(|quadrant| quadrant.label() == label)
        .unwrap_or_else(|| panic!("unknown quadrant {label}"));
    assert_eq!(world.borrow().report().quadrant_count(quadrant), count);
}

#[then("{count} cells have no places")]
fn then_empty_cells(#[from(world)] world: &RefCell<SamplingWorld>, count: usize) {
    assert_eq!(world.borrow().report().cells_without_places, count);
}

#[then("{count} duplicates are removed")]
fn then_duplicates(#[from(world)] world: &RefCell<SamplingWorld>, count: usize) {
    assert_eq!(world.borrow().report().duplicates_removed, count);
}

#[then("{count} cells failed")]
fn then_failed_cells(#[from(world)] world: &RefCell<SamplingWorld>, count: usize) {
    assert_eq!(world.borrow().report().failed_cells.len(), count);
}

#[then("the configuration is rejected")]
fn then_rejected(#[from(world)] world: &RefCell<SamplingWorld>) {
    let world = world.borrow();
    assert!(world.report.is_none());
    assert!(
        matches!(world.rejected, Some(SamplerConfigError::Grid(_))),
        "expected a grid error, got {:?}",
        world.rejected
    );
}

#[then("the source was never called")]
fn then_never_called(#[from(world)] world: &RefCell<SamplingWorld>) {
    assert_eq!(world.borrow().calls, 0);
}

// --- Scenario registrations ---

macro_rules! register_scenario {
    ($fn_name:ident, $title:literal) => {
        #[scenario(path = "tests/features/grid_sampling.feature", name = $title)]
        fn $fn_name(world: RefCell<SamplingWorld>) {
            let _ = (world,);
        }
    };
}

register_scenario!(
    sampling_one_populated_cell,
    "sampling a grid with one populated cell"
);
register_scenario!(
    keeping_neighbouring_places,
    "keeping neighbouring places in one cell"
);
register_scenario!(continuing_past_failures, "continuing past failing cells");
register_scenario!(
    rejecting_invalid_grid,
    "rejecting an invalid grid before fetching"
);
