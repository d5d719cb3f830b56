//! Behaviour-driven step definitions driving the consolidate CLI scenarios.

use super::helpers::{Workspace, write_utf8};
use super::*;
use crate::consolidate::run_consolidate_with;
use camino::Utf8PathBuf;
use gems_core::Place;
use gems_core::test_support::park;
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use std::cell::RefCell;

#[derive(Debug)]
struct ConsolidateWorld {
    workspace: Workspace,
    inputs: RefCell<Vec<Utf8PathBuf>>,
    stdout: RefCell<Vec<u8>>,
    result: RefCell<Option<Result<(), CliError>>>,
}

impl ConsolidateWorld {
    fn new() -> Self {
        Self {
            workspace: Workspace::new(),
            inputs: RefCell::new(Vec::new()),
            stdout: RefCell::new(Vec::new()),
            result: RefCell::new(None),
        }
    }

    fn add_places(&self, name: &str, places: &[Place]) {
        let path = self.workspace.path(name);
        let payload = serde_json::to_vec_pretty(places).expect("serialise places");
        write_utf8(&path, &payload);
        self.inputs.borrow_mut().push(path);
    }

    fn add_corrupt(&self, name: &str) {
        let path = self.workspace.path(name);
        write_utf8(&path, b"{ not json");
        self.inputs.borrow_mut().push(path);
    }

    fn output(&self) -> Utf8PathBuf {
        self.workspace.path("merged.json")
    }

    fn build_command_line(&self) -> Vec<String> {
        let mut argv = vec!["gems".to_owned(), "consolidate".to_owned()];
        argv.extend(self.inputs.borrow().iter().map(ToString::to_string));
        argv.extend([format!("--{ARG_OUTPUT}"), self.output().into_string()]);
        argv
    }
}

#[fixture]
fn world() -> ConsolidateWorld {
    ConsolidateWorld::new()
}

#[given("a place file with two places")]
fn first_file(#[from(world)] world: &ConsolidateWorld) {
    world.add_places(
        "first.json",
        &[
            park("node/1", "Shell Beach", -122.9, 38.1),
            park("node/2", "Tomales Point", -122.99, 38.24),
        ],
    );
}

#[given("a second place file repeating one of them beside a new place")]
fn second_file(#[from(world)] world: &ConsolidateWorld) {
    world.add_places(
        "second.json",
        &[
            park("way/7", "shell beach", -121.0, 37.0),
            park("node/3", "Abbotts Lagoon", -122.95, 38.12),
        ],
    );
}

#[given("a corrupt place file")]
fn corrupt_file(#[from(world)] world: &ConsolidateWorld) {
    world.add_corrupt("corrupt.json");
}

#[when("I run the consolidate command")]
fn run_consolidate_command(#[from(world)] world: &ConsolidateWorld) {
    let invocation = world.build_command_line();
    let parsed = Cli::try_parse_from(invocation).map_err(CliError::from);
    let outcome = parsed.and_then(|cli| match cli.command {
        Command::Consolidate(args) => {
            let mut buffer = world.stdout.borrow_mut();
            run_consolidate_with(args, &mut *buffer)
        }
        Command::Sample(_) => panic!("expected consolidate command"),
    });
    world.result.replace(Some(outcome));
}

#[then("the merged file holds {count} places")]
fn command_writes_places(#[from(world)] world: &ConsolidateWorld, count: usize) {
    let borrowed = world.result.borrow();
    let result = borrowed.as_ref().expect("result recorded");
    result.as_ref().expect("expected success");

    let text = std::fs::read_to_string(world.output()).expect("read output");
    let places: Vec<Place> = serde_json::from_str(&text).expect("output should be a place array");
    assert_eq!(places.len(), count);
}

#[then("the merge summary reports {count} duplicate removed")]
fn summary_duplicates(#[from(world)] world: &ConsolidateWorld, count: usize) {
    let stdout = String::from_utf8(world.stdout.borrow().clone()).expect("stdout utf-8");
    assert!(
        stdout.contains(&format!("({count} duplicates removed")),
        "unexpected summary {stdout:?}"
    );
}

#[then("the merge summary reports {count} file skipped")]
fn summary_skipped(#[from(world)] world: &ConsolidateWorld, count: usize) {
    let stdout = String::from_utf8(world.stdout.borrow().clone()).expect("stdout utf-8");
    assert!(
        stdout.contains(&format!("{count} files skipped")),
        "unexpected summary {stdout:?}"
    );
}

#[then("the command fails because nothing could be loaded")]
fn fails_nothing_loaded(#[from(world)] world: &ConsolidateWorld) {
    let borrowed = world.result.borrow();
    let error = borrowed
        .as_ref()
        .expect("result recorded")
        .as_ref()
        .expect_err("expected error");
    match error {
        CliError::NothingToConsolidate { count } => assert_eq!(*count, 1),
        other => panic!("expected NothingToConsolidate, found {other:?}"),
    }
    assert!(!world.output().exists(), "no output should be written");
}

#[then("the command fails because no inputs were given")]
fn fails_missing_inputs(#[from(world)] world: &ConsolidateWorld) {
    let borrowed = world.result.borrow();
    let error = borrowed
        .as_ref()
        .expect("result recorded")
        .as_ref()
        .expect_err("expected error");
    match error {
        CliError::MissingArgument { field, .. } => assert_eq!(*field, ARG_INPUTS),
        other => panic!("expected MissingArgument, found {other:?}"),
    }
}

macro_rules! register_consolidate_scenario {
    ($fn_name:ident, $scenario_title:literal) => {
        #[scenario(path = "tests/features/consolidate_command.feature", name = $scenario_title)]
        fn $fn_name(#[from(world)] world: ConsolidateWorld) {
            let _ = world;
        }
    };
}

register_consolidate_scenario!(consolidate_merges_files, "merging two place files");
register_consolidate_scenario!(consolidate_skips_corrupt, "skipping a corrupt input");
register_consolidate_scenario!(consolidate_nothing_loaded, "failing when no input loads");
register_consolidate_scenario!(consolidate_missing_inputs, "rejecting an empty input list");
