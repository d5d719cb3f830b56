//! Shared test harness modules for the hidden gems CLI.
#![expect(
    clippy::panic,
    reason = "Tests assert panic branches to surface unexpected CLI outcomes"
)]

use super::*;

mod consolidate_steps;
mod helpers;
