//! Test utilities for Overpass sources.
//!
//! [`StubElementSource`] answers queries from scripted bodies without any
//! network access and records every query it receives.

use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

use geo::Coord;

use super::{ElementSource, FetchError, OverpassQuery};

/// An empty Overpass document.
pub const EMPTY_BODY: &str = r#"{"elements":[]}"#;

type Scripted = Result<String, FetchError>;

/// Stub [`ElementSource`] for tests.
///
/// Responses are chosen in this order: the next scripted response from
/// [`with_sequence`](Self::with_sequence), then the first area body whose
/// point lies inside the query bounds, then the fallback.
///
/// # Example
///
/// ```
/// use gems_core::Region;
/// use gems_data::overpass::test_support::StubElementSource;
/// use gems_data::overpass::{ElementSource, OverpassQuery, TagSpec};
///
/// let source = StubElementSource::with_body(r#"{"elements":[]}"#);
/// let bounds = Region::new(0.0, 0.0, 1.0, 1.0).expect("valid region");
/// let body = source.fetch(&OverpassQuery::new(bounds, TagSpec::empty()));
/// assert!(body.is_ok());
/// assert_eq!(source.call_count(), 1);
/// ```
#[derive(Debug)]
pub struct StubElementSource {
    fallback: Scripted,
    areas: Vec<(Coord, String)>,
    sequence: Mutex<VecDeque<Scripted>>,
    queries: Mutex<Vec<OverpassQuery>>,
}

impl StubElementSource {
    /// A source answering every query with no elements.
    #[must_use]
    pub fn empty() -> Self {
        Self::with_body(EMPTY_BODY)
    }

    /// A source answering every query with `body`.
    #[must_use]
    pub fn with_body(body: impl Into<String>) -> Self {
        Self::from_fallback(Ok(body.into()))
    }

    /// A source failing every query with `error`.
    #[must_use]
    pub fn with_error(error: FetchError) -> Self {
        Self::from_fallback(Err(error))
    }

    /// A source replaying `responses` in order before using the fallback,
    /// which is an empty document.
    #[must_use]
    pub fn with_sequence<I>(responses: I) -> Self
    where
        I: IntoIterator<Item = Result<String, FetchError>>,
    {
        let source = Self::empty();
        Self {
            sequence: Mutex::new(responses.into_iter().collect()),
            ..source
        }
    }

    /// Answer queries whose bounds contain `point` with `body`.
    #[must_use]
    pub fn with_body_within(mut self, point: Coord, body: impl Into<String>) -> Self {
        self.areas.push((point, body.into()));
        self
    }

    /// Number of queries received so far.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.queries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Queries received so far, oldest first.
    #[must_use]
    pub fn queries(&self) -> Vec<OverpassQuery> {
        self.queries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn from_fallback(fallback: Scripted) -> Self {
        Self {
            fallback,
            areas: Vec::new(),
            sequence: Mutex::new(VecDeque::new()),
            queries: Mutex::new(Vec::new()),
        }
    }
}

impl ElementSource for StubElementSource {
    fn fetch(&self, query: &OverpassQuery) -> Result<String, FetchError> {
        self.queries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(query.clone());

        let scripted = self
            .sequence
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front();
        if let Some(response) = scripted {
            return response;
        }
        if let Some((_, body)) = self
            .areas
            .iter()
            .find(|(point, _)| query.bounds().contains(*point))
        {
            return Ok(body.clone());
        }
        self.fallback.clone()
    }
}
