//! Cache-first fetching with bounded retries.
//!
//! [`CachedFetcher::fetch`] never fails. A query that cannot be answered
//! after every attempt yields [`FetchOutcome::Failed`], which carries no
//! elements and the last error so callers can report it.

use std::thread;
use std::time::Duration;

use log::{debug, warn};

use crate::cache::ResponseCache;
use crate::overpass::{ElementSource, FetchError, OverpassQuery, RawElement, parse_response};

/// How often, and how patiently, a query is retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first. Always at least one.
    pub max_attempts: u32,
    /// Delay after the first failed attempt; doubles after each further one.
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// Policy with `max_attempts` attempts, clamped to at least one.
    #[must_use]
    pub fn new(max_attempts: u32) -> Self {
        Self::default().with_max_attempts(max_attempts)
    }

    /// Set the attempt budget, clamped to at least one.
    #[must_use]
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    /// Set the first back-off delay.
    #[must_use]
    pub fn with_base_delay(mut self, base_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self
    }

    /// Delay after the zero-based `attempt` fails: `base_delay * 2^attempt`.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::time::Duration;
    /// use gems_data::fetcher::RetryPolicy;
    ///
    /// let policy = RetryPolicy::default();
    /// assert_eq!(policy.delay_for(0), Duration::from_secs(1));
    /// assert_eq!(policy.delay_for(1), Duration::from_secs(2));
    /// ```
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2_u32.checked_pow(attempt).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor)
    }
}

/// What [`CachedFetcher::fetch`] produced.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    /// Served from the cache without contacting the source.
    Cached(Vec<RawElement>),
    /// Fetched from the source and written to the cache.
    Fetched {
        /// Parsed elements.
        elements: Vec<RawElement>,
        /// Attempts used, including the successful one.
        attempts: u32,
    },
    /// Every attempt failed; treat as zero results.
    Failed {
        /// Attempts made.
        attempts: u32,
        /// Error from the final attempt.
        last_error: FetchError,
    },
}

impl FetchOutcome {
    /// Elements returned, empty on failure.
    #[must_use]
    pub fn elements(&self) -> &[RawElement] {
        match self {
            Self::Cached(elements) | Self::Fetched { elements, .. } => elements,
            Self::Failed { .. } => &[],
        }
    }

    /// Consume the outcome, keeping only the elements.
    #[must_use]
    pub fn into_elements(self) -> Vec<RawElement> {
        match self {
            Self::Cached(elements) | Self::Fetched { elements, .. } => elements,
            Self::Failed { .. } => Vec::new(),
        }
    }

    /// Whether every attempt failed.
    #[must_use]
    pub const fn is_failure(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }

    /// Final error, when every attempt failed.
    #[must_use]
    pub const fn error(&self) -> Option<&FetchError> {
        match self {
            Self::Failed { last_error, .. } => Some(last_error),
            _ => None,
        }
    }
}

/// Cache-first wrapper around an [`ElementSource`].
///
/// # Example
///
/// ```
/// use gems_core::Region;
/// use gems_data::fetcher::CachedFetcher;
/// use gems_data::overpass::test_support::StubElementSource;
/// use gems_data::overpass::{OverpassQuery, TagSpec};
///
/// let fetcher = CachedFetcher::without_cache(StubElementSource::empty());
/// let bounds = Region::new(0.0, 0.0, 1.0, 1.0).expect("valid region");
/// let outcome = fetcher.fetch(&OverpassQuery::new(bounds, TagSpec::points_of_interest()));
/// assert!(outcome.elements().is_empty());
/// assert!(!outcome.is_failure());
/// ```
#[derive(Debug)]
pub struct CachedFetcher<S> {
    source: S,
    cache: Option<ResponseCache>,
    retry: RetryPolicy,
}

impl<S: ElementSource> CachedFetcher<S> {
    /// Fetch through `cache`.
    #[must_use]
    pub fn new(source: S, cache: ResponseCache) -> Self {
        Self {
            source,
            cache: Some(cache),
            retry: RetryPolicy::default(),
        }
    }

    /// Fetch straight from `source` every time.
    #[must_use]
    pub fn without_cache(source: S) -> Self {
        Self {
            source,
            cache: None,
            retry: RetryPolicy::default(),
        }
    }

    /// Replace the retry policy.
    #[must_use]
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Underlying source.
    pub const fn source(&self) -> &S {
        &self.source
    }

    /// Cache in use, if any.
    pub const fn cache(&self) -> Option<&ResponseCache> {
        self.cache.as_ref()
    }

    /// Answer `query` from the cache, or from the source with retries.
    ///
    /// A body is cached only after it parses. Cache failures are logged and
    /// otherwise ignored.
    pub fn fetch(&self, query: &OverpassQuery) -> FetchOutcome {
        let key = query.cache_key();
        if let Some(elements) = self.cached(&key) {
            debug!("cache hit for {} ({key})", query.bounds());
            return FetchOutcome::Cached(elements);
        }

        let attempts = self.retry.max_attempts.max(1);
        let mut attempt = 0;
        loop {
            match self.attempt(query) {
                Ok((body, elements)) => {
                    self.remember(&key, &body);
                    return FetchOutcome::Fetched {
                        elements,
                        attempts: attempt + 1,
                    };
                }
                Err(err) => {
                    warn!(
                        "fetch attempt {}/{attempts} for {} failed: {err}",
                        attempt + 1,
                        query.bounds()
                    );
                    if attempt + 1 >= attempts {
                        warn!(
                            "giving up on {} after {attempts} attempts",
                            query.bounds()
                        );
                        return FetchOutcome::Failed {
                            attempts,
                            last_error: err,
                        };
                    }
                    let delay = self.retry.delay_for(attempt);
                    if !delay.is_zero() {
                        thread::sleep(delay);
                    }
                    attempt += 1;
                }
            }
        }
    }

    fn attempt(&self, query: &OverpassQuery) -> Result<(String, Vec<RawElement>), FetchError> {
        let body = self.source.fetch(query)?;
        let response = parse_response(&body)?;
        Ok((body, response.elements))
    }

    fn cached(&self, key: &str) -> Option<Vec<RawElement>> {
        let cache = self.cache.as_ref()?;
        let body = match cache.lookup(key) {
            Ok(found) => found?,
            Err(err) => {
                warn!("ignoring unreadable cache entry: {err}");
                return None;
            }
        };
        match parse_response(&body) {
            Ok(response) => Some(response.elements),
            Err(err) => {
                warn!(
                    "ignoring corrupt cache entry {}: {err}",
                    cache.path_for(key)
                );
                None
            }
        }
    }

    fn remember(&self, key: &str, body: &str) {
        let Some(cache) = self.cache.as_ref() else {
            return;
        };
        match cache.store(key, body) {
            Ok(path) => debug!("cached response at {path}"),
            Err(err) => warn!("failed to cache response: {err}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::overpass::TagSpec;
    use crate::overpass::test_support::StubElementSource;
    use camino::Utf8PathBuf;
    use gems_core::Region;
    use rstest::{fixture, rstest};
    use tempfile::TempDir;

    const ONE_PARK: &str =
        r#"{"elements":[{"type":"node","id":7,"lat":38.5,"lon":-122.5,"tags":{"leisure":"park","name":"Fern Dell"}}]}"#;

    #[fixture]
    fn query() -> OverpassQuery {
        let bounds = Region::new(38.0, -123.0, 39.0, -122.0).expect("valid region");
        OverpassQuery::new(bounds, TagSpec::points_of_interest())
    }

    fn instant() -> RetryPolicy {
        RetryPolicy::default().with_base_delay(Duration::ZERO)
    }

    fn network_error() -> FetchError {
        FetchError::Network {
            url: "http://overpass.invalid".to_owned(),
            message: "connection refused".to_owned(),
        }
    }

    fn temp_cache() -> (TempDir, ResponseCache) {
        let dir = TempDir::new().expect("create temp dir");
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf8 temp path");
        (dir, ResponseCache::new(root.join("osm_cache")))
    }

    #[rstest]
    #[case(0, Duration::from_secs(1))]
    #[case(1, Duration::from_secs(2))]
    #[case(4, Duration::from_secs(16))]
    fn delays_double(#[case] attempt: u32, #[case] expected: Duration) {
        assert_eq!(RetryPolicy::default().delay_for(attempt), expected);
    }

    #[rstest]
    fn huge_attempts_saturate() {
        assert_eq!(RetryPolicy::default().delay_for(200), Duration::from_secs(u64::from(u32::MAX)));
    }

    #[rstest]
    fn zero_attempts_clamp_to_one() {
        assert_eq!(RetryPolicy::new(0).max_attempts, 1);
    }

    #[rstest]
    fn second_fetch_is_served_from_cache(query: OverpassQuery) {
        let (_guard, cache) = temp_cache();
        let fetcher = CachedFetcher::new(StubElementSource::with_body(ONE_PARK), cache);

        let first = fetcher.fetch(&query);
        let second = fetcher.fetch(&query);

        assert!(matches!(first, FetchOutcome::Fetched { attempts: 1, .. }));
        assert!(matches!(second, FetchOutcome::Cached(_)));
        assert_eq!(first.elements(), second.elements());
        assert_eq!(fetcher.source().call_count(), 1);
    }

    #[rstest]
    fn transient_failures_are_retried(query: OverpassQuery) {
        let source = StubElementSource::with_sequence([
            Err(network_error()),
            Ok("not json".to_owned()),
            Ok(ONE_PARK.to_owned()),
        ]);
        let fetcher = CachedFetcher::without_cache(source).with_retry_policy(instant());

        let outcome = fetcher.fetch(&query);

        assert!(matches!(outcome, FetchOutcome::Fetched { attempts: 3, .. }));
        assert_eq!(outcome.into_elements().len(), 1);
    }

    #[rstest]
    fn exhausted_retries_degrade_to_empty(query: OverpassQuery) {
        let (_guard, cache) = temp_cache();
        let fetcher = CachedFetcher::new(StubElementSource::with_error(network_error()), cache)
            .with_retry_policy(instant());

        let outcome = fetcher.fetch(&query);

        assert!(outcome.is_failure());
        assert!(outcome.elements().is_empty());
        assert_eq!(outcome.error(), Some(&network_error()));
        assert_eq!(fetcher.source().call_count(), 3);
        let cache = fetcher.cache().expect("cache configured");
        assert!(!cache.path_for(&query.cache_key()).exists());
    }

    #[rstest]
    fn malformed_bodies_are_not_cached(query: OverpassQuery) {
        let (_guard, cache) = temp_cache();
        let fetcher = CachedFetcher::new(StubElementSource::with_body("<html>busy</html>"), cache)
            .with_retry_policy(instant().with_max_attempts(2));

        let outcome = fetcher.fetch(&query);

        assert!(matches!(
            outcome,
            FetchOutcome::Failed {
                attempts: 2,
                last_error: FetchError::Parse { .. }
            }
        ));
        let cache = fetcher.cache().expect("cache configured");
        assert_eq!(cache.lookup(&query.cache_key()).expect("lookup"), None);
    }

    #[rstest]
    fn corrupt_cache_entry_is_refetched(query: OverpassQuery) {
        let (_guard, cache) = temp_cache();
        cache.store(&query.cache_key(), "{ truncated").expect("seed cache");
        let fetcher = CachedFetcher::new(StubElementSource::with_body(ONE_PARK), cache);

        let outcome = fetcher.fetch(&query);

        assert!(matches!(outcome, FetchOutcome::Fetched { .. }));
        assert_eq!(fetcher.source().call_count(), 1);
        let cache = fetcher.cache().expect("cache configured");
        assert_eq!(
            cache.lookup(&query.cache_key()).expect("lookup").as_deref(),
            Some(ONE_PARK)
        );
    }
}
