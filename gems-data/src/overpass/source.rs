//! Blocking access to an Overpass interpreter over HTTP.
//!
//! [`ElementSource`] is synchronous so the sampler stays a plain loop over
//! grid cells. [`HttpOverpassSource`] bridges to the async `reqwest` client
//! by blocking on a Tokio runtime it owns.
//!
//! # Example
//!
//! ```no_run
//! use gems_core::Region;
//! use gems_data::overpass::{ElementSource, HttpOverpassSource, OverpassQuery, TagSpec};
//!
//! let source = HttpOverpassSource::new("https://overpass-api.de/api/interpreter")?;
//! let bounds = Region::new(37.7, -122.5, 37.8, -122.4)?;
//! let body = source.fetch(&OverpassQuery::new(bounds, TagSpec::points_of_interest()))?;
//! println!("{} bytes", body.len());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::time::Duration;

use reqwest::Client;
use tokio::runtime::{Handle, Runtime, RuntimeFlavor};
use url::Url;

use super::{FetchError, OverpassQuery};

/// Something that answers Overpass queries with a raw JSON body.
pub trait ElementSource {
    /// Run `query` and return the response body verbatim.
    ///
    /// # Errors
    /// Returns a [`FetchError`] when the request fails or the endpoint
    /// answers with a non-success status.
    fn fetch(&self, query: &OverpassQuery) -> Result<String, FetchError>;
}

impl<S: ElementSource + ?Sized> ElementSource for &S {
    fn fetch(&self, query: &OverpassQuery) -> Result<String, FetchError> {
        (**self).fetch(query)
    }
}

impl<S: ElementSource + ?Sized> ElementSource for Box<S> {
    fn fetch(&self, query: &OverpassQuery) -> Result<String, FetchError> {
        (**self).fetch(query)
    }
}

/// Error type for [`HttpOverpassSource`] construction failures.
#[derive(Debug)]
pub enum SourceBuildError {
    /// Failed to build the HTTP client.
    HttpClient(reqwest::Error),
    /// Failed to build the Tokio runtime.
    Runtime(std::io::Error),
    /// The endpoint is not an absolute http(s) URL.
    InvalidEndpoint {
        /// Endpoint as configured.
        endpoint: String,
        /// Why it was rejected.
        reason: String,
    },
}

impl std::fmt::Display for SourceBuildError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::HttpClient(err) => write!(f, "failed to build HTTP client: {err}"),
            Self::Runtime(err) => write!(f, "failed to build Tokio runtime: {err}"),
            Self::InvalidEndpoint { endpoint, reason } => {
                write!(f, "invalid Overpass endpoint {endpoint:?}: {reason}")
            }
        }
    }
}

impl std::error::Error for SourceBuildError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::HttpClient(err) => Some(err),
            Self::Runtime(err) => Some(err),
            Self::InvalidEndpoint { .. } => None,
        }
    }
}

/// Public Overpass interpreter.
pub const DEFAULT_ENDPOINT: &str = "https://overpass-api.de/api/interpreter";

/// Default user agent for Overpass requests.
pub const DEFAULT_USER_AGENT: &str = "hidden-gems/0.1";

/// Client timeout: the default query timeout plus ten seconds of slack.
const DEFAULT_TIMEOUT_SECS: u64 = 70;

/// Configuration for [`HttpOverpassSource`].
#[derive(Debug, Clone)]
pub struct HttpOverpassSourceConfig {
    /// Interpreter URL (e.g., `"https://overpass-api.de/api/interpreter"`).
    pub endpoint: String,
    /// Request timeout duration.
    pub timeout: Duration,
    /// User agent string for requests.
    pub user_agent: String,
}

impl Default for HttpOverpassSourceConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_owned(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: DEFAULT_USER_AGENT.to_owned(),
        }
    }
}

impl HttpOverpassSourceConfig {
    /// Create a configuration for the given endpoint.
    #[must_use]
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            ..Default::default()
        }
    }

    /// Set the request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the user agent string.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}

/// HTTP-backed [`ElementSource`].
///
/// Queries are sent as a form-encoded `data` field in a POST body.
///
/// # Runtime behaviour
///
/// Outside any Tokio runtime the source blocks on its own current-thread
/// runtime. Inside a multi-threaded runtime it borrows that runtime's
/// handle through [`tokio::task::block_in_place`]. Inside a
/// `current_thread` runtime it falls back to its own runtime, which blocks
/// the caller's executor for the duration of the request.
pub struct HttpOverpassSource {
    client: Client,
    config: HttpOverpassSourceConfig,
    runtime: Runtime,
}

impl std::fmt::Debug for HttpOverpassSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpOverpassSource")
            .field("client", &self.client)
            .field("config", &self.config)
            .field("runtime", &"<tokio::runtime::Runtime>")
            .finish()
    }
}

impl HttpOverpassSource {
    /// Create a source for `endpoint` with default settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the endpoint is invalid or the HTTP client or
    /// Tokio runtime fails to build.
    pub fn new(endpoint: impl Into<String>) -> Result<Self, SourceBuildError> {
        Self::with_config(HttpOverpassSourceConfig::new(endpoint))
    }

    /// Create a source with explicit configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the endpoint is invalid or the HTTP client or
    /// Tokio runtime fails to build.
    pub fn with_config(config: HttpOverpassSourceConfig) -> Result<Self, SourceBuildError> {
        validate_endpoint(&config.endpoint)?;
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .connect_timeout(config.timeout)
            .timeout(config.timeout)
            .build()
            .map_err(SourceBuildError::HttpClient)?;
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(SourceBuildError::Runtime)?;
        Ok(Self {
            client,
            config,
            runtime,
        })
    }

    /// Configured endpoint.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.config.endpoint
    }

    async fn fetch_async(&self, ql: String) -> Result<String, FetchError> {
        let url = self.config.endpoint.as_str();
        let response = self
            .client
            .post(url)
            .form(&[("data", ql)])
            .send()
            .await
            .map_err(|err| self.convert_reqwest_error(&err, url))?
            .error_for_status()
            .map_err(|err| self.convert_reqwest_error(&err, url))?;
        response
            .text()
            .await
            .map_err(|err| self.convert_reqwest_error(&err, url))
    }

    fn convert_reqwest_error(&self, error: &reqwest::Error, url: &str) -> FetchError {
        if error.is_timeout() {
            return FetchError::Timeout {
                url: url.to_owned(),
                timeout_secs: self.config.timeout.as_secs(),
            };
        }

        if let Some(status) = error.status() {
            return FetchError::Http {
                url: url.to_owned(),
                status: status.as_u16(),
                message: error.to_string(),
            };
        }

        FetchError::Network {
            url: url.to_owned(),
            message: error.to_string(),
        }
    }
}

impl ElementSource for HttpOverpassSource {
    fn fetch(&self, query: &OverpassQuery) -> Result<String, FetchError> {
        // block_in_place needs a multi-threaded runtime; anything else uses
        // the owned runtime.
        let future = self.fetch_async(query.to_ql());
        match Handle::try_current() {
            Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
                tokio::task::block_in_place(|| handle.block_on(future))
            }
            _ => self.runtime.block_on(future),
        }
    }
}

fn validate_endpoint(endpoint: &str) -> Result<(), SourceBuildError> {
    let invalid = |reason: String| SourceBuildError::InvalidEndpoint {
        endpoint: endpoint.to_owned(),
        reason,
    };
    let parsed = Url::parse(endpoint).map_err(|err| invalid(err.to_string()))?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        other => Err(invalid(format!("unsupported scheme {other:?}"))),
    }
}
