use thiserror::Error;

/// Errors raised while querying an Overpass endpoint.
///
/// Messages are captured as strings so the error can be cloned into fetch
/// outcomes and compared in tests.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// The request did not complete within the configured timeout.
    #[error("request to {url} timed out after {timeout_secs}s")]
    Timeout {
        /// Endpoint that was queried.
        url: String,
        /// Configured timeout in whole seconds.
        timeout_secs: u64,
    },
    /// The endpoint answered with a non-success status.
    #[error("request to {url} failed with status {status}: {message}")]
    Http {
        /// Endpoint that was queried.
        url: String,
        /// HTTP status code.
        status: u16,
        /// Error description from the client.
        message: String,
    },
    /// The request failed before a response arrived.
    #[error("network error contacting {url}: {message}")]
    Network {
        /// Endpoint that was queried.
        url: String,
        /// Error description from the client.
        message: String,
    },
    /// The body was not a valid Overpass JSON document.
    #[error("failed to parse Overpass response: {message}")]
    Parse {
        /// Parser error description.
        message: String,
    },
}
