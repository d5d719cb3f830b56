//! Overpass API access: query building, wire types and HTTP transport.
//!
//! An [`OverpassQuery`] pairs a bounding [`gems_core::Region`] with a
//! [`TagSpec`]. It renders to Overpass QL and hashes to a stable cache key.
//! An [`ElementSource`] turns the query into a raw JSON body, which
//! [`parse_response`] decodes into [`RawElement`]s.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//!
//! use gems_core::Region;
//! use gems_data::overpass::{
//!     ElementSource, HttpOverpassSource, HttpOverpassSourceConfig, OverpassQuery, TagSpec,
//!     parse_response,
//! };
//!
//! let config = HttpOverpassSourceConfig::default()
//!     .with_timeout(Duration::from_secs(90))
//!     .with_user_agent("my-app/1.0");
//! let source = HttpOverpassSource::with_config(config)?;
//!
//! let bounds = Region::new(38.5, -123.0, 38.6, -122.9)?;
//! let query = OverpassQuery::new(bounds, TagSpec::points_of_interest());
//! let response = parse_response(&source.fetch(&query)?)?;
//! println!("{} elements", response.elements.len());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod element;
mod error;
mod query;
mod source;

#[doc(hidden)]
pub mod test_support;

pub use element::{Center, ElementKind, OverpassResponse, RawElement, parse_response};
pub use error::FetchError;
pub use query::{OverpassQuery, TagSpec};
pub use source::{
    DEFAULT_ENDPOINT, DEFAULT_USER_AGENT, ElementSource, HttpOverpassSource,
    HttpOverpassSourceConfig, SourceBuildError,
};
