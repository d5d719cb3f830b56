//! On-disk cache of verbatim Overpass responses.
//!
//! One file per query, named `osm_data_{key}.json` after
//! [`OverpassQuery::cache_key`](crate::overpass::OverpassQuery::cache_key).
//! Entries are written atomically and never rewritten in place.

use std::io;
use std::time::Duration;

use camino::{Utf8Path, Utf8PathBuf};
use gems_fs::{ensure_dir, file_age, file_is_file, read_to_string, write_atomic};
use thiserror::Error;

/// Default cache directory, relative to the working directory.
pub const DEFAULT_CACHE_DIR: &str = "osm_cache";

/// Errors raised while reading or writing cache entries.
#[derive(Debug, Error)]
pub enum CacheError {
    /// Probing or reading an entry failed.
    #[error("failed to read cache entry {path:?}: {source}")]
    Read {
        /// Entry path.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// Creating the cache directory failed.
    #[error("failed to create cache directory {path:?}: {source}")]
    CreateDir {
        /// Directory path.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// Writing an entry failed.
    #[error("failed to write cache entry {path:?}: {source}")]
    Write {
        /// Entry path.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
}

/// A directory of cached response bodies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseCache {
    dir: Utf8PathBuf,
    max_age: Option<Duration>,
}

impl ResponseCache {
    /// Cache rooted at `dir`. Entries never expire.
    ///
    /// The directory is created on the first [`store`](Self::store).
    #[must_use]
    pub fn new(dir: impl Into<Utf8PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            max_age: None,
        }
    }

    /// Treat entries older than `max_age` as missing.
    #[must_use]
    pub fn with_max_age(mut self, max_age: Duration) -> Self {
        self.max_age = Some(max_age);
        self
    }

    /// Cache directory.
    #[must_use]
    pub fn dir(&self) -> &Utf8Path {
        &self.dir
    }

    /// Expiry, if any.
    #[must_use]
    pub const fn max_age(&self) -> Option<Duration> {
        self.max_age
    }

    /// Path of the entry for `key`.
    #[must_use]
    pub fn path_for(&self, key: &str) -> Utf8PathBuf {
        self.dir.join(format!("osm_data_{key}.json"))
    }

    /// Read the entry for `key`.
    ///
    /// Returns `Ok(None)` when the entry is absent or has expired.
    ///
    /// # Errors
    /// Returns [`CacheError::Read`] when the entry exists but cannot be read.
    pub fn lookup(&self, key: &str) -> Result<Option<String>, CacheError> {
        let path = self.path_for(key);
        let read_error = |source| CacheError::Read {
            path: path.clone(),
            source,
        };
        if !file_is_file(&path).map_err(read_error)? {
            return Ok(None);
        }
        if let Some(max_age) = self.max_age {
            let age = file_age(&path).map_err(read_error)?;
            if age > max_age {
                return Ok(None);
            }
        }
        read_to_string(&path).map(Some).map_err(read_error)
    }

    /// Persist `body` as the entry for `key`, replacing any older entry.
    ///
    /// # Errors
    /// Returns [`CacheError::CreateDir`] or [`CacheError::Write`] when the
    /// directory or file cannot be written.
    pub fn store(&self, key: &str, body: &str) -> Result<Utf8PathBuf, CacheError> {
        ensure_dir(&self.dir).map_err(|source| CacheError::CreateDir {
            path: self.dir.clone(),
            source,
        })?;
        let path = self.path_for(key);
        write_atomic(&path, body).map_err(|source| CacheError::Write {
            path: path.clone(),
            source,
        })?;
        Ok(path)
    }
}

impl Default for ResponseCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_DIR)
    }
}
