//! Page cache persisted as a single JSON file
//!
//! Provides a `PageCache` that keeps every fetched page in memory and replaces the
//! on-disk file atomically when persisted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// File name used when no cache path is configured
pub const DEFAULT_CACHE_FILE: &str = "webpage_cache.json";

/// Errors that can occur when loading or persisting the page cache
#[derive(Debug, Error)]
pub enum CacheError {
    /// Reading, writing or renaming the cache file failed
    #[error("Cache file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The cache file exists but does not contain a valid cache
    #[error("Cache file {path} is corrupt: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The in-memory cache could not be serialized
    #[error("Failed to encode cache: {0}")]
    Encode(#[from] serde_json::Error),
}

/// On-disk layout of the cache file
#[derive(Debug, Serialize, Deserialize)]
struct CacheFile<P> {
    /// When the file was written
    saved_at: DateTime<Utc>,
    /// URL to raw page text
    pages: P,
}

/// In-memory URL to page text mapping backed by one file
///
/// Entries never expire. A run either starts from the previous file or, when
/// asked to clear, from an empty mapping that overwrites the file on persist.
#[derive(Debug, Clone)]
pub struct PageCache {
    /// Where the cache is loaded from and persisted to
    path: PathBuf,
    /// Cached pages keyed by URL
    pages: BTreeMap<String, String>,
}

impl PageCache {
    /// Creates an empty cache that will persist to `path`
    pub fn empty(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            pages: BTreeMap::new(),
        }
    }

    /// Loads the cache stored at `path`
    ///
    /// # Arguments
    /// * `path` - Location of the cache file
    /// * `clear` - Ignore any existing file and start empty
    ///
    /// # Returns
    /// * `Ok(PageCache)` with the stored pages, or empty if there is no file
    /// * `Err(CacheError::Corrupt)` if the file exists but cannot be parsed
    /// * `Err(CacheError::Io)` if the file exists but cannot be read
    pub fn load(path: impl Into<PathBuf>, clear: bool) -> Result<Self, CacheError> {
        let path = path.into();
        if clear {
            info!("Ignoring existing cache at {}", path.display());
            return Ok(Self::empty(path));
        }

        let content = match fs::read(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("No cache file at {}", path.display());
                return Ok(Self::empty(path));
            }
            Err(source) => return Err(CacheError::Io { path, source }),
        };

        let file: CacheFile<BTreeMap<String, String>> = match serde_json::from_slice(&content) {
            Ok(file) => file,
            Err(source) => return Err(CacheError::Corrupt { path, source }),
        };

        info!(
            "Loaded {} cached pages from {} (saved {})",
            file.pages.len(),
            path.display(),
            file.saved_at
        );

        Ok(Self {
            path,
            pages: file.pages,
        })
    }

    /// Returns the file this cache persists to
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns whether a page is cached for `url`
    pub fn contains(&self, url: &str) -> bool {
        self.pages.contains_key(url)
    }

    /// Returns the cached text for `url`
    pub fn get(&self, url: &str) -> Option<&str> {
        self.pages.get(url).map(String::as_str)
    }

    /// Stores `text` for `url`, returning the text it replaced
    pub fn put(&mut self, url: impl Into<String>, text: impl Into<String>) -> Option<String> {
        self.pages.insert(url.into(), text.into())
    }

    /// Number of cached pages
    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Iterates over the cached URLs in sorted order
    pub fn urls(&self) -> impl Iterator<Item = &str> {
        self.pages.keys().map(String::as_str)
    }

    /// Writes the whole cache to disk, replacing the previous file
    ///
    /// The cache is written to a sibling temporary file first and then renamed
    /// over the target, so an interrupted write never leaves a truncated cache.
    pub fn persist(&self) -> Result<(), CacheError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|source| CacheError::Io {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        let file = CacheFile {
            saved_at: Utc::now(),
            pages: &self.pages,
        };
        let json = serde_json::to_string(&file)?;

        let tmp_path = self.tmp_path();
        fs::write(&tmp_path, json).map_err(|source| CacheError::Io {
            path: tmp_path.clone(),
            source,
        })?;
        fs::rename(&tmp_path, &self.path).map_err(|source| CacheError::Io {
            path: self.path.clone(),
            source,
        })?;

        info!("Saved {} pages to {}", self.pages.len(), self.path.display());
        Ok(())
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self.path.clone().into_os_string();
        name.push(".tmp");
        PathBuf::from(name)
    }
}
