//! Cache-aware resolution of sources into documents
//!
//! Splits sources into URLs and local files, fetches only the URLs missing from the
//! cache, and parses everything that is available into HTML documents.

use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::PathBuf;

use scraper::Html;
use thiserror::Error;
use tracing::{info, warn};

use super::{FetchResult, Fetcher, Source};
use crate::cache::PageCache;
use crate::document::HtmlBackend;

/// Errors that can occur when resolving sources
#[derive(Debug, Error)]
pub enum ResolveError {
    /// A local source could not be read
    #[error("Failed to read local source {path}: {source}")]
    LocalSource {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Counts reported after one fetch phase
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FetchReport {
    /// Distinct URLs requested
    pub requested: usize,
    /// URLs skipped because the cache already held them
    pub cached: usize,
    /// URLs sent to the fetcher
    pub fetched: usize,
    /// Fetched URLs that returned a page
    pub succeeded: usize,
}

impl FetchReport {
    /// Fetched URLs that failed and stay out of the cache
    pub fn failed(&self) -> usize {
        self.fetched - self.succeeded
    }
}

/// A source together with its parsed document
#[derive(Debug)]
pub struct ResolvedDocument {
    /// The source identifier (URL or path)
    pub source: Source,
    /// The parsed HTML
    pub document: Html,
}

/// Output of [`resolve`]
#[derive(Debug)]
pub struct Resolved {
    /// Documents in source order; failed URLs are absent
    pub documents: Vec<ResolvedDocument>,
    /// Counts for the network part of the phase
    pub report: FetchReport,
}

/// Fetches the URLs the cache does not hold yet and stores every success
///
/// URLs already cached are never fetched again. Failures are logged and left out
/// of the cache so a later run retries them.
pub async fn fetch_missing(
    cache: &mut PageCache,
    fetcher: &Fetcher,
    urls: &[String],
) -> FetchReport {
    let requested = distinct(urls.iter().map(String::as_str));
    let to_fetch: Vec<String> = requested
        .iter()
        .filter(|url| !cache.contains(url))
        .map(|url| url.to_string())
        .collect();

    info!(
        "Fetching {} pages, {} not in cache",
        requested.len(),
        to_fetch.len()
    );

    let results = fetcher.fetch_all(&to_fetch).await;

    let mut succeeded = 0;
    for (url, result) in to_fetch.iter().zip(results) {
        match result {
            FetchResult::Success(text) => {
                succeeded += 1;
                cache.put(url.as_str(), text);
            }
            FetchResult::Failure(reason) => warn!("Failed {} ({})", url, reason),
        }
    }

    info!("Fetched {} pages, {} OK", to_fetch.len(), succeeded);

    FetchReport {
        requested: requested.len(),
        cached: requested.len() - to_fetch.len(),
        fetched: to_fetch.len(),
        succeeded,
    }
}

/// Resolves sources into parsed documents
///
/// Remote sources go through [`fetch_missing`] and are parsed from the cache.
/// Local sources are read from disk and parsed without touching the cache.
/// Documents come back in source order with duplicates resolved once.
///
/// # Returns
/// * `Ok(Resolved)` with every available document and the fetch counts
/// * `Err(ResolveError::LocalSource)` if a local file cannot be read
pub async fn resolve(
    cache: &mut PageCache,
    fetcher: &Fetcher,
    sources: &[Source],
    backend: HtmlBackend,
) -> Result<Resolved, ResolveError> {
    let urls: Vec<String> = sources
        .iter()
        .filter_map(|source| source.url().map(str::to_string))
        .collect();

    let report = fetch_missing(cache, fetcher, &urls).await;

    let mut seen = HashSet::new();
    let mut documents = Vec::new();
    for source in sources {
        if !seen.insert(source) {
            continue;
        }
        let document = match source {
            Source::Remote(url) => match cache.get(url) {
                Some(text) => backend.parse(text),
                None => continue,
            },
            Source::Local(path) => {
                let text =
                    fs::read_to_string(path).map_err(|source| ResolveError::LocalSource {
                        path: path.clone(),
                        source,
                    })?;
                backend.parse(&text)
            }
        };
        documents.push(ResolvedDocument {
            source: source.clone(),
            document,
        });
    }

    info!("Created {} documents", documents.len());

    Ok(Resolved { documents, report })
}

/// Drops repeated entries, keeping first occurrences in order
pub(crate) fn distinct<'a>(items: impl Iterator<Item = &'a str>) -> Vec<&'a str> {
    let mut seen = HashSet::new();
    items.filter(|item| seen.insert(*item)).collect()
}
