//! Pipeline driver
//!
//! Runs one scrape: load the cache, resolve the listing pages, parse them into
//! paper records, resolve the detail pages those records link to, export the
//! catalog, and persist the cache on every exit path.

use std::path::PathBuf;

use thiserror::Error;
use tracing::{error, info};

use crate::cache::{CacheError, PageCache, DEFAULT_CACHE_FILE};
use crate::document::HtmlBackend;
use crate::export::{self, ExportError};
use crate::fetch::{self, FetchReport, Fetcher, ResolveError, Source};
use crate::paper::{self, PaperRecord};
use crate::parser::{DocumentParser, ParseError};

/// Errors that end a pipeline run
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The cache could not be loaded or persisted
    #[error(transparent)]
    Cache(#[from] CacheError),

    /// A source could not be resolved
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    /// The parser failed on a document
    #[error("Failed to parse {source_id}: {error}")]
    Parse {
        source_id: String,
        #[source]
        error: ParseError,
    },

    /// Writing output files failed
    #[error(transparent)]
    Export(#[from] ExportError),
}

/// Settings for one pipeline run
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Conference name, e.g. `cvpr2020`
    pub name: String,
    /// Topic label, used in the output file name
    pub topic: String,
    /// Listing pages to scrape, URLs and/or local files
    pub sources: Vec<Source>,
    /// Dump every resolved listing page into `html/`
    pub save_htmls: bool,
    /// Location of the page cache file
    pub cache_path: PathBuf,
    /// Start from an empty cache, overwriting the file on exit
    pub clear_cache: bool,
    /// Directory holding `tsv/` and `html/`
    pub output_dir: PathBuf,
    /// How page text is parsed into HTML
    pub backend: HtmlBackend,
    /// Write the TSV catalog
    pub export_tsv: bool,
}

impl PipelineConfig {
    /// Creates a config with default settings
    pub fn new(name: impl Into<String>, topic: impl Into<String>, sources: Vec<Source>) -> Self {
        Self {
            name: name.into(),
            topic: topic.into(),
            sources,
            save_htmls: false,
            cache_path: PathBuf::from(DEFAULT_CACHE_FILE),
            clear_cache: false,
            output_dir: PathBuf::from("."),
            backend: HtmlBackend::default(),
            export_tsv: true,
        }
    }

    /// Path of the TSV catalog: `<output_dir>/tsv/<name>-<topic>.tsv`
    pub fn tsv_path(&self) -> PathBuf {
        self.output_dir
            .join("tsv")
            .join(format!("{}-{}.tsv", self.name, self.topic))
    }

    /// Directory for HTML dumps
    pub fn html_dir(&self) -> PathBuf {
        self.output_dir.join("html")
    }
}

/// Outcome of a successful run
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    /// Counts for the listing page phase
    pub listing: FetchReport,
    /// Counts for the detail page phase
    pub detail: FetchReport,
    /// Every parsed record, in source order
    pub records: Vec<PaperRecord>,
    /// Where the catalog was written, if it was
    pub tsv_path: Option<PathBuf>,
}

/// Scrapes one conference with an injected site parser
pub struct Pipeline {
    config: PipelineConfig,
    parser: Box<dyn DocumentParser>,
}

impl Pipeline {
    pub fn new(config: PipelineConfig, parser: Box<dyn DocumentParser>) -> Self {
        Self { config, parser }
    }

    /// Runs the whole pipeline
    ///
    /// The cache is persisted after the run body whether it succeeded or not. A
    /// body error is returned after persistence; if persisting also fails, that
    /// failure is logged and the body error wins.
    ///
    /// # Returns
    /// * `Ok(RunSummary)` with the phase counts and parsed records
    /// * `Err(PipelineError)` if the cache is corrupt, a local source is missing,
    ///   parsing fails, or output cannot be written
    pub async fn run(&self, fetcher: &Fetcher) -> Result<RunSummary, PipelineError> {
        let mut cache = PageCache::load(&self.config.cache_path, self.config.clear_cache)?;

        let outcome = self.run_with_cache(&mut cache, fetcher).await;

        match (outcome, cache.persist()) {
            (Ok(summary), Ok(())) => Ok(summary),
            (Ok(_), Err(e)) => Err(e.into()),
            (Err(e), Ok(())) => Err(e),
            (Err(e), Err(persist_error)) => {
                error!("Failed to persist cache after error: {}", persist_error);
                Err(e)
            }
        }
    }

    async fn run_with_cache(
        &self,
        cache: &mut PageCache,
        fetcher: &Fetcher,
    ) -> Result<RunSummary, PipelineError> {
        let (mut records, listing) = self.fetch_listings(cache, fetcher).await?;
        info!("Parsed a total of {} papers", records.len());

        let detail = self.fetch_details(cache, fetcher, &mut records).await?;

        let tsv_path = if self.config.export_tsv {
            let path = self.config.tsv_path();
            export::write_tsv(&path, &mut records)?;
            Some(path)
        } else {
            None
        };

        Ok(RunSummary {
            listing,
            detail,
            records,
            tsv_path,
        })
    }

    /// Resolves the listing sources and parses each one in source order
    async fn fetch_listings(
        &self,
        cache: &mut PageCache,
        fetcher: &Fetcher,
    ) -> Result<(Vec<PaperRecord>, FetchReport), PipelineError> {
        let resolved =
            fetch::resolve(cache, fetcher, &self.config.sources, self.config.backend).await?;

        if self.config.save_htmls {
            let dir = self.config.html_dir();
            for doc in &resolved.documents {
                export::save_html(&dir, &doc.source.id(), &doc.document)?;
            }
        }

        let mut records = Vec::new();
        for doc in &resolved.documents {
            let parsed = self
                .parser
                .parse_listing(&doc.document, doc.source.url())
                .map_err(|error| {
                    error!(
                        "Error parsing {} with {} parser: {}",
                        doc.source,
                        self.parser.name(),
                        error
                    );
                    PipelineError::Parse {
                        source_id: doc.source.id(),
                        error,
                    }
                })?;
            info!("Parsed {} papers from {}", parsed.len(), doc.source);
            records.extend(parsed);
        }

        Ok((records, resolved.report))
    }

    /// Fetches the detail pages linked from `records` and offers each to the parser
    async fn fetch_details(
        &self,
        cache: &mut PageCache,
        fetcher: &Fetcher,
        records: &mut [PaperRecord],
    ) -> Result<FetchReport, PipelineError> {
        let sources: Vec<Source> = paper::detail_urls(records)
            .into_iter()
            .map(Source::Remote)
            .collect();

        let resolved = fetch::resolve(cache, fetcher, &sources, self.config.backend).await?;

        for doc in &resolved.documents {
            let Some(url) = doc.source.url() else {
                continue;
            };
            for record in records.iter_mut().filter(|r| r.detail_url.trim() == url) {
                self.parser
                    .parse_detail(&doc.document, record)
                    .map_err(|error| PipelineError::Parse {
                        source_id: url.to_string(),
                        error,
                    })?;
            }
        }

        Ok(resolved.report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::CvfParser;
    use std::fs;
    use tempfile::TempDir;

    struct FailingParser;

    impl DocumentParser for FailingParser {
        fn name(&self) -> &'static str {
            "failing"
        }

        fn parse_listing(
            &self,
            _: &scraper::Html,
            _: Option<&str>,
        ) -> Result<Vec<PaperRecord>, ParseError> {
            Err(ParseError::Site("unexpected layout".to_string()))
        }
    }

    fn test_config(temp_dir: &TempDir, sources: Vec<Source>) -> PipelineConfig {
        let mut config = PipelineConfig::new("cvpr2020", "adv", sources);
        config.cache_path = temp_dir.path().join("cache.json");
        config.output_dir = temp_dir.path().to_path_buf();
        config
    }

    const LISTING: &str = r#"<dl>
<dt class="ptitle"><a href="notes/a.html">Local Paper</a></dt>
<dd>Ann Lee</dd>
<dd>[<a href="a.pdf">pdf</a>]</dd>
</dl>"#;

    #[test]
    fn test_config_defaults_and_paths() {
        let config = PipelineConfig::new("cvpr2020", "adv", Vec::new());

        assert_eq!(config.cache_path, PathBuf::from(DEFAULT_CACHE_FILE));
        assert!(!config.save_htmls);
        assert!(!config.clear_cache);
        assert!(config.export_tsv);
        assert_eq!(config.backend, HtmlBackend::Document);
        assert_eq!(config.tsv_path(), PathBuf::from("./tsv/cvpr2020-adv.tsv"));
        assert_eq!(config.html_dir(), PathBuf::from("./html"));
    }

    #[tokio::test]
    async fn test_empty_sources_still_persists_cache() {
        let temp_dir = TempDir::new().unwrap();
        let config = test_config(&temp_dir, Vec::new());
        let cache_path = config.cache_path.clone();

        let summary = Pipeline::new(config, Box::new(CvfParser::new()))
            .run(&Fetcher::new())
            .await
            .expect("Empty run should succeed");

        assert!(summary.records.is_empty());
        assert_eq!(summary.listing, FetchReport::default());
        assert_eq!(summary.detail, FetchReport::default());
        assert!(cache_path.exists(), "Cache should be persisted");
    }

    #[tokio::test]
    async fn test_local_listing_is_parsed_and_exported() {
        let temp_dir = TempDir::new().unwrap();
        let listing = temp_dir.path().join("day1.html");
        fs::write(&listing, LISTING).unwrap();
        let mut config = test_config(&temp_dir, vec![Source::Local(listing)]);
        config.save_htmls = true;

        let pipeline = Pipeline::new(config, Box::new(CvfParser::new()));
        let summary = pipeline.run(&Fetcher::new()).await.unwrap();

        assert_eq!(summary.records.len(), 1);
        assert_eq!(summary.records[0].title, "Local Paper");
        assert_eq!(summary.records[0].id, Some(1));
        // Relative detail link from a local file is not an http URL and fails to fetch
        assert_eq!(summary.detail.fetched, 1);
        assert_eq!(summary.detail.succeeded, 0);

        let tsv = summary.tsv_path.expect("TSV should be written");
        assert_eq!(tsv, temp_dir.path().join("tsv").join("cvpr2020-adv.tsv"));
        assert!(fs::read_to_string(tsv).unwrap().contains("Local Paper"));
        assert!(temp_dir.path().join("html").join("day1.html.html").exists());
    }

    #[tokio::test]
    async fn test_parser_failure_still_persists_cache() {
        let temp_dir = TempDir::new().unwrap();
        let url = "http://127.0.0.1:1/listing".to_string();
        let mut seeded = PageCache::empty(temp_dir.path().join("cache.json"));
        seeded.put(url.as_str(), LISTING);
        seeded.persist().unwrap();
        let config = test_config(&temp_dir, vec![Source::Remote(url.clone())]);
        let tsv_path = config.tsv_path();

        let result = Pipeline::new(config, Box::new(FailingParser)).run(&Fetcher::new()).await;

        match result {
            Err(PipelineError::Parse { source_id, .. }) => assert_eq!(source_id, url),
            other => panic!("Expected parse error, got {:?}", other.map(|s| s.records.len())),
        }
        let reloaded = PageCache::load(temp_dir.path().join("cache.json"), false).unwrap();
        assert_eq!(reloaded.get(&url), Some(LISTING));
        assert!(!tsv_path.exists(), "No partial catalog should be written");
    }

    #[tokio::test]
    async fn test_corrupt_cache_fails_without_overwriting() {
        let temp_dir = TempDir::new().unwrap();
        let config = test_config(&temp_dir, Vec::new());
        fs::write(&config.cache_path, "not json").unwrap();
        let cache_path = config.cache_path.clone();

        let result = Pipeline::new(config, Box::new(CvfParser::new())).run(&Fetcher::new()).await;

        assert!(matches!(result, Err(PipelineError::Cache(CacheError::Corrupt { .. }))));
        assert_eq!(fs::read_to_string(cache_path).unwrap(), "not json");
    }

    #[tokio::test]
    async fn test_missing_local_source_persists_cache_and_fails() {
        let temp_dir = TempDir::new().unwrap();
        let missing = Source::Local(temp_dir.path().join("missing.html"));
        let config = test_config(&temp_dir, vec![missing]);
        let cache_path = config.cache_path.clone();

        let result = Pipeline::new(config, Box::new(CvfParser::new())).run(&Fetcher::new()).await;

        assert!(matches!(result, Err(PipelineError::Resolve(_))));
        assert!(cache_path.exists());
    }
}
