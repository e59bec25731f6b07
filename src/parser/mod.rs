//! Site-specific extraction of paper records
//!
//! Each proceedings site implements [`DocumentParser`]. The pipeline calls
//! `parse_listing` once per listing document and `parse_detail` once per record
//! whose detail page was resolved.

pub mod cvf;

use scraper::{ElementRef, Selector};
use thiserror::Error;
use url::Url;

use crate::paper::PaperRecord;

pub use cvf::CvfParser;

/// Errors that can occur while extracting records from a document
#[derive(Debug, Error)]
pub enum ParseError {
    /// A CSS selector failed to compile
    #[error("Invalid selector: '{0}'")]
    Selector(String),

    /// A required field was not found
    #[error("Missing {field} in {context}")]
    MissingField { field: &'static str, context: String },

    /// Site-specific failure
    #[error("{0}")]
    Site(String),
}

/// Extracts paper records from the documents of one proceedings site
pub trait DocumentParser: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Parses every paper listed on a listing page
    ///
    /// # Arguments
    /// * `document` - The parsed listing page
    /// * `base_url` - URL the page came from, for resolving relative links; `None`
    ///   for local files
    fn parse_listing(
        &self,
        document: &scraper::Html,
        base_url: Option<&str>,
    ) -> Result<Vec<PaperRecord>, ParseError>;

    /// Enriches a record from its detail page
    ///
    /// Sites that don't scrape detail pages keep the default, which leaves the
    /// record untouched.
    fn parse_detail(
        &self,
        _document: &scraper::Html,
        _record: &mut PaperRecord,
    ) -> Result<(), ParseError> {
        Ok(())
    }
}

/// Supported proceedings sites
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Site {
    /// CVF open access (CVPR, ICCV, WACV)
    Cvf,
}

impl Site {
    /// Parses a site name, returning `None` if it is unknown
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Site> {
        match s.to_lowercase().trim() {
            "cvf" | "cvpr" | "iccv" | "wacv" | "thecvf" => Some(Site::Cvf),
            _ => None,
        }
    }

    /// Builds the parser for this site
    pub fn parser(self) -> Box<dyn DocumentParser> {
        match self {
            Site::Cvf => Box::new(CvfParser::new()),
        }
    }
}

/// Compiles a CSS selector
pub(crate) fn selector(css: &str) -> Result<Selector, ParseError> {
    Selector::parse(css).map_err(|_| ParseError::Selector(css.to_string()))
}

/// Element text with runs of whitespace collapsed
pub(crate) fn clean_text(element: &ElementRef) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Resolves `href` against `base`, keeping it as-is when that is not possible
pub(crate) fn absolute_url(base: Option<&Url>, href: &str) -> String {
    let href = href.trim();
    match base.and_then(|base| base.join(href).ok()) {
        Some(url) => url.to_string(),
        None => href.to_string(),
    }
}
