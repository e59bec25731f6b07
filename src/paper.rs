//! Paper metadata scraped from proceedings pages

use serde::Serialize;

use crate::fetch::distinct;

/// One paper as parsed from a listing page and optionally its detail page
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PaperRecord {
    /// Sequential identifier, assigned when the records are exported
    pub id: Option<u32>,
    pub title: String,
    /// Authors in listing order
    pub authors: Vec<String>,
    pub keywords: Vec<String>,
    /// Link to the paper PDF
    pub pdf: String,
    /// Link to the code repository
    pub code: String,
    /// Links to supplementary material
    pub supps: Vec<String>,
    /// Per-paper page with extended metadata
    pub detail_url: String,
    pub r#abstract: String,
    /// One-line summary
    pub tldr: String,
    /// arXiv link or identifier
    pub arxiv: String,
    /// Semantic Scholar link or identifier
    pub semsch: String,
    /// BibTeX citation
    pub bibtex: String,
}

impl PaperRecord {
    /// Creates a record with just a title
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    /// Returns whether the record links to a detail page
    pub fn has_detail_url(&self) -> bool {
        !self.detail_url.trim().is_empty()
    }
}

/// Distinct non-empty detail URLs in record order
pub fn detail_urls(records: &[PaperRecord]) -> Vec<String> {
    let urls = records
        .iter()
        .filter(|r| r.has_detail_url())
        .map(|r| r.detail_url.trim());
    distinct(urls).into_iter().map(str::to_string).collect()
}
