//! HTML parsing backend selection

use scraper::Html;

/// How raw page text is turned into an HTML tree
///
/// `Document` runs the full html5ever document algorithm and is the default.
/// `Fragment` parses the text as a body fragment, which is more forgiving with
/// saved snippets that lack the usual `<html>`/`<body>` scaffolding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum HtmlBackend {
    #[default]
    Document,
    Fragment,
}

impl HtmlBackend {
    /// Parses a backend name (case-insensitive)
    ///
    /// Returns `None` if the name doesn't match any backend.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<HtmlBackend> {
        match s.to_lowercase().trim() {
            "document" | "doc" => Some(HtmlBackend::Document),
            "fragment" | "frag" => Some(HtmlBackend::Fragment),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            HtmlBackend::Document => "document",
            HtmlBackend::Fragment => "fragment",
        }
    }

    /// Parses raw text into an HTML tree
    pub fn parse(self, text: &str) -> Html {
        match self {
            HtmlBackend::Document => Html::parse_document(text),
            HtmlBackend::Fragment => Html::parse_fragment(text),
        }
    }
}
