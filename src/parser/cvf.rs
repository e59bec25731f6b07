//! Parser for CVF open access proceedings (openaccess.thecvf.com)
//!
//! Listing pages are a `<dl>` where each paper is a `dt.ptitle` followed by one
//! `dd` with the author search forms and one `dd` with the links and BibTeX:
//!
//! ```html
//! <dt class="ptitle"><a href="/content_CVPR_2020/html/X_paper.html">Title</a></dt>
//! <dd><form><input name="query_author" value="Ann Lee"><a>Ann Lee</a></form>, ...</dd>
//! <dd>[<a href="...pdf">pdf</a>] [<a href="...">supp</a>] [<a href="...">arXiv</a>]
//!     <div class="bibref">@InProceedings{...}</div></dd>
//! ```

use scraper::{ElementRef, Html};
use url::Url;

use super::{absolute_url, clean_text, selector, DocumentParser, ParseError};
use crate::paper::PaperRecord;

/// Parser for CVF open access listing and detail pages
#[derive(Debug, Clone, Default)]
pub struct CvfParser;

impl CvfParser {
    pub fn new() -> Self {
        Self
    }
}

impl DocumentParser for CvfParser {
    fn name(&self) -> &'static str {
        "cvf"
    }

    fn parse_listing(
        &self,
        document: &Html,
        base_url: Option<&str>,
    ) -> Result<Vec<PaperRecord>, ParseError> {
        let base = base_url.and_then(|u| Url::parse(u).ok());
        let title_sel = selector("dt.ptitle")?;
        let link_sel = selector("a")?;

        let mut records = Vec::new();
        for dt in document.select(&title_sel) {
            let anchor = dt.select(&link_sel).next();
            let title = match anchor {
                Some(a) => clean_text(&a),
                None => clean_text(&dt),
            };
            if title.is_empty() {
                return Err(ParseError::MissingField {
                    field: "title",
                    context: dt.html(),
                });
            }

            let mut record = PaperRecord::new(title);
            if let Some(href) = anchor.and_then(|a| a.value().attr("href")) {
                record.detail_url = absolute_url(base.as_ref(), href);
            }

            let mut details = following_dds(dt);
            if let Some(authors_dd) = details.next() {
                record.authors = parse_authors(&authors_dd)?;
            }
            if let Some(links_dd) = details.next() {
                parse_links(&links_dd, base.as_ref(), &mut record)?;
            }

            records.push(record);
        }

        Ok(records)
    }

    fn parse_detail(&self, document: &Html, record: &mut PaperRecord) -> Result<(), ParseError> {
        let abstract_sel = selector("#abstract")?;
        if let Some(div) = document.select(&abstract_sel).next() {
            record.r#abstract = clean_text(&div);
        }
        Ok(())
    }
}

/// The `dd` siblings directly after a `dt`
fn following_dds(dt: ElementRef<'_>) -> impl Iterator<Item = ElementRef<'_>> {
    dt.next_siblings()
        .filter_map(ElementRef::wrap)
        .take_while(|e| e.value().name() == "dd")
}

fn parse_authors(dd: &ElementRef) -> Result<Vec<String>, ParseError> {
    let input_sel = selector(r#"input[name="query_author"]"#)?;
    let mut authors: Vec<String> = dd
        .select(&input_sel)
        .filter_map(|input| input.value().attr("value"))
        .map(|name| name.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|name| !name.is_empty())
        .collect();

    if authors.is_empty() {
        // Older pages list plain comma separated names
        authors = clean_text(dd)
            .split(',')
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty())
            .collect();
    }

    Ok(authors)
}

fn parse_links(
    dd: &ElementRef,
    base: Option<&Url>,
    record: &mut PaperRecord,
) -> Result<(), ParseError> {
    let link_sel = selector("a[href]")?;
    let bib_sel = selector("div.bibref")?;

    for a in dd.select(&link_sel) {
        let Some(href) = a.value().attr("href") else {
            continue;
        };
        let label = clean_text(&a).to_lowercase();
        let url = absolute_url(base, href);

        if label == "pdf" {
            record.pdf = url;
        } else if label.starts_with("supp") {
            record.supps.push(url);
        } else if label == "arxiv" || href.contains("arxiv.org") {
            record.arxiv = url;
        } else if label == "code" || href.contains("github.com") {
            record.code = url;
        }
    }

    if let Some(bib) = dd.select(&bib_sel).next() {
        record.bibtex = bib.text().collect::<String>().trim().to_string();
    }

    Ok(())
}
