//! Output files: the TSV catalog and optional HTML dumps of every source

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use scraper::Html;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::paper::PaperRecord;

/// Column header of the TSV catalog
pub const TSV_COLUMNS: [&str; 12] = [
    "id",
    "title",
    "authors",
    "pdf",
    "code",
    "supps",
    "detail_url",
    "abstract",
    "tldr",
    "arxiv",
    "semsch",
    "bibtex",
];

/// Separator used when a list field is flattened into one cell
const LIST_SEPARATOR: &str = "; ";

/// Errors that can occur when writing output files
#[derive(Debug, Error)]
pub enum ExportError {
    /// Creating a directory or writing a file failed
    #[error("Failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The TSV writer failed
    #[error("Failed to write TSV: {0}")]
    Csv(#[from] csv::Error),
}

/// One row of the TSV catalog
#[derive(Debug, Serialize)]
struct TsvRow<'a> {
    id: u32,
    title: &'a str,
    authors: String,
    pdf: &'a str,
    code: &'a str,
    supps: String,
    detail_url: &'a str,
    r#abstract: &'a str,
    tldr: &'a str,
    arxiv: &'a str,
    semsch: &'a str,
    bibtex: &'a str,
}

impl<'a> TsvRow<'a> {
    fn new(id: u32, record: &'a PaperRecord) -> Self {
        Self {
            id,
            title: &record.title,
            authors: record.authors.join(LIST_SEPARATOR),
            pdf: &record.pdf,
            code: &record.code,
            supps: record.supps.join(LIST_SEPARATOR),
            detail_url: &record.detail_url,
            r#abstract: &record.r#abstract,
            tldr: &record.tldr,
            arxiv: &record.arxiv,
            semsch: &record.semsch,
            bibtex: &record.bibtex,
        }
    }
}

/// Writes records to a tab separated file with a header row
///
/// Records are numbered from 1 in order and their `id` is updated to match.
pub fn write_tsv(path: &Path, records: &mut [PaperRecord]) -> Result<(), ExportError> {
    ensure_parent(path)?;

    let mut wtr = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .from_path(path)?;

    wtr.write_record(TSV_COLUMNS)?;
    for (index, record) in records.iter_mut().enumerate() {
        let id = index as u32 + 1;
        record.id = Some(id);
        wtr.serialize(TsvRow::new(id, record))?;
    }
    wtr.flush().map_err(|source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    info!("Saved {} papers to {}", records.len(), path.display());
    Ok(())
}

/// File name used for the HTML dump of a source
///
/// Takes the last path segment of the URL or file path and appends `.html`.
pub fn html_file_name(source: &str) -> String {
    let base = source
        .trim_end_matches(['/', '\\'])
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default();
    let base = if base.is_empty() { "index" } else { base };
    format!("{}.html", base)
}

/// Writes the serialized document for `source` into `dir`
pub fn save_html(dir: &Path, source: &str, document: &Html) -> Result<PathBuf, ExportError> {
    fs::create_dir_all(dir).map_err(|source| ExportError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    let path = dir.join(html_file_name(source));
    fs::write(&path, document.html()).map_err(|source| ExportError::Io {
        path: path.clone(),
        source,
    })?;

    debug!("Saved {} to {}", source, path.display());
    Ok(path)
}

fn ensure_parent(path: &Path) -> Result<(), ExportError> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            fs::create_dir_all(parent).map_err(|source| ExportError::Io {
                path: parent.to_path_buf(),
                source,
            })
        }
        _ => Ok(()),
    }
}
