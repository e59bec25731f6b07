use std::fmt;
use std::path::PathBuf;

/// Where a document comes from
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Source {
    /// An `http://` or `https://` URL, fetched through the cache
    Remote(String),
    /// A file on disk, read directly and never cached
    Local(PathBuf),
}

impl Source {
    /// Classifies a source string by its scheme prefix
    ///
    /// Anything that does not start with `http://` or `https://` is a local path.
    pub fn parse(s: &str) -> Self {
        if s.starts_with("http://") || s.starts_with("https://") {
            Source::Remote(s.to_string())
        } else {
            Source::Local(PathBuf::from(s))
        }
    }

    /// Identifier used to key resolved documents
    pub fn id(&self) -> String {
        match self {
            Source::Remote(url) => url.clone(),
            Source::Local(path) => path.to_string_lossy().into_owned(),
        }
    }

    /// Returns the URL for remote sources
    pub fn url(&self) -> Option<&str> {
        match self {
            Source::Remote(url) => Some(url),
            Source::Local(_) => None,
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Remote(url) => f.write_str(url),
            Source::Local(path) => write!(f, "{}", path.display()),
        }
    }
}
