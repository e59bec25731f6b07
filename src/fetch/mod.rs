//! Fetching of listing and detail pages
//!
//! The [`Fetcher`] issues one GET per URL concurrently and reports each outcome as
//! data. The orchestrator functions sit on top of it and the [`PageCache`], fetching
//! only what the cache does not already hold.
//!
//! [`PageCache`]: crate::cache::PageCache

mod fetcher;
mod orchestrator;
mod source;

pub use fetcher::{FetchResult, Fetcher};
pub(crate) use orchestrator::distinct;
pub use orchestrator::{
    fetch_missing, resolve, FetchReport, ResolveError, Resolved, ResolvedDocument,
};
pub use source::Source;
