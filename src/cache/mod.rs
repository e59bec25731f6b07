//! Cache module for storing fetched pages to disk
//!
//! This module provides a page cache that maps URLs to the raw text fetched from
//! them. The whole mapping is loaded once when a run starts and written back in a
//! single atomic replace when the run ends, so later runs only fetch what is missing.

mod manager;

pub use manager::{CacheError, PageCache, DEFAULT_CACHE_FILE};
