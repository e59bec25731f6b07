//! Conference Papers Library
//!
//! Fetches conference proceedings listing pages, parses paper metadata from them,
//! and caches every fetched page on disk so repeated runs only fetch what is new.

pub mod cache;
pub mod cli;
pub mod document;
pub mod export;
pub mod fetch;
pub mod paper;
pub mod parser;
pub mod pipeline;
