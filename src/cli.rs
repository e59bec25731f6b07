//! Command-line interface parsing for the conference paper scraper
//!
//! This module handles parsing of CLI arguments using clap and turns them into a
//! `PipelineConfig` plus the site parser to run.

use std::path::PathBuf;

use clap::Parser;
use thiserror::Error;

use crate::cache::DEFAULT_CACHE_FILE;
use crate::document::HtmlBackend;
use crate::fetch::Source;
use crate::parser::Site;
use crate::pipeline::PipelineConfig;

/// Error types for CLI argument parsing
#[derive(Debug, Error)]
pub enum CliError {
    /// The specified site name is not recognized
    #[error("Invalid site: '{0}'. Valid sites: cvf (cvpr, iccv, wacv)")]
    InvalidSite(String),

    /// The specified HTML mode is not recognized
    #[error("Invalid HTML mode: '{0}'. Valid modes: document, fragment")]
    InvalidHtmlMode(String),
}

/// Scrape paper listings from conference proceedings sites
#[derive(Parser, Debug)]
#[command(name = "confpapers")]
#[command(about = "Scrape conference paper listings with a resumable page cache")]
#[command(version)]
pub struct Cli {
    /// Conference name, e.g. cvpr2020
    #[arg(long)]
    pub name: String,

    /// Topic label used in the output file name, e.g. adv
    #[arg(long)]
    pub topic: String,

    /// Listing pages to scrape: http(s) URLs and/or local HTML files
    #[arg(value_name = "SOURCE")]
    pub sources: Vec<String>,

    /// Site parser to use
    #[arg(long, default_value = "cvf")]
    pub site: String,

    /// Save every listing page into html/ for debugging
    #[arg(long)]
    pub save_htmls: bool,

    /// Location of the page cache file
    #[arg(long, default_value = DEFAULT_CACHE_FILE)]
    pub cache_path: PathBuf,

    /// Ignore the existing cache and overwrite it at the end of the run
    #[arg(long)]
    pub clear_cache: bool,

    /// Directory that receives tsv/ and html/
    #[arg(long, default_value = ".")]
    pub output_dir: PathBuf,

    /// How pages are parsed: document or fragment
    #[arg(long, default_value = "document")]
    pub html_mode: String,

    /// Skip writing the TSV catalog
    #[arg(long)]
    pub no_tsv: bool,

    /// Log debug output (overridden by RUST_LOG)
    #[arg(short, long)]
    pub verbose: bool,
}

/// Configuration derived from CLI arguments for a run
#[derive(Debug, Clone)]
pub struct StartupConfig {
    /// Pipeline settings
    pub pipeline: PipelineConfig,
    /// Site whose parser is injected into the pipeline
    pub site: Site,
}

/// Parses a site string argument into a Site.
pub fn parse_site_arg(s: &str) -> Result<Site, CliError> {
    Site::from_str(s).ok_or_else(|| CliError::InvalidSite(s.to_string()))
}

/// Parses an HTML mode string argument into an HtmlBackend.
pub fn parse_html_mode_arg(s: &str) -> Result<HtmlBackend, CliError> {
    HtmlBackend::from_str(s).ok_or_else(|| CliError::InvalidHtmlMode(s.to_string()))
}

impl StartupConfig {
    /// Creates a StartupConfig from parsed CLI arguments.
    ///
    /// # Returns
    /// * `Ok(StartupConfig)` with appropriate settings
    /// * `Err(CliError)` if the site or HTML mode is unknown
    pub fn from_cli(cli: &Cli) -> Result<Self, CliError> {
        let site = parse_site_arg(&cli.site)?;
        let backend = parse_html_mode_arg(&cli.html_mode)?;

        let sources = cli.sources.iter().map(|s| Source::parse(s)).collect();
        let mut pipeline = PipelineConfig::new(cli.name.clone(), cli.topic.clone(), sources);
        pipeline.save_htmls = cli.save_htmls;
        pipeline.cache_path = cli.cache_path.clone();
        pipeline.clear_cache = cli.clear_cache;
        pipeline.output_dir = cli.output_dir.clone();
        pipeline.backend = backend;
        pipeline.export_tsv = !cli.no_tsv;

        Ok(StartupConfig { pipeline, site })
    }
}
