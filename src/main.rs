//! confpapers - Scrape paper listings from conference proceedings
//!
//! Fetches listing pages (and the detail pages they link to), parses paper
//! metadata, and writes a TSV catalog. Fetched pages are cached on disk.

use std::error::Error;
use std::process::ExitCode;

use clap::Parser;
use tracing::{info, Level};
use tracing_subscriber::{fmt, EnvFilter};

use confpapers::cli::{Cli, StartupConfig};
use confpapers::fetch::Fetcher;
use confpapers::pipeline::Pipeline;

/// Sets up logging: RUST_LOG wins, otherwise info (or debug with --verbose)
fn init_tracing(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.to_string()));

    fmt().with_env_filter(filter).with_target(false).init();
}

/// Formats an error followed by its chain of sources
fn error_chain(e: &dyn Error) -> String {
    let mut message = e.to_string();
    let mut source = e.source();
    while let Some(cause) = source {
        let cause_message = cause.to_string();
        // thiserror messages often embed their source already
        if !message.contains(&cause_message) {
            message.push_str(": ");
            message.push_str(&cause_message);
        }
        source = cause.source();
    }
    message
}

async fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    let config = StartupConfig::from_cli(&cli)?;
    let parser = config.site.parser();
    info!(
        "Scraping {}-{} from {} sources with the {} parser ({} HTML)",
        config.pipeline.name,
        config.pipeline.topic,
        config.pipeline.sources.len(),
        parser.name(),
        config.pipeline.backend.name()
    );

    let pipeline = Pipeline::new(config.pipeline, parser);
    let summary = pipeline.run(&Fetcher::new()).await?;

    info!(
        "Done: {} papers; listing pages {}/{} fetched OK ({} cached, {} failed); \
         detail pages {}/{} fetched OK ({} cached, {} failed)",
        summary.records.len(),
        summary.listing.succeeded,
        summary.listing.fetched,
        summary.listing.cached,
        summary.listing.failed(),
        summary.detail.succeeded,
        summary.detail.fetched,
        summary.detail.cached,
        summary.detail.failed()
    );
    if let Some(path) = summary.tsv_path {
        info!("Catalog written to {}", path.display());
    }

    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", error_chain(e.as_ref()));
            ExitCode::FAILURE
        }
    }
}
