//! Contact Search - Main entry point
//!
//! Runs one search against the configured SQLite database and prints the result
//! page as JSON on stdout.
//!
//! The single argument is either a JSON request body (`{"city":"Paris"}`) or a
//! query string (`city=Paris&tags=VIP,Gold&page=2`). Without it the default
//! search runs. An optional second argument is a `nextPageToken` from a previous
//! result and moves the request to that page.

use anyhow::{Context, Result};
use contact_search::cache::{CacheStore, InMemoryCacheStore, NullCacheStore};
use contact_search::repositories::{ContactStore, SqliteContactStore};
use contact_search::{
    Config, ContactSearchRequest, ContactSearchService, ContactSearcher, RawSearchParams,
    SearchSettings, SystemClock,
};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize logging (stderr only, stdout carries the result)
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.as_str()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    info!(database = %config.database_path, "Configuration loaded successfully");

    let mut args = std::env::args().skip(1);
    let mut request = match args.next() {
        Some(arg) => parse_request(&arg)?,
        None => ContactSearchRequest::default(),
    };
    if let Some(token) = args.next() {
        request = request
            .with_page_token(&token)
            .context("Invalid page token")?;
    }

    let store = Arc::new(
        SqliteContactStore::open(&config.database_path)
            .with_context(|| format!("Failed to open {}", config.database_path))?,
    ) as Arc<dyn ContactStore>;

    let clock = Arc::new(SystemClock);
    let cache: Arc<dyn CacheStore> = if config.cache_enabled {
        Arc::new(InMemoryCacheStore::new(clock.clone()))
    } else {
        info!("Caching disabled");
        Arc::new(NullCacheStore)
    };

    let searcher = ContactSearcher::new(store, cache, clock, SearchSettings::from(&config));

    let result = match searcher.search(request).await {
        Ok(result) => result,
        Err(e) => {
            error!("Search failed: {}", e);
            return Err(e.into());
        }
    };

    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

/// Accept a JSON request body or a URL query string.
fn parse_request(arg: &str) -> Result<ContactSearchRequest> {
    let trimmed = arg.trim();
    if trimmed.starts_with('{') {
        serde_json::from_str(trimmed).context("Invalid JSON search request")
    } else {
        Ok(RawSearchParams::from_query_string(trimmed).into_request())
    }
}
