// pricescrape: resolve marketplace listing URLs to product records.
//
// Usage: pricescrape <listing-url>...
// Records are printed as JSON lines, followed by cache and tier statistics.

use anyhow::{Context, Result};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

use pricescrape::utils::constants::COOKIE_SNAPSHOT_FILE;
use pricescrape::{Resolver, ResolverConfig};

fn env_flag(name: &str) -> Option<bool> {
    std::env::var(name)
        .ok()
        .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
}

fn env_string(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn config_from_env() -> Result<ResolverConfig> {
    let mut builder = ResolverConfig::builder();

    if let Some(ttl) = env_string("PRICESCRAPE_CACHE_TTL_SECS") {
        let secs: u64 = ttl
            .parse()
            .with_context(|| format!("PRICESCRAPE_CACHE_TTL_SECS is not a number: {ttl}"))?;
        builder = builder.cache_ttl(Duration::from_secs(secs));
    }
    if let Some(use_relay) = env_flag("PRICESCRAPE_USE_RELAY") {
        builder = builder.relay_enabled(use_relay);
    }
    builder = builder
        .relay_api_key(env_string("PRICESCRAPE_RELAY_API_KEY"))
        .primary_api_token(env_string("PRICESCRAPE_API_TOKEN"));
    if let Some(headless) = env_flag("PRICESCRAPE_HEADLESS") {
        builder = builder.headless(headless);
    }
    if let Some(eager) = env_flag("PRICESCRAPE_INIT_BROWSER_ON_STARTUP") {
        builder = builder.initialize_browser_on_startup(eager);
    }

    let cookie_file = env_string("PRICESCRAPE_COOKIE_FILE").map(PathBuf::from).or_else(|| {
        dirs::data_dir().map(|dir| dir.join("pricescrape").join(COOKIE_SNAPSHOT_FILE))
    });
    builder = builder.cookie_file(cookie_file);

    builder.build()
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let urls: Vec<String> = std::env::args().skip(1).collect();
    if urls.is_empty() {
        eprintln!("usage: pricescrape <listing-url>...");
        std::process::exit(2);
    }

    let resolver = Resolver::from_config(config_from_env()?)?;
    resolver.start().await;
    resolver.start_cache_sweeper(Duration::from_secs(300));

    let mut failures = 0usize;
    for url in &urls {
        match resolver.resolve(url).await {
            Ok(record) => println!("{}", serde_json::to_string(&record)?),
            Err(e) => {
                failures += 1;
                tracing::error!("{url}: {e}");
            }
        }
    }

    println!("{}", serde_json::to_string(&resolver.cache_stats())?);
    for snapshot in resolver.stats() {
        println!("{}", serde_json::to_value(snapshot)?);
    }

    resolver.shutdown().await;

    if failures > 0 {
        std::process::exit(1);
    }
    Ok(())
}
