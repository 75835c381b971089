//! Scout Tools smoke harness.
//!
//! Drives the cache controller through a full install → activate → fetch →
//! revalidate loop against a real origin and prints a JSON summary. Used to
//! validate the offline caching policy outside the test suite.

use std::sync::Arc;
use std::time::Instant;

use anyhow::{bail, Context};
use serde_json::json;
use tracing::info;
use url::Url;

use scout_common::{init_logging, LogConfig};
use scout_sw::{
    CacheController, CacheStorage, FetchRequest, HttpNetwork, LifecycleEvent, MemoryCacheStorage,
    SwConfig, SwEvent,
};

/// Parsed command line arguments.
struct Args {
    /// Scope (origin) to install against.
    scope: Option<String>,
    /// Optional JSON config file overriding the default manifest.
    config: Option<String>,
    /// Path to fetch after activation.
    fetch: String,
}

impl Args {
    fn parse() -> anyhow::Result<Self> {
        let mut args = Args {
            scope: None,
            config: None,
            fetch: "index.html".to_string(),
        };
        let mut iter = std::env::args().skip(1);
        while let Some(arg) = iter.next() {
            match arg.as_str() {
                "--scope" => args.scope = iter.next(),
                "--config" => args.config = iter.next(),
                "--fetch" => {
                    args.fetch = iter
                        .next()
                        .context("--fetch requires a path argument")?;
                }
                other => bail!("unknown argument: {}", other),
            }
        }
        Ok(args)
    }
}

fn load_config(args: &Args) -> anyhow::Result<SwConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("reading config file {}", path))?;
            SwConfig::from_json(&json)?
        }
        None => SwConfig::default(),
    };
    if let Some(scope) = &args.scope {
        config.scope = Url::parse(scope).with_context(|| format!("invalid scope {}", scope))?;
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging(LogConfig::default().with_filter("scout=debug"));

    let args = Args::parse()?;
    let config = load_config(&args)?;
    let fetch_url = config.resource_url(&args.fetch)?;

    let storage = Arc::new(MemoryCacheStorage::new());
    let network = Arc::new(HttpNetwork::new()?);
    let (controller, mut events) =
        CacheController::new(config.clone(), storage.clone(), network)?;

    let start = Instant::now();
    controller.dispatch(LifecycleEvent::Install).await?;
    let install_ms = start.elapsed().as_secs_f64() * 1000.0;

    let start = Instant::now();
    controller.dispatch(LifecycleEvent::Activate).await?;
    let activate_ms = start.elapsed().as_secs_f64() * 1000.0;

    // First fetch should be served from the precache; it also kicks off a
    // background revalidation.
    let request = FetchRequest::get(fetch_url.clone()).with_header("accept", "text/html");
    let start = Instant::now();
    let first = controller.handle_fetch(request.clone()).await?;
    let first_ms = start.elapsed().as_secs_f64() * 1000.0;

    let start = Instant::now();
    let second = controller.handle_fetch(request).await?;
    let second_ms = start.elapsed().as_secs_f64() * 1000.0;

    let mut purged = Vec::new();
    let mut claimed = false;
    while let Ok(event) = events.try_recv() {
        match event {
            SwEvent::GenerationPurged { name } => purged.push(name),
            SwEvent::ClientsClaimed => claimed = true,
            SwEvent::PhaseChange { phase } => info!(?phase, "phase change"),
        }
    }

    let summary = json!({
        "generation": config.cache_name,
        "precached": storage.entries(&config.cache_name).await?.len(),
        "phase": format!("{:?}", controller.phase().await),
        "clients_claimed": claimed,
        "purged_generations": purged,
        "install_ms": (install_ms * 100.0).round() / 100.0,
        "activate_ms": (activate_ms * 100.0).round() / 100.0,
        "fetch": {
            "url": fetch_url.as_str(),
            "first": { "status": first.status, "from_cache": first.from_cache, "ms": (first_ms * 100.0).round() / 100.0 },
            "second": { "status": second.status, "from_cache": second.from_cache, "ms": (second_ms * 100.0).round() / 100.0 },
        },
    });

    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
