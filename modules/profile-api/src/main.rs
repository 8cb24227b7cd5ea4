use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use brightdata_client::BrightDataClient;
use memory_client::MemoryClient;
use profile_api::{build_router, AppConfig, AppState};
use profile_resolver::{
    BrightDataProvider, InMemoryCache, MemoryServerCache, ProfileCache, ProfileProvider, Resolver,
};

#[derive(Parser)]
#[command(name = "profile-api", about = "Cache-first LinkedIn profile resolution service")]
struct Cli {
    #[arg(long, env = "WEB_HOST", default_value = "0.0.0.0")]
    host: String,

    #[arg(long, env = "WEB_PORT", default_value_t = 8001)]
    port: u16,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    let cli = Cli::parse();
    let config = AppConfig::from_env()?;

    let mut brightdata = BrightDataClient::new(
        config.brightdata_api_token.clone(),
        config.brightdata_dataset_id.clone(),
    )
    .with_polling(config.brightdata_poll_interval, config.brightdata_max_polls);
    if let Some(base_url) = &config.brightdata_base_url {
        brightdata = brightdata.with_base_url(base_url);
    }
    let provider: Arc<dyn ProfileProvider> = Arc::new(BrightDataProvider::new(brightdata));

    let cache: Arc<dyn ProfileCache> = match &config.memory_server_url {
        Some(url) => {
            let client = MemoryClient::new(url, config.cache_timeout)
                .context("Failed to build memory server client")?;
            tracing::info!(url = %url, namespace = %config.memory_namespace, "Using memory server cache");
            Arc::new(MemoryServerCache::new(
                client,
                config.memory_namespace.clone(),
                Some(config.cache_freshness),
            ))
        }
        None => {
            tracing::warn!("MEMORY_SERVER_URL not set, using process-local cache");
            Arc::new(InMemoryCache::new(Some(config.cache_freshness)))
        }
    };

    let resolver = Resolver::new(cache.clone(), provider, config.resolver_config());
    let app = build_router(AppState { resolver, cache });

    let addr = format!("{}:{}", cli.host, cli.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    tracing::info!(addr = %addr, "profile-api listening");

    axum::serve(listener, app).await?;
    Ok(())
}
