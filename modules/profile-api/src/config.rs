use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};

use brightdata_client::LINKEDIN_PROFILE_DATASET;
use profile_resolver::{CategoryVocabulary, ResolverConfig};

/// Service configuration loaded from environment variables (and `.env`).
#[derive(Debug, Clone)]
pub struct AppConfig {
    // BrightData
    pub brightdata_api_token: String,
    pub brightdata_dataset_id: String,
    pub brightdata_base_url: Option<String>,
    pub brightdata_poll_interval: Duration,
    pub brightdata_max_polls: u32,

    // Memory server
    pub memory_server_url: Option<String>,
    pub memory_namespace: String,
    pub cache_freshness: Duration,

    // Resolver
    pub provider_timeout: Duration,
    pub cache_timeout: Duration,
    pub stale_max_age: Option<Duration>,
    pub activity_categories: Option<Vec<String>>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let defaults = ResolverConfig::default();
        let stale_hours: u64 = parse_env(
            "STALE_MAX_AGE_HOURS",
            defaults
                .stale_max_age
                .map(|d| d.as_secs() / 3600)
                .unwrap_or(0),
        )?;

        let config = Self {
            brightdata_api_token: std::env::var("BRIGHTDATA_API_TOKEN")
                .context("BRIGHTDATA_API_TOKEN environment variable is required")?,
            brightdata_dataset_id: std::env::var("BRIGHTDATA_DATASET_ID")
                .unwrap_or_else(|_| LINKEDIN_PROFILE_DATASET.to_string()),
            brightdata_base_url: non_empty_env("BRIGHTDATA_BASE_URL"),
            brightdata_poll_interval: Duration::from_secs(parse_env(
                "BRIGHTDATA_POLL_INTERVAL_SECS",
                10,
            )?),
            brightdata_max_polls: parse_env("BRIGHTDATA_MAX_POLLS", 15)?,
            memory_server_url: non_empty_env("MEMORY_SERVER_URL"),
            memory_namespace: std::env::var("MEMORY_NAMESPACE")
                .unwrap_or_else(|_| "linkedin_scraper".to_string()),
            cache_freshness: Duration::from_secs(parse_env::<u64>("CACHE_FRESHNESS_HOURS", 24)? * 3600),
            provider_timeout: Duration::from_secs(parse_env(
                "PROVIDER_TIMEOUT_SECS",
                defaults.provider_timeout.as_secs(),
            )?),
            cache_timeout: Duration::from_secs(parse_env(
                "CACHE_TIMEOUT_SECS",
                defaults.cache_timeout.as_secs(),
            )?),
            stale_max_age: (stale_hours > 0).then(|| Duration::from_secs(stale_hours * 3600)),
            activity_categories: non_empty_env("ACTIVITY_CATEGORIES").map(|list| {
                list.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            }),
        };

        config.log_keys();
        Ok(config)
    }

    pub fn resolver_config(&self) -> ResolverConfig {
        let mut config = ResolverConfig::default()
            .with_provider_timeout(self.provider_timeout)
            .with_cache_timeout(self.cache_timeout)
            .with_stale_max_age(self.stale_max_age);
        if let Some(categories) = &self.activity_categories {
            config = config.with_categories(CategoryVocabulary::new(categories));
        }
        config
    }

    fn log_keys(&self) {
        tracing::info!("Config loaded:");
        tracing::info!("  BRIGHTDATA_API_TOKEN: {}", preview(&self.brightdata_api_token));
        tracing::info!("  BRIGHTDATA_DATASET_ID: {}", self.brightdata_dataset_id);
        tracing::info!("  BRIGHTDATA_BASE_URL: {}", preview_opt(&self.brightdata_base_url));
        tracing::info!("  MEMORY_SERVER_URL: {}", preview_opt(&self.memory_server_url));
        tracing::info!("  MEMORY_NAMESPACE: {}", self.memory_namespace);
    }
}

/// First few characters of a secret, for startup logs.
fn preview(val: &str) -> String {
    let head: String = val.chars().take(5).collect();
    format!("{head}...({} chars)", val.chars().count())
}

fn preview_opt(val: &Option<String>) -> String {
    match val {
        Some(v) if !v.is_empty() => preview(v),
        _ => "<not set>".to_string(),
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match non_empty_env(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{key} must be a number, got '{raw}'")),
        None => Ok(default),
    }
}
