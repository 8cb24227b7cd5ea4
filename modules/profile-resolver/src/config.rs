use std::time::Duration;

use crate::activity::CategoryVocabulary;

/// Tuning knobs for a [`crate::Resolver`]. Passed in explicitly; the resolver
/// never reads the environment.
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// Upper bound on one provider fetch. Exceeding it counts as a transient
    /// provider failure.
    pub provider_timeout: Duration,
    /// Upper bound on each cache read or write.
    pub cache_timeout: Duration,
    /// Oldest cache entry still served when the provider fails. None serves
    /// any age.
    pub stale_max_age: Option<Duration>,
    /// How many activities are also persisted as standalone records.
    pub activity_record_limit: usize,
    pub categories: CategoryVocabulary,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            provider_timeout: Duration::from_secs(300),
            cache_timeout: Duration::from_secs(5),
            stale_max_age: Some(Duration::from_secs(30 * 24 * 3600)),
            activity_record_limit: 10,
            categories: CategoryVocabulary::default(),
        }
    }
}

impl ResolverConfig {
    pub fn with_provider_timeout(mut self, timeout: Duration) -> Self {
        self.provider_timeout = timeout;
        self
    }

    pub fn with_cache_timeout(mut self, timeout: Duration) -> Self {
        self.cache_timeout = timeout;
        self
    }

    pub fn with_stale_max_age(mut self, max_age: Option<Duration>) -> Self {
        self.stale_max_age = max_age;
        self
    }

    pub fn with_activity_record_limit(mut self, limit: usize) -> Self {
        self.activity_record_limit = limit;
        self
    }

    pub fn with_categories(mut self, categories: CategoryVocabulary) -> Self {
        self.categories = categories;
        self
    }
}
