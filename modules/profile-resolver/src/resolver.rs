// Resolution pipeline: identifier → cache → coalesced provider fetch →
// normalize + decompose → write-back, with stale fallback on provider failure.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::Utc;
use futures::future::{BoxFuture, FutureExt, Shared};
use tokio::time::timeout;
use tracing::{debug, info, info_span, warn, Instrument};

use profile_common::{Profile, ProfileKey};

use crate::activity::decompose;
use crate::config::ResolverConfig;
use crate::error::{CacheError, NormalizationError, ResolveError};
use crate::payload::{is_sufficient, normalize, RawPayload};
use crate::ports::{CachedEntry, PayloadSource, ProfileCache, ProfileProvider, WriteOutcome};
use crate::response::ResponseEnvelope;

type FetchFuture = Shared<BoxFuture<'static, Result<Fetched, ResolveError>>>;

/// Output of one in-flight task, shared by every waiter.
#[derive(Debug, Clone)]
struct Fetched {
    profile: Profile,
    /// The cache already held a sufficient entry; the provider was not asked.
    from_cache: bool,
}

/// Outcome of one resolution, before it is rendered into an envelope.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    /// None when the identifier could not be parsed.
    pub key: Option<ProfileKey>,
    pub profile: Option<Profile>,
    pub cached: bool,
    pub error: Option<ResolveError>,
    /// Set when a stale cache entry was served because the provider failed.
    pub warning: Option<String>,
}

impl Resolution {
    fn served(key: ProfileKey, profile: Profile, cached: bool) -> Self {
        Self {
            key: Some(key),
            profile: Some(profile),
            cached,
            error: None,
            warning: None,
        }
    }

    fn failed(key: Option<ProfileKey>, error: ResolveError) -> Self {
        Self {
            key,
            profile: None,
            cached: false,
            error: Some(error),
            warning: None,
        }
    }
}

/// Resolves profiles through the cache first and the provider on a miss.
/// Cheap to clone; clones share the in-flight fetch table.
#[derive(Clone)]
pub struct Resolver {
    inner: Arc<Inner>,
}

struct Inner {
    cache: Arc<dyn ProfileCache>,
    provider: Arc<dyn ProfileProvider>,
    config: ResolverConfig,
    in_flight: Mutex<HashMap<ProfileKey, FetchFuture>>,
}

impl Resolver {
    pub fn new(
        cache: Arc<dyn ProfileCache>,
        provider: Arc<dyn ProfileProvider>,
        config: ResolverConfig,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                cache,
                provider,
                config,
                in_flight: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// Number of provider fetches currently running.
    pub fn in_flight_count(&self) -> usize {
        self.inner
            .in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Resolve `input` (handle or profile URL) on behalf of `requester`.
    pub async fn resolve(&self, input: &str, requester: &str) -> Resolution {
        let key = match ProfileKey::parse(input) {
            Ok(key) => key,
            Err(e) => {
                info!(input, requester, error = %e, "Rejected identifier");
                return Resolution::failed(None, e.into());
            }
        };

        let span = info_span!("resolve", key = %key, requester);
        self.resolve_key(key).instrument(span).await
    }

    /// Resolve and render the response envelope.
    pub async fn respond(&self, input: &str, requester: &str) -> ResponseEnvelope {
        ResponseEnvelope::build(&self.resolve(input, requester).await)
    }

    async fn resolve_key(&self, key: ProfileKey) -> Resolution {
        let inner = &self.inner;
        let entry = inner.read_cache(&key).await;

        if let Some(profile) = entry.as_ref().and_then(|e| inner.sufficient_profile(e)) {
            info!(activities = profile.activities.len(), "Cache hit");
            return Resolution::served(key, profile, true);
        }

        match self.fetch(&key).await {
            Ok(Fetched {
                profile,
                from_cache: true,
            }) => {
                info!("Cache filled by a concurrent fetch");
                Resolution::served(key, profile, true)
            }
            Ok(Fetched { profile, .. }) => {
                info!(activities = profile.activities.len(), "Resolved from provider");
                Resolution::served(key, profile, false)
            }
            Err(err) => inner.fall_back(key, entry, err),
        }
    }

    /// Join the in-flight fetch for `key`, or start one. The fetch runs in its
    /// own task, so it completes and persists even if every waiter goes away.
    fn fetch(&self, key: &ProfileKey) -> FetchFuture {
        let mut in_flight = self
            .inner
            .in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        if let Some(existing) = in_flight.get(key) {
            debug!("Joining in-flight fetch");
            return existing.clone();
        }

        let inner = self.inner.clone();
        let task_key = key.clone();
        let handle = tokio::spawn(
            async move {
                let result = inner.fetch_or_reuse(&task_key).await;
                inner
                    .in_flight
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .remove(&task_key);
                result
            }
            .in_current_span(),
        );

        let shared = async move {
            handle.await.unwrap_or_else(|e| {
                Err(ResolveError::ProviderUnavailable(format!(
                    "fetch task failed: {e}"
                )))
            })
        }
        .boxed()
        .shared();

        in_flight.insert(key.clone(), shared.clone());
        shared
    }
}

impl Inner {
    /// Run a cache operation under the cache timeout.
    async fn bounded<T>(
        &self,
        op: impl Future<Output = Result<T, CacheError>>,
    ) -> Result<T, CacheError> {
        timeout(self.config.cache_timeout, op)
            .await
            .unwrap_or_else(|_| Err(CacheError::Timeout(self.config.cache_timeout)))
    }

    /// Cache failures never fail a resolution; they are logged and dropped.
    fn absorb(&self, operation: &'static str, err: CacheError) {
        let err = ResolveError::from(err);
        warn!(
            cache = self.cache.name(),
            operation,
            kind = err.kind(),
            error = %err,
            "Continuing without cache"
        );
    }

    async fn read_cache(&self, key: &ProfileKey) -> Option<CachedEntry> {
        match self.bounded(self.cache.read(key)).await {
            Ok(entry) => entry,
            Err(e) => {
                self.absorb("read", e);
                None
            }
        }
    }

    /// The cached profile, if it can be served without asking the provider.
    fn sufficient_profile(&self, entry: &CachedEntry) -> Option<Profile> {
        match self.materialize(&entry.payload, PayloadSource::Cache) {
            Ok(profile) if is_sufficient(&profile, entry, Utc::now()) => Some(profile),
            Ok(_) => {
                debug!("Cached entry insufficient");
                None
            }
            Err(e) => {
                warn!(error = %e, "Cached payload unusable, treating as miss");
                None
            }
        }
    }

    /// Body of the in-flight task. A previous fetch for the key may have
    /// persisted between the caller's cache read and this task starting, so
    /// the cache is checked once more before the provider is asked.
    async fn fetch_or_reuse(&self, key: &ProfileKey) -> Result<Fetched, ResolveError> {
        if let Some(profile) = self
            .read_cache(key)
            .await
            .as_ref()
            .and_then(|e| self.sufficient_profile(e))
        {
            return Ok(Fetched {
                profile,
                from_cache: true,
            });
        }

        let profile = self.fetch_and_persist(key).await?;
        Ok(Fetched {
            profile,
            from_cache: false,
        })
    }

    async fn fetch_and_persist(&self, key: &ProfileKey) -> Result<Profile, ResolveError> {
        info!(provider = self.provider.name(), "Fetching from provider");
        let raw = match timeout(self.config.provider_timeout, self.provider.fetch(key)).await {
            Ok(result) => result?,
            Err(_) => {
                return Err(ResolveError::ProviderUnavailable(format!(
                    "provider timed out after {:?}",
                    self.config.provider_timeout
                )))
            }
        };

        let mut profile = self.materialize(&raw, PayloadSource::Provider)?;
        if profile.id.is_empty() {
            profile.id = key.to_string();
        }
        profile.retrieved_at = Some(Utc::now());

        self.persist(key, &profile).await;
        Ok(profile)
    }

    /// Normalize a payload and attach its decomposed activities.
    fn materialize(
        &self,
        raw: &RawPayload,
        source: PayloadSource,
    ) -> Result<Profile, NormalizationError> {
        let mut profile = normalize(raw, source)?;
        let decomposition = decompose(&raw.activities(), &self.config.categories);
        profile.activities = decomposition.activities;
        profile.activity_summary = decomposition.summary;
        Ok(profile)
    }

    /// Write-back. Failures are logged; the caller still gets the profile.
    async fn persist(&self, key: &ProfileKey, profile: &Profile) {
        let cache = self.cache.name();
        match self.bounded(self.cache.write(key, profile)).await {
            Ok(WriteOutcome::Stored) => info!(cache, "Profile stored"),
            Ok(WriteOutcome::Superseded) => {
                info!(cache, "Newer cached profile exists, write discarded")
            }
            Err(e) => {
                self.absorb("write", e);
                return;
            }
        }

        for activity in profile
            .activities
            .iter()
            .take(self.config.activity_record_limit)
        {
            if let Err(e) = self.bounded(self.cache.write_activity(key, activity)).await {
                self.absorb("write_activity", e);
            }
        }
    }

    /// Serve the prior cache entry if the provider failed and the entry is
    /// usable and young enough; otherwise surface the error.
    fn fall_back(
        &self,
        key: ProfileKey,
        entry: Option<CachedEntry>,
        err: ResolveError,
    ) -> Resolution {
        let now = Utc::now();
        let stale = entry
            .filter(|entry| match (self.config.stale_max_age, entry.age(now)) {
                (Some(max_age), Some(age)) => age <= max_age,
                _ => true,
            })
            .and_then(|entry| self.materialize(&entry.payload, PayloadSource::Cache).ok());

        match stale {
            Some(profile) => {
                warn!(kind = err.kind(), error = %err, "Provider failed, serving stale cache entry");
                let mut resolution = Resolution::served(key, profile, true);
                resolution.warning = Some(format!("Served stale cached profile: {err}"));
                resolution
            }
            None => {
                warn!(kind = err.kind(), error = %err, "Resolution failed");
                Resolution::failed(Some(key), err)
            }
        }
    }
}
