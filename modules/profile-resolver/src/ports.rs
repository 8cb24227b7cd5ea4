// Port traits toward the two external collaborators: the memory/cache
// subsystem and the scraping provider. The resolver only talks to these.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use profile_common::{Activity, Profile, ProfileKey};

use crate::error::{CacheError, ProviderError};
use crate::payload::RawPayload;

/// Where a raw payload came from. Cache payloads carry our own bookkeeping
/// fields (`retrievedAt`, `usedDefaultAvatar`); provider payloads do not.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadSource {
    Cache,
    Provider,
}

/// Most recent stored profile for a key, as returned by [`ProfileCache::read`].
#[derive(Debug, Clone, PartialEq)]
pub struct CachedEntry {
    pub payload: RawPayload,
    pub retrieved_at: Option<DateTime<Utc>>,
    /// Freshness threshold supplied by the cache. None means the cache does
    /// not track age.
    pub fresh_for: Option<Duration>,
}

impl CachedEntry {
    /// Age of the entry at `now`. None when the cache did not record a time.
    /// Timestamps in the future count as zero age.
    pub fn age(&self, now: DateTime<Utc>) -> Option<Duration> {
        self.retrieved_at
            .map(|at| (now - at).to_std().unwrap_or(Duration::ZERO))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Stored,
    /// An existing entry carried a newer `retrievedAt`; the write was dropped.
    Superseded,
}

#[async_trait]
pub trait ProfileCache: Send + Sync {
    async fn read(&self, key: &ProfileKey) -> Result<Option<CachedEntry>, CacheError>;

    /// Persist a profile. Must not replace an entry with a newer `retrievedAt`.
    async fn write(&self, key: &ProfileKey, profile: &Profile) -> Result<WriteOutcome, CacheError>;

    /// Persist one activity under its own id. Optional for implementations.
    async fn write_activity(
        &self,
        _key: &ProfileKey,
        _activity: &Activity,
    ) -> Result<(), CacheError> {
        Ok(())
    }

    async fn health(&self) -> Result<(), CacheError>;

    fn name(&self) -> &str;
}

#[async_trait]
pub trait ProfileProvider: Send + Sync {
    /// Fetch a fresh raw profile. Called at most once per resolution.
    async fn fetch(&self, key: &ProfileKey) -> Result<RawPayload, ProviderError>;

    fn name(&self) -> &str;
}
