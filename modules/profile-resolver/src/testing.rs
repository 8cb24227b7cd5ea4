//! Port doubles for integration tests. Enabled with the `test-support` feature.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use profile_common::{Profile, ProfileKey};

use crate::error::{CacheError, ProviderError};
use crate::payload::RawPayload;
use crate::ports::{CachedEntry, ProfileCache, ProfileProvider, WriteOutcome};

/// Provider returning a fixed response, optionally after a delay, and
/// counting how often it was asked.
pub struct MockProvider {
    response: Mutex<Result<Value, ProviderError>>,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl MockProvider {
    pub fn returning(payload: Value) -> Self {
        Self::with_response(Ok(payload))
    }

    pub fn failing(err: ProviderError) -> Self {
        Self::with_response(Err(err))
    }

    fn with_response(response: Result<Value, ProviderError>) -> Self {
        Self {
            response: Mutex::new(response),
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Change what later fetches return.
    pub fn set_response(&self, response: Result<Value, ProviderError>) {
        *self.response.lock().unwrap_or_else(PoisonError::into_inner) = response;
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ProfileProvider for MockProvider {
    async fn fetch(&self, _key: &ProfileKey) -> Result<RawPayload, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let response = self.response.lock().unwrap_or_else(PoisonError::into_inner).clone();
        let value = response?;
        RawPayload::from_value(value).map_err(|e| ProviderError::Transient(e.to_string()))
    }

    fn name(&self) -> &str {
        "mock"
    }
}

/// Provider that should never be reached. Counts calls and answers `NotFound`;
/// tests assert `calls() == 0`.
#[derive(Default)]
pub struct UnreachableProvider {
    calls: AtomicUsize,
}

impl UnreachableProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ProfileProvider for UnreachableProvider {
    async fn fetch(&self, key: &ProfileKey) -> Result<RawPayload, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(ProviderError::NotFound(format!(
            "provider must not be called (key: {key})"
        )))
    }

    fn name(&self) -> &str {
        "unreachable"
    }
}

/// Cache whose every operation fails.
pub struct FailingCache;

#[async_trait]
impl ProfileCache for FailingCache {
    async fn read(&self, _key: &ProfileKey) -> Result<Option<CachedEntry>, CacheError> {
        Err(CacheError::Unavailable("connection refused".into()))
    }

    async fn write(&self, _key: &ProfileKey, _profile: &Profile) -> Result<WriteOutcome, CacheError> {
        Err(CacheError::Unavailable("connection refused".into()))
    }

    async fn health(&self) -> Result<(), CacheError> {
        Err(CacheError::Unavailable("connection refused".into()))
    }

    fn name(&self) -> &str {
        "failing"
    }
}

/// Cache whose operations succeed only after sleeping for `stall`.
pub struct StallingCache {
    stall: Duration,
}

impl StallingCache {
    pub fn new(stall: Duration) -> Self {
        Self { stall }
    }
}

#[async_trait]
impl ProfileCache for StallingCache {
    async fn read(&self, _key: &ProfileKey) -> Result<Option<CachedEntry>, CacheError> {
        tokio::time::sleep(self.stall).await;
        Ok(None)
    }

    async fn write(&self, _key: &ProfileKey, _profile: &Profile) -> Result<WriteOutcome, CacheError> {
        tokio::time::sleep(self.stall).await;
        Ok(WriteOutcome::Stored)
    }

    async fn health(&self) -> Result<(), CacheError> {
        tokio::time::sleep(self.stall).await;
        Ok(())
    }

    fn name(&self) -> &str {
        "stalling"
    }
}
