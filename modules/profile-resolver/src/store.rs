use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use tokio::sync::RwLock;

use profile_common::{Activity, Profile, ProfileKey};

use crate::error::CacheError;
use crate::payload::RawPayload;
use crate::ports::{CachedEntry, ProfileCache, WriteOutcome};

struct StoredProfile {
    payload: Value,
    retrieved_at: Option<DateTime<Utc>>,
}

/// Process-local cache. Used when no memory server is configured, and as the
/// cache in tests.
pub struct InMemoryCache {
    fresh_for: Option<Duration>,
    profiles: RwLock<HashMap<ProfileKey, StoredProfile>>,
    activities: RwLock<HashMap<String, (ProfileKey, Activity)>>,
}

impl InMemoryCache {
    pub fn new(fresh_for: Option<Duration>) -> Self {
        Self {
            fresh_for,
            profiles: RwLock::new(HashMap::new()),
            activities: RwLock::new(HashMap::new()),
        }
    }

    /// Store a raw payload as-is, bypassing normalization and the
    /// newer-wins check.
    pub async fn insert_raw(
        &self,
        key: &ProfileKey,
        payload: Value,
        retrieved_at: Option<DateTime<Utc>>,
    ) {
        self.profiles.write().await.insert(
            key.clone(),
            StoredProfile {
                payload,
                retrieved_at,
            },
        );
    }

    pub async fn stored_payload(&self, key: &ProfileKey) -> Option<Value> {
        self.profiles
            .read()
            .await
            .get(key)
            .map(|stored| stored.payload.clone())
    }

    pub async fn activity(&self, id: &str) -> Option<Activity> {
        self.activities
            .read()
            .await
            .get(id)
            .map(|(_, activity)| activity.clone())
    }

    pub async fn activity_count(&self) -> usize {
        self.activities.read().await.len()
    }
}

impl Default for InMemoryCache {
    fn default() -> Self {
        Self::new(Some(Duration::from_secs(24 * 3600)))
    }
}

#[async_trait]
impl ProfileCache for InMemoryCache {
    async fn read(&self, key: &ProfileKey) -> Result<Option<CachedEntry>, CacheError> {
        let profiles = self.profiles.read().await;
        let Some(stored) = profiles.get(key) else {
            return Ok(None);
        };
        let payload = RawPayload::from_value(stored.payload.clone())
            .map_err(|e| CacheError::Unavailable(format!("stored payload for {key}: {e}")))?;
        Ok(Some(CachedEntry {
            payload,
            retrieved_at: stored.retrieved_at,
            fresh_for: self.fresh_for,
        }))
    }

    async fn write(&self, key: &ProfileKey, profile: &Profile) -> Result<WriteOutcome, CacheError> {
        let payload = serde_json::to_value(profile)
            .map_err(|e| CacheError::Unavailable(format!("serialize profile: {e}")))?;

        let mut profiles = self.profiles.write().await;
        if let Some(existing) = profiles.get(key) {
            if existing.retrieved_at > profile.retrieved_at {
                return Ok(WriteOutcome::Superseded);
            }
        }
        profiles.insert(
            key.clone(),
            StoredProfile {
                payload,
                retrieved_at: profile.retrieved_at,
            },
        );
        Ok(WriteOutcome::Stored)
    }

    async fn write_activity(&self, key: &ProfileKey, activity: &Activity) -> Result<(), CacheError> {
        self.activities
            .write()
            .await
            .insert(activity.id.clone(), (key.clone(), activity.clone()));
        Ok(())
    }

    async fn health(&self) -> Result<(), CacheError> {
        Ok(())
    }

    fn name(&self) -> &str {
        "in_memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payload::normalize;
    use crate::ports::PayloadSource;
    use profile_common::{Education, Experience};

    fn key(handle: &str) -> ProfileKey {
        ProfileKey::parse(handle).unwrap()
    }

    fn rich_profile() -> Profile {
        let mut profile = Profile::new("alice", "Alice");
        profile.title = Some("Engineer".into());
        profile.company = Some("Acme".into());
        profile.current_company = Some("Acme".into());
        profile.location = Some("Berlin".into());
        profile.avatar_url = "https://x/alice.png".into();
        profile.used_default_avatar = false;
        profile.followers = Some(10);
        profile.skills.insert("rust".into());
        profile.social.github = Some("https://github.com/alice".into());
        profile.experiences.push(Experience {
            role: "Engineer".into(),
            company: "Acme".into(),
            period: "2020 - Present".into(),
            location: None,
        });
        profile.education.push(Education {
            school: "MIT".into(),
            degree: "BSc, Physics".into(),
            period: "2012 - 2016".into(),
        });
        profile.retrieved_at = Some(Utc::now());
        profile
    }

    #[tokio::test]
    async fn write_then_read_round_trips() {
        let cache = InMemoryCache::default();
        let profile = rich_profile();
        let k = key("alice");

        assert_eq!(cache.write(&k, &profile).await.unwrap(), WriteOutcome::Stored);
        let entry = cache.read(&k).await.unwrap().unwrap();
        assert_eq!(entry.retrieved_at, profile.retrieved_at);

        let read_back = normalize(&entry.payload, PayloadSource::Cache).unwrap();
        assert_eq!(read_back, profile);
    }

    #[tokio::test]
    async fn default_avatar_flag_survives_round_trip() {
        let cache = InMemoryCache::default();
        let mut profile = Profile::new("bob", "Bob");
        profile.retrieved_at = Some(Utc::now());
        let k = key("bob");

        cache.write(&k, &profile).await.unwrap();
        let entry = cache.read(&k).await.unwrap().unwrap();
        let read_back = normalize(&entry.payload, PayloadSource::Cache).unwrap();
        assert!(read_back.used_default_avatar);
        assert_eq!(read_back, profile);
    }

    #[tokio::test]
    async fn older_write_is_superseded() {
        let cache = InMemoryCache::default();
        let k = key("alice");
        let newer = rich_profile();
        let mut older = newer.clone();
        older.name = "Old Alice".into();
        older.retrieved_at = Some(Utc::now() - chrono::Duration::hours(1));

        cache.write(&k, &newer).await.unwrap();
        assert_eq!(
            cache.write(&k, &older).await.unwrap(),
            WriteOutcome::Superseded
        );
        let stored = cache.stored_payload(&k).await.unwrap();
        assert_eq!(stored["name"], "Alice");
    }

    #[tokio::test]
    async fn equal_timestamps_overwrite() {
        let cache = InMemoryCache::default();
        let k = key("alice");
        let first = rich_profile();
        let mut second = first.clone();
        second.title = Some("Staff Engineer".into());

        cache.write(&k, &first).await.unwrap();
        assert_eq!(cache.write(&k, &second).await.unwrap(), WriteOutcome::Stored);
    }

    #[tokio::test]
    async fn missing_key_reads_none() {
        let cache = InMemoryCache::default();
        assert!(cache.read(&key("nobody")).await.unwrap().is_none());
    }
}
