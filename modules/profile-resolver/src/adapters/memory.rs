use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use memory_client::{MemoryClient, MemoryError, MemoryRecord, MemoryType, SearchRequest};
use serde_json::Value;

use profile_common::{Activity, Profile, ProfileKey};

use crate::error::CacheError;
use crate::payload::RawPayload;
use crate::ports::{CachedEntry, ProfileCache, WriteOutcome};

const SEARCH_LIMIT: u32 = 5;
const ACTIVITY_TITLE_CHARS: usize = 100;

/// Cache port backed by the agent memory server. Profiles are semantic
/// records holding the canonical profile JSON; activities are episodic
/// records with a one-line text.
pub struct MemoryServerCache {
    client: MemoryClient,
    namespace: String,
    fresh_for: Option<Duration>,
}

impl MemoryServerCache {
    pub fn new(client: MemoryClient, namespace: impl Into<String>, fresh_for: Option<Duration>) -> Self {
        Self {
            client,
            namespace: namespace.into(),
            fresh_for,
        }
    }

    pub fn profile_record_id(key: &ProfileKey) -> String {
        format!("linkedin_profile_{key}")
    }

    pub fn activity_record_id(activity_id: &str) -> String {
        format!("linkedin_activity_{activity_id}")
    }

    fn profile_record(&self, key: &ProfileKey, profile: &Profile) -> Result<MemoryRecord, CacheError> {
        let text = serde_json::to_string(profile)
            .map_err(|e| CacheError::Unavailable(format!("serialize profile: {e}")))?;

        let entities = [
            Some(key.to_string()),
            Some(profile.name.clone()),
            profile.company.clone(),
        ]
        .into_iter()
        .flatten()
        .filter(|e| !e.is_empty())
        .collect();

        Ok(MemoryRecord {
            id: Self::profile_record_id(key),
            text,
            memory_type: MemoryType::Semantic,
            topics: vec![
                "linkedin".into(),
                "profile".into(),
                key.to_string(),
                "scraped_data".into(),
            ],
            entities,
            namespace: Some(self.namespace.clone()),
            user_id: None,
            created_at: profile.retrieved_at,
        })
    }

    fn activity_record(&self, key: &ProfileKey, activity: &Activity) -> MemoryRecord {
        let title: String = activity.title.chars().take(ACTIVITY_TITLE_CHARS).collect();
        let interaction = if activity.interaction.is_empty() {
            "Unknown"
        } else {
            activity.interaction.as_str()
        };

        MemoryRecord {
            id: Self::activity_record_id(&activity.id),
            text: format!("{key} activity: {interaction} - {title}"),
            memory_type: MemoryType::Episodic,
            topics: vec![
                "linkedin".into(),
                "activity".into(),
                key.to_string(),
                "engagement".into(),
            ],
            entities: vec![key.to_string()],
            namespace: Some(self.namespace.clone()),
            user_id: None,
            created_at: None,
        }
    }
}

#[async_trait]
impl ProfileCache for MemoryServerCache {
    async fn read(&self, key: &ProfileKey) -> Result<Option<CachedEntry>, CacheError> {
        let request = SearchRequest {
            text: format!("LinkedIn profile {key}"),
            namespace: Some(self.namespace.clone()),
            topics: vec!["linkedin".into(), "profile".into(), key.to_string()],
            user_id: None,
            limit: SEARCH_LIMIT,
        };
        let records = self.client.search(&request).await.map_err(unavailable)?;

        for record in records {
            let payload = match RawPayload::from_json(&record.text) {
                Ok(payload) => payload,
                Err(e) => {
                    tracing::warn!(record_id = %record.id, error = %e, "Skipping corrupt cached profile");
                    continue;
                }
            };
            if !belongs_to(&payload, key) {
                continue;
            }

            let retrieved_at = retrieved_at(&payload).or(record.created_at);
            return Ok(Some(CachedEntry {
                payload,
                retrieved_at,
                fresh_for: self.fresh_for,
            }));
        }

        Ok(None)
    }

    async fn write(&self, key: &ProfileKey, profile: &Profile) -> Result<WriteOutcome, CacheError> {
        if let Some(existing) = self.read(key).await? {
            if existing.retrieved_at > profile.retrieved_at {
                return Ok(WriteOutcome::Superseded);
            }
        }

        let record = self.profile_record(key, profile)?;
        self.client
            .create_long_term_memory(std::slice::from_ref(&record))
            .await
            .map_err(unavailable)?;
        Ok(WriteOutcome::Stored)
    }

    async fn write_activity(&self, key: &ProfileKey, activity: &Activity) -> Result<(), CacheError> {
        let record = self.activity_record(key, activity);
        self.client
            .create_long_term_memory(std::slice::from_ref(&record))
            .await
            .map_err(unavailable)
    }

    async fn health(&self) -> Result<(), CacheError> {
        self.client.health().await.map_err(unavailable)
    }

    fn name(&self) -> &str {
        "memory_server"
    }
}

fn unavailable(err: MemoryError) -> CacheError {
    CacheError::Unavailable(err.to_string())
}

/// A search hit only counts if the stored profile is for this key.
fn belongs_to(payload: &RawPayload, key: &ProfileKey) -> bool {
    ["id", "linkedinId", "linkedin_id"]
        .iter()
        .filter_map(|field| payload.as_map().get(*field).and_then(Value::as_str))
        .any(|id| id.eq_ignore_ascii_case(key.as_str()))
}

fn retrieved_at(payload: &RawPayload) -> Option<DateTime<Utc>> {
    payload
        .text(&["retrievedAt", "retrieved_at"])
        .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
        .map(|t| t.with_timezone(&Utc))
}
