pub mod error;
pub mod types;

pub use error::{BrightDataError, Result};
pub use types::{SnapshotState, TriggerInput, TriggerResponse, LINKEDIN_PROFILE_DATASET};

use std::time::Duration;

use reqwest::StatusCode;
use serde_json::Value;

const BASE_URL: &str = "https://api.brightdata.com";

/// Default delay between snapshot polls.
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);

/// Default number of snapshot polls before giving up.
const DEFAULT_MAX_POLLS: u32 = 15;

pub struct BrightDataClient {
    client: reqwest::Client,
    token: String,
    base_url: String,
    dataset_id: String,
    poll_interval: Duration,
    max_polls: u32,
}

impl BrightDataClient {
    pub fn new(token: String, dataset_id: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            token,
            base_url: BASE_URL.to_string(),
            dataset_id,
            poll_interval: DEFAULT_POLL_INTERVAL,
            max_polls: DEFAULT_MAX_POLLS,
        }
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn with_polling(mut self, interval: Duration, max_polls: u32) -> Self {
        self.poll_interval = interval;
        self.max_polls = max_polls.max(1);
        self
    }

    /// Start a collection run. Returns the snapshot id to poll.
    pub async fn trigger(&self, inputs: &[TriggerInput]) -> Result<String> {
        let url = format!("{}/datasets/v3/trigger", self.base_url);
        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .query(&[
                ("dataset_id", self.dataset_id.as_str()),
                ("include_errors", "true"),
            ])
            .json(inputs)
            .send()
            .await?;

        let status = resp.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            let body = resp.text().await.unwrap_or_default();
            return Err(BrightDataError::RateLimited(body));
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(BrightDataError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let trigger: TriggerResponse = resp.json().await?;
        trigger
            .snapshot_id
            .filter(|id| !id.is_empty())
            .ok_or_else(|| BrightDataError::Parse("trigger response has no snapshot_id".into()))
    }

    /// Trigger a profile collection, walking through the known payload variants
    /// until one is accepted. Rate limiting aborts immediately.
    pub async fn trigger_profile(&self, profile_url: &str) -> Result<String> {
        let mut last_err = None;

        for (attempt, input) in TriggerInput::variants(profile_url).into_iter().enumerate() {
            match self.trigger(std::slice::from_ref(&input)).await {
                Ok(snapshot_id) => {
                    tracing::info!(snapshot_id, attempt = attempt + 1, "BrightData job started");
                    return Ok(snapshot_id);
                }
                Err(err @ BrightDataError::RateLimited(_)) => return Err(err),
                Err(err) => {
                    tracing::warn!(
                        attempt = attempt + 1,
                        error = %err,
                        "Trigger rejected, trying alternative payload"
                    );
                    last_err = Some(err);
                }
            }
        }

        Err(last_err.unwrap_or_else(|| BrightDataError::Parse("no trigger payloads".into())))
    }

    /// Poll a snapshot once.
    pub async fn snapshot(&self, snapshot_id: &str) -> Result<SnapshotState> {
        let url = format!("{}/datasets/v3/snapshot/{}", self.base_url, snapshot_id);
        let resp = self
            .client
            .get(&url)
            .bearer_auth(&self.token)
            .query(&[("format", "json")])
            .send()
            .await?;

        let status = resp.status();
        if status == StatusCode::ACCEPTED {
            let body = resp.text().await.unwrap_or_default();
            let message = serde_json::from_str::<Value>(&body)
                .ok()
                .and_then(|v| v.get("message").and_then(Value::as_str).map(String::from))
                .unwrap_or_else(|| "running".to_string());
            return Ok(SnapshotState::Running(message));
        }
        if status == StatusCode::TOO_MANY_REQUESTS {
            let body = resp.text().await.unwrap_or_default();
            return Err(BrightDataError::RateLimited(body));
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(BrightDataError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let body = resp.text().await?;
        parse_snapshot_body(snapshot_id, &body)
    }

    /// Poll until the snapshot yields a record or the poll budget runs out.
    pub async fn wait_for_snapshot(&self, snapshot_id: &str) -> Result<Value> {
        for attempt in 1..=self.max_polls {
            match self.snapshot(snapshot_id).await? {
                SnapshotState::Ready(record) => return check_record(record),
                SnapshotState::Running(status) => {
                    tracing::debug!(
                        snapshot_id,
                        attempt,
                        max_polls = self.max_polls,
                        status = %status,
                        "Snapshot still processing"
                    );
                    if attempt < self.max_polls {
                        tokio::time::sleep(self.poll_interval).await;
                    }
                }
            }
        }

        Err(BrightDataError::SnapshotTimeout {
            snapshot_id: snapshot_id.to_string(),
            attempts: self.max_polls,
        })
    }

    /// Scrape one profile end-to-end: trigger, poll, return the raw record.
    pub async fn scrape_profile(&self, profile_url: &str) -> Result<Value> {
        tracing::info!(profile_url, dataset_id = %self.dataset_id, "Starting BrightData profile scrape");

        let snapshot_id = self.trigger_profile(profile_url).await?;
        let record = self.wait_for_snapshot(&snapshot_id).await?;
        tracing::info!(snapshot_id, "BrightData scrape completed");

        Ok(record)
    }
}

/// Interpret a 200 snapshot body. A JSON object carrying `status` is a progress
/// report; an array yields its first record; anything that is not a single JSON
/// document is read as JSON lines.
fn parse_snapshot_body(snapshot_id: &str, body: &str) -> Result<SnapshotState> {
    match serde_json::from_str::<Value>(body) {
        Ok(Value::Object(obj)) => match obj.get("status").and_then(Value::as_str) {
            Some(status @ ("failed" | "error" | "canceled")) => {
                Err(BrightDataError::SnapshotFailed {
                    snapshot_id: snapshot_id.to_string(),
                    status: status.to_string(),
                })
            }
            Some(status) => Ok(SnapshotState::Running(status.to_string())),
            None => Ok(SnapshotState::Ready(Value::Object(obj))),
        },
        Ok(Value::Array(mut items)) => {
            if items.is_empty() {
                Err(BrightDataError::EmptySnapshot(snapshot_id.to_string()))
            } else {
                Ok(SnapshotState::Ready(items.swap_remove(0)))
            }
        }
        Ok(other) => Err(BrightDataError::Parse(format!(
            "unexpected snapshot body: {other}"
        ))),
        Err(_) => {
            let first = body
                .lines()
                .map(str::trim)
                .find(|line| !line.is_empty())
                .ok_or_else(|| BrightDataError::EmptySnapshot(snapshot_id.to_string()))?;
            let record: Value = serde_json::from_str(first)?;
            Ok(SnapshotState::Ready(record))
        }
    }
}

/// Collected records may carry a per-record error instead of profile data.
fn check_record(record: Value) -> Result<Value> {
    let code = record
        .get("error_code")
        .and_then(Value::as_str)
        .map(String::from);
    let message = record.get("error").and_then(Value::as_str).map(String::from);

    match (code, message) {
        (None, None) => Ok(record),
        (code, message) => Err(BrightDataError::Record {
            code: code.unwrap_or_else(|| "unknown".to_string()),
            message: message.unwrap_or_default(),
        }),
    }
}
