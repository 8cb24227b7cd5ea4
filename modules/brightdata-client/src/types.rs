use serde::{Deserialize, Serialize};

/// Dataset id of the BrightData "LinkedIn people profiles" collector.
pub const LINKEDIN_PROFILE_DATASET: &str = "gd_l1viktl72bvl7bjuj0";

/// One input row for the `/datasets/v3/trigger` endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TriggerInput {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub include_skills: Option<bool>,
}

impl TriggerInput {
    pub fn url(url: &str) -> Self {
        Self {
            url: url.to_string(),
            endpoint: None,
            include_skills: None,
        }
    }

    /// Payload shapes the collector has accepted over time, tried in order.
    pub fn variants(url: &str) -> Vec<TriggerInput> {
        vec![
            TriggerInput::url(url),
            TriggerInput {
                endpoint: Some("linkedin_profile".to_string()),
                ..TriggerInput::url(url)
            },
            TriggerInput {
                endpoint: Some("linkedin".to_string()),
                ..TriggerInput::url(url)
            },
            TriggerInput {
                include_skills: Some(true),
                ..TriggerInput::url(url)
            },
        ]
    }
}

/// Response of the trigger endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct TriggerResponse {
    pub snapshot_id: Option<String>,
}

/// State of a snapshot as seen by a single poll.
#[derive(Debug, Clone, PartialEq)]
pub enum SnapshotState {
    /// Collection is still running. Carries the upstream status or message.
    Running(String),
    /// First collected record.
    Ready(serde_json::Value),
}
