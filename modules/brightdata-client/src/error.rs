use thiserror::Error;

pub type Result<T> = std::result::Result<T, BrightDataError>;

#[derive(Debug, Error)]
pub enum BrightDataError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Snapshot {snapshot_id} failed with status: {status}")]
    SnapshotFailed { snapshot_id: String, status: String },

    #[error("Snapshot {snapshot_id} not ready after {attempts} polls")]
    SnapshotTimeout { snapshot_id: String, attempts: u32 },

    #[error("Snapshot {0} returned no records")]
    EmptySnapshot(String),

    #[error("Record error ({code}): {message}")]
    Record { code: String, message: String },
}

impl BrightDataError {
    /// True when the upstream confirmed the profile does not exist.
    pub fn is_not_found(&self) -> bool {
        match self {
            BrightDataError::Api { status, .. } => *status == 404,
            BrightDataError::EmptySnapshot(_) => true,
            BrightDataError::Record { code, .. } => {
                matches!(code.as_str(), "dead_page" | "not_found" | "profile_not_found")
            }
            _ => false,
        }
    }
}

impl From<reqwest::Error> for BrightDataError {
    fn from(err: reqwest::Error) -> Self {
        BrightDataError::Network(err.to_string())
    }
}

impl From<serde_json::Error> for BrightDataError {
    fn from(err: serde_json::Error) -> Self {
        BrightDataError::Parse(err.to_string())
    }
}
