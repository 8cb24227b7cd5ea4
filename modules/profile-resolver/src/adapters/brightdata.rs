use async_trait::async_trait;
use brightdata_client::{BrightDataClient, BrightDataError};

use profile_common::ProfileKey;

use crate::error::ProviderError;
use crate::payload::RawPayload;
use crate::ports::ProfileProvider;

/// Provider port backed by the BrightData profile dataset.
pub struct BrightDataProvider {
    client: BrightDataClient,
}

impl BrightDataProvider {
    pub fn new(client: BrightDataClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ProfileProvider for BrightDataProvider {
    async fn fetch(&self, key: &ProfileKey) -> Result<RawPayload, ProviderError> {
        let record = self
            .client
            .scrape_profile(&key.profile_url())
            .await
            .map_err(classify)?;

        RawPayload::from_value(record)
            .map_err(|e| ProviderError::Transient(format!("unusable record: {e}")))
    }

    fn name(&self) -> &str {
        "brightdata"
    }
}

fn classify(err: BrightDataError) -> ProviderError {
    if err.is_not_found() {
        return ProviderError::NotFound(err.to_string());
    }
    match err {
        BrightDataError::RateLimited(_) => ProviderError::RateLimited(err.to_string()),
        BrightDataError::Api { status: 429, .. } => ProviderError::RateLimited(err.to_string()),
        other => ProviderError::Transient(other.to_string()),
    }
}
