pub mod error;
pub mod types;

pub use error::{MemoryError, Result};
pub use types::{MemoryRecord, MemoryType, SearchRequest};

use std::time::Duration;

use types::{CreateBody, SearchBody, SearchResponse};

pub struct MemoryClient {
    client: reqwest::Client,
    base_url: String,
}

impl MemoryClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Check the server's health endpoint.
    pub async fn health(&self) -> Result<()> {
        let url = format!("{}/v1/health", self.base_url);
        let resp = self.client.get(&url).send().await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(MemoryError::Api {
                status: status.as_u16(),
                message,
            });
        }
        Ok(())
    }

    /// Search long-term memory. Results come back ordered by relevance.
    pub async fn search(&self, req: &SearchRequest) -> Result<Vec<MemoryRecord>> {
        let url = format!("{}/v1/long-term-memory/search", self.base_url);
        let resp = self
            .client
            .post(&url)
            .json(&SearchBody::from_request(req))
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(MemoryError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body = resp.text().await?;
        let parsed: SearchResponse = serde_json::from_str(&body)?;
        tracing::debug!(count = parsed.memories.len(), "Memory search returned");
        Ok(parsed.memories)
    }

    /// Store records in long-term memory. Records with an existing id are replaced.
    pub async fn create_long_term_memory(&self, records: &[MemoryRecord]) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }

        let url = format!("{}/v1/long-term-memory/", self.base_url);
        let resp = self
            .client
            .post(&url)
            .json(&CreateBody { memories: records })
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(MemoryError::Api {
                status: status.as_u16(),
                message,
            });
        }

        tracing::debug!(count = records.len(), "Stored long-term memories");
        Ok(())
    }
}
