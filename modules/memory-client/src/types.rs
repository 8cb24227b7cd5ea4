use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemoryType {
    Semantic,
    Episodic,
}

/// A long-term memory record as stored by the memory server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryRecord {
    pub id: String,
    pub text: String,
    pub memory_type: MemoryType,
    #[serde(default)]
    pub topics: Vec<String>,
    #[serde(default)]
    pub entities: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Parameters for a long-term memory search.
#[derive(Debug, Clone, Default)]
pub struct SearchRequest {
    pub text: String,
    pub namespace: Option<String>,
    /// Records must carry all of these topics.
    pub topics: Vec<String>,
    pub user_id: Option<String>,
    pub limit: u32,
}

/// Filter shape accepted by the search endpoint: `{"eq": ...}` / `{"all": [...]}`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum Filter<T> {
    Eq(T),
    All(Vec<T>),
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct SearchBody<'a> {
    pub text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<Filter<&'a str>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topics: Option<Filter<&'a str>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<Filter<&'a str>>,
    pub limit: u32,
}

impl<'a> SearchBody<'a> {
    pub(crate) fn from_request(req: &'a SearchRequest) -> Self {
        Self {
            text: &req.text,
            namespace: req.namespace.as_deref().map(Filter::Eq),
            topics: if req.topics.is_empty() {
                None
            } else {
                Some(Filter::All(req.topics.iter().map(String::as_str).collect()))
            },
            user_id: req.user_id.as_deref().map(Filter::Eq),
            limit: req.limit.max(1),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct SearchResponse {
    #[serde(default)]
    pub memories: Vec<MemoryRecord>,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct CreateBody<'a> {
    pub memories: &'a [MemoryRecord],
}
