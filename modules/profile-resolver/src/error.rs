use profile_common::IdentifierError;

/// Failure reported by the Provider Port.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProviderError {
    #[error("Profile not found: {0}")]
    NotFound(String),

    #[error("Provider rate limited: {0}")]
    RateLimited(String),

    #[error("Provider transient failure: {0}")]
    Transient(String),
}

/// Failure reported by the Cache Port. Never surfaced to callers.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CacheError {
    #[error("Cache unavailable: {0}")]
    Unavailable(String),

    #[error("Cache operation timed out after {0:?}")]
    Timeout(std::time::Duration),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NormalizationError {
    #[error("payload is not a JSON object")]
    NotAnObject,

    #[error("payload has neither id nor name")]
    MissingIdentity,
}

/// Errors a resolution can end with. Rendered into the `error` field of the
/// response envelope.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(#[from] IdentifierError),

    #[error("Profile not found: {0}")]
    NotFound(String),

    #[error("Rate limited by provider: {0}")]
    RateLimited(String),

    #[error("Provider unavailable: {0}")]
    ProviderUnavailable(String),

    #[error("Cache unavailable: {0}")]
    CacheUnavailable(String),

    #[error("Normalization error: {0}")]
    Normalization(#[from] NormalizationError),
}

impl ResolveError {
    /// Stable taxonomy name, used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            ResolveError::InvalidIdentifier(_) => "InvalidIdentifier",
            ResolveError::NotFound(_) => "NotFound",
            ResolveError::RateLimited(_) => "RateLimited",
            ResolveError::ProviderUnavailable(_) => "ProviderUnavailable",
            ResolveError::CacheUnavailable(_) => "CacheUnavailable",
            ResolveError::Normalization(_) => "NormalizationError",
        }
    }
}

impl From<ProviderError> for ResolveError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::NotFound(msg) => ResolveError::NotFound(msg),
            ProviderError::RateLimited(msg) => ResolveError::RateLimited(msg),
            ProviderError::Transient(msg) => ResolveError::ProviderUnavailable(msg),
        }
    }
}

impl From<CacheError> for ResolveError {
    fn from(err: CacheError) -> Self {
        ResolveError::CacheUnavailable(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_errors_map_onto_taxonomy() {
        assert_eq!(
            ResolveError::from(ProviderError::Transient("timeout".into())).kind(),
            "ProviderUnavailable"
        );
        assert_eq!(
            ResolveError::from(ProviderError::RateLimited("429".into())).kind(),
            "RateLimited"
        );
        assert_eq!(
            ResolveError::from(ProviderError::NotFound("alice".into())).kind(),
            "NotFound"
        );
    }

    #[test]
    fn cache_errors_become_cache_unavailable() {
        let err = ResolveError::from(CacheError::Timeout(std::time::Duration::from_secs(5)));
        assert_eq!(err.kind(), "CacheUnavailable");
        assert!(err.to_string().contains("timed out after 5s"));

        let err = ResolveError::from(CacheError::Unavailable("connection refused".into()));
        assert_eq!(err.kind(), "CacheUnavailable");
    }
}
