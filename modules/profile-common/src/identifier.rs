// Profile key extraction: bare handles and `.../in/<handle>` profile URLs.
// Pure string handling, no HTTP.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::IdentifierError;

/// Path marker preceding the handle in a profile URL.
const PROFILE_MARKER: &str = "/in/";

/// Base used to rebuild a canonical profile URL from a key.
const PROFILE_URL_BASE: &str = "https://www.linkedin.com/in/";

/// Tokens that mark a bare input as a mangled URL rather than a handle.
const RESERVED_TOKENS: &[&str] = &["url", "http", "https", "www", "linkedin"];

/// Canonical handle identifying one profile in the cache namespace.
/// Always non-empty and lower-cased.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProfileKey(String);

impl ProfileKey {
    /// Extract the key from a bare handle or a profile URL.
    pub fn parse(input: &str) -> Result<Self, IdentifierError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(IdentifierError::Empty);
        }

        let raw = match extract_url_handle(trimmed) {
            Some(segment) => segment,
            None if is_bare_handle(trimmed) => trimmed,
            None => return Err(IdentifierError::NoHandle(trimmed.to_string())),
        };

        let decoded = urlencoding::decode(raw)
            .map(|s| s.into_owned())
            .unwrap_or_else(|_| raw.to_string());
        let key = decoded.trim().to_lowercase();

        if key.is_empty() || key.chars().any(|c| c.is_whitespace() || c == '/') {
            return Err(IdentifierError::NoHandle(trimmed.to_string()));
        }
        Ok(Self(key))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Canonical profile URL for this key: "alice" → "https://www.linkedin.com/in/alice/"
    pub fn profile_url(&self) -> String {
        format!(
            "{PROFILE_URL_BASE}{}/",
            urlencoding::encode(&self.0)
        )
    }
}

impl fmt::Display for ProfileKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ProfileKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// The segment after `/in/` (marker matched case-insensitively), up to the next
/// `/`, `?` or `#`. None when the input has no marker.
fn extract_url_handle(input: &str) -> Option<&str> {
    // ASCII lower-casing keeps byte offsets aligned with `input`.
    let lower = input.to_ascii_lowercase();
    let idx = lower.find(PROFILE_MARKER)?;
    let rest = &input[idx + PROFILE_MARKER.len()..];
    let end = rest
        .find(|c: char| matches!(c, '/' | '?' | '#'))
        .unwrap_or(rest.len());
    Some(&rest[..end])
}

fn is_bare_handle(input: &str) -> bool {
    let charset_ok = input
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '%'));
    let has_alnum = input.chars().any(|c| c.is_ascii_alphanumeric());
    if !charset_ok || !has_alnum {
        return false;
    }

    let lower = input.to_ascii_lowercase();
    !lower
        .split(|c: char| matches!(c, '-' | '_' | '.'))
        .any(|token| RESERVED_TOKENS.contains(&token))
}
