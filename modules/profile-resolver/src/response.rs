use serde::{Deserialize, Serialize};

use profile_common::Profile;

use crate::resolver::Resolution;

/// JSON body returned by the scrape endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    pub success: bool,
    pub profile_data: Option<Profile>,
    pub formatted_output: Option<String>,
    pub error: Option<String>,
    pub cached: bool,
}

impl ResponseEnvelope {
    pub fn build(resolution: &Resolution) -> Self {
        Self {
            success: resolution.profile.is_some(),
            profile_data: resolution.profile.clone(),
            formatted_output: resolution.profile.as_ref().map(format_profile),
            error: resolution.error.as_ref().map(ToString::to_string),
            cached: resolution.cached,
        }
    }
}

/// Plain-text rendering: headline, location, audience, activity summary.
/// Lines whose fields are absent are left out.
pub fn format_profile(profile: &Profile) -> String {
    let mut lines = Vec::new();

    let role = match (profile.title.as_deref(), profile.company.as_deref()) {
        (Some(title), Some(company)) => Some(format!("{title} at {company}")),
        (Some(title), None) => Some(title.to_string()),
        (None, Some(company)) => Some(company.to_string()),
        (None, None) => None,
    };
    let headline = match (profile.name.trim(), role) {
        ("", Some(role)) => role,
        (name, Some(role)) => format!("{name} — {role}"),
        (name, None) => name.to_string(),
    };
    if !headline.is_empty() {
        lines.push(headline);
    }

    if let Some(location) = profile.location.as_deref().or(profile.city.as_deref()) {
        lines.push(format!("Location: {location}"));
    }

    let audience: Vec<String> = [
        profile.followers.map(|n| format!("{n} followers")),
        profile.connections.map(|n| format!("{n} connections")),
    ]
    .into_iter()
    .flatten()
    .collect();
    if !audience.is_empty() {
        lines.push(audience.join(" · "));
    }

    if !profile.activity_summary.trim().is_empty() {
        lines.push(profile.activity_summary.clone());
    }

    lines.join("\n")
}
