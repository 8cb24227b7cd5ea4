use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Avatar used when neither `avatarUrl` nor `avatar` is present.
pub const DEFAULT_AVATAR_URL: &str =
    "https://static.licdn.com/aero-v1/sc/h/9c8pery4andzj6ohjkjp54ma2";

/// Summary used when a profile has no activities.
pub const NO_ACTIVITY_SUMMARY: &str = "No recent activity data";

/// Canonical profile. Serialized with the camelCase field names exposed in
/// `profile_data`; unset fields and empty collections are omitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country_code: Option<String>,
    pub avatar_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub experiences: Vec<Experience>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub education: Vec<Education>,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub skills: BTreeSet<String>,
    #[serde(default, skip_serializing_if = "SocialLinks::is_empty")]
    pub social: SocialLinks,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_company: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub followers: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connections: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linkedin_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linkedin_num_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub banner_image: Option<String>,
    #[serde(default)]
    pub activity_summary: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub activities: Vec<Activity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retrieved_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub used_default_avatar: bool,
}

impl Profile {
    /// A profile with only its identity set. Everything else is unset.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            title: None,
            company: None,
            location: None,
            city: None,
            country_code: None,
            avatar_url: DEFAULT_AVATAR_URL.to_string(),
            summary: None,
            experiences: Vec::new(),
            education: Vec::new(),
            skills: BTreeSet::new(),
            social: SocialLinks::default(),
            current_company: None,
            followers: None,
            connections: None,
            url: None,
            linkedin_id: None,
            linkedin_num_id: None,
            banner_image: None,
            activity_summary: NO_ACTIVITY_SUMMARY.to_string(),
            activities: Vec::new(),
            retrieved_at: None,
            used_default_avatar: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Experience {
    pub role: String,
    pub company: String,
    pub period: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Education {
    pub school: String,
    pub degree: String,
    pub period: String,
}

/// One engagement entry ("Liked by …", "Commented on …") attached to a profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Activity {
    pub id: String,
    pub interaction: String,
    pub link: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SocialLinks {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linkedin: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub twitter: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub github: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
}

impl SocialLinks {
    pub fn is_empty(&self) -> bool {
        self.linkedin.is_none()
            && self.twitter.is_none()
            && self.github.is_none()
            && self.website.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn serializes_camel_case_and_omits_unset_fields() {
        let mut profile = Profile::new("alice", "Alice");
        profile.country_code = Some("US".into());
        profile.followers = Some(12);

        let value = serde_json::to_value(&profile).unwrap();
        assert_eq!(value["countryCode"], json!("US"));
        assert_eq!(value["avatarUrl"], json!(DEFAULT_AVATAR_URL));
        assert_eq!(value["usedDefaultAvatar"], json!(true));
        assert_eq!(value["followers"], json!(12));
        assert!(value.get("title").is_none());
        assert!(value.get("activities").is_none());
        assert!(value.get("social").is_none());
    }

    #[test]
    fn skills_serialize_sorted() {
        let mut profile = Profile::new("alice", "Alice");
        profile.skills.insert("rust".into());
        profile.skills.insert("go".into());

        let value = serde_json::to_value(&profile).unwrap();
        assert_eq!(value["skills"], json!(["go", "rust"]));
    }
}
