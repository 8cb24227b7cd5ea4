// Payload normalization: raw profile records from the memory server or the
// scraping provider mapped into the canonical Profile.
//
// Both sources may use either spelling of a field. Each canonical field has an
// ordered list of raw spellings below; the first one holding a usable value
// wins. Values of the wrong JSON type are treated as absent, never as errors.
//
//   id              id, linkedinId, linkedin_id
//   name            name, full_name; else first_name + last_name
//   title           title, position, headline
//   summary         summary, about
//   avatarUrl       avatarUrl, avatar_url, avatar; else DEFAULT_AVATAR_URL
//   location        location, city
//   company         company; else currentCompany.name
//   currentCompany  currentCompany / current_company (string or {name})
//   experiences     experiences, experience
//   education       education (null == absent)
//   activities      activities, activity

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use profile_common::{
    Education, Experience, Profile, SocialLinks, DEFAULT_AVATAR_URL, NO_ACTIVITY_SUMMARY,
};

use crate::error::NormalizationError;
use crate::ports::{CachedEntry, PayloadSource};

const ID: &[&str] = &["id", "linkedinId", "linkedin_id"];
const NAME: &[&str] = &["name", "fullName", "full_name"];
const FIRST_NAME: &[&str] = &["firstName", "first_name"];
const LAST_NAME: &[&str] = &["lastName", "last_name"];
const TITLE: &[&str] = &["title", "position", "headline"];
const SUMMARY: &[&str] = &["summary", "about"];
const AVATAR: &[&str] = &["avatarUrl", "avatar_url", "avatar"];
const LOCATION: &[&str] = &["location", "city"];
const CITY: &[&str] = &["city"];
const COUNTRY_CODE: &[&str] = &["countryCode", "country_code"];
const COMPANY: &[&str] = &["company"];
const CURRENT_COMPANY: &[&str] = &["currentCompany", "current_company"];
const EXPERIENCES: &[&str] = &["experiences", "experience"];
const EDUCATION: &[&str] = &["education"];
const SKILLS: &[&str] = &["skills"];
const SOCIAL: &[&str] = &["social"];
const FOLLOWERS: &[&str] = &["followers"];
const CONNECTIONS: &[&str] = &["connections"];
const URL: &[&str] = &["url"];
const LINKEDIN_ID: &[&str] = &["linkedinId", "linkedin_id"];
const LINKEDIN_NUM_ID: &[&str] = &["linkedinNumId", "linkedin_num_id"];
const BANNER_IMAGE: &[&str] = &["bannerImage", "banner_image"];
const ACTIVITIES: &[&str] = &["activities", "activity"];
const RETRIEVED_AT: &[&str] = &["retrievedAt", "retrieved_at"];
const USED_DEFAULT_AVATAR: &[&str] = &["usedDefaultAvatar", "used_default_avatar"];

/// A raw profile record: a JSON object with loosely-typed fields.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawPayload {
    fields: Map<String, Value>,
}

impl RawPayload {
    pub fn from_value(value: Value) -> Result<Self, NormalizationError> {
        match value {
            Value::Object(fields) => Ok(Self { fields }),
            _ => Err(NormalizationError::NotAnObject),
        }
    }

    pub fn from_json(text: &str) -> Result<Self, NormalizationError> {
        let value: Value =
            serde_json::from_str(text).map_err(|_| NormalizationError::NotAnObject)?;
        Self::from_value(value)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// First non-empty text value among `keys`. Numbers are stringified.
    pub fn text(&self, keys: &[&str]) -> Option<String> {
        text_of(&self.fields, keys)
    }

    fn count(&self, keys: &[&str]) -> Option<u64> {
        keys.iter()
            .find_map(|k| self.fields.get(*k).and_then(as_count))
    }

    fn flag(&self, keys: &[&str]) -> Option<bool> {
        keys.iter()
            .find_map(|k| self.fields.get(*k).and_then(Value::as_bool))
    }

    fn timestamp(&self, keys: &[&str]) -> Option<DateTime<Utc>> {
        self.text(keys).and_then(|s| {
            DateTime::parse_from_rfc3339(&s)
                .ok()
                .map(|t| t.with_timezone(&Utc))
        })
    }

    /// First array among `keys`. `null` counts as absent.
    fn array(&self, keys: &[&str]) -> &[Value] {
        keys.iter()
            .find_map(|k| self.fields.get(*k).and_then(Value::as_array))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Raw activity entries in input order. Non-object entries are dropped.
    pub fn activities(&self) -> Vec<RawActivity> {
        self.array(ACTIVITIES)
            .iter()
            .filter_map(RawActivity::from_value)
            .collect()
    }
}

/// One activity entry before id assignment and dedup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawActivity {
    pub id: Option<String>,
    pub interaction: Option<String>,
    pub link: Option<String>,
    pub title: Option<String>,
    pub image: Option<String>,
}

impl RawActivity {
    fn from_value(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;
        Some(Self {
            id: text_of(obj, &["id", "activity_id"]),
            interaction: text_of(obj, &["interaction"]),
            link: text_of(obj, &["link", "url"]),
            title: text_of(obj, &["title"]),
            image: text_of(obj, &["image", "img"]),
        })
    }
}

/// Map a raw payload into a Profile. Activities are left empty; the resolver
/// fills them through the activity decomposer.
///
/// Fails only when the payload carries neither an id nor a name.
pub fn normalize(raw: &RawPayload, source: PayloadSource) -> Result<Profile, NormalizationError> {
    let id = raw.text(ID);
    let name = raw.text(NAME).or_else(|| full_name(raw));
    if id.is_none() && name.is_none() {
        return Err(NormalizationError::MissingIdentity);
    }

    let current_company = company_name(raw);
    let (avatar_url, defaulted) = match raw.text(AVATAR) {
        Some(url) => (url, false),
        None => (DEFAULT_AVATAR_URL.to_string(), true),
    };
    let (retrieved_at, flagged_default) = match source {
        PayloadSource::Cache => (
            raw.timestamp(RETRIEVED_AT),
            raw.flag(USED_DEFAULT_AVATAR).unwrap_or(false),
        ),
        PayloadSource::Provider => (None, false),
    };

    Ok(Profile {
        id: id.unwrap_or_default(),
        name: name.unwrap_or_default(),
        title: raw.text(TITLE),
        company: raw.text(COMPANY).or_else(|| current_company.clone()),
        location: raw.text(LOCATION),
        city: raw.text(CITY),
        country_code: raw.text(COUNTRY_CODE),
        avatar_url,
        summary: raw.text(SUMMARY),
        experiences: raw.array(EXPERIENCES).iter().filter_map(experience).collect(),
        education: raw.array(EDUCATION).iter().filter_map(education).collect(),
        skills: skills(raw.array(SKILLS)),
        social: social(raw),
        current_company,
        followers: raw.count(FOLLOWERS),
        connections: raw.count(CONNECTIONS),
        url: raw.text(URL),
        linkedin_id: raw.text(LINKEDIN_ID),
        linkedin_num_id: raw.text(LINKEDIN_NUM_ID),
        banner_image: raw.text(BANNER_IMAGE),
        activity_summary: NO_ACTIVITY_SUMMARY.to_string(),
        activities: Vec::new(),
        retrieved_at,
        used_default_avatar: defaulted || flagged_default,
    })
}

/// Whether a cached profile can be served without consulting the provider:
/// it has a name, and either carries activities or is younger than the
/// cache's freshness threshold. Entries without age information pass.
pub fn is_sufficient(profile: &Profile, entry: &CachedEntry, now: DateTime<Utc>) -> bool {
    if profile.name.trim().is_empty() {
        return false;
    }
    if !profile.activities.is_empty() {
        return true;
    }
    match (entry.age(now), entry.fresh_for) {
        (Some(age), Some(threshold)) => age < threshold,
        _ => true,
    }
}

fn full_name(raw: &RawPayload) -> Option<String> {
    match (raw.text(FIRST_NAME), raw.text(LAST_NAME)) {
        (Some(first), Some(last)) => Some(format!("{first} {last}")),
        (Some(first), None) => Some(first),
        (None, Some(last)) => Some(last),
        (None, None) => None,
    }
}

/// `currentCompany` as a plain string or as an object with a `name`.
fn company_name(raw: &RawPayload) -> Option<String> {
    CURRENT_COMPANY
        .iter()
        .find_map(|k| raw.fields.get(*k).and_then(name_or_text))
}

fn experience(value: &Value) -> Option<Experience> {
    let obj = value.as_object()?;
    let role = text_of(obj, &["role", "title", "position"]);
    let company = ["company", "company_name"]
        .iter()
        .find_map(|k| obj.get(*k).and_then(name_or_text));
    if role.is_none() && company.is_none() {
        return None;
    }

    let period = text_of(obj, &["period"]).or_else(|| {
        span(
            text_of(obj, &["startDate", "start_date"]),
            text_of(obj, &["endDate", "end_date"]),
        )
    });

    Some(Experience {
        role: role.unwrap_or_default(),
        company: company.unwrap_or_default(),
        period: period.unwrap_or_default(),
        location: text_of(obj, &["location"]),
    })
}

fn education(value: &Value) -> Option<Education> {
    let obj = value.as_object()?;
    let school = text_of(obj, &["school", "title", "institute"])?;

    let degree = match (
        text_of(obj, &["degree"]),
        text_of(obj, &["field", "field_of_study"]),
    ) {
        (Some(degree), Some(field)) => format!("{degree}, {field}"),
        (Some(degree), None) => degree,
        (None, Some(field)) => field,
        (None, None) => String::new(),
    };
    let period = text_of(obj, &["period"]).or_else(|| {
        span(
            text_of(obj, &["startYear", "start_year"]),
            text_of(obj, &["endYear", "end_year"]),
        )
    });

    Some(Education {
        school,
        degree,
        period: period.unwrap_or_default(),
    })
}

fn skills(values: &[Value]) -> BTreeSet<String> {
    values.iter().filter_map(name_or_text).collect()
}

fn social(raw: &RawPayload) -> SocialLinks {
    let Some(obj) = SOCIAL
        .iter()
        .find_map(|k| raw.fields.get(*k).and_then(Value::as_object))
    else {
        return SocialLinks::default();
    };

    SocialLinks {
        linkedin: text_of(obj, &["linkedin"]),
        twitter: text_of(obj, &["twitter", "x"]),
        github: text_of(obj, &["github"]),
        website: text_of(obj, &["website"]),
    }
}

/// "2019" + "2023" → "2019 - 2023"; an open end reads "Present".
fn span(start: Option<String>, end: Option<String>) -> Option<String> {
    match (start, end) {
        (Some(start), Some(end)) => Some(format!("{start} - {end}")),
        (Some(start), None) => Some(format!("{start} - Present")),
        (None, Some(end)) => Some(end),
        (None, None) => None,
    }
}

fn text_of(obj: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|k| obj.get(*k).and_then(as_text))
}

fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn name_or_text(value: &Value) -> Option<String> {
    match value {
        Value::Object(obj) => text_of(obj, &["name", "title"]),
        other => as_text(other),
    }
}

/// Non-negative integer from a number or a numeric string ("1,204", "500+").
fn as_count(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64().or_else(|| {
            n.as_f64()
                .filter(|f| *f >= 0.0 && f.fract() == 0.0)
                .map(|f| f as u64)
        }),
        Value::String(s) => s
            .trim()
            .trim_end_matches('+')
            .replace(',', "")
            .parse::<u64>()
            .ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(value: Value) -> RawPayload {
        RawPayload::from_value(value).unwrap()
    }

    #[test]
    fn missing_identity_is_rejected() {
        let err = normalize(&raw(json!({"title": "Engineer"})), PayloadSource::Provider)
            .unwrap_err();
        assert_eq!(err, NormalizationError::MissingIdentity);
    }

    #[test]
    fn non_object_payload_is_rejected() {
        assert_eq!(
            RawPayload::from_value(json!([1, 2])),
            Err(NormalizationError::NotAnObject)
        );
        assert_eq!(
            RawPayload::from_json("not json"),
            Err(NormalizationError::NotAnObject)
        );
    }

    #[test]
    fn id_or_name_alone_is_enough() {
        let p = normalize(&raw(json!({"id": "alice"})), PayloadSource::Provider).unwrap();
        assert_eq!(p.id, "alice");
        assert_eq!(p.name, "");

        let p = normalize(&raw(json!({"name": "Alice"})), PayloadSource::Provider).unwrap();
        assert_eq!(p.id, "");
        assert_eq!(p.name, "Alice");
    }

    #[test]
    fn avatar_precedence() {
        let p = normalize(
            &raw(json!({"id": "a", "avatarUrl": "https://x/1.png", "avatar": "https://x/2.png"})),
            PayloadSource::Provider,
        )
        .unwrap();
        assert_eq!(p.avatar_url, "https://x/1.png");
        assert!(!p.used_default_avatar);

        let p = normalize(
            &raw(json!({"id": "a", "avatar": "https://x/2.png"})),
            PayloadSource::Provider,
        )
        .unwrap();
        assert_eq!(p.avatar_url, "https://x/2.png");

        let p = normalize(&raw(json!({"id": "a", "avatar": ""})), PayloadSource::Provider).unwrap();
        assert_eq!(p.avatar_url, DEFAULT_AVATAR_URL);
        assert!(p.used_default_avatar);
    }

    #[test]
    fn location_falls_back_to_city() {
        let p = normalize(
            &raw(json!({"id": "a", "city": "Berlin, Germany"})),
            PayloadSource::Provider,
        )
        .unwrap();
        assert_eq!(p.location.as_deref(), Some("Berlin, Germany"));
        assert_eq!(p.city.as_deref(), Some("Berlin, Germany"));

        let p = normalize(
            &raw(json!({"id": "a", "location": "Berlin", "city": "Potsdam"})),
            PayloadSource::Provider,
        )
        .unwrap();
        assert_eq!(p.location.as_deref(), Some("Berlin"));
    }

    #[test]
    fn company_falls_back_to_current_company_name() {
        let p = normalize(
            &raw(json!({
                "id": "a",
                "current_company": {"name": "Acme", "link": "https://x/acme"}
            })),
            PayloadSource::Provider,
        )
        .unwrap();
        assert_eq!(p.company.as_deref(), Some("Acme"));
        assert_eq!(p.current_company.as_deref(), Some("Acme"));

        let p = normalize(
            &raw(json!({"id": "a", "company": "Initech", "currentCompany": "Acme"})),
            PayloadSource::Provider,
        )
        .unwrap();
        assert_eq!(p.company.as_deref(), Some("Initech"));
        assert_eq!(p.current_company.as_deref(), Some("Acme"));
    }

    #[test]
    fn null_and_absent_education_are_empty() {
        let p = normalize(&raw(json!({"id": "a", "education": null})), PayloadSource::Provider)
            .unwrap();
        assert!(p.education.is_empty());
        let p = normalize(&raw(json!({"id": "a"})), PayloadSource::Provider).unwrap();
        assert!(p.education.is_empty());
    }

    #[test]
    fn provider_sub_records_are_mapped() {
        let p = normalize(
            &raw(json!({
                "id": "a",
                "experience": [
                    {"title": "Engineer", "company": "Acme", "start_date": "2020", "location": "Remote"},
                    "garbage",
                    {"description": "no role or company"}
                ],
                "education": [
                    {"title": "MIT", "degree": "BSc", "field": "Physics", "start_year": "2012", "end_year": "2016"}
                ]
            })),
            PayloadSource::Provider,
        )
        .unwrap();

        assert_eq!(
            p.experiences,
            vec![Experience {
                role: "Engineer".into(),
                company: "Acme".into(),
                period: "2020 - Present".into(),
                location: Some("Remote".into()),
            }]
        );
        assert_eq!(
            p.education,
            vec![Education {
                school: "MIT".into(),
                degree: "BSc, Physics".into(),
                period: "2012 - 2016".into(),
            }]
        );
    }

    #[test]
    fn counts_are_lenient_and_non_negative() {
        let p = normalize(
            &raw(json!({"id": "a", "followers": "1,204", "connections": "500+"})),
            PayloadSource::Provider,
        )
        .unwrap();
        assert_eq!(p.followers, Some(1204));
        assert_eq!(p.connections, Some(500));

        let p = normalize(
            &raw(json!({"id": "a", "followers": -3, "connections": {"n": 1}})),
            PayloadSource::Provider,
        )
        .unwrap();
        assert_eq!(p.followers, None);
        assert_eq!(p.connections, None);
    }

    #[test]
    fn numeric_ids_are_stringified() {
        let p = normalize(
            &raw(json!({"id": "a", "linkedin_num_id": 123456789})),
            PayloadSource::Provider,
        )
        .unwrap();
        assert_eq!(p.linkedin_num_id.as_deref(), Some("123456789"));
    }

    #[test]
    fn bookkeeping_fields_only_trusted_from_cache() {
        let payload = raw(json!({
            "id": "a",
            "avatarUrl": DEFAULT_AVATAR_URL,
            "usedDefaultAvatar": true,
            "retrievedAt": "2025-09-19T22:48:00Z"
        }));

        let cached = normalize(&payload, PayloadSource::Cache).unwrap();
        assert!(cached.used_default_avatar);
        assert!(cached.retrieved_at.is_some());

        let fetched = normalize(&payload, PayloadSource::Provider).unwrap();
        assert!(!fetched.used_default_avatar);
        assert!(fetched.retrieved_at.is_none());
    }

    #[test]
    fn sufficiency_rules() {
        let now = Utc::now();
        let stale_entry = CachedEntry {
            payload: RawPayload::default(),
            retrieved_at: Some(now - chrono::Duration::hours(48)),
            fresh_for: Some(std::time::Duration::from_secs(24 * 3600)),
        };
        let fresh_entry = CachedEntry {
            retrieved_at: Some(now - chrono::Duration::hours(1)),
            ..stale_entry.clone()
        };
        let ageless_entry = CachedEntry {
            retrieved_at: None,
            ..stale_entry.clone()
        };

        let bare = Profile::new("alice", "Alice");
        assert!(!is_sufficient(&bare, &stale_entry, now));
        assert!(is_sufficient(&bare, &fresh_entry, now));
        assert!(is_sufficient(&bare, &ageless_entry, now));

        let mut with_activity = bare.clone();
        with_activity.activities.push(profile_common::Activity {
            id: "1".into(),
            interaction: "Liked by Alice".into(),
            link: "l1".into(),
            title: "t1".into(),
            image: None,
        });
        assert!(is_sufficient(&with_activity, &stale_entry, now));

        let nameless = Profile::new("alice", "");
        assert!(!is_sufficient(&nameless, &fresh_entry, now));
    }
}
