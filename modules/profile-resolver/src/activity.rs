use std::collections::{BTreeSet, HashSet};

use sha2::{Digest, Sha256};

use profile_common::{Activity, NO_ACTIVITY_SUMMARY};

use crate::payload::RawActivity;

/// Category for interactions whose leading verb is not in the vocabulary.
pub const FALLBACK_CATEGORY: &str = "interacted";

const DEFAULT_CATEGORIES: &[&str] = &[
    "liked",
    "commented",
    "shared",
    "reposted",
    "posted",
    "celebrated",
    "supported",
    "loved",
    "found",
    "reacted",
    "insightful",
    "funny",
];

/// Leading verbs recognised as activity categories.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryVocabulary {
    verbs: BTreeSet<String>,
}

impl CategoryVocabulary {
    pub fn new<I, S>(verbs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            verbs: verbs
                .into_iter()
                .map(|v| v.as_ref().trim().to_lowercase())
                .filter(|v| !v.is_empty())
                .collect(),
        }
    }

    pub fn contains(&self, verb: &str) -> bool {
        self.verbs.contains(verb)
    }

    /// Category of an interaction text: its first word, lower-cased with
    /// trailing punctuation removed, if known; otherwise `interacted`.
    pub fn categorize(&self, interaction: &str) -> String {
        let verb = interaction
            .split_whitespace()
            .next()
            .map(|w| {
                w.trim_end_matches(|c: char| !c.is_alphanumeric())
                    .to_lowercase()
            })
            .unwrap_or_default();

        if self.contains(&verb) {
            verb
        } else {
            FALLBACK_CATEGORY.to_string()
        }
    }
}

impl Default for CategoryVocabulary {
    fn default() -> Self {
        Self::new(DEFAULT_CATEGORIES)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decomposition {
    pub activities: Vec<Activity>,
    pub summary: String,
}

/// Assign ids, drop duplicate ids (first occurrence wins, order kept) and
/// summarize by category.
pub fn decompose(raw: &[RawActivity], vocab: &CategoryVocabulary) -> Decomposition {
    let mut seen = HashSet::new();
    let mut activities = Vec::with_capacity(raw.len());

    for entry in raw {
        let link = entry.link.clone().unwrap_or_default();
        let title = entry.title.clone().unwrap_or_default();
        let id = match entry.id.as_deref().map(str::trim) {
            Some(id) if !id.is_empty() => id.to_string(),
            _ => derive_activity_id(&link, &title),
        };
        if !seen.insert(id.clone()) {
            continue;
        }
        activities.push(Activity {
            id,
            interaction: entry.interaction.clone().unwrap_or_default(),
            link,
            title,
            image: entry.image.clone(),
        });
    }

    let summary = summarize(&activities, vocab);
    Decomposition {
        activities,
        summary,
    }
}

/// "User has 3 recent activities: 2 liked, 1 commented."
pub fn summarize(activities: &[Activity], vocab: &CategoryVocabulary) -> String {
    if activities.is_empty() {
        return NO_ACTIVITY_SUMMARY.to_string();
    }

    let mut counts: Vec<(String, usize)> = Vec::new();
    for activity in activities {
        let category = vocab.categorize(&activity.interaction);
        match counts.iter_mut().find(|(c, _)| *c == category) {
            Some((_, n)) => *n += 1,
            None => counts.push((category, 1)),
        }
    }

    let parts: Vec<String> = counts
        .iter()
        .map(|(category, n)| format!("{n} {category}"))
        .collect();
    format!(
        "User has {} recent activities: {}.",
        activities.len(),
        parts.join(", ")
    )
}

/// Stable id for an activity without one: SHA-256 of link and title.
pub fn derive_activity_id(link: &str, title: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(link.as_bytes());
    hasher.update([0x1f]);
    hasher.update(title.as_bytes());
    let digest = hex::encode(hasher.finalize());
    digest[..16].to_string()
}
