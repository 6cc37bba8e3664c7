//! The portfolio document and its profile record
//!
//! A portfolio is one JSON document. Entity sequences keep insertion order,
//! which is also display order. `lastUpdated` is the only signal used to pick
//! between two divergent copies, so every committed mutation must move it
//! forward (see [`next_stamp`]).

use serde::{Deserialize, Deserializer, Serialize};

use crate::entities::{Achievement, Experience, PortfolioCategory, Project, Service, Skill};

/// The single persisted aggregate
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioDocument {
    pub profile: Profile,

    #[serde(default)]
    pub skills: Vec<Skill>,

    #[serde(default)]
    pub projects: Vec<Project>,

    #[serde(default)]
    pub experiences: Vec<Experience>,

    #[serde(default)]
    pub achievements: Vec<Achievement>,

    #[serde(default)]
    pub services: Vec<Service>,

    #[serde(default)]
    pub portfolio_categories: Vec<PortfolioCategory>,

    /// Epoch milliseconds of the last mutation, absent on the untouched seed
    #[serde(
        default,
        deserialize_with = "lenient_stamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub last_updated: Option<i64>,
}

impl PortfolioDocument {
    /// Advance `lastUpdated` using the wall clock
    pub fn touch(&mut self) -> i64 {
        self.touch_at(now_millis())
    }

    /// Advance `lastUpdated` as if the clock read `now`
    pub fn touch_at(&mut self, now: i64) -> i64 {
        let stamp = next_stamp(self.last_updated, now);
        self.last_updated = Some(stamp);
        stamp
    }

    /// Parse a document from JSON text
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Serialize to compact JSON text
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Singleton profile record shared by both views
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub role: String,

    #[serde(default)]
    pub welcome_message: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_image_url: Option<String>,

    // Flat counters predate the per-view stats and are still shown as fallback.
    // Counters are plain numbers on the wire; fractional values are kept.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub years_of_experience: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub projects_count: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clients_count: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub technologies_count: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_icons: Option<CustomIcons>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub se_stats: Option<SeStats>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo_stats: Option<PhotoStats>,
}

/// Per-view icon overrides
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CustomIcons {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub se: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photographer: Option<String>,
}

/// Counters for the software engineer view. Missing fields read as zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeStats {
    pub years: f64,
    pub projects: f64,
    pub clients: f64,
    pub technologies: f64,
}

/// Counters for the photographer view. Missing fields read as zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhotoStats {
    pub years: f64,
    pub projects: f64,
    pub clients: f64,
    pub awards: f64,
}

/// Accept `lastUpdated` as an integer or a float (`Date.now()` stored as a
/// double). Floats are truncated; non-finite values read as absent.
fn lenient_stamp<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Stamp {
        Int(i64),
        Float(f64),
    }

    Ok(match Option::<Stamp>::deserialize(deserializer)? {
        Some(Stamp::Int(ms)) => Some(ms),
        Some(Stamp::Float(ms)) if ms.is_finite() => Some(ms.trunc() as i64),
        Some(Stamp::Float(_)) | None => None,
    })
}

/// Current wall clock in epoch milliseconds
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Next `lastUpdated` value: the clock, unless the clock has not moved past
/// the previous stamp, in which case one past the previous stamp.
pub fn next_stamp(previous: Option<i64>, now: i64) -> i64 {
    match previous {
        Some(prev) if prev >= now => prev + 1,
        _ => now,
    }
}
