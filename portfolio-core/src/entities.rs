//! Entity records held in the document's ordered sequences
//!
//! Every record carries an opaque `id`, unique within its own sequence only.
//! Records never reference each other.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub title: String,
    pub description: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,

    #[serde(default)]
    pub technologies: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ProjectStatus>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProjectStatus {
    Live,
    #[serde(rename = "In Progress")]
    InProgress,
    Concept,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Skill {
    pub id: String,
    pub name: String,
    pub level: SkillLevel,
    #[serde(default)]
    pub years_of_experience: f64,
    pub category: SkillCategory,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon_url: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SkillLevel {
    #[default]
    Beginner,
    Intermediate,
    Advanced,
    Expert,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SkillCategory {
    Frontend,
    Backend,
    Devops,
    Design,
    #[default]
    Other,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Experience {
    pub id: String,
    pub company: String,
    pub role: String,
    pub start_date: String,

    /// Absent while the position is current
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,

    #[serde(default)]
    pub description: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Achievement {
    pub id: String,
    pub title: String,
    pub description: String,
    pub date: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,

    /// Which profile view shows this achievement
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<AchievementCategory>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AchievementCategory {
    Se,
    Photographer,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    pub id: String,
    pub name: String,
    pub description: String,
    /// Icon name understood by the presentation layer
    pub icon: String,
    /// Gradient classes, e.g. `from-pink-500 to-rose-500`
    pub color: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioCategory {
    pub id: String,
    pub category: String,
    pub gradient: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,

    #[serde(default)]
    pub images: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enum_wire_names() {
        assert_eq!(serde_json::to_value(ProjectStatus::InProgress).unwrap(), "In Progress");
        assert_eq!(serde_json::to_value(SkillLevel::Expert).unwrap(), "Expert");
        assert_eq!(serde_json::to_value(SkillCategory::Devops).unwrap(), "devops");
        assert_eq!(serde_json::to_value(AchievementCategory::Se).unwrap(), "se");
    }

    #[test]
    fn test_skill_from_editor_json() {
        let skill: Skill = serde_json::from_str(
            r#"{"id":"1","name":"Rust","level":"Advanced","yearsOfExperience":3,"category":"backend"}"#,
        )
        .unwrap();
        assert_eq!(skill.level, SkillLevel::Advanced);
        assert_eq!(skill.category, SkillCategory::Backend);
        assert_eq!(skill.icon_url, None);
    }

    #[test]
    fn test_experience_without_end_date_is_current() {
        let exp: Experience = serde_json::from_str(
            r#"{"id":"e","company":"Acme","role":"Dev","startDate":"2021-01","description":["a","b"]}"#,
        )
        .unwrap();
        assert!(exp.end_date.is_none());
        assert_eq!(exp.description.len(), 2);
        let back = serde_json::to_value(&exp).unwrap();
        assert!(back.get("endDate").is_none());
    }
}
