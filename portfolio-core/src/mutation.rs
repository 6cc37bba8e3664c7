//! Content mutations over the document's entity sequences
//!
//! Each of the six collections gets the same four operations:
//!
//! | operation | effect                                          | not found |
//! |-----------|-------------------------------------------------|-----------|
//! | `add`     | append, caller supplies the id                  | -         |
//! | `update`  | merge the set fields of a patch into the record | no-op     |
//! | `remove`  | drop the record                                 | no-op     |
//! | `move`    | swap with the neighbour above or below          | no-op     |
//!
//! The methods here only edit the document and report whether it changed.
//! Stamping `lastUpdated`, caching and remote persistence belong to the
//! store that owns the document.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::document::{CustomIcons, PhotoStats, PortfolioDocument, SeStats};
use crate::entities::{
    Achievement, AchievementCategory, Experience, PortfolioCategory, Project, ProjectStatus,
    Service, Skill, SkillCategory, SkillLevel,
};

/// Generate a collision-resistant id for a new entity record
pub fn new_entity_id() -> String {
    Uuid::new_v4().to_string()
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MutationError {
    #[error("{collection} already contains an entry with id '{id}'")]
    DuplicateId { collection: Collection, id: String },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("unknown collection '{0}'")]
    UnknownCollection(String),

    #[error("unknown direction '{0}' (expected up or down)")]
    UnknownDirection(String),
}

// ============================================================================
// Collection / Direction
// ============================================================================

/// The six entity sequences of a portfolio document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Skills,
    Projects,
    Experiences,
    Achievements,
    Services,
    PortfolioCategories,
}

impl Collection {
    pub const ALL: [Collection; 6] = [
        Collection::Skills,
        Collection::Projects,
        Collection::Experiences,
        Collection::Achievements,
        Collection::Services,
        Collection::PortfolioCategories,
    ];

    /// JSON key of the sequence inside the document
    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Skills => "skills",
            Collection::Projects => "projects",
            Collection::Experiences => "experiences",
            Collection::Achievements => "achievements",
            Collection::Services => "services",
            Collection::PortfolioCategories => "portfolioCategories",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Collection {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace(['-', '_'], "").as_str() {
            "skills" | "skill" => Ok(Collection::Skills),
            "projects" | "project" => Ok(Collection::Projects),
            "experiences" | "experience" => Ok(Collection::Experiences),
            "achievements" | "achievement" => Ok(Collection::Achievements),
            "services" | "service" => Ok(Collection::Services),
            "portfoliocategories" | "portfoliocategory" | "categories" => {
                Ok(Collection::PortfolioCategories)
            }
            _ => Err(ParseError::UnknownCollection(s.to_string())),
        }
    }
}

/// Direction for [`PortfolioDocument::move_entry`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Towards index 0
    Up,
    /// Towards the end of the sequence
    Down,
}

impl FromStr for Direction {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "up" => Ok(Direction::Up),
            "down" => Ok(Direction::Down),
            _ => Err(ParseError::UnknownDirection(s.to_string())),
        }
    }
}

// ============================================================================
// Traits
// ============================================================================

/// A record living in one of the document's sequences
pub trait Entity: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    const COLLECTION: Collection;

    fn id(&self) -> &str;

    fn sequence(doc: &PortfolioDocument) -> &[Self];

    fn sequence_mut(doc: &mut PortfolioDocument) -> &mut Vec<Self>;
}

/// Partial update for an [`Entity`]; unset fields leave the record untouched
pub trait EntityPatch: Default + PartialEq + Send + 'static {
    type Target: Entity;

    fn apply_to(self, target: &mut Self::Target);

    fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

fn merge<T>(slot: &mut T, value: Option<T>) {
    if let Some(v) = value {
        *slot = v;
    }
}

fn merge_opt<T>(slot: &mut Option<T>, value: Option<T>) {
    if value.is_some() {
        *slot = value;
    }
}

// ============================================================================
// Document operations
// ============================================================================

impl PortfolioDocument {
    /// Append a record. Ids must be unique within the sequence.
    pub fn add<E: Entity>(&mut self, record: E) -> Result<(), MutationError> {
        if E::sequence(self).iter().any(|r| r.id() == record.id()) {
            return Err(MutationError::DuplicateId {
                collection: E::COLLECTION,
                id: record.id().to_string(),
            });
        }
        E::sequence_mut(self).push(record);
        Ok(())
    }

    /// Merge `patch` into the record with `id`. Returns false if absent or
    /// if the patch sets nothing.
    pub fn update<P: EntityPatch>(&mut self, id: &str, patch: P) -> bool {
        if patch.is_empty() {
            return false;
        }
        match P::Target::sequence_mut(self).iter_mut().find(|r| r.id() == id) {
            Some(record) => {
                patch.apply_to(record);
                true
            }
            None => false,
        }
    }

    /// Remove the record with `id`. Returns false if absent.
    pub fn remove<E: Entity>(&mut self, id: &str) -> bool {
        let seq = E::sequence_mut(self);
        let before = seq.len();
        seq.retain(|r| r.id() != id);
        seq.len() != before
    }

    /// Swap the record with its neighbour. Returns false at the sequence
    /// boundaries or if `id` is absent.
    pub fn move_entry<E: Entity>(&mut self, id: &str, direction: Direction) -> bool {
        let seq = E::sequence_mut(self);
        let Some(index) = seq.iter().position(|r| r.id() == id) else {
            return false;
        };
        let neighbour = match direction {
            Direction::Up => index.checked_sub(1),
            Direction::Down => Some(index + 1).filter(|n| *n < seq.len()),
        };
        match neighbour {
            Some(other) => {
                seq.swap(index, other);
                true
            }
            None => false,
        }
    }

    /// Shallow-merge into the profile. Returns false for an empty patch.
    pub fn update_profile(&mut self, patch: ProfilePatch) -> bool {
        if patch == ProfilePatch::default() {
            return false;
        }
        let p = &mut self.profile;
        merge(&mut p.name, patch.name);
        merge(&mut p.role, patch.role);
        merge(&mut p.welcome_message, patch.welcome_message);
        merge_opt(&mut p.avatar_url, patch.avatar_url);
        merge_opt(&mut p.background_image_url, patch.background_image_url);
        merge_opt(&mut p.years_of_experience, patch.years_of_experience);
        merge_opt(&mut p.projects_count, patch.projects_count);
        merge_opt(&mut p.clients_count, patch.clients_count);
        merge_opt(&mut p.technologies_count, patch.technologies_count);
        merge_opt(&mut p.custom_icons, patch.custom_icons);
        merge_opt(&mut p.se_stats, patch.se_stats);
        merge_opt(&mut p.photo_stats, patch.photo_stats);
        true
    }
}

// ============================================================================
// Profile patch
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProfilePatch {
    pub name: Option<String>,
    pub role: Option<String>,
    pub welcome_message: Option<String>,
    pub avatar_url: Option<String>,
    pub background_image_url: Option<String>,
    pub years_of_experience: Option<f64>,
    pub projects_count: Option<f64>,
    pub clients_count: Option<f64>,
    pub technologies_count: Option<f64>,
    pub custom_icons: Option<CustomIcons>,
    pub se_stats: Option<SeStats>,
    pub photo_stats: Option<PhotoStats>,
}

// ============================================================================
// Entity impls and patches
// ============================================================================

impl Entity for Skill {
    const COLLECTION: Collection = Collection::Skills;

    fn id(&self) -> &str {
        &self.id
    }

    fn sequence(doc: &PortfolioDocument) -> &[Self] {
        &doc.skills
    }

    fn sequence_mut(doc: &mut PortfolioDocument) -> &mut Vec<Self> {
        &mut doc.skills
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SkillPatch {
    pub name: Option<String>,
    pub level: Option<SkillLevel>,
    pub years_of_experience: Option<f64>,
    pub category: Option<SkillCategory>,
    pub icon_url: Option<String>,
}

impl EntityPatch for SkillPatch {
    type Target = Skill;

    fn apply_to(self, t: &mut Skill) {
        merge(&mut t.name, self.name);
        merge(&mut t.level, self.level);
        merge(&mut t.years_of_experience, self.years_of_experience);
        merge(&mut t.category, self.category);
        merge_opt(&mut t.icon_url, self.icon_url);
    }
}

impl Entity for Project {
    const COLLECTION: Collection = Collection::Projects;

    fn id(&self) -> &str {
        &self.id
    }

    fn sequence(doc: &PortfolioDocument) -> &[Self] {
        &doc.projects
    }

    fn sequence_mut(doc: &mut PortfolioDocument) -> &mut Vec<Self> {
        &mut doc.projects
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProjectPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub image: Option<String>,
    pub technologies: Option<Vec<String>>,
    pub link: Option<String>,
    pub status: Option<ProjectStatus>,
}

impl EntityPatch for ProjectPatch {
    type Target = Project;

    fn apply_to(self, t: &mut Project) {
        merge(&mut t.title, self.title);
        merge(&mut t.description, self.description);
        merge_opt(&mut t.image, self.image);
        merge(&mut t.technologies, self.technologies);
        merge_opt(&mut t.link, self.link);
        merge_opt(&mut t.status, self.status);
    }
}

impl Entity for Experience {
    const COLLECTION: Collection = Collection::Experiences;

    fn id(&self) -> &str {
        &self.id
    }

    fn sequence(doc: &PortfolioDocument) -> &[Self] {
        &doc.experiences
    }

    fn sequence_mut(doc: &mut PortfolioDocument) -> &mut Vec<Self> {
        &mut doc.experiences
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExperiencePatch {
    pub company: Option<String>,
    pub role: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub description: Option<Vec<String>>,
}

impl EntityPatch for ExperiencePatch {
    type Target = Experience;

    fn apply_to(self, t: &mut Experience) {
        merge(&mut t.company, self.company);
        merge(&mut t.role, self.role);
        merge(&mut t.start_date, self.start_date);
        merge_opt(&mut t.end_date, self.end_date);
        merge(&mut t.description, self.description);
    }
}

impl Entity for Achievement {
    const COLLECTION: Collection = Collection::Achievements;

    fn id(&self) -> &str {
        &self.id
    }

    fn sequence(doc: &PortfolioDocument) -> &[Self] {
        &doc.achievements
    }

    fn sequence_mut(doc: &mut PortfolioDocument) -> &mut Vec<Self> {
        &mut doc.achievements
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AchievementPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub date: Option<String>,
    pub icon_url: Option<String>,
    pub image: Option<String>,
    pub category: Option<AchievementCategory>,
    pub color: Option<String>,
}

impl EntityPatch for AchievementPatch {
    type Target = Achievement;

    fn apply_to(self, t: &mut Achievement) {
        merge(&mut t.title, self.title);
        merge(&mut t.description, self.description);
        merge(&mut t.date, self.date);
        merge_opt(&mut t.icon_url, self.icon_url);
        merge_opt(&mut t.image, self.image);
        merge_opt(&mut t.category, self.category);
        merge_opt(&mut t.color, self.color);
    }
}

impl Entity for Service {
    const COLLECTION: Collection = Collection::Services;

    fn id(&self) -> &str {
        &self.id
    }

    fn sequence(doc: &PortfolioDocument) -> &[Self] {
        &doc.services
    }

    fn sequence_mut(doc: &mut PortfolioDocument) -> &mut Vec<Self> {
        &mut doc.services
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServicePatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub icon: Option<String>,
    pub color: Option<String>,
}

impl EntityPatch for ServicePatch {
    type Target = Service;

    fn apply_to(self, t: &mut Service) {
        merge(&mut t.name, self.name);
        merge(&mut t.description, self.description);
        merge(&mut t.icon, self.icon);
        merge(&mut t.color, self.color);
    }
}

impl Entity for PortfolioCategory {
    const COLLECTION: Collection = Collection::PortfolioCategories;

    fn id(&self) -> &str {
        &self.id
    }

    fn sequence(doc: &PortfolioDocument) -> &[Self] {
        &doc.portfolio_categories
    }

    fn sequence_mut(doc: &mut PortfolioDocument) -> &mut Vec<Self> {
        &mut doc.portfolio_categories
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PortfolioCategoryPatch {
    pub category: Option<String>,
    pub gradient: Option<String>,
    pub image: Option<String>,
    pub images: Option<Vec<String>>,
}

impl EntityPatch for PortfolioCategoryPatch {
    type Target = PortfolioCategory;

    fn apply_to(self, t: &mut PortfolioCategory) {
        merge(&mut t.category, self.category);
        merge(&mut t.gradient, self.gradient);
        merge_opt(&mut t.image, self.image);
        merge(&mut t.images, self.images);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn project(id: &str, title: &str) -> Project {
        Project {
            id: id.into(),
            title: title.into(),
            description: format!("{} description", title),
            technologies: vec!["Rust".into()],
            ..Default::default()
        }
    }

    fn ids(doc: &PortfolioDocument) -> Vec<&str> {
        doc.projects.iter().map(|p| p.id.as_str()).collect()
    }

    // ========================================================================
    // add / update / remove
    // ========================================================================

    #[test]
    fn test_add_appends_in_order() {
        let mut doc = PortfolioDocument::default();
        doc.add(project("a", "A")).unwrap();
        doc.add(project("b", "B")).unwrap();
        assert_eq!(ids(&doc), vec!["a", "b"]);
    }

    #[test]
    fn test_add_rejects_duplicate_id() {
        let mut doc = PortfolioDocument::default();
        doc.add(project("a", "A")).unwrap();
        let err = doc.add(project("a", "Other")).unwrap_err();
        assert_eq!(
            err,
            MutationError::DuplicateId { collection: Collection::Projects, id: "a".into() }
        );
        assert_eq!(doc.projects.len(), 1);
        assert_eq!(doc.projects[0].title, "A");
    }

    #[test]
    fn test_same_id_allowed_across_collections() {
        let mut doc = PortfolioDocument::default();
        doc.add(project("1", "P")).unwrap();
        doc.add(Service { id: "1".into(), name: "S".into(), ..Default::default() }).unwrap();
        assert_eq!(doc.projects.len(), 1);
        assert_eq!(doc.services.len(), 1);
    }

    #[test]
    fn test_update_merges_only_set_fields() {
        let mut doc = PortfolioDocument::default();
        let original = project("x", "Old");
        doc.add(original.clone()).unwrap();

        let changed = doc.update(
            "x",
            ProjectPatch { title: Some("New".into()), ..Default::default() },
        );

        assert!(changed);
        let updated = &doc.projects[0];
        assert_eq!(updated.title, "New");
        assert_eq!(updated.description, original.description);
        assert_eq!(updated.technologies, original.technologies);
        assert_eq!(updated.image, None);
    }

    #[test]
    fn test_update_missing_id_is_noop() {
        let mut doc = PortfolioDocument::default();
        doc.add(project("x", "X")).unwrap();
        let before = doc.clone();
        assert!(!doc.update("nope", ProjectPatch { title: Some("Y".into()), ..Default::default() }));
        assert_eq!(doc, before);
        assert!(!doc.update("x", ProjectPatch::default()));
    }

    #[test]
    fn test_remove() {
        let mut doc = PortfolioDocument::default();
        doc.add(project("a", "A")).unwrap();
        doc.add(project("b", "B")).unwrap();
        assert!(doc.remove::<Project>("a"));
        assert_eq!(ids(&doc), vec!["b"]);
        assert!(!doc.remove::<Project>("a"));
    }

    // ========================================================================
    // move
    // ========================================================================

    #[test]
    fn test_move_swaps_neighbours() {
        let mut doc = PortfolioDocument::default();
        for id in ["a", "b", "c"] {
            doc.add(project(id, id)).unwrap();
        }
        assert!(doc.move_entry::<Project>("c", Direction::Up));
        assert_eq!(ids(&doc), vec!["a", "c", "b"]);
        assert!(doc.move_entry::<Project>("a", Direction::Down));
        assert_eq!(ids(&doc), vec!["c", "a", "b"]);
    }

    #[test]
    fn test_move_at_boundaries_is_noop() {
        let mut doc = PortfolioDocument::default();
        for id in ["a", "b", "c"] {
            doc.add(project(id, id)).unwrap();
        }
        assert!(!doc.move_entry::<Project>("a", Direction::Up));
        assert!(!doc.move_entry::<Project>("c", Direction::Down));
        assert!(!doc.move_entry::<Project>("zzz", Direction::Up));
        assert_eq!(ids(&doc), vec!["a", "b", "c"]);
    }

    // ========================================================================
    // profile
    // ========================================================================

    #[test]
    fn test_update_profile_shallow_merge() {
        let mut doc = PortfolioDocument::default();
        doc.profile.name = "Name".into();
        doc.profile.role = "Role".into();

        let changed = doc.update_profile(ProfilePatch {
            role: Some("Photographer".into()),
            photo_stats: Some(PhotoStats { years: 3.0, projects: 40.0, clients: 20.0, awards: 2.0 }),
            ..Default::default()
        });

        assert!(changed);
        assert_eq!(doc.profile.name, "Name");
        assert_eq!(doc.profile.role, "Photographer");
        assert_eq!(doc.profile.photo_stats.map(|s| s.awards), Some(2.0));
    }

    #[test]
    fn test_empty_profile_patch_is_noop() {
        let mut doc = PortfolioDocument::default();
        assert!(!doc.update_profile(ProfilePatch::default()));
    }

    #[test]
    fn test_patch_from_partial_json() {
        let patch: SkillPatch = serde_json::from_str(r#"{"level":"Expert"}"#).unwrap();
        assert!(!patch.is_empty());
        assert_eq!(patch.level, Some(SkillLevel::Expert));
        assert!(patch.name.is_none());
        assert!(SkillPatch::default().is_empty());
    }

    // ========================================================================
    // parsing
    // ========================================================================

    #[test]
    fn test_collection_from_str() {
        assert_eq!("projects".parse::<Collection>().unwrap(), Collection::Projects);
        assert_eq!(
            "portfolio-categories".parse::<Collection>().unwrap(),
            Collection::PortfolioCategories
        );
        assert_eq!(
            "portfolioCategories".parse::<Collection>().unwrap(),
            Collection::PortfolioCategories
        );
        assert!("widgets".parse::<Collection>().is_err());
    }

    #[test]
    fn test_direction_from_str() {
        assert_eq!("UP".parse::<Direction>().unwrap(), Direction::Up);
        assert_eq!("down".parse::<Direction>().unwrap(), Direction::Down);
        assert!("left".parse::<Direction>().is_err());
    }

    #[test]
    fn test_new_entity_ids_are_unique() {
        let a = new_entity_id();
        let b = new_entity_id();
        assert_ne!(a, b);
        assert_eq!(a.len(), 36);
    }
}
