//! Built-in starting document
//!
//! Used when neither the local cache nor the remote store has anything to
//! offer. The seed carries no `lastUpdated`, so any stamped copy beats it.

use crate::document::{CustomIcons, PhotoStats, PortfolioDocument, Profile, SeStats};
use crate::entities::{PortfolioCategory, Project, ProjectStatus, Service, Skill, SkillCategory, SkillLevel};

impl PortfolioDocument {
    /// The hardcoded default document
    pub fn seed() -> Self {
        PortfolioDocument {
            profile: Profile {
                name: "Your Name".into(),
                role: "Software Engineer & Photographer".into(),
                welcome_message: "Welcome to my personal page".into(),
                avatar_url: None,
                background_image_url: None,
                years_of_experience: Some(5.0),
                projects_count: Some(100.0),
                clients_count: Some(50.0),
                technologies_count: Some(15.0),
                custom_icons: Some(CustomIcons::default()),
                se_stats: Some(SeStats { years: 5.0, projects: 100.0, clients: 50.0, technologies: 15.0 }),
                photo_stats: Some(PhotoStats { years: 5.0, projects: 100.0, clients: 50.0, awards: 0.0 }),
            },
            skills: vec![
                Skill {
                    id: "1".into(),
                    name: "React & TypeScript".into(),
                    level: SkillLevel::Expert,
                    years_of_experience: 5.0,
                    category: SkillCategory::Frontend,
                    icon_url: None,
                },
                Skill {
                    id: "2".into(),
                    name: "Node.js & Express".into(),
                    level: SkillLevel::Advanced,
                    years_of_experience: 4.0,
                    category: SkillCategory::Backend,
                    icon_url: None,
                },
            ],
            projects: vec![
                Project {
                    id: "1".into(),
                    title: "E-Commerce Platform".into(),
                    description: "Full-stack storefront with payments and an admin dashboard".into(),
                    image: None,
                    technologies: vec!["React".into(), "Node.js".into(), "MongoDB".into(), "AWS".into()],
                    link: None,
                    status: Some(ProjectStatus::Live),
                },
                Project {
                    id: "2".into(),
                    title: "Real-time Chat Application".into(),
                    description: "Messaging app with live presence and typing indicators".into(),
                    image: None,
                    technologies: vec!["Socket.io".into(), "Redis".into(), "Express".into(), "React".into()],
                    link: None,
                    status: Some(ProjectStatus::Live),
                },
            ],
            experiences: Vec::new(),
            achievements: Vec::new(),
            services: vec![
                Service {
                    id: "1".into(),
                    name: "Portrait Photography".into(),
                    description: "Professional portraits in studio or on location".into(),
                    icon: "Users".into(),
                    color: "from-pink-500 to-rose-500".into(),
                },
                Service {
                    id: "2".into(),
                    name: "Landscape Photography".into(),
                    description: "Natural scenery and travel photography".into(),
                    icon: "Eye".into(),
                    color: "from-green-500 to-emerald-500".into(),
                },
            ],
            portfolio_categories: vec![
                PortfolioCategory {
                    id: "1".into(),
                    category: "Portrait".into(),
                    gradient: "from-pink-500 to-rose-600".into(),
                    image: None,
                    images: Vec::new(),
                },
                PortfolioCategory {
                    id: "2".into(),
                    category: "Landscape".into(),
                    gradient: "from-green-500 to-emerald-600".into(),
                    image: None,
                    images: Vec::new(),
                },
            ],
            last_updated: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mutation::{Collection, Entity};
    use std::collections::HashSet;

    #[test]
    fn test_seed_is_unstamped() {
        assert_eq!(PortfolioDocument::seed().last_updated, None);
    }

    #[test]
    fn test_seed_ids_unique_per_collection() {
        let seed = PortfolioDocument::seed();
        fn unique<E: Entity>(doc: &PortfolioDocument) -> bool {
            let ids: HashSet<&str> = E::sequence(doc).iter().map(|e| e.id()).collect();
            ids.len() == E::sequence(doc).len()
        }
        assert!(unique::<Skill>(&seed));
        assert!(unique::<Project>(&seed));
        assert!(unique::<Service>(&seed));
        assert!(unique::<PortfolioCategory>(&seed));
        assert_eq!(Collection::ALL.len(), 6);
    }

    #[test]
    fn test_seed_serializes_with_profile() {
        let value = serde_json::to_value(PortfolioDocument::seed()).unwrap();
        assert_eq!(value["profile"]["role"], "Software Engineer & Photographer");
        assert!(value.get("lastUpdated").is_none());
    }
}
