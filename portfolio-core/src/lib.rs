//! Portfolio Core - shared document model for the portfolio site
//!
//! Everything the sync engine, the admin CLI and the persistence server agree on:
//!
//! - [`PortfolioDocument`] - the single aggregate holding profile and all entity sequences
//! - [`Entity`] / [`EntityPatch`] - uniform add/update/delete/move over the six collections
//! - [`reconcile`] - last-write-wins selection between local cache and remote store
//! - [`AdminGate`] - the single-admin credential check used by the editor
//!
//! This crate does no I/O. Timers, caches and HTTP live in `portfolio-sync`
//! and `portfolio-server`.

pub mod admin;
pub mod document;
pub mod entities;
pub mod mutation;
pub mod reconcile;
pub mod seed;

pub use admin::{AdminCredentials, AdminGate};
pub use document::{
    next_stamp, now_millis, CustomIcons, PhotoStats, PortfolioDocument, Profile, SeStats,
};
pub use entities::{
    Achievement, AchievementCategory, Experience, PortfolioCategory, Project, ProjectStatus,
    Service, Skill, SkillCategory, SkillLevel,
};
pub use mutation::{
    new_entity_id, AchievementPatch, Collection, Direction, Entity, EntityPatch,
    ExperiencePatch, MutationError, ParseError, PortfolioCategoryPatch, ProfilePatch,
    ProjectPatch, ServicePatch, SkillPatch,
};
pub use reconcile::{reconcile, Reconciliation, ReconcilePolicy, RemoteState, Source};
