//! folio - admin editor for the portfolio document
//!
//! Each invocation opens the local cache, reconciles with the persistence
//! API, applies one command and flushes the pending save before exiting.

use anyhow::{anyhow, bail, Context};
use clap::{Parser, Subcommand, ValueEnum};
use portfolio_core::{
    new_entity_id, Achievement, AchievementPatch, AdminCredentials, AdminGate, Collection,
    Direction, Entity, EntityPatch, Experience, ExperiencePatch, PortfolioCategory,
    PortfolioCategoryPatch, ProfilePatch, Project, ProjectPatch, ReconcilePolicy, Service,
    ServicePatch, Skill, SkillPatch,
};
use portfolio_sync::{
    prepare_image, FileCache, HttpRemoteStore, PortfolioStore, PrepareOptions, RemoteConfig,
    SyncConfig, UploadClient, DEFAULT_CACHE_KEY,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "folio")]
#[command(about = "Edit the portfolio document with local caching and background sync")]
struct Cli {
    /// Base URL of the persistence API
    #[arg(long, env = "FOLIO_API_URL", default_value = "http://localhost:5000")]
    api_url: String,

    /// Directory holding the offline cache
    #[arg(long, env = "FOLIO_CACHE_DIR")]
    cache_dir: Option<PathBuf>,

    /// Username the editor accepts
    #[arg(long, env = "FOLIO_ADMIN_USER")]
    admin_user: Option<String>,

    /// Password the editor accepts
    #[arg(long, env = "FOLIO_ADMIN_PASSWORD", hide_env_values = true)]
    admin_password: Option<String>,

    /// Username supplied for this invocation
    #[arg(long, short = 'u', env = "FOLIO_USER")]
    user: Option<String>,

    /// Password supplied for this invocation
    #[arg(long, short = 'p', env = "FOLIO_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Quiet period before edits are sent to the server
    #[arg(long, env = "FOLIO_DEBOUNCE_MS", default_value = "1000")]
    debounce_ms: u64,

    /// Push a newer local copy back to the server at startup
    #[arg(long, env = "FOLIO_PUSH_NEWER_LOCAL")]
    push_newer_local: bool,

    /// HTTP timeout in seconds
    #[arg(long, env = "FOLIO_TIMEOUT_SECS", default_value = "30")]
    timeout_secs: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the reconciled document
    Show {
        /// Print raw JSON
        #[arg(long)]
        json: bool,
    },

    /// Merge fields into the profile, e.g. '{"role":"Photographer"}'
    Profile {
        #[arg(long)]
        json: String,
    },

    /// Append a record; an id is generated when none is given
    Add {
        collection: Collection,
        #[arg(long)]
        json: String,
    },

    /// Merge fields into the record with the given id
    Update {
        collection: Collection,
        id: String,
        #[arg(long)]
        json: String,
    },

    /// Remove the record with the given id
    Delete { collection: Collection, id: String },

    /// Swap a record with its neighbour
    Move {
        collection: Collection,
        id: String,
        direction: Direction,
    },

    /// Upload an image and print its public URL
    Upload {
        path: PathBuf,

        /// Send the file as-is instead of downscaling to JPEG first
        #[arg(long)]
        raw: bool,

        /// Store the URL on the profile
        #[arg(long, value_enum)]
        set: Option<ProfileImage>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ProfileImage {
    Avatar,
    Background,
}

impl Command {
    fn mutates(&self) -> bool {
        !matches!(self, Command::Show { .. })
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    let log_level = cli.log_level.clone();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("portfolio_sync={},folio={},warn", log_level, log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if cli.command.mutates() {
        let credentials = match (&cli.admin_user, &cli.admin_password) {
            (Some(username), Some(password)) => Some(AdminCredentials {
                username: username.clone(),
                password: password.clone(),
            }),
            _ => None,
        };
        let mut gate = AdminGate::new(credentials);
        if !gate.is_configured() {
            bail!("Editing is disabled: set FOLIO_ADMIN_USER and FOLIO_ADMIN_PASSWORD");
        }
        let user = cli.user.as_deref().unwrap_or_default();
        let password = cli.password.as_deref().unwrap_or_default();
        if !gate.login(user, password) {
            bail!("Invalid admin credentials");
        }
    }

    let cli_timeout = cli.timeout_secs;
    let remote_config = RemoteConfig {
        base_url: cli.api_url.clone(),
        timeout_secs: cli.timeout_secs,
    };
    let cache_dir = match &cli.cache_dir {
        Some(dir) => dir.clone(),
        None => dirs::data_local_dir()
            .ok_or_else(|| anyhow!("No local data directory; pass --cache-dir"))?
            .join("portfolio"),
    };

    let remote = Arc::new(HttpRemoteStore::new(remote_config.clone())?);
    let cache = Arc::new(FileCache::new(&cache_dir, DEFAULT_CACHE_KEY));
    let store = PortfolioStore::open(
        remote,
        cache,
        SyncConfig {
            debounce: Duration::from_millis(cli.debounce_ms),
            policy: ReconcilePolicy { push_newer_local: cli.push_newer_local },
        },
    )?;

    let report = store.load().await?;
    info!(source = %report.source, pushed = report.pushed, cache = %cache_dir.display(), "Loaded portfolio");
    if !store.saves_enabled() {
        warn!("Edits will only be kept in the local cache until the remote document is repaired");
    }

    match cli.command {
        Command::Show { json } => {
            let doc = store.snapshot();
            if json {
                println!("{}", serde_json::to_string_pretty(&*doc)?);
            } else {
                print_summary(&doc, &report.source.to_string());
            }
        }
        Command::Profile { json } => {
            let patch: ProfilePatch = serde_json::from_str(&json).context("Invalid profile JSON")?;
            report_change(store.update_profile(patch), "profile");
        }
        Command::Add { collection, json } => {
            let id = match collection {
                Collection::Skills => add_record::<Skill>(&store, &json)?,
                Collection::Projects => add_record::<Project>(&store, &json)?,
                Collection::Experiences => add_record::<Experience>(&store, &json)?,
                Collection::Achievements => add_record::<Achievement>(&store, &json)?,
                Collection::Services => add_record::<Service>(&store, &json)?,
                Collection::PortfolioCategories => add_record::<PortfolioCategory>(&store, &json)?,
            };
            println!("Added {} {}", collection, id);
        }
        Command::Update { collection, id, json } => {
            let changed = match collection {
                Collection::Skills => update_record::<SkillPatch>(&store, &id, &json)?,
                Collection::Projects => update_record::<ProjectPatch>(&store, &id, &json)?,
                Collection::Experiences => update_record::<ExperiencePatch>(&store, &id, &json)?,
                Collection::Achievements => update_record::<AchievementPatch>(&store, &id, &json)?,
                Collection::Services => update_record::<ServicePatch>(&store, &id, &json)?,
                Collection::PortfolioCategories => {
                    update_record::<PortfolioCategoryPatch>(&store, &id, &json)?
                }
            };
            report_change(changed, &format!("{} {}", collection, id));
        }
        Command::Delete { collection, id } => {
            let changed = match collection {
                Collection::Skills => store.delete::<Skill>(&id),
                Collection::Projects => store.delete::<Project>(&id),
                Collection::Experiences => store.delete::<Experience>(&id),
                Collection::Achievements => store.delete::<Achievement>(&id),
                Collection::Services => store.delete::<Service>(&id),
                Collection::PortfolioCategories => store.delete::<PortfolioCategory>(&id),
            };
            report_change(changed, &format!("{} {}", collection, id));
        }
        Command::Move { collection, id, direction } => {
            let changed = match collection {
                Collection::Skills => store.move_entry::<Skill>(&id, direction),
                Collection::Projects => store.move_entry::<Project>(&id, direction),
                Collection::Experiences => store.move_entry::<Experience>(&id, direction),
                Collection::Achievements => store.move_entry::<Achievement>(&id, direction),
                Collection::Services => store.move_entry::<Service>(&id, direction),
                Collection::PortfolioCategories => {
                    store.move_entry::<PortfolioCategory>(&id, direction)
                }
            };
            report_change(changed, &format!("{} {}", collection, id));
        }
        Command::Upload { path, raw, set } => {
            let uploader = UploadClient::new(&remote_config)?;
            let url = if raw {
                uploader.upload_file(&path).await?
            } else {
                let bytes = tokio::fs::read(&path)
                    .await
                    .with_context(|| format!("Reading {}", path.display()))?;
                let prepared = prepare_image(&bytes, &PrepareOptions::default())?;
                let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("upload");
                uploader.upload(prepared, &format!("{}.jpg", stem)).await?
            };
            println!("{}", url);

            if let Some(target) = set {
                let patch = match target {
                    ProfileImage::Avatar => ProfilePatch { avatar_url: Some(url), ..Default::default() },
                    ProfileImage::Background => {
                        ProfilePatch { background_image_url: Some(url), ..Default::default() }
                    }
                };
                report_change(store.update_profile(patch), "profile");
            }
        }
    }

    match store.flush().await {
        Ok(true) => info!("Changes saved to server"),
        Ok(false) => {}
        Err(e) => warn!(error = %e, "Changes kept locally; server sync will be retried on the next edit"),
    }
    // Startup pushes run in the background; let them land before exiting
    let settle = Duration::from_secs(cli_timeout);
    if tokio::time::timeout(settle, store.wait_idle()).await.is_err() {
        warn!("Gave up waiting for a background save");
    }
    store.shutdown();
    Ok(())
}

fn add_record<E: Entity>(store: &PortfolioStore, json: &str) -> anyhow::Result<String> {
    let mut value: Value = serde_json::from_str(json).context("Invalid record JSON")?;
    let object = value
        .as_object_mut()
        .ok_or_else(|| anyhow!("Record JSON must be an object"))?;
    let has_id = object.get("id").and_then(Value::as_str).is_some_and(|id| !id.is_empty());
    if !has_id {
        object.insert("id".to_string(), Value::String(new_entity_id()));
    }

    let record: E = serde_json::from_value(value)
        .with_context(|| format!("Invalid {} record", E::COLLECTION))?;
    let id = record.id().to_string();
    store.add(record)?;
    Ok(id)
}

fn update_record<P: EntityPatch + DeserializeOwned>(
    store: &PortfolioStore,
    id: &str,
    json: &str,
) -> anyhow::Result<bool> {
    let patch: P = serde_json::from_str(json).context("Invalid patch JSON")?;
    if patch.is_empty() {
        bail!("Patch sets no fields");
    }
    Ok(store.update(id, patch))
}

fn report_change(changed: bool, what: &str) {
    if changed {
        println!("Updated {}", what);
    } else {
        println!("No change to {}", what);
    }
}

fn print_summary(doc: &portfolio_core::PortfolioDocument, source: &str) {
    println!("{} - {}", doc.profile.name, doc.profile.role);
    println!("  {}", doc.profile.welcome_message);
    match doc.last_updated {
        Some(ts) => println!("  last updated {} ({})", ts, source),
        None => println!("  never edited ({})", source),
    }
    for collection in Collection::ALL {
        let rows: Vec<(String, String)> = match collection {
            Collection::Skills => doc.skills.iter().map(|s| (s.id.clone(), s.name.clone())).collect(),
            Collection::Projects => doc.projects.iter().map(|p| (p.id.clone(), p.title.clone())).collect(),
            Collection::Experiences => doc
                .experiences
                .iter()
                .map(|e| (e.id.clone(), format!("{} at {}", e.role, e.company)))
                .collect(),
            Collection::Achievements => {
                doc.achievements.iter().map(|a| (a.id.clone(), a.title.clone())).collect()
            }
            Collection::Services => doc.services.iter().map(|s| (s.id.clone(), s.name.clone())).collect(),
            Collection::PortfolioCategories => doc
                .portfolio_categories
                .iter()
                .map(|c| (c.id.clone(), c.category.clone()))
                .collect(),
        };
        println!("{} ({})", collection, rows.len());
        for (id, label) in rows {
            println!("  [{}] {}", id, label);
        }
    }
}
