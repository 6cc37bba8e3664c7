//! Portfolio server binary

use clap::Parser;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use portfolio_server::{config::Args, db::MongoClient, server};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    let args = Args::parse();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("portfolio_server={},info", args.log_level).into());
    let registry = tracing_subscriber::registry().with(filter);
    if args.log_json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    if let Err(e) = args.validate() {
        error!("{}", e);
        std::process::exit(1);
    }

    info!("======================================");
    info!("  Portfolio Server");
    info!("======================================");
    info!("Listen: {}", args.listen);
    info!(
        "MongoDB: {}",
        if args.mongodb_uri.is_some() { "configured" } else { "not configured" }
    );
    info!("Database: {}.{}", args.mongodb_db, args.mongodb_collection);
    info!(
        "Uploads: {}",
        if args.media_credentials().is_some() { "configured" } else { "not configured" }
    );
    info!("======================================");

    // Persistence is optional: without it the data routes answer null
    let mongo = match &args.mongodb_uri {
        Some(uri) => match MongoClient::new(uri, &args.mongodb_db).await {
            Ok(client) => {
                info!("MongoDB connected successfully");
                Some(client)
            }
            Err(e) => {
                warn!("MongoDB connection failed (continuing without persistence): {}", e);
                None
            }
        },
        None => {
            warn!("MONGODB_URI not set, persistence disabled");
            None
        }
    };

    let state = Arc::new(server::AppState::with_services(args, mongo));
    server::run(state).await?;

    Ok(())
}
