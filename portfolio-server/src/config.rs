//! Configuration for the portfolio server
//!
//! CLI arguments and environment variable handling using clap.

use clap::Parser;
use std::net::SocketAddr;

use crate::types::ServerError;

/// Persistence API and upload relay for the portfolio site
#[derive(Parser, Debug, Clone)]
#[command(name = "portfolio-server")]
#[command(about = "Persistence API and image upload relay for the portfolio site")]
pub struct Args {
    /// Address to listen on
    #[arg(long, env = "LISTEN", default_value = "0.0.0.0:5000")]
    pub listen: SocketAddr,

    /// MongoDB connection URI. Without it the data routes answer `null`.
    #[arg(long, env = "MONGODB_URI")]
    pub mongodb_uri: Option<String>,

    /// MongoDB database name
    #[arg(long, env = "MONGODB_DB", default_value = "portfolio")]
    pub mongodb_db: String,

    /// Collection holding the single portfolio document
    #[arg(long, env = "MONGODB_COLLECTION", default_value = "profiles")]
    pub mongodb_collection: String,

    /// Media host account name
    #[arg(long, env = "CLOUDINARY_CLOUD_NAME")]
    pub cloud_name: Option<String>,

    /// Media host API key
    #[arg(long, env = "CLOUDINARY_API_KEY")]
    pub cloud_api_key: Option<String>,

    /// Media host API secret
    #[arg(long, env = "CLOUDINARY_API_SECRET", hide_env_values = true)]
    pub cloud_api_secret: Option<String>,

    /// Media host API base URL
    #[arg(long, env = "MEDIA_API_BASE", default_value = "https://api.cloudinary.com/v1_1")]
    pub media_api_base: String,

    /// Folder uploaded images are placed in
    #[arg(long, env = "UPLOAD_FOLDER", default_value = "profile_uploads")]
    pub upload_folder: String,

    /// Largest accepted request body, in bytes
    #[arg(long, env = "MAX_BODY_BYTES", default_value = "52428800")]
    pub max_body_bytes: usize,

    /// Largest accepted decoded image, in bytes
    #[arg(long, env = "MAX_UPLOAD_BYTES", default_value = "10485760")]
    pub max_upload_bytes: usize,

    /// Timeout for media host requests, in milliseconds
    #[arg(long, env = "REQUEST_TIMEOUT_MS", default_value = "30000")]
    pub request_timeout_ms: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Emit logs as JSON lines
    #[arg(long, env = "LOG_JSON")]
    pub log_json: bool,
}

/// Credentials for signed media host uploads
#[derive(Clone)]
pub struct MediaCredentials {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: String,
}

impl std::fmt::Debug for MediaCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaCredentials")
            .field("cloud_name", &self.cloud_name)
            .field("api_key", &self.api_key)
            .field("api_secret", &"<redacted>")
            .finish()
    }
}

impl Args {
    /// Media host credentials, if all three are set
    pub fn media_credentials(&self) -> Option<MediaCredentials> {
        match (&self.cloud_name, &self.cloud_api_key, &self.cloud_api_secret) {
            (Some(name), Some(key), Some(secret)) => Some(MediaCredentials {
                cloud_name: name.clone(),
                api_key: key.clone(),
                api_secret: secret.clone(),
            }),
            _ => None,
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ServerError> {
        let media_set = [&self.cloud_name, &self.cloud_api_key, &self.cloud_api_secret]
            .iter()
            .filter(|v| v.as_deref().is_some_and(|s| !s.is_empty()))
            .count();
        if media_set != 0 && media_set != 3 {
            return Err(ServerError::Config(
                "CLOUDINARY_CLOUD_NAME, CLOUDINARY_API_KEY and CLOUDINARY_API_SECRET must be set together"
                    .to_string(),
            ));
        }

        if self.max_upload_bytes == 0 || self.max_body_bytes == 0 {
            return Err(ServerError::Config(
                "MAX_BODY_BYTES and MAX_UPLOAD_BYTES must be positive".to_string(),
            ));
        }

        if let Some(uri) = &self.mongodb_uri {
            if !uri.starts_with("mongodb://") && !uri.starts_with("mongodb+srv://") {
                return Err(ServerError::Config(format!(
                    "MONGODB_URI must be a mongodb:// URI, got '{}'",
                    uri
                )));
            }
        }

        Ok(())
    }
}
