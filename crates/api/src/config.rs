use std::path::PathBuf;

use kana_genai::GenAiConfig;
use kana_store::blob::DEFAULT_URL_PREFIX;

/// Server configuration loaded from environment variables.
///
/// All fields have defaults suitable for local development.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `300`). Generation calls
    /// are slow, so this is well above a typical API timeout.
    pub request_timeout_secs: u64,
    /// Root directory for blobs. `None` keeps blobs in memory.
    pub storage_root: Option<PathBuf>,
    /// Public URL prefix under which blobs are served.
    pub blob_url_prefix: String,
    /// Remote generation capability.
    pub genai: GenAiConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                    |
    /// |------------------------|----------------------------|
    /// | `HOST`                 | `0.0.0.0`                  |
    /// | `PORT`                 | `3000`                     |
    /// | `CORS_ORIGINS`         | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS` | `300`                      |
    /// | `STORAGE_ROOT`         | unset (in-memory blobs)    |
    /// | `BLOB_URL_PREFIX`      | `/api/v1/blobs`            |
    ///
    /// `GENAI_*` variables are read by [`GenAiConfig::from_env`].
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "300".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let storage_root = std::env::var("STORAGE_ROOT")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from);

        let blob_url_prefix = std::env::var("BLOB_URL_PREFIX")
            .unwrap_or_else(|_| DEFAULT_URL_PREFIX.into())
            .trim_end_matches('/')
            .to_string();

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            storage_root,
            blob_url_prefix,
            genai: GenAiConfig::from_env(),
        }
    }
}
