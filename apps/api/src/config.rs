use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub remote_store_url: String,
    pub remote_store_key: String,
    pub local_store_dir: String,
    pub export_dir: String,
    /// When set, suggestions are proxied to this endpoint instead of the
    /// built-in canned provider.
    pub suggestions_url: Option<String>,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            remote_store_url: require_env("REMOTE_STORE_URL")?,
            remote_store_key: require_env("REMOTE_STORE_KEY")?,
            local_store_dir: require_env("LOCAL_STORE_DIR")?,
            export_dir: std::env::var("EXPORT_DIR").unwrap_or_else(|_| "./exports".to_string()),
            suggestions_url: std::env::var("SUGGESTIONS_URL").ok(),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}
