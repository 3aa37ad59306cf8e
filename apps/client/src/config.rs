use std::time::Duration;

use anyhow::{Context, Result};

use crate::editor::EditorSettings;

/// Client configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub autosave_quiet_ms: u64,
    pub status_clear_ms: u64,
    pub http_timeout_secs: u64,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            supabase_url: require_env("SUPABASE_URL")?
                .trim_end_matches('/')
                .to_string(),
            supabase_anon_key: require_env("SUPABASE_ANON_KEY")?,
            autosave_quiet_ms: optional_env("AUTOSAVE_QUIET_MS", 2000)?,
            status_clear_ms: optional_env("STATUS_CLEAR_MS", 2000)?,
            http_timeout_secs: optional_env("HTTP_TIMEOUT_SECS", 30)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }

    pub fn editor_settings(&self) -> EditorSettings {
        EditorSettings {
            quiet_window: Duration::from_millis(self.autosave_quiet_ms),
            status_window: Duration::from_millis(self.status_clear_ms),
        }
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn optional_env(key: &str, default: u64) -> Result<u64> {
    match std::env::var(key) {
        Ok(raw) => raw
            .parse::<u64>()
            .with_context(|| format!("{key} must be a whole number, got '{raw}'")),
        Err(_) => Ok(default),
    }
}
