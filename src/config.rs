/// Application configuration
///
/// The API base URL and the static-asset base URL are fixed per deployment.
/// Values are resolved in order:
/// 1. Built-in defaults (a local development server)
/// 2. Optional JSON file in the user's config directory:
///    - Linux: ~/.config/people-desk/config.json
///    - macOS: ~/Library/Application Support/people-desk/config.json
///    - Windows: %APPDATA%\people-desk\config.json
/// 3. Environment variables (`PEOPLE_DESK_API_URL`, `PEOPLE_DESK_STORAGE_URL`,
///    `PEOPLE_DESK_TIMEOUT_SECS`)

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_API_URL: &str = "http://localhost:8000/api";
const DEFAULT_STORAGE_URL: &str = "http://localhost:8000/";
const DEFAULT_TIMEOUT_SECS: u64 = 15;

/// Collection path on the API server
const RECORDS_PATH: &str = "personal-information";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Base URL of the REST API (e.g. "http://localhost:8000/api")
    pub api_url: String,
    /// Base URL that serves uploaded photos under `storage/`
    pub storage_url: String,
    /// Per-request timeout in seconds
    pub request_timeout_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            storage_url: DEFAULT_STORAGE_URL.to_string(),
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl AppConfig {
    /// Resolve the configuration for this process (file, then environment)
    pub fn load() -> Self {
        let config = match Self::config_path() {
            Some(path) if path.exists() => Self::from_file(&path),
            _ => Self::default(),
        };
        config.with_overrides(|key| std::env::var(key).ok())
    }

    /// Where the optional config file lives
    pub fn config_path() -> Option<PathBuf> {
        let mut path = dirs::config_dir()?;
        path.push("people-desk");
        path.push("config.json");
        Some(path)
    }

    fn from_file(path: &PathBuf) -> Self {
        let parsed = std::fs::read_to_string(path)
            .map_err(|e| e.to_string())
            .and_then(|raw| serde_json::from_str::<AppConfig>(&raw).map_err(|e| e.to_string()));

        match parsed {
            Ok(config) => {
                tracing::info!(path = %path.display(), "loaded configuration file");
                config
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "ignoring unreadable configuration file");
                Self::default()
            }
        }
    }

    /// Apply point-of-deployment overrides from a key lookup (normally the environment)
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(url) = lookup("PEOPLE_DESK_API_URL").filter(|v| !v.trim().is_empty()) {
            self.api_url = url;
        }
        if let Some(url) = lookup("PEOPLE_DESK_STORAGE_URL").filter(|v| !v.trim().is_empty()) {
            self.storage_url = url;
        }
        if let Some(raw) = lookup("PEOPLE_DESK_TIMEOUT_SECS") {
            match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => self.request_timeout_secs = secs,
                _ => tracing::warn!(value = %raw, "ignoring invalid PEOPLE_DESK_TIMEOUT_SECS"),
            }
        }
        self
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    /// `GET`/`POST` target for the whole collection
    pub fn records_url(&self) -> String {
        format!("{}/{}", self.api_url.trim_end_matches('/'), RECORDS_PATH)
    }

    /// Target for one record (update override and delete)
    pub fn record_url(&self, id: i64) -> String {
        format!("{}/{}", self.records_url(), id)
    }

    /// Resolve a stored image reference into a displayable URL.
    /// The server returns paths relative to its public storage folder.
    pub fn photo_url(&self, image: &str) -> String {
        if image.starts_with("http://") || image.starts_with("https://") {
            return image.to_string();
        }
        format!(
            "{}/storage/{}",
            self.storage_url.trim_end_matches('/'),
            image.trim_start_matches('/')
        )
    }
}
