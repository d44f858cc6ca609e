//! Shared config utilities for loading/saving JSON config files
//! and resolving secrets from fields or environment variables.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const APP_IDENTIFIER: &str = "com.spinbox.engine";
pub const ENGINE_CONFIG_FILE: &str = "engine_config.json";

/// Generic load for any Serde config type with a `Default` implementation.
/// Falls back to `T::default()` if the file is missing or unparsable.
pub fn load_json_config<T: DeserializeOwned + Default>(path: &Path, label: &str) -> T {
    match std::fs::read_to_string(path) {
        Ok(content) => match serde_json::from_str::<T>(&content) {
            Ok(config) => {
                tracing::info!("[{}] Loaded config from {}", label, path.display());
                config
            }
            Err(e) => {
                tracing::warn!(
                    "[{}] Failed to parse config {}: {}, using defaults",
                    label,
                    path.display(),
                    e
                );
                T::default()
            }
        },
        Err(_) => {
            tracing::info!(
                "[{}] No config file at {}, using defaults",
                label,
                path.display()
            );
            T::default()
        }
    }
}

/// Like [`load_json_config`] but distinguishes "nothing stored" from a value.
pub fn read_json_file<T: DeserializeOwned>(path: &Path, label: &str) -> Option<T> {
    let content = std::fs::read_to_string(path).ok()?;
    match serde_json::from_str::<T>(&content) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!("[{}] Ignoring unreadable {}: {}", label, path.display(), e);
            None
        }
    }
}

/// Generic save for any Serde config type.
pub fn save_json_config<T: Serialize>(path: &Path, config: &T, label: &str) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| format!("Failed to create config directory: {}", e))?;
    }
    let json = serde_json::to_string_pretty(config)
        .map_err(|e| format!("Failed to serialize config: {}", e))?;
    std::fs::write(path, json).map_err(|e| format!("Failed to write config file: {}", e))?;
    tracing::debug!("[{}] Saved config to {}", label, path.display());
    Ok(())
}

/// Resolve a secret: check the direct field first,
/// then fall back to reading the environment variable named in `env_var`.
pub fn resolve_secret(value: &Option<String>, env_var: &Option<String>) -> Option<String> {
    if let Some(ref key) = value {
        if !key.is_empty() {
            return Some(key.clone());
        }
    }
    if let Some(ref env_var) = env_var {
        if let Ok(key) = std::env::var(env_var) {
            if !key.is_empty() {
                return Some(key);
            }
        }
    }
    None
}

/// Per-user data directory for the local mirror, device id and admin session.
pub fn default_data_dir() -> PathBuf {
    dirs_next::data_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(APP_IDENTIFIER)
}

// ── Engine Config ──────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Realtime database base URL. `None` runs against an in-memory store.
    pub database_url: Option<String>,
    pub database_url_env: Option<String>,
    pub auth_token: Option<String>,
    pub auth_token_env: Option<String>,
    pub timeout_secs: u64,
    pub max_retries: u32,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            database_url: None,
            database_url_env: Some("SPINBOX_DATABASE_URL".to_string()),
            auth_token: None,
            auth_token_env: Some("SPINBOX_DATABASE_TOKEN".to_string()),
            timeout_secs: 10,
            max_retries: 3,
        }
    }
}

impl StoreConfig {
    pub fn resolved_url(&self) -> Option<String> {
        resolve_secret(&self.database_url, &self.database_url_env)
    }

    pub fn resolved_token(&self) -> Option<String> {
        resolve_secret(&self.auth_token, &self.auth_token_env)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Base URL of the player profile endpoint (`{base}?uid=...`).
    pub endpoint: String,
    pub timeout_secs: u64,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:3000/api/freefire".to_string(),
            timeout_secs: 8,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdminConfig {
    pub username: String,
    pub password: Option<String>,
    pub password_env: Option<String>,
    pub session_hours: i64,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            username: "admin".to_string(),
            password: Some("admin123".to_string()),
            password_env: Some("SPINBOX_ADMIN_PASSWORD".to_string()),
            session_hours: 24,
        }
    }
}

impl AdminConfig {
    pub fn resolved_password(&self) -> Option<String> {
        // The env var wins over the shipped default password.
        resolve_secret(&None, &self.password_env).or_else(|| resolve_secret(&self.password, &None))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub store: StoreConfig,
    pub device: crate::device::DeviceConfig,
    pub player: PlayerConfig,
    pub admin: AdminConfig,
    /// Overrides [`default_data_dir`].
    pub data_dir: Option<PathBuf>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            store: StoreConfig::default(),
            device: crate::device::DeviceConfig::default(),
            player: PlayerConfig::default(),
            admin: AdminConfig::default(),
            data_dir: None,
        }
    }
}

impl EngineConfig {
    pub fn load(path: &Path) -> Self {
        load_json_config(path, "EngineConfig")
    }

    pub fn save(&self, path: &Path) -> Result<(), String> {
        save_json_config(path, self, "EngineConfig")
    }

    pub fn data_dir(&self) -> PathBuf {
        self.data_dir.clone().unwrap_or_else(default_data_dir)
    }
}
