use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::AppError;

pub const ENV_CONFIG: &str = "FAMCONTRACTS_CONFIG";
pub const ENV_API_URL: &str = "FAMCONTRACTS_API_URL";
pub const DEFAULT_API_URL: &str = "http://localhost:8080/api";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageKind {
    /// OS keyring (secret service / Windows credential manager)
    #[default]
    Keyring,
    /// YAML file in the user data directory
    File,
    /// Process memory only; nothing survives exit
    Memory,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default = "default_server_url")]
    pub server_url: String,
    #[serde(default)]
    pub storage: StorageKind,
    /// Overrides the file used by `storage: file`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_path: Option<PathBuf>,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_true")]
    pub desktop_notices: bool,
}

fn default_server_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_true() -> bool {
    true
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: default_server_url(),
            storage: StorageKind::default(),
            storage_path: None,
            timeout_secs: default_timeout(),
            desktop_notices: true,
        }
    }
}

impl ClientConfig {
    /// Resolves the config path, loads it (defaults when absent) and applies
    /// the `FAMCONTRACTS_API_URL` override.
    pub fn find_and_load(cli_value: Option<PathBuf>) -> Result<(PathBuf, ClientConfig), AppError> {
        let path = resolve_config_path(cli_value)?;
        let cfg = load_config(&path)?.with_server_override(std::env::var(ENV_API_URL).ok())?;
        Ok((path, cfg))
    }

    pub fn with_server_override(mut self, server_url: Option<String>) -> Result<Self, AppError> {
        if let Some(url) = server_url.filter(|u| !u.trim().is_empty()) {
            self.server_url = url;
        }
        self.server_url = validate_server_url(&self.server_url)?;
        Ok(self)
    }
}

pub fn resolve_config_path(cli_value: Option<PathBuf>) -> Result<PathBuf, AppError> {
    if let Some(p) = cli_value {
        return Ok(p);
    }
    if let Ok(p) = std::env::var(ENV_CONFIG) {
        return Ok(PathBuf::from(p));
    }
    default_config_path().ok_or_else(|| AppError::Config("could not determine config dir".into()))
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("dev", "famcontracts", "famcontracts")
}

pub fn default_config_path() -> Option<PathBuf> {
    Some(project_dirs()?.config_dir().join("client.yaml"))
}

pub fn default_storage_path() -> Option<PathBuf> {
    Some(project_dirs()?.data_dir().join("storage.yaml"))
}

/// A missing file yields the default config.
pub fn load_config(path: &Path) -> Result<ClientConfig, AppError> {
    let data = match std::fs::read_to_string(path) {
        Ok(d) => d,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(path=%path.display(), "config file not found; using defaults");
            return Ok(ClientConfig::default());
        }
        Err(e) => {
            return Err(AppError::Config(format!(
                "read {} failed: {e}",
                path.display()
            )));
        }
    };
    let cfg: ClientConfig = serde_yaml::from_str(&data)
        .map_err(|e| AppError::Config(format!("parse {} failed: {e}", path.display())))?;
    Ok(cfg)
}

pub fn save_config(path: &Path, cfg: &ClientConfig) -> Result<(), AppError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let data = serde_yaml::to_string(cfg)
        .map_err(|e| AppError::Config(format!("serialize config failed: {e}")))?;
    std::fs::write(path, data)
        .map_err(|e| AppError::Config(format!("write {} failed: {e}", path.display())))
}

pub fn normalize_server_url(input: &str) -> String {
    let trimmed = input.trim();
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.trim_end_matches('/').to_string()
    } else {
        format!("http://{}", trimmed.trim_end_matches('/'))
    }
}

pub fn validate_server_url(input: &str) -> Result<String, AppError> {
    let normalized = normalize_server_url(input);
    let parsed = url::Url::parse(&normalized)
        .map_err(|e| AppError::Config(format!("invalid server_url {normalized}: {e}")))?;
    if parsed.host_str().is_none() {
        return Err(AppError::Config(format!(
            "server_url {normalized} has no host"
        )));
    }
    Ok(normalized)
}
