//! TOML-based configuration for campfire-reports.
//!
//! Supports a config file (campfire-reports.toml) with environment variable
//! expansion in paths.
//!
//! Example configuration:
//! ```toml
//! [server]
//! host = "0.0.0.0"
//! port = 8080
//!
//! [database]
//! path = "${CAMPFIRE_DATA}/reports.db"
//!
//! [media]
//! root = "./media"
//! url = "/media"
//!
//! [logging]
//! filter = "campfire_reports=debug,tower_http=info"
//! ```

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV_VAR: &str = "CAMPFIRE_REPORTS_CONFIG";

/// Error type for settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    pub media: MediaSettings,
    pub logging: LoggingSettings,
}

/// HTTP listener.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

impl ServerSettings {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// SQLite database location.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DatabaseSettings {
    /// Database file (supports ${ENV_VAR} expansion).
    pub path: String,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            path: "campfire-reports.db".to_string(),
        }
    }
}

/// Where generated files are written and the URL prefix they are served under.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MediaSettings {
    pub root: String,
    pub url: String,
}

impl Default for MediaSettings {
    fn default() -> Self {
        Self {
            root: "media".to_string(),
            url: "/media".to_string(),
        }
    }
}

/// Log filter directive. `RUST_LOG` overrides it when set.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub filter: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            filter: "campfire_reports=info,tower_http=info".to_string(),
        }
    }
}

impl Settings {
    /// Load settings from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SettingsError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        let settings: Settings = toml::from_str(&content)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from the default config file locations.
    ///
    /// Searches in order:
    /// 1. Environment variable `CAMPFIRE_REPORTS_CONFIG`
    /// 2. `./campfire-reports.toml`
    /// 3. `~/.config/campfire-reports/config.toml`
    pub fn load() -> Result<Self, SettingsError> {
        if let Ok(path) = env::var(CONFIG_ENV_VAR) {
            return Self::from_file(&path);
        }

        let local_config = PathBuf::from("campfire-reports.toml");
        if local_config.exists() {
            return Self::from_file(&local_config);
        }

        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("campfire-reports").join("config.toml");
            if user_config.exists() {
                return Self::from_file(&user_config);
            }
        }

        Ok(Settings::default())
    }

    fn validate(&self) -> Result<(), SettingsError> {
        if self.database.path.trim().is_empty() {
            return Err(SettingsError::InvalidConfig(
                "database.path must not be empty".to_string(),
            ));
        }
        if !self.media.url.starts_with('/') && !self.media.url.contains("://") {
            return Err(SettingsError::InvalidConfig(format!(
                "media.url must be absolute, got '{}'",
                self.media.url
            )));
        }
        Ok(())
    }

    /// Database path with environment variables expanded.
    pub fn database_path(&self) -> Result<PathBuf, SettingsError> {
        expand_env_vars(&self.database.path).map(PathBuf::from)
    }

    /// Media root with environment variables expanded.
    pub fn media_root(&self) -> Result<PathBuf, SettingsError> {
        expand_env_vars(&self.media.root).map(PathBuf::from)
    }
}

static ENV_VAR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\$\{([^}]*)\}|\$([A-Za-z0-9_]+)").expect("valid regex")
});

/// Expand environment variables in a string.
///
/// Supports `${VAR}` and `$VAR` syntax. A lone `$` is kept as-is.
pub fn expand_env_vars(s: &str) -> Result<String, SettingsError> {
    let mut missing = None;
    let expanded = ENV_VAR.replace_all(s, |caps: &Captures<'_>| {
        let name = caps
            .get(1)
            .or_else(|| caps.get(2))
            .map_or("", |m| m.as_str());
        match env::var(name) {
            Ok(value) => value,
            Err(_) => {
                missing.get_or_insert_with(|| name.to_string());
                String::new()
            }
        }
    });

    match missing {
        Some(name) => Err(SettingsError::MissingEnvVar(name)),
        None => Ok(expanded.into_owned()),
    }
}
