//! Configuration module for campfire-reports.
//!
//! Handles the TOML settings file and environment variable expansion.

mod settings;

pub use settings::{
    expand_env_vars, DatabaseSettings, LoggingSettings, MediaSettings, ServerSettings, Settings,
    SettingsError, CONFIG_ENV_VAR,
};
