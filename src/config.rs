//! Configuration management for aiq.
//!
//! Defaults can be kept in `~/.config/aiq/config.toml`. Command-line flags
//! always take precedence over the file.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Model used when neither a flag nor the config file names one.
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Provider used when neither a flag nor the config file names one.
pub const DEFAULT_PROVIDER: &str = "gemini";

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Default model name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Default provider name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    /// Gemini API settings.
    #[serde(default)]
    pub gemini: GeminiConfig,
}

/// Settings for the Gemini backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiConfig {
    /// API root, without a trailing `/models/...` path.
    #[serde(default = "default_gemini_base_url")]
    pub base_url: String,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            base_url: default_gemini_base_url(),
        }
    }
}

fn default_gemini_base_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

impl Config {
    /// Get the config directory path, if the platform has one.
    pub fn config_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("aiq"))
    }

    /// Get the config file path.
    pub fn config_path() -> Option<PathBuf> {
        Self::config_dir().map(|dir| dir.join("config.toml"))
    }

    /// Load configuration from the default location, using defaults if not found.
    pub fn load() -> Result<Self> {
        Self::load_optional(Self::config_path().as_deref())
    }

    /// Defaults when there is no config location at all.
    fn load_optional(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load_from(path),
            None => {
                debug!("No config directory, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Load configuration from `path`, using defaults if the file does not exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }
}

/// Model and provider as given on the command line, before defaults apply.
#[derive(Debug, Clone, Default)]
pub struct Selection {
    pub model: Option<String>,
    pub provider: Option<String>,
}

impl Selection {
    /// Flag, then config file, then the built-in default.
    pub fn resolve_model(&self, config: &Config) -> String {
        self.model
            .clone()
            .or_else(|| config.model.clone())
            .unwrap_or_else(|| DEFAULT_MODEL.to_string())
    }

    pub fn resolve_provider(&self, config: &Config) -> String {
        self.provider
            .clone()
            .or_else(|| config.provider.clone())
            .unwrap_or_else(|| DEFAULT_PROVIDER.to_string())
    }
}

/// Everything that shapes a single request. Fixed once resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    pub model: String,
    pub provider: String,
    pub system: Option<String>,
    pub shell: bool,
    pub json: bool,
}
