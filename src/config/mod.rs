//! Configuration management
//!
//! Settings live in `~/.nanobanana/config.yaml`. The `NANOBANANA_CONFIG`
//! environment variable points at a different file. Every key is optional;
//! unset keys fall back to the generator defaults.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Keys accepted by [`Config::get`] and [`Config::set`].
pub const CONFIG_KEYS: &[&str] = &[
    "api_key",
    "text_model",
    "image_model",
    "api_base_url",
    "aspect_ratio",
    "fallback_delay_ms",
    "request_timeout_secs",
];

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Gemini API key
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Model for titles and body lines
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_model: Option<String>,

    /// Model for illustrations
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_model: Option<String>,

    /// API host, for proxies and tests
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_base_url: Option<String>,

    /// Illustration aspect ratio, e.g. "4:5"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aspect_ratio: Option<String>,

    /// Simulated latency of offline generation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback_delay_ms: Option<u64>,

    /// Per-request timeout for the generative service
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_timeout_secs: Option<u64>,
}

impl Config {
    /// Loads the config from the default location.
    ///
    /// A missing file yields the default configuration.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        serde_saphyr::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    /// Saves the config to the default location.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        let content = serde_saphyr::to_string(self).context("Failed to serialize config")?;
        fs::write(path, content)
            .with_context(|| format!("Failed to write config file {}", path.display()))?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        if let Ok(path) = std::env::var("NANOBANANA_CONFIG") {
            return Ok(PathBuf::from(path));
        }

        let config_dir = dirs::home_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find home directory"))?
            .join(".nanobanana");

        Ok(config_dir.join("config.yaml"))
    }

    /// Returns the value of a key as a string, or `None` if unset.
    pub fn get(&self, key: &str) -> Result<Option<String>> {
        let value = match key {
            "api_key" => self.api_key.clone(),
            "text_model" => self.text_model.clone(),
            "image_model" => self.image_model.clone(),
            "api_base_url" => self.api_base_url.clone(),
            "aspect_ratio" => self.aspect_ratio.clone(),
            "fallback_delay_ms" => self.fallback_delay_ms.map(|v| v.to_string()),
            "request_timeout_secs" => self.request_timeout_secs.map(|v| v.to_string()),
            other => bail!(
                "Unknown config key '{other}'. Expected one of: {}",
                CONFIG_KEYS.join(", ")
            ),
        };
        Ok(value)
    }

    /// Sets a key from its string form. An empty value unsets the key.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let text = (!value.is_empty()).then(|| value.to_string());
        match key {
            "api_key" => self.api_key = text,
            "text_model" => self.text_model = text,
            "image_model" => self.image_model = text,
            "api_base_url" => self.api_base_url = text,
            "aspect_ratio" => self.aspect_ratio = text,
            "fallback_delay_ms" => self.fallback_delay_ms = parse_number(key, value)?,
            "request_timeout_secs" => self.request_timeout_secs = parse_number(key, value)?,
            other => bail!(
                "Unknown config key '{other}'. Expected one of: {}",
                CONFIG_KEYS.join(", ")
            ),
        }
        Ok(())
    }
}

fn parse_number(key: &str, value: &str) -> Result<Option<u64>> {
    if value.is_empty() {
        return Ok(None);
    }
    value
        .parse()
        .map(Some)
        .with_context(|| format!("'{key}' must be a whole number, got '{value}'"))
}

/// Masks all but the last four characters of a secret for display.
pub fn mask_secret(secret: &str) -> String {
    let count = secret.chars().count();
    if count <= 4 {
        return "*".repeat(count);
    }
    let tail: String = secret.chars().skip(count - 4).collect();
    format!("{}{tail}", "*".repeat(count - 4))
}
