use anyhow::{anyhow, bail, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::providers::{analysis, gemini};

pub const DEFAULT_WEATHER_URL: &str = "https://api.weatherapi.com";
pub const DEFAULT_GEMINI_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_MAX_REPLY_LENGTH: usize = 300;

/// Keys accepted by [`Config::set`], in display order.
pub const KEYS: [&str; 8] = [
    "weather_api_key",
    "gemini_api_key",
    "gemini_model",
    "weather_base_url",
    "gemini_base_url",
    "analysis_base_url",
    "max_reply_length",
    "catalog_latency_ms",
];

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub weather_api_key: Option<String>,
    #[serde(default)]
    pub gemini_api_key: Option<String>,
    #[serde(default)]
    pub gemini_model: Option<String>,
    #[serde(default)]
    pub weather_base_url: Option<String>,
    #[serde(default)]
    pub gemini_base_url: Option<String>,
    #[serde(default)]
    pub analysis_base_url: Option<String>,
    #[serde(default)]
    pub max_reply_length: Option<usize>,
    #[serde(default)]
    pub catalog_latency_ms: Option<u64>,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from the default location, then apply environment overrides.
    pub fn load() -> Result<Self> {
        Self::load_with_env(&Self::get_config_path()?, |name| std::env::var(name).ok())
    }

    /// A malformed file is an error, never a silent fall back to defaults.
    pub fn load_with_env<F>(path: &Path, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self::load_from(path)?.with_env_overrides(lookup))
    }

    /// Missing file means defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::new());
        }

        let config_content = fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&config_content)
            .map_err(|e| anyhow!("Invalid config file {}: {}", path.display(), e))?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::get_config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let config_content = serde_json::to_string_pretty(self)?;
        fs::write(path, config_content)?;
        Ok(())
    }

    /// Environment wins over the file for keys and the analysis server address.
    pub fn with_env_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        if let Some(key) = non_empty("WEATHER_API_KEY") {
            self.weather_api_key = Some(key);
        }
        if let Some(key) = non_empty("GEMINI_API_KEY") {
            self.gemini_api_key = Some(key);
        }
        if let Some(url) = non_empty("KRISHI_ANALYSIS_URL") {
            self.analysis_base_url = Some(url);
        }
        self
    }

    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let value = value.trim();
        let text = || {
            if value.is_empty() {
                None
            } else {
                Some(value.to_string())
            }
        };
        match key {
            "weather_api_key" => self.weather_api_key = text(),
            "gemini_api_key" => self.gemini_api_key = text(),
            "gemini_model" => self.gemini_model = text(),
            "weather_base_url" => self.weather_base_url = text(),
            "gemini_base_url" => self.gemini_base_url = text(),
            "analysis_base_url" => self.analysis_base_url = text(),
            "max_reply_length" => {
                self.max_reply_length = match text() {
                    Some(v) => Some(
                        v.parse()
                            .map_err(|_| anyhow!("max_reply_length must be a whole number"))?,
                    ),
                    None => None,
                }
            }
            "catalog_latency_ms" => {
                self.catalog_latency_ms = match text() {
                    Some(v) => Some(
                        v.parse()
                            .map_err(|_| anyhow!("catalog_latency_ms must be a whole number"))?,
                    ),
                    None => None,
                }
            }
            other => bail!("Unknown config key '{}'. Known keys: {}", other, KEYS.join(", ")),
        }
        Ok(())
    }

    pub fn weather_base_url(&self) -> &str {
        self.weather_base_url.as_deref().unwrap_or(DEFAULT_WEATHER_URL)
    }

    pub fn gemini_base_url(&self) -> &str {
        self.gemini_base_url.as_deref().unwrap_or(DEFAULT_GEMINI_URL)
    }

    pub fn gemini_model(&self) -> &str {
        self.gemini_model.as_deref().unwrap_or(gemini::DEFAULT_MODEL)
    }

    pub fn analysis_base_url(&self) -> &str {
        self.analysis_base_url
            .as_deref()
            .unwrap_or(analysis::DEFAULT_BASE_URL)
    }

    pub fn max_reply_length(&self) -> usize {
        self.max_reply_length.unwrap_or(DEFAULT_MAX_REPLY_LENGTH)
    }

    pub fn catalog_latency(&self) -> Duration {
        Duration::from_millis(self.catalog_latency_ms.unwrap_or(0))
    }

    /// `key = value` lines with secrets masked.
    pub fn describe(&self) -> Vec<(&'static str, String)> {
        let secret = |v: &Option<String>| match v.as_deref() {
            Some(k) if k.chars().count() > 4 => {
                format!("{}****", k.chars().take(4).collect::<String>())
            }
            Some(_) => "****".to_string(),
            None => "(not set)".to_string(),
        };
        vec![
            ("weather_api_key", secret(&self.weather_api_key)),
            ("gemini_api_key", secret(&self.gemini_api_key)),
            ("gemini_model", self.gemini_model().to_string()),
            ("weather_base_url", self.weather_base_url().to_string()),
            ("gemini_base_url", self.gemini_base_url().to_string()),
            ("analysis_base_url", self.analysis_base_url().to_string()),
            ("max_reply_length", self.max_reply_length().to_string()),
            ("catalog_latency_ms", self.catalog_latency().as_millis().to_string()),
        ]
    }

    pub fn get_config_path() -> Result<PathBuf> {
        Ok(config_dir()?.join("config.json"))
    }
}

/// `<platform config dir>/krishi`, shared with the session file.
pub fn config_dir() -> Result<PathBuf> {
    let base = dirs::config_dir().ok_or_else(|| anyhow!("Could not determine config directory"))?;
    Ok(base.join("krishi"))
}
