use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::constants::{defaults, env, files};
use crate::error::{ParlanceError, Result};
use crate::llm::ProviderId;

/// User settings, read from `config.toml` and then overridden by the environment.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    pub provider: Option<ProviderId>,
    /// `provider:name` or a bare model name for `provider`.
    pub model: Option<String>,
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub temperature: Option<f64>,
    /// Zero or negative means no limit.
    pub max_tokens: Option<i64>,
    pub system_prompt: Option<String>,
}

impl Settings {
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(files::CONFIG_DIR)
            .join(files::CONFIG_FILE)
    }

    /// Config file plus environment overrides.
    pub fn load() -> Result<Self> {
        let mut settings = Self::load_from(&Self::config_path());
        settings.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(settings)
    }

    /// Reads a config file, falling back to defaults when it is missing or invalid.
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            debug!("No config file at {}", path.display());
            return Self::default();
        }
        match std::fs::read_to_string(path) {
            Ok(content) => match toml::from_str(&content) {
                Ok(settings) => settings,
                Err(e) => {
                    warn!("Ignoring invalid config {}: {}", path.display(), e);
                    Self::default()
                }
            },
            Err(e) => {
                warn!("Failed to read config {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Applies `PARLANCE_*` overrides read through `lookup`.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(provider) = get(env::PROVIDER) {
            self.provider = Some(provider.parse()?);
        }
        if let Some(model) = get(env::MODEL) {
            self.model = Some(model);
        }
        if let Some(key) = get(env::API_KEY) {
            self.api_key = Some(key);
        } else if self.api_key().is_none() {
            self.api_key = get(env::OPENAI_API_KEY);
        }
        if let Some(url) = get(env::BASE_URL) {
            self.base_url = Some(url);
        }
        if let Some(raw) = get(env::TEMPERATURE) {
            let value = raw.trim().parse::<f64>().map_err(|_| {
                ParlanceError::config(format!("{} must be a number, got '{raw}'", env::TEMPERATURE))
            })?;
            self.temperature = Some(value);
        }
        if let Some(raw) = get(env::MAX_TOKENS) {
            let value = raw.trim().parse::<i64>().map_err(|_| {
                ParlanceError::config(format!("{} must be an integer, got '{raw}'", env::MAX_TOKENS))
            })?;
            self.max_tokens = Some(value);
        }
        if let Some(prompt) = get(env::SYSTEM_PROMPT) {
            self.system_prompt = Some(prompt);
        }
        Ok(())
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self).map_err(|e| ParlanceError::config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn model(&self) -> Option<&str> {
        non_blank(&self.model)
    }

    pub fn api_key(&self) -> Option<&str> {
        non_blank(&self.api_key)
    }

    pub fn base_url(&self) -> Option<&str> {
        non_blank(&self.base_url)
    }

    pub fn system_prompt(&self) -> Option<&str> {
        non_blank(&self.system_prompt)
    }

    pub fn temperature(&self) -> f64 {
        self.temperature.unwrap_or(defaults::TEMPERATURE)
    }

    pub fn max_tokens(&self) -> Option<u32> {
        self.max_tokens
            .filter(|n| *n > 0)
            .map(|n| u32::try_from(n).unwrap_or(u32::MAX))
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}
