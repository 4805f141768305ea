use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::{OllamaAdapter, OpenAIAdapter, ProviderAdapter};
use crate::config::Settings;
use crate::constants::{endpoints, models};
use crate::error::{ParlanceError, Result};

/// Identifies a supported LLM backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderId {
    OpenAI,
    Ollama,
}

impl ProviderId {
    pub const ALL: [ProviderId; 2] = [ProviderId::OpenAI, ProviderId::Ollama];

    /// Human readable label.
    pub fn name(&self) -> &'static str {
        match self {
            Self::OpenAI => "OpenAI",
            Self::Ollama => "Ollama (Local)",
        }
    }

    /// Prefix used in `provider:model` strings.
    pub fn key(&self) -> &'static str {
        match self {
            Self::OpenAI => "openai",
            Self::Ollama => "ollama",
        }
    }

    pub fn is_local(&self) -> bool {
        matches!(self, Self::Ollama)
    }

    pub fn needs_api_key(&self) -> bool {
        !self.is_local()
    }

    pub fn default_base_url(&self) -> &'static str {
        match self {
            Self::OpenAI => endpoints::OPENAI_BASE_URL,
            Self::Ollama => endpoints::OLLAMA_BASE_URL,
        }
    }

    pub fn default_model(&self) -> AIModel {
        let qualified = match self {
            Self::OpenAI => models::DEFAULT_OPENAI_MODEL,
            Self::Ollama => models::DEFAULT_OLLAMA_MODEL,
        };
        let (_, name) = qualified.split_once(':').unwrap_or(("", qualified));
        AIModel::new(*self, name)
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for ProviderId {
    type Err = ParlanceError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "openai" => Ok(Self::OpenAI),
            "ollama" => Ok(Self::Ollama),
            other => Err(ParlanceError::config(format!("Unknown provider '{other}'"))),
        }
    }
}

/// A model offered by a provider. Displays as `provider:name`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AIModel {
    pub provider: ProviderId,
    pub name: String,
}

impl AIModel {
    /// The name is trimmed and lowercased.
    pub fn new(provider: ProviderId, name: impl Into<String>) -> Self {
        Self {
            provider,
            name: name.into().trim().to_lowercase(),
        }
    }

    /// Parses `provider:name`.
    pub fn parse(s: &str) -> Result<Self> {
        let (provider, name) = s
            .trim()
            .split_once(':')
            .ok_or_else(|| ParlanceError::config(format!("Model '{s}' has no provider prefix")))?;
        let model = Self::new(provider.parse()?, name);
        if model.name.is_empty() {
            return Err(ParlanceError::config(format!("Model '{s}' has no name")));
        }
        Ok(model)
    }
}

impl fmt::Display for AIModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.provider, self.name)
    }
}

/// Picks the model from settings.
///
/// A `provider:name` model wins. A bare model name is paired with the
/// configured provider, and with nothing configured the OpenAI default is used.
pub fn resolve_model(settings: &Settings) -> Result<AIModel> {
    let provider = settings.provider.unwrap_or(ProviderId::OpenAI);
    let Some(model) = settings.model() else {
        return Ok(provider.default_model());
    };
    if let Some((prefix, _)) = model.split_once(':') {
        if prefix.parse::<ProviderId>().is_ok() {
            return AIModel::parse(model);
        }
    }
    Ok(AIModel::new(provider, model))
}

/// Builds the adapter for the model the settings select.
pub fn build_adapter(settings: &Settings) -> Result<Box<dyn ProviderAdapter>> {
    let model = resolve_model(settings)?;
    let base_url = settings
        .base_url()
        .unwrap_or_else(|| model.provider.default_base_url());
    build_adapter_for(&model, settings, base_url)
}

pub fn build_adapter_for(
    model: &AIModel,
    settings: &Settings,
    base_url: &str,
) -> Result<Box<dyn ProviderAdapter>> {
    let api_key = if model.provider.needs_api_key() {
        settings.api_key().ok_or_else(|| {
            ParlanceError::config(format!(
                "No {} API key. Set PARLANCE_API_KEY or OPENAI_API_KEY",
                model.provider.name()
            ))
        })?
    } else {
        ""
    };
    match model.provider {
        ProviderId::OpenAI => Ok(Box::new(
            OpenAIAdapter::new(api_key, &model.name)?.with_base_url(base_url),
        )),
        ProviderId::Ollama => Ok(Box::new(
            OllamaAdapter::new(&model.name)?.with_base_url(base_url),
        )),
    }
}
