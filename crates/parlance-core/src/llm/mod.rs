mod client;
mod ollama;
mod openai;
pub mod provider;

use serde_json::Value;

use crate::content::{ContentItem, ContentKind};
use crate::conversation::ConversationItem;
use crate::error::{ParlanceError, Result};

pub use client::{list_models, AiClient, ChatOptions, ChatReply, PromptOptions, PromptReply};
pub use ollama::OllamaAdapter;
pub use openai::OpenAIAdapter;
pub use provider::{build_adapter, build_adapter_for, resolve_model, AIModel, ProviderId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

/// A fully prepared HTTP call; the client only has to send it.
#[derive(Debug, Clone)]
pub struct WireRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<Value>,
}

/// Per-request generation knobs.
#[derive(Debug, Clone)]
pub struct RequestOptions {
    pub temperature: f64,
    /// `None` leaves the limit to the server.
    pub max_tokens: Option<u32>,
    /// Provider-shaped directive from [`ProviderAdapter::response_format`].
    pub response_format: Option<Value>,
}

/// JSON schema the reply must conform to.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseSchema {
    pub name: String,
    pub schema: Value,
}

impl ResponseSchema {
    pub fn new(schema: Value) -> Self {
        Self {
            name: crate::constants::defaults::SCHEMA_NAME.to_string(),
            schema,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParsedReply {
    pub content: String,
    pub model: String,
}

/// Translates conversations to one provider's wire format and back.
pub trait ProviderAdapter: Send + Sync {
    fn provider(&self) -> ProviderId;

    /// Bare model name, without the provider prefix.
    fn model(&self) -> &str;

    fn supported_content_kinds(&self) -> &'static [ContentKind];

    fn response_format(&self, schema: &ResponseSchema) -> Value;

    fn build_request(
        &self,
        history: &[ConversationItem],
        options: &RequestOptions,
    ) -> Result<WireRequest>;

    fn parse_response(&self, body: &str) -> Result<ParsedReply>;

    fn models_request(&self) -> WireRequest;

    fn parse_models(&self, body: &str) -> Result<Vec<AIModel>>;

    /// `provider:model`, as recorded on turns.
    fn qualified_model(&self) -> String {
        AIModel::new(self.provider(), self.model()).to_string()
    }

    fn ensure_supported(&self, item: &ContentItem) -> Result<()> {
        let kind = item.kind();
        if self.supported_content_kinds().contains(&kind) {
            Ok(())
        } else {
            Err(ParlanceError::unsupported_kind(kind, self.provider().name()))
        }
    }
}
