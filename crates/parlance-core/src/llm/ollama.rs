use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{
    AIModel, HttpMethod, ParsedReply, ProviderAdapter, ProviderId, RequestOptions,
    ResponseSchema, WireRequest,
};
use crate::constants::endpoints;
use crate::content::{strip_data_uri_prefix, ContentItem, ContentKind};
use crate::conversation::{ConversationItem, Role};
use crate::error::{ParlanceError, Result};

const SUPPORTED_KINDS: &[ContentKind] = &[ContentKind::Text, ContentKind::Image];

/// Adapter for a local Ollama server's chat API.
pub struct OllamaAdapter {
    model: String,
    base_url: String,
}

impl OllamaAdapter {
    pub fn new(model: impl Into<String>) -> Result<Self> {
        let model = model.into().trim().to_lowercase();
        if model.is_empty() {
            return Err(ParlanceError::config("Ollama model name is empty"));
        }
        Ok(Self {
            model,
            base_url: endpoints::OLLAMA_BASE_URL.to_string(),
        })
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    fn to_wire_message(&self, item: &ConversationItem) -> Result<OllamaMessage> {
        let mut texts = Vec::new();
        let mut images = Vec::new();
        for content in &item.contents {
            match content {
                ContentItem::Text(text) => texts.push(text.as_str()),
                // Ollama wants bare base64.
                ContentItem::Image(uri) => images.push(strip_data_uri_prefix(uri).to_string()),
                other => {
                    return Err(ParlanceError::unsupported_kind(
                        other.kind(),
                        self.provider().name(),
                    ))
                }
            }
        }
        Ok(OllamaMessage {
            role: item.role,
            content: texts.join("\n\n"),
            images,
        })
    }
}

#[derive(Debug, Serialize)]
struct OllamaRequest<'a> {
    model: &'a str,
    messages: Vec<OllamaMessage>,
    stream: bool,
    options: OllamaOptions,
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<&'a Value>,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    temperature: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<u32>,
}

#[derive(Debug, Serialize)]
struct OllamaMessage {
    role: Role,
    content: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    images: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct OllamaResponse {
    #[serde(default)]
    model: String,
    message: Option<OllamaReplyMessage>,
}

#[derive(Debug, Deserialize)]
struct OllamaReplyMessage {
    #[serde(default)]
    content: String,
}

#[derive(Debug, Deserialize)]
struct OllamaTags {
    #[serde(default)]
    models: Vec<OllamaTag>,
}

#[derive(Debug, Deserialize)]
struct OllamaTag {
    name: String,
}

impl ProviderAdapter for OllamaAdapter {
    fn provider(&self) -> ProviderId {
        ProviderId::Ollama
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn supported_content_kinds(&self) -> &'static [ContentKind] {
        SUPPORTED_KINDS
    }

    fn response_format(&self, schema: &ResponseSchema) -> Value {
        schema.schema.clone()
    }

    fn build_request(
        &self,
        history: &[ConversationItem],
        options: &RequestOptions,
    ) -> Result<WireRequest> {
        let messages = history
            .iter()
            .map(|item| self.to_wire_message(item))
            .collect::<Result<Vec<_>>>()?;

        let request = OllamaRequest {
            model: &self.model,
            messages,
            stream: false,
            options: OllamaOptions {
                temperature: options.temperature,
                num_predict: options.max_tokens,
            },
            format: options.response_format.as_ref(),
        };

        Ok(WireRequest {
            method: HttpMethod::Post,
            url: format!("{}{}", self.base_url, endpoints::OLLAMA_CHAT_PATH),
            headers: Vec::new(),
            body: Some(serde_json::to_value(&request)?),
        })
    }

    fn parse_response(&self, body: &str) -> Result<ParsedReply> {
        let response: OllamaResponse = serde_json::from_str(body)?;
        let message = response
            .message
            .ok_or_else(|| ParlanceError::decode("Ollama reply has no message"))?;
        let model = if response.model.is_empty() {
            self.model.clone()
        } else {
            response.model
        };
        Ok(ParsedReply {
            content: message.content,
            model,
        })
    }

    fn models_request(&self) -> WireRequest {
        WireRequest {
            method: HttpMethod::Get,
            url: format!("{}{}", self.base_url, endpoints::OLLAMA_TAGS_PATH),
            headers: Vec::new(),
            body: None,
        }
    }

    fn parse_models(&self, body: &str) -> Result<Vec<AIModel>> {
        let tags: OllamaTags = serde_json::from_str(body)?;
        Ok(tags
            .models
            .into_iter()
            .map(|tag| AIModel::new(ProviderId::Ollama, tag.name))
            .collect())
    }
}
