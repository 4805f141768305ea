use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::{
    AIModel, HttpMethod, ParsedReply, ProviderAdapter, ProviderId, RequestOptions,
    ResponseSchema, WireRequest,
};
use crate::constants::{endpoints, models};
use crate::content::{mime_types, split_data_uri, ContentItem, ContentKind};
use crate::conversation::{ConversationItem, Role};
use crate::error::{ParlanceError, Result};

const SUPPORTED_KINDS: &[ContentKind] = &[
    ContentKind::Text,
    ContentKind::Image,
    ContentKind::Audio,
    ContentKind::Attachment,
];

pub struct OpenAIAdapter {
    api_key: String,
    model: String,
    base_url: String,
}

impl OpenAIAdapter {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into().trim().to_string();
        let model = model.into().trim().to_lowercase();
        if api_key.is_empty() {
            return Err(ParlanceError::config("OpenAI API key is empty"));
        }
        if model.is_empty() {
            return Err(ParlanceError::config("OpenAI model name is empty"));
        }
        Ok(Self {
            api_key,
            model,
            base_url: endpoints::OPENAI_BASE_URL.to_string(),
        })
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    fn auth_headers(&self) -> Vec<(String, String)> {
        vec![(
            "Authorization".to_string(),
            format!("Bearer {}", self.api_key),
        )]
    }

    fn to_wire_message(item: &ConversationItem) -> Result<OpenAIMessage> {
        let content = item
            .contents
            .iter()
            .enumerate()
            .map(|(i, content)| Self::to_wire_part(i, content))
            .collect::<Result<Vec<_>>>()?;
        Ok(OpenAIMessage {
            role: item.role,
            content,
        })
    }

    fn to_wire_part(index: usize, content: &ContentItem) -> Result<OpenAIContentPart> {
        let part = match content {
            ContentItem::Text(text) => OpenAIContentPart::Text { text: text.clone() },
            ContentItem::Image(uri) => OpenAIContentPart::ImageUrl {
                image_url: ImageUrl { url: uri.clone() },
            },
            ContentItem::Audio(uri) => {
                let (mime, data) = split_data_uri(uri)?;
                OpenAIContentPart::InputAudio {
                    input_audio: InputAudio {
                        data: data.to_string(),
                        format: audio_format(&mime)?,
                    },
                }
            }
            ContentItem::Attachment(uri) => {
                let (mime, _) = split_data_uri(uri)?;
                OpenAIContentPart::File {
                    file: FileData {
                        file_data: uri.clone(),
                        filename: format!("file_{}{}", index + 1, extension_for(&mime)),
                    },
                }
            }
        };
        Ok(part)
    }
}

fn audio_format(mime: &str) -> Result<&'static str> {
    if mime.ends_with("mp3") || mime.ends_with("mpeg") {
        Ok("mp3")
    } else if mime.ends_with("wav") {
        Ok("wav")
    } else {
        Err(ParlanceError::UnsupportedAudioFormat(mime.to_string()))
    }
}

fn extension_for(mime: &str) -> String {
    let known = match mime {
        mime_types::DOCX => Some("docx"),
        mime_types::PPTX => Some("pptx"),
        mime_types::XLSX => Some("xlsx"),
        mime_types::XLS => Some("xls"),
        mime_types::PDF => Some("pdf"),
        mime_types::TEXT => Some("txt"),
        _ => None,
    };
    known
        .or_else(|| {
            mime_guess::get_mime_extensions_str(mime).and_then(|exts| exts.first().copied())
        })
        .map(|ext| format!(".{ext}"))
        .unwrap_or_default()
}

#[derive(Debug, Serialize)]
struct OpenAIRequest<'a> {
    model: &'a str,
    messages: Vec<OpenAIMessage>,
    stream: bool,
    temperature: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_completion_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<&'a Value>,
}

#[derive(Debug, Serialize)]
struct OpenAIMessage {
    role: Role,
    content: Vec<OpenAIContentPart>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum OpenAIContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
    InputAudio { input_audio: InputAudio },
    File { file: FileData },
}

#[derive(Debug, Serialize)]
struct ImageUrl {
    url: String,
}

#[derive(Debug, Serialize)]
struct InputAudio {
    data: String,
    format: &'static str,
}

#[derive(Debug, Serialize)]
struct FileData {
    file_data: String,
    filename: String,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponse {
    #[serde(default)]
    model: String,
    #[serde(default)]
    choices: Vec<OpenAIChoice>,
}

#[derive(Debug, Deserialize)]
struct OpenAIChoice {
    message: OpenAIReplyMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAIReplyMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAIModelList {
    #[serde(default)]
    data: Vec<OpenAIModelEntry>,
}

#[derive(Debug, Deserialize)]
struct OpenAIModelEntry {
    id: String,
    #[serde(default)]
    owned_by: String,
}

impl ProviderAdapter for OpenAIAdapter {
    fn provider(&self) -> ProviderId {
        ProviderId::OpenAI
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn supported_content_kinds(&self) -> &'static [ContentKind] {
        SUPPORTED_KINDS
    }

    fn response_format(&self, schema: &ResponseSchema) -> Value {
        json!({
            "type": "json_schema",
            "json_schema": {
                "name": schema.name,
                "schema": schema.schema,
            }
        })
    }

    fn build_request(
        &self,
        history: &[ConversationItem],
        options: &RequestOptions,
    ) -> Result<WireRequest> {
        let messages = history
            .iter()
            .map(Self::to_wire_message)
            .collect::<Result<Vec<_>>>()?;

        let request = OpenAIRequest {
            model: &self.model,
            messages,
            stream: false,
            temperature: options.temperature,
            max_completion_tokens: options.max_tokens,
            response_format: options.response_format.as_ref(),
        };

        Ok(WireRequest {
            method: HttpMethod::Post,
            url: format!("{}{}", self.base_url, endpoints::OPENAI_CHAT_PATH),
            headers: self.auth_headers(),
            body: Some(serde_json::to_value(&request)?),
        })
    }

    fn parse_response(&self, body: &str) -> Result<ParsedReply> {
        let response: OpenAIResponse = serde_json::from_str(body)?;
        let content = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .unwrap_or_default();
        let model = if response.model.is_empty() {
            self.model.clone()
        } else {
            response.model
        };
        Ok(ParsedReply { content, model })
    }

    fn models_request(&self) -> WireRequest {
        WireRequest {
            method: HttpMethod::Get,
            url: format!("{}{}", self.base_url, endpoints::OPENAI_MODELS_PATH),
            headers: self.auth_headers(),
            body: None,
        }
    }

    fn parse_models(&self, body: &str) -> Result<Vec<AIModel>> {
        let list: OpenAIModelList = serde_json::from_str(body)?;
        Ok(list
            .data
            .into_iter()
            .filter(|entry| models::OPENAI_MODEL_OWNERS.contains(&entry.owned_by.as_str()))
            .map(|entry| AIModel::new(ProviderId::OpenAI, entry.id))
            .collect())
    }
}
