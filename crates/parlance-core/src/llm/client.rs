use std::sync::Arc;

use tracing::{debug, info, warn};

use super::{
    build_adapter, build_adapter_for, resolve_model, AIModel, HttpMethod, ParsedReply,
    ProviderAdapter, ProviderId, RequestOptions, ResponseSchema, WireRequest,
};
use crate::clock::{Clock, SystemClock};
use crate::config::Settings;
use crate::content::ContentItem;
use crate::conversation::{ChatSession, ConversationItem, PersistOptions, Role};
use crate::error::{ParlanceError, Result};

#[derive(Debug, Clone, Default)]
pub struct ChatOptions {
    /// Raw file contents attached to the user turn.
    pub files: Vec<Vec<u8>>,
    /// Overrides the client's system prompt for a fresh context.
    pub system_prompt: Option<String>,
    pub response_schema: Option<ResponseSchema>,
    pub no_save: bool,
}

#[derive(Debug, Clone, Default)]
pub struct PromptOptions {
    pub files: Vec<Vec<u8>>,
    pub system_prompt: Option<String>,
    pub response_schema: Option<ResponseSchema>,
}

#[derive(Debug, Clone)]
pub struct ChatReply {
    pub reply: String,
    /// The whole context after the exchange.
    pub history: Vec<ConversationItem>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PromptReply {
    pub content: String,
    pub model: String,
}

/// Sends conversations to one provider.
pub struct AiClient {
    adapter: Box<dyn ProviderAdapter>,
    http: reqwest::blocking::Client,
    clock: Arc<dyn Clock>,
    temperature: f64,
    max_tokens: Option<u32>,
    system_prompt: Option<String>,
}

impl AiClient {
    pub fn new(adapter: Box<dyn ProviderAdapter>) -> Result<Self> {
        // Generation can take minutes on local models.
        let http = reqwest::blocking::Client::builder().timeout(None).build()?;
        Ok(Self {
            adapter,
            http,
            clock: Arc::new(SystemClock),
            temperature: crate::constants::defaults::TEMPERATURE,
            max_tokens: None,
            system_prompt: None,
        })
    }

    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let client = Self::new(build_adapter(settings)?)?
            .with_temperature(settings.temperature())
            .with_max_tokens(settings.max_tokens());
        Ok(match settings.system_prompt() {
            Some(prompt) => client.with_system_prompt(prompt),
            None => client,
        })
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: Option<u32>) -> Self {
        self.max_tokens = max_tokens.filter(|n| *n > 0);
        self
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    pub fn adapter(&self) -> &dyn ProviderAdapter {
        self.adapter.as_ref()
    }

    pub fn provider(&self) -> ProviderId {
        self.adapter.provider()
    }

    /// `provider:model`
    pub fn model(&self) -> String {
        self.adapter.qualified_model()
    }

    /// Sends `message` in the session's active context and records the exchange.
    ///
    /// On any failure the context is left exactly as it was.
    pub fn chat(
        &self,
        session: &mut ChatSession,
        message: &str,
        options: &ChatOptions,
    ) -> Result<ChatReply> {
        let model = self.model();
        let (user_turn, request_options) =
            self.user_turn(message, &options.files, options.response_schema.as_ref())?;

        let snapshot = session.turns().to_vec();
        let system_prompt = options
            .system_prompt
            .as_deref()
            .or(self.system_prompt.as_deref());
        if let Some(prompt) = system_prompt {
            session.inject_system_prompt_if_absent(prompt, &model, self.clock.as_ref());
        }

        let mut history = session.turns().to_vec();
        history.push(user_turn.clone());

        let reply = match self.round_trip(&history, &request_options) {
            Ok(reply) => reply,
            Err(e) => {
                warn!("Chat with {} failed: {}", model, e);
                session.replace_turns(snapshot);
                return Err(e);
            }
        };

        let assistant = ConversationItem::new(Role::Assistant, &model, self.clock.iso_now())
            .with_text(&reply.content);
        session.append_turn(user_turn);
        session.append_turn(assistant);

        if let Err(e) = session.persist(&PersistOptions {
            no_save: options.no_save,
        }) {
            session.replace_turns(snapshot);
            return Err(e);
        }

        Ok(ChatReply {
            reply: reply.content,
            history: session.turns().to_vec(),
        })
    }

    /// One-shot request that touches no stored conversation.
    pub fn prompt(&self, message: &str, options: &PromptOptions) -> Result<PromptReply> {
        let model = self.model();
        let (user_turn, request_options) =
            self.user_turn(message, &options.files, options.response_schema.as_ref())?;

        let mut history = Vec::with_capacity(2);
        let system_prompt = options
            .system_prompt
            .as_deref()
            .or(self.system_prompt.as_deref())
            .map(str::trim)
            .filter(|p| !p.is_empty());
        if let Some(prompt) = system_prompt {
            history.push(ConversationItem::system(prompt, &model, self.clock.as_ref()));
        }
        history.push(user_turn);

        let reply = self.round_trip(&history, &request_options)?;
        Ok(PromptReply {
            content: reply.content,
            model: reply.model,
        })
    }

    pub fn list_models(&self) -> Result<Vec<AIModel>> {
        let body = self.send(self.adapter.models_request())?;
        self.adapter.parse_models(&body)
    }

    fn user_turn(
        &self,
        message: &str,
        files: &[Vec<u8>],
        schema: Option<&ResponseSchema>,
    ) -> Result<(ConversationItem, RequestOptions)> {
        let mut turn = ConversationItem::user(message, self.model(), self.clock.as_ref());
        for data in files {
            let item = ContentItem::from_file_bytes(data)?;
            self.adapter.ensure_supported(&item)?;
            turn.contents.push(item);
        }

        let response_format = schema.map(|s| self.adapter.response_format(s));
        if let Some(format) = &response_format {
            turn.response_format = Some(serde_json::to_string(format)?);
        }

        Ok((
            turn,
            RequestOptions {
                temperature: self.temperature,
                max_tokens: self.max_tokens,
                response_format,
            },
        ))
    }

    fn round_trip(
        &self,
        history: &[ConversationItem],
        options: &RequestOptions,
    ) -> Result<ParsedReply> {
        let request = self.adapter.build_request(history, options)?;
        let body = self.send(request)?;
        self.adapter.parse_response(&body)
    }

    fn send(&self, request: WireRequest) -> Result<String> {
        debug!("{:?} {}", request.method, request.url);
        let mut builder = match request.method {
            HttpMethod::Get => self.http.get(&request.url),
            HttpMethod::Post => self.http.post(&request.url),
        };
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send()?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            warn!("{} API error ({}): {}", self.provider().name(), status, body);
            return Err(ParlanceError::Http {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response.text()?)
    }
}

/// Models available from every reachable provider, sorted by `provider:name`.
///
/// Providers that are not configured or not reachable are skipped.
pub fn list_models(settings: &Settings) -> Vec<AIModel> {
    let active = resolve_model(settings).ok();
    let mut found = Vec::new();

    for provider in ProviderId::ALL {
        let (model, base_url) = match &active {
            Some(m) if m.provider == provider => (
                m.clone(),
                settings.base_url().unwrap_or(provider.default_base_url()),
            ),
            _ => (provider.default_model(), provider.default_base_url()),
        };
        let listed = build_adapter_for(&model, settings, base_url)
            .and_then(AiClient::new)
            .and_then(|client| client.list_models());
        match listed {
            Ok(models) => {
                info!("{} offers {} models", provider.name(), models.len());
                found.extend(models);
            }
            Err(e) => warn!("Skipping {} model listing: {}", provider.name(), e),
        }
    }

    found.sort_by_key(|m| m.to_string().to_lowercase());
    found
}
