//! Centralized constants: endpoints, default models and file names.

// ─── Models ───────────────────────────────────────────────────────────────────

pub mod models {
    /// Default model per provider, in `provider:model` form.
    pub const DEFAULT_OPENAI_MODEL: &str = "openai:gpt-4.1-mini";
    pub const DEFAULT_OLLAMA_MODEL: &str = "ollama:llama3.1:8b";

    /// Owners whose entries in the hosted model list are chat models we can use.
    pub const OPENAI_MODEL_OWNERS: &[&str] = &["openai", "system"];
}

// ─── API Endpoints ────────────────────────────────────────────────────────────

pub mod endpoints {
    pub const OPENAI_BASE_URL: &str = "https://api.openai.com";
    pub const OLLAMA_BASE_URL: &str = "http://localhost:11434";

    pub const OPENAI_CHAT_PATH: &str = "/v1/chat/completions";
    pub const OPENAI_MODELS_PATH: &str = "/v1/models";
    pub const OLLAMA_CHAT_PATH: &str = "/api/chat";
    pub const OLLAMA_TAGS_PATH: &str = "/api/tags";
}

// ─── Default Settings ─────────────────────────────────────────────────────────

pub mod defaults {
    pub const TEMPERATURE: f64 = 0.3;
    pub const SCHEMA_NAME: &str = "ParlanceResponseSchema";
    /// Answer used when a caller appends a simulated exchange without one.
    pub const PSEUDO_ANSWER: &str = "OK";
}

// ─── Environment ──────────────────────────────────────────────────────────────

pub mod env {
    pub const PROVIDER: &str = "PARLANCE_PROVIDER";
    pub const MODEL: &str = "PARLANCE_MODEL";
    pub const API_KEY: &str = "PARLANCE_API_KEY";
    pub const OPENAI_API_KEY: &str = "OPENAI_API_KEY";
    pub const BASE_URL: &str = "PARLANCE_BASE_URL";
    pub const TEMPERATURE: &str = "PARLANCE_TEMPERATURE";
    pub const MAX_TOKENS: &str = "PARLANCE_MAX_TOKENS";
    pub const SYSTEM_PROMPT: &str = "PARLANCE_SYSTEM_PROMPT";
}

// ─── Files ────────────────────────────────────────────────────────────────────

pub mod files {
    pub const APP_DIR: &str = ".parlance";
    pub const CONFIG_DIR: &str = "parlance";
    pub const CONFIG_FILE: &str = "config.toml";
    pub const CONVERSATIONS_FILE: &str = "conversations.yaml";
}
