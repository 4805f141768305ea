pub mod clock;
pub mod config;
pub mod constants;
pub mod content;
pub mod conversation;
pub mod error;
pub mod llm;
pub mod paths;

// Re-export key types
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::Settings;
pub use content::{ContentItem, ContentKind};
pub use conversation::{
    ChatSession, ConversationContext, ConversationItem, ConversationRepository,
    ConversationStore, PersistOptions, PseudoExchangeOptions, Role,
};
pub use error::ParlanceError;
pub use llm::{
    list_models, AIModel, AiClient, ChatOptions, ChatReply, PromptOptions, PromptReply,
    ProviderAdapter, ProviderId, ResponseSchema,
};
