//! Conversation data model, YAML persistence and the per-directory session.

mod session;
mod slug;
mod store;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::clock::Clock;
use crate::content::ContentItem;

pub use session::{ChatSession, PersistOptions, PseudoExchangeOptions};
pub use slug::slugify_context;
pub use store::ConversationStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationItem {
    pub role: Role,
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub time: String,
    #[serde(default)]
    pub contents: Vec<ContentItem>,
    /// Serialized provider response-format directive sent with this turn.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_format: Option<String>,
}

impl ConversationItem {
    pub fn new(role: Role, model: impl Into<String>, time: impl Into<String>) -> Self {
        Self {
            role,
            model: model.into(),
            time: time.into(),
            contents: Vec::new(),
            response_format: None,
        }
    }

    pub fn system(prompt: impl Into<String>, model: impl Into<String>, clock: &dyn Clock) -> Self {
        Self::new(Role::System, model, clock.iso_now()).with_text(prompt)
    }

    pub fn user(text: impl Into<String>, model: impl Into<String>, clock: &dyn Clock) -> Self {
        Self::new(Role::User, model, clock.iso_now()).with_text(text)
    }

    pub fn assistant(text: impl Into<String>, model: impl Into<String>, clock: &dyn Clock) -> Self {
        Self::new(Role::Assistant, model, clock.iso_now()).with_text(text)
    }

    pub fn with_text(self, text: impl Into<String>) -> Self {
        self.with_content(ContentItem::Text(text.into()))
    }

    pub fn with_content(mut self, item: ContentItem) -> Self {
        self.contents.push(item);
        self
    }

    /// All text items joined by a blank line.
    pub fn text(&self) -> String {
        self.contents
            .iter()
            .filter_map(|c| match c {
                ContentItem::Text(t) => Some(t.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

/// The ordered turns of one named context.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConversationContext {
    #[serde(default)]
    pub conversation: Vec<ConversationItem>,
}

impl ConversationContext {
    pub fn len(&self) -> usize {
        self.conversation.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conversation.is_empty()
    }
}

/// directory path -> context slug -> context
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConversationRepository {
    #[serde(default)]
    pub conversations: BTreeMap<String, BTreeMap<String, ConversationContext>>,
}
