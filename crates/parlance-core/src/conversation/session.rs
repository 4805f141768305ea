use std::path::Path;

use tracing::debug;

use super::slug::slugify_context;
use super::{ConversationItem, ConversationStore, Role};
use crate::clock::Clock;
use crate::constants::defaults;
use crate::error::Result;

#[derive(Debug, Clone, Copy, Default)]
pub struct PersistOptions {
    /// Keep changes in memory only.
    pub no_save: bool,
}

/// Overrides for [`ChatSession::append_pseudo_exchange`].
#[derive(Debug, Clone, Default)]
pub struct PseudoExchangeOptions {
    pub answer: Option<String>,
    pub model: Option<String>,
    pub time: Option<String>,
}

/// The active (directory, context) pair over a conversation store.
pub struct ChatSession {
    store: ConversationStore,
    directory: String,
    context: String,
}

impl ChatSession {
    /// Opens the default context for `working_dir`.
    pub fn new(store: ConversationStore, working_dir: impl AsRef<Path>) -> Result<Self> {
        Self::with_context(store, working_dir, "")
    }

    pub fn with_context(
        mut store: ConversationStore,
        working_dir: impl AsRef<Path>,
        name: &str,
    ) -> Result<Self> {
        let directory = absolute_dir(working_dir.as_ref())?;
        let context = slugify_context(name);
        store.ensure_context(&directory, &context);
        Ok(Self {
            store,
            directory,
            context,
        })
    }

    pub fn directory(&self) -> &str {
        &self.directory
    }

    /// Slug of the active context.
    pub fn context(&self) -> &str {
        &self.context
    }

    pub fn store(&self) -> &ConversationStore {
        &self.store
    }

    pub fn into_store(self) -> ConversationStore {
        self.store
    }

    /// Makes `name` the active context, creating it if needed. Returns the slug.
    pub fn switch_context(&mut self, name: &str) -> &str {
        self.context = slugify_context(name);
        self.store.ensure_context(&self.directory, &self.context);
        debug!("Switched to context '{}' in {}", self.context, self.directory);
        &self.context
    }

    pub fn turns(&self) -> &[ConversationItem] {
        self.store.turns(&self.directory, &self.context)
    }

    pub fn is_empty(&self) -> bool {
        self.turns().is_empty()
    }

    pub fn append_turn(&mut self, item: ConversationItem) {
        self.store.append(&self.directory, &self.context, item);
    }

    pub fn replace_turns(&mut self, items: Vec<ConversationItem>) {
        self.store.replace_all(&self.directory, &self.context, items);
    }

    pub fn reset(&mut self) {
        self.store.reset(&self.directory, &self.context);
    }

    /// Seeds an empty context with a system turn. Returns whether one was added.
    pub fn inject_system_prompt_if_absent(
        &mut self,
        prompt: &str,
        model: &str,
        clock: &dyn Clock,
    ) -> bool {
        let prompt = prompt.trim();
        if prompt.is_empty() || !self.is_empty() {
            return false;
        }
        self.append_turn(ConversationItem::system(prompt, model, clock));
        true
    }

    /// Records a user message and a canned assistant answer without calling a model.
    pub fn append_pseudo_exchange(
        &mut self,
        message: &str,
        default_model: &str,
        clock: &dyn Clock,
        options: PseudoExchangeOptions,
    ) {
        let model = options.model.unwrap_or_else(|| default_model.to_string());
        let time = options.time.unwrap_or_else(|| clock.iso_now());
        let answer = options
            .answer
            .unwrap_or_else(|| defaults::PSEUDO_ANSWER.to_string());

        self.append_turn(ConversationItem::new(Role::User, &model, &time).with_text(message));
        self.append_turn(ConversationItem::new(Role::Assistant, model, time).with_text(answer));
    }

    pub fn persist(&self, options: &PersistOptions) -> Result<()> {
        if options.no_save {
            debug!("Skipping save of {}", self.store.path().display());
            return Ok(());
        }
        self.store.save()
    }
}

fn absolute_dir(dir: &Path) -> Result<String> {
    let dir = if dir.is_absolute() {
        dir.to_path_buf()
    } else {
        std::env::current_dir()?.join(dir)
    };
    Ok(dir.to_string_lossy().into_owned())
}
