use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use super::slug::slugify_context;
use super::{ConversationContext, ConversationItem, ConversationRepository};
use crate::error::Result;
use crate::paths;

/// The whole conversation repository, backed by a single YAML file.
pub struct ConversationStore {
    path: PathBuf,
    repository: ConversationRepository,
}

impl ConversationStore {
    /// Load `~/.parlance/conversations.yaml`.
    pub fn open_default() -> Result<Self> {
        Self::open(paths::conversations_file()?)
    }

    /// Load the repository at `path`. A missing or blank file yields an empty one.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let repository = match fs::read_to_string(&path) {
            Ok(contents) if contents.trim().is_empty() => ConversationRepository::default(),
            Ok(contents) => serde_yaml::from_str(&contents)?,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No conversation file at {}", path.display());
                ConversationRepository::default()
            }
            Err(e) => return Err(e.into()),
        };
        Ok(Self { path, repository })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn repository(&self) -> &ConversationRepository {
        &self.repository
    }

    /// Makes sure `directory`/`slugify(name)` exists and returns it.
    pub fn ensure_context(&mut self, directory: &str, name: &str) -> &mut ConversationContext {
        let slug = slugify_context(name);
        self.context_mut(directory, &slug)
    }

    /// Turns of a context, empty when it does not exist.
    pub fn turns(&self, directory: &str, slug: &str) -> &[ConversationItem] {
        self.repository
            .conversations
            .get(directory)
            .and_then(|contexts| contexts.get(slug))
            .map(|ctx| ctx.conversation.as_slice())
            .unwrap_or_default()
    }

    pub fn append(&mut self, directory: &str, slug: &str, item: ConversationItem) {
        self.context_mut(directory, slug).conversation.push(item);
    }

    pub fn replace_all(&mut self, directory: &str, slug: &str, items: Vec<ConversationItem>) {
        self.context_mut(directory, slug).conversation = items;
    }

    pub fn reset(&mut self, directory: &str, slug: &str) {
        self.context_mut(directory, slug).conversation.clear();
    }

    pub fn directories(&self) -> impl Iterator<Item = &str> {
        self.repository.conversations.keys().map(String::as_str)
    }

    pub fn contexts(&self, directory: &str) -> Vec<&str> {
        self.repository
            .conversations
            .get(directory)
            .map(|contexts| contexts.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// Writes the full repository, replacing the file atomically.
    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let contents = serde_yaml::to_string(&self.repository)?;

        let tmp_path = self.path.with_extension("yaml.tmp");
        fs::write(&tmp_path, contents)?;
        fs::rename(&tmp_path, &self.path)?;

        info!("Saved conversations to {}", self.path.display());
        Ok(())
    }

    fn context_mut(&mut self, directory: &str, slug: &str) -> &mut ConversationContext {
        self.repository
            .conversations
            .entry(directory.to_string())
            .or_default()
            .entry(slug.to_string())
            .or_default()
    }
}
