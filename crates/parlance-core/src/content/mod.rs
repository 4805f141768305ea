//! Typed message content and the normalizers that turn raw file bytes into it.

mod data_uri;
mod media;
mod mime;
mod text;

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::Result;

pub use data_uri::{
    decode_data_uri, encode_data_uri, encode_data_uri_as, split_data_uri, strip_data_uri_prefix,
};
pub use media::{ensure_supported_audio, ensure_supported_image};
pub use mime::{detect_kind, maybe_binary, mime_types};
pub use text::ensure_plain_text;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Text,
    Image,
    Audio,
    Attachment,
}

impl ContentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentKind::Text => "text",
            ContentKind::Image => "image",
            ContentKind::Audio => "audio",
            ContentKind::Attachment => "attachment",
        }
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One piece of a turn. Non-text payloads are data URIs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "content", rename_all = "lowercase")]
pub enum ContentItem {
    Text(String),
    Image(String),
    Audio(String),
    Attachment(String),
}

impl ContentItem {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    pub fn kind(&self) -> ContentKind {
        match self {
            ContentItem::Text(_) => ContentKind::Text,
            ContentItem::Image(_) => ContentKind::Image,
            ContentItem::Audio(_) => ContentKind::Audio,
            ContentItem::Attachment(_) => ContentKind::Attachment,
        }
    }

    pub fn payload(&self) -> &str {
        match self {
            ContentItem::Text(s)
            | ContentItem::Image(s)
            | ContentItem::Audio(s)
            | ContentItem::Attachment(s) => s,
        }
    }

    /// Classifies raw file bytes and wraps them in the matching item.
    ///
    /// Images are normalized to JPEG/PNG, audio is passed through, and
    /// anything else becomes an attachment carrying its detected MIME type.
    pub fn from_file_bytes(data: &[u8]) -> Result<Self> {
        let mime = detect_kind(data);
        if mime.starts_with("image/") {
            Ok(Self::Image(ensure_supported_image(data)?))
        } else if mime.starts_with("audio/") {
            Ok(Self::Audio(ensure_supported_audio(data)?))
        } else {
            Ok(Self::Attachment(encode_data_uri_as(&mime, data)))
        }
    }
}
