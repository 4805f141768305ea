use thiserror::Error;

use crate::content::ContentKind;

#[derive(Error, Debug)]
pub enum ParlanceError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Content kind '{kind}' is not supported by {provider}")]
    UnsupportedContentKind { kind: ContentKind, provider: String },

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Unsupported audio format '{0}'")]
    UnsupportedAudioFormat(String),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("HTTP error ({status}): {body}")]
    Http { status: u16, body: String },

    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ParlanceError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode(message.into())
    }

    pub fn unsupported_kind(kind: ContentKind, provider: impl Into<String>) -> Self {
        Self::UnsupportedContentKind {
            kind,
            provider: provider.into(),
        }
    }
}

impl From<serde_json::Error> for ParlanceError {
    fn from(e: serde_json::Error) -> Self {
        Self::Decode(format!("JSON: {e}"))
    }
}

impl From<serde_yaml::Error> for ParlanceError {
    fn from(e: serde_yaml::Error) -> Self {
        Self::Decode(format!("YAML: {e}"))
    }
}

impl From<base64::DecodeError> for ParlanceError {
    fn from(e: base64::DecodeError) -> Self {
        Self::Decode(format!("base64: {e}"))
    }
}

impl From<zip::result::ZipError> for ParlanceError {
    fn from(e: zip::result::ZipError) -> Self {
        Self::Decode(format!("zip: {e}"))
    }
}

pub type Result<T> = std::result::Result<T, ParlanceError>;
