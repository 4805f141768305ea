use base64::{engine::general_purpose::STANDARD, Engine as _};

use super::mime::detect_kind;
use crate::error::{ParlanceError, Result};

/// `data:<detected mime>;base64,<payload>`
pub fn encode_data_uri(data: &[u8]) -> String {
    encode_data_uri_as(&detect_kind(data), data)
}

pub fn encode_data_uri_as(mime: &str, data: &[u8]) -> String {
    format!("data:{};base64,{}", mime, STANDARD.encode(data))
}

/// Splits a data URI into its lowercased MIME type and raw payload text.
pub fn split_data_uri(uri: &str) -> Result<(String, &str)> {
    let (meta, payload) = uri
        .split_once(',')
        .ok_or_else(|| ParlanceError::decode("data URI is missing ','"))?;
    let meta = meta.trim();
    let meta = meta.strip_prefix("data:").unwrap_or(meta);
    let mime = meta.split(';').next().unwrap_or_default().trim().to_lowercase();
    Ok((mime, payload))
}

/// Inverse of [`encode_data_uri`]. Returns the bytes and the MIME type.
pub fn decode_data_uri(uri: &str) -> Result<(Vec<u8>, String)> {
    let (meta, _) = uri
        .split_once(',')
        .ok_or_else(|| ParlanceError::decode("data URI is missing ','"))?;
    if !meta.to_ascii_lowercase().ends_with(";base64") {
        return Err(ParlanceError::decode("data URI is not base64 encoded"));
    }
    let (mime, payload) = split_data_uri(uri)?;
    let bytes = STANDARD.decode(payload.trim())?;
    Ok((bytes, mime))
}

/// Everything after the first comma, or the input unchanged when there is none.
pub fn strip_data_uri_prefix(value: &str) -> &str {
    value.split_once(',').map_or(value, |(_, rest)| rest)
}
