use std::io::Cursor;

use image::ImageFormat;
use tracing::debug;

use super::data_uri::encode_data_uri_as;
use super::mime::{detect_kind, mime_types};
use crate::error::{ParlanceError, Result};

/// Returns an image data URI that every provider accepts.
///
/// JPEG and PNG pass through untouched. Other decodable formats are
/// re-encoded as PNG.
pub fn ensure_supported_image(data: &[u8]) -> Result<String> {
    let mime = detect_kind(data);
    if !mime.starts_with("image/") {
        return Err(ParlanceError::UnsupportedFormat(format!(
            "'{mime}' is not an image"
        )));
    }
    if mime == mime_types::JPEG || mime == mime_types::PNG {
        return Ok(encode_data_uri_as(&mime, data));
    }

    let format = decoder_for(&mime)
        .ok_or_else(|| ParlanceError::UnsupportedFormat(format!("cannot convert '{mime}'")))?;
    debug!("Converting {} image to PNG", mime);

    let decoded = image::load_from_memory_with_format(data, format)
        .map_err(|e| ParlanceError::decode(format!("{mime}: {e}")))?;
    let mut png = Vec::new();
    decoded
        .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
        .map_err(|e| ParlanceError::decode(format!("PNG encoding: {e}")))?;
    Ok(encode_data_uri_as(mime_types::PNG, &png))
}

/// Audio is passed through as-is; only the kind is checked.
pub fn ensure_supported_audio(data: &[u8]) -> Result<String> {
    let mime = detect_kind(data);
    if !mime.starts_with("audio/") {
        return Err(ParlanceError::UnsupportedFormat(format!(
            "'{mime}' is not audio"
        )));
    }
    Ok(encode_data_uri_as(&mime, data))
}

fn decoder_for(mime: &str) -> Option<ImageFormat> {
    match mime.strip_prefix("image/")? {
        "bmp" | "x-ms-bmp" => Some(ImageFormat::Bmp),
        "gif" => Some(ImageFormat::Gif),
        "tiff" => Some(ImageFormat::Tiff),
        "webp" => Some(ImageFormat::WebP),
        _ => None,
    }
}
