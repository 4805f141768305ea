use std::io::Cursor;

use zip::ZipArchive;

pub mod mime_types {
    pub const PNG: &str = "image/png";
    pub const JPEG: &str = "image/jpeg";
    pub const HEIC: &str = "image/heic";
    pub const HEIF: &str = "image/heif";
    pub const AVIF: &str = "image/avif";
    pub const PDF: &str = "application/pdf";
    pub const DOCX: &str =
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document";
    pub const PPTX: &str =
        "application/vnd.openxmlformats-officedocument.presentationml.presentation";
    pub const XLSX: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";
    pub const XLS: &str = "application/vnd.ms-excel";
    pub const HTML: &str = "text/html";
    pub const TEXT: &str = "text/plain";
    pub const OCTET_STREAM: &str = "application/octet-stream";
}

const OLE_MAGIC: [u8; 8] = [0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];
const ZIP_MAGIC: &[u8] = b"PK\x03\x04";
const CONTENT_TYPES: &str = "[Content_Types].xml";
const SNIFF_LEN: usize = 512;

// Checked in order; the first prefix present in the archive wins.
const OFFICE_PREFIXES: &[(&str, &str)] = &[
    ("xl/", mime_types::XLSX),
    ("ppt/", mime_types::PPTX),
    ("word/", mime_types::DOCX),
];

const HTML_TAGS: &[&str] = &[
    "<!doctype html",
    "<html",
    "<head",
    "<script",
    "<iframe",
    "<h1",
    "<div",
    "<font",
    "<table",
    "<a",
    "<style",
    "<title",
    "<b",
    "<body",
    "<br",
    "<p",
];

/// True when the bytes contain control characters that never appear in text.
pub fn maybe_binary(data: &[u8]) -> bool {
    data.iter().any(|&b| b < 7 || (14..32).contains(&b))
}

/// Best-effort MIME type of a byte buffer.
pub fn detect_kind(data: &[u8]) -> String {
    if let Some(mime) = iso_media_kind(data) {
        return mime.to_string();
    }
    if data.starts_with(&OLE_MAGIC) {
        return mime_types::XLS.to_string();
    }
    if let Some(mime) = office_kind(data) {
        return mime.to_string();
    }
    if let Some(kind) = infer::get(data) {
        return kind.mime_type().to_string();
    }
    sniff_text(data).to_string()
}

fn iso_media_kind(data: &[u8]) -> Option<&'static str> {
    if data.len() < 12 || &data[4..8] != b"ftyp" {
        return None;
    }
    match &data[8..12] {
        b"heic" | b"heix" | b"hevc" | b"hevx" => Some(mime_types::HEIC),
        b"mif1" | b"msf1" => Some(mime_types::HEIF),
        b"avif" => Some(mime_types::AVIF),
        _ => None,
    }
}

fn office_kind(data: &[u8]) -> Option<&'static str> {
    if !data.starts_with(ZIP_MAGIC) {
        return None;
    }
    let archive = ZipArchive::new(Cursor::new(data)).ok()?;
    let names: Vec<&str> = archive.file_names().collect();
    if !names.contains(&CONTENT_TYPES) {
        return None;
    }
    OFFICE_PREFIXES.iter().find_map(|(prefix, mime)| {
        names
            .iter()
            .any(|name| name.len() > prefix.len() && name.starts_with(prefix))
            .then_some(*mime)
    })
}

fn sniff_text(data: &[u8]) -> &'static str {
    let head = &data[..data.len().min(SNIFF_LEN)];
    if maybe_binary(head) {
        return mime_types::OCTET_STREAM;
    }
    let head = String::from_utf8_lossy(head).trim_start().to_ascii_lowercase();
    if head.starts_with("<!--") || HTML_TAGS.iter().any(|tag| opens_tag(&head, tag)) {
        mime_types::HTML
    } else {
        mime_types::TEXT
    }
}

fn opens_tag(head: &str, tag: &str) -> bool {
    head.strip_prefix(tag)
        .and_then(|rest| rest.chars().next())
        .is_some_and(|c| c == ' ' || c == '>')
}
