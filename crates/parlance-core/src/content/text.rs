use std::io::{Cursor, Read};

use calamine::{open_workbook_auto_from_rs, Reader as _};
use quick_xml::events::Event;
use quick_xml::Reader;
use scraper::{Html, Node, Selector};
use zip::ZipArchive;

use super::mime::{detect_kind, mime_types};
use crate::error::{ParlanceError, Result};

const BLOCK_SEPARATOR: &str = "\n\n\n";
const SLIDE_PREFIX: &str = "ppt/slides/slide";
const DOCX_BODY: &str = "word/document.xml";
const HIDDEN_ELEMENTS: &[&str] = &["script", "style", "noscript", "template"];

/// Extracts readable text from office documents, HTML and PDF.
/// Anything else is returned as (lossy) UTF-8.
pub fn ensure_plain_text(data: &[u8]) -> Result<String> {
    let mime = detect_kind(data);
    match mime.as_str() {
        mime_types::PPTX => pptx_text(data),
        mime_types::DOCX => docx_text(data),
        mime_types::XLSX | mime_types::XLS => spreadsheet_text(data),
        mime_types::HTML => Ok(html_text(data)),
        mime_types::PDF => pdf_extract::extract_text_from_mem(data)
            .map_err(|e| ParlanceError::decode(format!("PDF: {e}"))),
        _ => Ok(String::from_utf8_lossy(data).into_owned()),
    }
}

fn pptx_text(data: &[u8]) -> Result<String> {
    let mut archive = ZipArchive::new(Cursor::new(data))?;
    let mut slides: Vec<(u32, String)> = archive
        .file_names()
        .filter_map(|name| slide_number(name).map(|n| (n, name.to_string())))
        .collect();
    slides.sort_by_key(|(n, _)| *n);

    let mut blocks = Vec::with_capacity(slides.len());
    for (_, name) in slides {
        let xml = read_entry(&mut archive, &name)?;
        blocks.push(text_runs(&xml));
    }
    Ok(blocks.join(BLOCK_SEPARATOR))
}

fn slide_number(name: &str) -> Option<u32> {
    name.strip_prefix(SLIDE_PREFIX)?
        .strip_suffix(".xml")?
        .parse()
        .ok()
}

/// Text of every `<a:t>` run, each followed by a newline.
fn text_runs(xml: &str) -> String {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(false);

    let mut out = String::new();
    let mut in_run = false;
    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) if e.local_name().as_ref() == b"t" => in_run = true,
            Ok(Event::End(e)) if e.local_name().as_ref() == b"t" => {
                in_run = false;
                out.push('\n');
            }
            Ok(Event::Empty(e)) if e.local_name().as_ref() == b"t" => out.push('\n'),
            Ok(Event::Text(t)) if in_run => {
                if let Ok(text) = t.unescape() {
                    out.push_str(&text);
                }
            }
            Ok(Event::Eof) | Err(_) => break,
            _ => {}
        }
    }
    out
}

fn docx_text(data: &[u8]) -> Result<String> {
    let mut archive = ZipArchive::new(Cursor::new(data))?;
    if archive.index_for_name(DOCX_BODY).is_none() {
        return Ok(String::new());
    }
    let xml = read_entry(&mut archive, DOCX_BODY)?;

    let mut reader = Reader::from_str(&xml);
    reader.config_mut().trim_text(false);
    let mut out = String::new();
    loop {
        match reader.read_event() {
            Ok(Event::Text(t)) => {
                if let Ok(text) = t.unescape() {
                    out.push_str(&text);
                }
            }
            Ok(Event::CData(c)) => out.push_str(&String::from_utf8_lossy(&c)),
            Ok(Event::Eof) | Err(_) => break,
            _ => {}
        }
    }
    Ok(out)
}

fn spreadsheet_text(data: &[u8]) -> Result<String> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(data))
        .map_err(|e| ParlanceError::decode(format!("spreadsheet: {e}")))?;

    let mut blocks = Vec::new();
    for sheet in workbook.sheet_names() {
        let range = workbook
            .worksheet_range(&sheet)
            .map_err(|e| ParlanceError::decode(format!("sheet '{sheet}': {e}")))?;

        let mut writer = csv::WriterBuilder::new()
            .flexible(true)
            .terminator(csv::Terminator::Any(b'\n'))
            .from_writer(Vec::new());
        for row in range.rows() {
            writer
                .write_record(row.iter().map(|cell| cell.to_string()))
                .map_err(|e| ParlanceError::decode(format!("csv: {e}")))?;
        }
        let bytes = writer
            .into_inner()
            .map_err(|e| ParlanceError::decode(format!("csv: {e}")))?;
        blocks.push(String::from_utf8_lossy(&bytes).into_owned());
    }
    Ok(blocks.join(BLOCK_SEPARATOR))
}

fn html_text(data: &[u8]) -> String {
    let source = String::from_utf8_lossy(data);
    let document = Html::parse_document(&source);
    let root = Selector::parse("body")
        .ok()
        .and_then(|body| document.select(&body).next())
        .unwrap_or_else(|| document.root_element());

    let mut out = String::new();
    for node in root.descendants() {
        let Node::Text(text) = node.value() else {
            continue;
        };
        let hidden = node.ancestors().any(|parent| {
            parent
                .value()
                .as_element()
                .is_some_and(|el| HIDDEN_ELEMENTS.contains(&el.name()))
        });
        if !hidden {
            out.push_str(&text.text);
        }
    }
    out.trim().to_string()
}

fn read_entry(archive: &mut ZipArchive<Cursor<&[u8]>>, name: &str) -> Result<String> {
    let mut entry = archive.by_name(name)?;
    let mut content = String::new();
    entry.read_to_string(&mut content)?;
    Ok(content)
}
