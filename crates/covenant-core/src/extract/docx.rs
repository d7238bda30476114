//! DOCX text extraction.
//!
//! A DOCX file is a zip container; the body lives in `word/document.xml`.
//! Paragraph text (`<w:t>` runs inside `<w:p>`) is concatenated in document
//! order and paragraphs are joined with newlines.

use std::io::{Cursor, Read};

use lazy_static::lazy_static;
use regex::{Captures, Regex};

use super::ExtractError;

const DOCUMENT_PART: &str = "word/document.xml";

lazy_static! {
    /// Paragraph, text-run, tab and break tags (open, close or self-closing).
    static ref WORD_TAG: Regex =
        Regex::new(r"<(/?)w:(p|t|tab|br|cr)(\s[^>]*?)?(/?)>").unwrap();

    static ref XML_ENTITY: Regex =
        Regex::new(r"&(#x[0-9a-fA-F]+|#[0-9]+|amp|lt|gt|quot|apos);").unwrap();
}

pub(super) fn extract(bytes: &[u8]) -> Result<String, ExtractError> {
    let mut archive =
        zip::ZipArchive::new(Cursor::new(bytes)).map_err(|e| ExtractError::Docx(e.to_string()))?;

    let mut xml = String::new();
    archive
        .by_name(DOCUMENT_PART)
        .map_err(|e| ExtractError::Docx(format!("{}: {}", DOCUMENT_PART, e)))?
        .read_to_string(&mut xml)?;

    Ok(paragraphs(&xml).join("\n"))
}

/// Collect the text of every paragraph in `document.xml`.
fn paragraphs(xml: &str) -> Vec<String> {
    let mut paragraphs = Vec::new();
    let mut current: Option<String> = None;
    let mut run_start: Option<usize> = None;

    for caps in WORD_TAG.captures_iter(xml) {
        let tag = caps.get(0).unwrap();
        let closing = &caps[1] == "/";
        let self_closing = &caps[4] == "/";

        match &caps[2] {
            "p" if closing => {
                if let Some(paragraph) = current.take() {
                    paragraphs.push(paragraph);
                }
            }
            "p" if self_closing => paragraphs.push(String::new()),
            "p" => current = Some(String::new()),
            "t" if closing => {
                if let (Some(start), Some(paragraph)) = (run_start.take(), current.as_mut()) {
                    paragraph.push_str(&unescape(&xml[start..tag.start()]));
                }
            }
            "t" if !self_closing => run_start = Some(tag.end()),
            "tab" if !closing => push_to(&mut current, '\t'),
            "br" | "cr" if !closing => push_to(&mut current, '\n'),
            _ => {}
        }
    }

    paragraphs
}

fn push_to(current: &mut Option<String>, c: char) {
    if let Some(paragraph) = current.as_mut() {
        paragraph.push(c);
    }
}

fn unescape(text: &str) -> String {
    XML_ENTITY
        .replace_all(text, |caps: &Captures| {
            let entity = &caps[1];
            let decoded = match entity {
                "amp" => Some('&'),
                "lt" => Some('<'),
                "gt" => Some('>'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                _ if entity.starts_with("#x") => u32::from_str_radix(&entity[2..], 16)
                    .ok()
                    .and_then(char::from_u32),
                _ => entity[1..].parse::<u32>().ok().and_then(char::from_u32),
            };
            decoded.map(String::from).unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}
