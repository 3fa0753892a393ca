//! Text extraction for uploaded requirements documents
//!
//! Plain text and markdown are decoded as UTF-8 with a Latin-1 fallback,
//! `.docx` files are read from their `word/document.xml` part and PDFs go
//! through `lopdf`'s text extraction.

use crate::models::DocumentType;
use crate::{Error, Result};
use regex::Regex;
use std::io::{Cursor, Read};
use std::sync::LazyLock;

static DOCX_PARAGRAPH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<w:p(?:\s[^>]*)?/>|<w:p(?:\s[^>]*)?>.*?</w:p>")
        .expect("paragraph pattern is valid")
});
static DOCX_TEXT_RUN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<w:t(?: [^>]*)?>(.*?)</w:t>|<w:tab/>|<w:br/>").expect("run pattern is valid")
});
static XML_ENTITY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"&(?:#x([0-9a-fA-F]+)|#([0-9]+)|(lt|gt|quot|apos|amp));")
        .expect("entity pattern is valid")
});

/// Resolve the document type from `filename` and extract its text.
pub fn parse_document(bytes: &[u8], filename: &str) -> Result<(String, DocumentType)> {
    let file_type = DocumentType::from_filename(filename).ok_or_else(|| {
        Error::UnsupportedDocument(format!(
            "File type not supported. Allowed types: {}",
            DocumentType::ALLOWED_EXTENSIONS.join(", ")
        ))
    })?;

    let content = match file_type {
        DocumentType::Md | DocumentType::Txt => decode_text(bytes),
        DocumentType::Docx => decode_docx(bytes)?,
        DocumentType::Pdf => decode_pdf(bytes)?,
    };

    tracing::debug!(
        "Extracted {} chars from {} ({})",
        content.chars().count(),
        filename,
        file_type.as_str()
    );

    Ok((content, file_type))
}

/// UTF-8, or Latin-1 when the bytes are not valid UTF-8.
pub fn decode_text(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(text) => text.to_string(),
        Err(_) => bytes.iter().map(|&b| b as char).collect(),
    }
}

fn decode_docx(bytes: &[u8]) -> Result<String> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| Error::DocumentDecode(format!("Invalid .docx container: {}", e)))?;

    let mut xml = String::new();
    archive
        .by_name("word/document.xml")
        .map_err(|e| Error::DocumentDecode(format!("Missing word/document.xml: {}", e)))?
        .read_to_string(&mut xml)?;

    Ok(docx_paragraphs(&xml).join("\n"))
}

fn docx_paragraphs(xml: &str) -> Vec<String> {
    DOCX_PARAGRAPH
        .find_iter(xml)
        .map(|paragraph| {
            DOCX_TEXT_RUN
                .captures_iter(paragraph.as_str())
                .map(|run| match run.get(1) {
                    Some(text) => unescape_xml(text.as_str()),
                    None if run[0].starts_with("<w:tab") => "\t".to_string(),
                    None => "\n".to_string(),
                })
                .collect::<String>()
        })
        .collect()
}

/// Decode the predefined XML entities and numeric character references in
/// one pass. References to invalid code points are left as written.
fn unescape_xml(text: &str) -> String {
    XML_ENTITY
        .replace_all(text, |caps: &regex::Captures<'_>| {
            let code_point = match (caps.get(1), caps.get(2)) {
                (Some(hex), _) => u32::from_str_radix(hex.as_str(), 16).ok(),
                (None, Some(decimal)) => decimal.as_str().parse().ok(),
                (None, None) => {
                    return match &caps[3] {
                        "lt" => "<",
                        "gt" => ">",
                        "quot" => "\"",
                        "apos" => "'",
                        _ => "&",
                    }
                    .to_string();
                }
            };
            code_point
                .and_then(char::from_u32)
                .map(String::from)
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

fn decode_pdf(bytes: &[u8]) -> Result<String> {
    let document = lopdf::Document::load_mem(bytes)
        .map_err(|e| Error::DocumentDecode(format!("Invalid PDF: {}", e)))?;

    let pages: Vec<u32> = document.get_pages().keys().copied().collect();
    let mut text = Vec::with_capacity(pages.len());
    for page in pages {
        match document.extract_text(&[page]) {
            Ok(page_text) => text.push(page_text),
            Err(e) => tracing::warn!("Skipping unreadable PDF page {}: {}", page, e),
        }
    }

    Ok(text.join("\n"))
}
