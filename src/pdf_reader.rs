use std::collections::BTreeMap;
use std::path::Path;

use encoding_rs::UTF_16BE;
use lopdf::Document;
use lopdf::Object;
use lopdf::content::Content;
use tracing::debug;

use crate::error::DocmapError;
use crate::model::{PageText, PageTextSource};
use crate::toc_detect::looks_like_toc_line;

fn split_text_into_pages(raw_text: &str) -> Vec<String> {
    let mut pages = raw_text
        .split('\u{000C}')
        .map(str::to_string)
        .collect::<Vec<_>>();
    if pages.last().is_some_and(String::is_empty) {
        pages.pop();
    }
    pages
}

fn looks_decoding_broken(text: &str) -> bool {
    if text.contains("?Identity-H Unimplemented?") {
        return true;
    }

    let total = text.chars().count();
    if total == 0 {
        return false;
    }

    let replacement = text.matches('\u{FFFD}').count();
    let control = text
        .chars()
        .filter(|ch| ch.is_control() && !matches!(ch, '\n' | '\r' | '\t'))
        .count();

    replacement * 8 > total || control * 5 > total
}

fn decode_pdf_bytes(encoding: Option<&str>, bytes: &[u8]) -> String {
    let decoded = Document::decode_text(encoding, bytes);
    if !looks_decoding_broken(&decoded) {
        return decoded;
    }

    let utf16_hint = encoding.is_some_and(|name| {
        let lower = name.to_ascii_lowercase();
        lower.contains("utf16") || lower.contains("ucs2") || lower.contains("identity-h")
    });
    let has_bom = bytes.starts_with(&[0xFE, 0xFF]);
    if has_bom || utf16_hint {
        let payload = if has_bom { &bytes[2..] } else { bytes };
        let (utf16, had_errors) = UTF_16BE.decode_without_bom_handling(payload);
        if !had_errors && !utf16.is_empty() {
            return utf16.into_owned();
        }
    }

    String::from_utf8_lossy(bytes).to_string()
}

/// Higher is better: many non-empty lines, leader lines count extra,
/// broken decoding is heavily penalized.
fn extraction_quality_score(text: &str) -> i64 {
    if text.trim().is_empty() {
        return i64::MIN / 4;
    }

    let mut non_empty_lines = 0_i64;
    let mut leader_lines = 0_i64;
    for line in text.lines().map(str::trim).filter(|line| !line.is_empty()) {
        non_empty_lines += 1;
        if looks_like_toc_line(line) {
            leader_lines += 1;
        }
    }

    let broken_penalty = if looks_decoding_broken(text) { 800 } else { 0 };
    leader_lines * 10 + non_empty_lines - broken_penalty
}

fn choose_best_text(candidates: Vec<String>) -> String {
    // Earlier candidates win ties.
    candidates
        .into_iter()
        .rev()
        .max_by_key(|text| extraction_quality_score(text))
        .unwrap_or_default()
}

fn extract_text_from_page_content(document: &Document, page_id: lopdf::ObjectId) -> Option<String> {
    fn collect_text(text: &mut String, encoding: Option<&str>, operands: &[Object]) {
        for operand in operands {
            match operand {
                Object::String(bytes, _) => {
                    text.push_str(&decode_pdf_bytes(encoding, bytes));
                }
                Object::Array(items) => {
                    collect_text(text, encoding, items);
                }
                Object::Integer(value) => {
                    if *value < -100 {
                        text.push(' ');
                    }
                }
                _ => {}
            }
        }
    }

    let raw_content = document.get_page_content(page_id).ok()?;
    let content = Content::decode(&raw_content).ok()?;
    let encodings = document
        .get_page_fonts(page_id)
        .into_iter()
        .map(|(name, font)| (name, font.get_font_encoding()))
        .collect::<BTreeMap<Vec<u8>, &str>>();

    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_encoding = None;
    for operation in content.operations {
        match operation.operator.as_str() {
            "Tf" => {
                if let Some(font_name) = operation
                    .operands
                    .first()
                    .and_then(|operand| operand.as_name().ok())
                {
                    current_encoding = encodings.get(font_name).copied();
                }
            }
            "'" | "\"" => {
                if !current.trim().is_empty() {
                    lines.push(std::mem::take(&mut current));
                }
                collect_text(&mut current, current_encoding, &operation.operands);
            }
            "Tj" | "TJ" => {
                collect_text(&mut current, current_encoding, &operation.operands);
            }
            "T*" | "Td" | "TD" | "ET" => {
                if !current.trim().is_empty() {
                    lines.push(std::mem::take(&mut current));
                }
            }
            _ => {}
        }
    }

    if !current.trim().is_empty() {
        lines.push(current);
    }

    if lines.is_empty() {
        None
    } else {
        Some(lines.join("\n"))
    }
}

fn read_pages(document: &Document, pdf_extract_text: Option<String>) -> Vec<PageText> {
    let pages_map = document.get_pages();
    let pdf_extract_pages = pdf_extract_text
        .map(|text| split_text_into_pages(&text))
        .filter(|pages| pages.len() == pages_map.len());

    let mut pages = Vec::with_capacity(pages_map.len());
    for (index, (page_no, page_id)) in pages_map.iter().enumerate() {
        let mut candidates = Vec::new();
        if let Some(text) = extract_text_from_page_content(document, *page_id) {
            candidates.push(text);
        }
        if let Some(text) = document
            .extract_text(&[*page_no])
            .ok()
            .filter(|text| !text.trim().is_empty())
        {
            candidates.push(text);
        }
        if let Some(text) = pdf_extract_pages
            .as_ref()
            .and_then(|fallback| fallback.get(index).cloned())
            .filter(|text| !text.trim().is_empty())
        {
            candidates.push(text);
        }

        debug!(page = page_no, candidates = candidates.len(), "extracted page text");
        pages.push(PageText {
            page_number: *page_no,
            text: choose_best_text(candidates),
        });
    }
    pages
}

/// Page text of a PDF, extracted once up front.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdfPages {
    pages: Vec<PageText>,
}

impl PdfPages {
    pub fn open(input_pdf: &Path) -> Result<Self, DocmapError> {
        let document = Document::load(input_pdf)?;
        let whole_text = pdf_extract::extract_text(input_pdf).ok();
        Ok(Self {
            pages: read_pages(&document, whole_text),
        })
    }

    pub fn from_bytes(input_pdf: &[u8]) -> Result<Self, DocmapError> {
        let document = Document::load_mem(input_pdf)?;
        let whole_text = pdf_extract::extract_text_from_mem(input_pdf).ok();
        Ok(Self {
            pages: read_pages(&document, whole_text),
        })
    }

    #[must_use]
    pub fn pages(&self) -> &[PageText] {
        &self.pages
    }
}

impl PageTextSource for PdfPages {
    fn page_count(&self) -> u32 {
        self.pages.page_count()
    }

    fn extract_text(&self, page_number: u32) -> Result<String, DocmapError> {
        self.pages.extract_text(page_number)
    }
}
