use std::any::Any;
use std::collections::BTreeMap;
use std::panic::{self, AssertUnwindSafe};

use encoding_rs::{BIG5, UTF_16BE};
use lopdf::content::Content;
use lopdf::{Document, Object};
use tracing::debug;

use crate::error::ExtractError;
use crate::model::PageText;
use crate::options::PageSelection;
use crate::table_parse::{soft_split_line_into_cells, split_line_into_cells};

const ENCRYPT_KEY: &[u8] = b"/Encrypt";

/// Text of the selected pages plus the document-level text, when the
/// whole-document extractor produced any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct DocumentText {
    pub pages: Vec<PageText>,
    pub full_text: Option<String>,
}

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

    let has_bom = bytes.starts_with(&[0xFE, 0xFF]) || bytes.starts_with(&[0xFF, 0xFE]);
    let lower = encoding.map(str::to_ascii_lowercase).unwrap_or_default();
    let wants_utf16 = has_bom || ["utf16", "ucs2", "identity-h", "unicode"]
        .iter()
        .any(|hint| lower.contains(hint));

    if wants_utf16 {
        let body = if has_bom && bytes.len() > 2 { &bytes[2..] } else { bytes };
        let (utf16, had_errors) = UTF_16BE.decode_without_bom_handling(body);
        if !had_errors && !utf16.is_empty() {
            return utf16.into_owned();
        }
    }

    if ["big5", "b5", "eten", "cns"].iter().any(|hint| lower.contains(hint)) {
        let (big5, _, had_errors) = BIG5.decode(bytes);
        if !had_errors && !big5.is_empty() {
            return big5.into_owned();
        }
    }

    String::from_utf8_lossy(bytes).into_owned()
}

/// Scores how table-like a page text looks; higher wins.
fn extraction_quality_score(text: &str) -> i64 {
    if text.trim().is_empty() {
        return i64::MIN / 4;
    }

    let mut non_empty_lines = 0_i64;
    let mut multi_cell_lines = 0_i64;
    let mut numeric_lines = 0_i64;

    for line in text.lines().map(str::trim).filter(|line| !line.is_empty()) {
        non_empty_lines += 1;

        if split_line_into_cells(line).len() >= 2 || soft_split_line_into_cells(line).len() >= 3 {
            multi_cell_lines += 1;
        }
        if line.chars().any(|ch| ch.is_ascii_digit()) {
            numeric_lines += 1;
        }
    }

    let broken_penalty = if looks_decoding_broken(text) { 800 } else { 0 };
    multi_cell_lines * 50 + numeric_lines * 15 + non_empty_lines - broken_penalty
}

fn choose_best_text(candidates: Vec<String>) -> String {
    candidates
        .into_iter()
        .max_by_key(|text| extraction_quality_score(text))
        .unwrap_or_default()
}

fn extract_text_from_page_content(document: &Document, page_id: lopdf::ObjectId) -> Option<String> {
    fn collect_text(text: &mut String, encoding: Option<&str>, operands: &[Object]) {
        for operand in operands {
            match operand {
                Object::String(bytes, _) => text.push_str(&decode_pdf_bytes(encoding, bytes)),
                Object::Array(items) => {
                    collect_text(text, encoding, items);
                    text.push(' ');
                }
                Object::Integer(value) if *value < -100 => text.push(' '),
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
                current_encoding = operation
                    .operands
                    .first()
                    .and_then(|operand| operand.as_name().ok())
                    .and_then(|font_name| encodings.get(font_name).copied());
            }
            "Tj" | "TJ" | "'" | "\"" => {
                collect_text(&mut current, current_encoding, &operation.operands);
            }
            "T*" | "Td" | "TD" | "ET" => {
                if !current.trim().is_empty() {
                    lines.push(std::mem::take(&mut current));
                }
                current.clear();
            }
            _ => {}
        }
    }

    if !current.trim().is_empty() {
        lines.push(current);
    }

    (!lines.is_empty()).then(|| lines.join("\n"))
}

/// Whether the raw bytes carry an encryption dictionary reference.
pub(crate) fn has_encrypt_entry(input_pdf: &[u8]) -> bool {
    input_pdf
        .windows(ENCRYPT_KEY.len())
        .any(|window| window == ENCRYPT_KEY)
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|message| (*message).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}

/// Runs a call into the PDF libraries, reporting a panic on malformed input
/// as an extraction failure.
fn guard_parser<T>(
    call: impl FnOnce() -> Result<T, ExtractError>,
) -> Result<T, ExtractError> {
    panic::catch_unwind(AssertUnwindSafe(call)).unwrap_or_else(|payload| {
        Err(ExtractError::PdfExtract(format!(
            "PDF parser panicked: {}",
            panic_message(&*payload)
        )))
    })
}

fn load_document(input_pdf: &[u8]) -> Result<Document, ExtractError> {
    let mut document = match guard_parser(|| Ok(Document::load_mem(input_pdf)?)) {
        Ok(document) => document,
        Err(error) if has_encrypt_entry(input_pdf) => {
            debug!(%error, "PDF with an encryption dictionary failed to load");
            return Err(ExtractError::Encrypted);
        }
        Err(error) => return Err(error),
    };

    // Owner-password-only documents open with the empty user password.
    if document.trailer.get(b"Encrypt").is_ok() {
        if let Err(error) = guard_parser(|| Ok(document.decrypt("")?)) {
            debug!(%error, "PDF cannot be opened with the empty user password");
            return Err(ExtractError::Encrypted);
        }
        debug!("PDF decrypted with the empty user password");
    }
    Ok(document)
}

fn extract_whole_text(input_pdf: &[u8]) -> Result<String, ExtractError> {
    guard_parser(|| {
        pdf_extract::extract_text_from_mem(input_pdf)
            .map_err(|error| ExtractError::PdfExtract(error.to_string()))
    })
}

/// Reads the text of every selected page, picking the most table-like of the
/// available text extractions for each page.
pub(crate) fn read_pdf_text(
    input_pdf: &[u8],
    page_selection: Option<&PageSelection>,
) -> Result<DocumentText, ExtractError> {
    let document = load_document(input_pdf)?;
    let pages_map = document.get_pages();

    let whole_text = match extract_whole_text(input_pdf) {
        Ok(text) => Some(text),
        Err(error) => {
            debug!(%error, "pdf-extract could not read the document");
            None
        }
    };
    let per_page = whole_text
        .as_deref()
        .map(split_text_into_pages)
        .filter(|pages| pages.len() == pages_map.len());

    let mut pages = Vec::new();
    for (index, (page_no, page_id)) in pages_map.iter().enumerate() {
        if page_selection.is_some_and(|selection| !selection.contains(*page_no)) {
            continue;
        }

        let mut candidates = Vec::new();
        if let Some(text) = per_page
            .as_ref()
            .and_then(|texts| texts.get(index).cloned())
            .filter(|text| !text.trim().is_empty())
        {
            candidates.push(text);
        }
        match guard_parser(|| Ok(extract_text_from_page_content(&document, *page_id))) {
            Ok(Some(text)) => candidates.push(text),
            Ok(None) => {}
            Err(error) => debug!(%error, page = *page_no, "content stream walk failed"),
        }
        match guard_parser(|| Ok(document.extract_text(&[*page_no])?)) {
            Ok(text) if !text.trim().is_empty() => candidates.push(text),
            Ok(_) => {}
            Err(error) => debug!(%error, page = *page_no, "lopdf text extraction failed"),
        }

        pages.push(PageText {
            page_number: *page_no,
            text: choose_best_text(candidates),
        });
    }

    if pages.is_empty() {
        return Err(ExtractError::NoPagesSelected);
    }

    // Whole-document text only matters when it could not be split per page.
    let full_text = if per_page.is_some() { None } else { whole_text };
    Ok(DocumentText { pages, full_text })
}
