//! Document extraction: uploaded PDF bytes → plain text.
//!
//! ## Why peek first?
//!
//! A parser failure alone cannot tell "this is not a PDF" from "this is a
//! broken PDF". We read the first [`HEADER_LEN`] bytes once, before any
//! parsing, and only hand the buffer to `lopdf` when it starts with the
//! `%PDF-` signature. Bytes without it are [`ExtractionError::InvalidFormat`];
//! bytes with it that still fail to parse are
//! [`ExtractionError::CorruptContent`]. Nothing is ever rewound.
//!
//! Parsing is CPU-bound; callers on an async runtime should run these
//! functions through `tokio::task::spawn_blocking` (see [`crate::analyze`]).

use crate::error::ExtractionError;
use crate::output::{ExtractionResult, SourceKind};
use lopdf::Document;
use once_cell::sync::Lazy;
use regex::bytes::Regex;
use std::io::Read;

/// An `/Encrypt` trailer entry: an indirect reference or an inline dictionary.
static ENCRYPT_ENTRY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/Encrypt\s*(?:\d+\s+\d+\s+R|<<)").expect("valid regex"));

/// Signature every PDF file starts with.
pub const PDF_SIGNATURE: &[u8] = b"%PDF-";

/// Number of bytes inspected before parsing.
pub const HEADER_LEN: usize = PDF_SIGNATURE.len();

/// Structural facts about a document, without its text.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct DocumentInfo {
    pub page_count: usize,
    pub pdf_version: String,
    pub encrypted: bool,
    pub size: usize,
}

/// Extract text from a PDF read from `reader`.
///
/// The reader is consumed: it is dropped when this function returns, on
/// success and on every error path alike.
pub fn extract_from_reader<R: Read>(mut reader: R) -> Result<ExtractionResult, ExtractionError> {
    let mut buf = Vec::new();
    (&mut reader)
        .take(HEADER_LEN as u64)
        .read_to_end(&mut buf)
        .map_err(read_failed)?;
    check_header(&buf)?;

    reader.read_to_end(&mut buf).map_err(read_failed)?;
    extract_from_bytes(&buf)
}

/// Extract text from an in-memory PDF.
///
/// Pages are concatenated in page order exactly as `lopdf` renders them; no
/// separators are inserted between pages.
pub fn extract_from_bytes(bytes: &[u8]) -> Result<ExtractionResult, ExtractionError> {
    let doc = load(bytes)?;

    let pages = doc.get_pages();
    let mut text = String::new();
    for &page_num in pages.keys() {
        let page_text = doc
            .extract_text(&[page_num])
            .map_err(|e| ExtractionError::CorruptContent {
                detail: format!("page {page_num}: {e}"),
            })?;
        text.push_str(&page_text);
    }

    Ok(ExtractionResult {
        text,
        source_kind: SourceKind::Document,
        title: None,
        page_count: Some(pages.len()),
    })
}

/// Read page count, version and encryption state without extracting text.
///
/// Unlike [`extract_from_bytes`], an encrypted or empty document is not an
/// error here: it is reported in the returned [`DocumentInfo`].
pub fn inspect(bytes: &[u8]) -> Result<DocumentInfo, ExtractionError> {
    check_header(bytes)?;
    let doc = match Document::load_mem(bytes) {
        Ok(doc) => doc,
        Err(_) if has_encrypt_marker(bytes) => {
            return Ok(DocumentInfo {
                page_count: 0,
                pdf_version: version_from_header(bytes),
                encrypted: true,
                size: bytes.len(),
            })
        }
        Err(e) => {
            return Err(ExtractionError::CorruptContent {
                detail: e.to_string(),
            })
        }
    };

    Ok(DocumentInfo {
        page_count: doc.get_pages().len(),
        pdf_version: doc.version.clone(),
        encrypted: is_encrypted(&doc),
        size: bytes.len(),
    })
}

/// Classify the first bytes of an upload.
pub fn check_header(bytes: &[u8]) -> Result<(), ExtractionError> {
    if bytes.starts_with(PDF_SIGNATURE) {
        Ok(())
    } else {
        Err(ExtractionError::InvalidFormat {
            magic: bytes.iter().take(HEADER_LEN).copied().collect(),
        })
    }
}

/// Header check, parse, then reject encrypted and page-less documents.
fn load(bytes: &[u8]) -> Result<Document, ExtractionError> {
    check_header(bytes)?;

    let doc = Document::load_mem(bytes).map_err(|e| {
        // Some encrypted files fail to load outright rather than loading
        // with an /Encrypt trailer entry.
        if has_encrypt_marker(bytes) {
            ExtractionError::Encrypted
        } else {
            ExtractionError::CorruptContent {
                detail: e.to_string(),
            }
        }
    })?;

    if is_encrypted(&doc) {
        return Err(ExtractionError::Encrypted);
    }
    if doc.get_pages().is_empty() {
        return Err(ExtractionError::EmptyDocument);
    }
    Ok(doc)
}

fn is_encrypted(doc: &Document) -> bool {
    doc.trailer.get(b"Encrypt").is_ok()
}

/// Whether the last `trailer` section of a file declares encryption.
///
/// Only consulted when `lopdf` cannot load the file at all.
fn has_encrypt_marker(bytes: &[u8]) -> bool {
    let Some(start) = bytes
        .windows(b"trailer".len())
        .rposition(|w| w == b"trailer")
    else {
        return false;
    };
    ENCRYPT_ENTRY.is_match(&bytes[start..])
}

fn version_from_header(bytes: &[u8]) -> String {
    bytes[HEADER_LEN..]
        .iter()
        .take_while(|b| b.is_ascii_digit() || **b == b'.')
        .map(|&b| b as char)
        .collect()
}

fn read_failed(e: std::io::Error) -> ExtractionError {
    ExtractionError::CorruptContent {
        detail: format!("failed to read upload: {e}"),
    }
}
