//! Result types produced by the pipeline.
//!
//! Every value here is built once per request and never mutated afterwards;
//! each stage builds a new value from the previous one.

use crate::error::{BadRequestError, CompletionError, ExtractionError};
use serde::{Deserialize, Serialize};

/// Where extracted text came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Web,
    Document,
}

/// Plain text recovered from a web page or document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionResult {
    /// Flattened text. For web pages the title is not part of it.
    pub text: String,
    pub source_kind: SourceKind,
    /// `<title>` of a web page; always `None` for documents.
    pub title: Option<String>,
    /// Number of pages; only set for documents.
    pub page_count: Option<usize>,
}

/// Generated text from a successful completion call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionOutcome {
    pub content: String,
}

/// Overall outcome of an analysis request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisStatus {
    /// Extraction and completion both succeeded.
    Success,
    /// Extraction succeeded, completion failed.
    Partial,
    /// Extraction failed; no completion was attempted.
    Error,
}

/// Facts about an uploaded file, attached when its analysis fails.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostics {
    pub filename: Option<String>,
    pub size: usize,
    pub content_type: Option<String>,
}

/// Final, merged result of an analysis request.
///
/// Construct with [`AnalysisResult::success`], [`AnalysisResult::partial`]
/// or one of the `failed_*` constructors; they keep `status` consistent
/// with which stages succeeded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub status: AnalysisStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extracted_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completion: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<String>,
    /// Pipeline stage where the failure happened.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http_status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagnostics: Option<Diagnostics>,
}

/// Shown next to a partial result.
pub const PARTIAL_WARNING: &str = "API call failed but text extraction was successful";

impl AnalysisResult {
    fn empty(status: AnalysisStatus) -> Self {
        Self {
            status,
            extracted_text: None,
            completion: None,
            error: None,
            warning: None,
            error_kind: None,
            location: None,
            http_status: None,
            page_count: None,
            diagnostics: None,
        }
    }

    /// Both stages succeeded.
    pub fn success(extraction: Option<ExtractionResult>, outcome: CompletionOutcome) -> Self {
        let page_count = extraction.as_ref().and_then(|e| e.page_count);
        Self {
            extracted_text: extraction.map(|e| e.text),
            completion: Some(outcome.content),
            page_count,
            ..Self::empty(AnalysisStatus::Success)
        }
    }

    /// Completion failed after extraction succeeded; the text is kept.
    pub fn partial(
        extraction: Option<ExtractionResult>,
        error: &CompletionError,
        location: &str,
        diagnostics: Option<Diagnostics>,
    ) -> Self {
        let page_count = extraction.as_ref().and_then(|e| e.page_count);
        Self {
            extracted_text: extraction.map(|e| e.text),
            error: Some(error.to_string()),
            warning: Some(PARTIAL_WARNING.to_string()),
            error_kind: Some(error.kind().to_string()),
            location: Some(location.to_string()),
            http_status: error.http_status(),
            page_count,
            diagnostics,
            ..Self::empty(AnalysisStatus::Partial)
        }
    }

    /// Extraction failed.
    pub fn failed_extraction(
        error: &ExtractionError,
        location: &str,
        diagnostics: Option<Diagnostics>,
    ) -> Self {
        Self {
            error: Some(format!("Failed to process PDF: {error}")),
            error_kind: Some(error.kind().to_string()),
            location: Some(location.to_string()),
            diagnostics,
            ..Self::empty(AnalysisStatus::Error)
        }
    }

    /// Extraction produced nothing worth analysing.
    pub fn failed_input(
        error: BadRequestError,
        location: &str,
        page_count: Option<usize>,
        diagnostics: Option<Diagnostics>,
    ) -> Self {
        Self {
            error: Some(error.to_string()),
            error_kind: Some(error.kind().to_string()),
            location: Some(location.to_string()),
            page_count,
            diagnostics,
            ..Self::empty(AnalysisStatus::Error)
        }
    }

    /// Text shown as the single `response` field of the text-analysis route:
    /// the completion on success, the error summary otherwise.
    pub fn response_text(&self) -> &str {
        self.completion
            .as_deref()
            .or(self.error.as_deref())
            .unwrap_or_default()
    }
}

/// Result of the scrape-only flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ScrapeOutput {
    Success { title: String, content: String },
    Error { message: String },
}

impl ScrapeOutput {
    pub fn is_success(&self) -> bool {
        matches!(self, ScrapeOutput::Success { .. })
    }
}
