//! Error types for the docsift library.
//!
//! Errors are split by the pipeline stage that produces them:
//!
//! * [`ExtractionError`]: turning a URL or an uploaded document into text failed.
//! * [`CompletionError`]: the chat-completion call failed or was refused locally.
//! * [`BadRequestError`]: the caller sent nothing worth analysing.
//!
//! None of these escape a request: the orchestrator in [`crate::analyze`]
//! folds each one into a structured result field at the stage boundary where
//! it happened. Only [`DocsiftError`] is returned as a hard `Err`, and only
//! from setup paths (config validation, client construction, server start).

use std::net::SocketAddr;
use thiserror::Error;

/// Fatal, non-request errors: the service cannot be set up or started.
#[derive(Debug, Error)]
pub enum DocsiftError {
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The shared HTTP client could not be constructed.
    #[error("Failed to build HTTP client: {0}")]
    HttpClient(String),

    /// The server could not bind its listening socket.
    #[error("Failed to bind {addr}: {source}\nIs another process already listening there?")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    /// The server stopped with an I/O error.
    #[error("Server error: {0}")]
    Server(String),
}

/// Failure to turn a source (web page or uploaded document) into plain text.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ExtractionError {
    // ── Web errors ────────────────────────────────────────────────────────
    /// The input is not an absolute `http`/`https` URL.
    #[error("Invalid URL '{input}': {reason}")]
    InvalidUrl { input: String, reason: String },

    /// Network failure, timeout or non-2xx status while fetching the page.
    #[error("Failed to fetch '{url}': {reason}")]
    FetchError { url: String, reason: String },

    // ── Document errors ───────────────────────────────────────────────────
    /// The bytes do not start with the `%PDF-` signature.
    #[error("Not a valid PDF file (missing PDF header); first bytes: {magic:?}")]
    InvalidFormat { magic: Vec<u8> },

    /// The header is present but the document could not be parsed.
    #[error("PDF is corrupt: {detail}")]
    CorruptContent { detail: String },

    /// The document is encrypted and cannot be read without a password.
    #[error("PDF is encrypted")]
    Encrypted,

    /// The document parsed but has no pages.
    #[error("PDF has no pages")]
    EmptyDocument,
}

impl ExtractionError {
    /// Stable snake_case identifier, used as `error_kind` in results.
    pub fn kind(&self) -> &'static str {
        match self {
            ExtractionError::InvalidUrl { .. } => "invalid_url",
            ExtractionError::FetchError { .. } => "fetch_error",
            ExtractionError::InvalidFormat { .. } => "invalid_format",
            ExtractionError::CorruptContent { .. } => "corrupt_content",
            ExtractionError::Encrypted => "encrypted",
            ExtractionError::EmptyDocument => "empty_document",
        }
    }
}

/// Failure of a single chat-completion exchange.
///
/// The `Display` output is what callers see in merged results. It never
/// contains the provider credential or the raw provider response body.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CompletionError {
    /// Blank prompt, rejected before any network call.
    #[error("Error: Empty prompt provided")]
    EmptyPrompt,

    /// Missing or blank credential, rejected before any network call.
    #[error("Error: API key not configured ({detail})")]
    Configuration { detail: String },

    /// Connection failure or timeout.
    #[error("Error: request to completion provider failed: {message}")]
    Transport { message: String },

    /// The provider answered with a non-2xx status.
    ///
    /// `body` is kept for diagnostics and logging only.
    #[error("Error: {http_status} - {message}")]
    Provider {
        http_status: u16,
        message: String,
        body: String,
    },

    /// A 2xx answer whose body is not a chat-completion payload.
    #[error("Error: malformed completion response: {detail}")]
    MalformedResponse { detail: String },
}

impl CompletionError {
    /// Stable snake_case identifier, used as `error_kind` in results.
    pub fn kind(&self) -> &'static str {
        match self {
            CompletionError::EmptyPrompt => "empty_prompt",
            CompletionError::Configuration { .. } => "configuration",
            CompletionError::Transport { .. } => "transport",
            CompletionError::Provider { .. } => "provider",
            CompletionError::MalformedResponse { .. } => "malformed_response",
        }
    }

    /// HTTP status returned by the provider, when there was one.
    pub fn http_status(&self) -> Option<u16> {
        match self {
            CompletionError::Provider { http_status, .. } => Some(*http_status),
            _ => None,
        }
    }
}

/// The request carries no usable input.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum BadRequestError {
    /// Text to analyse is missing, empty or whitespace only.
    #[error("No text provided for analysis")]
    EmptyInput,

    /// The document was read but yielded only whitespace.
    #[error("No text could be extracted from the PDF")]
    NoExtractableText,

    /// No file part, or a zero-length file, was uploaded.
    #[error("No file uploaded or file is empty")]
    MissingUpload,
}

impl BadRequestError {
    /// Stable snake_case identifier, used as `error_kind` in results.
    pub fn kind(&self) -> &'static str {
        match self {
            BadRequestError::EmptyInput => "empty_input",
            BadRequestError::NoExtractableText => "no_extractable_text",
            BadRequestError::MissingUpload => "missing_upload",
        }
    }
}
