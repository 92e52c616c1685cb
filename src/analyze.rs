//! Request orchestration: compose the pipeline stages per flow and merge
//! their outcomes into one result.
//!
//! Three flows are supported:
//!
//! * [`Analyzer::scrape`]: URL → web extraction → [`ScrapeOutput`]; no completion call.
//! * [`Analyzer::analyze_text`]: caller text, sent verbatim → completion.
//! * [`Analyzer::analyze_document`]: PDF bytes → extraction → prompt (truncated,
//!   prefixed) → completion.
//!
//! Every request walks the [`Stage`] sequence once. A failure jumps straight
//! to [`Stage::Responded`] carrying whatever was produced so far: an
//! extraction that succeeded is never dropped because the completion after it
//! failed. Each transition is emitted as a structured `tracing` event. Pipeline
//! stages never log; only this module and [`crate::server`] do.

use crate::config::AnalysisConfig;
use crate::error::{BadRequestError, CompletionError, DocsiftError, ExtractionError};
use crate::output::{AnalysisResult, Diagnostics, ExtractionResult, ScrapeOutput};
use crate::pipeline::document::{self, DocumentInfo};
use crate::pipeline::llm::{ChatCompletionClient, CompletionClient, CompletionSettings};
use crate::pipeline::prompt::{build_prompt, PromptSpec};
use crate::pipeline::web::WebExtractor;
use std::fmt;
use std::io::Cursor;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Per-request pipeline state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Received,
    Extracting,
    ExtractFailed,
    Extracted,
    Prompting,
    Completing,
    CompleteFailed,
    Completed,
    Responded,
}

impl Stage {
    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Received => "received",
            Stage::Extracting => "extracting",
            Stage::ExtractFailed => "extract_failed",
            Stage::Extracted => "extracted",
            Stage::Prompting => "prompting",
            Stage::Completing => "completing",
            Stage::CompleteFailed => "complete_failed",
            Stage::Completed => "completed",
            Stage::Responded => "responded",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An uploaded document plus what the client told us about it.
#[derive(Debug, Clone, Default)]
pub struct DocumentUpload {
    pub bytes: Vec<u8>,
    pub filename: Option<String>,
    pub content_type: Option<String>,
}

impl DocumentUpload {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: bytes.into(),
            ..Default::default()
        }
    }

    pub fn with_filename(mut self, name: impl Into<String>) -> Self {
        self.filename = Some(name.into());
        self
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn diagnostics(&self) -> Diagnostics {
        Diagnostics {
            filename: self.filename.clone(),
            size: self.bytes.len(),
            content_type: self.content_type.clone(),
        }
    }
}

/// Timer and labels for one request's stage events.
struct StageLog {
    flow: &'static str,
    start: Instant,
}

impl StageLog {
    fn begin(flow: &'static str) -> Self {
        let log = Self {
            flow,
            start: Instant::now(),
        };
        log.enter(Stage::Received);
        log
    }

    fn elapsed_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }

    fn enter(&self, stage: Stage) {
        debug!(flow = self.flow, stage = %stage, elapsed_ms = self.elapsed_ms(), "stage");
    }

    fn extracted(&self, result: &ExtractionResult) {
        info!(
            flow = self.flow,
            stage = %Stage::Extracted,
            elapsed_ms = self.elapsed_ms(),
            chars = result.text.chars().count(),
            pages = ?result.page_count,
            "Extraction succeeded"
        );
    }

    fn extract_failed(&self, error: &ExtractionError) {
        warn!(
            flow = self.flow,
            stage = %Stage::ExtractFailed,
            elapsed_ms = self.elapsed_ms(),
            kind = error.kind(),
            "Extraction failed: {error}"
        );
    }

    fn completed(&self, content: &str) {
        info!(
            flow = self.flow,
            stage = %Stage::Completed,
            elapsed_ms = self.elapsed_ms(),
            chars = content.chars().count(),
            "Completion succeeded"
        );
    }

    fn complete_failed(&self, error: &CompletionError) {
        if let CompletionError::Provider { http_status, body, .. } = error {
            warn!(
                flow = self.flow,
                stage = %Stage::CompleteFailed,
                http_status,
                "Provider error response: {body}"
            );
        }
        warn!(
            flow = self.flow,
            stage = %Stage::CompleteFailed,
            elapsed_ms = self.elapsed_ms(),
            kind = error.kind(),
            "Completion failed: {error}"
        );
    }

    fn responded(&self, status: &str) {
        info!(
            flow = self.flow,
            stage = %Stage::Responded,
            elapsed_ms = self.elapsed_ms(),
            status,
            "Request finished"
        );
    }
}

/// Build the HTTP client shared by web extraction and completion calls.
pub fn build_http_client() -> Result<reqwest::Client, DocsiftError> {
    reqwest::Client::builder()
        .user_agent(concat!("docsift/", env!("CARGO_PKG_VERSION")))
        .redirect(reqwest::redirect::Policy::limited(5))
        .build()
        .map_err(|e| DocsiftError::HttpClient(e.to_string()))
}

/// Composes extraction, prompt building and completion per request.
///
/// Holds no per-request state; share one instance behind an `Arc`.
pub struct Analyzer {
    web: WebExtractor,
    completion: Arc<dyn CompletionClient>,
    truncation_budget: usize,
    summary_prefix: Option<String>,
}

impl fmt::Debug for Analyzer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Analyzer")
            .field("web", &self.web)
            .field("completion", &self.completion.model())
            .field("truncation_budget", &self.truncation_budget)
            .field("summary_prefix", &self.summary_prefix)
            .finish()
    }
}

impl Analyzer {
    /// Assemble an analyzer from already-built collaborators.
    pub fn new(
        web: WebExtractor,
        completion: Arc<dyn CompletionClient>,
        config: &AnalysisConfig,
    ) -> Self {
        Self {
            web,
            completion,
            truncation_budget: config.truncation_budget,
            summary_prefix: Some(config.summary_prefix.clone()).filter(|p| !p.is_empty()),
        }
    }

    /// Build the HTTP client and both network-facing stages from `config`.
    pub fn from_config(config: &AnalysisConfig) -> Result<Self, DocsiftError> {
        let client = build_http_client()?;
        let web = WebExtractor::new(
            client.clone(),
            Duration::from_secs(config.fetch_timeout_secs),
        );
        let completion = ChatCompletionClient::new(client, CompletionSettings::from(config));

        info!(
            api_url = %config.api_url,
            model = %config.model,
            api_key = %config.masked_api_key(),
            truncation_budget = config.truncation_budget,
            "Completion client ready"
        );

        Ok(Self::new(web, Arc::new(completion), config))
    }

    /// Fetch `url` and return its title and text. Never calls the provider.
    pub async fn scrape(&self, url: &str) -> ScrapeOutput {
        let log = StageLog::begin("scrape");
        log.enter(Stage::Extracting);

        let output = match self.web.extract_from_url(url).await {
            Ok(page) => {
                log.extracted(&page);
                ScrapeOutput::Success {
                    title: page.title.unwrap_or_default(),
                    content: page.text,
                }
            }
            Err(e) => {
                log.extract_failed(&e);
                ScrapeOutput::Error {
                    message: e.to_string(),
                }
            }
        };

        log.responded(if output.is_success() { "success" } else { "error" });
        output
    }

    /// Send caller-supplied text to the provider, unmodified.
    ///
    /// Returns `Err` only for blank input; completion failures become a
    /// `partial` result.
    pub async fn analyze_text(&self, text: &str) -> Result<AnalysisResult, BadRequestError> {
        let log = StageLog::begin("analyze_text");

        if text.trim().is_empty() {
            warn!(flow = "analyze_text", "Rejected blank input");
            log.responded("bad_request");
            return Err(BadRequestError::EmptyInput);
        }
        debug!(flow = "analyze_text", chars = text.chars().count(), "Text received");

        let result = self.complete(&log, text, None, None).await;
        log.responded(status_label(&result));
        Ok(result)
    }

    /// Extract text from an uploaded PDF and ask the provider to summarise it.
    ///
    /// Always returns a result; extraction failures are reported inside it
    /// together with the upload's [`Diagnostics`].
    pub async fn analyze_document(&self, upload: DocumentUpload) -> AnalysisResult {
        let log = StageLog::begin("analyze_document");
        let diagnostics = upload.diagnostics();
        info!(
            flow = log.flow,
            filename = ?diagnostics.filename,
            size = diagnostics.size,
            content_type = ?diagnostics.content_type,
            "Processing document"
        );

        // ── Step 1: Extract ──────────────────────────────────────────────
        log.enter(Stage::Extracting);
        let extraction = match extract_blocking(upload.bytes).await {
            Ok(extraction) => extraction,
            Err(e) => {
                log.extract_failed(&e);
                let result = AnalysisResult::failed_extraction(
                    &e,
                    Stage::Extracting.as_str(),
                    Some(diagnostics),
                );
                log.responded(status_label(&result));
                return result;
            }
        };
        log.extracted(&extraction);

        if extraction.text.trim().is_empty() {
            warn!(flow = log.flow, "Document contains no extractable text");
            let result = AnalysisResult::failed_input(
                BadRequestError::NoExtractableText,
                Stage::Extracted.as_str(),
                extraction.page_count,
                Some(diagnostics),
            );
            log.responded(status_label(&result));
            return result;
        }

        // ── Step 2: Build prompt ─────────────────────────────────────────
        log.enter(Stage::Prompting);
        let built = build_prompt(&PromptSpec {
            raw_text: extraction.text.clone(),
            max_length: self.truncation_budget,
            prefix: self.summary_prefix.clone(),
        });
        if built.truncated() {
            info!(
                flow = log.flow,
                stage = %Stage::Prompting,
                original_chars = built.original_len,
                kept_chars = built.kept_len,
                "Text truncated for completion call"
            );
        }

        // ── Step 3: Complete and merge ───────────────────────────────────
        let result = self
            .complete(&log, &built.prompt, Some(extraction), Some(diagnostics))
            .await;
        log.responded(status_label(&result));
        result
    }

    /// Page count, version and encryption state of a PDF. No provider call.
    pub async fn inspect_document(&self, bytes: Vec<u8>) -> Result<DocumentInfo, ExtractionError> {
        tokio::task::spawn_blocking(move || document::inspect(&bytes))
            .await
            .unwrap_or_else(|e| {
                Err(ExtractionError::CorruptContent {
                    detail: format!("inspection task failed: {e}"),
                })
            })
    }

    async fn complete(
        &self,
        log: &StageLog,
        prompt: &str,
        extraction: Option<ExtractionResult>,
        diagnostics: Option<Diagnostics>,
    ) -> AnalysisResult {
        log.enter(Stage::Completing);
        debug!(
            flow = log.flow,
            model = self.completion.model(),
            prompt_chars = prompt.chars().count(),
            "Sending completion request"
        );

        match self.completion.complete(prompt).await {
            Ok(outcome) => {
                log.completed(&outcome.content);
                AnalysisResult::success(extraction, outcome)
            }
            Err(e) => {
                log.complete_failed(&e);
                AnalysisResult::partial(extraction, &e, Stage::Completing.as_str(), diagnostics)
            }
        }
    }
}

/// Run document extraction on the blocking pool.
///
/// A panic inside the parser is reported as corrupt content.
async fn extract_blocking(bytes: Vec<u8>) -> Result<ExtractionResult, ExtractionError> {
    tokio::task::spawn_blocking(move || document::extract_from_reader(Cursor::new(bytes)))
        .await
        .unwrap_or_else(|e| {
            Err(ExtractionError::CorruptContent {
                detail: format!("extraction task failed: {e}"),
            })
        })
}

fn status_label(result: &AnalysisResult) -> &'static str {
    match result.status {
        crate::output::AnalysisStatus::Success => "success",
        crate::output::AnalysisStatus::Partial => "partial",
        crate::output::AnalysisStatus::Error => "error",
    }
}
