//! # docsift
//!
//! Scrape web pages and summarise PDF documents with an OpenAI-compatible
//! chat-completion provider (Groq by default).
//!
//! ## Pipeline Overview
//!
//! ```text
//! URL ──────────┐
//!               ├─ 1. Extract   web page → visible text + title
//! PDF bytes ────┘               PDF → concatenated page text (spawn_blocking)
//!  │
//!  ├─ 2. Prompt    cap at the truncation budget, prepend the summary prefix
//!  ├─ 3. Complete  one chat-completion call, failures classified
//!  └─ 4. Merge     success / partial / error, extracted text always kept
//! ```
//!
//! A completion failure never throws away a successful extraction: the
//! result comes back as `partial` with the extracted text and the error.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use docsift::{AnalysisConfig, Analyzer, DocumentUpload};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = AnalysisConfig::builder()
//!         .api_key(std::env::var("GROQ_API_KEY")?)
//!         .build()?;
//!     let analyzer = Analyzer::from_config(&config)?;
//!
//!     let bytes = std::fs::read("report.pdf")?;
//!     let result = analyzer
//!         .analyze_document(DocumentUpload::new(bytes).with_filename("report.pdf"))
//!         .await;
//!     println!("{}", serde_json::to_string_pretty(&result)?);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `docsift` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! docsift = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod analyze;
pub mod config;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod prompts;
pub mod server;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use analyze::{build_http_client, Analyzer, DocumentUpload, Stage};
pub use config::{AnalysisConfig, AnalysisConfigBuilder};
pub use error::{BadRequestError, CompletionError, DocsiftError, ExtractionError};
pub use output::{
    AnalysisResult, AnalysisStatus, CompletionOutcome, Diagnostics, ExtractionResult,
    ScrapeOutput, SourceKind,
};
pub use pipeline::document::DocumentInfo;
pub use pipeline::llm::{ChatCompletionClient, CompletionClient, CompletionSettings};
pub use pipeline::web::WebExtractor;
pub use server::{create_router, serve, AppState};
