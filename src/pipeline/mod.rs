//! Pipeline stages for scraping and document analysis.
//!
//! Each submodule implements exactly one transformation step and returns a
//! value; none of them log. Observability lives at the orchestrator boundary
//! in [`crate::analyze`].
//!
//! ## Data Flow
//!
//! ```text
//! web ──────┐
//!           ├──▶ prompt ──▶ llm
//! document ─┘
//! (URL/bytes)  (budget)    (chat completion)
//! ```
//!
//! 1. [`web`]: fetch a page, strip markup, keep the title separately
//! 2. [`document`]: peek the `%PDF-` header, parse, concatenate page text;
//!    CPU-bound, run via `spawn_blocking`
//! 3. [`prompt`]: cap text to the truncation budget and prepend the prefix
//! 4. [`llm`]: one chat-completion call with classified failures; the
//!    only stage besides [`web`] with network I/O

pub mod document;
pub mod llm;
pub mod prompt;
pub mod web;
