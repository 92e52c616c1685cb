//! Prompt text used by the document-analysis flow.
//!
//! Callers can override both values through
//! [`crate::config::AnalysisConfig`]; the constants here are the defaults.

/// Instruction prepended to extracted document text.
///
/// [`crate::pipeline::prompt::build`] joins it to the body with a blank line.
pub const DEFAULT_SUMMARY_PREFIX: &str = "Please analyze and summarize the following document: ";

/// Maximum characters of document text forwarded to the provider.
pub const DEFAULT_TRUNCATION_BUDGET: usize = 8000;

/// Separator placed between the prefix and the document body.
pub const PREFIX_SEPARATOR: &str = "\n\n";
