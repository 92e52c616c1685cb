//! Configuration for the analysis pipeline.
//!
//! Every knob the pipeline reads lives in [`AnalysisConfig`], built via its
//! [`AnalysisConfigBuilder`]. Generation parameters are fixed per process,
//! never derived per request, so two requests with the same input produce the
//! same provider call.

use crate::error::DocsiftError;
use crate::prompts::{DEFAULT_SUMMARY_PREFIX, DEFAULT_TRUNCATION_BUDGET};
use std::fmt;

/// Default OpenAI-compatible chat-completions endpoint (Groq).
pub const DEFAULT_API_URL: &str = "https://api.groq.com/openai/v1/chat/completions";

/// Default model identifier.
pub const DEFAULT_MODEL: &str = "meta-llama/llama-4-scout-17b-16e-instruct";

/// Configuration for scraping, extraction and completion.
///
/// Built via [`AnalysisConfig::builder()`] or using
/// [`AnalysisConfig::default()`].
///
/// # Example
/// ```rust
/// use docsift::AnalysisConfig;
///
/// let config = AnalysisConfig::builder()
///     .api_key("gsk_example")
///     .truncation_budget(4000)
///     .build()
///     .unwrap();
/// assert_eq!(config.truncation_budget, 4000);
/// ```
#[derive(Clone)]
pub struct AnalysisConfig {
    /// Provider credential sent as `Authorization: Bearer <key>`.
    ///
    /// Missing is allowed at build time; the completion client refuses the
    /// call with a configuration error instead.
    pub api_key: Option<String>,

    /// Chat-completions endpoint. Default: [`DEFAULT_API_URL`].
    pub api_url: String,

    /// Model identifier. Default: [`DEFAULT_MODEL`].
    pub model: String,

    /// Sampling temperature. Range 0.0–2.0. Default: 1.0.
    pub temperature: f32,

    /// Maximum tokens the model may generate. Default: 1024.
    pub max_tokens: usize,

    /// Nucleus sampling mass. Range 0.0–1.0. Default: 1.0.
    pub top_p: f32,

    /// Maximum characters of document text sent to the provider. Default: 8000.
    pub truncation_budget: usize,

    /// Instruction prepended to document text. Default: [`DEFAULT_SUMMARY_PREFIX`].
    pub summary_prefix: String,

    /// Timeout for fetching a web page, in seconds. Default: 30.
    pub fetch_timeout_secs: u64,

    /// Timeout for a completion call, in seconds. Default: 60.
    pub api_timeout_secs: u64,

    /// Largest accepted document upload, in bytes. Default: 20 MiB.
    pub max_upload_bytes: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_url: DEFAULT_API_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            temperature: 1.0,
            max_tokens: 1024,
            top_p: 1.0,
            truncation_budget: DEFAULT_TRUNCATION_BUDGET,
            summary_prefix: DEFAULT_SUMMARY_PREFIX.to_string(),
            fetch_timeout_secs: 30,
            api_timeout_secs: 60,
            max_upload_bytes: 20 * 1024 * 1024,
        }
    }
}

impl fmt::Debug for AnalysisConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnalysisConfig")
            .field("api_key", &self.api_key.as_deref().map(mask_credential))
            .field("api_url", &self.api_url)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("top_p", &self.top_p)
            .field("truncation_budget", &self.truncation_budget)
            .field("fetch_timeout_secs", &self.fetch_timeout_secs)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .field("max_upload_bytes", &self.max_upload_bytes)
            .finish()
    }
}

impl AnalysisConfig {
    /// Create a new builder for `AnalysisConfig`.
    pub fn builder() -> AnalysisConfigBuilder {
        AnalysisConfigBuilder {
            config: Self::default(),
        }
    }

    /// Masked form of the configured credential, safe to log.
    pub fn masked_api_key(&self) -> String {
        self.api_key
            .as_deref()
            .map(mask_credential)
            .unwrap_or_else(|| "<unset>".to_string())
    }
}

/// Render a credential as `****` followed by its last four characters.
///
/// This is the only form in which a credential may appear in logs or
/// `Debug` output.
pub fn mask_credential(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    let tail: String = chars[chars.len().saturating_sub(4)..].iter().collect();
    format!("****{tail}")
}

/// Builder for [`AnalysisConfig`].
#[derive(Debug)]
pub struct AnalysisConfigBuilder {
    config: AnalysisConfig,
}

impl AnalysisConfigBuilder {
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = Some(key.into());
        self
    }

    pub fn api_url(mut self, url: impl Into<String>) -> Self {
        self.config.api_url = url.into();
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n.max(1);
        self
    }

    pub fn top_p(mut self, p: f32) -> Self {
        self.config.top_p = p.clamp(0.0, 1.0);
        self
    }

    pub fn truncation_budget(mut self, chars: usize) -> Self {
        self.config.truncation_budget = chars;
        self
    }

    pub fn summary_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.summary_prefix = prefix.into();
        self
    }

    pub fn fetch_timeout_secs(mut self, secs: u64) -> Self {
        self.config.fetch_timeout_secs = secs;
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs;
        self
    }

    pub fn max_upload_bytes(mut self, bytes: usize) -> Self {
        self.config.max_upload_bytes = bytes;
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<AnalysisConfig, DocsiftError> {
        let c = &self.config;
        if c.truncation_budget == 0 {
            return Err(DocsiftError::InvalidConfig(
                "Truncation budget must be ≥ 1 character".into(),
            ));
        }
        if c.model.trim().is_empty() {
            return Err(DocsiftError::InvalidConfig("Model must not be empty".into()));
        }
        match url::Url::parse(&c.api_url) {
            Ok(u) if matches!(u.scheme(), "http" | "https") => {}
            Ok(u) => {
                return Err(DocsiftError::InvalidConfig(format!(
                    "API URL must be http or https, got scheme '{}'",
                    u.scheme()
                )))
            }
            Err(e) => {
                return Err(DocsiftError::InvalidConfig(format!(
                    "API URL '{}' is invalid: {e}",
                    c.api_url
                )))
            }
        }
        if c.fetch_timeout_secs == 0 || c.api_timeout_secs == 0 {
            return Err(DocsiftError::InvalidConfig(
                "Timeouts must be ≥ 1 second".into(),
            ));
        }
        if c.max_upload_bytes == 0 {
            return Err(DocsiftError::InvalidConfig(
                "Upload limit must be ≥ 1 byte".into(),
            ));
        }
        Ok(self.config)
    }
}
