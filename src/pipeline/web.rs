//! Web extraction: fetch a page and flatten its visible body text.
//!
//! The page title is captured separately and never merged into the body
//! text. Text inside `script`, `style`, `noscript` and `template` elements is
//! not visible and is skipped. Block elements are separated by a space,
//! inline elements are not. Runs of whitespace collapse to one space.

use crate::error::ExtractionError;
use crate::output::{ExtractionResult, SourceKind};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::time::Duration;
use url::Url;

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid regex"));

/// Elements whose text content is never rendered.
const INVISIBLE: &[&str] = &["script", "style", "noscript", "template"];

/// Elements that start a new line of rendered text.
const BLOCK: &[&str] = &[
    "address", "article", "aside", "blockquote", "br", "dd", "details", "dialog", "div", "dl",
    "dt", "fieldset", "figcaption", "figure", "footer", "form", "h1", "h2", "h3", "h4", "h5",
    "h6", "header", "hr", "li", "main", "nav", "ol", "p", "pre", "section", "summary", "table",
    "tbody", "td", "tfoot", "th", "thead", "tr", "ul",
];

/// Fetches pages with a shared, long-lived HTTP client.
#[derive(Debug, Clone)]
pub struct WebExtractor {
    client: reqwest::Client,
    timeout: Duration,
}

impl WebExtractor {
    pub fn new(client: reqwest::Client, timeout: Duration) -> Self {
        Self { client, timeout }
    }

    /// Fetch `url` and extract its title and visible body text.
    pub async fn extract_from_url(&self, url: &str) -> Result<ExtractionResult, ExtractionError> {
        let parsed = parse_url(url)?;

        let fetch_error = |reason: String| ExtractionError::FetchError {
            url: parsed.to_string(),
            reason,
        };

        let response = self
            .client
            .get(parsed.clone())
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    fetch_error(format!("timed out after {}s", self.timeout.as_secs()))
                } else {
                    fetch_error(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(fetch_error(format!("HTTP {status}")));
        }

        let html = response.text().await.map_err(|e| fetch_error(e.to_string()))?;
        let page = parse_html(&html);

        Ok(ExtractionResult {
            text: page.body_text,
            source_kind: SourceKind::Web,
            title: page.title,
            page_count: None,
        })
    }
}

/// Validate that `input` is an absolute `http`/`https` URL.
pub fn parse_url(input: &str) -> Result<Url, ExtractionError> {
    let invalid = |reason: String| ExtractionError::InvalidUrl {
        input: input.to_string(),
        reason,
    };

    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(invalid("URL is empty".into()));
    }
    let url = Url::parse(trimmed).map_err(|e| invalid(e.to_string()))?;
    match url.scheme() {
        "http" | "https" => {}
        other => return Err(invalid(format!("unsupported scheme '{other}'"))),
    }
    if url.host_str().is_none() {
        return Err(invalid("URL has no host".into()));
    }
    Ok(url)
}

/// Title and flattened visible text of an HTML document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedPage {
    pub title: Option<String>,
    pub body_text: String,
}

/// Parse `html` into its title and visible body text.
pub fn parse_html(html: &str) -> ParsedPage {
    let document = Html::parse_document(html);
    ParsedPage {
        title: extract_title(&document),
        body_text: extract_body_text(&document),
    }
}

fn extract_title(document: &Html) -> Option<String> {
    let selector = Selector::parse("title").ok()?;
    document
        .select(&selector)
        .next()
        .map(|el| normalize_whitespace(&el.text().collect::<String>()))
        .filter(|t| !t.is_empty())
}

fn extract_body_text(document: &Html) -> String {
    let Ok(selector) = Selector::parse("body") else {
        return String::new();
    };
    let Some(body) = document.select(&selector).next() else {
        return String::new();
    };

    let mut raw = String::new();
    collect_visible_text(body, &mut raw);
    normalize_whitespace(&raw)
}

/// Append the visible text under `element` to `out`.
///
/// Inline elements join their text directly to the surrounding text; block
/// elements and `<br>` are separated by a space.
fn collect_visible_text(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        if let Some(text) = child.value().as_text() {
            out.push_str(text);
        } else if let Some(child) = ElementRef::wrap(child) {
            let name = child.value().name();
            if INVISIBLE.contains(&name) {
                continue;
            }
            let block = BLOCK.contains(&name);
            if block {
                out.push(' ');
            }
            collect_visible_text(child, out);
            if block {
                out.push(' ');
            }
        }
    }
}

fn normalize_whitespace(s: &str) -> String {
    WHITESPACE.replace_all(s, " ").trim().to_string()
}
