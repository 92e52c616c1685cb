//! Prompt construction: cap text to a character budget and prepend an
//! optional instruction.
//!
//! Lengths are counted in `char`s, not bytes, so a budget never splits a
//! UTF-8 sequence. The cut is not word-aware: a word straddling the budget
//! is cut mid-word.

use crate::prompts::PREFIX_SEPARATOR;

/// Inputs for [`build_prompt`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptSpec {
    pub raw_text: String,
    pub max_length: usize,
    pub prefix: Option<String>,
}

/// A bounded prompt plus what was done to get it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltPrompt {
    pub prompt: String,
    /// Character length of the text before truncation.
    pub original_len: usize,
    /// Character length of the body actually kept.
    pub kept_len: usize,
}

impl BuiltPrompt {
    pub fn truncated(&self) -> bool {
        self.kept_len < self.original_len
    }
}

/// Build the prompt for `spec`.
pub fn build_prompt(spec: &PromptSpec) -> BuiltPrompt {
    let original_len = spec.raw_text.chars().count();
    let body = truncate_chars(&spec.raw_text, spec.max_length);
    let kept_len = original_len.min(spec.max_length);

    let prompt = match spec.prefix.as_deref() {
        Some(prefix) => {
            let mut out = String::with_capacity(prefix.len() + PREFIX_SEPARATOR.len() + body.len());
            out.push_str(prefix);
            out.push_str(PREFIX_SEPARATOR);
            out.push_str(body);
            out
        }
        None => body.to_string(),
    };

    BuiltPrompt {
        prompt,
        original_len,
        kept_len,
    }
}

/// Convenience form of [`build_prompt`] returning only the prompt string.
pub fn build(text: &str, max_length: usize, prefix: Option<&str>) -> String {
    build_prompt(&PromptSpec {
        raw_text: text.to_string(),
        max_length,
        prefix: prefix.map(str::to_string),
    })
    .prompt
}

/// First `max_chars` characters of `text`.
fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}
