// Prompt rendering for the scoring endpoint.
//
// The template comes from configuration and carries `{keyword}` and `{text}`
// placeholders. Rendering is a single left-to-right pass, so placeholder-like
// text inside the inserted values is never substituted again.

use crate::error::{Result, ScoringError};

pub const KEYWORD_PLACEHOLDER: &str = "{keyword}";
pub const TEXT_PLACEHOLDER: &str = "{text}";

/// A validated prompt template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    template: String,
}

impl PromptTemplate {
    /// Wrap a template string. A blank template is a configuration error.
    pub fn new(template: impl Into<String>) -> Result<Self> {
        let template = template.into();
        if template.trim().is_empty() {
            return Err(ScoringError::Config("prompt template is empty".to_string()));
        }
        if !template.contains(KEYWORD_PLACEHOLDER) || !template.contains(TEXT_PLACEHOLDER) {
            tracing::warn!(
                "Prompt template is missing a {{keyword}} or {{text}} placeholder; \
                 the scoring service will not see that value"
            );
        }
        Ok(Self { template })
    }

    /// Render the prompt for one text/keyword pair.
    pub fn render(&self, keyword: &str, text: &str) -> String {
        render(&self.template, keyword, text)
    }
}

/// Replace every `{keyword}` and `{text}` in `template`.
pub fn render(template: &str, keyword: &str, text: &str) -> String {
    let mut out = String::with_capacity(template.len() + keyword.len() + text.len());
    let mut rest = template;

    loop {
        let next_keyword = rest.find(KEYWORD_PLACEHOLDER);
        let next_text = rest.find(TEXT_PLACEHOLDER);

        let (pos, placeholder, value) = match (next_keyword, next_text) {
            (Some(k), Some(t)) if k <= t => (k, KEYWORD_PLACEHOLDER, keyword),
            (Some(_), Some(t)) => (t, TEXT_PLACEHOLDER, text),
            (Some(k), None) => (k, KEYWORD_PLACEHOLDER, keyword),
            (None, Some(t)) => (t, TEXT_PLACEHOLDER, text),
            (None, None) => break,
        };

        out.push_str(&rest[..pos]);
        out.push_str(value);
        rest = &rest[pos + placeholder.len()..];
    }

    out.push_str(rest);
    out
}
