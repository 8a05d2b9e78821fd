// HTTP client for the text-generation scoring endpoint.
//
// The service is asked (through the configured prompt) to answer with a JSON
// object carrying `positivity_score`. Models like to wrap that object in
// prose, so the response is parsed in two stages: cut out the outermost
// `{...}`, then deserialize it. Anything malformed becomes a zero sample;
// only transport failures surface as errors.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::Client;
use serde::{Deserialize, Deserializer, Serialize};
use tracing::{debug, warn};

use super::prompt::PromptTemplate;
use super::round_half_up;
use super::traits::SentimentScorer;
use crate::config::Config;
use crate::error::{Result, ScoringError};
use crate::output::truncate_chars;

/// Scorer backed by the configured LLM endpoint.
pub struct LlmScoreClient {
    client: Client,
    url: String,
    prompt: PromptTemplate,
}

impl LlmScoreClient {
    /// Create a client for `url` with a per-request timeout.
    pub fn new(url: &str, prompt: PromptTemplate, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("sentiment-sweep/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .map_err(|e| ScoringError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            url: url.to_string(),
            prompt,
        })
    }

    /// Create a client from the loaded configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        config.require_scoring()?;
        let prompt = config
            .prompt
            .clone()
            .ok_or_else(|| ScoringError::Config("prompt template not configured".to_string()))?;
        Self::new(&config.llm_url, prompt, config.request_timeout)
    }
}

#[async_trait]
impl SentimentScorer for LlmScoreClient {
    async fn score(&self, text: &str, keyword: &str) -> Result<i32> {
        let request = PromptRequest {
            prompt: self.prompt.render(keyword, text),
        };

        let response = self
            .client
            .post(&self.url)
            .header(ACCEPT, "application/json")
            .header(CONTENT_TYPE, "application/json; charset=UTF-8")
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        debug!(
            status = %status,
            raw = %truncate_chars(&body, 500),
            "Raw response from scoring service"
        );

        if !status.is_success() {
            // The body is still parsed; an error page simply yields a zero sample.
            warn!(status = %status, keyword = keyword, "Scoring service returned non-success status");
        }

        match parse_score_response(&body) {
            Ok(score) => Ok(score),
            Err(e) => {
                warn!(error = %e, "Treating unusable scoring response as a zero sample");
                Ok(0)
            }
        }
    }
}

/// Cut the candidate JSON object out of a response: first `{` to last `}`.
///
/// Returns `None` if either brace is missing or they are out of order.
pub fn extract_json_object(body: &str) -> Option<&str> {
    let start = body.find('{')?;
    let end = body.rfind('}')?;
    if end <= start {
        return None;
    }
    Some(&body[start..=end])
}

/// Parse an extracted object and return its raw `positivity_score`.
///
/// A missing or null field reads as 0.0. Objects with single-quoted strings
/// or bare keys (`{'positivity_score': 80}`, `{positivity_score: 80}`) are
/// accepted after normalizing them to strict JSON.
pub fn parse_positivity(json: &str) -> Result<f64> {
    let parsed: SentimentResponse = match serde_json::from_str(json) {
        Ok(parsed) => parsed,
        Err(strict_err) => serde_json::from_str(&normalize_relaxed_json(json)).map_err(|_| {
            ScoringError::Parse(format!("{strict_err} in {}", truncate_chars(json, 200)))
        })?,
    };
    Ok(parsed.positivity_score)
}

/// Rewrite single-quoted strings as double-quoted ones and quote bare object
/// keys. Everything else passes through unchanged.
fn normalize_relaxed_json(input: &str) -> String {
    let mut out = String::with_capacity(input.len() + 8);
    let mut chars = input.chars().peekable();
    let mut key_position = false;

    while let Some(c) = chars.next() {
        match c {
            '"' | '\'' => {
                out.push('"');
                while let Some(ch) = chars.next() {
                    match ch {
                        '\\' => match chars.next() {
                            Some('\'') => out.push('\''),
                            Some(escaped) => {
                                out.push('\\');
                                out.push(escaped);
                            }
                            None => break,
                        },
                        ch if ch == c => break,
                        '"' => out.push_str("\\\""),
                        ch => out.push(ch),
                    }
                }
                out.push('"');
                key_position = false;
            }
            '{' | ',' => {
                out.push(c);
                key_position = true;
            }
            c if key_position && (c.is_alphabetic() || c == '_' || c == '$') => {
                let mut ident = String::from(c);
                while let Some(&next) = chars.peek() {
                    if next.is_alphanumeric() || next == '_' || next == '$' {
                        ident.push(next);
                        chars.next();
                    } else {
                        break;
                    }
                }
                // Only identifiers followed by ':' are keys; `null` in an array is not
                let is_key = chars.clone().find(|ch| !ch.is_whitespace()) == Some(':');
                if is_key {
                    out.push('"');
                    out.push_str(&ident);
                    out.push('"');
                } else {
                    out.push_str(&ident);
                }
                key_position = false;
            }
            c => {
                if !c.is_whitespace() {
                    key_position = false;
                }
                out.push(c);
            }
        }
    }

    out
}

/// Full response handling: extract, parse, round.
pub fn parse_score_response(body: &str) -> Result<i32> {
    let json = extract_json_object(body).ok_or_else(|| {
        ScoringError::Parse(format!(
            "no JSON object found in response: {}",
            truncate_chars(body, 200)
        ))
    })?;
    let score = parse_positivity(json)?;
    Ok(round_half_up(score))
}

// --- Request/response types ---

#[derive(Serialize)]
struct PromptRequest {
    prompt: String,
}

#[derive(Deserialize)]
struct SentimentResponse {
    #[serde(default, deserialize_with = "lenient_score")]
    positivity_score: f64,
}

/// Accept a JSON number, a numeric string, or null.
fn lenient_score<'de, D>(deserializer: D) -> std::result::Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::Null => Ok(0.0),
        serde_json::Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| D::Error::custom("positivity_score is not representable as f64")),
        serde_json::Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| D::Error::custom(format!("positivity_score {s:?} is not a number"))),
        other => Err(D::Error::custom(format!(
            "positivity_score has unexpected type: {other}"
        ))),
    }
}
