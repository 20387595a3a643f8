//! AI summarization of long text into a flashcard title and body.
//!
//! The generation proxy forwards `{"text": ...}` to a hosted model and
//! returns the model's raw envelope. The generated text is expected to be a
//! JSON document `{"title": ..., "content": ...}`, but models drift, so every
//! field has a fallback.

use std::sync::OnceLock;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{Error, Result};

/// A generated title and body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    /// Card title.
    pub title: String,
    /// Card body.
    pub content: String,
}

impl Summary {
    /// Interpret generated text.
    ///
    /// A blank or missing title becomes `default_title`; blank or missing
    /// content, or text that is not a JSON object at all, becomes the raw
    /// generated text.
    #[must_use]
    pub fn from_generated(text: &str, default_title: &str) -> Self {
        let document = strip_code_fence(text);
        let parsed = serde_json::from_str::<Value>(document).ok();

        let field = |name: &str| {
            parsed
                .as_ref()
                .and_then(|value| value.get(name))
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };

        if parsed.is_none() {
            debug!("Generated text is not JSON; using it as the card body");
        }

        Self {
            title: field("title").unwrap_or_else(|| default_title.to_string()),
            content: field("content").unwrap_or_else(|| text.trim().to_string()),
        }
    }
}

/// Turns arbitrary text into a [`Summary`].
#[async_trait]
pub trait Summarizer: Send + Sync {
    /// Summarize `text`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] for blank input and
    /// [`Error::Summarizer`] when generation fails.
    async fn summarize(&self, text: &str) -> Result<Summary>;
}

/// Request body accepted by the generation proxy.
#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    text: &'a str,
}

/// [`Summarizer`] backed by the HTTP generation proxy.
#[derive(Debug, Clone)]
pub struct HttpSummarizer {
    client: Client,
    endpoint: String,
    default_title: String,
}

impl HttpSummarizer {
    /// Create a summarizer posting to `endpoint`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Summarizer`] if the HTTP client cannot be built.
    pub fn new(
        endpoint: impl Into<String>,
        default_title: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::summarizer(e.to_string()))?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            default_title: default_title.into(),
        })
    }
}

#[async_trait]
impl Summarizer for HttpSummarizer {
    async fn summarize(&self, text: &str) -> Result<Summary> {
        if text.trim().is_empty() {
            return Err(Error::validation("text to summarize must not be empty"));
        }

        debug!("Requesting summary of {} chars", text.chars().count());
        let response = self
            .client
            .post(&self.endpoint)
            .json(&GenerateRequest { text })
            .send()
            .await
            .map_err(|e| Error::summarizer(format!("request failed: {e}")))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Error::summarizer(format!("reading response failed: {e}")))?;

        if !status.is_success() {
            warn!("Generation proxy answered {}", status);
            return Err(Error::summarizer(format!("proxy returned {status}: {body}")));
        }

        let envelope: Value = serde_json::from_str(&body)
            .map_err(|e| Error::summarizer(format!("response is not JSON: {e}")))?;
        summary_from_envelope(&envelope, &self.default_title)
    }
}

/// Pull the summary out of a generation envelope.
///
/// Accepts the hosted model's `candidates[0].content.parts[0].text` shape, or
/// a proxy that already unpacked it into `{title, content}`.
///
/// # Errors
///
/// Returns [`Error::Summarizer`] when the envelope carries no usable text.
pub fn summary_from_envelope(envelope: &Value, default_title: &str) -> Result<Summary> {
    if let Some(text) = envelope
        .pointer("/candidates/0/content/parts/0/text")
        .and_then(Value::as_str)
    {
        if text.trim().is_empty() {
            return Err(Error::summarizer("model returned empty text"));
        }
        return Ok(Summary::from_generated(text, default_title));
    }

    if envelope.get("title").is_some() || envelope.get("content").is_some() {
        return Ok(Summary::from_generated(&envelope.to_string(), default_title));
    }

    if let Some(message) = envelope.get("error").and_then(Value::as_str) {
        return Err(Error::summarizer(message.to_string()));
    }

    Err(Error::summarizer("response carries no generated text"))
}

/// Remove a surrounding markdown code fence, if any.
fn strip_code_fence(text: &str) -> &str {
    static FENCE: OnceLock<Regex> = OnceLock::new();
    let fence = FENCE.get_or_init(|| {
        Regex::new(r"(?s)^\s*```[A-Za-z]*\s*\n(.*?)\s*```\s*$").expect("fence pattern is valid")
    });

    fence
        .captures(text)
        .and_then(|captures| captures.get(1))
        .map_or(text, |inner| inner.as_str())
}
