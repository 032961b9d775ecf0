//! Gemini `generateContent` client.
//!
//! Every attempt is bounded by a timeout. Transient failures are retried with
//! exponential backoff up to `max_retries` extra attempts; anything else is
//! returned immediately.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

use edurag_core::config::GenerationSettings;

use crate::error::GenerateError;
use crate::generator::{build_prompt, Generator};

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct GenerateResponse {
    candidates: Vec<Candidate>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct CandidateContent {
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct CandidatePart {
    text: String,
}

pub struct GeminiGenerator {
    client: Client,
    endpoint: String,
    model: String,
    api_key: Option<String>,
    timeout: Duration,
    max_retries: u32,
    backoff: Duration,
}

impl GeminiGenerator {
    /// Build from settings, resolving the key from config or `GEMINI_API_KEY`.
    pub fn from_settings(settings: &GenerationSettings) -> Result<Self, GenerateError> {
        Self::new(settings, settings.resolve_api_key())
    }

    pub fn new(settings: &GenerationSettings, api_key: Option<String>) -> Result<Self, GenerateError> {
        let client = Client::builder().build().map_err(|e| GenerateError::Transport(e.to_string()))?;
        if api_key.is_none() {
            warn!("no Gemini API key configured; answers will fail until one is set");
        }
        Ok(Self {
            client,
            endpoint: settings.endpoint.trim_end_matches('/').to_string(),
            model: settings.model.clone(),
            api_key,
            timeout: Duration::from_secs(settings.timeout_secs),
            max_retries: settings.max_retries,
            backoff: Duration::from_millis(settings.backoff_ms),
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }

    pub fn has_credential(&self) -> bool {
        self.api_key.is_some()
    }

    fn url(&self) -> String {
        format!("{}/models/{}:generateContent", self.endpoint, self.model)
    }

    async fn attempt(&self, key: &str, body: &GenerateRequest<'_>) -> Result<String, GenerateError> {
        let response = self
            .client
            .post(self.url())
            .header("x-goog-api-key", key)
            .timeout(self.timeout)
            .json(body)
            .send()
            .await
            .map_err(|e| self.classify(&e))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(match status {
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => GenerateError::InvalidCredential(text),
                StatusCode::BAD_REQUEST if text.contains("API key") || text.contains("API_KEY") => {
                    GenerateError::InvalidCredential(text)
                }
                _ => GenerateError::Status { status: status.as_u16(), body: text },
            });
        }

        let parsed: GenerateResponse = response.json().await.map_err(|e| self.classify(&e))?;
        let answer: String = parsed
            .candidates
            .into_iter()
            .next()
            .map(|c| c.content.parts.into_iter().map(|p| p.text).collect())
            .unwrap_or_default();
        if answer.is_empty() {
            return Err(GenerateError::Malformed("response carried no candidate text".into()));
        }
        Ok(answer)
    }

    fn classify(&self, e: &reqwest::Error) -> GenerateError {
        if e.is_timeout() {
            GenerateError::Timeout(self.timeout)
        } else if e.is_decode() {
            GenerateError::Malformed(e.to_string())
        } else {
            GenerateError::Transport(e.to_string())
        }
    }
}

#[async_trait]
impl Generator for GeminiGenerator {
    async fn generate(&self, question: &str, context: &str) -> Result<String, GenerateError> {
        let key = self.api_key.as_deref().ok_or(GenerateError::MissingCredential)?;
        let prompt = build_prompt(question, context);
        let body = GenerateRequest { contents: vec![Content { role: "user", parts: vec![Part { text: &prompt }] }] };

        let mut attempt = 0u32;
        loop {
            match self.attempt(key, &body).await {
                Ok(answer) => {
                    debug!(model = %self.model, attempt, "generation succeeded");
                    return Ok(answer);
                }
                Err(e) if e.is_transient() && attempt < self.max_retries => {
                    let delay = self.backoff.saturating_mul(2u32.saturating_pow(attempt));
                    warn!(error = %e, attempt = attempt + 1, max = self.max_retries, ?delay, "generation failed, retrying");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
