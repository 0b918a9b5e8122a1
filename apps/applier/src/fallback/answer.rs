//! Answer-generation service: one closed set of backends, one normalized reply shape.

use std::time::Duration;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::AnswerBackendConfig;
use crate::fallback::prompts::{answer_system_prompt, build_answer_prompt};
use crate::llm_client::{strip_json_fences, LlmClient, LlmError};
use crate::models::profile::Profile;

static NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d+\.?\d*").expect("number pattern must compile"));

#[derive(Debug, Error)]
pub enum AnswerError {
    #[error(transparent)]
    Llm(#[from] LlmError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Answer service returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Evidence as the backend gave it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Evidence {
    Text(String),
    List(Vec<String>),
}

/// The only reply shape that leaves this module.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedAnswer {
    pub answer: String,
    pub confidence: Option<f64>,
    pub evidence: Option<Evidence>,
}

/// A backend that turns a question plus applicant profile into a raw reply.
#[async_trait]
pub trait AnswerGenerator: Send + Sync {
    async fn generate(&self, question: &str, profile: &Profile) -> Result<Value, AnswerError>;
}

// ──────────────────────────────────────────────
// Backends
// ──────────────────────────────────────────────

#[async_trait]
impl AnswerGenerator for LlmClient {
    async fn generate(&self, question: &str, profile: &Profile) -> Result<Value, AnswerError> {
        let profile_json = serde_json::to_string_pretty(profile)?;
        let prompt = build_answer_prompt(&profile_json, question);
        let response = self.call(&prompt, &answer_system_prompt()).await?;
        let text = response.text().ok_or(LlmError::EmptyContent)?;
        let text = strip_json_fences(text);

        // Models occasionally ignore the JSON instruction; keep the prose.
        Ok(serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string())))
    }
}

/// Local question-answering server: `POST {profile, question}` → JSON reply.
#[derive(Clone)]
pub struct LocalQaClient {
    client: Client,
    url: String,
}

impl LocalQaClient {
    pub fn new(url: String, timeout: Duration) -> Result<Self, AnswerError> {
        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
            url,
        })
    }
}

#[async_trait]
impl AnswerGenerator for LocalQaClient {
    async fn generate(&self, question: &str, profile: &Profile) -> Result<Value, AnswerError> {
        let response = self
            .client
            .post(&self.url)
            .json(&json!({ "profile": profile, "question": question }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AnswerError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response.json().await?)
    }
}

pub enum AnswerBackend {
    Anthropic(LlmClient),
    LocalQa(LocalQaClient),
}

impl AnswerBackend {
    pub fn name(&self) -> &'static str {
        match self {
            AnswerBackend::Anthropic(_) => "anthropic",
            AnswerBackend::LocalQa(_) => "local",
        }
    }
}

#[async_trait]
impl AnswerGenerator for AnswerBackend {
    async fn generate(&self, question: &str, profile: &Profile) -> Result<Value, AnswerError> {
        match self {
            AnswerBackend::Anthropic(client) => client.generate(question, profile).await,
            AnswerBackend::LocalQa(client) => client.generate(question, profile).await,
        }
    }
}

// ──────────────────────────────────────────────
// Service boundary
// ──────────────────────────────────────────────

/// Wraps a backend so that no failure escapes: every error becomes `None`.
pub struct AnswerService {
    backend: AnswerBackend,
    timeout: Duration,
}

impl AnswerService {
    pub fn new(backend: AnswerBackend, timeout: Duration) -> Self {
        Self { backend, timeout }
    }

    /// Builds the configured backend, or `None` when generation is disabled.
    pub fn from_config(
        config: &AnswerBackendConfig,
        timeout: Duration,
    ) -> Result<Option<Self>, AnswerError> {
        let backend = match config {
            AnswerBackendConfig::Disabled => return Ok(None),
            AnswerBackendConfig::Anthropic { api_key, api_url } => AnswerBackend::Anthropic(
                LlmClient::new(api_key.clone(), api_url.clone(), timeout)?,
            ),
            AnswerBackendConfig::LocalQa { url } => {
                AnswerBackend::LocalQa(LocalQaClient::new(url.clone(), timeout)?)
            }
        };
        info!("Answer service enabled (backend: {})", backend.name());
        Ok(Some(Self::new(backend, timeout)))
    }

    pub async fn answer(&self, question: &str, profile: &Profile) -> Option<NormalizedAnswer> {
        let backend = self.backend.name();
        let raw = match tokio::time::timeout(self.timeout, self.backend.generate(question, profile))
            .await
        {
            Ok(Ok(raw)) => raw,
            Ok(Err(e)) => {
                warn!(backend, "Answer service failed: {e}");
                return None;
            }
            Err(_) => {
                warn!(
                    backend,
                    "Answer service timed out after {}s",
                    self.timeout.as_secs()
                );
                return None;
            }
        };

        let normalized = normalize_response(raw);
        if normalized.answer.trim().is_empty() {
            debug!(backend, "Answer service returned an empty answer for {question:?}");
            return None;
        }
        debug!(
            backend,
            confidence = ?normalized.confidence,
            "Generated answer for {question:?}"
        );
        Some(normalized)
    }
}

// ──────────────────────────────────────────────
// Normalization
// ──────────────────────────────────────────────

/// Folds any backend reply into `{answer, confidence, evidence}`.
pub fn normalize_response(raw: Value) -> NormalizedAnswer {
    let Value::Object(map) = &raw else {
        return NormalizedAnswer {
            answer: value_to_text(&raw),
            confidence: None,
            evidence: None,
        };
    };

    let answer = match map.get("answer").or_else(|| map.get("text")) {
        Some(v) => value_to_text(v),
        None => raw.to_string(),
    };

    let confidence = first_present(map, &["confidence", "score", "probability"])
        .and_then(parse_confidence);

    let evidence = first_present(map, &["evidence", "sources"]).map(|v| match v {
        Value::String(s) => Evidence::Text(s.clone()),
        Value::Array(items) => Evidence::List(items.iter().map(value_to_text).collect()),
        other => Evidence::Text(other.to_string()),
    });

    NormalizedAnswer {
        answer,
        confidence,
        evidence,
    }
}

fn first_present<'a>(map: &'a serde_json::Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|k| map.get(*k))
        .find(|v| !v.is_null())
}

fn parse_confidence(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s
            .trim()
            .parse()
            .ok()
            .or_else(|| NUMBER.find(s).and_then(|m| m.as_str().parse().ok())),
        _ => None,
    }
}

fn value_to_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
