//! Natural-language to SQL translation
//!
//! The model itself is an external collaborator behind [`SqlTranslator`].
//! This module owns the prompt, the HTTP call to Google's Generative Language
//! API, and pulling a SQL statement out of whatever text comes back.

mod extract;
mod prompt;

pub use extract::{extract_sql, SQL_QUERY_MARKER};
pub use prompt::{build_prompt, COMPLETE_QUERY_HINT};

use crate::error::{Error, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

/// Environment variable holding the model API key
pub const API_KEY_ENV: &str = "GOOGLE_API_KEY";

/// Default Gemini model
pub const DEFAULT_MODEL: &str = "gemini-1.5-pro";

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Something that turns a question into raw model text containing SQL
#[async_trait]
pub trait SqlTranslator: Send + Sync {
    /// Ask the model for SQL answering `question` over `schema`.
    ///
    /// Returns the model's raw text; callers run it through [`extract_sql`].
    async fn complete(&self, question: &str, schema: &str) -> Result<String>;

    /// Model identifier, for logging
    fn model(&self) -> &str;
}

/// Settings for [`GeminiTranslator`]
#[derive(Debug, Clone)]
pub struct TranslatorConfig {
    pub api_key: String,
    pub model: String,
    pub temperature: f32,
    /// Row limit suggested to the model when the question names none
    pub top_k: usize,
    pub base_url: String,
    pub timeout: Duration,
}

impl TranslatorConfig {
    /// Config with defaults for everything but the key
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            temperature: 0.5,
            top_k: 10,
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(60),
        }
    }

    /// Read the key from `GOOGLE_API_KEY`
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var(API_KEY_ENV).map_err(|_| {
            Error::ConfigError(format!("{} environment variable not set", API_KEY_ENV))
        })?;
        if api_key.trim().is_empty() {
            return Err(Error::ConfigError(format!("{} is empty", API_KEY_ENV)));
        }
        Ok(Self::new(api_key))
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        )
    }
}

/// Translator backed by the Gemini `generateContent` REST endpoint
pub struct GeminiTranslator {
    config: TranslatorConfig,
    client: Client,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

impl GeminiTranslator {
    pub fn new(config: TranslatorConfig) -> Result<Self> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { config, client })
    }

    /// Create from `GOOGLE_API_KEY`
    pub fn from_env() -> Result<Self> {
        Self::new(TranslatorConfig::from_env()?)
    }

    fn request_body(&self, prompt: &str) -> serde_json::Value {
        json!({
            "contents": [
                {"role": "user", "parts": [{"text": prompt}]}
            ],
            "generationConfig": {
                "temperature": self.config.temperature,
                "stopSequences": ["\nSQLResult:"]
            }
        })
    }
}

/// Concatenate the text parts of the first candidate
fn parse_generate_response(body: &str) -> Result<String> {
    let parsed: GenerateResponse = serde_json::from_str(body)
        .map_err(|e| Error::Translation(format!("Failed to parse model response: {}", e)))?;

    let content = parsed
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .ok_or_else(|| Error::Translation("No candidates in model response".to_string()))?;

    let text: String = content.parts.into_iter().map(|p| p.text).collect();
    if text.trim().is_empty() {
        return Err(Error::Translation("Model returned empty text".to_string()));
    }
    Ok(text)
}

#[async_trait]
impl SqlTranslator for GeminiTranslator {
    async fn complete(&self, question: &str, schema: &str) -> Result<String> {
        let prompt = build_prompt(question, schema, self.config.top_k);

        let response = self
            .client
            .post(self.config.endpoint())
            .header("x-goog-api-key", &self.config.api_key)
            .json(&self.request_body(&prompt))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(Error::Translation(format!(
                "Gemini API error {}: {}",
                status, body
            )));
        }

        parse_generate_response(&body)
    }

    fn model(&self) -> &str {
        &self.config.model
    }
}
