//! Client for the external content generation service.

use async_trait::async_trait;
use deck_core::{Error, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Environment variable holding the service API key.
pub const API_KEY_VAR: &str = "GEMINI_API_KEY";

/// Environment variable overriding the model name.
pub const MODEL_VAR: &str = "DECKGEN_MODEL";

/// Environment variable overriding the service base URL.
pub const API_BASE_VAR: &str = "DECKGEN_API_BASE";

const DEFAULT_MODEL: &str = "gemini-2.5-flash";
const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// A service that answers a prompt with JSON following a schema.
#[async_trait]
pub trait ContentService: Send + Sync {
    /// Send one prompt and return the raw JSON text of the answer.
    async fn generate_json(&self, prompt: &str, schema: &Value) -> Result<String>;
}

/// Connection settings for [`GeminiService`].
#[derive(Clone)]
pub struct ServiceSettings {
    api_key: String,
    model: String,
    api_base: String,
}

impl ServiceSettings {
    /// Settings with the default model and endpoint. An empty key is rejected.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(Error::MissingCredential(format!(
                "{} is not set; add it to your environment or .env file",
                API_KEY_VAR
            )));
        }

        Ok(Self {
            api_key,
            model: DEFAULT_MODEL.to_string(),
            api_base: DEFAULT_API_BASE.to_string(),
        })
    }

    /// Read settings from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read settings through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = Self::new(lookup(API_KEY_VAR).unwrap_or_default())?;
        if let Some(model) = lookup(MODEL_VAR).filter(|m| !m.trim().is_empty()) {
            settings = settings.with_model(model);
        }
        if let Some(base) = lookup(API_BASE_VAR).filter(|b| !b.trim().is_empty()) {
            settings = settings.with_api_base(base);
        }
        Ok(settings)
    }

    pub fn with_model<S: Into<String>>(mut self, model: S) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_api_base<S: Into<String>>(mut self, api_base: S) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Full URL of the generate call for the configured model.
    pub fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.api_base, self.model)
    }
}

impl fmt::Debug for ServiceSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceSettings")
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("api_base", &self.api_base)
            .finish()
    }
}

/// Gemini `generateContent` client using structured JSON output.
#[derive(Debug, Clone)]
pub struct GeminiService {
    settings: ServiceSettings,
    client: Client,
}

impl GeminiService {
    pub fn new(settings: ServiceSettings) -> Self {
        Self {
            settings,
            client: Client::new(),
        }
    }

    /// Build a client from the environment, failing before any request if
    /// the credential is missing.
    pub fn from_env() -> Result<Self> {
        Ok(Self::new(ServiceSettings::from_env()?))
    }

    pub fn settings(&self) -> &ServiceSettings {
        &self.settings
    }
}

#[async_trait]
impl ContentService for GeminiService {
    async fn generate_json(&self, prompt: &str, schema: &Value) -> Result<String> {
        let payload = build_payload(prompt, schema);

        log::debug!(
            "Requesting structured content from {} ({} prompt chars)",
            self.settings.model,
            prompt.len()
        );

        let res = self
            .client
            .post(self.settings.endpoint())
            .header("x-goog-api-key", &self.settings.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| Error::GenerationFailed(format!("request failed: {}", e)))?;

        let status = res.status();
        if !status.is_success() {
            let detail = res.text().await.unwrap_or_default();
            return Err(Error::GenerationFailed(format!(
                "service responded with {}: {}",
                status,
                first_line(&detail)
            )));
        }

        let body: ApiResponse = res
            .json()
            .await
            .map_err(|e| Error::GenerationFailed(format!("unreadable response: {}", e)))?;

        response_text(body)
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Payload<'a> {
    contents: Vec<PayloadContent<'a>>,
    generation_config: PayloadConfig<'a>,
}

#[derive(Serialize)]
struct PayloadContent<'a> {
    role: &'static str,
    parts: Vec<PayloadPart<'a>>,
}

#[derive(Serialize)]
struct PayloadPart<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PayloadConfig<'a> {
    response_mime_type: &'static str,
    response_schema: &'a Value,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

fn build_payload<'a>(prompt: &'a str, schema: &'a Value) -> Payload<'a> {
    Payload {
        contents: vec![PayloadContent {
            role: "user",
            parts: vec![PayloadPart { text: prompt }],
        }],
        generation_config: PayloadConfig {
            response_mime_type: "application/json",
            response_schema: schema,
        },
    }
}

/// Concatenate the text parts of the first candidate.
fn response_text(body: ApiResponse) -> Result<String> {
    let candidate = body
        .candidates
        .into_iter()
        .next()
        .ok_or_else(|| Error::GenerationFailed("the service returned no candidates".to_string()))?;

    let text: String = candidate
        .content
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    if text.trim().is_empty() {
        return Err(Error::GenerationFailed(format!(
            "the service returned no content (finish reason: {})",
            candidate.finish_reason.as_deref().unwrap_or("unknown")
        )));
    }

    Ok(text)
}

fn first_line(text: &str) -> &str {
    text.lines().next().unwrap_or_default()
}
