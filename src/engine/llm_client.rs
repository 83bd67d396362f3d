use std::time::Duration;

use anyhow::Context;
use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::{BackendKind, BackendSettings};
use crate::error::GenerationError;

/// The text-generation backend, seen from the story engine.
///
/// One prompt in, one reply out. Implementations never retry on their own.
pub trait GenerationClient {
    fn submit(&self, prompt: &str) -> Result<String, GenerationError>;

    /// Cheap reachability check, for the settings screen.
    fn test_connection(&self) -> Result<String, GenerationError> {
        Ok("Connection check not supported by this backend".to_string())
    }
}

impl<T: GenerationClient + ?Sized> GenerationClient for Box<T> {
    fn submit(&self, prompt: &str) -> Result<String, GenerationError> {
        (**self).submit(prompt)
    }

    fn test_connection(&self) -> Result<String, GenerationError> {
        (**self).test_connection()
    }
}

impl<T: GenerationClient + ?Sized> GenerationClient for &T {
    fn submit(&self, prompt: &str) -> Result<String, GenerationError> {
        (**self).submit(prompt)
    }

    fn test_connection(&self) -> Result<String, GenerationError> {
        (**self).test_connection()
    }
}

/// Builds the configured backend. The API key is read from the environment
/// variable named in the settings and stays inside the returned client.
pub fn build_client(settings: &BackendSettings) -> anyhow::Result<Box<dyn GenerationClient + Send>> {
    let mut builder = Client::builder();
    if let Some(secs) = settings.timeout_secs {
        builder = builder.timeout(Duration::from_secs(secs));
    }
    let http = builder.build().context("failed to build HTTP client")?;

    let api_key = std::env::var(&settings.api_key_env)
        .ok()
        .filter(|key| !key.trim().is_empty());

    match settings.kind {
        BackendKind::ChatCompletions => {
            let mut client = ChatCompletionClient::new(
                http,
                &settings.endpoint,
                &settings.model,
                settings.temperature,
            );
            if let Some(key) = api_key {
                client = client.with_api_key(key);
            }
            Ok(Box::new(client))
        }
        BackendKind::Gemini => {
            let key = api_key.with_context(|| {
                format!("{} environment variable is not set", settings.api_key_env)
            })?;
            Ok(Box::new(GeminiClient::new(
                http,
                &settings.endpoint,
                &settings.model,
                key,
            )))
        }
    }
}

/* =========================
   OpenAI-compatible chat completions (LM Studio, llama.cpp, OpenAI)
   ========================= */

#[derive(Serialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
}

#[derive(Serialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

#[derive(Deserialize)]
pub struct ChatCompletionResponse {
    pub choices: Vec<Choice>,
}

#[derive(Deserialize)]
pub struct Choice {
    pub message: ChatMessageResponse,
}

#[derive(Deserialize)]
pub struct ChatMessageResponse {
    pub content: Option<String>,
}

#[derive(Deserialize)]
struct ModelList {
    #[serde(default)]
    data: Vec<serde_json::Value>,
}

pub struct ChatCompletionClient {
    http: Client,
    endpoint: String,
    model: String,
    temperature: f32,
    api_key: Option<String>,
}

impl ChatCompletionClient {
    pub fn new(http: Client, endpoint: &str, model: &str, temperature: f32) -> Self {
        Self {
            http,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            model: model.to_string(),
            temperature,
            api_key: None,
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.api_key {
            Some(key) => request.bearer_auth(key),
            None => request,
        }
    }
}

impl GenerationClient for ChatCompletionClient {
    fn submit(&self, prompt: &str) -> Result<String, GenerationError> {
        let req = ChatCompletionRequest {
            model: self.model.clone(),
            temperature: self.temperature,
            messages: vec![ChatMessage {
                role: "user".into(),
                content: prompt.to_string(),
            }],
        };

        debug!(model = %self.model, prompt_len = prompt.len(), "submitting chat completion");

        let response = self
            .authorized(self.http.post(format!("{}/chat/completions", self.endpoint)))
            .json(&req)
            .send()
            .map_err(request_error)?;

        let body: ChatCompletionResponse = ensure_success(response)?
            .json()
            .map_err(|e| malformed("chat completion", e))?;

        extract_chat_text(body)
    }

    fn test_connection(&self) -> Result<String, GenerationError> {
        let response = self
            .authorized(self.http.get(format!("{}/models", self.endpoint)))
            .send()
            .map_err(request_error)?;

        let models: ModelList = ensure_success(response)?
            .json()
            .map_err(|e| malformed("model list", e))?;

        Ok(format!("Connected ({} models available)", models.data.len()))
    }
}

pub fn extract_chat_text(response: ChatCompletionResponse) -> Result<String, GenerationError> {
    response
        .choices
        .into_iter()
        .next()
        .map(|choice| choice.message.content.unwrap_or_default())
        .ok_or_else(|| GenerationError::MalformedResponse("response contained no choices".into()))
}

/* =========================
   Gemini generateContent
   ========================= */

pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";

#[derive(Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
}

#[derive(Serialize)]
struct Content {
    role: String,
    parts: Vec<Part>,
}

#[derive(Serialize)]
struct Part {
    text: String,
}

#[derive(Deserialize)]
pub struct GenerateContentResponse {
    candidates: Option<Vec<Candidate>>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<ContentResponse>,
}

#[derive(Deserialize)]
struct ContentResponse {
    #[serde(default)]
    parts: Vec<PartResponse>,
}

#[derive(Deserialize)]
struct PartResponse {
    text: Option<String>,
}

pub struct GeminiClient {
    http: Client,
    base_url: String,
    model: String,
    api_key: String,
}

impl GeminiClient {
    pub fn new(http: Client, base_url: &str, model: &str, api_key: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_key: api_key.into(),
        }
    }
}

impl GenerationClient for GeminiClient {
    fn submit(&self, prompt: &str) -> Result<String, GenerationError> {
        let request = GenerateContentRequest {
            contents: vec![Content {
                role: "user".into(),
                parts: vec![Part {
                    text: prompt.to_string(),
                }],
            }],
        };

        debug!(model = %self.model, prompt_len = prompt.len(), "submitting gemini request");

        let response = self
            .http
            .post(format!("{}/{}:generateContent", self.base_url, self.model))
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .map_err(request_error)?;

        let body: GenerateContentResponse = ensure_success(response)?
            .json()
            .map_err(|e| malformed("gemini", e))?;

        extract_gemini_text(body)
    }

    fn test_connection(&self) -> Result<String, GenerationError> {
        let response = self
            .http
            .get(format!("{}/{}", self.base_url, self.model))
            .header("x-goog-api-key", &self.api_key)
            .send()
            .map_err(request_error)?;

        ensure_success(response)?;
        Ok(format!("Connected ({} available)", self.model))
    }
}

pub fn extract_gemini_text(response: GenerateContentResponse) -> Result<String, GenerationError> {
    response
        .candidates
        .and_then(|mut candidates| candidates.pop())
        .and_then(|candidate| candidate.content)
        .and_then(|content| content.parts.into_iter().find_map(|part| part.text))
        .ok_or_else(|| {
            GenerationError::MalformedResponse("response candidates contained no text".into())
        })
}

/* =========================
   Error mapping
   ========================= */

#[derive(Deserialize)]
struct ErrorWrapper {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
    status: Option<String>,
}

fn request_error(err: reqwest::Error) -> GenerationError {
    warn!(error = %err, "generation request failed");
    GenerationError::Transient(format!("request failed: {err}"))
}

fn malformed(what: &str, err: reqwest::Error) -> GenerationError {
    warn!(error = %err, "could not decode {what} response");
    GenerationError::MalformedResponse(format!("failed to decode {what} response: {err}"))
}

fn ensure_success(response: Response) -> Result<Response, GenerationError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().unwrap_or_default();
    let err = classify_status(status, &body);
    warn!(%status, error = %err, "generation backend returned an error status");
    Err(err)
}

/// Sorts a failed HTTP exchange into the generation error taxonomy.
pub fn classify_status(status: StatusCode, body: &str) -> GenerationError {
    let message = serde_json::from_str::<ErrorWrapper>(body)
        .ok()
        .and_then(|wrapper| {
            let msg = wrapper.error.message?;
            Some(match wrapper.error.status {
                Some(status_text) if !status_text.is_empty() => format!("{status_text}: {msg}"),
                _ => msg,
            })
        })
        .unwrap_or_else(|| body.trim().chars().take(300).collect());

    let detail = format!("HTTP {}: {}", status.as_u16(), message);
    let upper = body.to_uppercase();

    if status == StatusCode::TOO_MANY_REQUESTS
        || upper.contains("RESOURCE_EXHAUSTED")
        || upper.contains("QUOTA")
    {
        GenerationError::RateLimited(detail)
    } else if matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
        GenerationError::Auth(detail)
    } else {
        GenerationError::Transient(detail)
    }
}
