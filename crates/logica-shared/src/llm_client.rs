//! LLM client abstraction.
//!
//! Talks to an OpenAI-compatible chat completions endpoint with a strict JSON
//! schema attached. The completion envelope is returned untouched; callers
//! decide what to trust in it. A scripted fake client is provided for tests.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tracing::debug;

/// LLM configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Base URL; `/v1/chat/completions` is appended
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_enabled() -> bool {
    true
}

fn default_endpoint() -> String {
    "http://localhost:11434".to_string()
}

fn default_model() -> String {
    "qwen2.5:7b-instruct".to_string()
}

fn default_timeout() -> u64 {
    60
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            endpoint: default_endpoint(),
            model: default_model(),
            api_key: None,
            timeout_secs: default_timeout(),
        }
    }
}

/// LLM errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum LlmError {
    #[error("LLM is disabled in configuration")]
    Disabled,

    #[error("HTTP error: {0}")]
    HttpError(String),

    #[error("Invalid completion envelope: {0}")]
    InvalidJson(String),

    #[error("Request timeout after {0} seconds")]
    Timeout(u64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }
}

/// Structured-output descriptor: one required string field plus the
/// required `propositions` object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputSchema {
    pub name: &'static str,
    pub field: &'static str,
    pub field_description: &'static str,
}

impl OutputSchema {
    pub fn required_fields(&self) -> [&'static str; 2] {
        [self.field, "propositions"]
    }

    pub fn to_json_schema(&self) -> Value {
        let mut properties = serde_json::Map::new();
        properties.insert(
            self.field.to_string(),
            serde_json::json!({
                "type": "string",
                "description": self.field_description,
            }),
        );
        properties.insert(
            "propositions".to_string(),
            serde_json::json!({
                "type": "object",
                "description": "Mapeamento de cada letra proposicional para seu significado",
                "additionalProperties": { "type": "string" },
            }),
        );

        serde_json::json!({
            "type": "object",
            "properties": properties,
            "required": self.required_fields(),
            "additionalProperties": false,
        })
    }

    /// `response_format` body for OpenAI-compatible APIs
    pub fn response_format(&self) -> Value {
        serde_json::json!({
            "type": "json_schema",
            "json_schema": {
                "name": self.name,
                "strict": true,
                "schema": self.to_json_schema(),
            },
        })
    }
}

/// Everything the gateway needs for one call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionRequest {
    pub messages: Vec<ChatMessage>,
    pub schema: OutputSchema,
}

/// Completion envelope as returned by the provider
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Completion {
    #[serde(default)]
    pub choices: Vec<Choice>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Choice {
    #[serde(default)]
    pub message: Option<ChoiceMessage>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChoiceMessage {
    /// A JSON string, or a value some providers hand back already parsed
    #[serde(default)]
    pub content: Option<Value>,
}

impl Completion {
    /// Envelope with one choice whose content is `content`
    pub fn with_content(content: Value) -> Self {
        Self {
            choices: vec![Choice {
                message: Some(ChoiceMessage {
                    content: Some(content),
                }),
            }],
        }
    }

    pub fn from_text(text: impl Into<String>) -> Self {
        Self::with_content(Value::String(text.into()))
    }

    pub fn first_content(&self) -> Option<&Value> {
        self.choices
            .first()
            .and_then(|c| c.message.as_ref())
            .and_then(|m| m.content.as_ref())
    }
}

/// Generic LLM client trait
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, request: &CompletionRequest) -> Result<Completion, LlmError>;
}

/// Real LLM client over HTTP
pub struct HttpLlmClient {
    config: LlmConfig,
    client: reqwest::Client,
}

impl HttpLlmClient {
    pub fn new(config: LlmConfig) -> Result<Self, LlmError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| LlmError::HttpError(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    pub fn config(&self) -> &LlmConfig {
        &self.config
    }

    fn completions_url(&self) -> String {
        format!(
            "{}/v1/chat/completions",
            self.config.endpoint.trim_end_matches('/')
        )
    }
}

#[async_trait]
impl LlmClient for HttpLlmClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<Completion, LlmError> {
        if !self.config.enabled {
            return Err(LlmError::Disabled);
        }

        let url = self.completions_url();
        let body = serde_json::json!({
            "model": self.config.model,
            "messages": request.messages,
            "response_format": request.schema.response_format(),
        });

        debug!("POST {} (schema {})", url, request.schema.name);

        let mut builder = self.client.post(&url).json(&body);
        if let Some(api_key) = &self.config.api_key {
            builder = builder.bearer_auth(api_key);
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                LlmError::Timeout(self.config.timeout_secs)
            } else {
                LlmError::HttpError(format!("Request failed: {}", e))
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            let detail: String = detail.chars().take(200).collect();
            return Err(LlmError::HttpError(format!(
                "HTTP {} from {}: {}",
                status, url, detail
            )));
        }

        response
            .json::<Completion>()
            .await
            .map_err(|e| LlmError::InvalidJson(format!("Failed to parse response: {}", e)))
    }
}

/// Fake LLM client for testing
pub struct FakeLlmClient {
    responses: Mutex<Vec<Result<Completion, LlmError>>>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl FakeLlmClient {
    /// Scripted responses; the last one repeats once the rest are used up
    pub fn new(responses: Vec<Result<Completion, LlmError>>) -> Self {
        Self {
            responses: Mutex::new(responses),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Always answer with `text` as string content
    pub fn with_content(text: &str) -> Self {
        Self::new(vec![Ok(Completion::from_text(text))])
    }

    /// Always answer with `value` as pre-parsed content
    pub fn with_json(value: Value) -> Self {
        Self::new(vec![Ok(Completion::with_content(value))])
    }

    pub fn always_error(error: LlmError) -> Self {
        Self::new(vec![Err(error)])
    }

    pub fn call_count(&self) -> usize {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Requests seen so far, oldest first
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl LlmClient for FakeLlmClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<Completion, LlmError> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request.clone());

        let mut responses = self.responses.lock().unwrap_or_else(PoisonError::into_inner);
        match responses.len() {
            0 => Err(LlmError::HttpError("no scripted response".to_string())),
            1 => responses[0].clone(),
            _ => responses.remove(0),
        }
    }
}
