//! Error types for Logica.

use crate::llm_client::LlmError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TranslateError {
    #[error("{0}")]
    Validation(String),

    #[error("Falha ao obter resposta do LLM")]
    UpstreamEmptyResponse,

    #[error("Resposta do LLM inválida: {0}")]
    MalformedUpstreamPayload(String),

    #[error("Falha na chamada ao LLM: {0}")]
    Upstream(#[from] LlmError),

    #[error("Falha ao gravar tradução: {0}")]
    Persistence(String),
}

impl TranslateError {
    /// Short machine-readable kind, used in logs
    pub fn kind(&self) -> &'static str {
        match self {
            TranslateError::Validation(_) => "validation",
            TranslateError::UpstreamEmptyResponse => "upstream_empty",
            TranslateError::MalformedUpstreamPayload(_) => "upstream_malformed",
            TranslateError::Upstream(_) => "upstream",
            TranslateError::Persistence(_) => "persistence",
        }
    }
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Storage task failed: {0}")]
    Task(String),
}

impl From<StoreError> for TranslateError {
    fn from(e: StoreError) -> Self {
        TranslateError::Persistence(e.to_string())
    }
}
