//! Shared types and building blocks for the Logica translation daemon.

pub mod error;
pub mod llm_client;
pub mod normalize;
pub mod prompt;
pub mod store;
pub mod translation;

pub use error::{StoreError, TranslateError};
pub use llm_client::{
    ChatMessage, ChatRole, Completion, CompletionRequest, FakeLlmClient, HttpLlmClient, LlmClient,
    LlmConfig, LlmError, OutputSchema,
};
pub use normalize::{normalize, Normalized, PropositionSource};
pub use store::{DbLocation, SqliteTranslationStore, TranslationStore};
pub use translation::{
    proposition_letters, NewTranslation, PropositionMap, TranslationMode, TranslationRecord,
    TranslationRequest, TranslationResult,
};
