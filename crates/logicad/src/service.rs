//! Translation operations exposed by the daemon.
//!
//! Each mutating call is: validate -> build prompt -> one LLM call ->
//! normalize -> one store write. Nothing is written unless the LLM call and
//! normalization both succeed.

use crate::auth::AuthenticatedUser;
use logica_shared::prompt;
use logica_shared::{
    normalize, LlmClient, NewTranslation, PropositionMap, PropositionSource, TranslateError,
    TranslationRecord, TranslationRequest, TranslationResult, TranslationStore,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

pub const DEFAULT_HISTORY_LIMIT: i64 = 50;
pub const MAX_HISTORY_LIMIT: i64 = 100;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NlToCpcInput {
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CpcToNlInput {
    pub formula: String,
    #[serde(default)]
    pub propositions: Option<PropositionMap>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HistoryQuery {
    #[serde(default)]
    pub limit: Option<i64>,
}

pub struct TranslationService {
    llm: Arc<dyn LlmClient>,
    store: Arc<dyn TranslationStore>,
}

impl TranslationService {
    pub fn new(llm: Arc<dyn LlmClient>, store: Arc<dyn TranslationStore>) -> Self {
        Self { llm, store }
    }

    /// Portuguese sentence -> CPC formula
    pub async fn nl_to_cpc(
        &self,
        user: &AuthenticatedUser,
        input: NlToCpcInput,
    ) -> Result<TranslationResult, TranslateError> {
        if input.text.trim().is_empty() {
            return Err(TranslateError::Validation(
                "Texto não pode estar vazio".to_string(),
            ));
        }

        self.translate(user, TranslationRequest::NlToCpc { text: input.text })
            .await
    }

    /// CPC formula -> Portuguese sentence.
    ///
    /// Blank meanings in the caller's mapping are dropped; a mapping with
    /// nothing left counts as not supplied.
    pub async fn cpc_to_nl(
        &self,
        user: &AuthenticatedUser,
        input: CpcToNlInput,
    ) -> Result<TranslationResult, TranslateError> {
        if input.formula.trim().is_empty() {
            return Err(TranslateError::Validation(
                "Fórmula não pode estar vazia".to_string(),
            ));
        }

        let propositions = input
            .propositions
            .map(PropositionMap::without_blank_values)
            .filter(|m| !m.is_empty());

        self.translate(
            user,
            TranslationRequest::CpcToNl {
                formula: input.formula,
                propositions,
            },
        )
        .await
    }

    /// The caller's translations, newest first
    pub async fn history(
        &self,
        user: &AuthenticatedUser,
        limit: Option<i64>,
    ) -> Result<Vec<TranslationRecord>, TranslateError> {
        let limit = limit.unwrap_or(DEFAULT_HISTORY_LIMIT);
        if !(1..=MAX_HISTORY_LIMIT).contains(&limit) {
            return Err(TranslateError::Validation(format!(
                "limit deve estar entre 1 e {}",
                MAX_HISTORY_LIMIT
            )));
        }

        let records = self
            .store
            .list_by_user(user.id, limit as u32)
            .await
            .map_err(|e| {
                error!("History read failed for user {}: {}", user.id, e);
                TranslateError::from(e)
            })?;

        debug!("History for user {}: {} records", user.id, records.len());
        Ok(records)
    }

    async fn translate(
        &self,
        user: &AuthenticatedUser,
        request: TranslationRequest,
    ) -> Result<TranslationResult, TranslateError> {
        let start = Instant::now();
        let mode = request.mode();
        debug!("[{}] user {} input: {}", mode, user.id, request.input());

        let completion_request = prompt::build_request(&request);
        let completion = self.llm.complete(&completion_request).await.map_err(|e| {
            warn!("[{}] LLM call failed for user {}: {}", mode, user.id, e);
            TranslateError::from(e)
        })?;

        let normalized = normalize(&completion, &request).map_err(|e| {
            warn!("[{}] Unusable completion for user {}: {}", mode, user.id, e);
            e
        })?;

        if normalized.source != PropositionSource::Model {
            info!(
                "[{}] Model omitted propositions, used {} mapping",
                mode,
                normalized.source.as_str()
            );
        }

        let entry = NewTranslation::from_result(user.id, request.input(), &normalized.result);
        let id = self.store.save(entry).await.map_err(|e| {
            error!("[{}] Failed to save translation for user {}: {}", mode, user.id, e);
            TranslateError::from(e)
        })?;

        info!(
            "[{}] user {} translation {} saved in {} ms",
            mode,
            user.id,
            id,
            start.elapsed().as_millis()
        );

        Ok(normalized.result)
    }
}
