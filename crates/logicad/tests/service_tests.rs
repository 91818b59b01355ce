//! Translation service end to end, with a scripted LLM and an in-memory store.
//!
//! No network: every completion comes from `FakeLlmClient`.

use async_trait::async_trait;
use logica_shared::{
    Completion, FakeLlmClient, LlmError, NewTranslation, PropositionMap, SqliteTranslationStore,
    StoreError, TranslateError, TranslationMode, TranslationRecord, TranslationResult,
    TranslationStore,
};
use logicad::auth::AuthenticatedUser;
use logicad::service::{CpcToNlInput, NlToCpcInput, TranslationService};
use serde_json::json;
use std::sync::Arc;

fn ana() -> AuthenticatedUser {
    AuthenticatedUser {
        id: 1,
        name: "Ana".to_string(),
    }
}

fn bruno() -> AuthenticatedUser {
    AuthenticatedUser {
        id: 2,
        name: "Bruno".to_string(),
    }
}

async fn service_with(
    llm: FakeLlmClient,
) -> (TranslationService, Arc<FakeLlmClient>, Arc<SqliteTranslationStore>) {
    let llm = Arc::new(llm);
    let store = Arc::new(SqliteTranslationStore::open_in_memory().await.unwrap());
    let service = TranslationService::new(llm.clone(), store.clone());
    (service, llm, store)
}

/// Store whose writes always fail
struct BrokenStore;

#[async_trait]
impl TranslationStore for BrokenStore {
    async fn save(&self, _entry: NewTranslation) -> Result<i64, StoreError> {
        Err(StoreError::Task("disk full".to_string()))
    }

    async fn list_by_user(
        &self,
        _user_id: i64,
        _limit: u32,
    ) -> Result<Vec<TranslationRecord>, StoreError> {
        Err(StoreError::Task("disk full".to_string()))
    }
}

// ============================================================================
// Validation
// ============================================================================

#[tokio::test]
async fn test_blank_text_rejected_without_llm_call() {
    let (service, llm, store) = service_with(FakeLlmClient::with_content("{}")).await;

    for text in ["", "   ", "\n\t"] {
        let err = service
            .nl_to_cpc(&ana(), NlToCpcInput { text: text.into() })
            .await
            .unwrap_err();
        assert!(matches!(err, TranslateError::Validation(ref m) if m == "Texto não pode estar vazio"));
    }

    let err = service
        .cpc_to_nl(
            &ana(),
            CpcToNlInput {
                formula: "  ".into(),
                propositions: None,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, TranslateError::Validation(ref m) if m == "Fórmula não pode estar vazia"));

    assert_eq!(llm.call_count(), 0);
    assert_eq!(store.count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_history_limit_bounds() {
    let (service, _llm, _store) = service_with(FakeLlmClient::with_content("{}")).await;

    for bad in [0, -1, 101, 1000] {
        let err = service.history(&ana(), Some(bad)).await.unwrap_err();
        assert!(matches!(err, TranslateError::Validation(_)), "limit {}", bad);
    }
    assert!(service.history(&ana(), Some(1)).await.unwrap().is_empty());
    assert!(service.history(&ana(), Some(100)).await.unwrap().is_empty());
    assert!(service.history(&ana(), None).await.unwrap().is_empty());
}

// ============================================================================
// Sample scenarios
// ============================================================================

#[tokio::test]
async fn test_conditional_sentence() {
    let (service, llm, _store) = service_with(FakeLlmClient::with_json(json!({
        "formula": "P → Q",
        "propositions": { "P": "chove", "Q": "a grama fica molhada" }
    })))
    .await;

    let result = service
        .nl_to_cpc(
            &ana(),
            NlToCpcInput {
                text: "Se chover, então a grama ficará molhada.".into(),
            },
        )
        .await
        .unwrap();

    assert!(result.output().contains('→'));
    assert!(result.propositions().len() >= 2);
    assert_eq!(llm.call_count(), 1);

    let history = service.history(&ana(), Some(1)).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].mode, TranslationMode::NlToCpc);
    assert_eq!(history[0].input, "Se chover, então a grama ficará molhada.");
    assert_eq!(history[0].output, "P → Q");
    assert_eq!(history[0].propositions.as_ref(), Some(result.propositions()));
}

#[tokio::test]
async fn test_negated_sentence_with_fallback() {
    let (service, _llm, _store) =
        service_with(FakeLlmClient::with_content(r#"{"formula": "¬P", "propositions": {}}"#)).await;

    let result = service
        .nl_to_cpc(
            &ana(),
            NlToCpcInput {
                text: "Não está chovendo.".into(),
            },
        )
        .await
        .unwrap();

    assert!(result.output().contains('¬'));
    assert_eq!(result.propositions().get("P"), Some("proposição P"));
    assert_eq!(result.propositions().len(), 1);
}

#[tokio::test]
async fn test_formula_without_propositions_uses_request_letters() {
    let (service, llm, _store) = service_with(FakeLlmClient::with_json(json!({
        "text": "Se P e Q, então R."
    })))
    .await;

    let result = service
        .cpc_to_nl(
            &ana(),
            CpcToNlInput {
                formula: "(P ∧ Q) → R".into(),
                propositions: None,
            },
        )
        .await
        .unwrap();

    let keys: Vec<&str> = result.propositions().letters().collect();
    assert_eq!(keys, vec!["P", "Q", "R"]);
    assert!(!result.output().is_empty());

    // The prompt carries no meanings section without a mapping
    let requests = llm.requests();
    let user_msg = &requests[0].messages.last().unwrap().content;
    assert_eq!(user_msg, "Fórmula: (P ∧ Q) → R");

    let history = service.history(&ana(), Some(5)).await.unwrap();
    assert_eq!(history[0].mode, TranslationMode::CpcToNl);
    assert_eq!(history[0].input, "(P ∧ Q) → R");
    assert_eq!(history[0].output, "Se P e Q, então R.");
}

#[tokio::test]
async fn test_caller_mapping_adopted_and_blank_entries_dropped() {
    let (service, llm, _store) =
        service_with(FakeLlmClient::with_json(json!({ "text": "Chove e faz frio." }))).await;

    let supplied = PropositionMap::from([("P", "chove"), ("Q", "faz frio"), ("R", "   ")]);
    let result = service
        .cpc_to_nl(
            &ana(),
            CpcToNlInput {
                formula: "P ∧ Q".into(),
                propositions: Some(supplied),
            },
        )
        .await
        .unwrap();

    let expected = PropositionMap::from([("P", "chove"), ("Q", "faz frio")]);
    assert_eq!(result.propositions(), &expected);

    let requests = llm.requests();
    let user_msg = &requests[0].messages.last().unwrap().content;
    assert!(user_msg.contains("P: chove"));
    assert!(!user_msg.contains("R:"));
}

#[tokio::test]
async fn test_all_blank_caller_mapping_counts_as_absent() {
    let (service, _llm, _store) =
        service_with(FakeLlmClient::with_json(json!({ "text": "Chove." }))).await;

    let result = service
        .cpc_to_nl(
            &ana(),
            CpcToNlInput {
                formula: "P".into(),
                propositions: Some(PropositionMap::from([("P", "")])),
            },
        )
        .await
        .unwrap();

    assert_eq!(result.propositions().get("P"), Some("proposição P"));
}

// ============================================================================
// History
// ============================================================================

#[tokio::test]
async fn test_history_newest_first_and_per_user() {
    let responses = vec![
        Ok(Completion::with_content(json!({ "formula": "P", "propositions": { "P": "a" } }))),
        Ok(Completion::with_content(json!({ "formula": "Q", "propositions": { "Q": "b" } }))),
        Ok(Completion::with_content(json!({ "text": "c", "propositions": { "R": "c" } }))),
    ];
    let (service, _llm, _store) = service_with(FakeLlmClient::new(responses)).await;

    service
        .nl_to_cpc(&ana(), NlToCpcInput { text: "primeira".into() })
        .await
        .unwrap();
    service
        .nl_to_cpc(&ana(), NlToCpcInput { text: "segunda".into() })
        .await
        .unwrap();
    service
        .cpc_to_nl(
            &bruno(),
            CpcToNlInput {
                formula: "R".into(),
                propositions: None,
            },
        )
        .await
        .unwrap();

    let ana_history = service.history(&ana(), None).await.unwrap();
    let inputs: Vec<&str> = ana_history.iter().map(|r| r.input.as_str()).collect();
    assert_eq!(inputs, vec!["segunda", "primeira"]);
    assert!(ana_history.iter().all(|r| r.user_id == 1));

    let limited = service.history(&ana(), Some(1)).await.unwrap();
    assert_eq!(limited.len(), 1);
    assert_eq!(limited[0].input, "segunda");

    let bruno_history = service.history(&bruno(), None).await.unwrap();
    assert_eq!(bruno_history.len(), 1);
    assert_eq!(bruno_history[0].output, "c");
}

// ============================================================================
// Failures
// ============================================================================

#[tokio::test]
async fn test_failed_translation_writes_nothing() {
    let cases = vec![
        FakeLlmClient::always_error(LlmError::Timeout(60)),
        FakeLlmClient::with_content("desculpe, não consegui"),
        FakeLlmClient::with_json(json!({ "propositions": { "P": "x" } })),
        FakeLlmClient::new(vec![Ok(Completion::default())]),
    ];

    for llm in cases {
        let (service, llm, store) = service_with(llm).await;
        let err = service
            .nl_to_cpc(&ana(), NlToCpcInput { text: "Chove.".into() })
            .await
            .unwrap_err();
        assert!(
            matches!(
                err,
                TranslateError::Upstream(_)
                    | TranslateError::MalformedUpstreamPayload(_)
                    | TranslateError::UpstreamEmptyResponse
            ),
            "unexpected error: {:?}",
            err
        );
        assert_eq!(llm.call_count(), 1);
        assert_eq!(store.count().await.unwrap(), 0);
    }
}

#[tokio::test]
async fn test_persistence_failure_surfaces() {
    let llm = Arc::new(FakeLlmClient::with_json(json!({
        "formula": "P",
        "propositions": { "P": "chove" }
    })));
    let service = TranslationService::new(llm.clone(), Arc::new(BrokenStore));

    let err = service
        .nl_to_cpc(&ana(), NlToCpcInput { text: "Chove.".into() })
        .await
        .unwrap_err();
    assert!(matches!(err, TranslateError::Persistence(ref m) if m.contains("disk full")));
    assert_eq!(llm.call_count(), 1);

    let err = service.history(&ana(), None).await.unwrap_err();
    assert!(matches!(err, TranslateError::Persistence(_)));
}

#[tokio::test]
async fn test_result_shape_matches_direction() {
    let (service, _llm, _store) = service_with(FakeLlmClient::with_json(json!({
        "formula": "P ∨ Q",
        "propositions": { "P": "a", "Q": "b" }
    })))
    .await;

    let result = service
        .nl_to_cpc(&ana(), NlToCpcInput { text: "a ou b".into() })
        .await
        .unwrap();
    assert!(matches!(result, TranslationResult::NlToCpc { .. }));
    assert_eq!(
        serde_json::to_value(&result).unwrap(),
        json!({ "formula": "P ∨ Q", "propositions": { "P": "a", "Q": "b" } })
    );
}
