//! One-shot LLM diagnostics.
//!
//! Sends a single translation prompt to the configured endpoint and shows
//! what came back before and after normalization. Nothing is persisted.

use logica_shared::prompt;
use logica_shared::{
    normalize, LlmClient, LlmError, Normalized, PropositionMap, TranslateError,
    TranslationRequest,
};
use serde_json::Value;
use std::time::{Duration, Instant};

/// Outcome of one diagnostic call
#[derive(Debug)]
pub struct DebugReport {
    pub elapsed: Duration,
    /// First choice's content exactly as received
    pub raw_content: Option<Value>,
    pub normalized: Result<Normalized, TranslateError>,
}

/// Build the request for `debug-llm` from CLI arguments.
///
/// `propositions` entries use `L=meaning`; malformed entries are rejected.
pub fn request_from_args(
    text: Option<String>,
    formula: Option<String>,
    propositions: &[String],
) -> anyhow::Result<TranslationRequest> {
    match (text, formula) {
        (Some(text), None) => Ok(TranslationRequest::NlToCpc { text }),
        (None, Some(formula)) => {
            let mut map = PropositionMap::new();
            for entry in propositions {
                let (letter, meaning) = entry
                    .split_once('=')
                    .ok_or_else(|| anyhow::anyhow!("Expected L=meaning, got '{}'", entry))?;
                map.insert(letter.trim(), meaning.trim());
            }
            let map = map.without_blank_values();
            Ok(TranslationRequest::CpcToNl {
                formula,
                propositions: (!map.is_empty()).then_some(map),
            })
        }
        (Some(_), Some(_)) => anyhow::bail!("Pass either --text or --formula, not both"),
        (None, None) => anyhow::bail!("One of --text or --formula is required"),
    }
}

/// Send `request` once and normalize the reply
pub async fn probe(
    llm: &dyn LlmClient,
    request: &TranslationRequest,
) -> Result<DebugReport, LlmError> {
    let completion_request = prompt::build_request(request);
    let start = Instant::now();
    let completion = llm.complete(&completion_request).await?;
    let elapsed = start.elapsed();

    Ok(DebugReport {
        elapsed,
        raw_content: completion.first_content().cloned(),
        normalized: normalize(&completion, request),
    })
}

pub fn print_report(request: &TranslationRequest, report: &DebugReport) {
    println!("Mode:     {}", request.mode());
    println!("Input:    {}", request.input());
    println!("Elapsed:  {} ms", report.elapsed.as_millis());
    println!();
    println!("Raw content:");
    match &report.raw_content {
        Some(Value::String(s)) => println!("{}", s),
        Some(other) => println!("{}", other),
        None => println!("(none)"),
    }
    println!();
    match &report.normalized {
        Ok(normalized) => {
            println!("Normalized (propositions from {}):", normalized.source.as_str());
            match serde_json::to_string_pretty(&normalized.result) {
                Ok(json) => println!("{}", json),
                Err(e) => println!("(unprintable: {})", e),
            }
        }
        Err(e) => println!("Normalization failed [{}]: {}", e.kind(), e),
    }
}
