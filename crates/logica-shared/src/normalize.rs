//! Completion normalization.
//!
//! Turns an untrusted completion envelope into a [`TranslationResult`].
//! The shape is validated before any field is trusted. A missing or empty
//! `propositions` object is repaired, never reported as an error.

use crate::error::TranslateError;
use crate::llm_client::Completion;
use crate::translation::{PropositionMap, TranslationRequest, TranslationResult};
use serde_json::{Map, Value};

/// Where the result's proposition map came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropositionSource {
    Model,
    Caller,
    Placeholder,
}

impl PropositionSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            PropositionSource::Model => "model",
            PropositionSource::Caller => "caller",
            PropositionSource::Placeholder => "placeholder",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Normalized {
    pub result: TranslationResult,
    pub source: PropositionSource,
}

/// Validate `completion` against the shape `request` expects
pub fn normalize(
    completion: &Completion,
    request: &TranslationRequest,
) -> Result<Normalized, TranslateError> {
    let payload = payload_of(completion)?;
    let object = payload.as_object().ok_or_else(|| {
        TranslateError::MalformedUpstreamPayload("payload is not a JSON object".to_string())
    })?;

    match request {
        TranslationRequest::NlToCpc { .. } => {
            let formula = required_string(object, "formula")?;
            let (propositions, source) = match model_propositions(object) {
                Some(map) => (map, PropositionSource::Model),
                None => (
                    PropositionMap::placeholders_for(&formula),
                    PropositionSource::Placeholder,
                ),
            };
            Ok(Normalized {
                result: TranslationResult::NlToCpc {
                    formula,
                    propositions,
                },
                source,
            })
        }
        TranslationRequest::CpcToNl {
            formula,
            propositions: supplied,
        } => {
            let text = required_string(object, "text")?;
            let (propositions, source) = match model_propositions(object) {
                Some(map) => (map, PropositionSource::Model),
                None => match supplied.as_ref().filter(|m| !m.is_empty()) {
                    Some(map) => (map.clone(), PropositionSource::Caller),
                    None => (
                        PropositionMap::placeholders_for(formula),
                        PropositionSource::Placeholder,
                    ),
                },
            };
            Ok(Normalized {
                result: TranslationResult::CpcToNl { text, propositions },
                source,
            })
        }
    }
}

/// Pull the JSON payload out of the first choice
fn payload_of(completion: &Completion) -> Result<Value, TranslateError> {
    match completion.first_content() {
        None | Some(Value::Null) => Err(TranslateError::UpstreamEmptyResponse),
        Some(Value::String(text)) => {
            if text.trim().is_empty() {
                return Err(TranslateError::UpstreamEmptyResponse);
            }
            serde_json::from_str(strip_code_fence(text)).map_err(|e| {
                TranslateError::MalformedUpstreamPayload(format!("content is not JSON: {}", e))
            })
        }
        Some(other) => Ok(other.clone()),
    }
}

/// Remove one surrounding ``` or ```json fence, if present
fn strip_code_fence(text: &str) -> &str {
    let t = text.trim();
    let Some(rest) = t.strip_prefix("```") else {
        return t;
    };
    let Some(body) = rest.strip_suffix("```") else {
        return t;
    };
    // Drop the info string ("json") on the opening line.
    match body.find('\n') {
        Some(newline) => body[newline + 1..].trim(),
        None => body.trim(),
    }
}

fn required_string(object: &Map<String, Value>, field: &str) -> Result<String, TranslateError> {
    match object.get(field) {
        Some(Value::String(s)) if !s.trim().is_empty() => Ok(s.clone()),
        Some(Value::String(_)) => Err(TranslateError::MalformedUpstreamPayload(format!(
            "field '{}' is empty",
            field
        ))),
        Some(_) => Err(TranslateError::MalformedUpstreamPayload(format!(
            "field '{}' is not a string",
            field
        ))),
        None => Err(TranslateError::MalformedUpstreamPayload(format!(
            "missing field '{}'",
            field
        ))),
    }
}

/// The model's own mapping, or `None` if it is absent, not an object, or empty
fn model_propositions(object: &Map<String, Value>) -> Option<PropositionMap> {
    let entries = object.get("propositions")?.as_object()?;
    let map: PropositionMap = entries
        .iter()
        .filter_map(|(letter, meaning)| match meaning {
            Value::Null => None,
            Value::String(s) => Some((letter.clone(), s.clone())),
            other => Some((letter.clone(), other.to_string())),
        })
        .collect();

    if map.is_empty() {
        None
    } else {
        Some(map)
    }
}
