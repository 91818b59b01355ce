//! Translation data model shared by the daemon and its tests.
//!
//! A translation goes one of two ways: Portuguese sentence to CPC formula
//! (`nl_to_cpc`) or formula to sentence (`cpc_to_nl`). Results are a tagged
//! enum so call sites stay exhaustive over the direction.

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::OnceLock;

/// Placeholder prefix used when the model gives no meaning for a letter
pub const PLACEHOLDER_PREFIX: &str = "proposição";

/// Direction of a translation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TranslationMode {
    NlToCpc,
    CpcToNl,
}

impl TranslationMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            TranslationMode::NlToCpc => "nl_to_cpc",
            TranslationMode::CpcToNl => "cpc_to_nl",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "nl_to_cpc" => Some(TranslationMode::NlToCpc),
            "cpc_to_nl" => Some(TranslationMode::CpcToNl),
            _ => None,
        }
    }
}

impl fmt::Display for TranslationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Proposition letter -> natural-language meaning.
///
/// Stored sorted so serialization and equality do not depend on the order
/// the model or the caller produced the entries in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PropositionMap(BTreeMap<String, String>);

impl PropositionMap {
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    pub fn insert(&mut self, letter: impl Into<String>, meaning: impl Into<String>) {
        self.0.insert(letter.into(), meaning.into());
    }

    pub fn get(&self, letter: &str) -> Option<&str> {
        self.0.get(letter).map(String::as_str)
    }

    pub fn contains(&self, letter: &str) -> bool {
        self.0.contains_key(letter)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn letters(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Drop entries whose meaning is empty or whitespace
    pub fn without_blank_values(self) -> Self {
        Self(
            self.0
                .into_iter()
                .filter(|(_, meaning)| !meaning.trim().is_empty())
                .collect(),
        )
    }

    /// Build the placeholder map for every proposition letter in `formula`.
    ///
    /// Letters are ASCII `A`-`Z`; repeats collapse to one entry.
    pub fn placeholders_for(formula: &str) -> Self {
        proposition_letters(formula)
            .into_iter()
            .map(|letter| {
                let meaning = format!("{} {}", PLACEHOLDER_PREFIX, letter);
                (letter, meaning)
            })
            .collect()
    }
}

impl FromIterator<(String, String)> for PropositionMap {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<const N: usize> From<[(&str, &str); N]> for PropositionMap {
    fn from(entries: [(&str, &str); N]) -> Self {
        entries
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }
}

fn letter_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new("[A-Z]").expect("static pattern"))
}

/// Uppercase letters in `formula`, in first-occurrence order, without repeats
pub fn proposition_letters(formula: &str) -> Vec<String> {
    let mut letters: Vec<String> = Vec::new();
    for m in letter_pattern().find_iter(formula) {
        if !letters.iter().any(|l| l == m.as_str()) {
            letters.push(m.as_str().to_string());
        }
    }
    letters
}

/// Normalized translation outcome, keyed by direction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TranslationResult {
    NlToCpc {
        formula: String,
        propositions: PropositionMap,
    },
    CpcToNl {
        text: String,
        propositions: PropositionMap,
    },
}

impl TranslationResult {
    pub fn mode(&self) -> TranslationMode {
        match self {
            TranslationResult::NlToCpc { .. } => TranslationMode::NlToCpc,
            TranslationResult::CpcToNl { .. } => TranslationMode::CpcToNl,
        }
    }

    /// The translated side: the formula or the sentence
    pub fn output(&self) -> &str {
        match self {
            TranslationResult::NlToCpc { formula, .. } => formula,
            TranslationResult::CpcToNl { text, .. } => text,
        }
    }

    pub fn propositions(&self) -> &PropositionMap {
        match self {
            TranslationResult::NlToCpc { propositions, .. }
            | TranslationResult::CpcToNl { propositions, .. } => propositions,
        }
    }
}

/// Input to a translation, one variant per direction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranslationRequest {
    NlToCpc {
        text: String,
    },
    CpcToNl {
        formula: String,
        propositions: Option<PropositionMap>,
    },
}

impl TranslationRequest {
    pub fn mode(&self) -> TranslationMode {
        match self {
            TranslationRequest::NlToCpc { .. } => TranslationMode::NlToCpc,
            TranslationRequest::CpcToNl { .. } => TranslationMode::CpcToNl,
        }
    }

    /// The text submitted by the user: the sentence or the formula
    pub fn input(&self) -> &str {
        match self {
            TranslationRequest::NlToCpc { text } => text,
            TranslationRequest::CpcToNl { formula, .. } => formula,
        }
    }
}

/// A translation about to be persisted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTranslation {
    pub user_id: i64,
    pub mode: TranslationMode,
    pub input: String,
    pub output: String,
    pub propositions: Option<PropositionMap>,
}

impl NewTranslation {
    pub fn from_result(user_id: i64, input: &str, result: &TranslationResult) -> Self {
        Self {
            user_id,
            mode: result.mode(),
            input: input.to_string(),
            output: result.output().to_string(),
            propositions: Some(result.propositions().clone()),
        }
    }
}

/// A persisted translation as returned by the history query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslationRecord {
    pub id: i64,
    pub user_id: i64,
    pub mode: TranslationMode,
    pub input: String,
    pub output: String,
    pub propositions: Option<PropositionMap>,
    pub created_at: DateTime<Utc>,
}
