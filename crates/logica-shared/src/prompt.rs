//! Prompt building for both translation directions.
//!
//! Pure: the same input always renders the same messages and schema.

use crate::llm_client::{ChatMessage, CompletionRequest, OutputSchema};
use crate::translation::{PropositionMap, TranslationRequest};

/// A connective the model may use, with its Portuguese readings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Connective {
    pub symbol: &'static str,
    pub name: &'static str,
    /// Phrases that signal this connective in a sentence
    pub sentence_readings: &'static [&'static str],
    /// Phrases used when rendering this connective as Portuguese
    pub rendered_readings: &'static [&'static str],
}

pub const CONNECTIVES: &[Connective] = &[
    Connective {
        symbol: "∧",
        name: "conjunção",
        sentence_readings: &["e"],
        rendered_readings: &["e"],
    },
    Connective {
        symbol: "∨",
        name: "disjunção",
        sentence_readings: &["ou"],
        rendered_readings: &["ou"],
    },
    Connective {
        symbol: "¬",
        name: "negação",
        sentence_readings: &["não"],
        rendered_readings: &["não"],
    },
    Connective {
        symbol: "→",
        name: "implicação",
        sentence_readings: &["se... então", "implica"],
        rendered_readings: &["se... então", "implica que"],
    },
    Connective {
        symbol: "↔",
        name: "bicondicional",
        sentence_readings: &["se e somente se"],
        rendered_readings: &["se e somente se"],
    },
];

/// `"a", "b"`
fn quoted(readings: &[&str]) -> String {
    readings
        .iter()
        .map(|r| format!("\"{}\"", r))
        .collect::<Vec<_>>()
        .join(", ")
}

pub const NL_TO_CPC_SCHEMA: OutputSchema = OutputSchema {
    name: "cpc_translation",
    field: "formula",
    field_description: "A fórmula lógica em CPC usando conectivos ∧, ∨, ¬, →, ↔",
};

pub const CPC_TO_NL_SCHEMA: OutputSchema = OutputSchema {
    name: "nl_translation",
    field: "text",
    field_description: "A frase em português natural",
};

const NL_TO_CPC_RULES: &str = r#"Regras OBRIGATÓRIAS:
1. Identifique as proposições atômicas na frase
2. Atribua letras maiúsculas (P, Q, R, S, etc.) para cada proposição
3. Traduza a estrutura lógica usando os conectivos apropriados
4. SEMPRE inclua o objeto 'propositions' com TODAS as letras usadas na fórmula
5. Retorne APENAS um JSON válido com a estrutura especificada

Exemplos:
Input: "Se chover, então a grama ficará molhada."
Output: {"formula": "P → Q", "propositions": {"P": "chover", "Q": "a grama ficará molhada"}}

Input: "João vai ao cinema e Maria vai ao teatro."
Output: {"formula": "P ∧ Q", "propositions": {"P": "João vai ao cinema", "Q": "Maria vai ao teatro"}}

Input: "Se chover e fizer frio, então a aula será cancelada."
Output: {"formula": "(P ∧ Q) → R", "propositions": {"P": "chover", "Q": "fizer frio", "R": "a aula será cancelada"}}

Input: "Não está chovendo."
Output: {"formula": "¬P", "propositions": {"P": "está chovendo"}}"#;

const CPC_TO_NL_RULES: &str = r#"Regras OBRIGATÓRIAS:
1. Se o usuário fornecer significados para as proposições, use-os EXATAMENTE como fornecidos
2. Se não fornecer, crie significados coerentes e naturais
3. Traduza a estrutura lógica para uma frase fluente em português
4. A frase deve ser gramaticalmente correta e natural
5. SEMPRE inclua o objeto 'propositions' com TODAS as letras usadas na fórmula
6. Retorne APENAS um JSON válido com a estrutura especificada

Exemplos:
Input: P → Q (P: chover, Q: a grama ficará molhada)
Output: {"text": "Se chover, então a grama ficará molhada.", "propositions": {"P": "chover", "Q": "a grama ficará molhada"}}

Input: (P ∧ Q) → R
Output: {"text": "Se chover e fizer frio, então a aula será cancelada.", "propositions": {"P": "chover", "Q": "fizer frio", "R": "a aula será cancelada"}}

Input: ¬P ∨ Q
Output: {"text": "Ou não está chovendo, ou a grama está molhada.", "propositions": {"P": "está chovendo", "Q": "a grama está molhada"}}"#;

fn nl_to_cpc_system_prompt() -> String {
    let mut prompt = String::from(
        "Você é um especialista em lógica proposicional clássica. Sua tarefa é traduzir \
         frases em português para fórmulas do Cálculo Proposicional Clássico (CPC).\n\n\
         Conectivos lógicos disponíveis:\n",
    );
    for c in CONNECTIVES {
        prompt.push_str(&format!(
            "- {} ({} - {})\n",
            c.symbol,
            c.name,
            quoted(c.sentence_readings)
        ));
    }
    prompt.push('\n');
    prompt.push_str(NL_TO_CPC_RULES);
    prompt
}

fn cpc_to_nl_system_prompt() -> String {
    let mut prompt = String::from(
        "Você é um especialista em lógica proposicional clássica. Sua tarefa é traduzir \
         fórmulas do Cálculo Proposicional Clássico (CPC) para frases em português natural \
         e fluente.\n\n\
         Conectivos lógicos:\n",
    );
    for c in CONNECTIVES {
        prompt.push_str(&format!(
            "- {} ({}) → {}\n",
            c.symbol,
            c.name,
            quoted(c.rendered_readings)
        ));
    }
    prompt.push('\n');
    prompt.push_str(CPC_TO_NL_RULES);
    prompt
}

/// Render a caller-supplied mapping as `letter: meaning` lines
fn render_propositions(propositions: &PropositionMap) -> String {
    propositions
        .iter()
        .map(|(letter, meaning)| format!("{}: {}", letter, meaning))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Sentence -> formula
pub fn build_nl_to_cpc(text: &str) -> CompletionRequest {
    CompletionRequest {
        messages: vec![
            ChatMessage::system(nl_to_cpc_system_prompt()),
            ChatMessage::user(text),
        ],
        schema: NL_TO_CPC_SCHEMA,
    }
}

/// Formula -> sentence, reusing `propositions` verbatim when given
pub fn build_cpc_to_nl(formula: &str, propositions: Option<&PropositionMap>) -> CompletionRequest {
    let mut user = format!("Fórmula: {}", formula);
    if let Some(map) = propositions.filter(|m| !m.is_empty()) {
        user.push_str("\n\nSignificado das proposições:\n");
        user.push_str(&render_propositions(map));
    }

    CompletionRequest {
        messages: vec![
            ChatMessage::system(cpc_to_nl_system_prompt()),
            ChatMessage::user(user),
        ],
        schema: CPC_TO_NL_SCHEMA,
    }
}

pub fn build_request(request: &TranslationRequest) -> CompletionRequest {
    match request {
        TranslationRequest::NlToCpc { text } => build_nl_to_cpc(text),
        TranslationRequest::CpcToNl {
            formula,
            propositions,
        } => build_cpc_to_nl(formula, propositions.as_ref()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::ChatRole;

    #[test]
    fn test_nl_to_cpc_messages() {
        let request = build_nl_to_cpc("Não está chovendo.");
        assert_eq!(request.messages.len(), 2);
        assert_eq!(request.messages[0].role, ChatRole::System);
        assert_eq!(request.messages[1].role, ChatRole::User);
        assert_eq!(request.messages[1].content, "Não está chovendo.");
        assert_eq!(request.schema.name, "cpc_translation");
        assert_eq!(request.schema.field, "formula");
    }

    #[test]
    fn test_nl_to_cpc_system_prompt_lists_connectives() {
        let request = build_nl_to_cpc("x");
        let system = &request.messages[0].content;
        for symbol in ["∧", "∨", "¬", "→", "↔"] {
            assert!(system.contains(symbol), "missing {}", symbol);
        }
        assert!(system.contains("TODAS as letras"));
        assert!(system.contains("(P ∧ Q) → R"));
    }

    #[test]
    fn test_connective_readings_per_direction() {
        let nl_request = build_nl_to_cpc("x");
        let nl = &nl_request.messages[0].content;
        assert!(nl.contains("- → (implicação - \"se... então\", \"implica\")\n"));
        assert!(nl.contains("- ∧ (conjunção - \"e\")\n"));

        let cpc_request = build_cpc_to_nl("P", None);
        let cpc = &cpc_request.messages[0].content;
        assert!(cpc.contains("- → (implicação) → \"se... então\", \"implica que\"\n"));
        assert!(cpc.contains("- ↔ (bicondicional) → \"se e somente se\"\n"));
    }

    #[test]
    fn test_cpc_to_nl_without_propositions() {
        let request = build_cpc_to_nl("(P ∧ Q) → R", None);
        assert_eq!(request.messages[1].content, "Fórmula: (P ∧ Q) → R");
        assert_eq!(request.schema.field, "text");
        assert_eq!(request.schema.name, "nl_translation");
    }

    #[test]
    fn test_cpc_to_nl_renders_propositions() {
        let map = PropositionMap::from([("Q", "a grama ficará molhada"), ("P", "chover")]);
        let request = build_cpc_to_nl("P → Q", Some(&map));
        assert_eq!(
            request.messages[1].content,
            "Fórmula: P → Q\n\nSignificado das proposições:\nP: chover\nQ: a grama ficará molhada"
        );
        assert!(request.messages[0].content.contains("EXATAMENTE"));
    }

    #[test]
    fn test_cpc_to_nl_empty_map_omits_section() {
        let request = build_cpc_to_nl("¬P", Some(&PropositionMap::new()));
        assert!(!request.messages[1].content.contains("Significado"));
    }

    #[test]
    fn test_build_is_deterministic() {
        let req = TranslationRequest::CpcToNl {
            formula: "P ∨ Q".to_string(),
            propositions: Some(PropositionMap::from([("P", "a"), ("Q", "b")])),
        };
        assert_eq!(build_request(&req), build_request(&req));
    }
}
