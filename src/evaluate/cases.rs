//! Test-case loading and validation for the evaluation pass.

use crate::error::{PrbenchError, Result};
use serde::Serialize;
use serde_json::{Map, Value};
use std::path::Path;

/// One test case in the shape the evaluation loop consumes.
#[derive(Debug, Clone, Serialize)]
pub struct TestCase {
    pub id: String,
    pub question: String,
    pub ground_truth: String,
    pub facts: Vec<String>,
    pub metadata: Map<String, Value>,
    pub system_answer: String,
}

/// Load the raw test-case array from a JSON file.
pub fn load_test_cases(path: &Path) -> Result<Vec<Value>> {
    let content = std::fs::read_to_string(path)?;
    let cases: Vec<Value> = serde_json::from_str(&content)?;
    Ok(cases)
}

/// Validate raw test cases and convert them into the standard shape.
///
/// The answer field name is configurable so datasets produced by different
/// target systems can be evaluated unchanged. A missing required field on
/// the first record aborts the whole batch with a descriptive error, since
/// proceeding would produce meaningless output for every case.
pub fn prepare_test_cases(raw: Vec<Value>, answer_field: &str) -> Result<Vec<TestCase>> {
    if raw.is_empty() {
        return Err(PrbenchError::InvalidInput("Test cases list is empty".to_string()));
    }

    let required = ["question", "facts", answer_field];
    let first = &raw[0];
    let missing: Vec<&str> = required
        .iter()
        .filter(|field| first.get(**field).is_none())
        .copied()
        .collect();
    if !missing.is_empty() {
        let found: Vec<String> = first
            .as_object()
            .map(|obj| obj.keys().cloned().collect())
            .unwrap_or_default();
        return Err(PrbenchError::InvalidInput(format!(
            "Test cases are missing required fields: {:?}. Required: question, facts, {}. Found: {:?}",
            missing, answer_field, found
        )));
    }

    let mut prepared = Vec::with_capacity(raw.len());
    for (index, case) in raw.iter().enumerate() {
        let question = case
            .get("question")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                PrbenchError::InvalidInput(format!("Test case {} has no question", index))
            })?
            .to_string();

        let facts = case
            .get("facts")
            .and_then(Value::as_array)
            .ok_or_else(|| PrbenchError::InvalidInput(format!("Test case {} has no facts array", index)))?
            .iter()
            .map(|fact| match fact {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect();

        // Older datasets used `answer` instead of `ground_truth_answer`
        let ground_truth = case
            .get("ground_truth_answer")
            .or_else(|| case.get("answer"))
            .and_then(Value::as_str)
            .unwrap_or("")
            .to_string();

        let id = match case.get("id") {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            _ => "N/A".to_string(),
        };

        let metadata = case
            .get("metadata")
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default();

        let system_answer = case
            .get(answer_field)
            .and_then(Value::as_str)
            .unwrap_or("")
            .to_string();

        prepared.push(TestCase {
            id,
            question,
            ground_truth,
            facts,
            metadata,
            system_answer,
        });
    }

    log::info!("Validated and prepared {} test cases", prepared.len());
    Ok(prepared)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_prepare_standard_cases() {
        let raw = vec![json!({
            "id": "abc123",
            "question": "What changed?",
            "ground_truth_answer": "The retry loop.",
            "facts": ["fact one", "fact two"],
            "metadata": {"difficulty": "easy"},
            "system_answer": "The retry loop was reworked."
        })];
        let cases = prepare_test_cases(raw, "system_answer").unwrap();
        assert_eq!(cases.len(), 1);
        assert_eq!(cases[0].id, "abc123");
        assert_eq!(cases[0].facts.len(), 2);
        assert_eq!(cases[0].ground_truth, "The retry loop.");
        assert_eq!(cases[0].metadata.get("difficulty").unwrap(), "easy");
    }

    #[test]
    fn test_prepare_empty_list_is_fatal() {
        let err = prepare_test_cases(vec![], "system_answer").unwrap_err();
        assert!(matches!(err, PrbenchError::InvalidInput(_)));
    }

    #[test]
    fn test_prepare_missing_field_on_first_record_is_fatal() {
        let raw = vec![json!({"question": "q", "facts": ["f"]})];
        let err = prepare_test_cases(raw, "system_answer").unwrap_err();
        let message = err.to_string();
        assert!(message.contains("system_answer"));
        assert!(message.contains("missing required fields"));
    }

    #[test]
    fn test_prepare_custom_answer_field() {
        let raw = vec![json!({
            "question": "q",
            "facts": ["f"],
            "wiki_answer": "from the wiki"
        })];
        let cases = prepare_test_cases(raw, "wiki_answer").unwrap();
        assert_eq!(cases[0].system_answer, "from the wiki");
    }

    #[test]
    fn test_prepare_fallbacks() {
        let raw = vec![json!({
            "question": "q",
            "facts": ["f"],
            "answer": "legacy ground truth",
            "system_answer": ""
        })];
        let cases = prepare_test_cases(raw, "system_answer").unwrap();
        assert_eq!(cases[0].id, "N/A");
        assert_eq!(cases[0].ground_truth, "legacy ground truth");
        assert!(cases[0].system_answer.is_empty());
        assert!(cases[0].metadata.is_empty());
    }

    #[test]
    fn test_prepare_numeric_id() {
        let raw = vec![json!({
            "id": 17,
            "question": "q",
            "facts": ["f"],
            "system_answer": "a"
        })];
        let cases = prepare_test_cases(raw, "system_answer").unwrap();
        assert_eq!(cases[0].id, "17");
    }
}
