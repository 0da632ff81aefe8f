//! Judge response parsing: code-fence extraction and one-shot resolution of
//! the response shape into a tagged union.

use crate::error::{PrbenchError, Result};
use serde::Deserialize;
use serde_json::Value;

/// A parsed judge response.
///
/// The shape is resolved exactly once, here: downstream code matches on the
/// variant instead of re-probing for keys.
#[derive(Debug)]
pub enum EvaluatorResponse {
    /// Current rubric shape with per-criterion scores.
    Rubric(RubricResponse),
    /// Legacy shape carrying a single 0-100 score.
    Legacy(LegacyResponse),
}

#[derive(Debug, Deserialize)]
pub struct RubricResponse {
    pub scores: RubricScores,
    #[serde(default)]
    pub reasoning: Option<RubricReasoning>,
    #[serde(default)]
    pub summary: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RubricScores {
    #[serde(default)]
    pub factual_correctness: f64,
    #[serde(default)]
    pub fact_coverage: f64,
    #[serde(default)]
    pub specificity: Specificity,
}

#[derive(Debug, Deserialize)]
pub struct RubricReasoning {
    /// Facts the judge claims the answer covered; only the count is used.
    #[serde(default)]
    pub facts_found: Vec<Value>,
}

#[derive(Debug, Deserialize)]
pub struct LegacyResponse {
    pub score: f64,
}

/// Specificity sub-score: a number, or the "not applicable" sentinel.
///
/// The sentinel (`"N/A"`, null, or a missing field) is distinct from a real
/// zero; the aggregator records it separately.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Specificity {
    Score(f64),
    NotApplicable,
}

impl Default for Specificity {
    fn default() -> Self {
        Specificity::NotApplicable
    }
}

impl<'de> Deserialize<'de> for Specificity {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        match value {
            Value::Null => Ok(Specificity::NotApplicable),
            Value::Number(n) => n
                .as_f64()
                .map(Specificity::Score)
                .ok_or_else(|| serde::de::Error::custom("specificity is not a finite number")),
            Value::String(s) if s.eq_ignore_ascii_case("n/a") => Ok(Specificity::NotApplicable),
            other => Err(serde::de::Error::custom(format!(
                "unrecognized specificity value: {}",
                other
            ))),
        }
    }
}

impl EvaluatorResponse {
    /// Parse free judge text that may wrap its JSON in code fences.
    ///
    /// Dispatches on which top-level keys are present: `scores` selects the
    /// rubric shape, `score` the legacy shape. Anything else is a parse
    /// error the caller turns into an error-tagged zero score.
    pub fn parse(text: &str) -> Result<Self> {
        let block = extract_json_block(text);
        let value: Value = serde_json::from_str(block)
            .map_err(|e| PrbenchError::Parse(format!("judge response is not valid JSON: {}", e)))?;

        if value.get("scores").is_some() {
            let rubric: RubricResponse = serde_json::from_value(value)
                .map_err(|e| PrbenchError::Parse(format!("malformed rubric response: {}", e)))?;
            Ok(EvaluatorResponse::Rubric(rubric))
        } else if value.get("score").is_some() {
            let legacy: LegacyResponse = serde_json::from_value(value)
                .map_err(|e| PrbenchError::Parse(format!("malformed legacy response: {}", e)))?;
            Ok(EvaluatorResponse::Legacy(legacy))
        } else {
            Err(PrbenchError::Parse(
                "unrecognized judge response shape (neither 'scores' nor 'score' present)".to_string(),
            ))
        }
    }
}

/// Extract the JSON payload from judge text.
///
/// Prefers a ```json fence, then a generic ``` fence, else the whole text.
/// An unclosed fence runs to the end of the text.
pub fn extract_json_block(text: &str) -> &str {
    if let Some(start) = text.find("```json") {
        let rest = &text[start + 7..];
        return match rest.find("```") {
            Some(end) => rest[..end].trim(),
            None => rest.trim(),
        };
    }
    if let Some(start) = text.find("```") {
        let rest = &text[start + 3..];
        return match rest.find("```") {
            Some(end) => rest[..end].trim(),
            None => rest.trim(),
        };
    }
    text.trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_json_fence() {
        let text = "Here is my evaluation:\n```json\n{\"score\": 80}\n```\nDone.";
        assert_eq!(extract_json_block(text), "{\"score\": 80}");
    }

    #[test]
    fn test_extract_generic_fence() {
        let text = "```\n{\"score\": 80}\n```";
        assert_eq!(extract_json_block(text), "{\"score\": 80}");
    }

    #[test]
    fn test_extract_bare_json() {
        let text = "  {\"score\": 80}  ";
        assert_eq!(extract_json_block(text), "{\"score\": 80}");
    }

    #[test]
    fn test_extract_unclosed_fence() {
        let text = "```json\n{\"score\": 80}";
        assert_eq!(extract_json_block(text), "{\"score\": 80}");
    }

    #[test]
    fn test_parse_rubric_shape() {
        let text = r#"```json
{
  "scores": {"factual_correctness": 8, "fact_coverage": 6, "specificity": 4},
  "reasoning": {"facts_found": ["fact 1", "fact 2"]},
  "summary": "Mostly correct."
}
```"#;
        let response = EvaluatorResponse::parse(text).unwrap();
        match response {
            EvaluatorResponse::Rubric(rubric) => {
                assert_eq!(rubric.scores.factual_correctness, 8.0);
                assert_eq!(rubric.scores.fact_coverage, 6.0);
                assert_eq!(rubric.scores.specificity, Specificity::Score(4.0));
                assert_eq!(rubric.reasoning.unwrap().facts_found.len(), 2);
                assert_eq!(rubric.summary.as_deref(), Some("Mostly correct."));
            }
            other => panic!("expected rubric shape, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_legacy_shape() {
        let response = EvaluatorResponse::parse("{\"score\": 80}").unwrap();
        match response {
            EvaluatorResponse::Legacy(legacy) => assert_eq!(legacy.score, 80.0),
            other => panic!("expected legacy shape, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_specificity_sentinel() {
        let text = r#"{"scores": {"factual_correctness": 10, "fact_coverage": 10, "specificity": "N/A"}}"#;
        match EvaluatorResponse::parse(text).unwrap() {
            EvaluatorResponse::Rubric(rubric) => {
                assert_eq!(rubric.scores.specificity, Specificity::NotApplicable);
            }
            other => panic!("expected rubric shape, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_specificity_missing_is_sentinel() {
        let text = r#"{"scores": {"factual_correctness": 10, "fact_coverage": 10}}"#;
        match EvaluatorResponse::parse(text).unwrap() {
            EvaluatorResponse::Rubric(rubric) => {
                assert_eq!(rubric.scores.specificity, Specificity::NotApplicable);
            }
            other => panic!("expected rubric shape, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_specificity_null_is_sentinel() {
        let text = r#"{"scores": {"factual_correctness": 1, "fact_coverage": 1, "specificity": null}}"#;
        match EvaluatorResponse::parse(text).unwrap() {
            EvaluatorResponse::Rubric(rubric) => {
                assert_eq!(rubric.scores.specificity, Specificity::NotApplicable);
            }
            other => panic!("expected rubric shape, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_specificity_unknown_string_is_error() {
        let text = r#"{"scores": {"factual_correctness": 1, "fact_coverage": 1, "specificity": "high"}}"#;
        let err = EvaluatorResponse::parse(text).unwrap_err();
        assert!(matches!(err, PrbenchError::Parse(_)));
    }

    #[test]
    fn test_parse_unknown_shape_is_error() {
        let err = EvaluatorResponse::parse("{\"verdict\": \"good\"}").unwrap_err();
        assert!(matches!(err, PrbenchError::Parse(_)));
    }

    #[test]
    fn test_parse_non_json_is_error() {
        let err = EvaluatorResponse::parse("The answer looks fine to me.").unwrap_err();
        assert!(matches!(err, PrbenchError::Parse(_)));
    }
}
