//! LLM judge client: sends an evaluation prompt to the messages API and
//! returns the judge's free-text verdict.

use crate::error::{PrbenchError, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

const DEFAULT_API_URL: &str = "https://api.anthropic.com";
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Request structure for the messages API
#[derive(Serialize)]
struct MessagesRequest {
    model: String,
    max_tokens: u32,
    messages: Vec<Message>,
}

#[derive(Serialize)]
struct Message {
    role: &'static str,
    content: String,
}

/// Response structure from the messages API
#[derive(Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(default)]
    text: String,
}

/// Judge API client.
///
/// Handles one evaluation call per test case with retry logic for rate
/// limits and server errors; all other failures propagate to the caller,
/// which tallies them as error-tagged cases.
pub struct JudgeClient {
    client: Client,
    api_key: String,
    model: String,
    max_tokens: u32,
    base_url: String,
}

impl JudgeClient {
    /// Create a new judge client.
    ///
    /// # Arguments
    ///
    /// * `api_key` - Judge API key
    /// * `model` - Model name (e.g., "claude-haiku-4-5")
    /// * `max_tokens` - Response token budget per evaluation
    pub fn new(api_key: String, model: String, max_tokens: u32) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| PrbenchError::Api(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key,
            model,
            max_tokens,
            base_url: DEFAULT_API_URL.to_string(),
        })
    }

    /// Override the API base URL (used by tests against a local stub).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Send one evaluation prompt with retry logic.
    ///
    /// Retries only rate-limit (429) and server (5xx) failures with
    /// exponential backoff; anything else returns immediately.
    pub async fn evaluate_answer(&self, prompt: &str, max_retries: usize) -> Result<String> {
        let start = std::time::Instant::now();
        let mut attempt = 0;
        let mut delay = Duration::from_secs(1);

        loop {
            match self.messages_internal(prompt).await {
                Ok(text) => {
                    log::debug!("Judge call took {:?} (attempt {})", start.elapsed(), attempt + 1);
                    return Ok(text);
                }
                Err(e) if attempt < max_retries => {
                    let message = e.to_string();
                    let should_retry = message.contains("429")
                        || message.contains("500")
                        || message.contains("502")
                        || message.contains("503")
                        || message.contains("529");

                    if should_retry {
                        log::warn!("Retry {}/{} after error: {}", attempt + 1, max_retries, e);
                        tokio::time::sleep(delay).await;
                        delay *= 2;
                        attempt += 1;
                    } else {
                        return Err(e);
                    }
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Internal method to make a single API request
    async fn messages_internal(&self, prompt: &str) -> Result<String> {
        let request = MessagesRequest {
            model: self.model.clone(),
            max_tokens: self.max_tokens,
            messages: vec![Message {
                role: "user",
                content: prompt.to_string(),
            }],
        };

        let response = self
            .client
            .post(format!("{}/v1/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| PrbenchError::Api(format!("Network error: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error response".to_string());
            return Err(PrbenchError::Api(format!("Judge API error {}: {}", status, body)));
        }

        let result: MessagesResponse = response
            .json()
            .await
            .map_err(|e| PrbenchError::Api(format!("Failed to parse response: {}", e)))?;

        let text = result
            .content
            .into_iter()
            .map(|block| block.text)
            .find(|t| !t.is_empty())
            .ok_or_else(|| PrbenchError::Api("Empty response from judge API".to_string()))?;

        Ok(text)
    }
}

/// Load the evaluation prompt template from a file.
pub fn load_prompt_template(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| {
        PrbenchError::Config(format!("Failed to read prompt template {}: {}", path.display(), e))
    })
}

/// Fill the prompt template for one test case.
///
/// Recognized placeholders: `{question}`, `{ground_truth}`, `{facts}`
/// (numbered list), `{system_answer}`, `{total_facts}`.
pub fn build_prompt(
    template: &str,
    question: &str,
    ground_truth: &str,
    facts: &[String],
    system_answer: &str,
) -> String {
    let facts_text = facts
        .iter()
        .enumerate()
        .map(|(i, fact)| format!("{}. {}", i + 1, fact))
        .collect::<Vec<_>>()
        .join("\n");

    template
        .replace("{question}", question)
        .replace("{ground_truth}", ground_truth)
        .replace("{facts}", &facts_text)
        .replace("{system_answer}", system_answer)
        .replace("{total_facts}", &facts.len().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_judge_client_new() {
        let judge = JudgeClient::new("sk-test".to_string(), "claude-haiku-4-5".to_string(), 1024).unwrap();
        assert_eq!(judge.model, "claude-haiku-4-5");
        assert_eq!(judge.max_tokens, 1024);
        assert_eq!(judge.base_url, DEFAULT_API_URL);
    }

    #[test]
    fn test_build_prompt_numbers_facts() {
        let template = "Q: {question}\nTruth: {ground_truth}\nFacts ({total_facts}):\n{facts}\nAnswer: {system_answer}";
        let facts = vec!["first fact".to_string(), "second fact".to_string()];
        let prompt = build_prompt(template, "why?", "because", &facts, "an answer");
        assert!(prompt.contains("Q: why?"));
        assert!(prompt.contains("Truth: because"));
        assert!(prompt.contains("Facts (2):"));
        assert!(prompt.contains("1. first fact\n2. second fact"));
        assert!(prompt.contains("Answer: an answer"));
    }

    #[test]
    fn test_build_prompt_empty_facts() {
        let prompt = build_prompt("{facts}|{total_facts}", "q", "t", &[], "a");
        assert_eq!(prompt, "|0");
    }

    #[test]
    fn test_load_prompt_template_missing_file() {
        let err = load_prompt_template(Path::new("does/not/exist.txt")).unwrap_err();
        assert!(matches!(err, PrbenchError::Config(_)));
    }
}
