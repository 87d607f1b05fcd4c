//! Synthesis of multiple specialist answers into one.

use agrimind_core::AppResult;
use agrimind_llm::{LlmClient, LlmRequest};
use agrimind_prompt::{render, templates};
use std::collections::HashMap;
use std::sync::Arc;

/// Answer returned when there is nothing to merge.
const EMPTY_RESPONSES_ANSWER: &str =
    "No specialist responses were available for this question.";

/// Pure text-merge over an unordered list of answers.
///
/// Input may be empty and may include error strings from failed handlers;
/// the merge deduplicates overlap and favors specific, evidenced claims.
/// No ordering assumptions, no persisted state.
pub struct Synthesizer {
    client: Arc<dyn LlmClient>,
    model: String,
}

impl Synthesizer {
    pub fn new(client: Arc<dyn LlmClient>, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }

    /// Merge responses into one coherent answer.
    pub async fn synthesize(&self, responses: &[String]) -> AppResult<String> {
        if responses.is_empty() {
            return Ok(EMPTY_RESPONSES_ANSWER.to_string());
        }

        let numbered = responses
            .iter()
            .enumerate()
            .map(|(i, response)| format!("Response {}:\n{}", i + 1, response))
            .collect::<Vec<_>>()
            .join("\n\n");

        let mut variables = HashMap::new();
        variables.insert("responses".to_string(), numbered);

        let prompt = render(&templates::SYNTHESIZE, &variables)?;

        let mut request = LlmRequest::new(prompt.user, &self.model);
        if let Some(system) = prompt.system {
            request = request.with_system(system);
        }

        tracing::info!("Synthesizing {} responses", responses.len());

        let response = self.client.complete(&request).await?;
        Ok(response.content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agrimind_llm::MockClient;

    #[tokio::test]
    async fn test_empty_input_needs_no_llm_call() {
        let client = Arc::new(MockClient::new("should not be called"));
        let synthesizer = Synthesizer::new(client.clone(), "test-model");

        let answer = synthesizer.synthesize(&[]).await.unwrap();
        assert_eq!(answer, EMPTY_RESPONSES_ANSWER);
        assert_eq!(client.call_count(), 0);
    }

    #[tokio::test]
    async fn test_merges_numbered_responses() {
        let client = Arc::new(MockClient::new("merged").with_rule("Response 2", "saw both"));
        let synthesizer = Synthesizer::new(client, "test-model");

        let answer = synthesizer
            .synthesize(&["first answer".to_string(), "second answer".to_string()])
            .await
            .unwrap();
        assert_eq!(answer, "saw both");
    }

    #[tokio::test]
    async fn test_error_strings_still_synthesized() {
        let client = Arc::new(MockClient::new("best effort"));
        let synthesizer = Synthesizer::new(client, "test-model");

        let answer = synthesizer
            .synthesize(&["Error: handler exploded".to_string()])
            .await
            .unwrap();
        assert_eq!(answer, "best effort");
    }
}
