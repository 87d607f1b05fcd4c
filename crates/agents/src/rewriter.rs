//! Whole-answer-context query rewriting for the outer controller.

use agrimind_core::AppResult;
use agrimind_llm::{LlmClient, LlmRequest};
use agrimind_prompt::{render, templates};
use std::collections::HashMap;
use std::sync::Arc;

/// Reformulates the original question using the prior unsatisfactory answer
/// as context. Distinct from the retrieval subsystem's query transformer,
/// which only rephrases for corpus retrieval.
pub struct QueryRewriter {
    client: Arc<dyn LlmClient>,
    model: String,
}

impl QueryRewriter {
    pub fn new(client: Arc<dyn LlmClient>, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }

    /// Produce a rewritten question.
    pub async fn rewrite(&self, question: &str, previous_answer: &str) -> AppResult<String> {
        let mut variables = HashMap::new();
        variables.insert("question".to_string(), question.to_string());
        variables.insert("previous_answer".to_string(), previous_answer.to_string());

        let prompt = render(&templates::REWRITE_QUERY, &variables)?;

        let mut request = LlmRequest::new(prompt.user, &self.model);
        if let Some(system) = prompt.system {
            request = request.with_system(system);
        }

        let response = self.client.complete(&request).await?;
        let rewritten = response.content.trim().to_string();

        if rewritten.is_empty() {
            // An empty rewrite would stall the retry; keep the original
            return Ok(question.to_string());
        }

        Ok(rewritten)
    }
}
