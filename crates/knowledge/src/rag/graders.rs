//! Retrieval-scoped LLM judgments.
//!
//! Binary graders for document relevance, groundedness, and usefulness, plus
//! the retrieval-focused query transformer and the introspective fallback
//! agent. These are distinct from the outer controller's answer grader and
//! query rewriter: same roles, narrower scope.

use agrimind_core::AppResult;
use agrimind_llm::{LlmClient, LlmRequest};
use agrimind_prompt::{render, templates};
use std::collections::HashMap;
use std::sync::Arc;

fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// Interpret a grader completion as a yes/no verdict.
///
/// Only the first word counts, so a verbose grader ("yes, because ...")
/// still parses.
pub(crate) fn parse_yes_no(text: &str) -> bool {
    text.trim()
        .split(|c: char| !c.is_ascii_alphabetic())
        .find(|word| !word.is_empty())
        .map(|word| word.eq_ignore_ascii_case("yes"))
        .unwrap_or(false)
}

/// Binary relevance judgment of one document against the question.
pub struct RelevanceGrader {
    client: Arc<dyn LlmClient>,
    model: String,
}

impl RelevanceGrader {
    pub fn new(client: Arc<dyn LlmClient>, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }

    /// Grade one document; `Ok(true)` means keep it.
    pub async fn grade(&self, question: &str, document: &str) -> AppResult<bool> {
        let prompt = render(
            &templates::RAG_GRADE_DOCUMENT,
            &vars(&[("question", question), ("document", document)]),
        )?;

        let mut request = LlmRequest::new(prompt.user, &self.model).with_temperature(0.0);
        if let Some(system) = prompt.system {
            request = request.with_system(system);
        }

        let response = self.client.complete(&request).await?;
        Ok(parse_yes_no(&response.content))
    }
}

/// Binary groundedness judgment of a generation against its evidence.
pub struct GroundednessGrader {
    client: Arc<dyn LlmClient>,
    model: String,
}

impl GroundednessGrader {
    pub fn new(client: Arc<dyn LlmClient>, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }

    /// `Ok(true)` means every claim is supported by the documents.
    pub async fn grade(&self, documents: &str, generation: &str) -> AppResult<bool> {
        let prompt = render(
            &templates::RAG_GRADE_GROUNDEDNESS,
            &vars(&[("documents", documents), ("generation", generation)]),
        )?;

        let mut request = LlmRequest::new(prompt.user, &self.model).with_temperature(0.0);
        if let Some(system) = prompt.system {
            request = request.with_system(system);
        }

        let response = self.client.complete(&request).await?;
        Ok(parse_yes_no(&response.content))
    }
}

/// Binary usefulness judgment of a generation against the question.
pub struct UsefulnessGrader {
    client: Arc<dyn LlmClient>,
    model: String,
}

impl UsefulnessGrader {
    pub fn new(client: Arc<dyn LlmClient>, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }

    /// `Ok(true)` means the generation resolves the question.
    pub async fn grade(&self, question: &str, generation: &str) -> AppResult<bool> {
        let prompt = render(
            &templates::RAG_GRADE_USEFULNESS,
            &vars(&[("question", question), ("generation", generation)]),
        )?;

        let mut request = LlmRequest::new(prompt.user, &self.model).with_temperature(0.0);
        if let Some(system) = prompt.system {
            request = request.with_system(system);
        }

        let response = self.client.complete(&request).await?;
        Ok(parse_yes_no(&response.content))
    }
}

/// Retrieval-focused query rewriter.
pub struct QueryTransformer {
    client: Arc<dyn LlmClient>,
    model: String,
}

impl QueryTransformer {
    pub fn new(client: Arc<dyn LlmClient>, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }

    /// Rewrite a question for better corpus retrieval.
    pub async fn transform(&self, question: &str) -> AppResult<String> {
        let prompt = render(
            &templates::RAG_TRANSFORM_QUERY,
            &vars(&[("question", question)]),
        )?;

        let mut request = LlmRequest::new(prompt.user, &self.model);
        if let Some(system) = prompt.system {
            request = request.with_system(system);
        }

        let response = self.client.complete(&request).await?;
        let rewritten = response.content.trim().to_string();

        if rewritten.is_empty() {
            // An empty rewrite would stall retrieval; keep the original
            return Ok(question.to_string());
        }

        Ok(rewritten)
    }
}

/// Deeper-reasoning fallback over the best retrieved evidence.
pub struct IntrospectiveAgent {
    client: Arc<dyn LlmClient>,
    model: String,
}

impl IntrospectiveAgent {
    pub fn new(client: Arc<dyn LlmClient>, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }

    /// One reasoning pass; always used as a last resort.
    pub async fn respond(&self, question: &str, evidence: &str) -> AppResult<String> {
        let prompt = render(
            &templates::RAG_INTROSPECT,
            &vars(&[("question", question), ("evidence", evidence)]),
        )?;

        let mut request = LlmRequest::new(prompt.user, &self.model);
        if let Some(system) = prompt.system {
            request = request.with_system(system);
        }

        let response = self.client.complete(&request).await?;
        Ok(response.content)
    }
}
