//! Query classification against the specialist roster.

use crate::json;
use crate::registry::AgentRegistry;
use agrimind_core::AppResult;
use agrimind_llm::{LlmClient, LlmRequest};
use agrimind_prompt::{render, templates};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// Marker appended to the query when an image is attached, so the
/// classifier can prefer image-capable agents.
const IMAGE_MARKER: &str = "[IMAGE_PROVIDED]";

/// Outcome of one classification call.
///
/// Justifications are audit-only: they are logged but never consumed
/// programmatically.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RoutingDecision {
    /// Ordered handler names selected for the query
    #[serde(default)]
    pub agents: Vec<String>,

    /// One natural-language reason per selected handler
    #[serde(default)]
    pub justifications: Vec<String>,
}

/// LLM-backed classifier mapping a query to zero or more specialists.
pub struct RouterAgent {
    client: Arc<dyn LlmClient>,
    model: String,
}

impl RouterAgent {
    pub fn new(client: Arc<dyn LlmClient>, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }

    /// Classify a query against the registry roster.
    ///
    /// Unparseable classifier output degrades to an empty decision rather
    /// than an error, so a confused model costs one empty dispatch round,
    /// not the workflow.
    pub async fn classify(
        &self,
        registry: &AgentRegistry,
        query: &str,
        has_image: bool,
    ) -> AppResult<RoutingDecision> {
        let query_text = if has_image {
            format!("{} {}", query, IMAGE_MARKER)
        } else {
            query.to_string()
        };

        let mut variables = HashMap::new();
        variables.insert("roster".to_string(), registry.roster_description());
        variables.insert("query".to_string(), query_text);

        let prompt = render(&templates::ROUTER_CLASSIFY, &variables)?;

        let mut request = LlmRequest::new(prompt.user, &self.model).with_temperature(0.0);
        if let Some(system) = prompt.system {
            request = request.with_system(system);
        }

        let response = self.client.complete(&request).await?;

        let decision = match json::extract_object(&response.content)
            .and_then(|object| serde_json::from_str::<RoutingDecision>(object).ok())
        {
            Some(decision) => decision,
            None => {
                tracing::warn!(
                    "Classifier returned unparseable output; routing to no agents: {}",
                    response.content
                );
                RoutingDecision::default()
            }
        };

        tracing::info!("Routing to agents: {:?}", decision.agents);
        for (agent, justification) in decision.agents.iter().zip(decision.justifications.iter()) {
            tracing::debug!("routing {}: {}", agent, justification);
        }

        Ok(decision)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agrimind_llm::MockClient;

    fn registry() -> AgentRegistry {
        AgentRegistry::with_default_specialists(Arc::new(MockClient::new("ok")), "test-model")
    }

    #[tokio::test]
    async fn test_classify_parses_decision() {
        let client = Arc::new(MockClient::new(
            r#"{"agents": ["FertilizerRecommenderAgent"], "justifications": ["fertilizer query"]}"#,
        ));
        let router = RouterAgent::new(client, "test-model");

        let decision = router
            .classify(&registry(), "What fertilizer suits rice?", false)
            .await
            .unwrap();

        assert_eq!(decision.agents, vec!["FertilizerRecommenderAgent"]);
        assert_eq!(decision.justifications.len(), 1);
    }

    #[tokio::test]
    async fn test_classify_parses_fenced_json() {
        let client = Arc::new(MockClient::new(
            "Sure:\n```json\n{\"agents\": [\"NewsAgent\"]}\n```",
        ));
        let router = RouterAgent::new(client, "test-model");

        let decision = router
            .classify(&registry(), "policy news?", false)
            .await
            .unwrap();

        assert_eq!(decision.agents, vec!["NewsAgent"]);
    }

    #[tokio::test]
    async fn test_classify_unparseable_degrades_to_empty() {
        let client = Arc::new(MockClient::new("I cannot decide."));
        let router = RouterAgent::new(client, "test-model");

        let decision = router.classify(&registry(), "anything", false).await.unwrap();
        assert!(decision.agents.is_empty());
    }

    #[tokio::test]
    async fn test_classify_appends_image_marker() {
        let client = Arc::new(
            MockClient::new(r#"{"agents": []}"#)
                .with_rule(IMAGE_MARKER, r#"{"agents": ["ImageAnalysisAgent"]}"#),
        );
        let router = RouterAgent::new(client, "test-model");

        let with_image = router
            .classify(&registry(), "What is this?", true)
            .await
            .unwrap();
        assert_eq!(with_image.agents, vec!["ImageAnalysisAgent"]);

        let without_image = router
            .classify(&registry(), "What is this?", false)
            .await
            .unwrap();
        assert!(without_image.agents.is_empty());
    }
}
