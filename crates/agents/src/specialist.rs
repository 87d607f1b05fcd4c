//! Specialist agent contract and the generic LLM-backed implementation.

use crate::registry::AgentKind;
use agrimind_core::AppResult;
use agrimind_llm::{LlmClient, LlmRequest};
use agrimind_prompt::{render, templates};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

/// Contract every specialist must implement.
///
/// Handlers receive only the query (and image, if applicable) as input and
/// return free text. They should fail soft internally where possible; the
/// dispatcher wraps every call in catch/timeout regardless, so an error here
/// costs only this handler's slot in the batch.
#[async_trait::async_trait]
pub trait SpecialistAgent: Send + Sync {
    /// Wire name used by the classifier (e.g., "WeatherForecastAgent").
    fn name(&self) -> &str;

    /// Answer a narrow sub-question.
    async fn handle(&self, query: &str, image: Option<&Path>) -> AppResult<String>;
}

/// A specialist backed by an LLM role prompt.
///
/// The individual domain logic of each specialist is out of scope for the
/// workflow; this thin implementation satisfies the contract by pairing the
/// registry's role instruction with the query.
pub struct LlmSpecialist {
    kind: AgentKind,
    client: Arc<dyn LlmClient>,
    model: String,
}

impl LlmSpecialist {
    /// Create a specialist for a registry role.
    pub fn new(kind: AgentKind, client: Arc<dyn LlmClient>, model: impl Into<String>) -> Self {
        Self {
            kind,
            client,
            model: model.into(),
        }
    }
}

#[async_trait::async_trait]
impl SpecialistAgent for LlmSpecialist {
    fn name(&self) -> &str {
        self.kind.name()
    }

    async fn handle(&self, query: &str, image: Option<&Path>) -> AppResult<String> {
        let mut query_text = query.to_string();

        if let Some(image) = image {
            if self.kind.image_capable() {
                query_text.push_str(&format!("\n[Attached image: {}]", image.display()));
            }
        }

        let mut variables = HashMap::new();
        variables.insert("role".to_string(), self.kind.role_prompt().to_string());
        variables.insert("query".to_string(), query_text);

        let prompt = render(&templates::SPECIALIST, &variables)?;

        let mut request = LlmRequest::new(prompt.user, &self.model);
        if let Some(system) = prompt.system {
            request = request.with_system(system);
        }

        let response = self.client.complete(&request).await?;

        tracing::debug!("Specialist '{}' completed", self.kind.name());

        Ok(response.content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agrimind_llm::MockClient;
    use std::path::PathBuf;

    #[tokio::test]
    async fn test_specialist_uses_role_prompt() {
        let client = Arc::new(MockClient::new("default").with_rule("fertilizer", "use urea"));
        let specialist =
            LlmSpecialist::new(AgentKind::FertilizerRecommender, client, "test-model");

        assert_eq!(specialist.name(), "FertilizerRecommenderAgent");

        let answer = specialist
            .handle("What should I feed my rice?", None)
            .await
            .unwrap();
        assert_eq!(answer, "use urea");
    }

    #[tokio::test]
    async fn test_image_reference_forwarded_to_image_capable_agents() {
        let client = Arc::new(MockClient::new("default").with_rule("Attached image", "leaf blight"));
        let specialist =
            LlmSpecialist::new(AgentKind::CropDiseaseDetection, client, "test-model");

        let image = PathBuf::from("crop_disease.jpg");
        let answer = specialist
            .handle("Analyze this crop disease", Some(&image))
            .await
            .unwrap();
        assert_eq!(answer, "leaf blight");
    }

    #[tokio::test]
    async fn test_image_reference_ignored_by_text_agents() {
        let client = Arc::new(MockClient::new("default").with_rule("Attached image", "wrong"));
        let specialist = LlmSpecialist::new(AgentKind::News, client, "test-model");

        let image = PathBuf::from("crop_disease.jpg");
        let answer = specialist
            .handle("Latest policy news", Some(&image))
            .await
            .unwrap();
        assert_eq!(answer, "default");
    }
}
