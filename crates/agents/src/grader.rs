//! Answer quality grading for the outer controller.

use crate::json;
use agrimind_llm::{LlmClient, LlmRequest};
use agrimind_prompt::{render, templates};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// Binary adequacy judgment with a short rationale.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityGrade {
    /// Whether the answer adequately addresses the question
    pub adequate: bool,

    /// One-sentence rationale
    #[serde(default, alias = "reasoning")]
    pub rationale: String,
}

#[derive(Debug, Deserialize)]
struct GradePayload {
    adequate: bool,
    #[serde(default)]
    reasoning: String,
}

/// Lenient judge of whether a candidate answer adequately answers the
/// original question.
///
/// The grading itself never fails: a grader error becomes an inadequate
/// grade carrying the error text as rationale, so a broken judge can only
/// cost retries, never silently accept an answer.
pub struct AnswerGrader {
    client: Arc<dyn LlmClient>,
    model: String,
}

impl AnswerGrader {
    pub fn new(client: Arc<dyn LlmClient>, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }

    /// Grade a candidate answer against the original question.
    pub async fn grade(&self, question: &str, answer: &str) -> QualityGrade {
        match self.try_grade(question, answer).await {
            Ok(grade) => grade,
            Err(e) => {
                tracing::warn!("Answer grader failed; treating as inadequate: {}", e);
                QualityGrade {
                    adequate: false,
                    rationale: format!("Grader error: {}", e),
                }
            }
        }
    }

    async fn try_grade(
        &self,
        question: &str,
        answer: &str,
    ) -> agrimind_core::AppResult<QualityGrade> {
        let mut variables = HashMap::new();
        variables.insert("question".to_string(), question.to_string());
        variables.insert("answer".to_string(), answer.to_string());

        let prompt = render(&templates::GRADE_ANSWER, &variables)?;

        let mut request = LlmRequest::new(prompt.user, &self.model).with_temperature(0.0);
        if let Some(system) = prompt.system {
            request = request.with_system(system);
        }

        let response = self.client.complete(&request).await?;

        let payload = json::extract_object(&response.content)
            .and_then(|object| serde_json::from_str::<GradePayload>(object).ok());

        match payload {
            Some(payload) => Ok(QualityGrade {
                adequate: payload.adequate,
                rationale: payload.reasoning,
            }),
            None => {
                // Unparseable judge output fails closed
                Ok(QualityGrade {
                    adequate: false,
                    rationale: format!("Unparseable grader output: {}", response.content.trim()),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agrimind_llm::MockClient;

    #[tokio::test]
    async fn test_adequate_grade() {
        let client = Arc::new(MockClient::new(
            r#"{"adequate": true, "reasoning": "directly answers the question"}"#,
        ));
        let grader = AnswerGrader::new(client, "test-model");

        let grade = grader.grade("question", "answer").await;
        assert!(grade.adequate);
        assert!(grade.rationale.contains("directly"));
    }

    #[tokio::test]
    async fn test_inadequate_grade() {
        let client = Arc::new(MockClient::new(
            r#"{"adequate": false, "reasoning": "off-topic"}"#,
        ));
        let grader = AnswerGrader::new(client, "test-model");

        let grade = grader.grade("question", "answer").await;
        assert!(!grade.adequate);
    }

    #[tokio::test]
    async fn test_unparseable_output_fails_closed() {
        let client = Arc::new(MockClient::new("looks fine to me"));
        let grader = AnswerGrader::new(client, "test-model");

        let grade = grader.grade("question", "answer").await;
        assert!(!grade.adequate);
        assert!(grade.rationale.contains("Unparseable"));
    }
}
