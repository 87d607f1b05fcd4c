//! The outer mode controller.
//!
//! An explicit finite-state machine executed by a plain loop:
//!
//! ```text
//! start → {retrieval | dispatch} → synthesize(if dispatch) → grade
//!       → {end | switch_to_other_strategy | rewrite_query → dispatch}
//! ```
//!
//! Decision policy at `grade`, in strict order: image-bearing queries
//! terminate after one grading pass; an adequate grade terminates; after the
//! one permitted strategy switch only rewrite-then-dispatch cycles remain,
//! bounded by the configured rewrite budget; otherwise switch strategy once.
//! A wall-clock deadline caps the whole execution as a backstop.

use crate::state::{Query, WorkflowOutcome, WorkflowState};
use agrimind_agents::{
    AgentRegistry, AnswerGrader, Dispatcher, QueryRewriter, RouterAgent, Synthesizer,
};
use agrimind_core::config::ControllerConfig;
use agrimind_core::{AppResult, Strategy};
use agrimind_knowledge::AdaptiveRetrieval;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

/// Phases of the outer machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Start,
    Retrieval,
    Dispatch,
    Synthesize,
    Grade,
    Rewrite,
    Done,
}

/// The adaptive answering workflow engine.
///
/// All collaborators are injected at construction; the engine holds no
/// global state and one instance can serve many queries, each with its own
/// `WorkflowState`.
pub struct WorkflowEngine {
    retrieval: AdaptiveRetrieval,
    registry: Arc<AgentRegistry>,
    router: RouterAgent,
    dispatcher: Dispatcher,
    synthesizer: Synthesizer,
    grader: AnswerGrader,
    rewriter: QueryRewriter,
    config: ControllerConfig,
}

impl WorkflowEngine {
    /// Assemble the engine from its injected collaborators.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        retrieval: AdaptiveRetrieval,
        registry: Arc<AgentRegistry>,
        router: RouterAgent,
        dispatcher: Dispatcher,
        synthesizer: Synthesizer,
        grader: AnswerGrader,
        rewriter: QueryRewriter,
        config: ControllerConfig,
    ) -> Self {
        Self {
            retrieval,
            registry,
            router,
            dispatcher,
            synthesizer,
            grader,
            rewriter,
            config,
        }
    }

    /// Execute the workflow for one question.
    ///
    /// Always reaches a terminal phase: leaf failures are converted to data
    /// along the way, and the switch latch, the rewrite budget, and the
    /// deadline bound every loop.
    pub async fn execute(
        &self,
        question: &str,
        image: Option<PathBuf>,
    ) -> AppResult<WorkflowOutcome> {
        let mut state = WorkflowState::new(
            Query::new(question, image),
            self.config.initial_strategy,
        );

        let started = Instant::now();
        let mut phase = Phase::Start;

        while phase != Phase::Done {
            if self.deadline_exceeded(started) {
                state.log("deadline exceeded — terminating with best answer so far");
                break;
            }

            phase = match phase {
                Phase::Start => self.step_start(&mut state),
                Phase::Retrieval => self.step_retrieval(&mut state).await,
                Phase::Dispatch => self.step_dispatch(&mut state).await,
                Phase::Synthesize => self.step_synthesize(&mut state).await,
                Phase::Grade => self.step_grade(&mut state).await,
                Phase::Rewrite => self.step_rewrite(&mut state).await,
                Phase::Done => Phase::Done,
            };
        }

        state.log("end");
        Ok(WorkflowOutcome::from_state(state))
    }

    fn deadline_exceeded(&self, started: Instant) -> bool {
        self.config.deadline_secs > 0
            && started.elapsed().as_secs() >= self.config.deadline_secs
    }

    fn step_start(&self, state: &mut WorkflowState) -> Phase {
        state.log(format!(
            "start (initial strategy: {})",
            state.initial_strategy
        ));

        if state.query.has_image() {
            // Image-bearing queries are strategy-pinned to dispatch
            state.strategy = Strategy::Dispatch;
            state.log("image query: pinned to dispatch");
            return Phase::Dispatch;
        }

        match state.strategy {
            Strategy::Retrieval => Phase::Retrieval,
            Strategy::Dispatch => Phase::Dispatch,
        }
    }

    async fn step_retrieval(&self, state: &mut WorkflowState) -> Phase {
        state.log("retrieval");

        match self.retrieval.run(&state.query.text).await {
            Ok(outcome) => {
                for entry in &outcome.audit {
                    state.log(format!("  {}", entry));
                }
                state.answer = outcome.answer;
            }
            Err(e) => {
                // A broken retrieval stack costs this attempt, not the workflow
                state.log(format!("retrieval failed: {}", e));
                state.answer = format!("Error: {}", e);
            }
        }

        Phase::Grade
    }

    async fn step_dispatch(&self, state: &mut WorkflowState) -> Phase {
        state.log("dispatch");

        let decision = match self
            .router
            .classify(&self.registry, &state.query.text, state.query.has_image())
            .await
        {
            Ok(decision) => decision,
            Err(e) => {
                state.log(format!("classifier failed: {}", e));
                Default::default()
            }
        };

        for (agent, justification) in decision
            .agents
            .iter()
            .zip(decision.justifications.iter())
        {
            state.log(format!("  routed {}: {}", agent, justification));
        }

        state.routed_agents = decision.agents;
        state.agent_responses = self
            .dispatcher
            .dispatch(
                &state.routed_agents,
                &state.query.text,
                state.query.image.as_deref(),
            )
            .await;

        Phase::Synthesize
    }

    async fn step_synthesize(&self, state: &mut WorkflowState) -> Phase {
        state.log("synthesize");

        let responses: Vec<String> = state.agent_responses.values().cloned().collect();

        state.answer = match self.synthesizer.synthesize(&responses).await {
            Ok(answer) => answer,
            Err(e) => {
                state.log(format!("synthesizer failed: {}", e));
                format!("Error: {}", e)
            }
        };

        Phase::Grade
    }

    async fn step_grade(&self, state: &mut WorkflowState) -> Phase {
        state.log("grade");

        let grade = self
            .grader
            .grade(&state.original_question, &state.answer)
            .await;
        let adequate = grade.adequate;
        state.log(format!(
            "graded: adequate={} ({})",
            adequate, grade.rationale
        ));
        state.grade = Some(grade);

        // Decision policy, in strict order

        // 1. Image flows have no retry budget
        if state.query.has_image() {
            state.log("image query: terminating after one grading pass");
            return Phase::Done;
        }

        // 2. Adequate answers terminate
        if adequate {
            return Phase::Done;
        }

        // 3. After the one switch, only rewrite-dispatch cycles remain
        if state.switched {
            if state.rewrites >= self.config.max_rewrites {
                state.log("rewrite budget exhausted — terminating");
                return Phase::Done;
            }
            return Phase::Rewrite;
        }

        // 4. Switch strategy once
        state.mark_switched();
        state.strategy = state.strategy.other();
        state.log(format!("switching strategy to {}", state.strategy));

        match state.strategy {
            Strategy::Retrieval => Phase::Retrieval,
            Strategy::Dispatch => Phase::Dispatch,
        }
    }

    async fn step_rewrite(&self, state: &mut WorkflowState) -> Phase {
        state.log("rewrite_query");

        let rewritten = match self
            .rewriter
            .rewrite(&state.original_question, &state.answer)
            .await
        {
            Ok(text) => text,
            Err(e) => {
                // Retry dispatch with the unchanged query; the budget still
                // bounds the loop
                state.log(format!("rewriter failed: {}", e));
                state.query.text.clone()
            }
        };

        state.log(format!("rewritten query: \"{}\"", rewritten));
        state.query = state.query.rewritten(rewritten);
        state.rewrites += 1;

        // Rewritten queries always restart from dispatch
        state.strategy = Strategy::Dispatch;
        Phase::Dispatch
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agrimind_agents::SpecialistAgent;
    use agrimind_core::config::{DispatchConfig, RetrievalConfig};
    use agrimind_core::{AppError, AppResult};
    use agrimind_knowledge::embeddings::providers::TrigramProvider;
    use agrimind_knowledge::{Retriever, VectorStore};
    use agrimind_llm::MockClient;
    use std::path::Path;
    use std::time::Duration;
    use tempfile::TempDir;

    /// Specialist stub that fails on demand.
    struct StubSpecialist {
        name: &'static str,
        fail: bool,
    }

    #[async_trait::async_trait]
    impl SpecialistAgent for StubSpecialist {
        fn name(&self) -> &str {
            self.name
        }

        async fn handle(&self, _query: &str, _image: Option<&Path>) -> AppResult<String> {
            if self.fail {
                Err(AppError::Agent("fertilizer model unavailable".to_string()))
            } else {
                Ok("Apply a balanced NPK dose with split nitrogen applications.".to_string())
            }
        }
    }

    /// Mock client scripted for every judgment role in the workflow.
    fn scripted_client(grader_json: &str, router_json: &str) -> Arc<MockClient> {
        Arc::new(
            MockClient::new("generated answer")
                .with_rule("agent router", router_json)
                .with_rule("evaluating whether an answer", grader_json)
                .with_rule("synthesis and summarization", "synthesized answer")
                .with_rule("previous attempt", "rewritten question")
                .with_rule("Is the document relevant?", "no")
                .with_rule("grounded in the facts?", "yes")
                .with_rule("resolve the question?", "yes")
                .with_rule("better version optimized for retrieval", "transformed question")
                .with_rule("retrieved material", "introspective answer"),
        )
    }

    fn engine_with(
        temp: &TempDir,
        client: Arc<MockClient>,
        initial_strategy: Strategy,
        registry: AgentRegistry,
    ) -> WorkflowEngine {
        let store = Arc::new(VectorStore::open(&temp.path().join("index.sqlite")).unwrap());
        let embedder = Arc::new(TrigramProvider::new(64));

        let mut retrieval_config = RetrievalConfig::default();
        retrieval_config.recursion_limit = 1;

        let retrieval = AdaptiveRetrieval::new(
            Retriever::new(store, embedder, retrieval_config.top_k),
            client.clone(),
            "test-model",
            retrieval_config,
        );

        let registry = Arc::new(registry);
        let dispatch_config = DispatchConfig::default();

        let mut controller_config = ControllerConfig::default();
        controller_config.initial_strategy = initial_strategy;
        controller_config.max_rewrites = 2;

        WorkflowEngine::new(
            retrieval,
            registry.clone(),
            RouterAgent::new(client.clone(), "test-model"),
            Dispatcher::new(
                registry,
                dispatch_config.max_concurrency,
                Duration::from_secs(dispatch_config.handler_timeout_secs),
            ),
            Synthesizer::new(client.clone(), "test-model"),
            AnswerGrader::new(client.clone(), "test-model"),
            QueryRewriter::new(client, "test-model"),
            controller_config,
        )
    }

    fn fertilizer_registry(fail: bool) -> AgentRegistry {
        let mut registry = AgentRegistry::new();
        registry.register(Arc::new(StubSpecialist {
            name: "FertilizerRecommenderAgent",
            fail,
        }));
        registry
    }

    const FERTILIZER_ROUTE: &str =
        r#"{"agents": ["FertilizerRecommenderAgent"], "justifications": ["fertilizer query"]}"#;

    fn grade_entries(audit: &[String]) -> usize {
        audit
            .iter()
            .filter(|entry| entry.ends_with(" grade"))
            .count()
    }

    #[tokio::test]
    async fn test_adequate_dispatch_scenario() {
        let temp = TempDir::new().unwrap();
        let client = scripted_client(
            r#"{"adequate": true, "reasoning": "good answer"}"#,
            FERTILIZER_ROUTE,
        );
        let engine = engine_with(&temp, client, Strategy::Dispatch, fertilizer_registry(false));

        let outcome = engine
            .execute("What fertilizer suits rice in high-rainfall soil?", None)
            .await
            .unwrap();

        assert!(!outcome.switched);
        assert_eq!(outcome.final_strategy, Strategy::Dispatch);
        assert!(outcome.adequate);
        assert_eq!(outcome.routed_agents, vec!["FertilizerRecommenderAgent"]);
        assert!(outcome.agent_responses["FertilizerRecommenderAgent"].contains("NPK"));
        assert_eq!(outcome.answer, "synthesized answer");
    }

    #[tokio::test]
    async fn test_failing_handler_switches_once() {
        let temp = TempDir::new().unwrap();
        let client = scripted_client(
            r#"{"adequate": false, "reasoning": "not answered"}"#,
            FERTILIZER_ROUTE,
        );
        let engine = engine_with(&temp, client, Strategy::Dispatch, fertilizer_registry(true));

        let outcome = engine
            .execute("What fertilizer suits rice in high-rainfall soil?", None)
            .await
            .unwrap();

        // The failing handler contributed an error placeholder, synthesis
        // still ran, and the controller switched exactly once
        assert!(outcome.agent_responses["FertilizerRecommenderAgent"].starts_with("Error:"));
        assert!(outcome.switched);
        assert!(!outcome.adequate);
    }

    #[tokio::test]
    async fn test_always_inadequate_terminates_from_both_strategies() {
        for initial in [Strategy::Retrieval, Strategy::Dispatch] {
            let temp = TempDir::new().unwrap();
            let client = scripted_client(
                r#"{"adequate": false, "reasoning": "never good enough"}"#,
                FERTILIZER_ROUTE,
            );
            let engine = engine_with(&temp, client, initial, fertilizer_registry(false));

            let outcome = engine.execute("hard question", None).await.unwrap();

            assert!(!outcome.adequate);
            assert!(outcome.switched);
            // initial attempt + switched attempt + max_rewrites dispatch
            // retries, one grade each
            assert_eq!(grade_entries(&outcome.audit), 4, "initial: {}", initial);
            // No unbounded looping: a fixed generous phase bound holds
            assert!(outcome.audit.len() <= 80);
        }
    }

    #[tokio::test]
    async fn test_switched_flag_latches_once() {
        let temp = TempDir::new().unwrap();
        let client = scripted_client(
            r#"{"adequate": false, "reasoning": "no"}"#,
            FERTILIZER_ROUTE,
        );
        let engine = engine_with(&temp, client, Strategy::Retrieval, fertilizer_registry(false));

        let outcome = engine.execute("question", None).await.unwrap();

        assert!(outcome.switched);
        let switch_entries = outcome
            .audit
            .iter()
            .filter(|entry| entry.contains("switching strategy"))
            .count();
        assert_eq!(switch_entries, 1);
    }

    #[tokio::test]
    async fn test_image_query_grades_once_and_never_switches() {
        for grader_json in [
            r#"{"adequate": true, "reasoning": "fine"}"#,
            r#"{"adequate": false, "reasoning": "poor"}"#,
        ] {
            let temp = TempDir::new().unwrap();
            let client = scripted_client(grader_json, FERTILIZER_ROUTE);
            let engine =
                engine_with(&temp, client, Strategy::Retrieval, fertilizer_registry(false));

            let outcome = engine
                .execute(
                    "Analyze this crop disease",
                    Some(PathBuf::from("crop_disease.jpg")),
                )
                .await
                .unwrap();

            // Pinned to dispatch, exactly one grading pass, regardless of
            // the grade
            assert_eq!(outcome.final_strategy, Strategy::Dispatch);
            assert!(!outcome.switched);
            assert_eq!(grade_entries(&outcome.audit), 1);
        }
    }

    #[tokio::test]
    async fn test_rewrites_restart_from_dispatch() {
        let temp = TempDir::new().unwrap();
        let client = scripted_client(
            r#"{"adequate": false, "reasoning": "no"}"#,
            FERTILIZER_ROUTE,
        );
        let engine = engine_with(&temp, client, Strategy::Dispatch, fertilizer_registry(false));

        let outcome = engine.execute("question", None).await.unwrap();

        assert_eq!(outcome.final_strategy, Strategy::Dispatch);
        let rewrite_entries = outcome
            .audit
            .iter()
            .filter(|entry| entry.ends_with(" rewrite_query"))
            .count();
        assert_eq!(rewrite_entries, 2);
        // Every rewrite is followed by a dispatch phase, never retrieval
        assert!(outcome
            .audit
            .iter()
            .any(|entry| entry.contains("rewritten query: \"rewritten question\"")));
    }
}
