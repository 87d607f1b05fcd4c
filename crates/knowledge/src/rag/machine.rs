//! The nested adaptive retrieval state machine.
//!
//! An explicit finite-state machine executed by a plain loop:
//!
//! ```text
//! retrieve → grade_documents → {transform_query → retrieve | generate}
//! generate → grade_generation → {end(useful)
//!                               | transform_query → retrieve (not useful)
//!                               | introspective_fallback → end (not supported)}
//! ```
//!
//! Every transition into `transform_query` consumes one unit of the
//! recursion budget; at the limit the machine is forced into the
//! introspective fallback regardless of grading outcomes. That counter is
//! the only thing bounding the loop.

use crate::rag::graders::{
    GroundednessGrader, IntrospectiveAgent, QueryTransformer, RelevanceGrader, UsefulnessGrader,
};
use crate::rag::history::ChatHistory;
use crate::rag::types::RagOutcome;
use crate::retriever::Retriever;
use crate::types::RetrievedDocument;
use agrimind_core::config::RetrievalConfig;
use agrimind_core::AppResult;
use agrimind_llm::{LlmClient, LlmRequest};
use agrimind_prompt::{render, templates};
use std::collections::HashMap;
use std::sync::Arc;

/// Machine states. Terminal dispositions are returned from the loop rather
/// than modeled as states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RagState {
    Retrieve,
    GradeDocuments,
    Generate,
    GradeGeneration,
    TransformQuery,
    Introspect,
}

/// Mutable context threaded through one run.
struct RagContext {
    question: String,
    documents: Vec<RetrievedDocument>,
    generation: String,
    transforms: u32,
    history: ChatHistory,
    audit: Vec<String>,
    grounded: bool,
    useful: bool,
}

impl RagContext {
    fn log(&mut self, entry: impl Into<String>) {
        let entry = entry.into();
        tracing::debug!("rag: {}", entry);
        self.audit.push(entry);
    }
}

/// The adaptive retrieval subsystem.
///
/// Holds the retriever, the generation client, and the retrieval-scoped
/// graders. One `run` call executes the full nested machine for one
/// question; chat history is created per run and never shared.
pub struct AdaptiveRetrieval {
    retriever: Retriever,
    client: Arc<dyn LlmClient>,
    model: String,
    relevance: RelevanceGrader,
    groundedness: GroundednessGrader,
    usefulness: UsefulnessGrader,
    transformer: QueryTransformer,
    introspector: IntrospectiveAgent,
    config: RetrievalConfig,
}

impl AdaptiveRetrieval {
    /// Assemble the subsystem from its injected collaborators.
    pub fn new(
        retriever: Retriever,
        client: Arc<dyn LlmClient>,
        model: impl Into<String>,
        config: RetrievalConfig,
    ) -> Self {
        let model = model.into();

        Self {
            retriever,
            relevance: RelevanceGrader::new(client.clone(), &model),
            groundedness: GroundednessGrader::new(client.clone(), &model),
            usefulness: UsefulnessGrader::new(client.clone(), &model),
            transformer: QueryTransformer::new(client.clone(), &model),
            introspector: IntrospectiveAgent::new(client.clone(), &model),
            client,
            model,
            config,
        }
    }

    /// Run the nested machine for one question.
    pub async fn run(&self, question: &str) -> AppResult<RagOutcome> {
        let mut ctx = RagContext {
            question: question.to_string(),
            documents: Vec::new(),
            generation: String::new(),
            transforms: 0,
            history: ChatHistory::new(self.config.history_capacity),
            audit: Vec::new(),
            grounded: false,
            useful: false,
        };

        let mut state = RagState::Retrieve;

        loop {
            state = match state {
                RagState::Retrieve => {
                    ctx.log(format!("retrieve: \"{}\"", ctx.question));
                    ctx.documents = self.retriever.retrieve(&ctx.question).await?;
                    RagState::GradeDocuments
                }

                RagState::GradeDocuments => {
                    let accepted = self.grade_documents(&mut ctx).await;

                    if accepted.is_empty() {
                        ctx.log("grade_documents: no relevant documents");
                        self.enter_transform(&mut ctx)
                    } else {
                        ctx.log(format!("grade_documents: {} accepted", accepted.len()));
                        ctx.documents = accepted;
                        RagState::Generate
                    }
                }

                RagState::Generate => {
                    ctx.log("generate");
                    match self.generate(&ctx).await {
                        Ok(generation) => {
                            ctx.history.push(generation.clone());
                            ctx.generation = generation;
                            RagState::GradeGeneration
                        }
                        Err(e) => {
                            // A failed generation goes straight to the fallback
                            ctx.log(format!("generate failed: {}", e));
                            RagState::Introspect
                        }
                    }
                }

                RagState::GradeGeneration => {
                    let evidence = build_context(&ctx.documents);

                    // Grader errors fail closed to a negative grade
                    let grounded = self
                        .groundedness
                        .grade(&evidence, &ctx.generation)
                        .await
                        .unwrap_or_else(|e| {
                            ctx.audit.push(format!("groundedness grader failed: {}", e));
                            false
                        });

                    if !grounded {
                        ctx.log("grade_generation: not supported");
                        RagState::Introspect
                    } else {
                        ctx.grounded = true;

                        let useful = self
                            .usefulness
                            .grade(&ctx.question, &ctx.generation)
                            .await
                            .unwrap_or_else(|e| {
                                ctx.audit.push(format!("usefulness grader failed: {}", e));
                                false
                            });

                        if useful {
                            ctx.log("grade_generation: useful");
                            ctx.useful = true;
                            return Ok(self.finish(ctx));
                        }

                        ctx.log("grade_generation: not useful");
                        self.enter_transform(&mut ctx)
                    }
                }

                RagState::TransformQuery => {
                    match self.transformer.transform(&ctx.question).await {
                        Ok(rewritten) => {
                            ctx.log(format!("transform_query: \"{}\"", rewritten));
                            ctx.question = rewritten;
                        }
                        Err(e) => {
                            // Retry with the unchanged question; the counter
                            // still bounds the loop
                            ctx.log(format!("transform_query failed: {}", e));
                        }
                    }
                    RagState::Retrieve
                }

                RagState::Introspect => {
                    ctx.log("introspective_fallback");

                    let evidence = if ctx.documents.is_empty() {
                        "(no evidence retrieved)".to_string()
                    } else {
                        build_context(&ctx.documents)
                    };

                    ctx.generation = match self
                        .introspector
                        .respond(&ctx.question, &evidence)
                        .await
                    {
                        Ok(answer) => answer,
                        Err(e) => {
                            ctx.log(format!("introspective_fallback failed: {}", e));
                            format!("Unable to produce a grounded answer: {}", e)
                        }
                    };

                    ctx.grounded = false;
                    ctx.useful = false;
                    return Ok(self.finish(ctx));
                }
            };
        }
    }

    /// Consume one unit of recursion budget, or force the fallback once the
    /// limit is reached.
    fn enter_transform(&self, ctx: &mut RagContext) -> RagState {
        if ctx.transforms >= self.config.recursion_limit {
            ctx.log("recursion limit reached — not supported");
            return RagState::Introspect;
        }

        ctx.transforms += 1;
        RagState::TransformQuery
    }

    /// Grade the top candidates, stopping early once enough are accepted.
    async fn grade_documents(&self, ctx: &mut RagContext) -> Vec<RetrievedDocument> {
        let mut accepted = Vec::new();

        for document in ctx.documents.iter().take(self.config.grade_cap) {
            if accepted.len() >= self.config.grade_early_stop {
                break;
            }

            // A failed relevance call rejects only that document
            let relevant = self
                .relevance
                .grade(&ctx.question, &document.text)
                .await
                .unwrap_or_else(|e| {
                    ctx.audit.push(format!("relevance grader failed: {}", e));
                    false
                });

            if relevant {
                accepted.push(document.clone());
            }
        }

        accepted
    }

    /// Produce a candidate answer over the accepted documents.
    async fn generate(&self, ctx: &RagContext) -> AppResult<String> {
        let mut variables = HashMap::new();
        variables.insert("question".to_string(), ctx.question.clone());
        variables.insert("context".to_string(), build_context(&ctx.documents));
        variables.insert("chat_history".to_string(), ctx.history.render());

        let prompt = render(&templates::RAG_GENERATE, &variables)?;

        let mut request = LlmRequest::new(prompt.user, &self.model).with_temperature(0.3);
        if let Some(system) = prompt.system {
            request = request.with_system(system);
        }

        let response = self.client.complete(&request).await?;
        Ok(response.content)
    }

    fn finish(&self, ctx: RagContext) -> RagOutcome {
        RagOutcome {
            answer: ctx.generation,
            grounded: ctx.grounded,
            useful: ctx.useful,
            transforms: ctx.transforms,
            final_question: ctx.question,
            documents: ctx.documents,
            audit: ctx.audit,
        }
    }
}

/// Format documents for prompt injection.
fn build_context(documents: &[RetrievedDocument]) -> String {
    documents
        .iter()
        .enumerate()
        .map(|(i, document)| format!("[Document {}]\n{}", i + 1, document.text))
        .collect::<Vec<_>>()
        .join("\n\n---\n\n")
}
