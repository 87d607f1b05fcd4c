//! Ask command handler.
//!
//! Wires the application container — cached LLM client, retrieval stack,
//! specialist registry, and the outer controller — and runs the adaptive
//! workflow for one question.

use agrimind_agents::{
    AgentRegistry, AnswerGrader, Dispatcher, QueryRewriter, RouterAgent, Synthesizer,
};
use agrimind_core::{config::AppConfig, AppResult};
use agrimind_knowledge::{config as kb_config, AdaptiveRetrieval, Retriever, VectorStore};
use agrimind_llm::{create_client, CachedClient, LlmClient, ResponseCache};
use agrimind_workflow::{WorkflowEngine, WorkflowOutcome};
use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Answer a question with the adaptive workflow
#[derive(Args, Debug)]
pub struct AskCommand {
    /// The question to ask
    pub question: String,

    /// Path to an attached image (pins the workflow to dispatch)
    #[arg(short, long)]
    pub image: Option<PathBuf>,

    /// Knowledge base to retrieve from
    #[arg(short, long, default_value = "default")]
    pub knowledge_base: String,

    /// Disable prompt-response memoization for this run
    #[arg(long)]
    pub no_cache: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl AskCommand {
    /// Execute the ask command.
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing ask command");
        tracing::debug!("Ask command options: {:?}", self);

        let engine = build_engine(config, &self.knowledge_base, self.no_cache)?;

        let outcome = engine
            .execute(&self.question, self.image.clone())
            .await?;

        if self.json {
            print_json(config, &outcome)?;
        } else {
            print_text(&outcome);
        }

        Ok(())
    }
}

/// Construct the workflow engine from application configuration.
///
/// Every component is built exactly once here and handed to the controller;
/// nothing in the engine reaches for globals.
fn build_engine(
    config: &AppConfig,
    knowledge_base: &str,
    no_cache: bool,
) -> AppResult<WorkflowEngine> {
    // LLM client, optionally wrapped in the response cache
    let raw_client = create_client(
        &config.provider,
        config.endpoint.as_deref(),
        config.api_key.as_deref(),
    )?;

    let client: Arc<dyn LlmClient> = if no_cache {
        raw_client
    } else {
        Arc::new(CachedClient::new(
            raw_client,
            ResponseCache::open(config.response_cache_dir())?,
        ))
    };

    // Retrieval stack: store (created empty if the base is unlearned),
    // cached embedder, retriever, nested machine
    let base_config = kb_config::load_config(&config.workspace, knowledge_base)?;
    let store = Arc::new(VectorStore::open(&kb_config::get_index_path(
        &config.workspace,
        knowledge_base,
    ))?);
    let embedder = agrimind_knowledge::open_embedder(&config.workspace, &base_config)?;

    let retrieval = AdaptiveRetrieval::new(
        Retriever::new(store, embedder, config.retrieval.top_k),
        client.clone(),
        &config.model,
        config.retrieval.clone(),
    );

    // Specialist stack
    let registry = Arc::new(AgentRegistry::with_default_specialists(
        client.clone(),
        &config.model,
    ));
    let dispatcher = Dispatcher::new(
        registry.clone(),
        config.dispatch.max_concurrency,
        Duration::from_secs(config.dispatch.handler_timeout_secs),
    );

    Ok(WorkflowEngine::new(
        retrieval,
        registry,
        RouterAgent::new(client.clone(), &config.model),
        dispatcher,
        Synthesizer::new(client.clone(), &config.model),
        AnswerGrader::new(client.clone(), &config.model),
        QueryRewriter::new(client, &config.model),
        config.controller.clone(),
    ))
}

fn print_text(outcome: &WorkflowOutcome) {
    println!("{}", outcome.answer);
    println!();
    println!("Quality metrics:");
    println!("  - Adequate: {}", outcome.adequate);
    println!("  - Final strategy: {}", outcome.final_strategy);
    println!("  - Switched: {}", outcome.switched);
    if !outcome.rationale.is_empty() {
        println!("  - Grade rationale: {}", outcome.rationale);
    }

    if !outcome.routed_agents.is_empty() {
        println!("  - Routed agents: {}", outcome.routed_agents.join(", "));
    }
}

fn print_json(config: &AppConfig, outcome: &WorkflowOutcome) -> AppResult<()> {
    let output = serde_json::json!({
        "answer": outcome.answer,
        "agentResponses": outcome.agent_responses,
        "routedAgents": outcome.routed_agents,
        "adequate": outcome.adequate,
        "rationale": outcome.rationale,
        "finalStrategy": outcome.final_strategy,
        "switched": outcome.switched,
        "provider": config.provider,
        "model": config.model,
        "audit": outcome.audit,
    });

    let json = serde_json::to_string_pretty(&output)
        .map_err(|e| agrimind_core::AppError::Serialization(e.to_string()))?;
    println!("{}", json);

    Ok(())
}
