//! Workflow state types.

use agrimind_agents::QualityGrade;
use agrimind_core::Strategy;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// An incoming question, optionally carrying an image reference.
///
/// Queries are immutable: rewriting produces a new `Query` (preserving the
/// image reference), never an in-place edit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Query {
    /// Question text
    pub text: String,

    /// Optional attached image
    pub image: Option<PathBuf>,
}

impl Query {
    /// Create a query.
    pub fn new(text: impl Into<String>, image: Option<PathBuf>) -> Self {
        Self {
            text: text.into(),
            image,
        }
    }

    /// Whether an image is attached.
    pub fn has_image(&self) -> bool {
        self.image.is_some()
    }

    /// Produce a rewritten query, preserving the image reference.
    pub fn rewritten(&self, text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            image: self.image.clone(),
        }
    }
}

/// The single mutable record threaded through the outer state machine.
///
/// Created once per incoming question and dropped when the controller
/// reaches its terminal phase.
#[derive(Debug)]
pub struct WorkflowState {
    /// The question as originally asked (grading always targets this)
    pub original_question: String,

    /// Current query (may have been rewritten)
    pub query: Query,

    /// Strategy the controller started with
    pub initial_strategy: Strategy,

    /// Strategy currently in effect
    pub strategy: Strategy,

    /// Last candidate answer
    pub answer: String,

    /// Raw per-handler responses from the last dispatch round
    pub agent_responses: HashMap<String, String>,

    /// Handler names selected by the last classification
    pub routed_agents: Vec<String>,

    /// Last quality grade
    pub grade: Option<QualityGrade>,

    /// One-shot latch: set at most once, never reset
    pub switched: bool,

    /// Rewrite-then-dispatch cycles performed so far
    pub rewrites: u32,

    /// Ordered, timestamped phase-entry log
    pub audit: Vec<String>,
}

impl WorkflowState {
    /// Create fresh state for one question.
    pub fn new(query: Query, initial_strategy: Strategy) -> Self {
        Self {
            original_question: query.text.clone(),
            query,
            initial_strategy,
            strategy: initial_strategy,
            answer: String::new(),
            agent_responses: HashMap::new(),
            routed_agents: Vec::new(),
            grade: None,
            switched: false,
            rewrites: 0,
            audit: Vec::new(),
        }
    }

    /// Append a timestamped entry to the audit log.
    pub fn log(&mut self, entry: impl AsRef<str>) {
        let entry = entry.as_ref();
        tracing::info!("workflow: {}", entry);
        self.audit
            .push(format!("{} {}", Utc::now().to_rfc3339(), entry));
    }

    /// Latch the switched flag. Transitions false→true at most once.
    pub fn mark_switched(&mut self) {
        debug_assert!(!self.switched, "strategy may be switched at most once");
        self.switched = true;
    }
}

/// Result handed back across the inbound call boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowOutcome {
    /// Final answer text
    pub answer: String,

    /// Raw per-handler responses (empty for pure retrieval runs)
    pub agent_responses: HashMap<String, String>,

    /// Handler names selected by the classifier, in selection order
    pub routed_agents: Vec<String>,

    /// Whether the final grade was adequate
    pub adequate: bool,

    /// Grade rationale
    pub rationale: String,

    /// Strategy in effect when the workflow terminated
    pub final_strategy: Strategy,

    /// Whether the controller switched strategy
    pub switched: bool,

    /// Ordered, timestamped execution log
    pub audit: Vec<String>,
}

impl WorkflowOutcome {
    /// Build the outcome from terminal state.
    pub fn from_state(state: WorkflowState) -> Self {
        let (adequate, rationale) = state
            .grade
            .as_ref()
            .map(|grade| (grade.adequate, grade.rationale.clone()))
            .unwrap_or((false, "No grade produced".to_string()));

        Self {
            answer: state.answer,
            agent_responses: state.agent_responses,
            routed_agents: state.routed_agents,
            adequate,
            rationale,
            final_strategy: state.strategy,
            switched: state.switched,
            audit: state.audit,
        }
    }
}
