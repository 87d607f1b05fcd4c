//! Types for the adaptive retrieval machine.

use crate::types::RetrievedDocument;
use serde::{Deserialize, Serialize};

/// Result of one adaptive retrieval run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RagOutcome {
    /// The generated answer (possibly from the introspective fallback)
    pub answer: String,

    /// Whether the answer passed the groundedness check
    pub grounded: bool,

    /// Whether the answer passed the usefulness check
    pub useful: bool,

    /// Number of query transformations performed
    pub transforms: u32,

    /// Final question text after any transformations
    pub final_question: String,

    /// Documents the answer was conditioned on
    pub documents: Vec<RetrievedDocument>,

    /// Ordered log of state entries for the audit trail
    pub audit: Vec<String>,
}
