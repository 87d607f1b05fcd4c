//! Specialist agents and dispatch for AgriMind.
//!
//! This crate holds the specialist side of the adaptive workflow: the
//! `SpecialistAgent` contract and registry, the classifier that routes a
//! query to agents, the concurrent fan-out dispatcher, and the outer
//! controller's collaborators (synthesizer, answer grader, query rewriter).

pub mod dispatch;
pub mod grader;
pub mod registry;
pub mod rewriter;
pub mod router;
pub mod specialist;
pub mod synthesizer;

pub(crate) mod json;

pub use dispatch::Dispatcher;
pub use grader::{AnswerGrader, QualityGrade};
pub use registry::{AgentKind, AgentRegistry};
pub use rewriter::QueryRewriter;
pub use router::{RouterAgent, RoutingDecision};
pub use specialist::{LlmSpecialist, SpecialistAgent};
pub use synthesizer::Synthesizer;
