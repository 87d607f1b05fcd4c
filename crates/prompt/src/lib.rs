//! Prompt system for AgriMind.
//!
//! Every LLM-facing judgment in the workflow — generation, grading, routing,
//! rewriting, synthesis — goes through a named prompt template defined here
//! and rendered with Handlebars. Keeping the templates in one crate keeps the
//! judgment surfaces auditable and the call sites free of string assembly.

pub mod builder;
pub mod templates;
pub mod types;

pub use builder::render;
pub use types::{BuiltPrompt, PromptDefinition};
