//! Prompt types for AgriMind.
//!
//! This module defines the domain entities for the prompt system.

use serde::{Deserialize, Serialize};

/// A named prompt template.
///
/// Templates use Handlebars syntax; the system part is fixed text and the
/// user part is rendered with per-call variables.
#[derive(Debug, Clone, Copy)]
pub struct PromptDefinition {
    /// Unique prompt identifier (e.g., "rag.generate")
    pub id: &'static str,

    /// System instruction; empty string means no system message
    pub system: &'static str,

    /// User-message template with Handlebars placeholders
    pub template: &'static str,
}

/// A fully built prompt ready for LLM execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuiltPrompt {
    /// System message (optional)
    pub system: Option<String>,

    /// User message (required)
    pub user: String,

    /// Source prompt ID
    pub source_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_built_prompt_shape() {
        let built = BuiltPrompt {
            system: Some("system".to_string()),
            user: "user".to_string(),
            source_id: "test.prompt".to_string(),
        };

        assert_eq!(built.system.as_deref(), Some("system"));
        assert_eq!(built.source_id, "test.prompt");
    }
}
