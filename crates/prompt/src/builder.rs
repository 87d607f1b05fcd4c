//! Prompt builder for rendering templates with per-call variables.

use crate::types::{BuiltPrompt, PromptDefinition};
use agrimind_core::{AppError, AppResult};
use handlebars::Handlebars;
use std::collections::HashMap;

/// Render a prompt definition with the given variables.
///
/// Both the system text and the user template are rendered, so a definition
/// may carry placeholders in either part.
pub fn render(
    definition: &PromptDefinition,
    variables: &HashMap<String, String>,
) -> AppResult<BuiltPrompt> {
    tracing::trace!("Building prompt: {}", definition.id);

    let user = render_template(definition.id, definition.template, variables)?;

    let system = if definition.system.is_empty() {
        None
    } else {
        Some(render_template(
            definition.id,
            definition.system,
            variables,
        )?)
    };

    Ok(BuiltPrompt {
        system,
        user,
        source_id: definition.id.to_string(),
    })
}

/// Render a Handlebars template with variables.
fn render_template(
    id: &str,
    template: &str,
    variables: &HashMap<String, String>,
) -> AppResult<String> {
    let mut handlebars = Handlebars::new();

    // Disable HTML escaping for plain text
    handlebars.register_escape_fn(handlebars::no_escape);

    handlebars
        .register_template_string("prompt", template)
        .map_err(|e| AppError::Prompt(format!("Failed to register template '{}': {}", id, e)))?;

    let rendered = handlebars
        .render("prompt", &variables)
        .map_err(|e| AppError::Prompt(format!("Failed to render template '{}': {}", id, e)))?;

    Ok(rendered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::templates;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_render_simple_template() {
        let def = PromptDefinition {
            id: "test.prompt",
            system: "",
            template: "Question: {{question}}",
        };

        let built = render(&def, &vars(&[("question", "Hello?")])).unwrap();
        assert_eq!(built.user, "Question: Hello?");
        assert!(built.system.is_none());
        assert_eq!(built.source_id, "test.prompt");
    }

    #[test]
    fn test_render_system_placeholders() {
        let built = render(
            &templates::SPECIALIST,
            &vars(&[("role", "You are a weather analyst."), ("query", "Rain?")]),
        )
        .unwrap();

        assert_eq!(built.system.as_deref(), Some("You are a weather analyst."));
        assert_eq!(built.user, "Rain?");
    }

    #[test]
    fn test_render_missing_variable_is_empty() {
        let def = PromptDefinition {
            id: "test.prompt",
            system: "",
            template: "Question: {{missing}}",
        };

        // Handlebars renders missing variables as empty string
        let built = render(&def, &HashMap::new()).unwrap();
        assert_eq!(built.user, "Question: ");
    }

    #[test]
    fn test_render_rag_generate() {
        let built = render(
            &templates::RAG_GENERATE,
            &vars(&[
                ("question", "What fertilizer suits rice?"),
                ("context", "[Document 1] Rice prefers nitrogen-rich soil."),
                ("chat_history", "(none)"),
            ]),
        )
        .unwrap();

        assert!(built.user.contains("What fertilizer suits rice?"));
        assert!(built.user.contains("nitrogen-rich"));
        assert!(built.system.unwrap().contains("question-answering"));
    }
}
