//! Mock LLM provider for testing and development.
//!
//! Returns deterministic responses selected by substring rules against the
//! request text, falling back to a fixed default. Also counts calls so tests
//! can assert on cache behavior.

use crate::client::{LlmClient, LlmRequest, LlmResponse, LlmUsage};
use agrimind_core::AppResult;
use std::sync::atomic::{AtomicUsize, Ordering};

/// A deterministic scripted client.
///
/// Rules are checked in insertion order against the concatenation of system
/// and user prompt; the first match wins. With no matching rule the default
/// response is returned.
pub struct MockClient {
    default_response: String,
    rules: Vec<(String, String)>,
    calls: AtomicUsize,
}

impl MockClient {
    /// Create a mock client with a default response.
    pub fn new(default_response: impl Into<String>) -> Self {
        Self {
            default_response: default_response.into(),
            rules: Vec::new(),
            calls: AtomicUsize::new(0),
        }
    }

    /// Add a substring rule: requests whose text contains `pattern` get
    /// `response`.
    pub fn with_rule(mut self, pattern: impl Into<String>, response: impl Into<String>) -> Self {
        self.rules.push((pattern.into(), response.into()));
        self
    }

    /// Number of completions served so far.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn select_response(&self, request: &LlmRequest) -> String {
        let haystack = format!(
            "{}\n{}",
            request.system.as_deref().unwrap_or(""),
            request.prompt
        );

        for (pattern, response) in &self.rules {
            if haystack.contains(pattern.as_str()) {
                return response.clone();
            }
        }

        self.default_response.clone()
    }
}

#[async_trait::async_trait]
impl LlmClient for MockClient {
    fn provider_name(&self) -> &str {
        "mock"
    }

    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let content = self.select_response(request);

        Ok(LlmResponse {
            content,
            model: request.model.clone(),
            usage: LlmUsage::default(),
        })
    }
}
