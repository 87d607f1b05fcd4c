//! Concurrent specialist fan-out.
//!
//! Invokes every selected handler on its own tokio task, bounded by a
//! semaphore, each call wrapped in an individual timeout. A failing, slow,
//! or panicking handler contributes an error placeholder for its own slot
//! only; the batch always completes with one response per requested name.

use crate::registry::AgentRegistry;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// Parallel dispatcher over the specialist registry.
pub struct Dispatcher {
    registry: Arc<AgentRegistry>,
    max_concurrency: usize,
    handler_timeout: Duration,
}

impl Dispatcher {
    /// Create a dispatcher with a worker-pool bound and per-handler timeout.
    pub fn new(
        registry: Arc<AgentRegistry>,
        max_concurrency: usize,
        handler_timeout: Duration,
    ) -> Self {
        Self {
            registry,
            max_concurrency: max_concurrency.max(1),
            handler_timeout,
        }
    }

    /// Invoke the named handlers concurrently and collect their responses.
    ///
    /// Results arrive in completion order; the returned map always contains
    /// exactly one entry per requested name. Unknown names resolve to a
    /// descriptive "no implementation" response, and failures of any kind
    /// become "Error: …" strings.
    pub async fn dispatch(
        &self,
        handlers: &[String],
        query: &str,
        image: Option<&Path>,
    ) -> HashMap<String, String> {
        let mut responses = HashMap::new();

        if handlers.is_empty() {
            return responses;
        }

        let semaphore = Arc::new(Semaphore::new(self.max_concurrency));
        let mut tasks: JoinSet<(String, String)> = JoinSet::new();

        for name in handlers {
            let agent = match self.registry.get(name) {
                Some(agent) => agent,
                None => {
                    // Classification errors degrade gracefully
                    responses.insert(
                        name.clone(),
                        format!("No implementation for agent: {}", name),
                    );
                    continue;
                }
            };

            let name = name.clone();
            let query = query.to_string();
            let image: Option<PathBuf> = image.map(Path::to_path_buf);
            let semaphore = semaphore.clone();
            let timeout = self.handler_timeout;

            tasks.spawn(async move {
                let _permit = match semaphore.acquire().await {
                    Ok(permit) => permit,
                    Err(_) => return (name, "Error: dispatcher shut down".to_string()),
                };

                let result =
                    tokio::time::timeout(timeout, agent.handle(&query, image.as_deref())).await;

                let response = match result {
                    Ok(Ok(text)) => {
                        tracing::info!("Agent {} completed successfully", name);
                        text
                    }
                    Ok(Err(e)) => {
                        tracing::warn!("Agent {} failed: {}", name, e);
                        format!("Error: {}", e)
                    }
                    Err(_) => {
                        tracing::warn!("Agent {} timed out after {:?}", name, timeout);
                        format!("Error: timed out after {}s", timeout.as_secs())
                    }
                };

                (name, response)
            });
        }

        // Collect in completion order
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((name, response)) => {
                    responses.insert(name, response);
                }
                Err(e) => {
                    // A panicking handler loses only its own slot
                    tracing::error!("Dispatch task panicked: {}", e);
                }
            }
        }

        responses
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::specialist::SpecialistAgent;
    use agrimind_core::{AppError, AppResult};

    struct StubAgent {
        name: &'static str,
        behavior: StubBehavior,
    }

    enum StubBehavior {
        Answer(&'static str),
        Fail(&'static str),
        Hang,
    }

    #[async_trait::async_trait]
    impl SpecialistAgent for StubAgent {
        fn name(&self) -> &str {
            self.name
        }

        async fn handle(&self, _query: &str, _image: Option<&Path>) -> AppResult<String> {
            match self.behavior {
                StubBehavior::Answer(text) => Ok(text.to_string()),
                StubBehavior::Fail(message) => Err(AppError::Agent(message.to_string())),
                StubBehavior::Hang => {
                    tokio::time::sleep(Duration::from_secs(3600)).await;
                    Ok("never".to_string())
                }
            }
        }
    }

    fn registry_with(agents: Vec<StubAgent>) -> Arc<AgentRegistry> {
        let mut registry = AgentRegistry::new();
        for agent in agents {
            registry.register(Arc::new(agent));
        }
        Arc::new(registry)
    }

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_all_handlers_answer() {
        let registry = registry_with(vec![
            StubAgent {
                name: "A",
                behavior: StubBehavior::Answer("answer a"),
            },
            StubAgent {
                name: "B",
                behavior: StubBehavior::Answer("answer b"),
            },
        ]);

        let dispatcher = Dispatcher::new(registry, 4, Duration::from_secs(5));
        let responses = dispatcher.dispatch(&names(&["A", "B"]), "query", None).await;

        assert_eq!(responses.len(), 2);
        assert_eq!(responses["A"], "answer a");
        assert_eq!(responses["B"], "answer b");
    }

    #[tokio::test]
    async fn test_one_failure_does_not_abort_batch() {
        let registry = registry_with(vec![
            StubAgent {
                name: "Good",
                behavior: StubBehavior::Answer("fine"),
            },
            StubAgent {
                name: "Bad",
                behavior: StubBehavior::Fail("boom"),
            },
        ]);

        let dispatcher = Dispatcher::new(registry, 4, Duration::from_secs(5));
        let responses = dispatcher
            .dispatch(&names(&["Good", "Bad"]), "query", None)
            .await;

        assert_eq!(responses.len(), 2);
        assert_eq!(responses["Good"], "fine");
        assert!(responses["Bad"].starts_with("Error:"));
    }

    #[tokio::test]
    async fn test_every_failing_subset_keeps_batch_count() {
        // All subsets of two failing handlers out of three
        for failing in [vec![], vec!["X"], vec!["Y"], vec!["X", "Y"]] {
            let registry = registry_with(
                ["X", "Y", "Z"]
                    .iter()
                    .copied()
                    .map(|name| StubAgent {
                        name,
                        behavior: if failing.contains(&name) {
                            StubBehavior::Fail("boom")
                        } else {
                            StubBehavior::Answer("ok")
                        },
                    })
                    .collect(),
            );

            let dispatcher = Dispatcher::new(registry, 2, Duration::from_secs(5));
            let responses = dispatcher
                .dispatch(&names(&["X", "Y", "Z"]), "query", None)
                .await;

            assert_eq!(responses.len(), 3, "failing subset: {:?}", failing);
            for name in &failing {
                assert!(responses[*name].starts_with("Error:"), "handler {}", name);
            }
        }
    }

    #[tokio::test]
    async fn test_unknown_handler_gets_placeholder() {
        let registry = registry_with(vec![StubAgent {
            name: "Known",
            behavior: StubBehavior::Answer("ok"),
        }]);

        let dispatcher = Dispatcher::new(registry, 4, Duration::from_secs(5));
        let responses = dispatcher
            .dispatch(&names(&["Known", "Ghost"]), "query", None)
            .await;

        assert_eq!(responses.len(), 2);
        assert_eq!(responses["Ghost"], "No implementation for agent: Ghost");
    }

    #[tokio::test]
    async fn test_slow_handler_times_out_alone() {
        let registry = registry_with(vec![
            StubAgent {
                name: "Fast",
                behavior: StubBehavior::Answer("quick"),
            },
            StubAgent {
                name: "Slow",
                behavior: StubBehavior::Hang,
            },
        ]);

        let dispatcher = Dispatcher::new(registry, 4, Duration::from_millis(50));
        let responses = dispatcher
            .dispatch(&names(&["Fast", "Slow"]), "query", None)
            .await;

        assert_eq!(responses.len(), 2);
        assert_eq!(responses["Fast"], "quick");
        assert!(responses["Slow"].contains("timed out"));
    }

    #[tokio::test]
    async fn test_empty_handler_list() {
        let registry = registry_with(vec![]);
        let dispatcher = Dispatcher::new(registry, 4, Duration::from_secs(5));

        let responses = dispatcher.dispatch(&[], "query", None).await;
        assert!(responses.is_empty());
    }
}
