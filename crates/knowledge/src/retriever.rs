//! Query-time retrieval over the vector index.

use crate::embeddings::EmbeddingProvider;
use crate::index::VectorStore;
use crate::rerank;
use crate::types::RetrievedDocument;
use agrimind_core::AppResult;
use std::sync::Arc;

/// Fetches top-k candidate chunks for a question.
///
/// Embeds the question (through whatever caching wrapper the embedder
/// carries), queries the index, and re-ranks the hits lexically. Read-only
/// with respect to the index.
pub struct Retriever {
    store: Arc<VectorStore>,
    embedder: Arc<dyn EmbeddingProvider>,
    top_k: usize,
}

impl Retriever {
    /// Create a retriever over a store and an embedder.
    pub fn new(store: Arc<VectorStore>, embedder: Arc<dyn EmbeddingProvider>, top_k: usize) -> Self {
        Self {
            store,
            embedder,
            top_k,
        }
    }

    /// Retrieve the top-k candidate documents for a question.
    pub async fn retrieve(&self, question: &str) -> AppResult<Vec<RetrievedDocument>> {
        let query_embedding = self.embedder.embed(question).await?;

        let hits = self.store.search(&query_embedding, self.top_k)?;

        let documents: Vec<RetrievedDocument> = hits
            .into_iter()
            .map(|(chunk, score)| RetrievedDocument {
                text: chunk.text,
                score,
                source_id: chunk.source_id,
                position: chunk.position,
            })
            .collect();

        tracing::debug!(
            "Retrieved {} candidates for question (top-{})",
            documents.len(),
            self.top_k
        );

        Ok(rerank::rerank(question, documents))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::providers::TrigramProvider;
    use crate::types::{KnowledgeChunk, KnowledgeSource};
    use tempfile::TempDir;

    async fn seeded_retriever(temp: &TempDir) -> Retriever {
        let store = Arc::new(VectorStore::open(&temp.path().join("index.sqlite")).unwrap());
        let embedder = Arc::new(TrigramProvider::new(128));

        store
            .insert_source(&KnowledgeSource {
                id: "agronomy.md".to_string(),
                path: None,
                content_type: "text".to_string(),
                learned_at: chrono::Utc::now(),
                size_bytes: 0,
            })
            .unwrap();

        for (i, text) in [
            "Rice grows best in flooded paddies with nitrogen-rich fertilizer.",
            "Wheat prefers cool, dry winters and loamy soil.",
            "Tractor maintenance schedules for the harvest season.",
        ]
        .iter()
        .enumerate()
        {
            let embedding = embedder.embed(text).await.unwrap();
            store
                .insert_chunk(&KnowledgeChunk {
                    id: format!("chunk{}", i),
                    source_id: "agronomy.md".to_string(),
                    position: i as u32,
                    text: text.to_string(),
                    embedding: Some(embedding),
                    metadata: serde_json::json!({}),
                })
                .unwrap();
        }

        Retriever::new(store, embedder, 2)
    }

    #[tokio::test]
    async fn test_retrieve_returns_top_k() {
        let temp = TempDir::new().unwrap();
        let retriever = seeded_retriever(&temp).await;

        let docs = retriever
            .retrieve("What fertilizer suits rice paddies?")
            .await
            .unwrap();

        assert_eq!(docs.len(), 2);
        assert!(docs[0].text.contains("Rice"));
    }

    #[tokio::test]
    async fn test_retrieve_empty_index() {
        let temp = TempDir::new().unwrap();
        let store = Arc::new(VectorStore::open(&temp.path().join("empty.sqlite")).unwrap());
        let embedder = Arc::new(TrigramProvider::new(128));
        let retriever = Retriever::new(store, embedder, 3);

        let docs = retriever.retrieve("anything").await.unwrap();
        assert!(docs.is_empty());
    }
}
