//! Content-hash embedding cache.
//!
//! Wraps any embedding provider with a flat, content-hash-keyed store on
//! disk. A vector is computed once per distinct text; every later request
//! for the same content is served from the store without touching the
//! underlying provider.

use crate::embeddings::provider::EmbeddingProvider;
use agrimind_core::{AppError, AppResult};
use sha2::{Digest, Sha256};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

/// Caching wrapper around an [`EmbeddingProvider`].
///
/// Keys are the SHA-256 of (model, text) so switching embedding models never
/// serves stale vectors. Writes go through a single lock with a temp-file
/// rename; reads are lock-free.
#[derive(Debug)]
pub struct CachedEmbedder {
    inner: Arc<dyn EmbeddingProvider>,
    dir: PathBuf,
    write_lock: Mutex<()>,
}

impl CachedEmbedder {
    /// Wrap a provider with an on-disk cache at `dir`.
    pub fn new(inner: Arc<dyn EmbeddingProvider>, dir: impl Into<PathBuf>) -> AppResult<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir).map_err(|e| {
            AppError::Knowledge(format!(
                "Failed to create embedding cache at {:?}: {}",
                dir, e
            ))
        })?;

        Ok(Self {
            inner,
            dir,
            write_lock: Mutex::new(()),
        })
    }

    fn key(&self, text: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.inner.model_name().as_bytes());
        hasher.update(b"\x00");
        hasher.update(text.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }

    fn get(&self, text: &str) -> Option<Vec<f32>> {
        let path = self.entry_path(&self.key(text));
        let contents = std::fs::read_to_string(&path).ok()?;

        match serde_json::from_str::<Vec<f32>>(&contents) {
            Ok(vector) => Some(vector),
            Err(e) => {
                tracing::warn!("Discarding unreadable embedding cache entry {:?}: {}", path, e);
                None
            }
        }
    }

    fn put(&self, text: &str, vector: &[f32]) -> AppResult<()> {
        let key = self.key(text);
        let path = self.entry_path(&key);
        let json = serde_json::to_string(vector)?;

        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| AppError::Knowledge("Embedding cache lock poisoned".to_string()))?;

        // Write-then-rename so readers never see a partial entry
        let tmp = self.dir.join(format!("{}.tmp", key));
        std::fs::write(&tmp, json)
            .map_err(|e| AppError::Knowledge(format!("Failed to write cache entry: {}", e)))?;
        std::fs::rename(&tmp, &path)
            .map_err(|e| AppError::Knowledge(format!("Failed to commit cache entry: {}", e)))?;

        Ok(())
    }
}

#[async_trait::async_trait]
impl EmbeddingProvider for CachedEmbedder {
    fn provider_name(&self) -> &str {
        self.inner.provider_name()
    }

    fn model_name(&self) -> &str {
        self.inner.model_name()
    }

    fn dimensions(&self) -> usize {
        self.inner.dimensions()
    }

    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        let mut results: Vec<Option<Vec<f32>>> = Vec::with_capacity(texts.len());
        let mut uncached_texts = Vec::new();
        let mut uncached_indices = Vec::new();

        // Check the store first
        for (i, text) in texts.iter().enumerate() {
            match self.get(text) {
                Some(vector) => results.push(Some(vector)),
                None => {
                    results.push(None);
                    uncached_texts.push(text.clone());
                    uncached_indices.push(i);
                }
            }
        }

        // Batch-embed only the misses
        if !uncached_texts.is_empty() {
            tracing::debug!(
                "Embedding cache: {} hits, {} misses",
                texts.len() - uncached_texts.len(),
                uncached_texts.len()
            );

            let fresh = self.inner.embed_batch(&uncached_texts).await?;

            if fresh.len() != uncached_texts.len() {
                return Err(AppError::Knowledge(format!(
                    "Provider returned {} embeddings for {} texts",
                    fresh.len(),
                    uncached_texts.len()
                )));
            }

            for ((index, text), vector) in uncached_indices
                .iter()
                .zip(uncached_texts.iter())
                .zip(fresh.into_iter())
            {
                if let Err(e) = self.put(text, &vector) {
                    // A failed cache write degrades to a miss next time
                    tracing::warn!("Failed to cache embedding: {}", e);
                }
                results[*index] = Some(vector);
            }
        }

        results
            .into_iter()
            .map(|v| v.ok_or_else(|| AppError::Knowledge("Missing embedding result".to_string())))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    /// Provider that counts how many texts it was actually asked to embed.
    #[derive(Debug)]
    struct CountingProvider {
        calls: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl EmbeddingProvider for CountingProvider {
        fn provider_name(&self) -> &str {
            "counting"
        }

        fn model_name(&self) -> &str {
            "counting-v1"
        }

        fn dimensions(&self) -> usize {
            3
        }

        async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
            self.calls.fetch_add(texts.len(), Ordering::SeqCst);
            Ok(texts.iter().map(|_| vec![1.0, 2.0, 3.0]).collect())
        }
    }

    #[tokio::test]
    async fn test_cache_round_trip_single_provider_call() {
        let temp = TempDir::new().unwrap();
        let counting = Arc::new(CountingProvider {
            calls: AtomicUsize::new(0),
        });
        let cached = CachedEmbedder::new(counting.clone(), temp.path().join("emb")).unwrap();

        let first = cached.embed("irrigation schedule").await.unwrap();
        let second = cached.embed("irrigation schedule").await.unwrap();

        // Identical vector, exactly one provider call across both lookups
        assert_eq!(first, second);
        assert_eq!(counting.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_cache_partial_batch() {
        let temp = TempDir::new().unwrap();
        let counting = Arc::new(CountingProvider {
            calls: AtomicUsize::new(0),
        });
        let cached = CachedEmbedder::new(counting.clone(), temp.path().join("emb")).unwrap();

        cached.embed("text a").await.unwrap();

        let batch = vec!["text a".to_string(), "text b".to_string()];
        let embeddings = cached.embed_batch(&batch).await.unwrap();

        assert_eq!(embeddings.len(), 2);
        // "text a" was served from the store; only "text b" hit the provider
        assert_eq!(counting.calls.load(Ordering::SeqCst), 2);
    }
}
