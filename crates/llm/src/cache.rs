//! Content-hash response cache.
//!
//! Memoizes whole-prompt completions in a flat, content-hash-keyed store on
//! disk. Entries are written once on first miss and read on every subsequent
//! hit; they are never invalidated automatically — correctness relies on
//! content-hash stability, not recency.

use crate::client::{LlmClient, LlmRequest, LlmResponse};
use agrimind_core::{AppError, AppResult};
use sha2::{Digest, Sha256};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

/// Flat key-value store for memoized completions.
///
/// Keys are the SHA-256 of (model, system, prompt); values are the serialized
/// response. Writes go through a single lock and a temp-file rename so
/// concurrent workflows never observe a partial entry; reads are lock-free.
pub struct ResponseCache {
    dir: PathBuf,
    write_lock: Mutex<()>,
}

impl ResponseCache {
    /// Open (and create if needed) a response cache at `dir`.
    pub fn open(dir: impl Into<PathBuf>) -> AppResult<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir).map_err(|e| {
            AppError::Llm(format!("Failed to create response cache at {:?}: {}", dir, e))
        })?;

        Ok(Self {
            dir,
            write_lock: Mutex::new(()),
        })
    }

    /// Content-hash key for a request.
    fn key(request: &LlmRequest) -> String {
        let mut hasher = Sha256::new();
        hasher.update(request.model.as_bytes());
        hasher.update(b"\x00");
        hasher.update(request.system.as_deref().unwrap_or("").as_bytes());
        hasher.update(b"\x00");
        hasher.update(request.prompt.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }

    /// Look up a memoized response.
    pub fn get(&self, request: &LlmRequest) -> Option<LlmResponse> {
        let path = self.entry_path(&Self::key(request));
        let contents = std::fs::read_to_string(&path).ok()?;

        match serde_json::from_str(&contents) {
            Ok(response) => Some(response),
            Err(e) => {
                tracing::warn!("Discarding unreadable cache entry {:?}: {}", path, e);
                None
            }
        }
    }

    /// Store a response under the request's content hash.
    pub fn put(&self, request: &LlmRequest, response: &LlmResponse) -> AppResult<()> {
        let key = Self::key(request);
        let path = self.entry_path(&key);
        let json = serde_json::to_string(response)?;

        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| AppError::Llm("Response cache lock poisoned".to_string()))?;

        // Write-then-rename so readers never see a partial entry
        let tmp = self.dir.join(format!("{}.tmp", key));
        std::fs::write(&tmp, json)
            .map_err(|e| AppError::Llm(format!("Failed to write cache entry: {}", e)))?;
        std::fs::rename(&tmp, &path)
            .map_err(|e| AppError::Llm(format!("Failed to commit cache entry: {}", e)))?;

        Ok(())
    }
}

/// An `LlmClient` wrapper that memoizes completions through a
/// [`ResponseCache`].
pub struct CachedClient {
    inner: Arc<dyn LlmClient>,
    cache: ResponseCache,
}

impl CachedClient {
    /// Wrap a client with an on-disk response cache.
    pub fn new(inner: Arc<dyn LlmClient>, cache: ResponseCache) -> Self {
        Self { inner, cache }
    }
}

#[async_trait::async_trait]
impl LlmClient for CachedClient {
    fn provider_name(&self) -> &str {
        self.inner.provider_name()
    }

    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
        if let Some(hit) = self.cache.get(request) {
            tracing::debug!("Response cache hit for model '{}'", request.model);
            return Ok(hit);
        }

        let response = self.inner.complete(request).await?;

        if let Err(e) = self.cache.put(request, &response) {
            // A failed cache write degrades to a miss next time
            tracing::warn!("Failed to cache response: {}", e);
        }

        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::MockClient;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_cache_round_trip() {
        let temp = TempDir::new().unwrap();
        let mock = Arc::new(MockClient::new("memoized answer"));
        let cached = CachedClient::new(
            mock.clone(),
            ResponseCache::open(temp.path().join("responses")).unwrap(),
        );

        let request = LlmRequest::new("same prompt", "test-model");

        let first = cached.complete(&request).await.unwrap();
        let second = cached.complete(&request).await.unwrap();

        assert_eq!(first.content, "memoized answer");
        assert_eq!(second.content, first.content);
        // Second lookup must be served from disk, not the provider
        assert_eq!(mock.call_count(), 1);
    }

    #[tokio::test]
    async fn test_distinct_prompts_distinct_entries() {
        let temp = TempDir::new().unwrap();
        let mock = Arc::new(MockClient::new("answer"));
        let cached = CachedClient::new(
            mock.clone(),
            ResponseCache::open(temp.path().join("responses")).unwrap(),
        );

        cached
            .complete(&LlmRequest::new("prompt one", "m"))
            .await
            .unwrap();
        cached
            .complete(&LlmRequest::new("prompt two", "m"))
            .await
            .unwrap();

        assert_eq!(mock.call_count(), 2);
    }

    #[test]
    fn test_key_depends_on_system_prompt() {
        let bare = LlmRequest::new("prompt", "m");
        let with_system = LlmRequest::new("prompt", "m").with_system("sys");

        assert_ne!(ResponseCache::key(&bare), ResponseCache::key(&with_system));
    }
}
