//! Knowledge base management and adaptive retrieval for AgriMind.
//!
//! Provides local-first RAG: document ingestion into a SQLite vector index,
//! content-hash-cached embeddings, lexically re-ranked similarity search,
//! and the nested adaptive answering machine in [`rag`].

pub mod chunker;
pub mod config;
pub mod embeddings;
pub mod index;
pub mod parser;
pub mod rag;
pub mod rerank;
pub mod retriever;
pub mod types;

// Re-export commonly used types
pub use index::VectorStore;
pub use rag::{AdaptiveRetrieval, RagOutcome};
pub use retriever::Retriever;
pub use types::{
    BaseStats, KnowledgeBaseConfig, KnowledgeChunk, KnowledgeSource, LearnOptions, LearnStats,
    RetrievedDocument,
};

use agrimind_core::{AppError, AppResult};
use chrono::Utc;
use embeddings::{CachedEmbedder, EmbeddingProvider};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use walkdir::WalkDir;

/// Learn from sources and populate the knowledge base.
pub async fn learn(workspace: &Path, options: LearnOptions) -> AppResult<LearnStats> {
    let start = Instant::now();

    tracing::info!("Starting learn operation for base '{}'", options.base_name);

    // Load or create config, applying any overrides from the options
    let mut base_config = config::load_config(workspace, &options.base_name)?;
    if let Some(ref provider) = options.provider {
        base_config.provider = provider.clone();
    }
    if let Some(ref model) = options.model {
        base_config.model = model.clone();
    }
    if let Some(dimensions) = options.dimensions {
        base_config.dimensions = dimensions;
    }

    let index_path = config::get_index_path(workspace, &options.base_name);
    let store = index::VectorStore::open(&index_path)?;

    if options.reset {
        tracing::info!("Resetting knowledge base");
        store.reset()?;
    }

    let embedder = open_embedder(workspace, &base_config)?;

    let mut sources_count = 0u32;
    let mut chunks_count = 0u32;
    let mut bytes_processed = 0u64;

    for path in &options.paths {
        if path.is_file() {
            if let Ok(stats) =
                process_file(&store, embedder.as_ref(), &base_config, path).await
            {
                sources_count += 1;
                chunks_count += stats.0;
                bytes_processed += stats.1;
            }
        } else if path.is_dir() {
            for entry in WalkDir::new(path)
                .follow_links(false)
                .into_iter()
                .filter_map(|e| e.ok())
            {
                let entry_path = entry.path();
                if entry_path.is_file() && should_include(entry_path, &options) {
                    if let Ok(stats) =
                        process_file(&store, embedder.as_ref(), &base_config, entry_path).await
                    {
                        sources_count += 1;
                        chunks_count += stats.0;
                        bytes_processed += stats.1;
                    }
                }
            }
        }
    }

    config::save_config(workspace, &base_config)?;

    let duration = start.elapsed();

    tracing::info!(
        "Learn operation completed: {} sources, {} chunks, {} bytes in {:.2}s",
        sources_count,
        chunks_count,
        bytes_processed,
        duration.as_secs_f64()
    );

    Ok(LearnStats {
        sources_count,
        chunks_count,
        bytes_processed,
        duration_secs: duration.as_secs_f64(),
    })
}

/// Open the configured embedding provider for a base, wrapped in the
/// content-hash cache.
pub fn open_embedder(
    workspace: &Path,
    base_config: &KnowledgeBaseConfig,
) -> AppResult<Arc<dyn EmbeddingProvider>> {
    let inner = embeddings::create_provider(
        &base_config.provider,
        &base_config.model,
        base_config.dimensions,
        None,
    )?;

    let cached = CachedEmbedder::new(inner, config::get_embedding_cache_dir(workspace))?;
    Ok(Arc::new(cached))
}

/// Open the vector store for a base, requiring that it has been built.
pub fn open_store(workspace: &Path, base_name: &str) -> AppResult<Arc<index::VectorStore>> {
    let index_path = config::get_index_path(workspace, base_name);

    if !index::VectorStore::exists(&index_path) {
        return Err(AppError::Knowledge(format!(
            "Knowledge base '{}' has no index. Run 'agrimind knowledge learn' first.",
            base_name
        )));
    }

    Ok(Arc::new(index::VectorStore::open(&index_path)?))
}

/// Process a single file.
async fn process_file(
    store: &index::VectorStore,
    embedder: &dyn EmbeddingProvider,
    base_config: &KnowledgeBaseConfig,
    path: &Path,
) -> AppResult<(u32, u64)> {
    tracing::debug!("Processing file: {:?}", path);

    let text = parser::parse_file(path)?;
    let size_bytes = text.len() as u64;

    let source_id = uuid::Uuid::new_v4().to_string();
    let source = KnowledgeSource {
        id: source_id.clone(),
        path: Some(path.to_path_buf()),
        content_type: parser::ContentType::from_path(path).as_str().to_string(),
        learned_at: Utc::now(),
        size_bytes,
    };

    store.insert_source(&source)?;

    let candidates = chunker::chunk_text(&source_id, &text, base_config.chunk_size);

    let texts: Vec<String> = candidates.iter().map(|c| c.text.clone()).collect();
    let embeddings = embedder.embed_batch(&texts).await?;

    let mut chunks_count = 0u32;

    for (candidate, embedding) in candidates.into_iter().zip(embeddings.into_iter()) {
        let chunk = KnowledgeChunk {
            id: uuid::Uuid::new_v4().to_string(),
            source_id: candidate.source_id,
            position: candidate.position,
            text: candidate.text,
            embedding: Some(embedding),
            metadata: candidate.metadata,
        };

        store.insert_chunk(&chunk)?;
        chunks_count += 1;
    }

    tracing::debug!(
        "Processed {:?}: {} chunks, {} bytes",
        path,
        chunks_count,
        size_bytes
    );

    Ok((chunks_count, size_bytes))
}

/// Check if a file should be included based on patterns.
fn should_include(path: &Path, options: &LearnOptions) -> bool {
    let path_str = path.to_string_lossy();

    // Check excludes first
    for pattern in &options.exclude {
        if path_str.contains(pattern) {
            return false;
        }
    }

    // If includes are specified, must match at least one
    if !options.include.is_empty() {
        for pattern in &options.include {
            if path_str.contains(pattern) {
                return true;
            }
        }
        return false;
    }

    true
}

/// Reset a knowledge base.
pub fn reset(workspace: &Path, base_name: &str) -> AppResult<()> {
    tracing::info!("Resetting knowledge base '{}'", base_name);

    let index_path = config::get_index_path(workspace, base_name);
    if !index::VectorStore::exists(&index_path) {
        return Err(AppError::Knowledge(format!(
            "Knowledge base '{}' does not exist",
            base_name
        )));
    }

    let store = index::VectorStore::open(&index_path)?;
    store.reset()?;

    Ok(())
}

/// Get statistics for a knowledge base.
pub fn stats(workspace: &Path, base_name: &str) -> AppResult<BaseStats> {
    let index_path = config::get_index_path(workspace, base_name);
    if !index::VectorStore::exists(&index_path) {
        return Err(AppError::Knowledge(format!(
            "Knowledge base '{}' does not exist",
            base_name
        )));
    }

    let store = index::VectorStore::open(&index_path)?;
    let (sources_count, chunks_count) = store.stats()?;

    let db_size_bytes = std::fs::metadata(&index_path).map(|m| m.len()).unwrap_or(0);

    Ok(BaseStats {
        base_name: base_name.to_string(),
        sources_count,
        chunks_count,
        db_size_bytes,
    })
}
