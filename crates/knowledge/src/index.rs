//! SQLite-backed vector index for knowledge chunks.
//!
//! The index is an append-mostly store: chunks are written during learn
//! operations and read on every retrieval. The connection sits behind a
//! mutex so a store can be shared across concurrent workflow instances.

use crate::types::{KnowledgeChunk, KnowledgeSource};
use agrimind_core::{AppError, AppResult};
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::Mutex;

/// Durable vector index over a single SQLite file.
pub struct VectorStore {
    conn: Mutex<Connection>,
}

impl std::fmt::Debug for VectorStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VectorStore").finish_non_exhaustive()
    }
}

impl VectorStore {
    /// Open (creating if necessary) the index at `db_path`.
    pub fn open(db_path: &Path) -> AppResult<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                AppError::Knowledge(format!("Failed to create index directory: {}", e))
            })?;
        }

        let conn = Connection::open(db_path)
            .map_err(|e| AppError::Knowledge(format!("Failed to open SQLite index: {}", e)))?;

        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS sources (
                id TEXT PRIMARY KEY,
                path TEXT,
                content_type TEXT NOT NULL,
                learned_at TEXT NOT NULL,
                size_bytes INTEGER NOT NULL
            );

            CREATE TABLE IF NOT EXISTS chunks (
                id TEXT PRIMARY KEY,
                source_id TEXT NOT NULL,
                position INTEGER NOT NULL,
                text TEXT NOT NULL,
                embedding BLOB NOT NULL,
                metadata TEXT,
                FOREIGN KEY (source_id) REFERENCES sources(id)
            );

            CREATE INDEX IF NOT EXISTS idx_chunks_source ON chunks(source_id);
            "#,
        )
        .map_err(|e| AppError::Knowledge(format!("Failed to create tables: {}", e)))?;

        tracing::debug!("Opened SQLite index at {:?}", db_path);

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Whether an index already exists at `db_path` (existence check before
    /// rebuild).
    pub fn exists(db_path: &Path) -> bool {
        db_path.exists()
    }

    fn lock(&self) -> AppResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| AppError::Knowledge("Index lock poisoned".to_string()))
    }

    /// Insert a source into the index.
    pub fn insert_source(&self, source: &KnowledgeSource) -> AppResult<()> {
        let conn = self.lock()?;

        conn.execute(
            "INSERT OR REPLACE INTO sources (id, path, content_type, learned_at, size_bytes)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                source.id,
                source
                    .path
                    .as_ref()
                    .map(|p| p.to_string_lossy().to_string()),
                source.content_type,
                source.learned_at.to_rfc3339(),
                source.size_bytes as i64,
            ],
        )
        .map_err(|e| AppError::Knowledge(format!("Failed to insert source: {}", e)))?;

        Ok(())
    }

    /// Insert a chunk with embedding into the index.
    pub fn insert_chunk(&self, chunk: &KnowledgeChunk) -> AppResult<()> {
        let embedding_bytes = embedding_to_bytes(
            chunk
                .embedding
                .as_ref()
                .ok_or_else(|| AppError::Knowledge("Chunk missing embedding".to_string()))?,
        );

        let metadata_json = serde_json::to_string(&chunk.metadata)
            .map_err(|e| AppError::Knowledge(format!("Failed to serialize metadata: {}", e)))?;

        let conn = self.lock()?;

        conn.execute(
            "INSERT OR REPLACE INTO chunks (id, source_id, position, text, embedding, metadata)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                chunk.id,
                chunk.source_id,
                chunk.position as i64,
                chunk.text,
                embedding_bytes,
                metadata_json,
            ],
        )
        .map_err(|e| AppError::Knowledge(format!("Failed to insert chunk: {}", e)))?;

        Ok(())
    }

    /// Query the index for the top-k chunks most similar to the query
    /// embedding, ordered by descending cosine similarity.
    pub fn search(
        &self,
        query_embedding: &[f32],
        top_k: usize,
    ) -> AppResult<Vec<(KnowledgeChunk, f32)>> {
        let conn = self.lock()?;

        let mut stmt = conn
            .prepare("SELECT id, source_id, position, text, embedding, metadata FROM chunks")
            .map_err(|e| AppError::Knowledge(format!("Failed to prepare query: {}", e)))?;

        let chunks_iter = stmt
            .query_map([], |row| {
                let embedding_bytes: Vec<u8> = row.get(4)?;
                let embedding = bytes_to_embedding(&embedding_bytes)
                    .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?;

                let metadata_json: String = row.get(5)?;
                let metadata: serde_json::Value = serde_json::from_str(&metadata_json)
                    .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?;

                Ok(KnowledgeChunk {
                    id: row.get(0)?,
                    source_id: row.get(1)?,
                    position: row.get::<_, i64>(2)? as u32,
                    text: row.get(3)?,
                    embedding: Some(embedding),
                    metadata,
                })
            })
            .map_err(|e| AppError::Knowledge(format!("Failed to query chunks: {}", e)))?;

        let mut results: Vec<(KnowledgeChunk, f32)> = chunks_iter
            .filter_map(|r| r.ok())
            .map(|chunk| {
                let score = chunk
                    .embedding
                    .as_ref()
                    .map(|e| cosine_similarity(query_embedding, e))
                    .unwrap_or(0.0);
                (chunk, score)
            })
            .collect();

        // Sort by score descending
        results.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        results.truncate(top_k);

        tracing::debug!("Retrieved {} chunks (requested top-{})", results.len(), top_k);

        Ok(results)
    }

    /// Get (sources, chunks) counts for the index.
    pub fn stats(&self) -> AppResult<(u32, u32)> {
        let conn = self.lock()?;

        let sources_count: u32 = conn
            .query_row("SELECT COUNT(*) FROM sources", [], |row| {
                row.get::<_, i64>(0).map(|v| v as u32)
            })
            .map_err(|e| AppError::Knowledge(format!("Failed to count sources: {}", e)))?;

        let chunks_count: u32 = conn
            .query_row("SELECT COUNT(*) FROM chunks", [], |row| {
                row.get::<_, i64>(0).map(|v| v as u32)
            })
            .map_err(|e| AppError::Knowledge(format!("Failed to count chunks: {}", e)))?;

        Ok((sources_count, chunks_count))
    }

    /// Reset the index (delete all data).
    pub fn reset(&self) -> AppResult<()> {
        let conn = self.lock()?;

        conn.execute("DELETE FROM chunks", [])
            .map_err(|e| AppError::Knowledge(format!("Failed to delete chunks: {}", e)))?;

        conn.execute("DELETE FROM sources", [])
            .map_err(|e| AppError::Knowledge(format!("Failed to delete sources: {}", e)))?;

        tracing::info!("Reset knowledge base index");
        Ok(())
    }
}

/// Convert embedding vector to bytes for storage.
fn embedding_to_bytes(embedding: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(embedding.len() * 4);
    for &value in embedding {
        bytes.extend_from_slice(&value.to_le_bytes());
    }
    bytes
}

/// Convert bytes back to embedding vector.
fn bytes_to_embedding(bytes: &[u8]) -> AppResult<Vec<f32>> {
    if bytes.len() % 4 != 0 {
        return Err(AppError::Knowledge(
            "Invalid embedding bytes length".to_string(),
        ));
    }

    let mut embedding = Vec::with_capacity(bytes.len() / 4);
    for chunk in bytes.chunks_exact(4) {
        let value = f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        embedding.push(value);
    }

    Ok(embedding)
}

/// Calculate cosine similarity between two vectors.
pub(crate) fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}
