//! Text chunking with the text-splitter crate.

use crate::types::ChunkCandidate;
use text_splitter::TextSplitter;

/// Chunk text into semantically split segments of at most `chunk_size`
/// characters.
pub fn chunk_text(source_id: &str, text: &str, chunk_size: usize) -> Vec<ChunkCandidate> {
    if text.is_empty() {
        return vec![];
    }

    let splitter = TextSplitter::new(chunk_size);

    let mut chunks = Vec::new();
    let mut byte_offset = 0;

    for (position, chunk_text) in splitter.chunks(text).enumerate() {
        let chunk_len = chunk_text.len();

        if chunk_text.trim().is_empty() {
            byte_offset += chunk_len;
            continue;
        }

        chunks.push(ChunkCandidate {
            source_id: source_id.to_string(),
            position: position as u32,
            text: chunk_text.trim().to_string(),
            metadata: serde_json::json!({
                "start": byte_offset,
                "end": byte_offset + chunk_len,
            }),
        });

        byte_offset += chunk_len;
    }

    tracing::debug!(
        "Chunked {} bytes into {} chunks (size: {})",
        text.len(),
        chunks.len(),
        chunk_size
    );

    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_text_basic() {
        let text = "This is a sentence. ".repeat(100);
        let chunks = chunk_text("test-source", &text, 200);

        assert!(chunks.len() > 1);
        assert_eq!(chunks[0].position, 0);
        for chunk in &chunks {
            assert!(!chunk.text.is_empty());
            assert!(chunk.text.len() <= 200);
            assert_eq!(chunk.source_id, "test-source");
        }
    }

    #[test]
    fn test_chunk_text_empty() {
        let chunks = chunk_text("test-source", "", 100);
        assert!(chunks.is_empty());
    }

    #[test]
    fn test_chunk_text_short_input_single_chunk() {
        let chunks = chunk_text("test-source", "one short paragraph", 512);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, "one short paragraph");
    }

    #[test]
    fn test_chunk_text_utf8() {
        let text = "Solo arcilloso con acentuación: ã, õ, ç. ".repeat(50);
        let chunks = chunk_text("test-source", &text, 100);
        assert!(!chunks.is_empty());
    }
}
