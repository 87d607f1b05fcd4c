//! Lexical re-ranking of retrieved candidates.
//!
//! Reorders vector-index hits by blending the cosine similarity with a
//! token-overlap score against the query, so candidates that share concrete
//! terms with the question win ties over ones that are only close in
//! embedding space.

use crate::types::RetrievedDocument;
use std::collections::HashSet;

/// Weight given to the embedding score; the remainder goes to token overlap.
const EMBEDDING_WEIGHT: f32 = 0.7;

/// Re-rank documents in place by the blended score, descending.
pub fn rerank(query: &str, mut documents: Vec<RetrievedDocument>) -> Vec<RetrievedDocument> {
    if documents.len() < 2 {
        return documents;
    }

    let query_tokens = tokenize(query);

    documents.sort_by(|a, b| {
        let score_a = blended_score(a, &query_tokens);
        let score_b = blended_score(b, &query_tokens);
        score_b
            .partial_cmp(&score_a)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    documents
}

fn blended_score(document: &RetrievedDocument, query_tokens: &HashSet<String>) -> f32 {
    let overlap = token_overlap(query_tokens, &tokenize(&document.text));
    EMBEDDING_WEIGHT * document.score + (1.0 - EMBEDDING_WEIGHT) * overlap
}

/// Jaccard overlap between two token sets.
fn token_overlap(a: &HashSet<String>, b: &HashSet<String>) -> f32 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    let intersection = a.intersection(b).count() as f32;
    let union = a.union(b).count() as f32;

    if union <= 0.0 {
        0.0
    } else {
        intersection / union
    }
}

fn tokenize(text: &str) -> HashSet<String> {
    text.split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|token| token.len() >= 2)
        .map(|token| token.to_ascii_lowercase())
        .collect()
}
