//! Embedding engine for knowledge bases.
//!
//! Provides provider-agnostic embedding generation plus a content-hash
//! cache that makes repeat embeddings free.

pub mod cache;
pub mod provider;
pub mod providers;

pub use cache::CachedEmbedder;
pub use provider::{create_provider, EmbeddingProvider};
