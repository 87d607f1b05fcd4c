//! Adaptive retrieval-augmented answering.
//!
//! A nested state machine around the retriever: retrieve, grade the
//! candidates, generate, verify the generation, and either finish, transform
//! the query and retry, or fall back to a deeper introspective pass. The
//! transform loop is bounded by a recursion counter so the machine always
//! terminates.

pub mod graders;
pub mod history;
pub mod machine;
pub mod types;

pub use machine::AdaptiveRetrieval;
pub use types::RagOutcome;
