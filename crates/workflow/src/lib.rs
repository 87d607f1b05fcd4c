//! Adaptive answering workflow for AgriMind.
//!
//! The outer mode controller: runs one of the two answering strategies
//! (corpus retrieval or specialist dispatch), grades the result, and decides
//! whether to terminate, switch strategy once, or rewrite the query and
//! retry dispatch. Both the one-shot switch latch and the rewrite budget are
//! enforced here; the retrieval subsystem carries its own recursion bound.

pub mod controller;
pub mod state;

pub use controller::WorkflowEngine;
pub use state::{Query, WorkflowOutcome, WorkflowState};
