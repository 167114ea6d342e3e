//! Core orchestration for chatblog.
//!
//! Groups chat messages into conversations, derives post metadata,
//! optionally polishes content with an LLM, and persists posts idempotently.

pub mod grouper;
pub mod index;
pub mod metadata;
pub mod pipeline;
pub mod polish;
pub mod writer;
