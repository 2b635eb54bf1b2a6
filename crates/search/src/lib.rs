//! ContextForge Search
//!
//! The semantic index consumed by the compression pipeline: exact nearest
//! neighbour search over chunk embeddings, persisted as JSON.

pub mod retrieval;

pub use retrieval::VectorIndex;
