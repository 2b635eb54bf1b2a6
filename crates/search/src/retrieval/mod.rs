//! Vector retrieval
//!
//! Provides a flat (exhaustive) index with squared-L2 distance. It is
//! immutable after construction and safe to share across queries.

mod vector;

pub use vector::VectorIndex;
