//! ContextForge Ingestion
//!
//! Turns a PDF, or already extracted page text, into the chunk corpus and
//! vector index the compression pipeline retrieves from.

pub mod chunker;
pub mod errors;
pub mod pdf;
pub mod processor;
pub mod sections;

pub use chunker::{chunk_pages, split_text_into_chunks, ChunkingConfig};
pub use errors::IngestionError;
pub use pdf::extract_pages;
pub use processor::{IngestionProcessor, IngestionReport};
pub use sections::{detect_section_header, detect_sections, PageText, SectionedPage};
