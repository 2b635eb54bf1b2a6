//! Ingestion error types

use contextforge_common::errors::AppError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum IngestionError {
    #[error("Invalid input {path}: {message}")]
    InvalidInput { path: String, message: String },

    #[error("PDF parse error {path}: {message}")]
    PdfParseError { path: String, message: String },

    #[error("Nothing to index: {0}")]
    NoChunks(String),

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error(transparent)]
    Pipeline(#[from] AppError),
}
