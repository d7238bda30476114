//! Text extraction from source documents.
//!
//! Two formats are supported, identified by file extension: `.pdf` and
//! `.docx`. Any other extension is rejected with
//! [`ExtractError::UnsupportedFormat`] before the file is read.

mod docx;
mod pdf;

use std::fs;
use std::path::Path;

use thiserror::Error;

/// Errors that can occur when extracting document text.
#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("Unsupported file format: {extension}")]
    UnsupportedFormat {
        /// Extension including the leading dot, empty when the path has none
        extension: String,
    },

    #[error("Failed to read document: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse DOCX: {0}")]
    Docx(String),

    #[error("Failed to parse PDF: {0}")]
    Pdf(String),
}

/// Document formats the extractor understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Pdf,
    Docx,
}

impl DocumentFormat {
    /// Detect the format from the path's extension (case-insensitive).
    pub fn from_path(path: &Path) -> Result<Self, ExtractError> {
        let extension = path
            .extension()
            .map(|ext| format!(".{}", ext.to_string_lossy()))
            .unwrap_or_default();

        match extension.to_lowercase().as_str() {
            ".pdf" => Ok(DocumentFormat::Pdf),
            ".docx" => Ok(DocumentFormat::Docx),
            _ => Err(ExtractError::UnsupportedFormat { extension }),
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            DocumentFormat::Pdf => ".pdf",
            DocumentFormat::Docx => ".docx",
        }
    }
}

/// Converts a source document into plain text.
pub trait TextExtractor: Send + Sync {
    fn extract(&self, path: &Path) -> Result<String, ExtractError>;
}

/// Built-in extractor for PDF and DOCX files.
#[derive(Debug, Clone, Copy, Default)]
pub struct DocumentExtractor;

impl TextExtractor for DocumentExtractor {
    fn extract(&self, path: &Path) -> Result<String, ExtractError> {
        extract_text(path)
    }
}

/// Extract text from a file on disk.
pub fn extract_text(path: impl AsRef<Path>) -> Result<String, ExtractError> {
    let path = path.as_ref();
    let format = DocumentFormat::from_path(path)?;
    let bytes = fs::read(path)?;

    let text = extract_from_bytes(format, &bytes)?;
    tracing::debug!(
        path = %path.display(),
        format = format.extension(),
        bytes = bytes.len(),
        chars = text.chars().count(),
        "Extracted document text"
    );
    Ok(text)
}

/// Extract text from an in-memory document.
pub fn extract_from_bytes(format: DocumentFormat, bytes: &[u8]) -> Result<String, ExtractError> {
    match format {
        DocumentFormat::Pdf => pdf::extract(bytes),
        DocumentFormat::Docx => docx::extract(bytes),
    }
}
