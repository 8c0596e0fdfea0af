use std::io;

use thiserror::Error;

/// Failures raised while reading a PDF and detecting tables in it.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("CSV write error: {0}")]
    Csv(#[from] csv::Error),

    #[error("failed to load PDF: {0}")]
    PdfLoad(#[from] lopdf::Error),

    #[error("failed to extract PDF text: {0}")]
    PdfExtract(String),

    #[error("cannot decrypt encrypted PDF document")]
    Encrypted,

    #[error("invalid option: {0}")]
    InvalidOption(String),

    #[error("no pages available after applying selection")]
    NoPagesSelected,
}

/// Caller-visible failures of a table extraction request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("PDF is encrypted. Password required.")]
    EncryptedDocument,

    #[error("No tables found in the PDF")]
    NoTablesFound,
}

const ENCRYPTION_MARKER: &str = "cannot decrypt";

/// Returns true when a parser failure message says the document could not be
/// decrypted.
#[must_use]
pub fn is_encryption_failure(message: &str) -> bool {
    message.to_lowercase().contains(ENCRYPTION_MARKER)
}
