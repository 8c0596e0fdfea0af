//! Finds the tables in a PDF and selects the single largest one.
//!
//! Extraction runs once over every page, degenerate candidates (no rows, or
//! a single column) are dropped, and the candidate with the most rows wins,
//! ties going to the earliest. Encrypted documents are reported as
//! [`EngineError::EncryptedDocument`]; every other parser failure is treated
//! as an empty document and surfaces as [`EngineError::NoTablesFound`].
//!
//! The password accepted by the entry points is not applied when parsing.

mod csv_out;
mod engine;
mod error;
mod extractor;
mod header;
mod model;
mod options;
mod pdf_reader;
mod selection;
mod table_detect;
mod table_parse;

pub use csv_out::{write_table_csv, write_table_csv_to_string};
pub use engine::{Outcome, TableEngine};
pub use error::{EngineError, ExtractError, is_encryption_failure};
pub use extractor::{PdfTableExtractor, TableExtractor};
pub use model::{CellValue, PdfSource, Table};
pub use options::{ExtractOptions, HeaderMode, PageSelection};
pub use selection::{filter_candidates, is_usable, select_best};

/// Extracts the largest table from a PDF using the default options.
///
/// # Errors
/// See [`TableEngine::run`].
pub fn extract_table(source: PdfSource<'_>, password: Option<&str>) -> Outcome {
    TableEngine::<PdfTableExtractor>::default().run(source, password)
}
