use std::borrow::Cow;

use tracing::debug;

use crate::error::ExtractError;
use crate::header::build_candidate;
use crate::model::{PdfSource, Table};
use crate::options::ExtractOptions;
use crate::pdf_reader::read_pdf_text;
use crate::table_detect::detect_tables;

/// Produces candidate tables from a document.
///
/// Implementations report parser failures as errors; deciding which of them
/// are fatal is left to [`crate::TableEngine`].
pub trait TableExtractor {
    /// Returns every tabular region found, in page order and then region order
    /// within a page.
    ///
    /// # Errors
    /// Returns the underlying parser failure.
    fn extract_candidates(
        &self,
        source: PdfSource<'_>,
        password: Option<&str>,
    ) -> Result<Vec<Table>, ExtractError>;
}

/// Text-layout table detection backed by `lopdf` and `pdf-extract`.
#[derive(Debug, Clone, Default)]
pub struct PdfTableExtractor {
    options: ExtractOptions,
}

impl PdfTableExtractor {
    /// # Errors
    /// Returns [`ExtractError::InvalidOption`] when `min_cols` is below 2.
    pub fn new(options: ExtractOptions) -> Result<Self, ExtractError> {
        if options.min_cols < 2 {
            return Err(ExtractError::InvalidOption(
                "min_cols must be at least 2".to_string(),
            ));
        }
        Ok(Self { options })
    }
}

impl TableExtractor for PdfTableExtractor {
    fn extract_candidates(
        &self,
        source: PdfSource<'_>,
        password: Option<&str>,
    ) -> Result<Vec<Table>, ExtractError> {
        // The password is never handed to the parser, so encrypted documents
        // fail the same way with or without one.
        if password.is_some() {
            debug!("password supplied but not applied to PDF parsing");
        }

        let bytes = match source {
            PdfSource::Bytes(bytes) => Cow::Borrowed(bytes),
            PdfSource::Path(path) => Cow::Owned(std::fs::read(path)?),
        };

        let text = read_pdf_text(&bytes, self.options.pages.as_ref())?;
        let regions = detect_tables(
            &text.pages,
            text.full_text.as_deref(),
            self.options.min_cols,
        );
        debug!(
            pages = text.pages.len(),
            regions = regions.len(),
            "table regions detected"
        );

        Ok(regions
            .iter()
            .map(|region| build_candidate(region, self.options.header_mode))
            .collect())
    }
}
