use tracing::{debug, warn};

use crate::error::{EngineError, is_encryption_failure};
use crate::extractor::{PdfTableExtractor, TableExtractor};
use crate::model::{PdfSource, Table};
use crate::selection::{filter_candidates, select_best};

/// Result of one extraction request: the selected table or why there is none.
pub type Outcome = Result<Table, EngineError>;

/// Runs extract, filter and select over one document.
///
/// Parser failures other than encryption are swallowed and read as "no
/// candidates". This leniency is deliberate: callers only ever see
/// [`EngineError::EncryptedDocument`] or [`EngineError::NoTablesFound`].
#[derive(Debug, Clone, Default)]
pub struct TableEngine<E = PdfTableExtractor> {
    extractor: E,
}

impl<E: TableExtractor> TableEngine<E> {
    pub fn new(extractor: E) -> Self {
        Self { extractor }
    }

    pub fn extractor(&self) -> &E {
        &self.extractor
    }

    /// # Errors
    /// [`EngineError::EncryptedDocument`] when the parser cannot decrypt the
    /// document, whatever password was given; [`EngineError::NoTablesFound`]
    /// when no candidate survives filtering.
    pub fn run(&self, source: PdfSource<'_>, password: Option<&str>) -> Outcome {
        let candidates = match self.extractor.extract_candidates(source, password) {
            Ok(candidates) => candidates,
            Err(error) => {
                let message = error.to_string();
                if is_encryption_failure(&message) {
                    debug!(%message, "document is encrypted");
                    return Err(EngineError::EncryptedDocument);
                }
                warn!(%message, "table extraction failed; treating as no tables");
                Vec::new()
            }
        };

        let detected = candidates.len();
        let usable = filter_candidates(candidates);
        debug!(detected, usable = usable.len(), "filtered candidate tables");

        let selected = select_best(usable).ok_or(EngineError::NoTablesFound)?;
        debug!(
            page = selected.page,
            rows = selected.row_count(),
            columns = selected.column_count(),
            "selected table"
        );
        Ok(selected)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::TableEngine;
    use crate::error::{EngineError, ExtractError};
    use crate::extractor::TableExtractor;
    use crate::model::{CellValue, PdfSource, Table};

    enum Script {
        Tables(Vec<Table>),
        Fail(&'static str),
    }

    struct ScriptedExtractor {
        script: Script,
        seen_passwords: RefCell<Vec<Option<String>>>,
    }

    impl ScriptedExtractor {
        fn new(script: Script) -> Self {
            Self {
                script,
                seen_passwords: RefCell::new(Vec::new()),
            }
        }
    }

    impl TableExtractor for ScriptedExtractor {
        fn extract_candidates(
            &self,
            _source: PdfSource<'_>,
            password: Option<&str>,
        ) -> Result<Vec<Table>, ExtractError> {
            self.seen_passwords
                .borrow_mut()
                .push(password.map(str::to_string));
            match &self.script {
                Script::Tables(tables) => Ok(tables.clone()),
                Script::Fail(message) => Err(ExtractError::PdfExtract((*message).to_string())),
            }
        }
    }

    fn table(page: u32, rows: usize, cols: usize) -> Table {
        Table {
            page,
            columns: (0..cols).map(|index| format!("col{index}")).collect(),
            rows: vec![vec![CellValue::Text("x".to_string()); cols]; rows],
        }
    }

    const DOC: PdfSource<'static> = PdfSource::Bytes(b"%PDF-1.5");

    #[test]
    fn no_regions_means_no_tables_found() {
        let engine = TableEngine::new(ScriptedExtractor::new(Script::Tables(Vec::new())));
        assert_eq!(engine.run(DOC, None), Err(EngineError::NoTablesFound));
    }

    #[test]
    fn picks_wide_region_over_single_column_region() {
        let engine = TableEngine::new(ScriptedExtractor::new(Script::Tables(vec![
            table(1, 2, 1),
            table(2, 10, 3),
        ])));

        let selected = engine.run(DOC, None).expect("a table should be selected");
        assert_eq!(selected.page, 2);
        assert_eq!(selected.row_count(), 10);
        assert_eq!(selected.column_count(), 3);
    }

    #[test]
    fn single_column_regions_alone_find_nothing() {
        let engine = TableEngine::new(ScriptedExtractor::new(Script::Tables(vec![table(1, 100, 1)])));
        assert_eq!(engine.run(DOC, None), Err(EngineError::NoTablesFound));
    }

    #[test]
    fn encryption_failure_surfaces_for_any_password() {
        let engine = TableEngine::new(ScriptedExtractor::new(Script::Fail(
            "file has not been decrypted: cannot decrypt",
        )));

        for password in [None, Some(""), Some("secret")] {
            assert_eq!(
                engine.run(DOC, password),
                Err(EngineError::EncryptedDocument)
            );
        }
        assert_eq!(engine.extractor().seen_passwords.borrow().len(), 3);
    }

    #[test]
    fn other_parser_failures_degrade_to_no_tables() {
        let engine = TableEngine::new(ScriptedExtractor::new(Script::Fail("invalid xref table")));
        assert_eq!(engine.run(DOC, None), Err(EngineError::NoTablesFound));
    }

    #[test]
    fn ties_keep_extraction_order() {
        let engine = TableEngine::new(ScriptedExtractor::new(Script::Tables(vec![
            table(1, 3, 2),
            table(2, 7, 2),
            table(3, 7, 2),
            table(4, 2, 2),
        ])));
        assert_eq!(engine.run(DOC, None).map(|t| t.page), Ok(2));
    }
}
