use tracing::debug;

use crate::model::{DetectedTable, PageText};
use crate::table_parse::{modal_width, soft_split_line_into_cells, split_line_into_cells};

pub(crate) const LOW_CONFIDENCE_THRESHOLD: f32 = 0.60;

#[allow(clippy::cast_precision_loss)]
fn table_confidence(rows: &[Vec<String>]) -> f32 {
    if rows.len() < 2 {
        return 0.0;
    }

    let modal = modal_width(rows);
    if modal == 0 {
        return 0.0;
    }

    let consistent =
        rows.iter().filter(|row| row.len() == modal).count() as f32 / rows.len() as f32;
    let max_width = rows.iter().map(Vec::len).max().unwrap_or(modal);
    let min_width = rows.iter().map(Vec::len).min().unwrap_or(modal);
    let uniformity = 1.0 - ((max_width - min_width) as f32 / max_width as f32);

    (consistent * 0.75 + uniformity * 0.25).clamp(0.0, 1.0)
}

fn line_cells(line: &str, min_cols: usize) -> Vec<String> {
    let cells = split_line_into_cells(line);
    if cells.len() >= min_cols {
        return cells;
    }

    let soft_cells = soft_split_line_into_cells(line);
    let has_numeric = soft_cells
        .iter()
        .any(|cell| cell.chars().any(|ch| ch.is_ascii_digit()));
    let looks_like_sentence = line.trim_end().ends_with(['.', '!', '?']);

    if soft_cells.len() >= min_cols && !looks_like_sentence && (has_numeric || soft_cells.len() <= 6)
    {
        soft_cells
    } else {
        cells
    }
}

/// Finds runs of at least two consecutive multi-cell lines on one page.
pub(crate) fn detect_tables_in_page(page: &PageText, min_cols: usize) -> Vec<DetectedTable> {
    let mut tables = Vec::new();
    let mut current_rows: Vec<Vec<String>> = Vec::new();

    let flush = |rows: &mut Vec<Vec<String>>, tables: &mut Vec<DetectedTable>| {
        if rows.len() < 2 {
            rows.clear();
            return;
        }

        let confidence = table_confidence(rows);
        if confidence < LOW_CONFIDENCE_THRESHOLD {
            debug!(
                page = page.page_number,
                confidence, "ragged table region detected"
            );
        }
        tables.push(DetectedTable {
            page: page.page_number,
            rows: std::mem::take(rows),
            confidence,
        });
    };

    for line in page.text.lines() {
        let cells = line_cells(line, min_cols);
        if cells.len() >= min_cols {
            current_rows.push(cells);
        } else {
            flush(&mut current_rows, &mut tables);
        }
    }

    flush(&mut current_rows, &mut tables);
    tables
}

/// Detects regions on every page, in page order. When no page yields a
/// region, retries once against the document-level text.
pub(crate) fn detect_tables(
    pages: &[PageText],
    full_text: Option<&str>,
    min_cols: usize,
) -> Vec<DetectedTable> {
    let tables = pages
        .iter()
        .flat_map(|page| detect_tables_in_page(page, min_cols))
        .collect::<Vec<_>>();
    if !tables.is_empty() {
        return tables;
    }

    let Some(text) = full_text.filter(|text| !text.trim().is_empty()) else {
        return tables;
    };

    let fallback = detect_tables_in_page(
        &PageText {
            page_number: 1,
            text: text.to_string(),
        },
        min_cols,
    );
    if !fallback.is_empty() {
        debug!(
            regions = fallback.len(),
            "no page-level tables detected; used document-level text"
        );
    }
    fallback
}

#[cfg(test)]
mod tests {
    use super::{detect_tables, detect_tables_in_page};
    use crate::model::PageText;

    fn page(number: u32, lines: &[&str]) -> PageText {
        PageText {
            page_number: number,
            text: lines.join("\n"),
        }
    }

    #[test]
    fn splits_regions_on_non_table_lines() {
        let page = page(
            1,
            &[
                "Name  Age",
                "Alice  30",
                "This paragraph separates the two tables.",
                "City  Pop  Rank",
                "A  10  1",
                "B  20  2",
            ],
        );

        let tables = detect_tables_in_page(&page, 2);
        assert_eq!(tables.len(), 2);
        assert_eq!(tables[0].rows.len(), 2);
        assert_eq!(tables[1].rows.len(), 3);
        assert!(tables[1].confidence > 0.99);
    }

    #[test]
    fn ignores_single_line_regions_and_sentences() {
        let page = page(
            1,
            &["No table here", "", "This is plain narrative text without columns."],
        );
        assert!(detect_tables_in_page(&page, 2).is_empty());
    }

    #[test]
    fn keeps_page_order_across_pages() {
        let pages = vec![
            page(1, &["a  b", "1  2"]),
            page(2, &["c  d  e", "3  4  5", "6  7  8"]),
        ];

        let tables = detect_tables(&pages, None, 2);
        assert_eq!(tables.iter().map(|t| t.page).collect::<Vec<_>>(), vec![1, 2]);
    }

    #[test]
    fn falls_back_to_document_text() {
        let pages = vec![page(1, &["Just a heading."])];
        let tables = detect_tables(&pages, Some("x  y\n1  2\n3  4"), 2);
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].page, 1);
        assert_eq!(tables[0].rows.len(), 3);
    }
}
