use std::collections::HashMap;

use tracing::debug;

use crate::model::{CellValue, DetectedTable, Table};
use crate::options::HeaderMode;
use crate::table_parse::{max_width, pad_rows};

const HEADER_CONFIDENCE_THRESHOLD: f32 = 0.55;

fn is_numeric(value: &str) -> bool {
    matches!(CellValue::from_raw(value), CellValue::Number(_))
}

#[allow(clippy::cast_precision_loss)]
fn non_numeric_ratio(cells: &[String]) -> f32 {
    if cells.is_empty() {
        return 0.0;
    }

    let non_numeric = cells.iter().filter(|cell| !is_numeric(cell)).count();
    non_numeric as f32 / cells.len() as f32
}

pub(crate) fn infer_has_header(rows: &[Vec<String>]) -> (bool, f32) {
    if rows.is_empty() {
        return (false, 0.0);
    }

    let first = non_numeric_ratio(&rows[0]);
    let second = rows.get(1).map_or(0.0, |row| non_numeric_ratio(row));

    let confidence = (first * 0.6 + (1.0 - second) * 0.4).clamp(0.0, 1.0);
    let has_header = first >= 0.6 && second <= 0.7;
    (has_header, confidence)
}

/// Names header cells, filling blanks with `Unnamed: {index}` and
/// disambiguating repeats with `.1`, `.2`, ...
fn column_names(header: &[String]) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    header
        .iter()
        .enumerate()
        .map(|(index, raw)| {
            let base = match raw.trim() {
                "" => format!("Unnamed: {index}"),
                name => name.to_string(),
            };
            let count = seen.entry(base.clone()).or_insert(0);
            let name = if *count == 0 {
                base
            } else {
                format!("{base}.{count}")
            };
            *count += 1;
            name
        })
        .collect()
}

fn positional_names(width: usize) -> Vec<String> {
    (0..width).map(|index| index.to_string()).collect()
}

fn uses_header_row(table: &DetectedTable, mode: HeaderMode) -> bool {
    match mode {
        HeaderMode::HasHeader => true,
        HeaderMode::NoHeader => false,
        HeaderMode::AutoDetect => {
            let (has_header, confidence) = infer_has_header(&table.rows);
            if confidence < HEADER_CONFIDENCE_THRESHOLD {
                debug!(
                    page = table.page,
                    confidence, "header inference confidence is low; keeping first row as data"
                );
            }
            has_header && confidence >= HEADER_CONFIDENCE_THRESHOLD
        }
    }
}

/// Turns a detected region into a candidate table with named, typed columns.
pub(crate) fn build_candidate(table: &DetectedTable, mode: HeaderMode) -> Table {
    let width = max_width(&table.rows);
    let rows = pad_rows(&table.rows, width);

    let (columns, body) = match rows.split_first() {
        Some((header, body)) if uses_header_row(table, mode) => (column_names(header), body),
        _ => (positional_names(width), rows.as_slice()),
    };

    Table {
        page: table.page,
        columns,
        rows: body
            .iter()
            .map(|row| row.iter().map(|cell| CellValue::from_raw(cell)).collect())
            .collect(),
    }
}
