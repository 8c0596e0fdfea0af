use std::collections::HashMap;

fn push_cell(cells: &mut Vec<String>, current: &mut String) {
    let cell = current.trim();
    if !cell.is_empty() {
        cells.push(cell.to_string());
    }
    current.clear();
}

/// Splits a text line on tabs or runs of two or more spaces.
pub(crate) fn split_line_into_cells(line: &str) -> Vec<String> {
    let mut cells = Vec::new();
    let mut current = String::new();
    let mut spaces = 0_usize;

    for ch in line.trim().chars() {
        match ch {
            '\t' => {
                push_cell(&mut cells, &mut current);
                spaces = 0;
            }
            ch if ch.is_whitespace() => {
                spaces += 1;
                if spaces == 2 {
                    push_cell(&mut cells, &mut current);
                } else if spaces == 1 {
                    current.push(' ');
                }
            }
            ch => {
                spaces = 0;
                current.push(ch);
            }
        }
    }

    push_cell(&mut cells, &mut current);
    cells
}

pub(crate) fn soft_split_line_into_cells(line: &str) -> Vec<String> {
    line.split_whitespace().map(str::to_string).collect()
}

/// Widest row of a region.
pub(crate) fn max_width(rows: &[Vec<String>]) -> usize {
    rows.iter().map(Vec::len).max().unwrap_or(0)
}

pub(crate) fn pad_rows(rows: &[Vec<String>], width: usize) -> Vec<Vec<String>> {
    rows.iter()
        .map(|row| {
            let mut padded = row.clone();
            padded.resize(width, String::new());
            padded
        })
        .collect()
}

/// Most common row width; ties go to the wider one.
pub(crate) fn modal_width(rows: &[Vec<String>]) -> usize {
    let mut freq = HashMap::new();
    for width in rows.iter().map(Vec::len) {
        *freq.entry(width).or_insert(0_usize) += 1;
    }

    freq.into_iter()
        .max_by_key(|(width, count)| (*count, *width))
        .map_or(0, |(width, _)| width)
}
