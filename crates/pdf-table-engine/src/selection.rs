use crate::model::Table;

/// A candidate survives when it has at least one row and more than one
/// column.
#[must_use]
pub fn is_usable(table: &Table) -> bool {
    table.row_count() > 0 && table.column_count() > 1
}

/// Drops degenerate candidates, preserving extraction order.
#[must_use]
pub fn filter_candidates(candidates: Vec<Table>) -> Vec<Table> {
    candidates.into_iter().filter(is_usable).collect()
}

/// Picks the candidate with the most rows. Ties go to the earliest candidate.
#[must_use]
pub fn select_best(candidates: Vec<Table>) -> Option<Table> {
    let mut best: Option<Table> = None;
    for candidate in candidates {
        let replace = best
            .as_ref()
            .is_none_or(|current| candidate.row_count() > current.row_count());
        if replace {
            best = Some(candidate);
        }
    }
    best
}
