use crate::config::SortKey;
use crate::table::{ComparisonRow, ComparisonTable};

fn key(row: &ComparisonRow, by: SortKey) -> f64 {
    match by {
        SortKey::Correlation => row.correlation.abs(),
        SortKey::Impact => row.impact.abs(),
        SortKey::Dnll => row.dnll.unwrap_or(f64::NEG_INFINITY),
    }
}

fn order(mut rows: Vec<&ComparisonRow>, by: SortKey) -> Vec<&ComparisonRow> {
    rows.sort_by(|a, b| key(b, by).total_cmp(&key(a, by)).then_with(|| a.name.cmp(&b.name)));
    rows
}

/// Rows ordered by `by`, largest first.
///
/// Ties keep ascending names. Rows without a dnll sort last under [`SortKey::Dnll`].
pub fn sort_rows(table: &ComparisonTable, by: SortKey) -> Vec<&ComparisonRow> {
    order(table.rows().collect(), by)
}

/// [`ComparisonTable::evaluated`] rows in the same order as [`sort_rows`].
pub fn sort_evaluated(table: &ComparisonTable, by: SortKey) -> Vec<&ComparisonRow> {
    order(table.evaluated().collect(), by)
}
