use std::collections::BTreeMap;

use serde::Serialize;

use super::model::{Column, Table};
use crate::error::{PipelineError, PipelineResult};

/// Name of the percentage column when a proportion table is exported.
pub const PROPORTION_COLUMN: &str = "proportion";

/// Percentage of rows per category label, sorted ascending by label.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProportionTable {
    column: String,
    entries: Vec<(String, f64)>,
}

/// `100 * count(label) / n_rows` for every distinct label of `target`.
///
/// Nulls are counted under the empty label so the percentages still add
/// up to 100. Fails on a table with no rows.
pub fn proportions(table: &Table, target: &str) -> PipelineResult<ProportionTable> {
    let col = table.column(target)?;
    if table.is_empty() {
        return Err(PipelineError::EmptyTable(target.to_string()));
    }

    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for v in col.values() {
        *counts.entry(v.to_string()).or_default() += 1;
    }

    let total = table.n_rows() as f64;
    let entries = counts
        .into_iter()
        .map(|(label, n)| (label, 100.0 * n as f64 / total))
        .collect();

    Ok(ProportionTable {
        column: target.to_string(),
        entries,
    })
}

impl ProportionTable {
    /// Source column name.
    pub fn column(&self) -> &str {
        &self.column
    }

    pub fn entries(&self) -> &[(String, f64)] {
        &self.entries
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(l, _)| l.as_str())
    }

    pub fn get(&self, label: &str) -> Option<f64> {
        self.entries
            .binary_search_by(|(l, _)| l.as_str().cmp(label))
            .ok()
            .map(|i| self.entries[i].1)
    }

    pub fn total(&self) -> f64 {
        self.entries.iter().map(|(_, p)| p).sum()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Two-column table (`<column>`, `proportion`) for export.
    /// A source column itself named `proportion` gets a `_label` suffix.
    pub fn to_table(&self) -> PipelineResult<Table> {
        let label_name = if self.column == PROPORTION_COLUMN {
            format!("{}_label", self.column)
        } else {
            self.column.clone()
        };
        Table::new(vec![
            Column::text(label_name, self.labels()),
            Column::float(PROPORTION_COLUMN, self.entries.iter().map(|(_, p)| *p)),
        ])
    }
}
