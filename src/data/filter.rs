use std::collections::BTreeSet;
use std::fmt;

use super::model::{Table, Value};
use crate::error::{PipelineError, PipelineResult};

// ---------------------------------------------------------------------------
// Selection: accepted values of one categorical column
// ---------------------------------------------------------------------------

/// Sentinel meaning "no restriction". Never treated as a category label.
pub const ALL: &str = "all";

/// Accepted values for a categorical column.
///
/// If the set contains [`ALL`] every row passes, whatever else is selected.
/// An empty set accepts nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection(BTreeSet<String>);

impl Selection {
    /// `{"all"}`, the default of every multiselect.
    pub fn all() -> Self {
        Selection(BTreeSet::from([ALL.to_string()]))
    }

    pub fn none() -> Self {
        Selection(BTreeSet::new())
    }

    pub fn of<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        values.into_iter().collect()
    }

    pub fn is_all(&self) -> bool {
        self.0.contains(ALL)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn accepts(&self, label: &str) -> bool {
        self.is_all() || self.0.contains(label)
    }

    pub fn values(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl Default for Selection {
    fn default() -> Self {
        Selection::all()
    }
}

impl<S: Into<String>> FromIterator<S> for Selection {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Selection(iter.into_iter().map(Into::into).collect())
    }
}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let values: Vec<&str> = self.values().collect();
        write!(f, "{{{}}}", values.join(", "))
    }
}

// ---------------------------------------------------------------------------
// Filters
// ---------------------------------------------------------------------------

/// Rows whose value in `column`, rendered as text, is in `selected`.
///
/// Numeric cells also match a selected string naming the same number, so
/// `"40"` selects `Float(40.0)` as well as `Integer(40)`. With the [`ALL`]
/// sentinel the whole table comes back as a copy. Row order is preserved and
/// the result is renumbered from zero.
pub fn filter_categorical(table: &Table, column: &str, selected: &Selection) -> PipelineResult<Table> {
    let col = table.column(column)?;
    if selected.is_all() {
        return Ok(table.clone());
    }

    let selected_numbers: Vec<f64> = selected
        .values()
        .filter_map(|s| s.trim().parse::<f64>().ok())
        .filter(|v| v.is_finite())
        .collect();

    let indices: Vec<usize> = col
        .values()
        .iter()
        .enumerate()
        .filter(|(_, v)| {
            selected.accepts(&v.to_string())
                || v.as_f64().is_some_and(|x| selected_numbers.contains(&x))
        })
        .map(|(i, _)| i)
        .collect();
    Ok(table.take_rows(&indices))
}

/// Rows with `low <= value <= high`.
///
/// Cells are compared through [`Value::numeric`], so text cells holding a
/// number take part. Nulls, non-finite values and non-numeric text never
/// match and never raise.
pub fn filter_range(table: &Table, column: &str, low: f64, high: f64) -> PipelineResult<Table> {
    let col = table.column(column)?;
    if low.is_nan() || high.is_nan() || low > high {
        return Err(PipelineError::InvalidRange {
            column: column.to_string(),
            low,
            high,
        });
    }

    let indices: Vec<usize> = col
        .values()
        .iter()
        .enumerate()
        .filter(|(_, v)| v.numeric().is_some_and(|x| low <= x && x <= high))
        .map(|(i, _)| i)
        .collect();
    Ok(table.take_rows(&indices))
}

// ---------------------------------------------------------------------------
// Filter specs
// ---------------------------------------------------------------------------

/// Inclusive numeric bounds on one column.
#[derive(Debug, Clone, PartialEq)]
pub struct RangeFilter {
    pub column: String,
    pub low: f64,
    pub high: f64,
}

impl RangeFilter {
    pub fn new(column: impl Into<String>, low: f64, high: f64) -> Self {
        RangeFilter {
            column: column.into(),
            low,
            high,
        }
    }

    pub fn apply(&self, table: &Table) -> PipelineResult<Table> {
        filter_range(table, &self.column, self.low, self.high)
    }
}

/// Accepted values of one column.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoricalFilter {
    pub column: String,
    pub selection: Selection,
}

impl CategoricalFilter {
    pub fn new(column: impl Into<String>, selection: Selection) -> Self {
        CategoricalFilter {
            column: column.into(),
            selection,
        }
    }

    pub fn apply(&self, table: &Table) -> PipelineResult<Table> {
        filter_categorical(table, &self.column, &self.selection)
    }
}

/// One stage of a pipeline.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterSpec {
    Range(RangeFilter),
    Categorical(CategoricalFilter),
}

impl FilterSpec {
    pub fn apply(&self, table: &Table) -> PipelineResult<Table> {
        match self {
            FilterSpec::Range(f) => f.apply(table),
            FilterSpec::Categorical(f) => f.apply(table),
        }
    }

    pub fn column(&self) -> &str {
        match self {
            FilterSpec::Range(f) => &f.column,
            FilterSpec::Categorical(f) => &f.column,
        }
    }
}

impl fmt::Display for FilterSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterSpec::Range(r) => write!(f, "{} in [{}, {}]", r.column, r.low, r.high),
            FilterSpec::Categorical(c) => write!(f, "{} in {}", c.column, c.selection),
        }
    }
}

impl From<RangeFilter> for FilterSpec {
    fn from(f: RangeFilter) -> Self {
        FilterSpec::Range(f)
    }
}

impl From<CategoricalFilter> for FilterSpec {
    fn from(f: CategoricalFilter) -> Self {
        FilterSpec::Categorical(f)
    }
}

/// Labels a multiselect would offer for a column: its distinct values
/// rendered as text, followed by the [`ALL`] sentinel.
pub fn selection_options(table: &Table, column: &str) -> PipelineResult<Vec<String>> {
    let mut options: Vec<String> = table
        .unique_values(column)?
        .iter()
        .filter(|v| !v.is_null())
        .map(Value::to_string)
        .collect();
    options.push(ALL.to_string());
    Ok(options)
}
