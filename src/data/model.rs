use std::collections::{BTreeSet, HashSet};
use std::fmt;

use crate::error::{PipelineError, PipelineResult};

// ---------------------------------------------------------------------------
// Value – a single cell
// ---------------------------------------------------------------------------

/// A dynamically-typed cell value.
/// Ordered so that unique values can be collected into a `BTreeSet`.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Text(String),
    Integer(i64),
    Float(f64),
    Null,
}

// -- Manual Eq/Ord so Value can live in ordered sets --

impl Eq for Value {}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Value {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        use Value::*;
        fn rank(v: &Value) -> u8 {
            match v {
                Null => 0,
                Integer(_) => 1,
                Float(_) => 2,
                Text(_) => 3,
            }
        }
        match (self, other) {
            (Null, Null) => std::cmp::Ordering::Equal,
            (Integer(a), Integer(b)) => a.cmp(b),
            (Float(a), Float(b)) => a.total_cmp(b),
            (Text(a), Text(b)) => a.cmp(b),
            _ => rank(self).cmp(&rank(other)),
        }
    }
}

impl std::hash::Hash for Value {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Value::Text(s) => s.hash(state),
            Value::Integer(i) => i.hash(state),
            Value::Float(f) => f.to_bits().hash(state),
            Value::Null => {}
        }
    }
}

/// The text form used for categorical matching and CSV export.
/// Floats use the shortest representation that parses back to the same
/// value and always keep a fractional part (`1.0`, not `1`).
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Text(s) => write!(f, "{s}"),
            Value::Integer(i) => write!(f, "{i}"),
            Value::Float(v) => write!(f, "{v:?}"),
            Value::Null => Ok(()),
        }
    }
}

impl Value {
    /// Numeric view of the value, if it has one.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(v) => Some(*v),
            Value::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Finite numeric reading of the value. Unlike [`as_f64`](Self::as_f64)
    /// this also reads text cells that hold a number, so a mostly numeric
    /// column with a few `unknown` entries can still be compared.
    pub fn numeric(&self) -> Option<f64> {
        match self {
            Value::Text(s) => s.trim().parse::<f64>().ok(),
            other => other.as_f64(),
        }
        .filter(|v| v.is_finite())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// The column kind this value belongs to; `None` for nulls.
    pub fn kind(&self) -> Option<ColumnKind> {
        match self {
            Value::Text(_) => Some(ColumnKind::Text),
            Value::Integer(_) => Some(ColumnKind::Integer),
            Value::Float(_) => Some(ColumnKind::Float),
            Value::Null => None,
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

// ---------------------------------------------------------------------------
// Column
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnKind {
    Text,
    Integer,
    Float,
}

impl ColumnKind {
    pub fn is_numeric(self) -> bool {
        matches!(self, ColumnKind::Integer | ColumnKind::Float)
    }
}

/// A named, homogeneous sequence of values.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    name: String,
    kind: ColumnKind,
    values: Vec<Value>,
}

impl Column {
    /// Build a column, checking that every non-null value matches `kind`.
    pub fn new(name: impl Into<String>, kind: ColumnKind, values: Vec<Value>) -> PipelineResult<Self> {
        let name = name.into();
        if let Some((row, v)) = values
            .iter()
            .enumerate()
            .find(|(_, v)| v.kind().is_some_and(|k| k != kind))
        {
            return Err(PipelineError::InvalidTable(format!(
                "column '{name}' is {kind:?} but row {row} holds {v:?}"
            )));
        }
        Ok(Column { name, kind, values })
    }

    /// Build a column and infer its kind from the first non-null value.
    /// All-null columns are typed as text.
    pub fn from_values(name: impl Into<String>, values: Vec<Value>) -> PipelineResult<Self> {
        let kind = values
            .iter()
            .find_map(Value::kind)
            .unwrap_or(ColumnKind::Text);
        Column::new(name, kind, values)
    }

    pub fn text<S: Into<String>>(name: impl Into<String>, values: impl IntoIterator<Item = S>) -> Self {
        Column {
            name: name.into(),
            kind: ColumnKind::Text,
            values: values.into_iter().map(|s| Value::Text(s.into())).collect(),
        }
    }

    pub fn integer(name: impl Into<String>, values: impl IntoIterator<Item = i64>) -> Self {
        Column {
            name: name.into(),
            kind: ColumnKind::Integer,
            values: values.into_iter().map(Value::Integer).collect(),
        }
    }

    pub fn float(name: impl Into<String>, values: impl IntoIterator<Item = f64>) -> Self {
        Column {
            name: name.into(),
            kind: ColumnKind::Float,
            values: values.into_iter().map(Value::Float).collect(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ColumnKind {
        self.kind
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn take(&self, indices: &[usize]) -> Column {
        Column {
            name: self.name.clone(),
            kind: self.kind,
            values: indices.iter().map(|&i| self.values[i].clone()).collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Table – the loaded dataset
// ---------------------------------------------------------------------------

/// Ordered columns of equal length; rows are aligned positionally.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    columns: Vec<Column>,
    n_rows: usize,
}

impl Table {
    /// Build a table, checking equal column lengths and unique names.
    pub fn new(columns: Vec<Column>) -> PipelineResult<Self> {
        let n_rows = columns.first().map_or(0, Column::len);
        let mut seen = HashSet::new();
        for col in &columns {
            if col.len() != n_rows {
                return Err(PipelineError::InvalidTable(format!(
                    "column '{}' has {} rows, expected {n_rows}",
                    col.name,
                    col.len()
                )));
            }
            if !seen.insert(col.name.as_str()) {
                return Err(PipelineError::InvalidTable(format!(
                    "duplicate column name '{}'",
                    col.name
                )));
            }
        }
        Ok(Table { columns, n_rows })
    }

    /// Same columns, zero rows.
    pub fn empty_like(&self) -> Self {
        self.take_rows(&[])
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(Column::name).collect()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    /// Look up a column, failing with [`PipelineError::ColumnNotFound`].
    pub fn column(&self, name: &str) -> PipelineResult<&Column> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .ok_or_else(|| PipelineError::ColumnNotFound(name.to_string()))
    }

    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    pub fn n_cols(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.n_rows == 0
    }

    /// Values of row `i` in column order.
    pub fn row(&self, i: usize) -> Option<Vec<&Value>> {
        (i < self.n_rows).then(|| self.columns.iter().map(|c| &c.values[i]).collect())
    }

    /// Fresh table holding the given rows, in the given order.
    /// Indices must be in bounds.
    pub fn take_rows(&self, indices: &[usize]) -> Table {
        Table {
            columns: self.columns.iter().map(|c| c.take(indices)).collect(),
            n_rows: indices.len(),
        }
    }

    /// The first `n` rows.
    pub fn head(&self, n: usize) -> Table {
        let indices: Vec<usize> = (0..n.min(self.n_rows)).collect();
        self.take_rows(&indices)
    }

    /// Sorted distinct values of a column (the options a multiselect offers).
    pub fn unique_values(&self, column: &str) -> PipelineResult<BTreeSet<Value>> {
        Ok(self.column(column)?.values.iter().cloned().collect())
    }

    /// Min and max over the values of a column that read as finite numbers
    /// (see [`Value::numeric`]). `Ok(None)` when there is no such value.
    pub fn numeric_bounds(&self, column: &str) -> PipelineResult<Option<(f64, f64)>> {
        Ok(self
            .column(column)?
            .values
            .iter()
            .filter_map(Value::numeric)
            .fold(None, |acc, v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            }))
    }
}

/// Plain-text grid, used for previews on the terminal.
impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cells: Vec<Vec<String>> = self
            .columns
            .iter()
            .map(|c| c.values.iter().map(|v| v.to_string()).collect())
            .collect();
        let widths: Vec<usize> = self
            .columns
            .iter()
            .zip(&cells)
            .map(|(c, vals)| {
                vals.iter()
                    .map(|s| s.chars().count())
                    .chain(std::iter::once(c.name.chars().count()))
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        let header: Vec<String> = self
            .columns
            .iter()
            .zip(&widths)
            .map(|(c, w)| format!("{:<w$}", c.name, w = *w))
            .collect();
        writeln!(f, "{}", header.join("  ").trim_end())?;
        for row in 0..self.n_rows {
            let line: Vec<String> = cells
                .iter()
                .zip(&widths)
                .map(|(vals, w)| format!("{:<w$}", vals[row], w = *w))
                .collect();
            writeln!(f, "{}", line.join("  ").trim_end())?;
        }
        write!(f, "[{} rows x {} columns]", self.n_rows, self.columns.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Table {
        Table::new(vec![
            Column::integer("age", [25, 40, 60]),
            Column::text("y", ["no", "yes", "no"]),
        ])
        .unwrap()
    }

    #[test]
    fn test_new_rejects_ragged_columns() {
        let err = Table::new(vec![
            Column::integer("age", [1, 2]),
            Column::text("y", ["a"]),
        ])
        .unwrap_err();
        assert!(matches!(err, PipelineError::InvalidTable(_)));
    }

    #[test]
    fn test_new_rejects_duplicate_names() {
        let err = Table::new(vec![Column::integer("a", [1]), Column::integer("a", [2])]).unwrap_err();
        assert!(err.to_string().contains("duplicate"));
    }

    #[test]
    fn test_column_rejects_mixed_kinds() {
        let err = Column::new(
            "x",
            ColumnKind::Integer,
            vec![Value::Integer(1), Value::Text("two".into())],
        )
        .unwrap_err();
        assert!(matches!(err, PipelineError::InvalidTable(_)));
    }

    #[test]
    fn test_take_rows_keeps_schema() {
        let t = sample();
        let picked = t.take_rows(&[2, 0]);
        assert_eq!(picked.n_rows(), 2);
        assert_eq!(picked.column_names(), vec!["age", "y"]);
        assert_eq!(picked.row(0).unwrap(), vec![&Value::Integer(60), &Value::from("no")]);
        assert_eq!(t.empty_like().n_cols(), 2);
    }

    #[test]
    fn test_unique_values_sorted() {
        let vals: Vec<Value> = sample().unique_values("y").unwrap().into_iter().collect();
        assert_eq!(vals, vec![Value::from("no"), Value::from("yes")]);
    }

    #[test]
    fn test_numeric_bounds() {
        let t = sample();
        assert_eq!(t.numeric_bounds("age").unwrap(), Some((25.0, 60.0)));
        assert_eq!(t.numeric_bounds("y").unwrap(), None);
        assert!(matches!(
            t.numeric_bounds("balance"),
            Err(PipelineError::ColumnNotFound(_))
        ));
    }

    #[test]
    fn test_numeric_bounds_skip_unreadable_text() {
        let t = Table::new(vec![Column::text("age", ["41", "unknown", "29", "nan"])]).unwrap();
        assert_eq!(t.numeric_bounds("age").unwrap(), Some((29.0, 41.0)));
        assert_eq!(Value::from(" 7 ").numeric(), Some(7.0));
        assert_eq!(Value::Float(f64::INFINITY).numeric(), None);
    }

    #[test]
    fn test_float_display_round_trips() {
        assert_eq!(Value::Float(1.0).to_string(), "1.0");
        assert_eq!(Value::Float(0.1).to_string(), "0.1");
        assert_eq!(Value::Null.to_string(), "");
    }

    #[test]
    fn test_display_grid() {
        let text = sample().head(1).to_string();
        assert!(text.starts_with("age  y"));
        assert!(text.ends_with("[1 rows x 2 columns]"));
    }
}
