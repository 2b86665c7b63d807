//! Error types for the filter-and-aggregate pipeline.
//!
//! Every failure aborts only the current run; nothing here is fatal to a
//! [`crate::state::Session`].

use thiserror::Error;

/// Errors raised while loading, filtering, aggregating or exporting a table.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Input bytes could not be parsed as delimited text nor as a spreadsheet.
    #[error("Failed to load '{name}': {message}")]
    Load { name: String, message: String },

    /// A filter or aggregation referenced a column the table does not have.
    #[error("Column not found: {0}")]
    ColumnNotFound(String),

    /// Range bounds are malformed (low above high, or NaN).
    #[error("Invalid range on '{column}': [{low}, {high}]")]
    InvalidRange { column: String, low: f64, high: f64 },

    /// Proportions of zero rows are undefined.
    #[error("Cannot compute proportions of '{0}' on an empty table")]
    EmptyTable(String),

    /// An exporter met a value it cannot represent.
    #[error("Cannot encode value in column '{column}', row {row}: {message}")]
    Encoding {
        column: String,
        row: usize,
        message: String,
    },

    /// Columns passed to a table constructor break its shape invariants.
    #[error("Invalid table: {0}")]
    InvalidTable(String),

    /// Configuration file could not be read or parsed.
    #[error("Config error: {0}")]
    Config(String),
}

impl PipelineError {
    pub(crate) fn load(name: &str, message: impl Into<String>) -> Self {
        PipelineError::Load {
            name: name.to_string(),
            message: message.into(),
        }
    }

    /// Encoding failure not tied to a particular cell (writer I/O, container errors).
    pub(crate) fn encoding(message: impl Into<String>) -> Self {
        PipelineError::Encoding {
            column: String::new(),
            row: 0,
            message: message.into(),
        }
    }
}

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;
