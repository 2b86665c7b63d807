use std::fmt;
use std::str::FromStr;

use rust_xlsxwriter::{DocProperties, ExcelDateTime, Workbook, XlsxError};

use super::model::{Table, Value};
use crate::error::{PipelineError, PipelineResult};

/// Worksheet name of every spreadsheet export.
pub const SHEET_NAME: &str = "Sheet1";

/// Longest string a spreadsheet cell can hold.
pub const MAX_CELL_CHARS: usize = 32_767;

// ---------------------------------------------------------------------------
// Formats
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExportFormat {
    Csv,
    Xlsx,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Xlsx => "xlsx",
        }
    }

    /// `<stem>_<suffix>.<ext>`, e.g. `bank_filtered.xlsx`. Advisory only.
    pub fn suggested_file_name(self, stem: &str, suffix: &str) -> String {
        format!("{stem}_{suffix}.{}", self.extension())
    }

    /// Encode `table` in this format.
    pub fn encode(self, table: &Table) -> PipelineResult<Vec<u8>> {
        match self {
            ExportFormat::Csv => to_delimited_text(table),
            ExportFormat::Xlsx => to_spreadsheet(table),
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "xlsx" | "excel" => Ok(ExportFormat::Xlsx),
            other => Err(format!("unknown export format: {other}")),
        }
    }
}

// ---------------------------------------------------------------------------
// Delimited text
// ---------------------------------------------------------------------------

/// UTF-8, comma separated, header row, `\n` line endings, no index column.
pub fn to_delimited_text(table: &Table) -> PipelineResult<Vec<u8>> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(b',')
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    writer
        .write_record(table.column_names())
        .map_err(|e| PipelineError::encoding(format!("writing header: {e}")))?;

    for i in 0..table.n_rows() {
        let record: Vec<String> = table
            .columns()
            .iter()
            .map(|c| c.values()[i].to_string())
            .collect();
        writer
            .write_record(&record)
            .map_err(|e| PipelineError::encoding(format!("writing row {i}: {e}")))?;
    }

    writer
        .into_inner()
        .map_err(|e| PipelineError::encoding(format!("flushing csv: {}", e.error())))
}

// ---------------------------------------------------------------------------
// Spreadsheet
// ---------------------------------------------------------------------------

/// Single worksheet named [`SHEET_NAME`], header row, no index column.
///
/// The document creation date is pinned so identical tables encode to
/// identical bytes.
pub fn to_spreadsheet(table: &Table) -> PipelineResult<Vec<u8>> {
    check_representable(table)?;
    build_workbook(table).map_err(|e| PipelineError::encoding(format!("xlsx: {e}")))
}

fn check_representable(table: &Table) -> PipelineResult<()> {
    for col in table.columns() {
        if col.name().chars().count() > MAX_CELL_CHARS {
            return Err(PipelineError::Encoding {
                column: col.name().chars().take(32).collect(),
                row: 0,
                message: "column name too long for a spreadsheet cell".to_string(),
            });
        }
        for (row, v) in col.values().iter().enumerate() {
            let problem = match v {
                Value::Float(f) if !f.is_finite() => Some(format!("non-finite number {f}")),
                Value::Text(s) if s.chars().count() > MAX_CELL_CHARS => {
                    Some(format!("text longer than {MAX_CELL_CHARS} characters"))
                }
                _ => None,
            };
            if let Some(message) = problem {
                return Err(PipelineError::Encoding {
                    column: col.name().to_string(),
                    row,
                    message,
                });
            }
        }
    }
    Ok(())
}

fn build_workbook(table: &Table) -> Result<Vec<u8>, XlsxError> {
    let mut workbook = Workbook::new();
    let created = ExcelDateTime::from_ymd(2000, 1, 1)?;
    let properties = DocProperties::new().set_creation_datetime(&created);
    workbook.set_properties(&properties);

    let sheet = workbook.add_worksheet();
    sheet.set_name(SHEET_NAME)?;

    for (c, col) in table.columns().iter().enumerate() {
        let c = u16::try_from(c).map_err(|_| XlsxError::RowColumnLimitError)?;
        sheet.write_string(0, c, col.name())?;
        for (r, v) in col.values().iter().enumerate() {
            let r = u32::try_from(r + 1).map_err(|_| XlsxError::RowColumnLimitError)?;
            match v {
                Value::Text(s) => {
                    sheet.write_string(r, c, s)?;
                }
                Value::Integer(i) => {
                    sheet.write_number(r, c, *i as f64)?;
                }
                Value::Float(f) => {
                    sheet.write_number(r, c, *f)?;
                }
                Value::Null => {}
            }
        }
    }

    workbook.save_to_buffer()
}
