use std::collections::HashMap;
use std::io::Cursor;

use anyhow::{anyhow, bail, Context, Result};
use calamine::{open_workbook_auto_from_rs, Data, Reader};

use super::model::{Column, ColumnKind, Table, Value};
use crate::error::{PipelineError, PipelineResult};

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Delimiter of the campaign dataset's native export.
pub const NATIVE_DELIMITER: u8 = b';';

/// Candidate separators, in tie-breaking order.
const DELIMITER_CANDIDATES: [u8; 4] = [b';', b',', b'\t', b'|'];

/// Parse uploaded bytes into a [`Table`].
///
/// Delimited text is tried first. Anything the text parser rejects (not
/// UTF-8, ragged records, no header) is retried as a spreadsheet
/// (xlsx / xls / ods, first worksheet). If both fail the error carries
/// both causes. `declared_name` is only used for messages.
pub fn load(bytes: &[u8], declared_name: &str) -> PipelineResult<Table> {
    let table = match load_delimited(bytes) {
        Ok(table) => {
            log::info!(
                "{declared_name}: parsed as delimited text ({} rows x {} columns)",
                table.n_rows(),
                table.n_cols()
            );
            table
        }
        Err(text_err) => {
            log::warn!("{declared_name}: not delimited text ({text_err:#}), trying spreadsheet");
            match load_spreadsheet(bytes) {
                Ok(table) => {
                    log::info!(
                        "{declared_name}: parsed as spreadsheet ({} rows x {} columns)",
                        table.n_rows(),
                        table.n_cols()
                    );
                    table
                }
                Err(sheet_err) => {
                    return Err(PipelineError::load(
                        declared_name,
                        format!("as delimited text: {text_err:#}; as spreadsheet: {sheet_err:#}"),
                    ));
                }
            }
        }
    };

    if table.n_cols() == 0 {
        return Err(PipelineError::load(declared_name, "table has no columns"));
    }
    Ok(table)
}

// ---------------------------------------------------------------------------
// Delimited text
// ---------------------------------------------------------------------------

/// Pick the separator that occurs most often in the header line.
/// Falls back to [`NATIVE_DELIMITER`] when none occurs.
pub fn detect_delimiter(text: &str) -> u8 {
    let first_line = text.lines().next().unwrap_or("");

    let mut best = NATIVE_DELIMITER;
    let mut best_count = 0;
    for &sep in &DELIMITER_CANDIDATES {
        let count = first_line.bytes().filter(|&b| b == sep).count();
        if count > best_count {
            best_count = count;
            best = sep;
        }
    }
    best
}

fn load_delimited(bytes: &[u8]) -> Result<Table> {
    let text = std::str::from_utf8(bytes).context("input is not UTF-8 text")?;
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    if text.trim().is_empty() {
        bail!("input is empty");
    }

    let delimiter = detect_delimiter(text);
    log::debug!("using delimiter {:?}", delimiter as char);

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(false)
        .from_reader(text.as_bytes());

    let headers = unique_headers(
        reader
            .headers()
            .context("reading header row")?
            .iter()
            .map(str::to_string)
            .collect(),
    );

    let mut cells: Vec<Vec<String>> = vec![Vec::new(); headers.len()];
    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("data row {}", row_no + 1))?;
        for (col, field) in record.iter().enumerate() {
            cells[col].push(field.to_string());
        }
    }

    let columns = headers
        .into_iter()
        .zip(cells)
        .map(|(name, raw)| infer_text_column(name, raw))
        .collect::<PipelineResult<Vec<_>>>()?;
    Ok(Table::new(columns)?)
}

/// Integer if every non-empty cell is an i64, else Float if every one is a
/// finite f64, else Text. Empty cells are nulls.
///
/// A cell only counts as a number when it renders back to the same text, so
/// codes like `007` and words like `nan` or `inf` keep the column Text and a
/// CSV export reloads with identical strings.
fn infer_text_column(name: String, raw: Vec<String>) -> PipelineResult<Column> {
    let present = || raw.iter().map(|s| s.trim()).filter(|s| !s.is_empty());
    let any_present = present().next().is_some();

    let kind = if any_present && present().all(|s| parse_integer(s).is_some()) {
        ColumnKind::Integer
    } else if any_present && present().all(|s| parse_float(s).is_some()) {
        ColumnKind::Float
    } else {
        ColumnKind::Text
    };

    let values = raw
        .into_iter()
        .map(|s| {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return Value::Null;
            }
            match kind {
                ColumnKind::Integer => parse_integer(trimmed).map_or(Value::Null, Value::Integer),
                ColumnKind::Float => parse_float(trimmed).map_or(Value::Null, Value::Float),
                ColumnKind::Text => Value::Text(s),
            }
        })
        .collect();
    Column::new(name, kind, values)
}

fn parse_integer(s: &str) -> Option<i64> {
    s.parse::<i64>().ok().filter(|i| i.to_string() == s)
}

fn parse_float(s: &str) -> Option<f64> {
    s.parse::<f64>()
        .ok()
        .filter(|f| f.is_finite() && Value::Float(*f).to_string() == s)
}

/// Blank headers become `column_<n>`; repeats get a `.<k>` suffix.
fn unique_headers(raw: Vec<String>) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    raw.into_iter()
        .enumerate()
        .map(|(i, h)| {
            let base = if h.trim().is_empty() {
                format!("column_{}", i + 1)
            } else {
                h
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

// ---------------------------------------------------------------------------
// Spreadsheet
// ---------------------------------------------------------------------------

/// First worksheet, first row as header.
fn load_spreadsheet(bytes: &[u8]) -> Result<Table> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))
        .map_err(|e| anyhow!("opening spreadsheet: {e}"))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| anyhow!("spreadsheet has no worksheets"))?
        .map_err(|e| anyhow!("reading first worksheet: {e}"))?;

    let mut rows = range.rows();
    let header_row = rows
        .next()
        .ok_or_else(|| anyhow!("first worksheet is empty"))?;
    let headers = unique_headers(header_row.iter().map(cell_to_string).collect());
    let body: Vec<&[Data]> = rows.collect();

    let columns = headers
        .into_iter()
        .enumerate()
        .map(|(col_idx, name)| {
            let cells: Vec<&Data> = body
                .iter()
                .map(|row| row.get(col_idx).unwrap_or(&Data::Empty))
                .collect();
            infer_sheet_column(name, &cells)
        })
        .collect::<PipelineResult<Vec<_>>>()?;
    Ok(Table::new(columns)?)
}

fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) => Value::Float(*f).to_string(),
        other => other.to_string(),
    }
}

/// Spreadsheets store integers as floats, so whole-number float columns
/// come back as Integer. Any non-numeric cell makes the column Text.
fn infer_sheet_column(name: String, cells: &[&Data]) -> PipelineResult<Column> {
    let present = || cells.iter().filter(|c| !matches!(c, Data::Empty));
    let all_numeric = present().all(|c| matches!(c, Data::Int(_) | Data::Float(_)));
    let any_present = present().next().is_some();

    let kind = if !any_present || !all_numeric {
        ColumnKind::Text
    } else if present().all(|c| match c {
        Data::Int(_) => true,
        Data::Float(f) => f.is_finite() && f.fract() == 0.0 && f.abs() < i64::MAX as f64,
        _ => false,
    }) {
        ColumnKind::Integer
    } else {
        ColumnKind::Float
    };

    let values = cells
        .iter()
        .map(|c| match (kind, c) {
            (_, Data::Empty) => Value::Null,
            (ColumnKind::Integer, Data::Int(i)) => Value::Integer(*i),
            (ColumnKind::Integer, Data::Float(f)) => Value::Integer(*f as i64),
            (ColumnKind::Float, Data::Int(i)) => Value::Float(*i as f64),
            (ColumnKind::Float, Data::Float(f)) => Value::Float(*f),
            (_, other) => Value::Text(cell_to_string(other)),
        })
        .collect();
    Column::new(name, kind, values)
}
