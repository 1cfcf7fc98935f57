//! Workbook input and output.
//!
//! Reading goes through `calamine` (xlsx, xls, ods); writing produces a single
//! xlsx worksheet with `rust_xlsxwriter`.

use std::path::{Path, PathBuf};

use calamine::{Data, Reader, open_workbook_auto};
use rust_xlsxwriter::{Format, Workbook};
use tracing::debug;

use crate::error::{Error, Result};

/// A worksheet read as text: a header row plus data rows of equal width.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub path: PathBuf,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn column_index(&self, name: &str) -> Result<usize> {
        self.headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| Error::MissingColumn {
                column: name.to_string(),
                path: self.path.clone(),
            })
    }

    /// Non-blank values of a column in row order. Blank cells are dropped, so
    /// position in the returned vector is the review index.
    pub fn text_column(&self, name: &str) -> Result<Vec<String>> {
        let idx = self.column_index(name)?;
        Ok(self
            .rows
            .iter()
            .filter_map(|row| row.get(idx))
            .filter(|value| !value.trim().is_empty())
            .cloned()
            .collect())
    }
}

/// Read a worksheet (by name, or the first one) into a [`Table`].
pub fn read_table(path: &Path, sheet: Option<&str>) -> Result<Table> {
    if !path.is_file() {
        return Err(Error::InputNotFound(path.to_path_buf()));
    }

    let mut workbook = open_workbook_auto(path)
        .map_err(|e| Error::Spreadsheet(format!("unable to open {}: {e}", path.display())))?;

    let sheet_names = workbook.sheet_names();
    let sheet_name = match sheet {
        Some(name) => sheet_names
            .iter()
            .find(|s| s.as_str() == name)
            .cloned()
            .ok_or_else(|| {
                Error::Spreadsheet(format!(
                    "sheet '{name}' not found in {} (available: {})",
                    path.display(),
                    sheet_names.join(", ")
                ))
            })?,
        None => sheet_names.first().cloned().ok_or_else(|| {
            Error::Spreadsheet(format!("{} contains no worksheets", path.display()))
        })?,
    };

    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|e| Error::Spreadsheet(format!("unable to read sheet '{sheet_name}': {e}")))?;

    let mut rows_iter = range.rows();
    let headers: Vec<String> = match rows_iter.next() {
        Some(header_row) => header_row
            .iter()
            .map(|cell| cell_to_string(cell).trim().to_string())
            .collect(),
        None => Vec::new(),
    };

    let width = headers.len();
    let rows: Vec<Vec<String>> = rows_iter
        .map(|row| {
            let mut values: Vec<String> = row.iter().map(cell_to_string).collect();
            values.resize(width, String::new());
            values
        })
        .filter(|values| values.iter().any(|v| !v.trim().is_empty()))
        .collect();

    debug!(
        path = %path.display(),
        sheet = %sheet_name,
        rows = rows.len(),
        "worksheet loaded"
    );

    Ok(Table {
        path: path.to_path_buf(),
        headers,
        rows,
    })
}

/// Read the non-blank review texts of `column`.
pub fn read_reviews(path: &Path, sheet: Option<&str>, column: &str) -> Result<Vec<String>> {
    read_table(path, sheet)?.text_column(column)
}

/// Text cells are kept verbatim; header names are trimmed by the caller.
fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        other => other.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Integer(i64),
}

impl From<String> for Cell {
    fn from(value: String) -> Self {
        Cell::Text(value)
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Cell::Text(value.to_string())
    }
}

impl From<usize> for Cell {
    fn from(value: usize) -> Self {
        Cell::Integer(value as i64)
    }
}

impl From<u32> for Cell {
    fn from(value: u32) -> Self {
        Cell::Integer(i64::from(value))
    }
}

/// Rows to be written under a header line.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Report {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl Report {
    pub fn new<I, S>(headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            headers: headers.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    pub fn push_row(&mut self, row: Vec<Cell>) {
        self.rows.push(row);
    }
}

pub fn write_report(path: &Path, report: &Report) -> Result<()> {
    let mut workbook = Workbook::new();
    let header_format = Format::new().set_bold();
    let worksheet = workbook.add_worksheet();

    for (col, header) in report.headers.iter().enumerate() {
        worksheet.write_string_with_format(0, col_num(col)?, header, &header_format)?;
    }

    for (r, row) in report.rows.iter().enumerate() {
        let row_num = u32::try_from(r + 1)
            .map_err(|_| Error::Spreadsheet("too many rows for a worksheet".to_string()))?;
        for (col, cell) in row.iter().enumerate() {
            match cell {
                Cell::Text(text) => {
                    worksheet.write_string(row_num, col_num(col)?, text)?;
                }
                Cell::Integer(n) => {
                    worksheet.write_number(row_num, col_num(col)?, *n as f64)?;
                }
            }
        }
    }

    worksheet.set_freeze_panes(1, 0)?;
    workbook.save(path)?;
    debug!(path = %path.display(), rows = report.rows.len(), "report written");
    Ok(())
}

fn col_num(col: usize) -> Result<u16> {
    u16::try_from(col)
        .map_err(|_| Error::Spreadsheet("too many columns for a worksheet".to_string()))
}
