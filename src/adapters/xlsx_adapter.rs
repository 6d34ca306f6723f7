//! Spreadsheet loader producing a raw table.
//!
//! Reads one worksheet (the first, unless a name is given) with the first
//! row as headers. Numeric cells stay numeric and date-formatted cells become
//! dates, so the normalizer and date parser see native values.

use crate::domain::error::VolError;
use crate::domain::raw_table::{Cell, RawColumn, RawTable};
use crate::ports::table_port::TableSource;
use calamine::{Data, Reader, open_workbook_auto};
use std::path::{Path, PathBuf};

/// File extensions read through this adapter rather than as delimited text.
pub const SPREADSHEET_EXTENSIONS: &[&str] = &["xlsx", "xlsm", "xlsb", "xls", "ods"];

pub struct XlsxTableAdapter {
    path: PathBuf,
    sheet: Option<String>,
}

impl XlsxTableAdapter {
    pub fn new(path: PathBuf) -> Self {
        Self { path, sheet: None }
    }

    pub fn with_sheet(mut self, sheet: impl Into<String>) -> Self {
        self.sheet = Some(sheet.into());
        self
    }

    pub fn handles(path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| {
                SPREADSHEET_EXTENSIONS
                    .iter()
                    .any(|known| known.eq_ignore_ascii_case(ext))
            })
    }

    fn input_error(&self, detail: impl std::fmt::Display) -> VolError {
        VolError::Input {
            reason: format!("failed to read {}: {}", self.path.display(), detail),
        }
    }
}

fn to_cell(data: &Data) -> Cell {
    match data {
        Data::Int(v) => Cell::Number(*v as f64),
        Data::Float(v) => Cell::Number(*v),
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::text(s),
        Data::DateTime(dt) => dt
            .as_datetime()
            .map_or(Cell::Empty, |value| Cell::Date(value.date())),
        Data::Bool(b) => Cell::Text(b.to_string()),
        Data::Error(_) | Data::Empty => Cell::Empty,
    }
}

impl TableSource for XlsxTableAdapter {
    fn load(&self) -> Result<RawTable, VolError> {
        let mut workbook = open_workbook_auto(&self.path).map_err(|e| self.input_error(e))?;

        let range = match &self.sheet {
            Some(name) => workbook
                .worksheet_range(name)
                .map_err(|e| self.input_error(e))?,
            None => workbook
                .worksheet_range_at(0)
                .ok_or_else(|| self.input_error("workbook has no sheets"))?
                .map_err(|e| self.input_error(e))?,
        };

        let mut rows = range.rows();
        let Some(header_row) = rows.next() else {
            log::info!("loaded 0 rows from {}", self.path.display());
            return Ok(RawTable::new());
        };
        let headers: Vec<String> = header_row
            .iter()
            .map(|h| h.to_string().trim().to_string())
            .collect();

        let mut columns: Vec<Vec<Cell>> = vec![Vec::new(); headers.len()];
        for row in rows {
            for (i, cells) in columns.iter_mut().enumerate() {
                cells.push(row.get(i).map_or(Cell::Empty, to_cell));
            }
        }

        let table = headers
            .into_iter()
            .zip(columns)
            .fold(RawTable::new(), |table, (name, cells)| {
                table.with_column(RawColumn::new(name, cells))
            });
        log::info!(
            "loaded {} rows from {}",
            table.row_count(),
            self.path.display()
        );
        Ok(table)
    }
}
