//! Delimited-text loader producing a raw table.

use crate::domain::error::VolError;
use crate::domain::raw_table::{Cell, RawColumn, RawTable};
use crate::ports::table_port::TableSource;
use std::fs;
use std::path::PathBuf;

pub struct CsvTableAdapter {
    path: PathBuf,
    delimiter: u8,
}

impl CsvTableAdapter {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            delimiter: b',',
        }
    }

    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Parses delimited bytes with a header row into text cells.
    ///
    /// Invalid UTF-8 is replaced rather than rejected, short records are
    /// padded with empty cells.
    pub fn parse(content: &[u8], delimiter: u8) -> Result<RawTable, VolError> {
        let mut rdr = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .flexible(true)
            .from_reader(content);

        let headers: Vec<String> = rdr
            .byte_headers()
            .map_err(|e| VolError::Input {
                reason: format!("CSV header error: {}", e),
            })?
            .iter()
            .map(|h| String::from_utf8_lossy(h).trim().to_string())
            .collect();

        let mut columns: Vec<Vec<Cell>> = vec![Vec::new(); headers.len()];
        for result in rdr.byte_records() {
            let record = result.map_err(|e| VolError::Input {
                reason: format!("CSV parse error: {}", e),
            })?;
            for (i, cells) in columns.iter_mut().enumerate() {
                let cell = record
                    .get(i)
                    .map_or(Cell::Empty, |field| Cell::text(&String::from_utf8_lossy(field)));
                cells.push(cell);
            }
        }

        Ok(headers
            .into_iter()
            .zip(columns)
            .fold(RawTable::new(), |table, (name, cells)| {
                table.with_column(RawColumn::new(name, cells))
            }))
    }
}

impl TableSource for CsvTableAdapter {
    fn load(&self) -> Result<RawTable, VolError> {
        let content = fs::read(&self.path).map_err(|e| VolError::Input {
            reason: format!("failed to read {}: {}", self.path.display(), e),
        })?;
        let table = Self::parse(&content, self.delimiter)?;
        log::info!(
            "loaded {} rows from {}",
            table.row_count(),
            self.path.display()
        );
        Ok(table)
    }
}
