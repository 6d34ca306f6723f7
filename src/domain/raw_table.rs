//! Untyped tabular input as handed over by a loader.

use chrono::NaiveDate;

pub const DATE_COLUMN: &str = "Date";
pub const CLOSE_COLUMN: &str = "Close";

/// Price columns that pass through the numeric normalizer when present.
pub const PRICE_COLUMNS: [&str; 5] = ["Open", "High", "Low", "Close", "Adj Close"];

#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Number(f64),
    Date(NaiveDate),
    Text(String),
}

impl Cell {
    pub fn text(value: &str) -> Self {
        if value.trim().is_empty() {
            Cell::Empty
        } else {
            Cell::Text(value.to_string())
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawColumn {
    pub name: String,
    pub cells: Vec<Cell>,
}

impl RawColumn {
    pub fn new(name: impl Into<String>, cells: Vec<Cell>) -> Self {
        Self {
            name: name.into(),
            cells,
        }
    }

    /// True when every non-empty cell already holds a native number.
    pub fn is_numeric(&self) -> bool {
        self.cells
            .iter()
            .all(|c| matches!(c, Cell::Number(_) | Cell::Empty))
    }
}

/// Column-oriented table. All columns have the same number of rows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    columns: Vec<RawColumn>,
    rows: usize,
}

impl RawTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a table from row-major text records under a header.
    ///
    /// Short records are padded with empty cells, extra fields are ignored.
    pub fn from_text_rows(headers: &[&str], rows: &[Vec<&str>]) -> Self {
        let columns = headers
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let cells = rows
                    .iter()
                    .map(|row| row.get(i).map_or(Cell::Empty, |v| Cell::text(v)))
                    .collect();
                RawColumn::new(name.trim(), cells)
            })
            .collect();
        Self {
            columns,
            rows: rows.len(),
        }
    }

    /// Adds a column, padding or truncating it to the current row count.
    /// The first column added fixes the row count.
    pub fn with_column(mut self, mut column: RawColumn) -> Self {
        if self.columns.is_empty() {
            self.rows = column.cells.len();
        } else {
            column.cells.resize(self.rows, Cell::Empty);
        }
        self.columns.push(column);
        self
    }

    pub fn row_count(&self) -> usize {
        self.rows
    }

    pub fn column(&self, name: &str) -> Option<&RawColumn> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_text_becomes_empty() {
        assert_eq!(Cell::text("   "), Cell::Empty);
        assert_eq!(Cell::text(" 1,5 "), Cell::Text(" 1,5 ".into()));
    }

    #[test]
    fn from_text_rows_pads_short_records() {
        let table = RawTable::from_text_rows(
            &["Date", " Close "],
            &[vec!["2024-01-02", "10"], vec!["2024-01-03"]],
        );
        assert_eq!(table.row_count(), 2);
        let close = table.column("Close").unwrap();
        assert_eq!(close.cells[1], Cell::Empty);
    }

    #[test]
    fn with_column_pads_to_row_count() {
        let table = RawTable::new()
            .with_column(RawColumn::new(
                "Close",
                vec![Cell::Number(1.0), Cell::Number(2.0)],
            ))
            .with_column(RawColumn::new("Open", vec![Cell::Number(1.0)]));
        assert_eq!(table.column("Open").unwrap().cells.len(), 2);
        assert_eq!(table.column_names().collect::<Vec<_>>(), vec!["Close", "Open"]);
    }

    #[test]
    fn numeric_column_detection() {
        let numeric = RawColumn::new("Close", vec![Cell::Number(1.0), Cell::Empty]);
        let mixed = RawColumn::new("Close", vec![Cell::Number(1.0), Cell::Text("2".into())]);
        assert!(numeric.is_numeric());
        assert!(!mixed.is_numeric());
    }
}
