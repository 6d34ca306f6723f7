//! Numeric normalizer for price columns.
//!
//! Text columns are parsed as numbers after a column-wide locale guess: if any
//! cell contains a comma, the whole column is read as `1.234,56` notation
//! (`.` thousands, `,` decimal). Otherwise cells are parsed as plain decimals.
//! A column mixing both notations is therefore misread for some cells; callers
//! rely on that exact behavior.
//!
//! In a column that is not purely numeric, native number cells are rendered
//! back to text and go through the same column-wide parse as the text cells.

use crate::domain::raw_table::{Cell, RawColumn};

#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedColumn {
    pub name: String,
    /// `None` marks a missing or unparseable cell.
    pub values: Vec<Option<f64>>,
    pub comma_decimal: bool,
    pub unparseable: usize,
}

pub fn normalize_numeric_column(column: &RawColumn) -> NormalizedColumn {
    if column.is_numeric() {
        let values: Vec<Option<f64>> = column
            .cells
            .iter()
            .map(|c| match c {
                Cell::Number(v) if v.is_finite() => Some(*v),
                _ => None,
            })
            .collect();
        return NormalizedColumn {
            name: column.name.clone(),
            unparseable: count_unparseable(&column.cells, &values),
            values,
            comma_decimal: false,
        };
    }

    let comma_decimal = column
        .cells
        .iter()
        .any(|c| matches!(c, Cell::Text(s) if s.contains(',')));
    if comma_decimal {
        log::info!(
            "comma decimal format detected in column '{}', converting",
            column.name
        );
    }

    let values: Vec<Option<f64>> = column
        .cells
        .iter()
        .map(|c| match c {
            Cell::Number(v) => parse_text(&format!("{:?}", v), comma_decimal),
            Cell::Text(s) => parse_text(s, comma_decimal),
            _ => None,
        })
        .collect();

    let unparseable = count_unparseable(&column.cells, &values);
    if unparseable > 0 {
        log::debug!(
            "{} unparseable cell(s) in column '{}' treated as missing",
            unparseable,
            column.name
        );
    }

    NormalizedColumn {
        name: column.name.clone(),
        values,
        comma_decimal,
        unparseable,
    }
}

fn parse_text(raw: &str, comma_decimal: bool) -> Option<f64> {
    let trimmed = raw.trim();
    let parsed = if comma_decimal {
        trimmed.replace('.', "").replace(',', ".").parse::<f64>()
    } else {
        trimmed.parse::<f64>()
    };
    parsed.ok().filter(|v| v.is_finite())
}

/// Non-empty cells that did not yield a value.
fn count_unparseable(cells: &[Cell], values: &[Option<f64>]) -> usize {
    cells
        .iter()
        .zip(values)
        .filter(|(c, v)| !c.is_empty() && v.is_none())
        .count()
}
