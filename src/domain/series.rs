//! Series preparation: raw table to a clean, date-ordered log-return series.

use chrono::{DateTime, NaiveDate, NaiveDateTime};

use crate::domain::error::VolError;
use crate::domain::normalize::normalize_numeric_column;
use crate::domain::raw_table::{Cell, RawTable, CLOSE_COLUMN, DATE_COLUMN, PRICE_COLUMNS};

const DATE_FORMATS: [&str; 9] = [
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%Y.%m.%d",
    "%Y%m%d",
    "%m/%d/%Y",
    "%d.%m.%Y",
    "%d-%b-%Y",
    "%d %b %Y",
    "%b %d, %Y",
];

const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
];

/// Which columns of the raw table to read.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesOptions {
    pub date_column: String,
    pub price_column: String,
}

impl Default for SeriesOptions {
    fn default() -> Self {
        Self {
            date_column: DATE_COLUMN.to_string(),
            price_column: CLOSE_COLUMN.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub close: f64,
}

/// Prices ordered by date, ties kept in input order.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceSeries {
    pub points: Vec<PricePoint>,
}

impl PriceSeries {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Log returns `ln(close[i] / close[i-1])`, each dated by its later price.
    ///
    /// Non-finite returns (from non-positive prices) are left out; the second
    /// value is how many were dropped.
    pub fn log_returns(&self) -> (ReturnSeries, usize) {
        let mut dates = Vec::with_capacity(self.points.len().saturating_sub(1));
        let mut values = Vec::with_capacity(self.points.len().saturating_sub(1));
        let mut dropped = 0;

        for pair in self.points.windows(2) {
            let r = (pair[1].close / pair[0].close).ln();
            if r.is_finite() {
                dates.push(pair[1].date);
                values.push(r);
            } else {
                dropped += 1;
            }
        }

        (ReturnSeries { dates, values }, dropped)
    }
}

/// Log returns aligned 1:1 with `dates`. Every value is finite.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ReturnSeries {
    pub dates: Vec<NaiveDate>,
    pub values: Vec<f64>,
}

impl ReturnSeries {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The most recent `n` returns, in order. `None` when history is shorter.
    pub fn tail(&self, n: usize) -> Option<&[f64]> {
        if self.values.len() >= n {
            Some(&self.values[self.values.len() - n..])
        } else {
            None
        }
    }
}

/// What happened to the input rows while preparing the series.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CleaningReport {
    pub rows_read: usize,
    pub missing_date: usize,
    pub missing_price: usize,
    pub rows_kept: usize,
    pub non_finite_returns: usize,
    pub comma_decimal_columns: Vec<String>,
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PreparedSeries {
    pub prices: PriceSeries,
    pub returns: ReturnSeries,
    pub report: CleaningReport,
}

/// Validates, cleans and orders the raw table, then computes log returns.
pub fn prepare_series(table: &RawTable, options: &SeriesOptions) -> Result<PreparedSeries, VolError> {
    let date_column =
        table
            .column(&options.date_column)
            .ok_or_else(|| VolError::MissingColumn {
                column: options.date_column.clone(),
            })?;
    let dates: Vec<Option<NaiveDate>> = date_column.cells.iter().map(parse_date_cell).collect();

    let mut report = CleaningReport {
        rows_read: table.row_count(),
        ..CleaningReport::default()
    };

    let mut price_names: Vec<&str> = PRICE_COLUMNS.to_vec();
    if !price_names.contains(&options.price_column.as_str()) {
        price_names.push(&options.price_column);
    }
    let mut closes = None;
    for name in price_names {
        let Some(column) = table.column(name) else {
            continue;
        };
        let normalized = normalize_numeric_column(column);
        if normalized.comma_decimal {
            report.comma_decimal_columns.push(normalized.name.clone());
        }
        if name == options.price_column {
            closes = Some(normalized.values);
        }
    }
    let closes = closes.ok_or_else(|| VolError::MissingColumn {
        column: options.price_column.clone(),
    })?;

    let mut points = Vec::with_capacity(table.row_count());
    for (date, close) in dates.iter().zip(&closes) {
        match (date, close) {
            (None, _) => report.missing_date += 1,
            (Some(_), None) => report.missing_price += 1,
            (Some(date), Some(close)) => points.push(PricePoint {
                date: *date,
                close: *close,
            }),
        }
    }

    if report.missing_date + report.missing_price > 0 {
        log::info!(
            "dropped {} row(s) without a date and {} without a price",
            report.missing_date,
            report.missing_price
        );
    }
    if points.is_empty() {
        return Err(VolError::EmptyAfterCleaning);
    }

    points.sort_by_key(|p| p.date);
    report.rows_kept = points.len();
    report.first_date = points.first().map(|p| p.date);
    report.last_date = points.last().map(|p| p.date);

    let prices = PriceSeries { points };
    let (returns, dropped) = prices.log_returns();
    report.non_finite_returns = dropped;
    if dropped > 0 {
        log::warn!("dropped {} non-finite log return(s) from non-positive prices", dropped);
    }

    if returns.is_empty() {
        return Err(VolError::InsufficientData {
            prices: prices.len(),
        });
    }

    Ok(PreparedSeries {
        prices,
        returns,
        report,
    })
}

/// Parses a date cell, tolerating several common text layouts.
pub fn parse_date_cell(cell: &Cell) -> Option<NaiveDate> {
    match cell {
        Cell::Date(d) => Some(*d),
        Cell::Text(s) => parse_date_text(s.trim()),
        Cell::Number(_) | Cell::Empty => None,
    }
}

fn parse_date_text(s: &str) -> Option<NaiveDate> {
    if s.is_empty() {
        return None;
    }
    if let Some(d) = DATE_FORMATS
        .iter()
        .find_map(|f| NaiveDate::parse_from_str(s, f).ok())
    {
        return Some(d);
    }
    if let Some(dt) = DATETIME_FORMATS
        .iter()
        .find_map(|f| NaiveDateTime::parse_from_str(s, f).ok())
    {
        return Some(dt.date());
    }
    DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.date_naive())
}
