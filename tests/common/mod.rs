#![allow(dead_code)]

use chrono::{Days, NaiveDate};
use std::io::Write;
use std::path::Path;
use voltable::domain::error::VolError;
use voltable::domain::raw_table::{Cell, RawColumn, RawTable};
use voltable::ports::table_port::TableSource;

/// In-memory table source for engine-level tests.
pub struct MockTableSource {
    pub table: Option<RawTable>,
    pub error: Option<String>,
}

impl MockTableSource {
    pub fn new(table: RawTable) -> Self {
        Self {
            table: Some(table),
            error: None,
        }
    }

    pub fn failing(reason: &str) -> Self {
        Self {
            table: None,
            error: Some(reason.to_string()),
        }
    }
}

impl TableSource for MockTableSource {
    fn load(&self) -> Result<RawTable, VolError> {
        match (&self.table, &self.error) {
            (_, Some(reason)) => Err(VolError::Input {
                reason: reason.clone(),
            }),
            (Some(table), None) => Ok(table.clone()),
            (None, None) => Ok(RawTable::new()),
        }
    }
}

pub fn start_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2020, 1, 1).unwrap()
}

pub fn consecutive_dates(n: usize) -> Vec<NaiveDate> {
    (0..n)
        .map(|i| start_date().checked_add_days(Days::new(i as u64)).unwrap())
        .collect()
}

/// `close[t] = 100 * exp(rate * t)`: constant log returns of `rate`.
pub fn drift_closes(n: usize, rate: f64) -> Vec<f64> {
    (0..n).map(|t| 100.0 * (rate * t as f64).exp()).collect()
}

/// Closes starting at 100 whose log returns are exactly `returns`, up to rounding.
pub fn closes_from_returns(returns: &[f64]) -> Vec<f64> {
    let mut closes = Vec::with_capacity(returns.len() + 1);
    let mut log_price = 100f64.ln();
    closes.push(log_price.exp());
    for r in returns {
        log_price += r;
        closes.push(log_price.exp());
    }
    closes
}

/// Deterministic noisy closes from a fixed-seed xorshift walk.
pub fn noisy_closes(n: usize, daily_vol: f64, seed: u64) -> Vec<f64> {
    let mut state = seed.max(1);
    let mut price = 100.0;
    let mut closes = Vec::with_capacity(n);
    for _ in 0..n {
        closes.push(price);
        state ^= state << 13;
        state ^= state >> 7;
        state ^= state << 17;
        let u = (state >> 11) as f64 / (1u64 << 53) as f64;
        // Uniform on [-sqrt(3), sqrt(3)] has unit variance.
        let shock = (2.0 * u - 1.0) * 3f64.sqrt();
        price *= (daily_vol * shock).exp();
    }
    closes
}

/// A table with native date and numeric cells.
pub fn price_table(closes: &[f64]) -> RawTable {
    let dates = consecutive_dates(closes.len());
    RawTable::new()
        .with_column(RawColumn::new(
            "Date",
            dates.into_iter().map(Cell::Date).collect(),
        ))
        .with_column(RawColumn::new(
            "Close",
            closes.iter().map(|c| Cell::Number(*c)).collect(),
        ))
}

/// Delimited text in the usual export layout, one row per close.
pub fn price_csv(closes: &[f64], delimiter: char, comma_decimal: bool) -> String {
    let d = delimiter;
    let mut out = format!("Date{d}Open{d}High{d}Low{d}Close{d}Adj Close{d}Volume\n");
    for (date, close) in consecutive_dates(closes.len()).iter().zip(closes) {
        let value = if comma_decimal {
            format!("{:.4}", close).replace('.', ",")
        } else {
            format!("{:.4}", close)
        };
        out.push_str(&format!(
            "{}{d}{v}{d}{v}{d}{v}{d}{v}{d}{v}{d}1000\n",
            date.format("%Y-%m-%d"),
            v = value
        ));
    }
    out
}

pub fn write_temp_file(content: &str, suffix: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

/// A one-sheet workbook with date-formatted dates and numeric closes.
pub fn write_price_workbook(path: &Path, closes: &[f64]) {
    use chrono::Datelike;
    use rust_xlsxwriter::{ExcelDateTime, Format, Workbook};

    let mut workbook = Workbook::new();
    let date_format = Format::new().set_num_format("yyyy-mm-dd");
    let sheet = workbook.add_worksheet();
    sheet.write_string(0, 0, "Date").unwrap();
    sheet.write_string(0, 1, "Close").unwrap();
    for (i, (date, close)) in consecutive_dates(closes.len()).iter().zip(closes).enumerate() {
        let row = i as u32 + 1;
        let cell_date =
            ExcelDateTime::from_ymd(date.year() as u16, date.month() as u8, date.day() as u8)
                .unwrap();
        sheet
            .write_datetime_with_format(row, 0, &cell_date, &date_format)
            .unwrap();
        sheet.write_number(row, 1, *close).unwrap();
    }
    workbook.save(path).unwrap();
}
