//! Spreadsheet export of the result table as delimited text.
//!
//! One sheet: a header row, then one row per window label with each
//! estimator formatted as a two-decimal percentage.

use crate::domain::error::VolError;
use crate::domain::estimator::ewma::Lambda;
use crate::domain::estimator::EstimatorKind;
use crate::domain::result_table::{parse_percent, ResultTable, VolatilityEstimate, PERIOD_HEADER};
use crate::domain::window::{WindowLabel, WindowSpec};
use crate::ports::export_port::ResultSink;
use std::fs;
use std::path::{Path, PathBuf};

pub struct CsvExportAdapter {
    path: PathBuf,
    delimiter: u8,
}

impl CsvExportAdapter {
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

    pub fn to_bytes(table: &ResultTable, delimiter: u8) -> Result<Vec<u8>, VolError> {
        let mut wtr = csv::WriterBuilder::new()
            .delimiter(delimiter)
            .from_writer(Vec::new());
        let export_err = |e: csv::Error| VolError::Export {
            reason: format!("CSV write error: {}", e),
        };

        wtr.write_record(table.headers()).map_err(export_err)?;
        for row in table.display_rows() {
            wtr.write_record(&row).map_err(export_err)?;
        }
        wtr.into_inner().map_err(|e| VolError::Export {
            reason: format!("CSV flush error: {}", e),
        })
    }
}

impl ResultSink for CsvExportAdapter {
    fn write(&self, table: &ResultTable) -> Result<(), VolError> {
        let bytes = Self::to_bytes(table, self.delimiter)?;
        fs::write(&self.path, bytes).map_err(|e| VolError::Export {
            reason: format!("failed to write {}: {}", self.path.display(), e),
        })?;
        log::info!("wrote {} rows to {}", table.rows().len(), self.path.display());
        Ok(())
    }
}

/// Reloads an exported sheet. Day counts are resolved against `spec`.
///
/// Values come back at the displayed precision (two decimals of a percent).
pub fn read_result_csv(path: &Path, delimiter: u8, spec: &WindowSpec) -> Result<ResultTable, VolError> {
    let input_err = |reason: String| VolError::Input { reason };

    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .from_path(path)
        .map_err(|e| input_err(format!("failed to read {}: {}", path.display(), e)))?;

    let headers: Vec<String> = rdr
        .headers()
        .map_err(|e| input_err(format!("CSV header error: {}", e)))?
        .iter()
        .map(|h| h.to_string())
        .collect();
    if headers.len() < 3 || headers[0] != PERIOD_HEADER {
        return Err(input_err(format!("unexpected header: {}", headers.join(","))));
    }
    let lambda = parse_lambda_header(&headers[2])?;
    let garch_column = headers
        .get(3)
        .is_some_and(|h| *h == EstimatorKind::Garch.to_string());

    let mut rows = Vec::new();
    for result in rdr.records() {
        let record = result.map_err(|e| input_err(format!("CSV parse error: {}", e)))?;
        let field = |i: usize| record.get(i).unwrap_or("");
        let cell = |i: usize| {
            parse_percent(field(i))
                .ok_or_else(|| input_err(format!("invalid percentage '{}'", field(i))))
        };

        let label: WindowLabel = field(0).parse()?;
        let days = spec
            .windows()
            .iter()
            .find(|w| w.label == label)
            .map(|w| w.days)
            .ok_or_else(|| input_err(format!("window {} is not in the window spec", label)))?;

        rows.push(VolatilityEstimate {
            label,
            days,
            historical: cell(1)?,
            ewma: cell(2)?,
            garch: if garch_column { cell(3)? } else { None },
        });
    }

    Ok(ResultTable::from_rows(lambda, garch_column, rows))
}

fn parse_lambda_header(header: &str) -> Result<Lambda, VolError> {
    let value = header
        .strip_prefix("EWMA (λ=")
        .and_then(|rest| rest.strip_suffix(')'))
        .and_then(|v| v.parse::<f64>().ok())
        .ok_or_else(|| VolError::Input {
            reason: format!("unexpected EWMA header '{}'", header),
        })?;
    Lambda::new(value)
}
