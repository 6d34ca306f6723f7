//! Per-window comparison table of the three estimators.

use std::collections::BTreeMap;

use crate::domain::estimator::ewma::Lambda;
use crate::domain::estimator::EstimatorKind;
use crate::domain::window::{WindowLabel, WindowSpec};

pub const PERIOD_HEADER: &str = "Period (Years)";
pub const UNDEFINED: &str = "n/a";

/// Estimates for one window, as annualized fractions. `None` is undefined.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VolatilityEstimate {
    pub label: WindowLabel,
    pub days: usize,
    pub historical: Option<f64>,
    pub ewma: Option<f64>,
    pub garch: Option<f64>,
}

/// Estimates keyed by window, as produced by a single estimator.
pub type EstimatorColumn = BTreeMap<WindowLabel, Option<f64>>;

#[derive(Debug, Clone, PartialEq)]
pub struct ResultTable {
    lambda: Lambda,
    garch_column: bool,
    rows: Vec<VolatilityEstimate>,
}

impl ResultTable {
    /// Joins estimator columns on window label, in the window spec's order.
    ///
    /// A window missing from every column is left out. Passing `None` for
    /// `garch` drops the GARCH column altogether.
    pub fn assemble(
        spec: &WindowSpec,
        lambda: Lambda,
        historical: &EstimatorColumn,
        ewma: &EstimatorColumn,
        garch: Option<&EstimatorColumn>,
    ) -> Self {
        let rows = spec
            .windows()
            .iter()
            .filter(|w| {
                historical.contains_key(&w.label)
                    || ewma.contains_key(&w.label)
                    || garch.is_some_and(|g| g.contains_key(&w.label))
            })
            .map(|w| VolatilityEstimate {
                label: w.label,
                days: w.days,
                historical: historical.get(&w.label).copied().flatten(),
                ewma: ewma.get(&w.label).copied().flatten(),
                garch: garch.and_then(|g| g.get(&w.label).copied().flatten()),
            })
            .collect();
        Self {
            lambda,
            garch_column: garch.is_some(),
            rows,
        }
    }

    pub fn from_rows(lambda: Lambda, garch_column: bool, rows: Vec<VolatilityEstimate>) -> Self {
        Self {
            lambda,
            garch_column,
            rows,
        }
    }

    pub fn rows(&self) -> &[VolatilityEstimate] {
        &self.rows
    }

    pub fn get(&self, label: WindowLabel) -> Option<&VolatilityEstimate> {
        self.rows.iter().find(|r| r.label == label)
    }

    pub fn lambda(&self) -> Lambda {
        self.lambda
    }

    pub fn has_garch(&self) -> bool {
        self.garch_column
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn headers(&self) -> Vec<String> {
        let mut headers = vec![
            PERIOD_HEADER.to_string(),
            EstimatorKind::Historical.to_string(),
            EstimatorKind::Ewma(self.lambda).to_string(),
        ];
        if self.garch_column {
            headers.push(EstimatorKind::Garch.to_string());
        }
        headers
    }

    /// Rows formatted for display: label then percentages.
    pub fn display_rows(&self) -> Vec<Vec<String>> {
        self.rows
            .iter()
            .map(|r| {
                let mut cells = vec![
                    r.label.to_string(),
                    format_percent(r.historical),
                    format_percent(r.ewma),
                ];
                if self.garch_column {
                    cells.push(format_percent(r.garch));
                }
                cells
            })
            .collect()
    }

    /// Aligned plain-text rendering for the console.
    pub fn render_text(&self) -> String {
        let headers = self.headers();
        let rows = self.display_rows();
        let widths: Vec<usize> = (0..headers.len())
            .map(|i| {
                rows.iter()
                    .map(|r| r[i].chars().count())
                    .chain(std::iter::once(headers[i].chars().count()))
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        let line = |cells: &[String]| -> String {
            cells
                .iter()
                .zip(&widths)
                .map(|(c, w)| format!("{:>width$}", c, width = *w))
                .collect::<Vec<_>>()
                .join("  ")
        };

        let mut out = line(&headers);
        out.push('\n');
        for row in &rows {
            out.push_str(&line(row));
            out.push('\n');
        }
        out
    }
}

/// `0.2531` -> `25.31%`; undefined -> `n/a`.
pub fn format_percent(value: Option<f64>) -> String {
    match value {
        Some(v) if v.is_finite() => format!("{:.2}%", v * 100.0),
        _ => UNDEFINED.to_string(),
    }
}

/// Inverse of [`format_percent`]. `Some(None)` is an undefined cell.
pub fn parse_percent(text: &str) -> Option<Option<f64>> {
    let text = text.trim();
    if text == UNDEFINED {
        return Some(None);
    }
    let number = text.strip_suffix('%')?.trim();
    number.parse::<f64>().ok().map(|v| Some(v / 100.0))
}
