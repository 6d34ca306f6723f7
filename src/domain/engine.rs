//! End-to-end volatility run: raw table in, result table out.

use crate::domain::error::VolError;
use crate::domain::estimator::{EstimatorKind, EstimatorSet};
use crate::domain::raw_table::RawTable;
use crate::domain::result_table::{EstimatorColumn, ResultTable};
use crate::domain::series::{prepare_series, CleaningReport, ReturnSeries, SeriesOptions};
use crate::domain::window::{select_windows, WindowSpec, MIN_OBSERVATIONS};
use crate::ports::table_port::TableSource;

#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub series: SeriesOptions,
    pub windows: WindowSpec,
    pub estimators: EstimatorSet,
    pub min_observations: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            series: SeriesOptions::default(),
            windows: WindowSpec::standard(),
            estimators: EstimatorSet::default(),
            min_observations: MIN_OBSERVATIONS,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct VolatilityReport {
    pub cleaning: CleaningReport,
    pub return_count: usize,
    pub table: ResultTable,
}

pub struct VolatilityEngine {
    config: EngineConfig,
}

impl VolatilityEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Prepares the series and estimates every window.
    ///
    /// Structural problems in the input abort the run; estimator failures
    /// only leave undefined cells.
    pub fn run(&self, table: &RawTable) -> Result<VolatilityReport, VolError> {
        let prepared = prepare_series(table, &self.config.series)?;
        log::info!(
            "prepared {} prices and {} returns",
            prepared.prices.len(),
            prepared.returns.len()
        );
        let result = self.estimate(&prepared.returns);
        Ok(VolatilityReport {
            cleaning: prepared.report,
            return_count: prepared.returns.len(),
            table: result,
        })
    }

    /// Loads the table from `source`, then runs as [`VolatilityEngine::run`].
    pub fn run_source(&self, source: &dyn TableSource) -> Result<VolatilityReport, VolError> {
        let table = source.load()?;
        self.run(&table)
    }

    /// Runs each estimator over the windows with enough history and joins them.
    pub fn estimate(&self, returns: &ReturnSeries) -> ResultTable {
        let estimators = &self.config.estimators;
        let slices = select_windows(&self.config.windows, returns, self.config.min_observations);

        let column = |kind: EstimatorKind| -> EstimatorColumn {
            slices
                .iter()
                .map(|slice| {
                    let value = if slice.sufficient {
                        estimators.estimate(kind, slice.returns)
                    } else {
                        None
                    };
                    (slice.def.label, value)
                })
                .collect()
        };

        for slice in slices.iter().filter(|s| !s.sufficient) {
            log::warn!(
                "{}y window has {} returns, below the minimum of {}; estimates undefined",
                slice.def.label,
                slice.returns.len(),
                self.config.min_observations
            );
        }

        let historical = column(EstimatorKind::Historical);
        let ewma = column(EstimatorKind::Ewma(estimators.lambda()));
        let garch = estimators
            .garch_enabled()
            .then(|| column(EstimatorKind::Garch));

        ResultTable::assemble(
            &self.config.windows,
            estimators.lambda(),
            &historical,
            &ewma,
            garch.as_ref(),
        )
    }
}
