//! Domain error types.

/// Top-level error type for voltable.
///
/// Structural problems (missing columns, nothing left after cleaning) abort a
/// run. `EstimatorFailure` is produced per window by the GARCH fitter and is
/// turned into an undefined cell by the engine rather than propagated.
#[derive(Debug, thiserror::Error)]
pub enum VolError {
    #[error("required column '{column}' not found")]
    MissingColumn { column: String },

    #[error("no rows left after dropping missing dates and prices")]
    EmptyAfterCleaning,

    #[error("insufficient data: {prices} usable price(s), need at least 2 to compute a return")]
    InsufficientData { prices: usize },

    #[error("{estimator} estimator failed: {reason}")]
    EstimatorFailure {
        estimator: &'static str,
        reason: String,
    },

    #[error("EWMA lambda must be within [0.80, 0.99], got {value}")]
    InvalidLambda { value: f64 },

    #[error("invalid window specification: {reason}")]
    InvalidWindows { reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("input error: {reason}")]
    Input { reason: String },

    #[error("export error: {reason}")]
    Export { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&VolError> for std::process::ExitCode {
    fn from(err: &VolError) -> Self {
        let code: u8 = match err {
            VolError::Io(_) => 1,
            VolError::ConfigParse { .. }
            | VolError::ConfigMissing { .. }
            | VolError::ConfigInvalid { .. } => 2,
            VolError::Input { .. } | VolError::Export { .. } => 3,
            VolError::MissingColumn { .. }
            | VolError::EmptyAfterCleaning
            | VolError::InsufficientData { .. } => 4,
            VolError::InvalidLambda { .. }
            | VolError::InvalidWindows { .. }
            | VolError::EstimatorFailure { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
