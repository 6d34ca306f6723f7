//! Volatility estimators.
//!
//! Each estimator is a pure function over one window's return slice and
//! produces an annualized volatility as a fraction (0.25 = 25%):
//! - [`historical`]: sample standard deviation
//! - [`ewma`]: exponentially weighted squared returns
//! - [`garch`]: GARCH(1,1) one-step forecast, behind the `garch` feature

pub mod ewma;
#[cfg(feature = "garch")]
pub mod garch;
pub mod historical;
#[cfg(feature = "garch")]
pub mod nelder_mead;

use std::fmt;

use ewma::Lambda;

pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Scales a daily volatility to a yearly one.
pub fn annualize(daily: f64) -> f64 {
    daily * TRADING_DAYS_PER_YEAR.sqrt()
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EstimatorKind {
    Historical,
    Ewma(Lambda),
    Garch,
}

impl fmt::Display for EstimatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EstimatorKind::Historical => write!(f, "Historical"),
            EstimatorKind::Ewma(lambda) => write!(f, "EWMA (λ={})", lambda),
            EstimatorKind::Garch => write!(f, "GARCH(1,1)"),
        }
    }
}

/// Whether this build can fit GARCH models.
pub const fn garch_available() -> bool {
    cfg!(feature = "garch")
}

/// Estimators to run for every window.
///
/// The GARCH capability is resolved once here: callers request it, and it is
/// granted only when the build includes the fitter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EstimatorSet {
    lambda: Lambda,
    garch: bool,
}

impl EstimatorSet {
    pub fn new(lambda: Lambda, request_garch: bool) -> Self {
        if request_garch && !garch_available() {
            log::warn!("GARCH(1,1) requested but this build has no fitter; column omitted");
        }
        Self {
            lambda,
            garch: request_garch && garch_available(),
        }
    }

    pub fn lambda(&self) -> Lambda {
        self.lambda
    }

    pub fn garch_enabled(&self) -> bool {
        self.garch
    }

    pub fn kinds(&self) -> Vec<EstimatorKind> {
        let mut kinds = vec![EstimatorKind::Historical, EstimatorKind::Ewma(self.lambda)];
        if self.garch {
            kinds.push(EstimatorKind::Garch);
        }
        kinds
    }

    /// Runs one estimator on a window. Failures become `None` and are logged.
    pub fn estimate(&self, kind: EstimatorKind, returns: &[f64]) -> Option<f64> {
        match kind {
            EstimatorKind::Historical => historical::historical_volatility(returns),
            EstimatorKind::Ewma(lambda) => ewma::ewma_volatility(returns, lambda),
            EstimatorKind::Garch => self.estimate_garch(returns),
        }
    }

    #[cfg(feature = "garch")]
    fn estimate_garch(&self, returns: &[f64]) -> Option<f64> {
        if !self.garch {
            return None;
        }
        match garch::garch_volatility(returns) {
            Ok(v) => Some(v),
            Err(e) => {
                log::warn!("window of {} returns: {}", returns.len(), e);
                None
            }
        }
    }

    #[cfg(not(feature = "garch"))]
    fn estimate_garch(&self, _returns: &[f64]) -> Option<f64> {
        None
    }
}

impl Default for EstimatorSet {
    fn default() -> Self {
        Self::new(Lambda::default(), true)
    }
}
