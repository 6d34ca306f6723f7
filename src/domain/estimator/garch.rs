//! GARCH(1,1) volatility forecast.
//!
//! Constant-mean model fitted by Gaussian maximum likelihood on returns scaled
//! by 100:
//!
//!   e[t]  = y[t] - mu
//!   s2[t] = omega + alpha * e[t-1]^2 + beta * s2[t-1]
//!
//! with omega > 0, alpha >= 0, beta >= 0, alpha + beta < 1. The recursion is
//! seeded from an exponentially weighted backcast of the first squared
//! residuals. The optimizer is deterministic, so identical input gives an
//! identical fit.

use std::f64::consts::PI;

use super::annualize;
use super::nelder_mead::{NelderMead, NelderMeadError};
use crate::domain::error::VolError;

pub const GARCH_NAME: &str = "GARCH(1,1)";

const SCALE: f64 = 100.0;
const BACKCAST_SPAN: usize = 75;
const BACKCAST_DECAY: f64 = 0.94;
/// Sample variance (scaled units) below which the series is treated as flat.
const MIN_SAMPLE_VARIANCE: f64 = 1e-10;
const START_ALPHA: f64 = 0.1;
const START_BETA: f64 = 0.8;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GarchParams {
    pub mu: f64,
    pub omega: f64,
    pub alpha: f64,
    pub beta: f64,
}

impl GarchParams {
    pub fn persistence(&self) -> f64 {
        self.alpha + self.beta
    }

    /// Maps unconstrained optimizer coordinates onto the admissible region.
    fn from_free(z: &[f64]) -> Self {
        let m = z[2].max(z[3]).max(0.0);
        let e0 = (-m).exp();
        let e1 = (z[2] - m).exp();
        let e2 = (z[3] - m).exp();
        let denom = e0 + e1 + e2;
        Self {
            mu: z[0],
            omega: z[1].exp(),
            alpha: e1 / denom,
            beta: e2 / denom,
        }
    }

    fn to_free(&self) -> Vec<f64> {
        let rest = 1.0 - self.alpha - self.beta;
        vec![
            self.mu,
            self.omega.ln(),
            (self.alpha / rest).ln(),
            (self.beta / rest).ln(),
        ]
    }
}

/// A fitted model, in scaled (percent) units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GarchFit {
    pub params: GarchParams,
    pub log_likelihood: f64,
    pub iterations: usize,
    pub last_residual: f64,
    pub last_variance: f64,
}

impl GarchFit {
    /// One-step-ahead conditional variance.
    pub fn forecast_variance(&self) -> f64 {
        let p = &self.params;
        p.omega + p.alpha * self.last_residual.powi(2) + p.beta * self.last_variance
    }
}

struct Filtered {
    neg_log_likelihood: f64,
    last_residual: f64,
    last_variance: f64,
}

fn filter(params: &GarchParams, y: &[f64], backcast: f64) -> Filtered {
    let mut s2 = params.omega + params.persistence() * backcast;
    let mut nll = 0.0;
    let mut prev_e = 0.0;
    for (t, &yt) in y.iter().enumerate() {
        if t > 0 {
            s2 = params.omega + params.alpha * prev_e * prev_e + params.beta * s2;
        }
        if !(s2.is_finite() && s2 > 0.0) {
            return Filtered {
                neg_log_likelihood: f64::INFINITY,
                last_residual: 0.0,
                last_variance: f64::NAN,
            };
        }
        let e = yt - params.mu;
        nll += 0.5 * ((2.0 * PI).ln() + s2.ln() + e * e / s2);
        prev_e = e;
    }
    Filtered {
        neg_log_likelihood: nll,
        last_residual: prev_e,
        last_variance: s2,
    }
}

fn backcast(residuals: &[f64]) -> f64 {
    let span = residuals.len().min(BACKCAST_SPAN);
    let mut weight = 1.0;
    let mut total_weight = 0.0;
    let mut acc = 0.0;
    for e in &residuals[..span] {
        acc += weight * e * e;
        total_weight += weight;
        weight *= BACKCAST_DECAY;
    }
    acc / total_weight
}

fn failure(reason: impl Into<String>) -> VolError {
    VolError::EstimatorFailure {
        estimator: GARCH_NAME,
        reason: reason.into(),
    }
}

/// Fits GARCH(1,1) to `y` (already scaled).
pub fn fit_garch11(y: &[f64]) -> Result<GarchFit, VolError> {
    if y.len() < 2 {
        return Err(failure(format!("need at least 2 observations, got {}", y.len())));
    }
    if y.iter().any(|v| !v.is_finite()) {
        return Err(failure("non-finite observation"));
    }

    let n = y.len() as f64;
    let mean = y.iter().sum::<f64>() / n;
    let variance = y.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    if variance < MIN_SAMPLE_VARIANCE {
        return Err(failure(format!(
            "sample variance {:.3e} is too small to fit",
            variance
        )));
    }

    let residuals: Vec<f64> = y.iter().map(|v| v - mean).collect();
    let backcast = backcast(&residuals);

    let start = GarchParams {
        mu: mean,
        omega: variance * (1.0 - START_ALPHA - START_BETA),
        alpha: START_ALPHA,
        beta: START_BETA,
    };
    let steps = [0.1 * variance.sqrt(), 0.5, 0.5, 0.5];

    let objective = |z: &[f64]| filter(&GarchParams::from_free(z), y, backcast).neg_log_likelihood;
    let minimum = NelderMead::default()
        .minimize(objective, &start.to_free(), &steps)
        .map_err(|e| match e {
            NelderMeadError::NonFiniteStart => failure("likelihood is not finite at the start point"),
            NelderMeadError::NotConverged { iterations } => {
                failure(format!("optimizer did not converge in {} iterations", iterations))
            }
        })?;

    let params = GarchParams::from_free(&minimum.point);
    let filtered = filter(&params, y, backcast);
    let fit = GarchFit {
        params,
        log_likelihood: -filtered.neg_log_likelihood,
        iterations: minimum.iterations,
        last_residual: filtered.last_residual,
        last_variance: filtered.last_variance,
    };
    log::debug!(
        "garch fit: mu={:.6} omega={:.6} alpha={:.4} beta={:.4} llf={:.4} iterations={}",
        params.mu,
        params.omega,
        params.alpha,
        params.beta,
        fit.log_likelihood,
        fit.iterations
    );
    Ok(fit)
}

/// Annualized volatility from the one-step-ahead GARCH(1,1) forecast.
pub fn garch_volatility(returns: &[f64]) -> Result<f64, VolError> {
    let scaled: Vec<f64> = returns.iter().map(|r| r * SCALE).collect();
    let fit = fit_garch11(&scaled)?;
    let forecast = fit.forecast_variance();
    if !forecast.is_finite() || forecast <= 0.0 {
        return Err(failure(format!("invalid variance forecast {}", forecast)));
    }
    Ok(annualize(forecast.sqrt() / SCALE))
}
