//! Historical volatility: sample standard deviation of log returns.

use super::annualize;

/// Sample standard deviation with Bessel's correction (divide by n - 1).
pub fn sample_std(returns: &[f64]) -> Option<f64> {
    if returns.len() < 2 {
        return None;
    }
    let n = returns.len() as f64;
    let mean = returns.iter().sum::<f64>() / n;
    let ss: f64 = returns.iter().map(|r| (r - mean).powi(2)).sum();
    Some((ss / (n - 1.0)).sqrt())
}

/// Annualized historical volatility, `None` with fewer than two returns.
pub fn historical_volatility(returns: &[f64]) -> Option<f64> {
    sample_std(returns).map(annualize)
}
