//! EWMA volatility: exponentially smoothed squared returns.
//!
//! var[0] = r[0]^2, var[t] = (1 - lambda) * r[t]^2 + lambda * var[t-1].
//! The last variance is the daily estimate.

use std::fmt;

use super::annualize;
use crate::domain::error::VolError;

pub const DEFAULT_LAMBDA: f64 = 0.94;
pub const MIN_LAMBDA: f64 = 0.80;
pub const MAX_LAMBDA: f64 = 0.99;

/// Decay factor, validated to [0.80, 0.99].
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Lambda(f64);

impl Lambda {
    pub fn new(value: f64) -> Result<Self, VolError> {
        if (MIN_LAMBDA..=MAX_LAMBDA).contains(&value) {
            Ok(Self(value))
        } else {
            Err(VolError::InvalidLambda { value })
        }
    }

    pub fn value(&self) -> f64 {
        self.0
    }
}

impl Default for Lambda {
    fn default() -> Self {
        Self(DEFAULT_LAMBDA)
    }
}

impl fmt::Display for Lambda {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Final smoothed daily variance, `None` for an empty slice.
pub fn ewma_variance(returns: &[f64], lambda: Lambda) -> Option<f64> {
    let (first, rest) = returns.split_first()?;
    let lambda = lambda.value();
    let var = rest
        .iter()
        .fold(first * first, |var, r| (1.0 - lambda) * r * r + lambda * var);
    Some(var)
}

pub fn ewma_volatility(returns: &[f64], lambda: Lambda) -> Option<f64> {
    ewma_variance(returns, lambda).map(|v| annualize(v.sqrt()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    #[test]
    fn lambda_bounds() {
        assert!(Lambda::new(0.80).is_ok());
        assert!(Lambda::new(0.99).is_ok());
        assert!(matches!(
            Lambda::new(0.5),
            Err(VolError::InvalidLambda { value }) if value == 0.5
        ));
        assert!(Lambda::new(1.0).is_err());
        assert!(Lambda::new(f64::NAN).is_err());
        assert_eq!(Lambda::default().value(), 0.94);
    }

    #[test]
    fn recursion_matches_hand_computation() {
        let lambda = Lambda::new(0.9).unwrap();
        let r = [0.01, 0.02, -0.03];
        let v0 = 0.0001;
        let v1 = 0.1 * 0.0004 + 0.9 * v0;
        let v2 = 0.1 * 0.0009 + 0.9 * v1;
        assert_relative_eq!(ewma_variance(&r, lambda).unwrap(), v2);
        assert_relative_eq!(
            ewma_volatility(&r, lambda).unwrap(),
            v2.sqrt() * 252f64.sqrt()
        );
    }

    #[test]
    fn single_return_seeds_variance() {
        let v = ewma_variance(&[0.05], Lambda::default()).unwrap();
        assert_relative_eq!(v, 0.0025);
    }

    #[test]
    fn empty_slice_is_undefined() {
        assert_eq!(ewma_volatility(&[], Lambda::default()), None);
    }

    #[test]
    fn zero_returns_give_zero() {
        assert_eq!(ewma_volatility(&[0.0; 50], Lambda::default()), Some(0.0));
    }

    #[test]
    fn low_lambda_reacts_faster_to_a_shock() {
        let mut calm: Vec<f64> = (0..200)
            .map(|i| if i % 2 == 0 { 0.005 } else { -0.005 })
            .collect();
        let before_slow = ewma_volatility(&calm, Lambda::new(0.99).unwrap()).unwrap();
        let before_fast = ewma_volatility(&calm, Lambda::new(0.80).unwrap()).unwrap();
        calm.extend([0.05, -0.05, 0.05]);
        let after_slow = ewma_volatility(&calm, Lambda::new(0.99).unwrap()).unwrap();
        let after_fast = ewma_volatility(&calm, Lambda::new(0.80).unwrap()).unwrap();

        assert!((after_fast - before_fast) > (after_slow - before_slow));
    }

    proptest! {
        #[test]
        fn variance_is_bounded_by_extremes(
            returns in prop::collection::vec(-0.2f64..0.2, 1..200),
            lambda in 0.80f64..=0.99,
        ) {
            let lambda = Lambda::new(lambda).unwrap();
            let v = ewma_variance(&returns, lambda).unwrap();
            let max_sq = returns.iter().map(|r| r * r).fold(0.0, f64::max);
            let min_sq = returns.iter().map(|r| r * r).fold(f64::INFINITY, f64::min);
            prop_assert!(v <= max_sq + 1e-15);
            prop_assert!(v >= min_sq - 1e-15);
        }
    }
}
