//! Deterministic Nelder-Mead simplex minimizer.

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum NelderMeadError {
    #[error("objective is not finite at the starting point")]
    NonFiniteStart,
    #[error("did not converge within {iterations} iterations")]
    NotConverged { iterations: usize },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Minimum {
    pub point: Vec<f64>,
    pub value: f64,
    pub iterations: usize,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NelderMead {
    pub max_iterations: usize,
    /// Converged when the spread of simplex values is below
    /// `f_tolerance * (1 + |best|)`.
    pub f_tolerance: f64,
}

impl Default for NelderMead {
    fn default() -> Self {
        Self {
            max_iterations: 5_000,
            f_tolerance: 1e-10,
        }
    }
}

impl NelderMead {
    /// Minimizes `f` from `start`, building the initial simplex by moving
    /// each coordinate by its entry in `steps`.
    ///
    /// Non-finite objective values are treated as `+inf`.
    pub fn minimize<F>(&self, f: F, start: &[f64], steps: &[f64]) -> Result<Minimum, NelderMeadError>
    where
        F: Fn(&[f64]) -> f64,
    {
        let eval = |x: &[f64]| {
            let v = f(x);
            if v.is_finite() { v } else { f64::INFINITY }
        };

        let start_value = eval(start);
        if !start_value.is_finite() {
            return Err(NelderMeadError::NonFiniteStart);
        }

        let n = start.len();
        let mut simplex: Vec<(Vec<f64>, f64)> = Vec::with_capacity(n + 1);
        simplex.push((start.to_vec(), start_value));
        for i in 0..n {
            let mut x = start.to_vec();
            x[i] += steps.get(i).copied().unwrap_or(0.1);
            let v = eval(&x);
            simplex.push((x, v));
        }

        for iteration in 0..self.max_iterations {
            simplex.sort_by(|a, b| a.1.total_cmp(&b.1));

            let best = simplex[0].1;
            let worst = simplex[n].1;
            if (worst - best).abs() <= self.f_tolerance * (1.0 + best.abs()) {
                let (point, value) = simplex.swap_remove(0);
                return Ok(Minimum {
                    point,
                    value,
                    iterations: iteration,
                });
            }

            let centroid: Vec<f64> = (0..n)
                .map(|j| simplex[..n].iter().map(|(x, _)| x[j]).sum::<f64>() / n as f64)
                .collect();
            let toward = |coef: f64| -> Vec<f64> {
                centroid
                    .iter()
                    .zip(&simplex[n].0)
                    .map(|(c, w)| c + coef * (c - w))
                    .collect()
            };

            let reflected = toward(1.0);
            let fr = eval(&reflected);

            if fr < best {
                let expanded = toward(2.0);
                let fe = eval(&expanded);
                simplex[n] = if fe < fr { (expanded, fe) } else { (reflected, fr) };
                continue;
            }
            if fr < simplex[n - 1].1 {
                simplex[n] = (reflected, fr);
                continue;
            }

            // Outside contraction when the reflection improved on the worst point.
            let contracted = if fr < worst {
                let xc = toward(0.5);
                let fc = eval(&xc);
                (fc <= fr).then_some((xc, fc))
            } else {
                let xc = toward(-0.5);
                let fc = eval(&xc);
                (fc < worst).then_some((xc, fc))
            };
            if let Some(point) = contracted {
                simplex[n] = point;
                continue;
            }

            let anchor = simplex[0].0.clone();
            for (x, v) in simplex.iter_mut().skip(1) {
                for (xi, ai) in x.iter_mut().zip(&anchor) {
                    *xi = ai + 0.5 * (*xi - ai);
                }
                *v = eval(x.as_slice());
            }
        }

        Err(NelderMeadError::NotConverged {
            iterations: self.max_iterations,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_quadratic_minimum() {
        let f = |x: &[f64]| (x[0] - 3.0).powi(2) + 2.0 * (x[1] + 1.0).powi(2) + 5.0;
        let min = NelderMead::default()
            .minimize(f, &[0.0, 0.0], &[0.5, 0.5])
            .unwrap();
        assert!((min.point[0] - 3.0).abs() < 1e-3);
        assert!((min.point[1] + 1.0).abs() < 1e-3);
        assert!((min.value - 5.0).abs() < 1e-6);
    }

    #[test]
    fn finds_rosenbrock_minimum() {
        let f = |x: &[f64]| 100.0 * (x[1] - x[0] * x[0]).powi(2) + (1.0 - x[0]).powi(2);
        let optimizer = NelderMead {
            max_iterations: 10_000,
            f_tolerance: 1e-14,
        };
        let min = optimizer.minimize(f, &[-1.2, 1.0], &[0.1, 0.1]).unwrap();
        assert!((min.point[0] - 1.0).abs() < 1e-3);
        assert!((min.point[1] - 1.0).abs() < 1e-3);
    }

    #[test]
    fn deterministic() {
        let f = |x: &[f64]| (x[0] - 1.0).powi(2) + (x[1] * x[0]).powi(2);
        let a = NelderMead::default().minimize(f, &[2.0, 2.0], &[0.3, 0.3]).unwrap();
        let b = NelderMead::default().minimize(f, &[2.0, 2.0], &[0.3, 0.3]).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn rejects_non_finite_start() {
        let f = |_: &[f64]| f64::NAN;
        let err = NelderMead::default().minimize(f, &[0.0], &[1.0]).unwrap_err();
        assert_eq!(err, NelderMeadError::NonFiniteStart);
    }

    #[test]
    fn reports_iteration_cap() {
        let f = |x: &[f64]| 100.0 * (x[1] - x[0] * x[0]).powi(2) + (1.0 - x[0]).powi(2);
        let optimizer = NelderMead {
            max_iterations: 3,
            f_tolerance: 1e-14,
        };
        let err = optimizer.minimize(f, &[-1.2, 1.0], &[0.1, 0.1]).unwrap_err();
        assert_eq!(err, NelderMeadError::NotConverged { iterations: 3 });
    }
}
