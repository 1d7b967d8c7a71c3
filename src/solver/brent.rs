//! Brent's method

use super::{check_bracket, RootSolver, SolverConfig, SolverError, SolverResult};

/// Brent's method: bisection, secant and inverse quadratic interpolation
/// over a bracketing interval. Stops on the residual or once the bracket is
/// narrower than `x_tolerance`. The initial guess is ignored.
#[derive(Debug, Clone, Copy, Default)]
pub struct BrentSolver;

impl RootSolver for BrentSolver {
    fn solve(
        &self,
        f: &dyn Fn(f64) -> f64,
        _initial_guess: f64,
        bounds: Option<(f64, f64)>,
        config: &SolverConfig,
    ) -> Result<SolverResult, SolverError> {
        let (mut a, mut b) = bounds.ok_or(SolverError::MissingBracket { solver: self.name() })?;

        let (mut fa, mut fb, endpoint) = check_bracket(f, a, b, config)?;
        if let Some(result) = endpoint {
            return Ok(result);
        }

        let mut c = b;
        let mut fc = fb;
        let mut d = b - a;
        let mut e = d;

        for iteration in 1..=config.max_iterations {
            if fb * fc > 0.0 {
                c = a;
                fc = fa;
                d = b - a;
                e = d;
            }
            if fc.abs() < fb.abs() {
                a = b;
                b = c;
                c = a;
                fa = fb;
                fb = fc;
                fc = fa;
            }

            if fb.abs() < config.tolerance {
                return Ok(SolverResult { root: b, iterations: iteration, residual: fb });
            }

            let xm = 0.5 * (c - b);
            if xm.abs() < config.x_tolerance {
                return Ok(SolverResult { root: b, iterations: iteration, residual: fb });
            }

            let tol = 2.0 * f64::EPSILON * b.abs();
            if xm.abs() <= tol {
                return Err(SolverError::ConvergenceFailed {
                    iterations: iteration,
                    residual: fb.abs(),
                });
            }

            if e.abs() >= tol && fa.abs() > fb.abs() {
                let s = fb / fa;
                let (p, q) = if a == c {
                    (2.0 * xm * s, 1.0 - s)
                } else {
                    let q = fa / fc;
                    let r = fb / fc;
                    let p = s * (2.0 * xm * q * (q - r) - (b - a) * (r - 1.0));
                    let q = (q - 1.0) * (r - 1.0) * (s - 1.0);
                    (p, q)
                };
                let (p, q) = if p > 0.0 { (p, -q) } else { (-p, q) };

                if 2.0 * p < (3.0 * xm * q - (tol * q).abs()) && 2.0 * p < (e * q).abs() {
                    e = d;
                    d = p / q;
                } else {
                    d = xm;
                    e = d;
                }
            } else {
                d = xm;
                e = d;
            }

            a = b;
            fa = fb;
            b += if d.abs() > tol {
                d
            } else if xm > 0.0 {
                tol
            } else {
                -tol
            };
            fb = f(b);
        }

        Err(SolverError::ConvergenceFailed {
            iterations: config.max_iterations,
            residual: fb.abs(),
        })
    }

    fn name(&self) -> &'static str {
        "brent"
    }
}
