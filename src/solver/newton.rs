//! Newton-Raphson with a numerical derivative

use super::{RootSolver, SolverConfig, SolverError, SolverResult};

/// Newton-Raphson iteration `x <- x - f(x)/f'(x)`, with f' estimated by
/// central differences. Iterates are clamped into `bounds` when given.
#[derive(Debug, Clone, Copy, Default)]
pub struct NewtonSolver;

fn central_difference(f: &dyn Fn(f64) -> f64, x: f64) -> f64 {
    let h = 1e-6 * x.abs().max(1.0);
    (f(x + h) - f(x - h)) / (2.0 * h)
}

impl RootSolver for NewtonSolver {
    fn solve(
        &self,
        f: &dyn Fn(f64) -> f64,
        initial_guess: f64,
        bounds: Option<(f64, f64)>,
        config: &SolverConfig,
    ) -> Result<SolverResult, SolverError> {
        let clamp = |x: f64| match bounds {
            Some((lo, hi)) => x.max(lo).min(hi),
            None => x,
        };

        let mut x = clamp(initial_guess);
        let mut fx = f(x);

        for iteration in 0..config.max_iterations {
            if !fx.is_finite() {
                return Err(SolverError::NonFinite { x, iterations: iteration });
            }
            if fx.abs() < config.tolerance {
                return Ok(SolverResult { root: x, iterations: iteration, residual: fx });
            }

            let dfx = central_difference(f, x);
            if !dfx.is_finite() || dfx.abs() < 1e-20 {
                return Err(SolverError::ZeroDerivative {
                    x,
                    iterations: iteration,
                    residual: fx,
                });
            }

            let next = clamp(x - fx / dfx);
            if next == x {
                // Pinned against a bound or stalled in floating point
                return Err(SolverError::ConvergenceFailed {
                    iterations: iteration + 1,
                    residual: fx.abs(),
                });
            }
            x = next;
            fx = f(x);
        }

        if fx.is_finite() && fx.abs() < config.tolerance {
            return Ok(SolverResult { root: x, iterations: config.max_iterations, residual: fx });
        }

        Err(SolverError::ConvergenceFailed {
            iterations: config.max_iterations,
            residual: fx.abs(),
        })
    }

    fn name(&self) -> &'static str {
        "newton"
    }
}
