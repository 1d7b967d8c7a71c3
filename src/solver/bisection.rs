//! Bisection over a bracketing interval

use super::{check_bracket, RootSolver, SolverConfig, SolverError, SolverResult};

/// Halve the bracket until the midpoint residual is within tolerance or the
/// bracket is narrower than `x_tolerance`. The initial guess is ignored.
#[derive(Debug, Clone, Copy, Default)]
pub struct BisectionSolver;

impl RootSolver for BisectionSolver {
    fn solve(
        &self,
        f: &dyn Fn(f64) -> f64,
        _initial_guess: f64,
        bounds: Option<(f64, f64)>,
        config: &SolverConfig,
    ) -> Result<SolverResult, SolverError> {
        let (mut low, mut high) = bounds.ok_or(SolverError::MissingBracket { solver: self.name() })?;

        let (mut f_low, _f_high, endpoint) = check_bracket(f, low, high, config)?;
        if let Some(result) = endpoint {
            return Ok(result);
        }

        let mut residual = f64::INFINITY;
        for iteration in 1..=config.max_iterations {
            let mid = 0.5 * (low + high);
            let f_mid = f(mid);
            residual = f_mid.abs();

            if residual < config.tolerance || 0.5 * (high - low) < config.x_tolerance {
                return Ok(SolverResult { root: mid, iterations: iteration, residual: f_mid });
            }
            if mid == low || mid == high {
                // Bracket collapsed to adjacent floats without meeting tolerance
                return Err(SolverError::ConvergenceFailed { iterations: iteration, residual });
            }

            if f_mid * f_low < 0.0 {
                high = mid;
            } else {
                low = mid;
                f_low = f_mid;
            }
        }

        Err(SolverError::ConvergenceFailed {
            iterations: config.max_iterations,
            residual,
        })
    }

    fn name(&self) -> &'static str {
        "bisection"
    }
}
