//! One-dimensional root finding
//!
//! The rate solver and the expected-yield calculation only need "find x with
//! f(x) = 0 near this guess", so they talk to [`RootSolver`] and never to a
//! concrete algorithm:
//!
//! - [`NewtonSolver`]: Newton-Raphson with a central-difference derivative
//! - [`BisectionSolver`]: plain bracketing, needs bounds
//! - [`BrentSolver`]: bisection/secant/inverse-quadratic, needs bounds
//! - [`HybridSolver`]: Newton first, bisection over the bounds if Newton fails

mod bisection;
mod brent;
mod hybrid;
mod newton;
mod rate;

pub use bisection::BisectionSolver;
pub use brent::BrentSolver;
pub use hybrid::HybridSolver;
pub use newton::NewtonSolver;
pub use rate::{annuity_factor, solve_rate, solve_rate_with, InterestRate, DEFAULT_INITIAL_GUESS};

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default residual tolerance: |f(x)| must fall below this
pub const DEFAULT_TOLERANCE: f64 = 1e-8;

/// Default bracket-width tolerance: bracketing solvers stop once the
/// interval holding the root is narrower than this
pub const DEFAULT_X_TOLERANCE: f64 = 1e-12;

/// Default iteration budget
pub const DEFAULT_MAX_ITERATIONS: u32 = 200;

/// Convergence settings shared by all solvers
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SolverConfig {
    /// Residual tolerance
    pub tolerance: f64,
    /// Bracket-width tolerance
    #[serde(default = "default_x_tolerance")]
    pub x_tolerance: f64,
    /// Maximum number of iterations
    pub max_iterations: u32,
}

fn default_x_tolerance() -> f64 {
    DEFAULT_X_TOLERANCE
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            tolerance: DEFAULT_TOLERANCE,
            x_tolerance: DEFAULT_X_TOLERANCE,
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }
}

/// A converged root
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolverResult {
    pub root: f64,
    pub iterations: u32,
    pub residual: f64,
}

/// Root-finding failures
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SolverError {
    #[error("no convergence after {iterations} iterations (residual: {residual:.3e})")]
    ConvergenceFailed { iterations: u32, residual: f64 },

    #[error("f({a}) = {fa:.3e} and f({b}) = {fb:.3e} do not bracket a root")]
    InvalidBracket { a: f64, b: f64, fa: f64, fb: f64 },

    #[error("{solver} requires a bracketing interval")]
    MissingBracket { solver: &'static str },

    #[error("derivative vanished at x = {x} after {iterations} iterations (residual: {residual:.3e})")]
    ZeroDerivative { x: f64, iterations: u32, residual: f64 },

    #[error("function value is not finite at x = {x} after {iterations} iterations")]
    NonFinite { x: f64, iterations: u32 },
}

impl SolverError {
    /// Last residual seen before giving up (NaN when none was computed)
    pub fn residual(&self) -> f64 {
        match self {
            SolverError::ConvergenceFailed { residual, .. } => *residual,
            SolverError::ZeroDerivative { residual, .. } => *residual,
            SolverError::InvalidBracket { fa, fb, .. } => fa.abs().min(fb.abs()),
            SolverError::MissingBracket { .. } | SolverError::NonFinite { .. } => f64::NAN,
        }
    }

    /// Iterations spent before giving up
    pub fn iterations(&self) -> u32 {
        match self {
            SolverError::ConvergenceFailed { iterations, .. }
            | SolverError::ZeroDerivative { iterations, .. }
            | SolverError::NonFinite { iterations, .. } => *iterations,
            SolverError::InvalidBracket { .. } | SolverError::MissingBracket { .. } => 0,
        }
    }
}

/// Narrow interface over a scalar root-finding algorithm
pub trait RootSolver: Send + Sync {
    /// Find x with |f(x)| < `config.tolerance`, starting from `initial_guess`.
    /// Bracketing solvers also accept a root pinned inside an interval
    /// narrower than `config.x_tolerance`.
    ///
    /// `bounds` is an interval known to contain the root; bracketing solvers
    /// require it, Newton keeps its iterates inside it.
    fn solve(
        &self,
        f: &dyn Fn(f64) -> f64,
        initial_guess: f64,
        bounds: Option<(f64, f64)>,
        config: &SolverConfig,
    ) -> Result<SolverResult, SolverError>;

    /// Short name used in logs
    fn name(&self) -> &'static str;
}

/// Selector for the solver used by the projection engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SolverKind {
    Newton,
    Bisection,
    Brent,
    #[default]
    Hybrid,
}

impl SolverKind {
    /// Instantiate the selected solver
    pub fn build(&self) -> Box<dyn RootSolver> {
        match self {
            SolverKind::Newton => Box::new(NewtonSolver),
            SolverKind::Bisection => Box::new(BisectionSolver),
            SolverKind::Brent => Box::new(BrentSolver),
            SolverKind::Hybrid => Box::new(HybridSolver),
        }
    }
}

/// Evaluate f at both ends and check they straddle zero.
/// Returns Ok(Some(root)) when an endpoint is already a root.
pub(crate) fn check_bracket(
    f: &dyn Fn(f64) -> f64,
    a: f64,
    b: f64,
    config: &SolverConfig,
) -> Result<(f64, f64, Option<SolverResult>), SolverError> {
    let fa = f(a);
    let fb = f(b);

    if fa.abs() < config.tolerance {
        return Ok((fa, fb, Some(SolverResult { root: a, iterations: 0, residual: fa })));
    }
    if fb.abs() < config.tolerance {
        return Ok((fa, fb, Some(SolverResult { root: b, iterations: 0, residual: fb })));
    }
    if fa.is_nan() || fb.is_nan() || fa * fb > 0.0 {
        return Err(SolverError::InvalidBracket { a, b, fa, fb });
    }

    Ok((fa, fb, None))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    const SOLVERS: [SolverKind; 4] = [
        SolverKind::Newton,
        SolverKind::Bisection,
        SolverKind::Brent,
        SolverKind::Hybrid,
    ];

    #[test]
    fn test_all_solvers_find_sqrt_two() {
        let f = |x: f64| x * x - 2.0;
        let config = SolverConfig::default();

        for kind in SOLVERS {
            let solver = kind.build();
            let result = solver.solve(&f, 1.0, Some((0.0, 2.0)), &config).unwrap();
            assert_abs_diff_eq!(result.root, std::f64::consts::SQRT_2, epsilon = 1e-8);
            assert!(result.residual.abs() < config.tolerance, "{} residual", solver.name());
        }
    }

    #[test]
    fn test_bracketing_solvers_need_bounds() {
        let f = |x: f64| x - 1.0;
        let config = SolverConfig::default();

        for kind in [SolverKind::Bisection, SolverKind::Brent] {
            let err = kind.build().solve(&f, 0.5, None, &config).unwrap_err();
            assert!(matches!(err, SolverError::MissingBracket { .. }));
        }
    }

    #[test]
    fn test_invalid_bracket() {
        let f = |x: f64| x * x + 1.0;
        let err = BisectionSolver
            .solve(&f, 0.0, Some((-1.0, 1.0)), &SolverConfig::default())
            .unwrap_err();
        assert!(matches!(err, SolverError::InvalidBracket { .. }));
    }

    #[test]
    fn test_solver_kind_names() {
        assert_eq!(SolverKind::from_str("brent", false).unwrap(), SolverKind::Brent);
        assert_eq!(SolverKind::from_str("Hybrid", true).unwrap(), SolverKind::Hybrid);
        assert!(SolverKind::from_str("secant", true).is_err());
    }
}
