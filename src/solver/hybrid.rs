//! Newton with a bisection fallback

use super::{BisectionSolver, NewtonSolver, RootSolver, SolverConfig, SolverError, SolverResult};

/// Try Newton from the initial guess; when it fails and a bracket is known,
/// fall back to bisection over it.
#[derive(Debug, Clone, Copy, Default)]
pub struct HybridSolver;

impl RootSolver for HybridSolver {
    fn solve(
        &self,
        f: &dyn Fn(f64) -> f64,
        initial_guess: f64,
        bounds: Option<(f64, f64)>,
        config: &SolverConfig,
    ) -> Result<SolverResult, SolverError> {
        match NewtonSolver.solve(f, initial_guess, bounds, config) {
            Ok(result) => Ok(result),
            Err(newton_err) => match bounds {
                Some(_) => {
                    log::debug!("newton failed ({}), falling back to bisection", newton_err);
                    BisectionSolver.solve(f, initial_guess, bounds, config)
                }
                None => Err(newton_err),
            },
        }
    }

    fn name(&self) -> &'static str {
        "hybrid"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_falls_back_when_newton_stalls() {
        // Newton diverges on atan from this guess; the bracket rescues it
        let f = |x: f64| x.atan();
        let config = SolverConfig::default();
        assert!(NewtonSolver.solve(&f, 3.0, None, &config).is_err());

        let result = HybridSolver.solve(&f, 3.0, Some((-5.0, 4.0)), &config).unwrap();
        assert_abs_diff_eq!(result.root, 0.0, epsilon = 1e-8);
    }

    #[test]
    fn test_no_bracket_surfaces_newton_error() {
        let f = |_x: f64| 2.0;
        let err = HybridSolver.solve(&f, 1.0, None, &SolverConfig::default()).unwrap_err();
        assert!(matches!(err, SolverError::ZeroDerivative { .. }));
    }
}
