//! Implicit per-period rate of a level-payment loan
//!
//! Solves `loan_amount / Σ_{i=1..n} (1+r)^-i = payment_amount` for r. The
//! root finder sees the ratio of the two sides minus one, so the residual
//! tolerance is relative to the payment whatever the currency scale.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::{HybridSolver, RootSolver, SolverConfig};
use crate::error::{LoanResult, ProjectionError};
use crate::loan::LoanTerms;

/// Starting point for the rate search
pub const DEFAULT_INITIAL_GUESS: f64 = 1.0;

/// Upper limit when widening the search bracket (per-period rate)
const MAX_BRACKET_RATE: f64 = 1.0e6;

/// Per-period interest rate implied by a loan's terms
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InterestRate(f64);

impl InterestRate {
    pub fn value(&self) -> f64 {
        self.0
    }

    pub(crate) fn from_value(rate: f64) -> Self {
        InterestRate(rate)
    }
}

impl fmt::Display for InterestRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6}%", self.0 * 100.0)
    }
}

/// Present value of one unit paid at the end of each of `n` periods
pub fn annuity_factor(rate: f64, n: u32) -> f64 {
    (1..=n).map(|i| (1.0 + rate).powi(-(i as i32))).sum()
}

/// Solve the implicit rate with the default hybrid solver and tolerances
pub fn solve_rate(
    loan_term: u32,
    loan_amount: f64,
    payment_amount: f64,
    initial_guess: f64,
) -> LoanResult<InterestRate> {
    let terms = LoanTerms::new(loan_amount, payment_amount, loan_term)?;
    solve_rate_with(&terms, initial_guess, &HybridSolver, &SolverConfig::default())
}

/// Solve the implicit rate with a caller-chosen solver
pub fn solve_rate_with(
    terms: &LoanTerms,
    initial_guess: f64,
    solver: &dyn RootSolver,
    config: &SolverConfig,
) -> LoanResult<InterestRate> {
    let n = terms.loan_term();
    let loan_amount = terms.loan_amount();
    let payment = terms.payment_amount();

    let objective = |r: f64| loan_amount / (payment * annuity_factor(r, n)) - 1.0;

    // At r = 0 the payment that amortizes the loan is loan_amount / n; anything
    // at or below it has no positive rate.
    let at_zero = objective(0.0);
    if at_zero >= 0.0 {
        return Err(ProjectionError::RateSolve {
            residual: at_zero,
            iterations: 0,
            reason: format!(
                "payment {} does not exceed loan_amount / loan_term = {}",
                payment,
                loan_amount / n as f64
            ),
        });
    }

    let mut high = initial_guess.max(1.0);
    while objective(high) <= 0.0 {
        high *= 2.0;
        if high > MAX_BRACKET_RATE {
            return Err(ProjectionError::RateSolve {
                residual: objective(MAX_BRACKET_RATE),
                iterations: 0,
                reason: "no rate below the search limit amortizes the loan".to_string(),
            });
        }
    }

    let result = solver
        .solve(&objective, initial_guess, Some((0.0, high)), config)
        .map_err(|e| ProjectionError::RateSolve {
            residual: e.residual(),
            iterations: e.iterations(),
            reason: e.to_string(),
        })?;

    log::debug!(
        "{} solved rate {:.10} in {} iterations (residual {:.3e})",
        solver.name(),
        result.root,
        result.iterations,
        result.residual
    );

    Ok(InterestRate(result.root))
}
