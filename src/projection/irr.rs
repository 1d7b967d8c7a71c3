//! Internal rate of return of an expected cash-flow stream
//!
//! Used for the loss-adjusted yield: the per-period rate at which paying the
//! outstanding balance today is worth the expected collections.

use crate::solver::{RootSolver, SolverConfig, SolverError};

/// Lowest per-period rate searched (-99%)
const MIN_RATE: f64 = -0.99;

/// Highest per-period rate the bracket is widened to
const MAX_RATE: f64 = 1.0e3;

/// NPV at a given periodic rate; `cashflows[t]` falls at period t + 1
pub fn npv_at_rate(outstanding: f64, cashflows: &[f64], rate: f64) -> f64 {
    cashflows
        .iter()
        .enumerate()
        .map(|(t, &cf)| cf / (1.0 + rate).powi(t as i32 + 1))
        .sum::<f64>()
        - outstanding
}

/// Per-period IRR of paying `outstanding` now for `cashflows` at periods 1..
pub fn expected_yield(
    outstanding: f64,
    cashflows: &[f64],
    initial_guess: f64,
    solver: &dyn RootSolver,
    config: &SolverConfig,
) -> Result<f64, SolverError> {
    // No inflow means no rate can recover the outlay
    if cashflows.iter().all(|&cf| cf.abs() < 1e-12) {
        return Err(SolverError::InvalidBracket {
            a: MIN_RATE,
            b: MAX_RATE,
            fa: -outstanding,
            fb: -outstanding,
        });
    }

    // Per unit of outstanding, so the tolerance holds at any currency scale
    let scale = if outstanding > 0.0 { outstanding } else { 1.0 };
    let npv = |r: f64| npv_at_rate(outstanding, cashflows, r) / scale;

    let mut high = initial_guess.max(0.0) + 1.0;
    while npv(high) > 0.0 && high < MAX_RATE {
        high *= 2.0;
    }
    let high = high.min(MAX_RATE);

    let guess = initial_guess.max(MIN_RATE).min(high);
    solver
        .solve(&npv, guess, Some((MIN_RATE, high)), config)
        .map(|result| result.root)
}
