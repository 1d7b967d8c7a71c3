//! Level-payment amortization
//!
//! The rate comes from whichever [`RootSolver`] the engine was built with;
//! the schedule itself is a strictly sequential recurrence on the balance.

mod schedule;

pub use schedule::{AmortizationRow, AmortizationSchedule};

use crate::error::LoanResult;
use crate::loan::LoanTerms;
use crate::solver::{
    solve_rate_with, HybridSolver, InterestRate, RootSolver, SolverConfig, DEFAULT_INITIAL_GUESS,
};

/// Builds amortization schedules from loan terms
pub struct AmortizationEngine {
    solver: Box<dyn RootSolver>,
    config: SolverConfig,
    initial_guess: f64,
}

impl Default for AmortizationEngine {
    fn default() -> Self {
        Self::new(Box::new(HybridSolver), SolverConfig::default(), DEFAULT_INITIAL_GUESS)
    }
}

impl AmortizationEngine {
    pub fn new(solver: Box<dyn RootSolver>, config: SolverConfig, initial_guess: f64) -> Self {
        Self {
            solver,
            config,
            initial_guess,
        }
    }

    /// Solve the implicit rate for the terms
    pub fn solve_rate(&self, terms: &LoanTerms) -> LoanResult<InterestRate> {
        solve_rate_with(terms, self.initial_guess, self.solver.as_ref(), &self.config)
    }

    /// Solve the rate and build the schedule
    pub fn amortize(&self, terms: &LoanTerms) -> LoanResult<AmortizationSchedule> {
        let rate = self.solve_rate(terms)?;
        Ok(Self::schedule_at_rate(terms, rate))
    }

    /// Run the balance recurrence at a known rate.
    ///
    /// Principal payments are not clamped: a payment too small for the
    /// accruing interest shows up as negative principal.
    pub fn schedule_at_rate(terms: &LoanTerms, rate: InterestRate) -> AmortizationSchedule {
        let r = rate.value();
        let payment = terms.payment_amount();
        let mut remaining = terms.loan_amount();
        let mut rows = Vec::with_capacity(terms.loan_term() as usize);

        for installment in 1..=terms.loan_term() {
            let interest_payment = remaining * r;
            let principal_payment = payment - interest_payment;
            remaining -= principal_payment;

            rows.push(AmortizationRow {
                installment,
                payment_amount: payment,
                principal_payment,
                interest_payment,
                remaining_principal: remaining,
            });
        }

        AmortizationSchedule::new(rate, rows)
    }
}

/// Amortize with the default solver settings
pub fn amortize(loan_term: u32, loan_amount: f64, payment_amount: f64) -> LoanResult<AmortizationSchedule> {
    let terms = LoanTerms::new(loan_amount, payment_amount, loan_term)?;
    AmortizationEngine::default().amortize(&terms)
}
