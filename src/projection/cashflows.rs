//! Expected cash-flow output structures

use serde::{Deserialize, Serialize};

use crate::amortization::AmortizationSchedule;
use crate::hazard::SurvivalCurve;

/// Expected cash and its ingredients for one installment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpectedCashflowRow {
    /// Installment number (1-indexed)
    pub installment: u32,

    // Contractual amounts
    pub scheduled_payment: f64,
    /// Payment plus the balance left after it: collected if the loan prepays here
    pub payoff_amount: f64,

    // Hazards at this installment
    pub default_hazard: f64,
    pub prepay_hazard: f64,

    // Survival relative to the conditioning installment
    pub default_survival: f64,
    pub prepay_survival: f64,
    pub prior_prepay_survival: f64,

    // Outcome probabilities at this installment
    pub default_probability: f64,
    pub prepay_probability: f64,

    // Expected cash
    pub scheduled_component: f64,
    pub prepayment_component: f64,
    pub expected_cash: f64,

    // Discounting back to the conditioning installment
    pub discount_factor: f64,
    pub present_value: f64,
}

/// Expected cash per installment plus the total
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpectedCashFlow {
    /// Installment the projection is conditioned on (0 = unconditioned)
    pub conditioned_on: usize,

    /// Rows for installments conditioned_on+1 ..= loan_term
    pub rows: Vec<ExpectedCashflowRow>,

    /// Σ expected_cash
    pub total_expected_cash: f64,
}

impl ExpectedCashFlow {
    pub(crate) fn new(conditioned_on: usize, rows: Vec<ExpectedCashflowRow>) -> Self {
        let total_expected_cash = rows.iter().map(|r| r.expected_cash).sum();
        Self {
            conditioned_on,
            rows,
            total_expected_cash,
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Expected cash amounts in installment order
    pub fn amounts(&self) -> Vec<f64> {
        self.rows.iter().map(|r| r.expected_cash).collect()
    }
}

/// Headline figures for a projection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectionSummary {
    pub installments: usize,

    /// Balance outstanding at the conditioning installment
    pub outstanding_principal: f64,

    /// Payments still due if nothing happens
    pub contractual_cash: f64,
    pub total_expected_cash: f64,
    pub expected_shortfall: f64,
    pub present_value: f64,

    /// P(default before payoff or maturity)
    pub default_probability: f64,
    /// P(prepay before maturity)
    pub prepay_probability: f64,
    /// P(current through the last installment)
    pub maturity_probability: f64,

    /// Per-period IRR of paying the outstanding balance for the expected
    /// cash; None when no rate solves it
    pub expected_yield: Option<f64>,
}

/// Complete projection of one loan
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectionResult {
    pub schedule: AmortizationSchedule,
    pub default_curve: SurvivalCurve,
    pub prepay_curve: SurvivalCurve,
    pub cashflows: ExpectedCashFlow,
    pub summary: ProjectionSummary,
}

impl ProjectionResult {
    pub fn total_expected_cash(&self) -> f64 {
        self.cashflows.total_expected_cash
    }

    pub fn expected_cash_by_installment(&self) -> Vec<f64> {
        self.cashflows.amounts()
    }
}
