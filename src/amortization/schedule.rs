//! Amortization schedule output structures

use serde::{Deserialize, Serialize};

use crate::solver::InterestRate;

/// One installment of the schedule
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AmortizationRow {
    /// Installment number (1-indexed)
    pub installment: u32,
    pub payment_amount: f64,
    pub principal_payment: f64,
    pub interest_payment: f64,
    /// Balance left after this installment's payment
    pub remaining_principal: f64,
}

/// Complete level-payment schedule for a loan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmortizationSchedule {
    /// Per-period rate the schedule was built with
    pub rate: InterestRate,

    /// Installments in order
    rows: Vec<AmortizationRow>,
}

impl AmortizationSchedule {
    pub(crate) fn new(rate: InterestRate, rows: Vec<AmortizationRow>) -> Self {
        Self { rate, rows }
    }

    pub fn rows(&self) -> &[AmortizationRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Row for a 1-indexed installment
    pub fn installment(&self, installment: usize) -> Option<&AmortizationRow> {
        installment.checked_sub(1).and_then(|idx| self.rows.get(idx))
    }

    /// Amount collected if the loan is paid off at `installment`: the
    /// regular payment plus the balance left after it
    ///
    /// # Panics
    /// If `installment` is 0 or past the end of the schedule.
    pub fn payoff_amount(&self, installment: usize) -> f64 {
        let row = &self.rows[installment - 1];
        row.payment_amount + row.remaining_principal
    }

    /// Balance after `installment`; the original loan amount at 0
    pub fn remaining_principal(&self, installment: usize) -> Option<f64> {
        match installment {
            0 => self
                .rows
                .first()
                .map(|r| r.remaining_principal + r.principal_payment),
            i => self.installment(i).map(|r| r.remaining_principal),
        }
    }

    pub fn total_interest(&self) -> f64 {
        self.rows.iter().map(|r| r.interest_payment).sum()
    }

    pub fn total_payments(&self) -> f64 {
        self.rows.iter().map(|r| r.payment_amount).sum()
    }
}
