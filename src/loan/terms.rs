//! Validated loan terms and the loan record fed to the projector

use serde::{Deserialize, Serialize};

use crate::error::{LoanResult, ProjectionError};
use crate::hazard::CovariateVector;

/// Contractual terms of a level-payment installment loan
///
/// Fields are private so the validation in [`LoanTerms::new`] cannot be
/// bypassed; the value is immutable once built.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LoanTerms {
    loan_amount: f64,
    payment_amount: f64,
    loan_term: u32,
}

impl LoanTerms {
    /// Validate and build loan terms
    pub fn new(loan_amount: f64, payment_amount: f64, loan_term: u32) -> LoanResult<Self> {
        if !loan_amount.is_finite() || loan_amount <= 0.0 {
            return Err(ProjectionError::invalid_terms(format!(
                "loan amount must be positive and finite, got {}",
                loan_amount
            )));
        }
        if !payment_amount.is_finite() || payment_amount <= 0.0 {
            return Err(ProjectionError::invalid_terms(format!(
                "payment amount must be positive and finite, got {}",
                payment_amount
            )));
        }
        if loan_term == 0 {
            return Err(ProjectionError::invalid_terms(
                "loan term must be at least one installment",
            ));
        }

        Ok(Self {
            loan_amount,
            payment_amount,
            loan_term,
        })
    }

    pub fn loan_amount(&self) -> f64 {
        self.loan_amount
    }

    pub fn payment_amount(&self) -> f64 {
        self.payment_amount
    }

    pub fn loan_term(&self) -> u32 {
        self.loan_term
    }

    /// Total of all contractual payments
    pub fn contractual_cash(&self) -> f64 {
        self.payment_amount * self.loan_term as f64
    }
}

impl<'de> Deserialize<'de> for LoanTerms {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Raw {
            loan_amount: f64,
            payment_amount: f64,
            loan_term: u32,
        }

        let raw = Raw::deserialize(deserializer)?;
        LoanTerms::new(raw.loan_amount, raw.payment_amount, raw.loan_term)
            .map_err(serde::de::Error::custom)
    }
}

/// A loan to be scored: identifier, terms and the covariates its hazard
/// classifiers consume
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Loan {
    /// Caller-supplied identifier
    pub loan_id: String,

    /// Contractual terms
    pub terms: LoanTerms,

    /// Loan/borrower features, passed through to the classifiers
    #[serde(default)]
    pub covariates: CovariateVector,
}

impl Loan {
    pub fn new(loan_id: impl Into<String>, terms: LoanTerms, covariates: CovariateVector) -> Self {
        Self {
            loan_id: loan_id.into(),
            terms,
            covariates,
        }
    }
}
