//! Error types for loan projection
//!
//! Every failure is a value; no partially built schedule or curve is ever
//! returned alongside an error.

use thiserror::Error;

use crate::hazard::{EventKind, ModelError};

/// Convenience alias used throughout the crate
pub type LoanResult<T> = Result<T, ProjectionError>;

/// Errors raised by the projection core
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProjectionError {
    /// Loan amount, payment or term was non-positive or non-finite
    #[error("invalid loan terms: {reason}")]
    InvalidLoanTerms { reason: String },

    /// The implicit rate could not be solved
    #[error("rate solve failed after {iterations} iterations (residual: {residual:.3e}): {reason}")]
    RateSolve {
        residual: f64,
        iterations: u32,
        reason: String,
    },

    /// The hazard classifier failed or returned a non-finite score
    #[error("{event} hazard evaluation failed at installment {installment}: {reason}")]
    HazardEvaluation {
        event: EventKind,
        installment: u32,
        reason: String,
    },

    /// Re-projection requested from an index the loan cannot be current at
    #[error("cannot condition on installment {installment}: {reason}")]
    InvalidConditioning { installment: usize, reason: String },

    /// Schedule and curves passed to the fusion step cover different terms
    #[error("length mismatch: schedule has {schedule} installments, default curve {default_curve}, prepay curve {prepay_curve}")]
    LengthMismatch {
        schedule: usize,
        default_curve: usize,
        prepay_curve: usize,
    },
}

impl ProjectionError {
    pub(crate) fn invalid_terms(reason: impl Into<String>) -> Self {
        ProjectionError::InvalidLoanTerms {
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_conditioning(installment: usize, reason: impl Into<String>) -> Self {
        ProjectionError::InvalidConditioning {
            installment,
            reason: reason.into(),
        }
    }
}

/// Errors raised while loading loans or model tables from CSV
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("missing required column '{0}'")]
    MissingColumn(String),

    #[error("row {row}: {reason}")]
    InvalidRow { row: usize, reason: String },

    #[error("row {row}: {source}")]
    Model {
        row: usize,
        #[source]
        source: ModelError,
    },

    #[error(transparent)]
    Terms(#[from] ProjectionError),
}
