//! Loan Projection - expected cash flows of amortizing loans under competing risks
//!
//! This library provides:
//! - Implicit-rate solving with pluggable root finders (Newton, bisection, Brent, hybrid)
//! - Level-payment amortization schedules
//! - Default and prepayment survival curves from per-installment hazard classifiers
//! - Expected cash per installment, unconditioned or given the loan is current at j
//! - CSV loaders for loan files and logistic coefficient tables

pub mod error;
pub mod loan;
pub mod solver;
pub mod amortization;
pub mod hazard;
pub mod projection;

// Re-export commonly used types
pub use error::{LoadError, LoanResult, ProjectionError};
pub use loan::{Loan, LoanTerms};
pub use solver::{solve_rate, InterestRate, RootSolver, SolverConfig, SolverKind};
pub use amortization::{amortize, AmortizationEngine, AmortizationRow, AmortizationSchedule};
pub use hazard::{
    build_survival_curve, CovariateVector, EventKind, HazardClassifier, HazardCurveBuilder, HazardLink,
    LogisticHazardModel, SurvivalCurve,
};
pub use projection::{CashFlowProjector, ExpectedCashFlow, ProjectionConfig, ProjectionResult};
