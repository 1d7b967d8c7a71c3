//! Loan terms and loan-file loading

mod terms;
pub mod loader;

pub use terms::{Loan, LoanTerms};
pub use loader::{load_loans, load_loans_from_reader};
