//! Expected cash-flow projection for a single loan

mod state;
mod engine;
mod cashflows;
pub mod irr;

pub use state::ProjectionState;
pub use engine::{expected_cash_from, CashFlowProjector, ProjectionConfig};
pub use cashflows::{ExpectedCashFlow, ExpectedCashflowRow, ProjectionResult, ProjectionSummary};
