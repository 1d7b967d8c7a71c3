//! Hazard classifiers and the survival curves derived from them
//!
//! Default and prepayment are modeled as independent competing risks, each
//! with its own classifier and its own curve.

mod classifier;
mod covariates;
mod logistic;
mod survival;
pub mod loader;

pub use classifier::{ClassifierError, FnClassifier, HazardClassifier, HazardLink};
pub use covariates::{CovariateValue, CovariateVector};
pub use logistic::{LogisticHazardModel, ModelError, Term};
pub use survival::{build_survival_curve, HazardCurveBuilder, SurvivalCurve, DEFAULT_INSTALLMENT_FEATURE};
pub use loader::{load_model, load_model_from_reader};

use serde::{Deserialize, Serialize};
use std::fmt;

/// The two competing terminal events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Default,
    Prepay,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventKind::Default => write!(f, "default"),
            EventKind::Prepay => write!(f, "prepay"),
        }
    }
}
