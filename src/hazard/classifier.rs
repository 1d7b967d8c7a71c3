//! The hazard classifier capability

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::CovariateVector;

/// Failures reported by a classifier while scoring a record
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ClassifierError {
    #[error("covariate '{0}' is missing")]
    MissingCovariate(String),

    #[error("covariate '{0}' is not numeric")]
    NotNumeric(String),

    #[error("{0}")]
    Failed(String),
}

/// Anything that scores a covariate record (including the installment index)
/// on the link scale, e.g. log-odds from a logistic regression.
///
/// Implementations must be deterministic: the same record always gets the
/// same score.
pub trait HazardClassifier: Send + Sync {
    fn predict(&self, record: &CovariateVector) -> Result<f64, ClassifierError>;
}

/// Adapts a plain function or closure into a classifier
pub struct FnClassifier<F>(pub F);

impl<F> HazardClassifier for FnClassifier<F>
where
    F: Fn(&CovariateVector) -> f64 + Send + Sync,
{
    fn predict(&self, record: &CovariateVector) -> Result<f64, ClassifierError> {
        Ok((self.0)(record))
    }
}

/// How a link-scale score maps to the probability of the event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum HazardLink {
    /// Survival is the positive class: h = 1 / (1 + exp(score))
    #[default]
    SurvivalPositive,
    /// The event is the positive class: h = 1 / (1 + exp(-score))
    EventPositive,
}

impl HazardLink {
    /// Inverse-logit of the score with this polarity
    pub fn to_hazard(&self, score: f64) -> f64 {
        match self {
            HazardLink::SurvivalPositive => 1.0 / (1.0 + score.exp()),
            HazardLink::EventPositive => 1.0 / (1.0 + (-score).exp()),
        }
    }
}
