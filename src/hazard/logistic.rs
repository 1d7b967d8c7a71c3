//! Logistic-regression hazard model driven by a coefficient table
//!
//! Coefficients are stored by term name, the way a fitted GLM prints them:
//!
//! - `(Intercept)`
//! - `fico` - numeric covariate
//! - `installment^2` - numeric covariate raised to a power
//! - `grade[B]` - indicator, 1 when the categorical covariate equals the level
//! - `grade[B]:installment` - product of the terms on either side of `:`
//!
//! The linear predictor is returned as the score; turning it into a hazard
//! is up to the curve builder and its [`HazardLink`](super::HazardLink).

use std::fmt;
use thiserror::Error;

use super::{ClassifierError, CovariateValue, CovariateVector, HazardClassifier};

/// A coefficient table that cannot be turned into a model
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    #[error("empty term")]
    EmptyTerm,

    #[error("unterminated level in '{0}'")]
    UnterminatedLevel(String),

    #[error("invalid power in '{0}'")]
    InvalidPower(String),

    #[error("coefficient for '{0}' is not finite")]
    NonFiniteCoefficient(String),
}

/// One factor of a model term
#[derive(Debug, Clone, PartialEq)]
enum Factor {
    Intercept,
    Numeric { name: String, power: i32 },
    Indicator { name: String, level: String },
}

impl Factor {
    fn parse(raw: &str) -> Result<Self, ModelError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(ModelError::EmptyTerm);
        }
        if raw == "(Intercept)" || raw.eq_ignore_ascii_case("intercept") {
            return Ok(Factor::Intercept);
        }

        if let Some(open) = raw.find('[') {
            let level = raw[open + 1..]
                .strip_suffix(']')
                .ok_or_else(|| ModelError::UnterminatedLevel(raw.to_string()))?;
            return Ok(Factor::Indicator {
                name: raw[..open].to_string(),
                level: level.to_string(),
            });
        }

        if let Some((name, power)) = raw.split_once('^') {
            let power: i32 = power
                .trim()
                .parse()
                .map_err(|_| ModelError::InvalidPower(raw.to_string()))?;
            return Ok(Factor::Numeric {
                name: name.trim().to_string(),
                power,
            });
        }

        Ok(Factor::Numeric {
            name: raw.to_string(),
            power: 1,
        })
    }

    fn evaluate(&self, record: &CovariateVector) -> Result<f64, ClassifierError> {
        match self {
            Factor::Intercept => Ok(1.0),
            Factor::Numeric { name, power } => {
                let value = record
                    .get(name)
                    .ok_or_else(|| ClassifierError::MissingCovariate(name.clone()))?
                    .as_number()
                    .ok_or_else(|| ClassifierError::NotNumeric(name.clone()))?;
                Ok(value.powi(*power))
            }
            Factor::Indicator { name, level } => {
                let matches = match record.get(name) {
                    Some(CovariateValue::Category(c)) => c == level,
                    Some(CovariateValue::Number(x)) => level.parse::<f64>().map_or(false, |l| l == *x),
                    None => return Err(ClassifierError::MissingCovariate(name.clone())),
                };
                Ok(if matches { 1.0 } else { 0.0 })
            }
        }
    }
}

impl fmt::Display for Factor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Factor::Intercept => write!(f, "(Intercept)"),
            Factor::Numeric { name, power: 1 } => write!(f, "{}", name),
            Factor::Numeric { name, power } => write!(f, "{}^{}", name, power),
            Factor::Indicator { name, level } => write!(f, "{}[{}]", name, level),
        }
    }
}

/// A model term: product of one or more factors
#[derive(Debug, Clone, PartialEq)]
pub struct Term(Vec<Factor>);

impl Term {
    /// Parse a term name such as `grade[B]:installment^2`
    pub fn parse(raw: &str) -> Result<Self, ModelError> {
        let factors = raw
            .split(':')
            .map(Factor::parse)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Term(factors))
    }

    fn evaluate(&self, record: &CovariateVector) -> Result<f64, ClassifierError> {
        self.0
            .iter()
            .try_fold(1.0, |acc, factor| -> Result<f64, ClassifierError> {
                Ok(acc * factor.evaluate(record)?)
            })
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<String> = self.0.iter().map(|factor| factor.to_string()).collect();
        write!(f, "{}", names.join(":"))
    }
}

/// Fitted logistic regression: score = Σ coefficient × term(record)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LogisticHazardModel {
    terms: Vec<(Term, f64)>,
}

impl LogisticHazardModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from `(term name, coefficient)` pairs
    pub fn from_coefficients<I, S>(coefficients: I) -> Result<Self, ModelError>
    where
        I: IntoIterator<Item = (S, f64)>,
        S: AsRef<str>,
    {
        let mut model = Self::new();
        for (name, coef) in coefficients {
            model = model.with_term(name.as_ref(), coef)?;
        }
        Ok(model)
    }

    /// Builder-style term addition
    pub fn with_term(mut self, name: &str, coefficient: f64) -> Result<Self, ModelError> {
        if !coefficient.is_finite() {
            return Err(ModelError::NonFiniteCoefficient(name.to_string()));
        }
        self.terms.push((Term::parse(name)?, coefficient));
        Ok(self)
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Linear predictor for a record
    pub fn linear_predictor(&self, record: &CovariateVector) -> Result<f64, ClassifierError> {
        self.terms
            .iter()
            .try_fold(0.0, |acc, (term, coef)| -> Result<f64, ClassifierError> {
                Ok(acc + coef * term.evaluate(record)?)
            })
    }
}

impl HazardClassifier for LogisticHazardModel {
    fn predict(&self, record: &CovariateVector) -> Result<f64, ClassifierError> {
        self.linear_predictor(record)
    }
}
