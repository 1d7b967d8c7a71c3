//! Loan/borrower covariates handed to hazard classifiers

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A single covariate value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CovariateValue {
    Number(f64),
    Category(String),
}

impl CovariateValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            CovariateValue::Number(x) => Some(*x),
            CovariateValue::Category(_) => None,
        }
    }
}

impl fmt::Display for CovariateValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CovariateValue::Number(x) => write!(f, "{}", x),
            CovariateValue::Category(s) => write!(f, "{}", s),
        }
    }
}

impl From<f64> for CovariateValue {
    fn from(x: f64) -> Self {
        CovariateValue::Number(x)
    }
}

impl From<&str> for CovariateValue {
    fn from(s: &str) -> Self {
        CovariateValue::Category(s.to_string())
    }
}

impl From<String> for CovariateValue {
    fn from(s: String) -> Self {
        CovariateValue::Category(s)
    }
}

/// Feature name -> value mapping.
///
/// The projection engine never looks inside; the only thing it does is add
/// the installment index before each classifier call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CovariateVector(BTreeMap<String, CovariateValue>);

impl CovariateVector {
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<CovariateValue>) {
        self.0.insert(name.into(), value.into());
    }

    /// Insert a raw text cell: numeric if it parses, categorical otherwise
    pub fn insert_parsed(&mut self, name: impl Into<String>, raw: &str) {
        let value = match raw.parse::<f64>() {
            Ok(x) => CovariateValue::Number(x),
            Err(_) => CovariateValue::Category(raw.to_string()),
        };
        self.0.insert(name.into(), value);
    }

    /// Builder-style insert
    pub fn with(mut self, name: impl Into<String>, value: impl Into<CovariateValue>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&CovariateValue> {
        self.0.get(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &CovariateValue)> {
        self.0.iter()
    }
}

impl<K: Into<String>, V: Into<CovariateValue>> FromIterator<(K, V)> for CovariateVector {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}
