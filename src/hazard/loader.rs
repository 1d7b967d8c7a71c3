//! Load logistic hazard model coefficients from CSV
//!
//! Format: a header row, then `term,coefficient` per line, e.g.
//!
//! ```text
//! term,coefficient
//! (Intercept),4.21
//! installment,-0.031
//! grade[C],-0.62
//! ```

use std::path::Path;

use super::LogisticHazardModel;
use crate::error::LoadError;

/// Load a coefficient table from any reader
pub fn load_model_from_reader<R: std::io::Read>(reader: R) -> Result<LogisticHazardModel, LoadError> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let mut model = LogisticHazardModel::new();

    for (row, result) in csv_reader.records().enumerate() {
        let record = result?;
        let row = row + 1;

        let term = record.get(0).unwrap_or("").trim();
        let raw_coef = record.get(1).unwrap_or("").trim();
        let coef: f64 = raw_coef.parse().map_err(|_| LoadError::InvalidRow {
            row,
            reason: format!("cannot parse coefficient '{}'", raw_coef),
        })?;

        model = model
            .with_term(term, coef)
            .map_err(|source| LoadError::Model { row, source })?;
    }

    log::debug!("loaded hazard model with {} terms", model.len());
    Ok(model)
}

/// Load a coefficient table from a CSV file
pub fn load_model<P: AsRef<Path>>(path: P) -> Result<LogisticHazardModel, LoadError> {
    let file = std::fs::File::open(path)?;
    load_model_from_reader(file)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hazard::{CovariateVector, HazardClassifier, ModelError};
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_load_model() {
        let csv = "term,coefficient\n(Intercept),4.0\ninstallment,-0.05\ngrade[C],-0.5\n";
        let model = load_model_from_reader(csv.as_bytes()).unwrap();
        assert_eq!(model.len(), 3);

        let record = CovariateVector::new().with("installment", 2.0).with("grade", "C");
        assert_abs_diff_eq!(model.predict(&record).unwrap(), 4.0 - 0.1 - 0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_bad_rows() {
        let csv = "term,coefficient\n(Intercept),abc\n";
        let err = load_model_from_reader(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, LoadError::InvalidRow { row: 1, .. }));

        let csv = "term,coefficient\n(Intercept),1.0\ngrade[C,0.3\n";
        let err = load_model_from_reader(csv.as_bytes()).unwrap_err();
        assert!(matches!(
            err,
            LoadError::Model { row: 2, source: ModelError::UnterminatedLevel(_) }
        ));
    }
}
