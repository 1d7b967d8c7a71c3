//! Per-installment hazards and the cumulative survival curve built from them

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::{CovariateVector, EventKind, HazardClassifier, HazardLink};
use crate::error::{LoanResult, ProjectionError};

/// Covariate name under which the installment index is passed to classifiers
pub const DEFAULT_INSTALLMENT_FEATURE: &str = "installment";

/// Discrete-time survival curve for one event type.
///
/// `hazards[i-1]` is P(event at i | no event before i) and `survival[i-1]`
/// is S(i) = P(T > i) = Π_{k<=i} (1 - h(k)). S(0) = 1 is implied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurvivalCurve {
    event: EventKind,
    hazards: Vec<f64>,
    survival: Vec<f64>,
}

impl SurvivalCurve {
    /// Build the curve from per-installment hazard probabilities.
    ///
    /// Every hazard must be finite and lie in [0, 1].
    pub fn from_hazards(event: EventKind, hazards: Vec<f64>) -> LoanResult<Self> {
        let mut survival = Vec::with_capacity(hazards.len());
        let mut cumulative = 1.0;

        for (idx, &h) in hazards.iter().enumerate() {
            if !h.is_finite() || !(0.0..=1.0).contains(&h) {
                return Err(ProjectionError::HazardEvaluation {
                    event,
                    installment: idx as u32 + 1,
                    reason: format!("hazard {} is not a probability", h),
                });
            }
            cumulative *= 1.0 - h;
            survival.push(cumulative);
        }

        Ok(Self {
            event,
            hazards,
            survival,
        })
    }

    pub fn event(&self) -> EventKind {
        self.event
    }

    /// Number of installments covered
    pub fn len(&self) -> usize {
        self.survival.len()
    }

    pub fn is_empty(&self) -> bool {
        self.survival.is_empty()
    }

    /// S(i) for i in 0..=len; S(0) is 1.
    ///
    /// # Panics
    /// If `installment > len()`.
    pub fn survival_at(&self, installment: usize) -> f64 {
        if installment == 0 {
            1.0
        } else {
            self.survival[installment - 1]
        }
    }

    /// h(i) for i in 1..=len
    ///
    /// # Panics
    /// If `installment` is 0 or greater than `len()`.
    pub fn hazard_at(&self, installment: usize) -> f64 {
        self.hazards[installment - 1]
    }

    pub fn hazards(&self) -> &[f64] {
        &self.hazards
    }

    pub fn survival(&self) -> &[f64] {
        &self.survival
    }

    /// Probability the event happens at some installment up to and including the last
    pub fn cumulative_incidence(&self) -> f64 {
        1.0 - self.survival.last().copied().unwrap_or(1.0)
    }
}

/// Turns a classifier into a survival curve, one installment at a time
#[derive(Debug, Clone)]
pub struct HazardCurveBuilder {
    /// Score-to-hazard polarity
    pub link: HazardLink,

    /// Name of the installment feature added to each record
    pub installment_feature: String,

    /// Score installments concurrently (results are reassembled in order)
    pub parallel: bool,
}

impl Default for HazardCurveBuilder {
    fn default() -> Self {
        Self {
            link: HazardLink::default(),
            installment_feature: DEFAULT_INSTALLMENT_FEATURE.to_string(),
            parallel: false,
        }
    }
}

impl HazardCurveBuilder {
    /// Hazard at a single installment
    fn hazard_at(
        &self,
        classifier: &dyn HazardClassifier,
        covariates: &CovariateVector,
        installment: u32,
        event: EventKind,
    ) -> LoanResult<f64> {
        let record = covariates
            .clone()
            .with(self.installment_feature.as_str(), installment as f64);

        let score = classifier
            .predict(&record)
            .map_err(|e| ProjectionError::HazardEvaluation {
                event,
                installment,
                reason: e.to_string(),
            })?;

        if !score.is_finite() {
            return Err(ProjectionError::HazardEvaluation {
                event,
                installment,
                reason: format!("classifier returned non-finite score {}", score),
            });
        }

        Ok(self.link.to_hazard(score))
    }

    /// Score every installment and fold the hazards into a survival curve
    pub fn build(
        &self,
        classifier: &dyn HazardClassifier,
        covariates: &CovariateVector,
        loan_term: u32,
        event: EventKind,
    ) -> LoanResult<SurvivalCurve> {
        let hazards: Vec<f64> = if self.parallel {
            (1..=loan_term)
                .into_par_iter()
                .map(|i| self.hazard_at(classifier, covariates, i, event))
                .collect::<LoanResult<Vec<f64>>>()?
        } else {
            (1..=loan_term)
                .map(|i| self.hazard_at(classifier, covariates, i, event))
                .collect::<LoanResult<Vec<f64>>>()?
        };

        let curve = SurvivalCurve::from_hazards(event, hazards)?;
        log::debug!(
            "{} curve over {} installments, cumulative incidence {:.6}",
            event,
            loan_term,
            curve.cumulative_incidence()
        );
        Ok(curve)
    }
}

/// Build a survival curve with the default builder settings
pub fn build_survival_curve(
    classifier: &dyn HazardClassifier,
    covariates: &CovariateVector,
    loan_term: u32,
    event: EventKind,
) -> LoanResult<SurvivalCurve> {
    HazardCurveBuilder::default().build(classifier, covariates, loan_term, event)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hazard::{ClassifierError, FnClassifier, LogisticHazardModel};
    use approx::assert_abs_diff_eq;

    fn installment(record: &CovariateVector) -> f64 {
        record
            .get(DEFAULT_INSTALLMENT_FEATURE)
            .and_then(|v| v.as_number())
            .unwrap_or(f64::NAN)
    }

    #[test]
    fn test_cumulative_product() {
        let curve = SurvivalCurve::from_hazards(EventKind::Default, vec![0.1, 0.2, 0.5]).unwrap();
        assert_eq!(curve.survival_at(0), 1.0);
        assert_abs_diff_eq!(curve.survival_at(1), 0.9, epsilon = 1e-12);
        assert_abs_diff_eq!(curve.survival_at(2), 0.72, epsilon = 1e-12);
        assert_abs_diff_eq!(curve.survival_at(3), 0.36, epsilon = 1e-12);
        assert_abs_diff_eq!(curve.cumulative_incidence(), 0.64, epsilon = 1e-12);
    }

    #[test]
    fn test_curve_is_monotone_probability() {
        // Deterministic pseudo-random hazards covering the unit interval, endpoints included
        let hazards: Vec<f64> = (0..200)
            .map(|k| match k % 17 {
                0 => 0.0,
                16 => 1.0,
                _ => ((k * 7919) % 1000) as f64 / 1000.0 * 0.3,
            })
            .collect();
        let curve = SurvivalCurve::from_hazards(EventKind::Prepay, hazards).unwrap();

        let mut previous = 1.0;
        for &s in curve.survival() {
            assert!((0.0..=1.0).contains(&s));
            assert!(s <= previous);
            previous = s;
        }
    }

    #[test]
    fn test_rejects_invalid_hazard() {
        let err = SurvivalCurve::from_hazards(EventKind::Prepay, vec![0.1, 1.5]).unwrap_err();
        assert!(matches!(
            err,
            ProjectionError::HazardEvaluation { installment: 2, event: EventKind::Prepay, .. }
        ));
    }

    #[test]
    fn test_certain_survival() {
        let clf = FnClassifier(|_: &CovariateVector| 1000.0);
        let curve = build_survival_curve(&clf, &CovariateVector::new(), 12, EventKind::Default).unwrap();
        assert_eq!(curve.len(), 12);
        assert!(curve.survival().iter().all(|&s| s == 1.0));
    }

    #[test]
    fn test_installment_feature_is_passed() {
        // Score ln(9) at installment 1 gives h = 0.1, zero score gives h = 0.5
        let clf = FnClassifier(|r: &CovariateVector| if installment(r) == 1.0 { 9f64.ln() } else { 0.0 });
        let curve = build_survival_curve(&clf, &CovariateVector::new(), 3, EventKind::Default).unwrap();
        assert_abs_diff_eq!(curve.hazard_at(1), 0.1, epsilon = 1e-12);
        assert_abs_diff_eq!(curve.hazard_at(2), 0.5, epsilon = 1e-12);
        assert_abs_diff_eq!(curve.survival_at(3), 0.9 * 0.25, epsilon = 1e-12);
    }

    #[test]
    fn test_non_finite_score() {
        let clf = FnClassifier(|r: &CovariateVector| if installment(r) == 4.0 { f64::NAN } else { 1.0 });
        let err = build_survival_curve(&clf, &CovariateVector::new(), 6, EventKind::Prepay).unwrap_err();
        assert!(matches!(err, ProjectionError::HazardEvaluation { installment: 4, .. }));
    }

    #[test]
    fn test_classifier_error_reported() {
        struct Failing;
        impl HazardClassifier for Failing {
            fn predict(&self, _: &CovariateVector) -> Result<f64, ClassifierError> {
                Err(ClassifierError::Failed("model unavailable".to_string()))
            }
        }

        let err = build_survival_curve(&Failing, &CovariateVector::new(), 3, EventKind::Default).unwrap_err();
        match err {
            ProjectionError::HazardEvaluation { installment, reason, .. } => {
                assert_eq!(installment, 1);
                assert!(reason.contains("model unavailable"));
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let model = LogisticHazardModel::from_coefficients([
            ("(Intercept)", 3.5),
            ("installment", 0.04),
            ("fico", 0.001),
        ])
        .unwrap();
        let covariates = CovariateVector::new().with("fico", 690.0);

        let sequential = HazardCurveBuilder::default()
            .build(&model, &covariates, 48, EventKind::Default)
            .unwrap();
        let parallel = HazardCurveBuilder { parallel: true, ..Default::default() }
            .build(&model, &covariates, 48, EventKind::Default)
            .unwrap();

        assert_eq!(sequential, parallel);
    }

    #[test]
    fn test_event_positive_link() {
        let clf = FnClassifier(|_: &CovariateVector| 1000.0);
        let builder = HazardCurveBuilder { link: HazardLink::EventPositive, ..Default::default() };
        let curve = builder.build(&clf, &CovariateVector::new(), 3, EventKind::Prepay).unwrap();
        assert_eq!(curve.survival_at(1), 0.0);
        assert_eq!(curve.survival_at(3), 0.0);
    }
}
