//! Survival state carried through a projection

use crate::hazard::SurvivalCurve;

/// Conditional survival of a loan at a point in the projection.
///
/// All persistency factors are relative to the conditioning installment j:
/// `default_persistency = Sd(i) / Sd(j)`, and likewise for prepayment.
#[derive(Debug, Clone)]
pub struct ProjectionState {
    /// Installment reached (j before the first advance)
    pub installment: usize,

    /// Sd(i) / Sd(j)
    pub default_persistency: f64,

    /// Sp(i) / Sp(j)
    pub prepay_persistency: f64,

    /// Sd(i-1) / Sd(j)
    pub prior_default_persistency: f64,

    /// Sp(i-1) / Sp(j)
    pub prior_prepay_persistency: f64,

    /// Sd(j), Sp(j)
    base_default: f64,
    base_prepay: f64,
}

impl ProjectionState {
    /// State of a loan known to be current at installment `j`.
    /// Callers must have checked that both survival values at j are positive.
    pub fn current_at(j: usize, default_curve: &SurvivalCurve, prepay_curve: &SurvivalCurve) -> Self {
        Self {
            installment: j,
            default_persistency: 1.0,
            prepay_persistency: 1.0,
            prior_default_persistency: 1.0,
            prior_prepay_persistency: 1.0,
            base_default: default_curve.survival_at(j),
            base_prepay: prepay_curve.survival_at(j),
        }
    }

    /// Advance to the next installment
    pub fn advance(&mut self, default_curve: &SurvivalCurve, prepay_curve: &SurvivalCurve) {
        self.installment += 1;

        self.prior_default_persistency = self.default_persistency;
        self.prior_prepay_persistency = self.prepay_persistency;

        self.default_persistency = default_curve.survival_at(self.installment) / self.base_default;
        self.prepay_persistency = prepay_curve.survival_at(self.installment) / self.base_prepay;
    }

    /// Probability of still being current after this installment
    pub fn in_force(&self) -> f64 {
        self.default_persistency * self.prepay_persistency
    }
}
