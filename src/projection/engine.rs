//! Expected cash-flow projection under competing default and prepayment risk

use crate::amortization::{AmortizationEngine, AmortizationSchedule};
use crate::error::{LoanResult, ProjectionError};
use crate::hazard::{
    CovariateVector, EventKind, HazardClassifier, HazardCurveBuilder, HazardLink, SurvivalCurve,
    DEFAULT_INSTALLMENT_FEATURE,
};
use crate::loan::{Loan, LoanTerms};
use crate::solver::{SolverConfig, SolverKind, DEFAULT_INITIAL_GUESS};
use super::cashflows::{ExpectedCashFlow, ExpectedCashflowRow, ProjectionResult, ProjectionSummary};
use super::irr::expected_yield;
use super::state::ProjectionState;

/// Configuration for a projection run
#[derive(Debug, Clone)]
pub struct ProjectionConfig {
    /// Root finder for the implicit rate and the expected yield
    pub solver: SolverKind,

    /// Tolerance and iteration budget for the root finder
    pub solver_config: SolverConfig,

    /// Starting point for the rate search
    pub initial_guess: f64,

    /// Score-to-hazard polarity shared by both classifiers
    pub hazard_link: HazardLink,

    /// Covariate name carrying the installment index
    pub installment_feature: String,

    /// Score installments concurrently when building curves
    pub parallel_hazards: bool,

    /// Per-period rate for present values; None uses the loan's own rate
    pub discount_rate: Option<f64>,
}

impl Default for ProjectionConfig {
    fn default() -> Self {
        Self {
            solver: SolverKind::default(),
            solver_config: SolverConfig::default(),
            initial_guess: DEFAULT_INITIAL_GUESS,
            hazard_link: HazardLink::default(),
            installment_feature: DEFAULT_INSTALLMENT_FEATURE.to_string(),
            parallel_hazards: false,
            discount_rate: None,
        }
    }
}

/// Main projection engine.
///
/// Holds configuration only; every call rebuilds schedule and curves from
/// its arguments, so results never depend on earlier calls.
#[derive(Debug, Clone, Default)]
pub struct CashFlowProjector {
    config: ProjectionConfig,
}

impl CashFlowProjector {
    pub fn new(config: ProjectionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ProjectionConfig {
        &self.config
    }

    fn amortization_engine(&self) -> AmortizationEngine {
        AmortizationEngine::new(self.config.solver.build(), self.config.solver_config, self.config.initial_guess)
    }

    fn curve_builder(&self) -> HazardCurveBuilder {
        HazardCurveBuilder {
            link: self.config.hazard_link,
            installment_feature: self.config.installment_feature.clone(),
            parallel: self.config.parallel_hazards,
        }
    }

    /// Unconditioned projection from origination
    pub fn project(
        &self,
        terms: &LoanTerms,
        covariates: &CovariateVector,
        default_classifier: &dyn HazardClassifier,
        prepay_classifier: &dyn HazardClassifier,
    ) -> LoanResult<ProjectionResult> {
        self.project_from(0, terms, covariates, default_classifier, prepay_classifier)
    }

    /// Projection of the installments after `j`, given the loan is current
    /// (neither defaulted nor prepaid) through installment `j`
    pub fn project_from(
        &self,
        j: usize,
        terms: &LoanTerms,
        covariates: &CovariateVector,
        default_classifier: &dyn HazardClassifier,
        prepay_classifier: &dyn HazardClassifier,
    ) -> LoanResult<ProjectionResult> {
        let n = terms.loan_term();
        if j >= n as usize {
            return Err(ProjectionError::invalid_conditioning(
                j,
                format!("loan term is {} installments", n),
            ));
        }

        let builder = self.curve_builder();
        let default_curve = builder.build(default_classifier, covariates, n, EventKind::Default)?;
        let prepay_curve = builder.build(prepay_classifier, covariates, n, EventKind::Prepay)?;
        let schedule = self.amortization_engine().amortize(terms)?;

        self.project_components(j, schedule, default_curve, prepay_curve)
    }

    /// Project a loan record
    pub fn project_loan(
        &self,
        loan: &Loan,
        conditioned_on: usize,
        default_classifier: &dyn HazardClassifier,
        prepay_classifier: &dyn HazardClassifier,
    ) -> LoanResult<ProjectionResult> {
        log::debug!("projecting loan {} from installment {}", loan.loan_id, conditioned_on);
        self.project_from(
            conditioned_on,
            &loan.terms,
            &loan.covariates,
            default_classifier,
            prepay_classifier,
        )
    }

    /// Fuse an already built schedule and curves into a projection
    pub fn project_components(
        &self,
        j: usize,
        schedule: AmortizationSchedule,
        default_curve: SurvivalCurve,
        prepay_curve: SurvivalCurve,
    ) -> LoanResult<ProjectionResult> {
        let discount_rate = self.config.discount_rate.unwrap_or(schedule.rate.value());
        let cashflows = expected_cash_from(j, &schedule, &default_curve, &prepay_curve, discount_rate)?;
        let summary = self.summarize(&schedule, &cashflows);

        Ok(ProjectionResult {
            schedule,
            default_curve,
            prepay_curve,
            cashflows,
            summary,
        })
    }

    fn summarize(&self, schedule: &AmortizationSchedule, cashflows: &ExpectedCashFlow) -> ProjectionSummary {
        let j = cashflows.conditioned_on;
        let outstanding = schedule.remaining_principal(j).unwrap_or(0.0);
        let contractual: f64 = cashflows.rows.iter().map(|r| r.scheduled_payment).sum();
        let total = cashflows.total_expected_cash;

        let default_probability: f64 = cashflows.rows.iter().map(|r| r.default_probability).sum();
        let prepay_probability: f64 = cashflows.rows.iter().map(|r| r.prepay_probability).sum();
        let maturity_probability = cashflows
            .rows
            .last()
            .map(|r| r.default_survival * r.prepay_survival)
            .unwrap_or(1.0);

        let solver = self.config.solver.build();
        let expected_yield = match expected_yield(
            outstanding,
            &cashflows.amounts(),
            schedule.rate.value(),
            solver.as_ref(),
            &self.config.solver_config,
        ) {
            Ok(y) => Some(y),
            Err(e) => {
                log::warn!("expected yield not solved: {}", e);
                None
            }
        };

        ProjectionSummary {
            installments: cashflows.len(),
            outstanding_principal: outstanding,
            contractual_cash: contractual,
            total_expected_cash: total,
            expected_shortfall: contractual - total,
            present_value: cashflows.rows.iter().map(|r| r.present_value).sum(),
            default_probability,
            prepay_probability,
            maturity_probability,
            expected_yield,
        }
    }
}

/// Expected cash for installments j+1..=n given the loan is current at j.
///
/// With c the payment, c_i the payoff amount, and survival ratios taken
/// relative to j:
///
/// `E(Y_i | j) = c·Sd(i)/Sd(j)·Sp(i)/Sp(j) + c_i·Sd(i)/Sd(j)·hp(i)·Sp(i-1)/Sp(j)`
///
/// j = 0 is the unconditioned projection. Present values discount each
/// installment back to j at `discount_rate` per period.
pub fn expected_cash_from(
    j: usize,
    schedule: &AmortizationSchedule,
    default_curve: &SurvivalCurve,
    prepay_curve: &SurvivalCurve,
    discount_rate: f64,
) -> LoanResult<ExpectedCashFlow> {
    let n = schedule.len();
    if default_curve.len() != n || prepay_curve.len() != n {
        return Err(ProjectionError::LengthMismatch {
            schedule: n,
            default_curve: default_curve.len(),
            prepay_curve: prepay_curve.len(),
        });
    }
    if j >= n {
        return Err(ProjectionError::invalid_conditioning(
            j,
            format!("loan term is {} installments", n),
        ));
    }

    let sd_j = default_curve.survival_at(j);
    let sp_j = prepay_curve.survival_at(j);
    if sd_j <= 0.0 {
        return Err(ProjectionError::invalid_conditioning(
            j,
            "default survival is zero, the loan cannot be current",
        ));
    }
    if sp_j <= 0.0 {
        return Err(ProjectionError::invalid_conditioning(
            j,
            "prepayment survival is zero, the loan cannot be current",
        ));
    }

    let mut state = ProjectionState::current_at(j, default_curve, prepay_curve);
    let mut rows = Vec::with_capacity(n - j);

    for _ in j + 1..=n {
        state.advance(default_curve, prepay_curve);
        let i = state.installment;
        let scheduled = &schedule.rows()[i - 1];

        let c = scheduled.payment_amount;
        let c_i = schedule.payoff_amount(i);
        let hd = default_curve.hazard_at(i);
        let hp = prepay_curve.hazard_at(i);

        let scheduled_component = c * state.default_persistency * state.prepay_persistency;
        let prepayment_component = c_i * state.default_persistency * hp * state.prior_prepay_persistency;
        let expected_cash = scheduled_component + prepayment_component;

        let discount_factor = (1.0 + discount_rate).powi(-((i - j) as i32));

        rows.push(ExpectedCashflowRow {
            installment: scheduled.installment,
            scheduled_payment: c,
            payoff_amount: c_i,
            default_hazard: hd,
            prepay_hazard: hp,
            default_survival: state.default_persistency,
            prepay_survival: state.prepay_persistency,
            prior_prepay_survival: state.prior_prepay_persistency,
            default_probability: state.prior_default_persistency * hd * state.prior_prepay_persistency,
            prepay_probability: state.default_persistency * hp * state.prior_prepay_persistency,
            scheduled_component,
            prepayment_component,
            expected_cash,
            discount_factor,
            present_value: expected_cash * discount_factor,
        });
    }

    let cashflows = ExpectedCashFlow::new(j, rows);
    log::debug!(
        "expected cash from installment {}: {:.4} over {} installments",
        j,
        cashflows.total_expected_cash,
        cashflows.len()
    );
    Ok(cashflows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hazard::{FnClassifier, LogisticHazardModel};
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    /// Score that drives the hazard to exactly 0 under the default link
    const NEVER: f64 = 1000.0;
    /// Score that drives the hazard to exactly 1
    const ALWAYS: f64 = -1000.0;

    fn installment(record: &CovariateVector) -> f64 {
        record
            .get(DEFAULT_INSTALLMENT_FEATURE)
            .and_then(|v| v.as_number())
            .unwrap_or(f64::NAN)
    }

    fn never() -> FnClassifier<impl Fn(&CovariateVector) -> f64 + Send + Sync> {
        FnClassifier(|_: &CovariateVector| NEVER)
    }

    fn certain_at_first() -> FnClassifier<impl Fn(&CovariateVector) -> f64 + Send + Sync> {
        FnClassifier(|r: &CovariateVector| if installment(r) == 1.0 { ALWAYS } else { NEVER })
    }

    fn default_model() -> LogisticHazardModel {
        LogisticHazardModel::from_coefficients([
            ("(Intercept)", 4.2),
            ("installment", 0.03),
            ("grade[C]", -0.7),
            ("dti", -2.0),
        ])
        .unwrap()
    }

    fn prepay_model() -> LogisticHazardModel {
        LogisticHazardModel::from_coefficients([
            ("(Intercept)", 3.3),
            ("installment", -0.02),
            ("dti", 1.0),
        ])
        .unwrap()
    }

    fn covariates() -> CovariateVector {
        CovariateVector::new().with("grade", "C").with("dti", 0.25)
    }

    fn terms() -> LoanTerms {
        LoanTerms::new(10_000.0, 330.0, 36).unwrap()
    }

    #[test]
    fn test_no_risk_collects_every_payment() {
        let terms = LoanTerms::new(1000.0, 120.0, 10).unwrap();
        let projector = CashFlowProjector::default();
        let result = projector
            .project(&terms, &CovariateVector::new(), &never(), &never())
            .unwrap();

        assert!(result.default_curve.survival().iter().all(|&s| s == 1.0));
        assert!(result.prepay_curve.survival().iter().all(|&s| s == 1.0));
        assert_eq!(result.total_expected_cash(), 120.0 * 10.0);
        assert!(result.expected_cash_by_installment().iter().all(|&c| c == 120.0));

        // Discounting at the loan's own rate recovers the loan amount
        assert_relative_eq!(result.summary.present_value, 1000.0, epsilon = 1e-4);
        assert_abs_diff_eq!(
            result.summary.expected_yield.unwrap(),
            result.schedule.rate.value(),
            epsilon = 1e-8
        );
        assert_eq!(result.summary.maturity_probability, 1.0);
        assert_eq!(result.summary.expected_shortfall, 0.0);
    }

    #[test]
    fn test_certain_prepayment_at_first_installment() {
        let terms = LoanTerms::new(1000.0, 120.0, 10).unwrap();
        let result = CashFlowProjector::default()
            .project(&terms, &CovariateVector::new(), &never(), &certain_at_first())
            .unwrap();

        let cash = result.expected_cash_by_installment();
        assert_relative_eq!(cash[0], result.schedule.payoff_amount(1), epsilon = 1e-12);
        assert!(cash[1..].iter().all(|&c| c == 0.0));
        assert_relative_eq!(result.summary.prepay_probability, 1.0, epsilon = 1e-12);
        // Paying off at installment 1 is worth the loan amount at the loan rate
        assert_relative_eq!(result.summary.present_value, 1000.0, epsilon = 1e-6);
    }

    #[test]
    fn test_certain_default_at_first_installment() {
        let terms = LoanTerms::new(1000.0, 120.0, 10).unwrap();
        let result = CashFlowProjector::default()
            .project(&terms, &CovariateVector::new(), &certain_at_first(), &never())
            .unwrap();

        assert!(result.expected_cash_by_installment().iter().all(|&c| c == 0.0));
        assert_eq!(result.total_expected_cash(), 0.0);
        assert_relative_eq!(result.summary.default_probability, 1.0, epsilon = 1e-12);
        assert!(result.summary.expected_yield.is_none());
    }

    #[test]
    fn test_formula_by_hand() {
        let terms = LoanTerms::new(1000.0, 120.0, 10).unwrap();
        let projector = CashFlowProjector::default();
        let result = projector
            .project(&terms, &covariates(), &default_model(), &prepay_model())
            .unwrap();

        let sd = &result.default_curve;
        let sp = &result.prepay_curve;
        for row in &result.cashflows.rows {
            let i = row.installment as usize;
            let expected = 120.0 * sd.survival_at(i) * sp.survival_at(i)
                + result.schedule.payoff_amount(i) * sd.survival_at(i) * sp.hazard_at(i) * sp.survival_at(i - 1);
            assert_relative_eq!(row.expected_cash, expected, epsilon = 1e-12);
        }

        let total: f64 = result.cashflows.rows.iter().map(|r| r.expected_cash).sum();
        assert_eq!(result.total_expected_cash(), total);
    }

    #[test]
    fn test_outcome_probabilities_sum_to_one() {
        let projector = CashFlowProjector::default();
        for j in [0, 5, 20, 35] {
            let result = projector
                .project_from(j, &terms(), &covariates(), &default_model(), &prepay_model())
                .unwrap();
            let s = &result.summary;
            assert_abs_diff_eq!(
                s.default_probability + s.prepay_probability + s.maturity_probability,
                1.0,
                epsilon = 1e-12
            );
            assert!(s.total_expected_cash < s.contractual_cash);
        }
    }

    #[test]
    fn test_from_zero_matches_unconditioned() {
        let projector = CashFlowProjector::default();
        let full = projector
            .project(&terms(), &covariates(), &default_model(), &prepay_model())
            .unwrap();
        let from_zero = projector
            .project_from(0, &terms(), &covariates(), &default_model(), &prepay_model())
            .unwrap();

        assert_relative_eq!(full.total_expected_cash(), from_zero.total_expected_cash(), epsilon = 1e-12);
        assert_eq!(full.cashflows.len(), 36);
    }

    #[test]
    fn test_conditional_rescaling() {
        let projector = CashFlowProjector::default();
        let j = 12;
        let result = projector
            .project_from(j, &terms(), &covariates(), &default_model(), &prepay_model())
            .unwrap();

        assert_eq!(result.cashflows.len(), 36 - j);
        assert_eq!(result.cashflows.rows[0].installment as usize, j + 1);

        let sd = &result.default_curve;
        let sp = &result.prepay_curve;
        for row in &result.cashflows.rows {
            let i = row.installment as usize;
            let expected = 330.0 * (sd.survival_at(i) / sd.survival_at(j)) * (sp.survival_at(i) / sp.survival_at(j))
                + result.schedule.payoff_amount(i)
                    * (sd.survival_at(i) / sd.survival_at(j))
                    * sp.hazard_at(i)
                    * (sp.survival_at(i - 1) / sp.survival_at(j));
            assert_relative_eq!(row.expected_cash, expected, epsilon = 1e-10);
        }

        // Surviving to j makes the remaining installments more likely to pay
        let unconditioned = projector
            .project(&terms(), &covariates(), &default_model(), &prepay_model())
            .unwrap();
        let tail: f64 = unconditioned.cashflows.rows[j..].iter().map(|r| r.expected_cash).sum();
        assert!(result.total_expected_cash() > tail);
    }

    #[test]
    fn test_last_installment_only() {
        let result = CashFlowProjector::default()
            .project_from(35, &terms(), &covariates(), &default_model(), &prepay_model())
            .unwrap();
        assert_eq!(result.cashflows.len(), 1);
        assert_eq!(result.cashflows.rows[0].installment, 36);
    }

    #[test]
    fn test_conditioning_out_of_range() {
        let projector = CashFlowProjector::default();
        for j in [36, 40] {
            let err = projector
                .project_from(j, &terms(), &covariates(), &default_model(), &prepay_model())
                .unwrap_err();
            assert!(matches!(err, ProjectionError::InvalidConditioning { installment, .. } if installment == j));
        }
    }

    #[test]
    fn test_conditioning_on_zero_survival() {
        let projector = CashFlowProjector::default();
        let err = projector
            .project_from(3, &terms(), &CovariateVector::new(), &certain_at_first(), &never())
            .unwrap_err();
        assert!(matches!(err, ProjectionError::InvalidConditioning { installment: 3, .. }));

        let err = projector
            .project_from(1, &terms(), &CovariateVector::new(), &never(), &certain_at_first())
            .unwrap_err();
        assert!(matches!(err, ProjectionError::InvalidConditioning { installment: 1, .. }));
    }

    #[test]
    fn test_projection_is_repeatable() {
        let projector = CashFlowProjector::new(ProjectionConfig {
            parallel_hazards: true,
            ..Default::default()
        });
        let a = projector
            .project(&terms(), &covariates(), &default_model(), &prepay_model())
            .unwrap();
        let b = projector
            .project(&terms(), &covariates(), &default_model(), &prepay_model())
            .unwrap();

        assert_eq!(a.cashflows, b.cashflows);
        assert_eq!(a.schedule, b.schedule);
        assert_eq!(a.summary, b.summary);
    }

    #[test]
    fn test_errors_propagate_without_partial_results() {
        let projector = CashFlowProjector::default();

        // Model needs a covariate the loan does not carry
        let err = projector
            .project(&terms(), &CovariateVector::new(), &default_model(), &prepay_model())
            .unwrap_err();
        assert!(matches!(
            err,
            ProjectionError::HazardEvaluation { event: EventKind::Default, installment: 1, .. }
        ));

        let short_payment = LoanTerms::new(10_000.0, 250.0, 36).unwrap();
        let err = projector
            .project(&short_payment, &covariates(), &default_model(), &prepay_model())
            .unwrap_err();
        assert!(matches!(err, ProjectionError::RateSolve { .. }));
    }

    #[test]
    fn test_mismatched_components() {
        let schedule = crate::amortization::amortize(10, 1000.0, 120.0).unwrap();
        let short = SurvivalCurve::from_hazards(EventKind::Default, vec![0.0; 9]).unwrap();
        let full = SurvivalCurve::from_hazards(EventKind::Prepay, vec![0.0; 10]).unwrap();
        let err = expected_cash_from(0, &schedule, &short, &full, 0.0).unwrap_err();
        assert!(matches!(err, ProjectionError::LengthMismatch { .. }));
    }

    #[test]
    fn test_explicit_discount_rate() {
        let terms = LoanTerms::new(1000.0, 120.0, 10).unwrap();
        let projector = CashFlowProjector::new(ProjectionConfig {
            discount_rate: Some(0.0),
            ..Default::default()
        });
        let result = projector
            .project(&terms, &CovariateVector::new(), &never(), &never())
            .unwrap();
        assert_relative_eq!(result.summary.present_value, 1200.0, epsilon = 1e-12);
    }
}
