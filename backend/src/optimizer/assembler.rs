//! Result assembly
//!
//! Whatever produced the plan (model or simulator), the result is built the
//! same way: plan totals are copied as-is, savings are measured against the
//! minimum-only baseline and floored at zero. A baseline that hit the horizon
//! is flagged on the result rather than extrapolated.

use crate::core::money::round_cents;
use crate::models::plan::{OptimizationResult, PlanSource, RepaymentPlan};
use crate::models::strategy::Strategy;
use crate::planner::GeneratedPlan;
use crate::simulator::BaselineOutcome;

/// Per-run facts shared by every result of that run
#[derive(Debug, Clone)]
pub struct ResultAssembler {
    pub strategy: Strategy,
    pub extra_payment: f64,
    pub baseline: BaselineOutcome,
    pub input_fingerprint: String,
}

impl ResultAssembler {
    /// Result from the deterministic simulator, with a template explanation
    pub fn deterministic(&self, plan: RepaymentPlan) -> OptimizationResult {
        let explanation = template_explanation(self.strategy, &plan);
        self.assemble(plan, Some(explanation), PlanSource::Deterministic)
    }

    /// Result from an accepted model plan
    pub fn ai_generated(&self, generated: GeneratedPlan) -> OptimizationResult {
        let GeneratedPlan { attempt, validated } = generated;
        let explanation = validated
            .explanation
            .or_else(|| Some(template_explanation(self.strategy, &validated.plan)));
        self.assemble(
            validated.plan,
            explanation,
            PlanSource::AiGenerated { attempt },
        )
    }

    fn assemble(
        &self,
        plan: RepaymentPlan,
        explanation: Option<String>,
        source: PlanSource,
    ) -> OptimizationResult {
        let interest_saved = round_cents((self.baseline.total_interest - plan.total_interest).max(0.0));
        let months_saved = self.baseline.total_months.saturating_sub(plan.total_months);

        OptimizationResult {
            strategy: self.strategy,
            debt_free_date: plan.debt_free_date,
            total_months: plan.total_months,
            total_interest: plan.total_interest,
            total_paid: plan.total_paid,
            monthly_payment: plan.monthly_payment,
            extra_payment: round_cents(self.extra_payment),
            interest_saved,
            months_saved,
            baseline_converged: self.baseline.converged,
            monthly_schedule: plan.monthly_schedule,
            projections: plan.projections,
            payoff_order: plan.payoff_order,
            explanation,
            source,
            input_fingerprint: self.input_fingerprint.clone(),
        }
    }
}

/// Plain-language summary used when no model explanation is available
///
/// # Example
/// ```
/// use chrono::NaiveDate;
/// use debt_optimizer_core::{template_explanation, PayoffSimulator, DebtRecord, Strategy};
///
/// let start = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
/// let debts = vec![DebtRecord::with_id("d1", "Loan", 1200.0, 0.0, 100.0)];
/// let plan = PayoffSimulator::default()
///     .simulate(&debts, Strategy::Avalanche, 100.0, 0.0, start)
///     .unwrap();
///
/// assert_eq!(
///     template_explanation(Strategy::Avalanche, &plan),
///     "Your avalanche plan eliminates your debts in 12 months with $0.00 in total \
///      interest. Stay consistent with your $100.00 monthly payments."
/// );
/// ```
pub fn template_explanation(strategy: Strategy, plan: &RepaymentPlan) -> String {
    format!(
        "Your {} plan eliminates your debts in {} months with ${} in total interest. \
         Stay consistent with your ${} monthly payments.",
        strategy,
        plan.total_months,
        format_currency(plan.total_interest),
        format_currency(plan.monthly_payment),
    )
}

/// `1234567.5` -> `1,234,567.50`
fn format_currency(value: f64) -> String {
    let fixed = format!("{:.2}", round_cents(value).abs());
    let (whole, cents) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if value < 0.0 && round_cents(value) != 0.0 { "-" } else { "" };
    format!("{}{}.{}", sign, grouped, cents)
}
