//! What-if scenarios
//!
//! Re-runs the deterministic simulator with the caller's adjustments applied
//! and reports the difference against the unadjusted plan. Scenarios never
//! consult the model, so they are cheap enough to call on every slider move.

use super::request::OptimizationRequest;
use crate::core::money::round_cents;
use crate::error::OptimizationError;
use crate::models::debt::DebtRecord;
use crate::models::plan::{PlanProjection, RepaymentPlan};
use crate::models::strategy::Strategy;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One-time payment against a single debt before the first month
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LumpSum {
    pub debt_id: String,
    pub amount: f64,
}

/// Changes to apply on top of an `OptimizationRequest`
///
/// Every field is optional; an empty adjustment reproduces the current plan.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioAdjustments {
    /// Replace the resolved strategy
    pub strategy: Option<Strategy>,

    /// Replace the resolved extra payment
    pub extra_payment: Option<f64>,

    /// Added to the monthly budget (may be negative)
    pub income_change: Option<f64>,

    pub lump_sum: Option<LumpSum>,

    /// New APR per debt id
    pub rate_overrides: BTreeMap<String, f64>,
}

/// Inputs after adjustments are applied
#[derive(Debug, Clone)]
pub(crate) struct AdjustedInputs {
    pub debts: Vec<DebtRecord>,
    pub strategy: Strategy,
    pub monthly_budget: f64,
    pub extra_payment: f64,
}

impl ScenarioAdjustments {
    /// Apply to `request`, whose strategy and extra payment are already resolved
    pub(crate) fn apply(
        &self,
        request: &OptimizationRequest,
        strategy: Strategy,
        extra_payment: f64,
    ) -> Result<AdjustedInputs, OptimizationError> {
        let known = |id: &str| request.debts.iter().any(|d| d.id == id);

        if let Some(id) = self.rate_overrides.keys().find(|id| !known(id.as_str())) {
            return Err(OptimizationError::UnknownDebtId(id.clone()));
        }
        if let Some(lump) = &self.lump_sum {
            if !known(&lump.debt_id) {
                return Err(OptimizationError::UnknownDebtId(lump.debt_id.clone()));
            }
            if !lump.amount.is_finite() || lump.amount < 0.0 {
                return Err(OptimizationError::InvalidDebt {
                    id: lump.debt_id.clone(),
                    reason: "lump sum must be a non-negative number".to_string(),
                });
            }
        }

        let mut debts = request.debts.clone();
        for debt in &mut debts {
            if let Some(apr) = self.rate_overrides.get(&debt.id) {
                debt.apr = *apr;
            }
            if let Some(lump) = self.lump_sum.as_ref().filter(|l| l.debt_id == debt.id) {
                debt.balance = (debt.balance - lump.amount).max(0.0);
            }
            debt.validate()?;
        }

        let monthly_budget = request.monthly_budget + self.income_change.unwrap_or(0.0);
        if !monthly_budget.is_finite() || monthly_budget <= 0.0 {
            return Err(OptimizationError::InvalidBudget(monthly_budget));
        }

        let extra_payment = self.extra_payment.unwrap_or(extra_payment);
        if !extra_payment.is_finite() || extra_payment < 0.0 {
            return Err(OptimizationError::InvalidExtraPayment(extra_payment));
        }

        Ok(AdjustedInputs {
            debts,
            strategy: self.strategy.unwrap_or(strategy),
            monthly_budget,
            extra_payment,
        })
    }
}

/// Headline numbers of one side of a comparison
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioOutcome {
    pub strategy: Strategy,
    pub debt_free_date: NaiveDate,
    pub total_months: u32,
    pub total_interest: f64,
    pub total_paid: f64,
}

impl ScenarioOutcome {
    fn from_plan(strategy: Strategy, plan: &RepaymentPlan) -> Self {
        Self {
            strategy,
            debt_free_date: plan.debt_free_date,
            total_months: plan.total_months,
            total_interest: plan.total_interest,
            total_paid: plan.total_paid,
        }
    }
}

/// Current plan versus the adjusted one
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioComparison {
    pub current: ScenarioOutcome,
    pub simulated: ScenarioOutcome,
    /// Positive when the scenario saves interest
    pub interest_difference: f64,
    /// Positive when the scenario finishes earlier
    pub months_difference: i64,
    /// Projections of the simulated plan
    pub projections: Vec<PlanProjection>,
}

impl ScenarioComparison {
    pub(crate) fn new(
        current_strategy: Strategy,
        current: &RepaymentPlan,
        simulated_strategy: Strategy,
        simulated: RepaymentPlan,
    ) -> Self {
        Self {
            current: ScenarioOutcome::from_plan(current_strategy, current),
            simulated: ScenarioOutcome::from_plan(simulated_strategy, &simulated),
            interest_difference: round_cents(current.total_interest - simulated.total_interest),
            months_difference: current.total_months as i64 - simulated.total_months as i64,
            projections: simulated.projections,
        }
    }
}
