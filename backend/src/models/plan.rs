//! Plan output model
//!
//! `RepaymentPlan` is the schedule-level output shared by both plan sources
//! (deterministic simulator and validated model candidate).
//! `OptimizationResult` wraps it with strategy, savings and explanation and is
//! what the caller persists.
//!
//! # Critical Invariants
//!
//! 1. Projections are derived from the schedule, never computed separately
//! 2. `payoff_order` holds exactly one entry per input debt
//! 3. No `remaining_balance` or `total_remaining` is negative

use crate::core::money::round_cents;
use crate::models::strategy::Strategy;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One debt's payment within one month
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentScheduleItem {
    /// 1-based month number
    pub month: u32,
    /// First of the month
    pub date: NaiveDate,
    pub debt_id: String,
    pub debt_name: String,
    pub payment_amount: f64,
    pub principal: f64,
    pub interest: f64,
    pub remaining_balance: f64,
    /// True exactly once per debt, on the month its balance first clears
    pub is_payoff_month: bool,
}

/// All payments for one month
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyBreakdown {
    pub month: u32,
    pub date: NaiveDate,
    pub total_payment: f64,
    pub payments: Vec<PaymentScheduleItem>,
    /// Sum of all debts' remaining balances after this month
    pub total_remaining: f64,
}

/// Per-month cumulative totals for charting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanProjection {
    pub month: u32,
    pub date: NaiveDate,
    pub total_remaining: f64,
    pub cumulative_interest_paid: f64,
    pub cumulative_principal_paid: f64,
}

impl PlanProjection {
    /// Derive running totals from a schedule
    pub fn from_schedule(schedule: &[MonthlyBreakdown]) -> Vec<PlanProjection> {
        let mut cumulative_interest = 0.0;
        let mut cumulative_principal = 0.0;

        schedule
            .iter()
            .map(|breakdown| {
                cumulative_interest += breakdown.payments.iter().map(|p| p.interest).sum::<f64>();
                cumulative_principal += breakdown.payments.iter().map(|p| p.principal).sum::<f64>();
                PlanProjection {
                    month: breakdown.month,
                    date: breakdown.date,
                    total_remaining: breakdown.total_remaining,
                    cumulative_interest_paid: cumulative_interest,
                    cumulative_principal_paid: cumulative_principal,
                }
            })
            .collect()
    }
}

/// When and at what cost a single debt is paid off
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebtPayoffInfo {
    pub debt_id: String,
    pub debt_name: String,
    /// Month the debt clears (0 = already clear at start)
    pub payoff_month: u32,
    pub payoff_date: NaiveDate,
    /// Interest paid on this debt up to and including its payoff month
    pub total_interest_paid: f64,
    /// Everything paid on this debt up to and including its payoff month
    pub total_paid: f64,
}

/// A complete month-by-month schedule with summary metrics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepaymentPlan {
    pub debt_free_date: NaiveDate,
    pub total_months: u32,
    pub total_interest: f64,
    pub total_paid: f64,
    pub monthly_payment: f64,
    pub monthly_schedule: Vec<MonthlyBreakdown>,
    pub projections: Vec<PlanProjection>,
    pub payoff_order: Vec<DebtPayoffInfo>,
}

impl RepaymentPlan {
    /// Round every currency value to cents
    ///
    /// Called once, at the output boundary.
    pub fn rounded(mut self) -> Self {
        self.total_interest = round_cents(self.total_interest);
        self.total_paid = round_cents(self.total_paid);
        self.monthly_payment = round_cents(self.monthly_payment);

        for breakdown in &mut self.monthly_schedule {
            breakdown.total_payment = round_cents(breakdown.total_payment);
            breakdown.total_remaining = round_cents(breakdown.total_remaining);
            for item in &mut breakdown.payments {
                item.payment_amount = round_cents(item.payment_amount);
                item.principal = round_cents(item.principal);
                item.interest = round_cents(item.interest);
                item.remaining_balance = round_cents(item.remaining_balance);
            }
        }
        for projection in &mut self.projections {
            projection.total_remaining = round_cents(projection.total_remaining);
            projection.cumulative_interest_paid = round_cents(projection.cumulative_interest_paid);
            projection.cumulative_principal_paid =
                round_cents(projection.cumulative_principal_paid);
        }
        for payoff in &mut self.payoff_order {
            payoff.total_interest_paid = round_cents(payoff.total_interest_paid);
            payoff.total_paid = round_cents(payoff.total_paid);
        }
        self
    }

    /// `total_remaining` of the final month (0 for an empty schedule)
    pub fn final_remaining(&self) -> f64 {
        self.monthly_schedule
            .last()
            .map(|m| m.total_remaining)
            .unwrap_or(0.0)
    }
}

/// Which component produced the accepted schedule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PlanSource {
    /// Model candidate accepted by the validator on this attempt
    AiGenerated { attempt: u32 },
    /// Deterministic payoff simulator
    Deterministic,
}

/// Top-level output of one optimization run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationResult {
    pub strategy: Strategy,
    pub debt_free_date: NaiveDate,
    pub total_months: u32,
    pub total_interest: f64,
    pub total_paid: f64,
    /// Budget plus extra payment applied every month
    pub monthly_payment: f64,
    pub extra_payment: f64,
    /// Interest avoided compared with paying only minimums (never negative)
    pub interest_saved: f64,
    /// Months avoided compared with paying only minimums
    pub months_saved: u32,
    /// False when paying only minimums never clears the debts; the baseline
    /// then stops at the horizon and both savings figures are lower bounds
    pub baseline_converged: bool,
    pub monthly_schedule: Vec<MonthlyBreakdown>,
    pub projections: Vec<PlanProjection>,
    pub payoff_order: Vec<DebtPayoffInfo>,
    pub explanation: Option<String>,
    pub source: PlanSource,
    /// SHA-256 of the inputs this plan was computed from
    pub input_fingerprint: String,
}
