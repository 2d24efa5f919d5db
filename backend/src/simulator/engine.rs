//! Payoff Simulator Engine
//!
//! Turns (debts, strategy, monthly payment, start date) into an exact
//! month-by-month schedule.
//!
//! # Architecture
//!
//! ```text
//! For each month m (until every balance <= epsilon, at most max_months):
//! 1. Accrue interest on every open debt (balance x APR / 12 / 100)
//! 2. Pay minimums across all open debts in priority order
//!    (capped at what is owed; stops when the budget runs out)
//! 3. Send any remaining budget to the highest-priority open debt
//! 4. Record one schedule line per paid debt, mark payoffs
//! 5. Advance the calendar
//! ```
//!
//! # Critical Invariants
//!
//! 1. **Determinism**: same inputs produce an identical schedule
//! 2. **No overpayment**: a debt never receives more than balance + interest
//! 3. **Single acceleration**: at most one debt is paid beyond its minimum per month
//! 4. **Termination**: never more than `max_months` iterations
//! 5. **Summary from schedule**: totals are sums of the recorded lines
//! 6. **Conservation**: capitalized interest is booked as interest when it is
//!    finally paid, so line principal sums to the starting balances
//!
//! # Example
//!
//! ```rust
//! use chrono::NaiveDate;
//! use debt_optimizer_core::{DebtRecord, PayoffSimulator, SimulationConfig, Strategy};
//!
//! let debts = vec![
//!     DebtRecord::with_id("card", "Card", 1000.0, 20.0, 50.0),
//!     DebtRecord::with_id("loan", "Loan", 2000.0, 6.0, 80.0),
//! ];
//! let start = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
//!
//! let simulator = PayoffSimulator::new(SimulationConfig::default());
//! let plan = simulator
//!     .simulate(&debts, Strategy::Avalanche, 300.0, 0.0, start)
//!     .unwrap();
//!
//! assert_eq!(plan.payoff_order.len(), 2);
//! assert_eq!(plan.payoff_order[0].debt_id, "card");
//! assert!(plan.final_remaining() <= 0.01);
//! ```

use crate::config::SimulationConfig;
use crate::core::calendar::MonthCalendar;
use crate::core::money::{monthly_interest, round_cents, split_payment};
use crate::models::debt::DebtRecord;
use crate::models::plan::{
    DebtPayoffInfo, MonthlyBreakdown, PaymentScheduleItem, PlanProjection, RepaymentPlan,
};
use crate::models::strategy::Strategy;
use chrono::NaiveDate;
use thiserror::Error;

/// Simulation failures
#[derive(Debug, Error, PartialEq)]
pub enum SimulationError {
    /// Iteration cap reached with balances still open
    #[error("Plan does not converge within {months} months ({remaining:.2} still owed)")]
    NonConvergent { months: u32, remaining: f64 },
}

/// Running state of one debt during a simulation
#[derive(Debug, Clone)]
struct DebtLedger<'a> {
    debt: &'a DebtRecord,
    balance: f64,
    /// Accrued interest not yet paid; already included in `balance`
    interest_due: f64,
    interest_paid: f64,
    total_paid: f64,
    open: bool,
}

impl<'a> DebtLedger<'a> {
    fn new(debt: &'a DebtRecord, epsilon: f64) -> Self {
        Self {
            debt,
            balance: debt.balance,
            interest_due: 0.0,
            interest_paid: 0.0,
            total_paid: 0.0,
            open: debt.balance > epsilon,
        }
    }

    fn payoff_info(&self, month: u32, date: NaiveDate) -> DebtPayoffInfo {
        DebtPayoffInfo {
            debt_id: self.debt.id.clone(),
            debt_name: self.debt.name.clone(),
            payoff_month: month,
            payoff_date: date,
            total_interest_paid: self.interest_paid,
            total_paid: self.total_paid,
        }
    }
}

/// What one debt received in the current month
#[derive(Debug, Clone, Copy, Default)]
struct MonthPayment {
    interest_accrued: f64,
    paid: f64,
}

/// Deterministic month-by-month payoff simulator
///
/// Stateless apart from its configuration; safe to share across threads.
#[derive(Debug, Clone, Default)]
pub struct PayoffSimulator {
    config: SimulationConfig,
}

impl PayoffSimulator {
    pub fn new(config: SimulationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Order `debts` by `strategy` and simulate with `monthly_budget + extra_payment`
    pub fn simulate(
        &self,
        debts: &[DebtRecord],
        strategy: Strategy,
        monthly_budget: f64,
        extra_payment: f64,
        start: NaiveDate,
    ) -> Result<RepaymentPlan, SimulationError> {
        let ordered = strategy.order(debts);
        self.simulate_ordered(&ordered, monthly_budget + extra_payment, start)
    }

    /// Simulate debts that are already in priority order
    ///
    /// # Returns
    ///
    /// * `Ok(RepaymentPlan)` - every balance reached epsilon; values rounded to cents
    /// * `Err(SimulationError::NonConvergent)` - the horizon was exhausted first
    pub fn simulate_ordered(
        &self,
        ordered: &[DebtRecord],
        monthly_payment: f64,
        start: NaiveDate,
    ) -> Result<RepaymentPlan, SimulationError> {
        let epsilon = self.config.balance_epsilon;
        let mut calendar = MonthCalendar::new(start);
        let start = calendar.start();

        let mut ledgers: Vec<DebtLedger> = ordered
            .iter()
            .map(|debt| DebtLedger::new(debt, epsilon))
            .collect();

        // Debts that are already clear are reported up front so coverage holds
        let mut payoff_order: Vec<DebtPayoffInfo> = ledgers
            .iter()
            .filter(|ledger| !ledger.open)
            .map(|ledger| ledger.payoff_info(0, start))
            .collect();

        let mut schedule: Vec<MonthlyBreakdown> = Vec::new();

        while ledgers.iter().any(|l| l.open) {
            if calendar.month() >= self.config.max_months {
                let remaining: f64 = ledgers.iter().filter(|l| l.open).map(|l| l.balance).sum();
                tracing::warn!(
                    months = self.config.max_months,
                    remaining,
                    "payoff simulation hit its horizon"
                );
                return Err(SimulationError::NonConvergent {
                    months: self.config.max_months,
                    remaining: round_cents(remaining),
                });
            }

            let (month, date) = calendar.advance();
            let payments = Self::allocate_month(&mut ledgers, monthly_payment, epsilon);

            let mut items = Vec::new();
            for (ledger, payment) in ledgers.iter_mut().zip(&payments) {
                // Interest carried from short months is settled before principal
                let interest_owed = ledger.interest_due + payment.interest_accrued;
                let (interest, principal) = split_payment(payment.paid, interest_owed);
                ledger.interest_due = interest_owed - interest;

                if payment.paid <= 0.0 {
                    continue;
                }

                ledger.interest_paid += interest;
                ledger.total_paid += payment.paid;

                let is_payoff = ledger.open && ledger.balance <= epsilon;
                if is_payoff {
                    ledger.open = false;
                    ledger.balance = 0.0;
                    ledger.interest_due = 0.0;
                    payoff_order.push(ledger.payoff_info(month, date));
                }

                items.push(PaymentScheduleItem {
                    month,
                    date,
                    debt_id: ledger.debt.id.clone(),
                    debt_name: ledger.debt.name.clone(),
                    payment_amount: payment.paid,
                    principal,
                    interest,
                    remaining_balance: ledger.balance.max(0.0),
                    is_payoff_month: is_payoff,
                });
            }

            schedule.push(MonthlyBreakdown {
                month,
                date,
                total_payment: items.iter().map(|i| i.payment_amount).sum(),
                total_remaining: ledgers
                    .iter()
                    .filter(|l| l.open)
                    .map(|l| l.balance.max(0.0))
                    .sum(),
                payments: items,
            });
        }

        Ok(Self::summarize(schedule, payoff_order, monthly_payment, start).rounded())
    }

    /// Accrue interest and distribute one month's payment across open debts
    ///
    /// Mutates balances; returns what each ledger accrued and received.
    fn allocate_month(
        ledgers: &mut [DebtLedger],
        monthly_payment: f64,
        epsilon: f64,
    ) -> Vec<MonthPayment> {
        let mut payments = vec![MonthPayment::default(); ledgers.len()];

        // 1. Accrue
        for (ledger, payment) in ledgers.iter_mut().zip(payments.iter_mut()) {
            if ledger.open {
                payment.interest_accrued = monthly_interest(ledger.balance, ledger.debt.apr);
                ledger.balance += payment.interest_accrued;
            }
        }

        // 2. Minimums in priority order until the budget runs out
        let mut budget = monthly_payment;
        for (ledger, payment) in ledgers.iter_mut().zip(payments.iter_mut()) {
            if !ledger.open || budget <= 0.0 {
                continue;
            }
            let due = ledger.debt.minimum_payment.min(ledger.balance);
            let paid = due.min(budget);
            ledger.balance -= paid;
            payment.paid += paid;
            budget -= paid;
        }

        // 3. Acceleration: everything left goes to one priority debt
        if budget > 0.0 {
            if let Some((ledger, payment)) = ledgers
                .iter_mut()
                .zip(payments.iter_mut())
                .find(|(ledger, _)| ledger.open && ledger.balance > epsilon)
            {
                let extra = budget.min(ledger.balance);
                ledger.balance -= extra;
                payment.paid += extra;
            }
        }

        payments
    }

    /// Build summary metrics by summing the recorded schedule
    fn summarize(
        schedule: Vec<MonthlyBreakdown>,
        payoff_order: Vec<DebtPayoffInfo>,
        monthly_payment: f64,
        start: NaiveDate,
    ) -> RepaymentPlan {
        let total_interest = schedule
            .iter()
            .flat_map(|m| &m.payments)
            .map(|p| p.interest)
            .sum();
        let total_paid = schedule
            .iter()
            .flat_map(|m| &m.payments)
            .map(|p| p.payment_amount)
            .sum();
        let debt_free_date = schedule.last().map(|m| m.date).unwrap_or(start);
        let projections = PlanProjection::from_schedule(&schedule);

        RepaymentPlan {
            debt_free_date,
            total_months: schedule.len() as u32,
            total_interest,
            total_paid,
            monthly_payment,
            monthly_schedule: schedule,
            projections,
            payoff_order,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn start() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, 1).unwrap()
    }

    #[test]
    fn test_no_debts_is_zero_length_plan() {
        let plan = PayoffSimulator::default()
            .simulate_ordered(&[], 500.0, start())
            .unwrap();
        assert_eq!(plan.total_months, 0);
        assert_eq!(plan.total_paid, 0.0);
        assert_eq!(plan.debt_free_date, start());
        assert!(plan.monthly_schedule.is_empty());
    }

    #[test]
    fn test_zero_apr_single_debt_exact_months() {
        let debts = vec![DebtRecord::with_id("d1", "Loan", 1000.0, 0.0, 100.0)];
        let plan = PayoffSimulator::default()
            .simulate_ordered(&debts, 250.0, start())
            .unwrap();

        // 250, 250, 250, 250 = 1000
        assert_eq!(plan.total_months, 4);
        assert_eq!(plan.total_interest, 0.0);
        assert_eq!(plan.total_paid, 1000.0);
        assert_eq!(plan.debt_free_date, NaiveDate::from_ymd_opt(2026, 4, 1).unwrap());
    }

    #[test]
    fn test_payment_never_exceeds_amount_owed() {
        let debts = vec![DebtRecord::with_id("d1", "Card", 120.0, 12.0, 50.0)];
        let plan = PayoffSimulator::default()
            .simulate_ordered(&debts, 1000.0, start())
            .unwrap();

        // 120 + 1.20 interest, paid in one month
        assert_eq!(plan.total_months, 1);
        assert_eq!(plan.total_paid, 121.2);
        assert_eq!(plan.monthly_schedule[0].payments[0].interest, 1.2);
        assert!(plan.monthly_schedule[0].payments[0].is_payoff_month);
    }

    #[test]
    fn test_already_clear_debt_reported_at_month_zero() {
        let debts = vec![
            DebtRecord::with_id("done", "Closed", 0.0, 10.0, 25.0),
            DebtRecord::with_id("open", "Open", 100.0, 0.0, 25.0),
        ];
        let plan = PayoffSimulator::default()
            .simulate_ordered(&debts, 100.0, start())
            .unwrap();

        assert_eq!(plan.payoff_order[0].debt_id, "done");
        assert_eq!(plan.payoff_order[0].payoff_month, 0);
        assert!(plan
            .monthly_schedule
            .iter()
            .flat_map(|m| &m.payments)
            .all(|p| p.debt_id != "done"));
    }

    #[test]
    fn test_capitalized_interest_is_booked_as_interest() {
        // Budget 100 only covers the card minimum; the loan's interest
        // capitalizes until the card is gone
        let debts = vec![
            DebtRecord::with_id("card", "Card", 500.0, 24.0, 100.0),
            DebtRecord::with_id("loan", "Loan", 1000.0, 12.0, 50.0),
        ];
        let plan = PayoffSimulator::default()
            .simulate(&debts, Strategy::Avalanche, 100.0, 0.0, start())
            .unwrap();

        let principal: f64 = plan
            .monthly_schedule
            .iter()
            .flat_map(|m| &m.payments)
            .map(|p| p.principal)
            .sum();

        assert_eq!(plan.total_months, 17);
        assert!((plan.total_paid - 1652.06).abs() < 0.011);
        assert!((plan.total_interest - 152.06).abs() < 0.011);
        assert!((principal - 1500.0).abs() < 0.05);
        assert!((plan.total_paid - plan.total_interest - 1500.0).abs() < 0.03);
    }

    #[test]
    fn test_horizon_cap_reports_non_convergence() {
        let config = SimulationConfig {
            max_months: 12,
            ..SimulationConfig::default()
        };
        let debts = vec![DebtRecord::with_id("d1", "Loan", 10_000.0, 0.0, 100.0)];
        let err = PayoffSimulator::new(config)
            .simulate_ordered(&debts, 100.0, start())
            .unwrap_err();

        assert_eq!(
            err,
            SimulationError::NonConvergent {
                months: 12,
                remaining: 8800.0
            }
        );
    }
}
