//! Minimum-only baseline
//!
//! Pays exactly each debt's minimum every month with no acceleration and keeps
//! no schedule. Exists only to price "interest saved" and "months saved".
//!
//! CRITICAL: Uses the same accrual and payment-split primitives as the payoff
//! simulator; a different formula would make the comparison meaningless.

use crate::config::SimulationConfig;
use crate::core::money::{monthly_interest, round_cents, split_payment};
use crate::models::debt::DebtRecord;
use serde::{Deserialize, Serialize};

/// Result of a minimum-only run
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BaselineOutcome {
    pub total_months: u32,
    pub total_interest: f64,
    /// False when the horizon was hit (minimums never retire the debt)
    pub converged: bool,
}

/// Minimum-only calculator
#[derive(Debug, Clone, Default)]
pub struct MinimumOnlyBaseline {
    config: SimulationConfig,
}

impl MinimumOnlyBaseline {
    pub fn new(config: SimulationConfig) -> Self {
        Self { config }
    }

    /// Months and interest needed when paying only minimums
    ///
    /// # Example
    /// ```
    /// use debt_optimizer_core::{DebtRecord, MinimumOnlyBaseline};
    ///
    /// let debts = vec![DebtRecord::with_id("d1", "Loan", 1000.0, 0.0, 100.0)];
    /// let outcome = MinimumOnlyBaseline::default().calculate(&debts);
    /// assert_eq!(outcome.total_months, 10);
    /// assert_eq!(outcome.total_interest, 0.0);
    /// assert!(outcome.converged);
    /// ```
    pub fn calculate(&self, debts: &[DebtRecord]) -> BaselineOutcome {
        let epsilon = self.config.balance_epsilon;
        let mut balances: Vec<f64> = debts.iter().map(|d| d.balance).collect();
        // Unpaid interest already folded into each balance
        let mut interest_due = vec![0.0; debts.len()];
        let mut total_interest = 0.0;
        let mut month = 0;

        while balances.iter().any(|b| *b > epsilon) && month < self.config.max_months {
            month += 1;

            for ((debt, balance), due) in debts
                .iter()
                .zip(balances.iter_mut())
                .zip(interest_due.iter_mut())
            {
                if *balance <= epsilon {
                    continue;
                }
                let interest = monthly_interest(*balance, debt.apr);
                let owed = *balance + interest;
                let payment = debt.minimum_payment.min(owed);
                let (interest_paid, _) = split_payment(payment, *due + interest);

                total_interest += interest_paid;
                *due += interest - interest_paid;
                *balance = (owed - payment).max(0.0);
            }
        }

        BaselineOutcome {
            total_months: month,
            total_interest: round_cents(total_interest),
            converged: balances.iter().all(|b| *b <= epsilon),
        }
    }
}
