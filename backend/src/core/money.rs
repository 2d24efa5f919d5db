//! Money arithmetic
//!
//! Balances are carried as unrounded `f64` through the whole simulation and
//! rounded to cents only when a plan is handed out. Rounding mid-computation
//! compounds error across hundreds of months.
//!
//! # Critical Invariants
//!
//! 1. `monthly_interest` is the ONLY accrual formula. The simulator and the
//!    minimum-only baseline both call it, otherwise savings comparisons drift.
//! 2. Payments are applied interest-first (`split_payment`).

/// Balance at or below which a debt counts as paid off.
pub const BALANCE_EPSILON: f64 = 0.01;

/// Round to 2 decimal places (half away from zero).
///
/// # Example
/// ```
/// use debt_optimizer_core::core::round_cents;
///
/// assert_eq!(round_cents(10.006), 10.01);
/// assert_eq!(round_cents(-0.001), 0.0);
/// ```
pub fn round_cents(value: f64) -> f64 {
    let rounded = (value * 100.0).round() / 100.0;
    // Normalize -0.0 so serialized output never shows "-0.0"
    if rounded == 0.0 {
        0.0
    } else {
        rounded
    }
}

/// Interest accrued on `balance` for one month at `apr` percent per year.
///
/// Simple monthly rate `apr / 12 / 100`, no daily compounding.
///
/// # Example
/// ```
/// use debt_optimizer_core::core::monthly_interest;
///
/// // 1,200 at 12% APR accrues 12.00 per month
/// assert!((monthly_interest(1200.0, 12.0) - 12.0).abs() < 1e-9);
/// ```
pub fn monthly_interest(balance: f64, apr: f64) -> f64 {
    balance * apr / 12.0 / 100.0
}

/// Split a payment into its `(interest, principal)` parts.
///
/// Interest is covered first; whatever remains reduces principal. When the
/// payment does not cover the accrued interest, principal is zero and the
/// uncovered interest stays on the balance.
pub fn split_payment(payment: f64, interest: f64) -> (f64, f64) {
    let interest_part = payment.min(interest).max(0.0);
    (interest_part, (payment - interest_part).max(0.0))
}
