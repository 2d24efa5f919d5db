//! Debt model
//!
//! Normalized view of one debt as supplied by the caller. The engine treats it
//! as immutable input for the duration of a run.
//!
//! CRITICAL: Balances are currency units with 2-decimal precision, APR is a
//! percentage per year (0-100).

use crate::error::OptimizationError;
use serde::{Deserialize, Serialize};

/// A single debt to be repaid
///
/// # Example
/// ```
/// use debt_optimizer_core::DebtRecord;
///
/// let card = DebtRecord::new("Visa", 1_000.0, 19.99, 35.0);
/// assert!(card.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebtRecord {
    /// Opaque unique identifier
    pub id: String,

    /// Display name (creditor)
    pub name: String,

    /// Outstanding balance
    pub balance: f64,

    /// Annual percentage rate, percent per year
    pub apr: f64,

    /// Minimum required monthly payment
    pub minimum_payment: f64,
}

impl DebtRecord {
    /// Create a debt with a fresh UUID id
    pub fn new(name: impl Into<String>, balance: f64, apr: f64, minimum_payment: f64) -> Self {
        Self::with_id(
            uuid::Uuid::new_v4().to_string(),
            name,
            balance,
            apr,
            minimum_payment,
        )
    }

    /// Create a debt with a caller-supplied id
    pub fn with_id(
        id: impl Into<String>,
        name: impl Into<String>,
        balance: f64,
        apr: f64,
        minimum_payment: f64,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            balance,
            apr,
            minimum_payment,
        }
    }

    /// Check numeric fields are in range
    pub fn validate(&self) -> Result<(), OptimizationError> {
        let invalid = |reason: &str| OptimizationError::InvalidDebt {
            id: self.id.clone(),
            reason: reason.to_string(),
        };

        if self.id.trim().is_empty() {
            return Err(invalid("id must not be empty"));
        }
        if !self.balance.is_finite() || self.balance < 0.0 {
            return Err(invalid("balance must be a non-negative number"));
        }
        if !self.apr.is_finite() || !(0.0..=100.0).contains(&self.apr) {
            return Err(invalid("apr must be between 0 and 100"));
        }
        if !self.minimum_payment.is_finite() || self.minimum_payment < 0.0 {
            return Err(invalid("minimum_payment must be a non-negative number"));
        }
        Ok(())
    }
}
