//! Optimization request
//!
//! Input errors are caught here, before any simulation runs.

use crate::advisor::context::UserContext;
use crate::core::calendar::{first_of_month, first_of_next_month};
use crate::error::OptimizationError;
use crate::models::debt::DebtRecord;
use crate::models::strategy::{Strategy, StrategyPreference};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::json;
use sha2::{Digest, Sha256};
use std::collections::HashSet;

/// One optimization run's input
///
/// # Example
/// ```
/// use debt_optimizer_core::{DebtRecord, OptimizationRequest, StrategyPreference};
///
/// let request = OptimizationRequest::new(
///     vec![DebtRecord::with_id("card", "Card", 1000.0, 20.0, 50.0)],
///     300.0,
/// )
/// .with_strategy(StrategyPreference::Snowball)
/// .with_extra_payment(25.0);
///
/// assert!(request.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationRequest {
    pub debts: Vec<DebtRecord>,

    /// Total available for debt payments each month
    pub monthly_budget: f64,

    /// Added on top of the budget; `None` lets the advisor suggest one
    #[serde(default)]
    pub extra_payment: Option<f64>,

    /// Defaults to the first of next month
    #[serde(default)]
    pub start_date: Option<NaiveDate>,

    #[serde(default)]
    pub strategy: StrategyPreference,

    #[serde(default)]
    pub user_context: UserContext,
}

impl OptimizationRequest {
    pub fn new(debts: Vec<DebtRecord>, monthly_budget: f64) -> Self {
        Self {
            debts,
            monthly_budget,
            extra_payment: None,
            start_date: None,
            strategy: StrategyPreference::default(),
            user_context: UserContext::default(),
        }
    }

    pub fn with_strategy(mut self, strategy: StrategyPreference) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_extra_payment(mut self, extra_payment: f64) -> Self {
        self.extra_payment = Some(extra_payment);
        self
    }

    pub fn with_start_date(mut self, start_date: NaiveDate) -> Self {
        self.start_date = Some(start_date);
        self
    }

    pub fn with_user_context(mut self, user_context: UserContext) -> Self {
        self.user_context = user_context;
        self
    }

    /// Reject input errors
    pub fn validate(&self) -> Result<(), OptimizationError> {
        if self.debts.is_empty() {
            return Err(OptimizationError::NoDebts);
        }
        if !self.monthly_budget.is_finite() || self.monthly_budget <= 0.0 {
            return Err(OptimizationError::InvalidBudget(self.monthly_budget));
        }
        if let Some(extra) = self.extra_payment {
            if !extra.is_finite() || extra < 0.0 {
                return Err(OptimizationError::InvalidExtraPayment(extra));
            }
        }

        let mut seen = HashSet::new();
        for debt in &self.debts {
            debt.validate()?;
            if !seen.insert(debt.id.as_str()) {
                return Err(OptimizationError::DuplicateDebtId(debt.id.clone()));
            }
        }
        Ok(())
    }

    /// Start date normalized to the first of its month
    pub fn resolved_start_date(&self, today: NaiveDate) -> NaiveDate {
        match self.start_date {
            Some(date) => first_of_month(date),
            None => first_of_next_month(today),
        }
    }

    /// SHA-256 over the canonical JSON of everything that shapes the plan
    ///
    /// Keys are sorted, so field order never changes the digest.
    pub fn fingerprint(&self, strategy: Strategy, extra_payment: f64, start: NaiveDate) -> String {
        let canonical = json!({
            "debts": self.debts,
            "monthly_budget": self.monthly_budget,
            "extra_payment": extra_payment,
            "start_date": start,
            "strategy": strategy,
        });

        let mut hasher = Sha256::new();
        hasher.update(canonical.to_string().as_bytes());
        format!("{:x}", hasher.finalize())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> OptimizationRequest {
        OptimizationRequest::new(
            vec![
                DebtRecord::with_id("a", "Card", 500.0, 22.0, 25.0),
                DebtRecord::with_id("b", "Loan", 2000.0, 10.0, 60.0),
            ],
            400.0,
        )
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_empty_debts_rejected() {
        let request = OptimizationRequest::new(Vec::new(), 100.0);
        assert_eq!(request.validate(), Err(OptimizationError::NoDebts));
    }

    #[test]
    fn test_non_positive_budget_rejected() {
        let mut request = request();
        request.monthly_budget = 0.0;
        assert_eq!(request.validate(), Err(OptimizationError::InvalidBudget(0.0)));
    }

    #[test]
    fn test_negative_extra_rejected() {
        let request = request().with_extra_payment(-1.0);
        assert_eq!(
            request.validate(),
            Err(OptimizationError::InvalidExtraPayment(-1.0))
        );
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let mut request = request();
        request.debts[1].id = "a".to_string();
        assert_eq!(
            request.validate(),
            Err(OptimizationError::DuplicateDebtId("a".to_string()))
        );
    }

    #[test]
    fn test_start_date_defaults_and_normalizes() {
        let today = date(2026, 10, 18);
        assert_eq!(request().resolved_start_date(today), date(2026, 11, 1));
        assert_eq!(
            request()
                .with_start_date(date(2027, 3, 15))
                .resolved_start_date(today),
            date(2027, 3, 1)
        );
    }

    #[test]
    fn test_fingerprint_tracks_debt_changes() {
        let start = date(2026, 1, 1);
        let original = request().fingerprint(Strategy::Avalanche, 0.0, start);
        assert_eq!(original.len(), 64);
        assert_eq!(original, request().fingerprint(Strategy::Avalanche, 0.0, start));

        let mut changed = request();
        changed.debts[0].balance = 450.0;
        assert_ne!(original, changed.fingerprint(Strategy::Avalanche, 0.0, start));
        assert_ne!(original, request().fingerprint(Strategy::Snowball, 0.0, start));
    }

    #[test]
    fn test_request_deserializes_with_defaults() {
        let request: OptimizationRequest = serde_json::from_str(
            r#"{"debts": [{"id": "a", "name": "Card", "balance": 100.0, "apr": 5.0, "minimum_payment": 10.0}],
                "monthly_budget": 50.0}"#,
        )
        .unwrap();
        assert_eq!(request.strategy, StrategyPreference::Avalanche);
        assert_eq!(request.extra_payment, None);
        assert!(request.user_context.is_empty());
    }
}
