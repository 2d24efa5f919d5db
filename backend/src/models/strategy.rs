//! Repayment strategies
//!
//! A strategy is nothing more than a priority order over debts. The order
//! decides who is paid first when the budget runs short and who receives the
//! month's acceleration.
//!
//! # Ordering Rules
//!
//! - **Avalanche**: descending APR, then descending balance, then input order
//! - **Snowball**: ascending balance, then descending APR, then input order
//!
//! Both use a stable sort so input order is the final tie-break.

use crate::models::debt::DebtRecord;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Strategy actually used to order debts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// Highest APR first (minimizes interest)
    Avalanche,

    /// Lowest balance first (fastest individual payoffs)
    Snowball,
}

impl Strategy {
    /// Return `debts` in priority order for this strategy
    ///
    /// # Example
    /// ```
    /// use debt_optimizer_core::{DebtRecord, Strategy};
    ///
    /// let debts = vec![
    ///     DebtRecord::with_id("A", "A", 1000.0, 8.0, 25.0),
    ///     DebtRecord::with_id("B", "B", 300.0, 25.0, 25.0),
    /// ];
    ///
    /// let avalanche: Vec<_> = Strategy::Avalanche.order(&debts).into_iter().map(|d| d.id).collect();
    /// assert_eq!(avalanche, vec!["B", "A"]);
    ///
    /// let snowball: Vec<_> = Strategy::Snowball.order(&debts).into_iter().map(|d| d.id).collect();
    /// assert_eq!(snowball, vec!["B", "A"]);
    /// ```
    pub fn order(&self, debts: &[DebtRecord]) -> Vec<DebtRecord> {
        let mut ordered = debts.to_vec();
        ordered.sort_by(|a, b| self.compare(a, b));
        ordered
    }

    fn compare(&self, a: &DebtRecord, b: &DebtRecord) -> Ordering {
        match self {
            Strategy::Avalanche => b
                .apr
                .total_cmp(&a.apr)
                .then_with(|| b.balance.total_cmp(&a.balance)),
            Strategy::Snowball => a
                .balance
                .total_cmp(&b.balance)
                .then_with(|| b.apr.total_cmp(&a.apr)),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::Avalanche => "avalanche",
            Strategy::Snowball => "snowball",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Strategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "avalanche" => Ok(Strategy::Avalanche),
            "snowball" => Ok(Strategy::Snowball),
            other => Err(format!("Unknown strategy: {}", other)),
        }
    }
}

/// What the caller asked for
///
/// `Auto` delegates the choice to the strategy advisor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrategyPreference {
    #[default]
    Avalanche,
    Snowball,
    Auto,
}

impl StrategyPreference {
    /// The fixed strategy, or `None` for `Auto`
    pub fn fixed(&self) -> Option<Strategy> {
        match self {
            StrategyPreference::Avalanche => Some(Strategy::Avalanche),
            StrategyPreference::Snowball => Some(Strategy::Snowball),
            StrategyPreference::Auto => None,
        }
    }
}

impl From<Strategy> for StrategyPreference {
    fn from(strategy: Strategy) -> Self {
        match strategy {
            Strategy::Avalanche => StrategyPreference::Avalanche,
            Strategy::Snowball => StrategyPreference::Snowball,
        }
    }
}

impl fmt::Display for StrategyPreference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.fixed() {
            Some(strategy) => strategy.fmt(f),
            None => f.write_str("auto"),
        }
    }
}

impl FromStr for StrategyPreference {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("auto") {
            return Ok(StrategyPreference::Auto);
        }
        Strategy::from_str(s).map(StrategyPreference::from)
    }
}
