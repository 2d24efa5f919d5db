//! Engine configuration
//!
//! Every tunable constant of the engine lives here with its default. Hosts
//! deserialize an `OptimizerConfig` (all sections optional) or use
//! `OptimizerConfig::default()`.

use crate::core::money::BALANCE_EPSILON;
use crate::error::OptimizationError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Complete engine configuration
///
/// # Example
/// ```
/// use debt_optimizer_core::OptimizerConfig;
///
/// let config: OptimizerConfig = serde_json::from_str(r#"{"retry": {"max_attempts": 1}}"#).unwrap();
/// assert_eq!(config.retry.max_attempts, 1);
/// assert_eq!(config.simulation.max_months, 600);
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizerConfig {
    pub simulation: SimulationConfig,
    pub retry: RetryConfig,
    pub validation: ValidationConfig,
    pub advisor: AdvisorConfig,
}

/// Deterministic simulator and baseline settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Hard iteration cap (600 months = 50 years)
    pub max_months: u32,

    /// Balance at or below which a debt counts as paid off
    pub balance_epsilon: f64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            max_months: 600,
            balance_epsilon: BALANCE_EPSILON,
        }
    }
}

/// Model-backed plan generation retry policy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Attempts before falling back to the simulator (0 disables the model path)
    pub max_attempts: u32,

    /// Fixed delay between attempts
    pub retry_delay_ms: u64,

    /// Overall timeout around the model path; `None` waits for all attempts
    pub timeout_secs: Option<u64>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            retry_delay_ms: 1000,
            timeout_secs: None,
        }
    }
}

impl RetryConfig {
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

/// Tolerances used when checking model-generated plans
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Largest final-month `total_remaining` accepted
    pub terminal_balance_tolerance: f64,

    /// Allowed conservation drift per debt
    pub conservation_tolerance_per_debt: f64,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            terminal_balance_tolerance: 1.0,
            conservation_tolerance_per_debt: 0.01,
        }
    }
}

/// Heuristic strategy selection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdvisorConfig {
    /// Highest open APR above which the heuristic picks avalanche
    pub avalanche_apr_threshold: f64,

    /// Share of (budget - minimums) suggested as extra payment
    pub default_extra_share: f64,
}

impl Default for AdvisorConfig {
    fn default() -> Self {
        Self {
            avalanche_apr_threshold: 15.0,
            default_extra_share: 0.10,
        }
    }
}

impl OptimizerConfig {
    /// Reject values that would make the engine misbehave
    pub fn validate(&self) -> Result<(), OptimizationError> {
        let invalid = |msg: &str| Err(OptimizationError::InvalidConfig(msg.to_string()));

        if self.simulation.max_months == 0 {
            return invalid("simulation.max_months must be > 0");
        }
        if !(self.simulation.balance_epsilon > 0.0 && self.simulation.balance_epsilon < 1.0) {
            return invalid("simulation.balance_epsilon must be in (0, 1)");
        }
        if !(self.validation.terminal_balance_tolerance >= 0.0) {
            return invalid("validation.terminal_balance_tolerance must be >= 0");
        }
        if !(self.validation.conservation_tolerance_per_debt >= 0.0) {
            return invalid("validation.conservation_tolerance_per_debt must be >= 0");
        }
        if !(0.0..=1.0).contains(&self.advisor.default_extra_share) {
            return invalid("advisor.default_extra_share must be between 0 and 1");
        }
        if !self.advisor.avalanche_apr_threshold.is_finite() {
            return invalid("advisor.avalanche_apr_threshold must be finite");
        }
        Ok(())
    }
}
