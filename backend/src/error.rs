//! Caller-visible errors
//!
//! Only two families ever reach the caller: input errors (rejected before any
//! simulation) and the unaffordable-budget condition. Model failures and
//! validator rejections are recovered inside the engine.

use crate::simulator::SimulationError;
use thiserror::Error;

/// Errors returned by the optimization entry points
#[derive(Debug, Error, PartialEq)]
pub enum OptimizationError {
    #[error("No debts supplied")]
    NoDebts,

    #[error("Monthly budget must be positive, got {0}")]
    InvalidBudget(f64),

    #[error("Extra payment must be non-negative, got {0}")]
    InvalidExtraPayment(f64),

    #[error("Invalid debt {id}: {reason}")]
    InvalidDebt { id: String, reason: String },

    #[error("Duplicate debt id: {0}")]
    DuplicateDebtId(String),

    #[error("Unknown debt id in scenario: {0}")]
    UnknownDebtId(String),

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Plan does not converge within the simulation horizon of {months} months ({remaining:.2} still owed)")]
    NonConvergent { months: u32, remaining: f64 },
}

impl From<SimulationError> for OptimizationError {
    fn from(err: SimulationError) -> Self {
        match err {
            SimulationError::NonConvergent { months, remaining } => {
                OptimizationError::NonConvergent { months, remaining }
            }
        }
    }
}
